//! Server/CLI configuration tool descriptors (spec §3, category `configuration`).

use serde_json::json;

use crate::core::registry::{Category, CliArgsTemplate, ToolDescriptor, ToolExample};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![config_show(), config_validate(), config_init()]
}

fn config_show() -> ToolDescriptor {
    ToolDescriptor {
        name: "config_show".to_string(),
        description: "Show the invoice CLI's currently effective configuration.".to_string(),
        category: Category::Configuration,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {}
        }),
        examples: vec![ToolExample {
            description: "show the active configuration".to_string(),
            input: json!({}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["config", "show"]),
    }
}

fn config_validate() -> ToolDescriptor {
    ToolDescriptor {
        name: "config_validate".to_string(),
        description: "Validate an invoice CLI configuration file without applying it.".to_string(),
        category: Category::Configuration,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "config_path": { "type": "string", "description": "Path to the configuration file, relative to the call workspace." }
            }
        }),
        examples: vec![ToolExample {
            description: "validate the default configuration file".to_string(),
            input: json!({}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["config", "validate"]).flag("config_path", "--config"),
    }
}

fn config_init() -> ToolDescriptor {
    ToolDescriptor {
        name: "config_init".to_string(),
        description: "Write a fresh invoice CLI configuration file populated with defaults.".to_string(),
        category: Category::Configuration,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "output_path": { "type": "string", "description": "Destination path, relative to the call workspace.", "default": "invoice.toml" },
                "force": { "type": "boolean", "description": "Overwrite an existing file at output_path.", "default": false }
            }
        }),
        examples: vec![ToolExample {
            description: "initialize a default configuration file".to_string(),
            input: json!({}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["config", "init"])
            .flag("output_path", "--output")
            .flag("force", "--force"),
    }
}
