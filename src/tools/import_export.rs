//! Import/export tool descriptors (spec §3, category `import-export`).

use serde_json::json;

use crate::core::registry::{Category, CliArgsTemplate, ToolDescriptor, ToolExample};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        import_csv(),
        import_validate(),
        export_invoices(),
        timesheet_preview(),
    ]
}

fn import_csv() -> ToolDescriptor {
    ToolDescriptor {
        name: "import_csv".to_string(),
        description: "Import timesheet work items from a CSV, flat-JSON, or structured-JSON file into an invoice.".to_string(),
        category: Category::ImportExport,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "file_path": { "type": "string", "description": "Path to the timesheet file, relative to the call workspace." },
                "invoice_id": { "type": "string", "description": "Invoice to import work items into." },
                "date_formats": {
                    "type": "array",
                    "description": "Additional date formats to try, replacing the built-in defaults.",
                    "items": { "type": "string", "description": "A chrono strftime date format string." }
                }
            },
            "required": ["file_path"]
        }),
        examples: vec![ToolExample {
            description: "import a csv timesheet into an invoice".to_string(),
            input: json!({"file_path": "timesheet.csv", "invoice_id": "inv-1"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["import", "csv"])
            .flag("file_path", "--file")
            .flag("invoice_id", "--invoice-id"),
    }
}

fn import_validate() -> ToolDescriptor {
    ToolDescriptor {
        name: "import_validate".to_string(),
        description: "Validate a timesheet file without importing it, reporting per-row errors.".to_string(),
        category: Category::ImportExport,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "file_path": { "type": "string", "description": "Path to the timesheet file, relative to the call workspace." }
            },
            "required": ["file_path"]
        }),
        examples: vec![ToolExample {
            description: "validate a timesheet before importing it".to_string(),
            input: json!({"file_path": "timesheet.json"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["import", "validate"]).flag("file_path", "--file"),
    }
}

fn export_invoices() -> ToolDescriptor {
    ToolDescriptor {
        name: "export_invoices".to_string(),
        description: "Export invoices matching a filter to CSV or JSON.".to_string(),
        category: Category::ImportExport,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Export file format.",
                    "enum": ["csv", "json"]
                },
                "client_id": { "type": "string", "description": "Restrict export to this client." },
                "status": {
                    "type": "string",
                    "description": "Restrict export to invoices in this status.",
                    "enum": ["draft", "sent", "paid", "overdue", "voided"]
                },
                "output_path": { "type": "string", "description": "Destination path, relative to the call workspace." }
            },
            "required": ["format"]
        }),
        examples: vec![ToolExample {
            description: "export all paid invoices to csv".to_string(),
            input: json!({"format": "csv", "status": "paid"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["export", "invoices"])
            .flag("format", "--format")
            .flag("client_id", "--client-id")
            .flag("status", "--status")
            .flag("output_path", "--output"),
    }
}

fn timesheet_preview() -> ToolDescriptor {
    ToolDescriptor {
        name: "timesheet_preview".to_string(),
        description: "Parse a timesheet file in-process and return the detected format, parsed work items, and any per-row errors, without touching the invoice CLI.".to_string(),
        category: Category::ImportExport,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "file_path": { "type": "string", "description": "Path to the timesheet file, relative to the call workspace." },
                "content": { "type": "string", "description": "Inline timesheet content, used instead of file_path." },
                "date_formats": {
                    "type": "array",
                    "description": "Additional date formats to try, replacing the built-in defaults.",
                    "items": { "type": "string", "description": "A chrono strftime date format string." }
                }
            }
        }),
        examples: vec![ToolExample {
            description: "preview an inline csv timesheet".to_string(),
            input: json!({"content": "date,description,hours\n2026-01-05,Design review,2\n"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::default(),
    }
}
