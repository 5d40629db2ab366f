//! Client-management tool descriptors (spec §3, category `client-management`).

use serde_json::json;

use crate::core::registry::{Category, CliArgsTemplate, ToolDescriptor, ToolExample};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        client_create(),
        client_list(),
        client_show(),
        client_update(),
        client_delete(),
    ]
}

fn client_create() -> ToolDescriptor {
    ToolDescriptor {
        name: "client_create".to_string(),
        description: "Create a new client record.".to_string(),
        category: Category::ClientManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "name": { "type": "string", "description": "Client's display name." },
                "email": { "type": "string", "description": "Client's email address." },
                "phone": { "type": "string", "description": "Client's phone number." },
                "address": { "type": "string", "description": "Client's mailing address." }
            },
            "required": ["name"]
        }),
        examples: vec![ToolExample {
            description: "create a client with just a name".to_string(),
            input: json!({"name": "Acme Inc"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["client", "create"])
            .flag("name", "--name")
            .flag("email", "--email")
            .flag("phone", "--phone")
            .flag("address", "--address"),
    }
}

fn client_list() -> ToolDescriptor {
    ToolDescriptor {
        name: "client_list".to_string(),
        description: "List clients, optionally filtered by a name/email search term.".to_string(),
        category: Category::ClientManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "query": { "type": "string", "description": "Case-insensitive substring to match against name or email." },
                "limit": { "type": "integer", "description": "Maximum rows to return.", "default": 50 }
            }
        }),
        examples: vec![ToolExample {
            description: "list all clients".to_string(),
            input: json!({}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["client", "list"])
            .flag("query", "--query")
            .flag("limit", "--limit"),
    }
}

fn client_show() -> ToolDescriptor {
    ToolDescriptor {
        name: "client_show".to_string(),
        description: "Show the full detail of one client.".to_string(),
        category: Category::ClientManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "client_id": { "type": "string", "description": "Client identifier." }
            },
            "required": ["client_id"]
        }),
        examples: vec![ToolExample {
            description: "show a client by id".to_string(),
            input: json!({"client_id": "c-123"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["client", "show"]).flag("client_id", "--client-id"),
    }
}

fn client_update() -> ToolDescriptor {
    ToolDescriptor {
        name: "client_update".to_string(),
        description: "Update a client's contact details.".to_string(),
        category: Category::ClientManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "client_id": { "type": "string", "description": "Client identifier." },
                "name": { "type": "string", "description": "New display name." },
                "email": { "type": "string", "description": "New email address." },
                "phone": { "type": "string", "description": "New phone number." },
                "address": { "type": "string", "description": "New mailing address." }
            },
            "required": ["client_id"]
        }),
        examples: vec![ToolExample {
            description: "update a client's email".to_string(),
            input: json!({"client_id": "c-123", "email": "new@acme.example"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["client", "update"])
            .flag("client_id", "--client-id")
            .flag("name", "--name")
            .flag("email", "--email")
            .flag("phone", "--phone")
            .flag("address", "--address"),
    }
}

fn client_delete() -> ToolDescriptor {
    ToolDescriptor {
        name: "client_delete".to_string(),
        description: "Delete a client, either soft (archive) or hard (permanent).".to_string(),
        category: Category::ClientManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "client_id": { "type": "string", "description": "Client identifier." },
                "soft_delete": { "type": "boolean", "description": "Archive instead of removing.", "default": true },
                "hard_delete": { "type": "boolean", "description": "Permanently remove the client.", "default": false }
            },
            "required": ["client_id"]
        }),
        examples: vec![ToolExample {
            description: "archive a client".to_string(),
            input: json!({"client_id": "c-123", "soft_delete": true}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["client", "delete"])
            .flag("client_id", "--client-id")
            .flag("soft_delete", "--soft-delete")
            .flag("hard_delete", "--hard-delete"),
    }
}
