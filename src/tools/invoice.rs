//! Invoice-management tool descriptors (spec §3, category `invoice-management`).

use serde_json::json;

use crate::core::registry::{Category, CliArgsTemplate, ToolDescriptor, ToolExample};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        invoice_create(),
        invoice_list(),
        invoice_show(),
        invoice_update(),
        invoice_delete(),
        invoice_add_item(),
        invoice_remove_item(),
    ]
}

fn invoice_create() -> ToolDescriptor {
    ToolDescriptor {
        name: "invoice_create".to_string(),
        description: "Create a new invoice for a client, identified by name, id, or email."
            .to_string(),
        category: Category::InvoiceManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "client_name": { "type": "string", "description": "Client's display name." },
                "client_id": { "type": "string", "description": "Existing client identifier." },
                "client_email": { "type": "string", "description": "Client's email address." },
                "description": { "type": "string", "description": "Free-text invoice description." },
                "due_date": { "type": "string", "description": "Due date, YYYY-MM-DD." }
            }
        }),
        examples: vec![
            ToolExample {
                description: "create an invoice for a known client name".to_string(),
                input: json!({"client_name": "Acme Inc", "description": "July consulting"}),
            },
            ToolExample {
                description: "create an invoice by client id with a due date".to_string(),
                input: json!({"client_id": "c-123", "due_date": "2026-09-01"}),
            },
        ],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["invoice", "create"])
            .flag("client_name", "--client-name")
            .flag("client_id", "--client-id")
            .flag("client_email", "--client-email")
            .flag("description", "--description")
            .flag("due_date", "--due-date"),
    }
}

fn invoice_list() -> ToolDescriptor {
    ToolDescriptor {
        name: "invoice_list".to_string(),
        description: "List invoices, optionally filtered by client or status.".to_string(),
        category: Category::InvoiceManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "client_id": { "type": "string", "description": "Restrict to this client's invoices." },
                "status": {
                    "type": "string",
                    "description": "Restrict to invoices in this status.",
                    "enum": ["draft", "sent", "paid", "overdue", "voided"]
                },
                "from_date": { "type": "string", "description": "Inclusive lower bound, YYYY-MM-DD." },
                "to_date": { "type": "string", "description": "Inclusive upper bound, YYYY-MM-DD." },
                "limit": { "type": "integer", "description": "Maximum rows to return.", "default": 50 }
            }
        }),
        examples: vec![ToolExample {
            description: "list paid invoices for a client".to_string(),
            input: json!({"client_id": "c-123", "status": "paid"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["invoice", "list"])
            .flag("client_id", "--client-id")
            .flag("status", "--status")
            .flag("from_date", "--from-date")
            .flag("to_date", "--to-date")
            .flag("limit", "--limit"),
    }
}

fn invoice_show() -> ToolDescriptor {
    ToolDescriptor {
        name: "invoice_show".to_string(),
        description: "Show the full detail of one invoice, by id or number.".to_string(),
        category: Category::InvoiceManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "invoice_id": { "type": "string", "description": "Invoice identifier." },
                "invoice_number": { "type": "string", "description": "Human-readable invoice number." }
            }
        }),
        examples: vec![ToolExample {
            description: "show an invoice by number".to_string(),
            input: json!({"invoice_number": "INV-0042"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["invoice", "show"])
            .flag("invoice_id", "--invoice-id")
            .flag("invoice_number", "--invoice-number"),
    }
}

fn invoice_update() -> ToolDescriptor {
    ToolDescriptor {
        name: "invoice_update".to_string(),
        description: "Update the status, due date, or description of an existing invoice."
            .to_string(),
        category: Category::InvoiceManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "invoice_id": { "type": "string", "description": "Invoice identifier." },
                "invoice_number": { "type": "string", "description": "Human-readable invoice number." },
                "status": {
                    "type": "string",
                    "description": "New status.",
                    "enum": ["draft", "sent", "paid", "overdue", "voided"]
                },
                "due_date": { "type": "string", "description": "New due date, YYYY-MM-DD." },
                "description": { "type": "string", "description": "New free-text description." }
            }
        }),
        examples: vec![ToolExample {
            description: "mark an invoice paid".to_string(),
            input: json!({"invoice_id": "inv-1", "status": "paid"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["invoice", "update"])
            .flag("invoice_id", "--invoice-id")
            .flag("invoice_number", "--invoice-number")
            .flag("status", "--status")
            .flag("due_date", "--due-date")
            .flag("description", "--description"),
    }
}

fn invoice_delete() -> ToolDescriptor {
    ToolDescriptor {
        name: "invoice_delete".to_string(),
        description: "Delete an invoice, by id or number.".to_string(),
        category: Category::InvoiceManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "invoice_id": { "type": "string", "description": "Invoice identifier." },
                "invoice_number": { "type": "string", "description": "Human-readable invoice number." }
            }
        }),
        examples: vec![ToolExample {
            description: "delete an invoice by id".to_string(),
            input: json!({"invoice_id": "inv-1"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["invoice", "delete"])
            .flag("invoice_id", "--invoice-id")
            .flag("invoice_number", "--invoice-number"),
    }
}

fn invoice_add_item() -> ToolDescriptor {
    ToolDescriptor {
        name: "invoice_add_item".to_string(),
        description: "Add a work item line to an existing invoice.".to_string(),
        category: Category::InvoiceManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "invoice_id": { "type": "string", "description": "Invoice identifier." },
                "invoice_number": { "type": "string", "description": "Human-readable invoice number." },
                "description": { "type": "string", "description": "Line item description." },
                "quantity": { "type": "number", "description": "Quantity or hours." },
                "unit_price": { "type": "number", "description": "Price per unit." },
                "date": { "type": "string", "description": "Work date, YYYY-MM-DD." }
            },
            "required": ["description"]
        }),
        examples: vec![ToolExample {
            description: "add an hourly line item".to_string(),
            input: json!({
                "invoice_id": "inv-1",
                "description": "Consulting",
                "quantity": 4,
                "unit_price": 150.0
            }),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["invoice", "add-item"])
            .flag("invoice_id", "--invoice-id")
            .flag("invoice_number", "--invoice-number")
            .flag("description", "--description")
            .flag("quantity", "--quantity")
            .flag("unit_price", "--unit-price")
            .flag("date", "--date"),
    }
}

fn invoice_remove_item() -> ToolDescriptor {
    ToolDescriptor {
        name: "invoice_remove_item".to_string(),
        description: "Remove a work item line from an existing invoice.".to_string(),
        category: Category::InvoiceManagement,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "invoice_id": { "type": "string", "description": "Invoice identifier." },
                "invoice_number": { "type": "string", "description": "Human-readable invoice number." },
                "work_item_id": { "type": "string", "description": "Work item identifier." },
                "work_item_description": { "type": "string", "description": "Work item description to match." },
                "work_item_date": { "type": "string", "description": "Work item date to match, YYYY-MM-DD." }
            }
        }),
        examples: vec![ToolExample {
            description: "remove a work item by id".to_string(),
            input: json!({"invoice_id": "inv-1", "work_item_id": "wi-1"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["invoice", "remove-item"])
            .flag("invoice_id", "--invoice-id")
            .flag("invoice_number", "--invoice-number")
            .flag("work_item_id", "--work-item-id")
            .flag("work_item_description", "--work-item-description")
            .flag("work_item_date", "--work-item-date"),
    }
}
