//! Document generation tool descriptors (spec §3, category `generation`).

use serde_json::json;

use crate::core::registry::{Category, CliArgsTemplate, ToolDescriptor, ToolExample};

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![generate_html(), generate_pdf()]
}

fn generate_html() -> ToolDescriptor {
    ToolDescriptor {
        name: "generate_html".to_string(),
        description: "Render an invoice as a standalone HTML document.".to_string(),
        category: Category::Generation,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "invoice_id": { "type": "string", "description": "Invoice identifier." },
                "invoice_number": { "type": "string", "description": "Human-readable invoice number." },
                "output_path": { "type": "string", "description": "Destination path, relative to the call workspace.", "default": "invoice.html" }
            }
        }),
        examples: vec![ToolExample {
            description: "render an invoice to html".to_string(),
            input: json!({"invoice_id": "inv-1"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["generate", "html"])
            .flag("invoice_id", "--invoice-id")
            .flag("invoice_number", "--invoice-number")
            .flag("output_path", "--output"),
    }
}

fn generate_pdf() -> ToolDescriptor {
    ToolDescriptor {
        name: "generate_pdf".to_string(),
        description: "Render an invoice as a PDF document.".to_string(),
        category: Category::Generation,
        input_schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "invoice_id": { "type": "string", "description": "Invoice identifier." },
                "invoice_number": { "type": "string", "description": "Human-readable invoice number." },
                "output_path": { "type": "string", "description": "Destination path, relative to the call workspace.", "default": "invoice.pdf" }
            }
        }),
        examples: vec![ToolExample {
            description: "render an invoice to pdf".to_string(),
            input: json!({"invoice_number": "INV-0042"}),
        }],
        cli_command: "invoice".to_string(),
        cli_args_template: CliArgsTemplate::new(&["generate", "pdf"])
            .flag("invoice_id", "--invoice-id")
            .flag("invoice_number", "--invoice-number")
            .flag("output_path", "--output"),
    }
}
