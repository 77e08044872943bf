//! Command-line parsing
//!
//! Parses invocations like `routine-builder serve`, `routine-builder generate 1 4`.

use crate::catalog::ProductId;

/// Parsed command from the process arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the builder window (default)
    Open,
    /// Run the generateRoutine proxy: serve [addr]
    Serve { bind: Option<String> },
    /// Generate a routine headlessly: generate <id>...
    Generate { ids: Vec<ProductId> },
    /// Show one product's details: details <id>
    Details { id: ProductId },
    /// List catalog products: products [category] [search...]
    Products {
        category: Option<String>,
        search: Option<String>,
    },
    /// Show help
    Help,
    /// Unrecognised input, with the message to print
    Invalid { message: String },
}

impl Command {
    /// Parse the arguments that follow the program name
    pub fn parse(args: &[String]) -> Self {
        let Some(first) = args.first() else {
            return Command::Open;
        };
        let rest = &args[1..];

        match first.to_lowercase().as_str() {
            "open" | "ui" => Command::Open,
            "serve" | "server" => Command::Serve {
                bind: rest.first().cloned(),
            },
            "generate" | "gen" => {
                if rest.is_empty() {
                    return Command::Invalid {
                        message: "Usage: routine-builder generate <product-id>...".to_string(),
                    };
                }
                let mut ids: Vec<ProductId> = Vec::with_capacity(rest.len());
                for raw in rest {
                    match raw.parse() {
                        // repeating an id must not toggle it back off
                        Ok(id) if ids.contains(&id) => {}
                        Ok(id) => ids.push(id),
                        Err(_) => {
                            return Command::Invalid {
                                message: format!("Not a product id: {}", raw),
                            }
                        }
                    }
                }
                Command::Generate { ids }
            }
            "details" | "show" => match rest.first().map(|raw| raw.parse::<ProductId>()) {
                Some(Ok(id)) => Command::Details { id },
                _ => Command::Invalid {
                    message: "Usage: routine-builder details <product-id>".to_string(),
                },
            },
            "products" | "list" => Command::Products {
                category: rest
                    .first()
                    .filter(|c| !c.is_empty() && c.as_str() != "all")
                    .cloned(),
                search: (rest.len() > 1).then(|| rest[1..].join(" ")),
            },
            "help" | "--help" | "-h" => Command::Help,
            other => Command::Invalid {
                message: format!(
                    "Unknown command: {}. Run 'routine-builder help' for usage.",
                    other
                ),
            },
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r#"Routine Builder - browse products and generate skincare routines

Usage: routine-builder [command]

Commands:
  (none), open              Open the builder window
  serve [addr]              Run the generateRoutine proxy (default 127.0.0.1:8787)
  generate <id>...          Generate a routine for the given product ids, print HTML
  details <id>              Print the details overlay for one product
  products [category] [q]   List catalog products ('all' for every category)
  help                      Show this help message

Environment:
  OPENAI_API_KEY            Credential for the proxy and the direct fallback
  ROUTINE_CATALOG           Catalog URL or path (default products.json)
  ROUTINE_BACKEND_URL       Proxy base URL used by the widget"#
    }
}
