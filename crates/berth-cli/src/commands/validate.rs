//! Validate command - parse a document without generating anything

use std::path::Path;

use berth_kube::{ConvertError, default_registry, error::errors};
use console::style;

use crate::error::{CliError, Result};
use crate::exit_codes;
use crate::input;

pub fn run(file: &Path, content_type: &str, json_output: bool, max_size: u64) -> Result<i32> {
    let converter = default_registry().for_type(content_type)?;
    let content = input::read_document(file, max_size)?;
    let name = input::display_name(file);

    match converter.validate(&content) {
        Ok(()) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": true,
                    "file": name,
                    "type": content_type,
                    "errors": [],
                });
                println!("{}", pretty(&output)?);
            } else {
                println!("{} {} is a valid {} document", style("✓").green().bold(), name, content_type);
            }
            Ok(exit_codes::SUCCESS)
        }
        Err(ConvertError::Compose(err)) if json_output => {
            let output = serde_json::json!({
                "valid": false,
                "file": name,
                "type": content_type,
                "errors": [errors::parse_error(&err)],
            });
            println!("{}", pretty(&output)?);
            Ok(exit_codes::VALIDATION_ERROR)
        }
        Err(err) => Err(err.into()),
    }
}

fn pretty(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::internal(format!("Failed to serialize result: {}", e)))
}
