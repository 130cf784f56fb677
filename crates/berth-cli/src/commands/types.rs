//! Types command - list registered converters

use berth_kube::default_registry;
use console::style;

use crate::error::{CliError, Result};
use crate::exit_codes;

pub fn run(json_output: bool) -> Result<i32> {
    let converters = default_registry().list().map_err(CliError::from)?;

    if json_output {
        let json = serde_json::to_string_pretty(&converters)
            .map_err(|e| CliError::internal(format!("Failed to serialize converters: {}", e)))?;
        println!("{}", json);
        return Ok(exit_codes::SUCCESS);
    }

    if converters.is_empty() {
        println!("{} No converters registered", style("⚠").yellow());
    }

    for converter in &converters {
        println!("{}", style(&converter.name).bold().cyan());
        println!("  {}", style(&converter.description).dim());
        println!("  {} {}", style("types:").dim(), converter.types.join(", "));
    }
    Ok(exit_codes::SUCCESS)
}
