//! Command-line interface layer.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Print an error in the selected mode and exit non-zero.
pub fn handle_error(error: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let payload = serde_json::json!({ "error": format!("{error:#}") });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
        );
    } else {
        eprintln!("{} {error:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
