//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "specforge")]
#[command(about = "Specforge - iterative spec-to-code development loop", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a configuration file (defaults to hierarchical .specforge/ loading)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full development loop from a YAML specification
    Run {
        /// Path to the specification YAML file
        spec: String,

        /// Quality score to converge on (0-100)
        #[arg(long)]
        target: Option<f64>,

        /// Maximum number of iterations
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Produce a container build spec on success
        #[arg(long)]
        package: bool,

        /// Use the offline demo generator instead of the HTTP endpoint
        #[arg(long)]
        offline: bool,
    },

    /// Score an existing implementation directory without iterating
    Score {
        /// Directory containing the implementation's source files
        directory: String,

        /// Framework tag for the implementation
        #[arg(long, default_value = "fastapi")]
        framework: String,
    },
}
