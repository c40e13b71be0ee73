//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for sqlscout using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// sqlscout - SQL Server estate inventory collector
#[derive(Parser, Debug)]
#[command(name = "sqlscout")]
#[command(version, about, long_about = None)]
#[command(author = "sqlscout Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sqlscout.toml", env = "SQLSCOUT_CONFIG")]
    pub config: String,

    /// Console log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SQLSCOUT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect inventory from every configured server
    Collect(commands::collect::CollectArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
