//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "sqlscout.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("Initializing sqlscout configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(()) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your server list and output directory", self.output);
                println!("  2. Point [source] at your SQL and CIM query tools");
                println!("  3. Set SQLSCOUT_SQL_PASSWORD in .env if you use a SQL login");
                println!("  4. Validate configuration: sqlscout validate-config");
                println!("  5. Try a dry run: sqlscout collect --dry-run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Sample configuration with every section and its defaults
    pub fn sample_config() -> &'static str {
        r#"# sqlscout configuration
# SQL Server estate inventory collector

[run]
# HOST, HOST\INSTANCE or HOST,PORT
servers = ["SQL01", "SQL02\\REPORTING"]
output_directory = "./inventory"
# log_directory = "./inventory/Logs"

# Servers processed concurrently: 1, 2, 4, 8, 16 or 32
throttle_limit = 4

# Query servers but write no output files
dry_run = false

# Steps to skip: HostOS, HostVolumes, SqlInstanceInfo, SqlConfiguration,
# Databases, DatabaseFiles, Logins, AgentJobs, LinkedServers
skip_steps = []

# Wall-clock budget per server, checked between steps
server_timeout_seconds = 900
log_level = "info"

[export]
chunk_size = 5000
retry_backoff_ms = 500
# append: keep history across runs | replace: one run per file
output_mode = "append"
delimiter = ","
file_extension = "csv"

[sql]
# Omit username/password for integrated authentication
# username = "svc_inventory"
# password = "${SQLSCOUT_SQL_PASSWORD}"
query_timeout_seconds = 60

[os]
# username = "DOMAIN\\svc_inventory"
# password = "${SQLSCOUT_OS_PASSWORD}"

[source]
# Placeholders: {server} {query} {step} {timeout}
# Credentials are passed in SQLSCOUT_USERNAME / SQLSCOUT_PASSWORD.
# Each tool must print the result set as a JSON array of objects.
sql_command = ["sqlq", "--server", "{server}", "--timeout", "{timeout}", "--query", "{query}"]
os_command = ["cimq", "--host", "{server}", "--class", "{query}"]
command_log_length = 256

[logging]
json_enabled = false
json_rotation = "never"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoutConfig;
    use tempfile::TempDir;

    #[test]
    fn test_sample_config_is_valid() {
        let config: ScoutConfig = toml::from_str(InitArgs::sample_config()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.run.servers.len(), 2);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sqlscout.toml");
        fs::write(&path, "keep me").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

        let args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            force: true,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&path).unwrap().contains("[run]"));
    }
}
