//! Command-backed data source
//!
//! Runs an external query program per step (for example a `sqlcmd` or
//! PowerShell wrapper) and reads its standard output as JSON records.
//!
//! Each configured command is an argument vector. These placeholders are
//! substituted in every argument:
//!
//! | Placeholder | Value                                  |
//! |-------------|----------------------------------------|
//! | `{server}`  | target server                          |
//! | `{step}`    | canonical step name                    |
//! | `{timeout}` | query timeout in whole seconds         |
//! | `{query}`   | T-SQL text or CIM class of the step    |
//!
//! Credentials never appear on the command line; they are passed through
//! the `SQLSCOUT_USERNAME` and `SQLSCOUT_PASSWORD` environment variables.

use super::source::{DataSource, FetchRequest};
use crate::config::SourceSection;
use crate::domain::{CollectionResult, SourceError, SourceKind};
use crate::logging::RunLog;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Environment variable carrying the username
pub const USERNAME_ENV: &str = "SQLSCOUT_USERNAME";
/// Environment variable carrying the secret
pub const PASSWORD_ENV: &str = "SQLSCOUT_PASSWORD";

/// [`DataSource`] that shells out to configured query programs
pub struct CommandSource {
    sql_command: Vec<String>,
    os_command: Vec<String>,
    command_log_length: usize,
    log: Arc<RunLog>,
}

impl CommandSource {
    pub fn new(config: &SourceSection, log: Arc<RunLog>) -> Self {
        Self {
            sql_command: config.sql_command.clone(),
            os_command: config.os_command.clone(),
            command_log_length: config.command_log_length,
            log,
        }
    }

    fn template(&self, kind: SourceKind) -> &[String] {
        match kind {
            SourceKind::Sql => &self.sql_command,
            SourceKind::Os => &self.os_command,
        }
    }
}

#[async_trait]
impl DataSource for CommandSource {
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<CollectionResult, SourceError> {
        let argv = render(self.template(request.step.source), &request);
        let Some((program, args)) = argv.split_first() else {
            return Err(SourceError::QueryFailed(format!(
                "No {} command configured",
                request.step.source
            )));
        };

        self.log.debug(format!(
            "{} / {}: {}",
            request.server,
            request.step.id,
            truncate_for_log(&argv.join(" "), self.command_log_length)
        ));

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match request.credential {
            Some(credential) => {
                command
                    .env(USERNAME_ENV, credential.username())
                    .env(PASSWORD_ENV, credential.expose_secret());
            }
            None => {
                command.env_remove(USERNAME_ENV).env_remove(PASSWORD_ENV);
            }
        }

        let child = command.spawn().map_err(|e| SourceError::ConnectionFailed {
            server: request.server.to_string(),
            message: format!("failed to start {program}: {e}"),
        })?;

        // Dropping the wait future on timeout kills the child.
        let output = tokio::time::timeout(request.timeout, child.wait_with_output())
            .await
            .map_err(|_| SourceError::Timeout(request.timeout))?
            .map_err(|e| SourceError::QueryFailed(format!("failed to read {program} output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: truncate_for_log(stderr.trim(), self.command_log_length),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        CollectionResult::from_json(&stdout).map_err(SourceError::InvalidResponse)
    }
}

fn render(template: &[String], request: &FetchRequest<'_>) -> Vec<String> {
    let timeout = request.timeout.as_secs().max(1).to_string();
    template
        .iter()
        .map(|arg| {
            // {query} last so query text is never re-scanned for placeholders.
            arg.replace("{server}", request.server.as_str())
                .replace("{step}", request.step.id.name())
                .replace("{timeout}", &timeout)
                .replace("{query}", request.step.query)
        })
        .collect()
}

/// Cut `text` to at most `max_chars` characters, marking the cut
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
