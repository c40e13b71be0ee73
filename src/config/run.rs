//! Validated, immutable run configuration
//!
//! A [`RunConfig`] is built once at the start of a run, after all checks
//! (including the filesystem ones) have passed, and is only read afterwards.

use super::schema::{OutputMode, ScoutConfig, ALLOWED_THROTTLE_LIMITS};
use crate::domain::{Credential, Result, ScoutError, ServerName, SourceKind, StepId};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Concurrency limit of the scheduler, restricted to powers of two up to 32
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleLimit(usize);

impl ThrottleLimit {
    /// Strictly sequential processing
    pub const SEQUENTIAL: ThrottleLimit = ThrottleLimit(1);

    pub fn get(&self) -> usize {
        self.0
    }

    pub fn is_sequential(&self) -> bool {
        self.0 == 1
    }
}

impl TryFrom<usize> for ThrottleLimit {
    type Error = ScoutError;

    fn try_from(value: usize) -> Result<Self> {
        if ALLOWED_THROTTLE_LIMITS.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoutError::Configuration(format!(
                "Invalid throttle limit {value}. Must be one of: {ALLOWED_THROTTLE_LIMITS:?}"
            )))
        }
    }
}

impl fmt::Display for ThrottleLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric tunables of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunables {
    /// Characters of a rendered data-source command kept in the log
    pub command_log_length: usize,
    /// Timeout handed to every data-source call
    pub sql_query_timeout: Duration,
    /// Records per export chunk
    pub chunk_size: usize,
    /// Base delay before the first export retry
    pub retry_backoff_base_ms: u64,
    /// Wall-clock budget per server
    pub server_budget: Duration,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            command_log_length: 256,
            sql_query_timeout: Duration::from_secs(60),
            chunk_size: 5000,
            retry_backoff_base_ms: 500,
            server_budget: Duration::from_secs(900),
        }
    }
}

/// Validated configuration of one collection run
#[derive(Debug, Clone)]
pub struct RunConfig {
    servers: Vec<ServerName>,
    output_directory: PathBuf,
    log_directory: PathBuf,
    throttle: ThrottleLimit,
    skip: BTreeSet<StepId>,
    dry_run: bool,
    sql_credential: Option<Credential>,
    os_credential: Option<Credential>,
    tunables: Tunables,
    output_mode: OutputMode,
    delimiter: u8,
    file_extension: String,
}

impl RunConfig {
    /// Start building a run configuration
    pub fn builder<I, S>(servers: I, output_directory: impl Into<PathBuf>) -> RunConfigBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RunConfigBuilder::new(servers, output_directory)
    }

    /// Build the run configuration from a loaded configuration file
    ///
    /// # Errors
    ///
    /// Returns a configuration error if validation fails, the output or log
    /// directory cannot be created, or the output directory isn't writable.
    pub fn from_config(config: &ScoutConfig) -> Result<Self> {
        config.validate().map_err(ScoutError::Configuration)?;

        let skip = config
            .run
            .skip_steps
            .iter()
            .map(|s| StepId::from_str(s).map_err(ScoutError::Configuration))
            .collect::<Result<BTreeSet<_>>>()?;

        let sql_credential = credential_from(&config.sql.username, &config.sql.password)?;
        let os_credential = credential_from(&config.os.username, &config.os.password)?;

        let mut builder = RunConfig::builder(
            config.run.servers.iter().cloned(),
            &config.run.output_directory,
        )
        .throttle(config.run.throttle_limit)
        .skip(skip)
        .dry_run(config.run.dry_run)
        .output_mode(config.export.output_mode)
        .delimiter(config.export.delimiter)
        .file_extension(&config.export.file_extension)
        .tunables(Tunables {
            command_log_length: config.source.command_log_length,
            sql_query_timeout: Duration::from_secs(config.sql.query_timeout_seconds),
            chunk_size: config.export.chunk_size,
            retry_backoff_base_ms: config.export.retry_backoff_ms,
            server_budget: Duration::from_secs(config.run.server_timeout_seconds),
        });

        if let Some(dir) = &config.run.log_directory {
            builder = builder.log_directory(dir);
        }
        if let Some(cred) = sql_credential {
            builder = builder.sql_credential(cred);
        }
        if let Some(cred) = os_credential {
            builder = builder.os_credential(cred);
        }

        builder.build()
    }

    pub fn servers(&self) -> &[ServerName] {
        &self.servers
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    pub fn throttle(&self) -> ThrottleLimit {
        self.throttle
    }

    pub fn skip_set(&self) -> &BTreeSet<StepId> {
        &self.skip
    }

    pub fn is_skipped(&self, step: StepId) -> bool {
        self.skip.contains(&step)
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Credential for a step's source kind; `None` means ambient identity
    pub fn credential_for(&self, kind: SourceKind) -> Option<&Credential> {
        match kind {
            SourceKind::Sql => self.sql_credential.as_ref(),
            SourceKind::Os => self.os_credential.as_ref(),
        }
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }
}

/// Builder for [`RunConfig`]; all checks happen in [`RunConfigBuilder::build`]
#[derive(Debug)]
pub struct RunConfigBuilder {
    servers: Vec<String>,
    output_directory: PathBuf,
    log_directory: Option<PathBuf>,
    throttle: usize,
    skip: BTreeSet<StepId>,
    dry_run: bool,
    sql_credential: Option<Credential>,
    os_credential: Option<Credential>,
    tunables: Tunables,
    output_mode: OutputMode,
    delimiter: char,
    file_extension: String,
}

impl RunConfigBuilder {
    fn new<I, S>(servers: I, output_directory: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            servers: servers.into_iter().map(Into::into).collect(),
            output_directory: output_directory.into(),
            log_directory: None,
            throttle: 1,
            skip: BTreeSet::new(),
            dry_run: false,
            sql_credential: None,
            os_credential: None,
            tunables: Tunables::default(),
            output_mode: OutputMode::default(),
            delimiter: ',',
            file_extension: "csv".to_string(),
        }
    }

    pub fn log_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_directory = Some(dir.into());
        self
    }

    pub fn throttle(mut self, limit: usize) -> Self {
        self.throttle = limit;
        self
    }

    pub fn skip(mut self, steps: impl IntoIterator<Item = StepId>) -> Self {
        self.skip = steps.into_iter().collect();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn sql_credential(mut self, credential: Credential) -> Self {
        self.sql_credential = Some(credential);
        self
    }

    pub fn os_credential(mut self, credential: Credential) -> Self {
        self.os_credential = Some(credential);
        self
    }

    pub fn tunables(mut self, tunables: Tunables) -> Self {
        self.tunables = tunables;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.tunables.chunk_size = chunk_size;
        self
    }

    pub fn retry_backoff_ms(mut self, base_ms: u64) -> Self {
        self.tunables.retry_backoff_base_ms = base_ms;
        self
    }

    pub fn server_budget(mut self, budget: Duration) -> Self {
        self.tunables.server_budget = budget;
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    /// Validate and produce the run configuration
    ///
    /// Creates the output and log directories if missing and probes the
    /// output directory by creating and deleting a temporary file.
    pub fn build(self) -> Result<RunConfig> {
        let servers = normalize_servers(&self.servers)?;
        let throttle = ThrottleLimit::try_from(self.throttle)?;

        if self.tunables.chunk_size == 0 {
            return Err(ScoutError::Configuration(
                "export chunk size must be > 0".to_string(),
            ));
        }
        if self.tunables.server_budget.is_zero() {
            return Err(ScoutError::Configuration(
                "per-server time budget must be > 0".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(ScoutError::Configuration(format!(
                "delimiter must be ASCII, got {:?}",
                self.delimiter
            )));
        }

        ensure_writable_directory(&self.output_directory)?;

        let log_directory = self
            .log_directory
            .unwrap_or_else(|| self.output_directory.join("Logs"));
        std::fs::create_dir_all(&log_directory).map_err(|e| {
            ScoutError::Configuration(format!(
                "Failed to create log directory {}: {}",
                log_directory.display(),
                e
            ))
        })?;

        Ok(RunConfig {
            servers,
            output_directory: self.output_directory,
            log_directory,
            throttle,
            skip: self.skip,
            dry_run: self.dry_run,
            sql_credential: self.sql_credential,
            os_credential: self.os_credential,
            tunables: self.tunables,
            output_mode: self.output_mode,
            delimiter: self.delimiter as u8,
            file_extension: self.file_extension,
        })
    }
}

/// Trim, drop empties and de-duplicate (case-insensitively, first wins)
fn normalize_servers(raw: &[String]) -> Result<Vec<ServerName>> {
    let mut seen = HashSet::new();
    let mut servers = Vec::new();
    for name in raw {
        let Ok(server) = ServerName::new(name.as_str()) else {
            continue;
        };
        if seen.insert(server.as_str().to_ascii_lowercase()) {
            servers.push(server);
        }
    }

    if servers.is_empty() {
        return Err(ScoutError::Configuration(
            "Server list is empty after removing blank entries".to_string(),
        ));
    }

    // Each server must own its output files.
    let mut stems: HashMap<String, &ServerName> = HashMap::new();
    for server in &servers {
        let stem = server.file_stem();
        if let Some(first) = stems.insert(stem.to_ascii_lowercase(), server) {
            return Err(ScoutError::Configuration(format!(
                "Servers '{first}' and '{server}' would write to the same output files ({stem})"
            )));
        }
    }

    Ok(servers)
}

fn ensure_writable_directory(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ScoutError::Configuration(format!(
            "Output directory {} cannot be created: {}",
            dir.display(),
            e
        ))
    })?;

    // The probe file is deleted when dropped.
    tempfile::Builder::new()
        .prefix(".sqlscout-probe-")
        .tempfile_in(dir)
        .map(drop)
        .map_err(|e| {
            ScoutError::Configuration(format!(
                "Output directory {} is not writable: {}",
                dir.display(),
                e
            ))
        })
}

fn credential_from(
    username: &Option<String>,
    password: &Option<crate::config::SecretString>,
) -> Result<Option<Credential>> {
    match (username, password) {
        (Some(user), Some(pw)) => Credential::new(user.clone(), pw.clone())
            .map(Some)
            .map_err(ScoutError::Configuration),
        _ => Ok(None),
    }
}
