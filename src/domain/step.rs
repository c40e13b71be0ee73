//! Collection step identifiers
//!
//! Every inventory domain sqlscout collects has a [`StepId`]. The enumeration
//! is closed: skip sets, registry entries and accumulator tags all use it, so
//! a misspelt step name is rejected at configuration time instead of being
//! silently ignored.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Which client a step's query goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Host operating system query (CIM/WMI class)
    Os,
    /// SQL Server instance query (T-SQL)
    Sql,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Os => write!(f, "os"),
            SourceKind::Sql => write!(f, "sql"),
        }
    }
}

/// Identifier of a collection step
///
/// Declaration order matches registry order, so `Ord` sorts steps the way
/// they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepId {
    HostOs,
    HostVolumes,
    SqlInstanceInfo,
    SqlConfiguration,
    Databases,
    DatabaseFiles,
    Logins,
    AgentJobs,
    LinkedServers,
}

impl StepId {
    /// All step identifiers in execution order
    pub const ALL: [StepId; 9] = [
        StepId::HostOs,
        StepId::HostVolumes,
        StepId::SqlInstanceInfo,
        StepId::SqlConfiguration,
        StepId::Databases,
        StepId::DatabaseFiles,
        StepId::Logins,
        StepId::AgentJobs,
        StepId::LinkedServers,
    ];

    /// Canonical name, as written in configuration files and logs
    pub fn name(&self) -> &'static str {
        match self {
            StepId::HostOs => "HostOS",
            StepId::HostVolumes => "HostVolumes",
            StepId::SqlInstanceInfo => "SqlInstanceInfo",
            StepId::SqlConfiguration => "SqlConfiguration",
            StepId::Databases => "Databases",
            StepId::DatabaseFiles => "DatabaseFiles",
            StepId::Logins => "Logins",
            StepId::AgentJobs => "AgentJobs",
            StepId::LinkedServers => "LinkedServers",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StepId {
    type Err = String;

    /// Parses a step name case-insensitively, ignoring `_`, `-` and spaces
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        StepId::ALL
            .iter()
            .copied()
            .find(|step| step.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = StepId::ALL.iter().map(|s| s.name()).collect();
                format!(
                    "Unknown collection step '{}'. Must be one of: {}",
                    s,
                    known.join(", ")
                )
            })
    }
}

impl Serialize for StepId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for StepId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StepId::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("AgentJobs", StepId::AgentJobs ; "canonical")]
    #[test_case("agent_jobs", StepId::AgentJobs ; "snake case")]
    #[test_case("AGENTJOBS", StepId::AgentJobs ; "upper case")]
    #[test_case("hostos", StepId::HostOs ; "host os lower")]
    #[test_case("Sql-Instance-Info", StepId::SqlInstanceInfo ; "dashed")]
    fn test_step_id_parse(input: &str, expected: StepId) {
        assert_eq!(StepId::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_step_id_parse_unknown() {
        let err = StepId::from_str("Backups").unwrap_err();
        assert!(err.contains("Backups"));
        assert!(err.contains("AgentJobs"));
    }

    #[test]
    fn test_step_id_order_matches_all() {
        let mut sorted = StepId::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, StepId::ALL.to_vec());
    }

    #[test]
    fn test_step_id_serde() {
        let json = serde_json::to_string(&StepId::HostOs).unwrap();
        assert_eq!(json, "\"HostOS\"");
        let parsed: StepId = serde_json::from_str("\"databases\"").unwrap();
        assert_eq!(parsed, StepId::Databases);
    }
}
