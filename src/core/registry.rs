//! Collection registry
//!
//! The statically ordered list of collection steps. Order is part of the
//! contract: a server unit executes steps exactly in this order, and a step
//! depends on earlier ones only through the unit's abort state, never through
//! their data.

use crate::domain::{ServerName, SourceKind, StepId};

/// Descriptor of one collection step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStep {
    /// Step identifier
    pub id: StepId,
    /// Output file prefix (`<prefix>_<server>.<ext>`)
    pub prefix: &'static str,
    /// Which client runs the query
    pub source: SourceKind,
    /// CIM class for OS steps, T-SQL text for SQL steps
    pub query: &'static str,
}

impl CollectionStep {
    /// Output file name for this step and server
    pub fn file_name(&self, server: &ServerName, extension: &str) -> String {
        format!("{}_{}.{}", self.prefix, server.file_stem(), extension)
    }
}

static REGISTRY: [CollectionStep; 9] = [
    CollectionStep {
        id: StepId::HostOs,
        prefix: "HostOS",
        source: SourceKind::Os,
        query: "Win32_OperatingSystem",
    },
    CollectionStep {
        id: StepId::HostVolumes,
        prefix: "HostVolumes",
        source: SourceKind::Os,
        query: "Win32_Volume",
    },
    CollectionStep {
        id: StepId::SqlInstanceInfo,
        prefix: "SqlInstance",
        source: SourceKind::Sql,
        query: "SELECT SERVERPROPERTY('MachineName') AS MachineName, \
                SERVERPROPERTY('InstanceName') AS InstanceName, \
                SERVERPROPERTY('ProductVersion') AS ProductVersion, \
                SERVERPROPERTY('ProductLevel') AS ProductLevel, \
                SERVERPROPERTY('Edition') AS Edition, \
                SERVERPROPERTY('Collation') AS Collation, \
                SERVERPROPERTY('IsClustered') AS IsClustered, \
                SERVERPROPERTY('IsHadrEnabled') AS IsHadrEnabled",
    },
    CollectionStep {
        id: StepId::SqlConfiguration,
        prefix: "SqlConfig",
        source: SourceKind::Sql,
        query: "SELECT name, value, value_in_use, is_dynamic, is_advanced \
                FROM sys.configurations ORDER BY name",
    },
    CollectionStep {
        id: StepId::Databases,
        prefix: "Databases",
        source: SourceKind::Sql,
        query: "SELECT d.name, d.database_id, d.state_desc, d.recovery_model_desc, \
                d.compatibility_level, d.collation_name, d.create_date, \
                SUSER_SNAME(d.owner_sid) AS owner_name \
                FROM sys.databases d ORDER BY d.name",
    },
    CollectionStep {
        id: StepId::DatabaseFiles,
        prefix: "DatabaseFiles",
        source: SourceKind::Sql,
        query: "SELECT DB_NAME(mf.database_id) AS database_name, mf.name AS logical_name, \
                mf.physical_name, mf.type_desc, CAST(mf.size AS bigint) * 8 / 1024 AS size_mb, \
                mf.growth, mf.is_percent_growth \
                FROM sys.master_files mf ORDER BY mf.database_id, mf.file_id",
    },
    CollectionStep {
        id: StepId::Logins,
        prefix: "Logins",
        source: SourceKind::Sql,
        query: "SELECT name, type_desc, is_disabled, create_date, default_database_name \
                FROM sys.server_principals WHERE type IN ('S', 'U', 'G') ORDER BY name",
    },
    CollectionStep {
        id: StepId::AgentJobs,
        prefix: "AgentJobs",
        source: SourceKind::Sql,
        query: "SELECT j.name, j.enabled, c.name AS category, \
                SUSER_SNAME(j.owner_sid) AS owner_name, j.date_created, j.date_modified \
                FROM msdb.dbo.sysjobs j \
                LEFT JOIN msdb.dbo.syscategories c ON c.category_id = j.category_id \
                ORDER BY j.name",
    },
    CollectionStep {
        id: StepId::LinkedServers,
        prefix: "LinkedServers",
        source: SourceKind::Sql,
        query: "SELECT name, product, provider, data_source, is_remote_login_enabled \
                FROM sys.servers WHERE is_linked = 1 ORDER BY name",
    },
];

/// All collection steps in execution order
pub fn steps() -> &'static [CollectionStep] {
    &REGISTRY
}

/// Descriptor for a step identifier
pub fn step(id: StepId) -> &'static CollectionStep {
    // REGISTRY is declared in StepId order.
    &REGISTRY[id as usize]
}
