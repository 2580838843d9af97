use std::collections::BTreeMap;

use super::{ErrorKind, Result};

/// Key under `jobProperties` naming the executor service handler implementation
pub const EXECUTOR_SERVICE_HANDLER: &str = "executor_service_handler";

/// Key under `jobProperties` naming the job exception handler implementation
pub const JOB_EXCEPTION_HANDLER: &str = "job_exception_handler";

/// The full settings record for one job
///
/// Stored as a single JSON document at `/{jobName}/config` in the registry.
/// Declaration order is wire order and the empty optional strings are left
/// out of the document entirely; stored documents depend on both, so
/// neither can change without a migration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobSettings {
    /// Job name, doubles as the path component of the registry subtree
    pub jobName: String,

    /// Descriptive tag, e.g. "DATAFLOW" or "SCRIPT"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jobType: String,

    /// Fully qualified identifier of the executable job implementation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jobClass: String,

    /// Cron expression the trigger fires on
    pub cron: String,

    /// How many shards the job is cut into
    pub shardingTotalCount: u32,

    /// Per shard parameter overrides, e.g. "0=a,1=b"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shardingItemParameters: String,

    /// Free form parameter handed to every shard
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jobParameter: String,

    /// Track execution state in the registry while shards run
    #[serde(default)]
    pub monitorExecution: bool,

    /// Dataflow jobs only: keep fetching until the source drains
    #[serde(default)]
    pub streamingProcess: bool,

    /// Script jobs only: command line handed to the shell
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scriptCommandLine: String,

    /// Tolerated clock drift against the registry in seconds, -1 skips the check
    #[serde(default = "max_time_diff_seconds_default")]
    pub maxTimeDiffSeconds: i32,

    /// Port of the dump service, -1 leaves it off
    #[serde(default = "monitor_port_default")]
    pub monitorPort: i32,

    /// Hand crashed shards to surviving nodes
    #[serde(default)]
    pub failover: bool,

    /// Re-fire triggers that overlapped a still running shard
    #[serde(default = "misfire_default")]
    pub misfire: bool,

    /// Sharding strategy implementation, empty picks the default strategy
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jobShardingStrategyClass: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Pluggable handler identifiers, keyed by the well-known constants above
    #[serde(default)]
    pub jobProperties: BTreeMap<String, String>,

    /// How often the reconcile service repairs sharding state
    #[serde(default = "reconcile_interval_minutes_default")]
    pub reconcileIntervalMinutes: i32,
}

// -1 is the documented "don't check" sentinel
fn max_time_diff_seconds_default() -> i32 {
    -1
}
// -1 keeps the dump service off
fn monitor_port_default() -> i32 {
    -1
}
fn misfire_default() -> bool {
    true
}
fn reconcile_interval_minutes_default() -> i32 {
    10
}

// Fresh records carry the documented wire defaults, not zero values
impl Default for JobSettings {
    fn default() -> Self {
        JobSettings {
            jobName: "".into(),
            jobType: "".into(),
            jobClass: "".into(),
            cron: "".into(),
            shardingTotalCount: 0,
            shardingItemParameters: "".into(),
            jobParameter: "".into(),
            monitorExecution: false,
            streamingProcess: false,
            scriptCommandLine: "".into(),
            maxTimeDiffSeconds: max_time_diff_seconds_default(),
            monitorPort: monitor_port_default(),
            failover: false,
            misfire: misfire_default(),
            jobShardingStrategyClass: "".into(),
            description: "".into(),
            jobProperties: BTreeMap::new(),
            reconcileIntervalMinutes: reconcile_interval_minutes_default(),
        }
    }
}

impl JobSettings {
    /// Verify assumptions about the record before it is written
    ///
    /// Check order matters: callers see the first failing field only.
    pub fn verify(&self) -> Result<()> {
        if self.jobName.is_empty() {
            bail!(ErrorKind::InvalidSettings("jobName".into()));
        }
        if self.cron.is_empty() {
            bail!(ErrorKind::InvalidSettings("cron".into()));
        }
        if self.shardingTotalCount < 1 {
            bail!(ErrorKind::InvalidSettings("shardingTotalCount".into()));
        }
        Ok(())
    }
}
