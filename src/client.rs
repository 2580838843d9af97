use super::registry::Registry;
use super::settings::JobSettings;
use super::{ErrorKind, Result, ResultExt};

fn config_path(job_name: &str) -> String {
    format!("/{}/config", job_name)
}

fn job_path(job_name: &str) -> String {
    format!("/{}", job_name)
}

/// Typed access to the settings documents of a registry backed job cluster
///
/// Every operation is a single one-shot round trip against the injected
/// registry; no state is held between calls, so one client can be shared
/// freely. A read-then-write sequence is last-write-wins, the registry is
/// not asked for compare-and-swap.
pub struct SettingsClient<R> {
    registry: R,
}

impl<R: Registry> SettingsClient<R> {
    pub fn new(registry: R) -> SettingsClient<R> {
        SettingsClient { registry }
    }

    /// Fetch and decode the settings document of one job
    ///
    /// The returned record mirrors the stored document with defaults filled
    /// in for whatever it omits; its jobName is the document's, not the
    /// argument.
    pub fn get_job_settings(&self, job_name: &str) -> Result<JobSettings> {
        let path = config_path(job_name);
        debug!("reading settings at {}", path);
        let raw = self.registry.get(&path)?;
        serde_json::from_str(&raw).chain_err(|| ErrorKind::InvalidDocument(path))
    }

    /// Validate a settings record and overwrite the stored document
    ///
    /// The write is a full replace of `/{jobName}/config`, never a merge
    /// with the previous document. Validation failures surface before any
    /// registry traffic happens.
    pub fn update_job_settings(&self, settings: &JobSettings) -> Result<()> {
        settings.verify()?;
        let doc = serde_json::to_string(settings)?;
        let path = config_path(&settings.jobName);
        debug!("writing settings at {}", path);
        self.registry.update(&path, &doc)
    }

    /// Drop a job's whole registry subtree, settings document included
    pub fn remove_job_settings(&self, job_name: &str) -> Result<()> {
        let path = job_path(job_name);
        debug!("removing {}", path);
        self.registry.remove(&path)
    }
}
