use std::{collections::BTreeMap, env, sync::Mutex};

use super::{Error, ErrorKind, Result, ResultExt};

fn default_addr() -> Result<String> {
    env::var("REGISTRY_ADDR").map_err(|_| ErrorKind::MissingRegistryAddr.into())
}

#[cfg(feature = "filesystem")]
fn file_token_fallback() -> Result<String> {
    let path = dirs::home_dir()
        .ok_or(ErrorKind::NoHomeDirectory)?
        .join(".registry-token");

    let token = std::fs::read_to_string(&path)?;
    Ok(token)
}

fn default_token() -> Result<String> {
    env::var("REGISTRY_TOKEN")
        .or_else(|_: env::VarError| -> Result<String> {
            if cfg!(feature = "filesystem") {
                #[cfg(feature = "filesystem")]
                return file_token_fallback();
            }
            bail!("no registry token file outside the cli")
        })
        .chain_err(|| ErrorKind::MissingRegistryToken)
}

/// Behavioural trait for the coordination registry the client talks to
///
/// The registry is a hierarchical tree of string values addressed by slash
/// separated paths, assumed strongly consistent. Implementations own their
/// transport, timeout and retry policy; nothing in this crate retries.
pub trait Registry {
    /// Fetch the value stored at a path
    fn get(&self, path: &str) -> Result<String>;

    /// Overwrite the value at a path, creating the node if absent
    fn update(&self, path: &str, value: &str) -> Result<()>;

    /// Delete a path and the whole subtree beneath it
    fn remove(&self, path: &str) -> Result<()>;
}

/// Connection settings for an HTTP registry gateway
#[derive(Serialize, Deserialize, Clone, Default, Debug)]
pub struct RegistryConfig {
    /// Gateway url up to and including port
    pub url: String,
    /// Root folder all job trees live under
    ///
    /// Typically the cluster name, to disambiguate shared gateways.
    pub namespace: String,
}

impl RegistryConfig {
    pub fn verify(&self) -> Result<()> {
        if self.url == "" {
            bail!("Need to set the registry url");
        }
        if self.namespace == "" {
            bail!("Need to set the registry namespace");
        }
        if self.namespace.contains('/') {
            bail!("registry namespace '{}' cannot contain slashes", self.namespace);
        }
        Ok(())
    }
}

/// Client for a registry tree exposed over an authenticated HTTP gateway
///
/// The gateway maps the tree onto `v1/registry/{namespace}{path}`:
/// GET reads a node, PUT overwrites it, DELETE with `recursive=true`
/// drops the subtree.
pub struct HttpRegistry {
    /// Our HTTP client. This can be configured to mock out the network.
    client: reqwest::blocking::Client,
    /// The address of the gateway.
    addr: reqwest::Url,
    /// The token which we'll use to authenticate.
    token: String,
    /// Root folder all paths are nested under.
    namespace: String,
}

impl HttpRegistry {
    /// Initialize using the same evars the registry CLI uses
    pub fn from_evars() -> Result<HttpRegistry> {
        HttpRegistry::new(
            reqwest::blocking::Client::new(),
            &default_addr()?,
            default_token()?,
            env::var("REGISTRY_NAMESPACE").unwrap_or_else(|_| "jobs".into()),
        )
    }

    /// Initialize from a `RegistryConfig` + REGISTRY_TOKEN evar
    pub fn configured(rc: &RegistryConfig) -> Result<HttpRegistry> {
        rc.verify()?;
        HttpRegistry::new(
            reqwest::blocking::Client::new(),
            &rc.url,
            default_token()?,
            rc.namespace.clone(),
        )
    }

    fn new<U, S>(client: reqwest::blocking::Client, addr: U, token: S, namespace: String) -> Result<HttpRegistry>
    where
        U: reqwest::IntoUrl,
        S: Into<String>,
    {
        let addr = addr.into_url()?;
        Ok(HttpRegistry {
            client,
            addr,
            token: token.into(),
            namespace,
        })
    }

    fn node_url(&self, path: &str) -> Result<reqwest::Url> {
        Ok(self.addr.join(&format!("v1/registry/{}{}", self.namespace, path))?)
    }
}

impl Registry for HttpRegistry {
    fn get(&self, path: &str) -> Result<String> {
        let url = self.node_url(path)?;
        debug!("GET {}", url);

        let mkerr = || ErrorKind::Url(url.clone());
        let res = self
            .client
            .get(url.clone())
            .header("X-Registry-Token", self.token.clone())
            .send()
            .chain_err(&mkerr)?;

        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ErrorKind::PathNotFound(path.into()).into());
        }
        // Generate informative errors for HTTP failures, because these can
        // be caused by everything from bad URLs to overly restrictive ACLs
        if !res.status().is_success() {
            let status = res.status().to_owned();
            let err: Error = ErrorKind::UnexpectedHttpStatus(status).into();
            return Err(err).chain_err(&mkerr);
        }

        Ok(res.text()?)
    }

    fn update(&self, path: &str, value: &str) -> Result<()> {
        let url = self.node_url(path)?;
        debug!("PUT {}", url);

        let mkerr = || ErrorKind::Url(url.clone());
        let res = self
            .client
            .put(url.clone())
            .header("X-Registry-Token", self.token.clone())
            .body(value.to_string())
            .send()
            .chain_err(&mkerr)?;

        if !res.status().is_success() {
            let status = res.status().to_owned();
            let err: Error = ErrorKind::UnexpectedHttpStatus(status).into();
            return Err(err).chain_err(&mkerr);
        }
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<()> {
        let url = self.node_url(&format!("{}?recursive=true", path))?;
        debug!("DELETE {}", url);

        let mkerr = || ErrorKind::Url(url.clone());
        let res = self
            .client
            .delete(url.clone())
            .header("X-Registry-Token", self.token.clone())
            .send()
            .chain_err(&mkerr)?;

        // deleting an absent tree is fine, removal is idempotent
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !res.status().is_success() {
            let status = res.status().to_owned();
            let err: Error = ErrorKind::UnexpectedHttpStatus(status).into();
            return Err(err).chain_err(&mkerr);
        }
        Ok(())
    }
}

/// In-memory registry for anything built on `Registry` that should not
/// touch the network, tests mostly
///
/// Paths behave like the real tree: removal takes the whole subtree.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    data: Mutex<BTreeMap<String, String>>,
}

impl MemoryRegistry {
    pub fn new() -> MemoryRegistry {
        MemoryRegistry::default()
    }

    /// Number of nodes currently stored
    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Registry for MemoryRegistry {
    fn get(&self, path: &str) -> Result<String> {
        let data = self.data.lock().unwrap();
        data.get(path)
            .cloned()
            .ok_or_else(|| ErrorKind::PathNotFound(path.into()).into())
    }

    fn update(&self, path: &str, value: &str) -> Result<()> {
        self.data.lock().unwrap().insert(path.into(), value.into());
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<()> {
        let prefix = format!("{}/", path);
        let mut data = self.data.lock().unwrap();
        data.retain(|k, _| k != path && !k.starts_with(&prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryRegistry, Registry, RegistryConfig};
    use crate::ErrorKind;

    #[test]
    fn memory_registry_round_trips_values() {
        let reg = MemoryRegistry::new();
        reg.update("/test_job/config", "{}").unwrap();
        assert_eq!(reg.get("/test_job/config").unwrap(), "{}");
        reg.update("/test_job/config", "{\"a\":1}").unwrap();
        assert_eq!(reg.get("/test_job/config").unwrap(), "{\"a\":1}");
    }

    #[test]
    fn memory_registry_misses_are_not_found() {
        let reg = MemoryRegistry::new();
        let err = reg.get("/ghost/config").unwrap_err();
        match err.kind() {
            ErrorKind::PathNotFound(p) => assert_eq!(p, "/ghost/config"),
            e => panic!("unexpected error kind: {:?}", e),
        }
    }

    #[test]
    fn memory_registry_removes_subtrees() {
        let reg = MemoryRegistry::new();
        reg.update("/test_job/config", "{}").unwrap();
        reg.update("/test_job/servers/10.0.0.1", "READY").unwrap();
        reg.update("/test_jobber/config", "{}").unwrap();
        reg.remove("/test_job").unwrap();
        assert!(reg.get("/test_job/config").is_err());
        assert!(reg.get("/test_job/servers/10.0.0.1").is_err());
        // sibling with a shared name prefix survives
        assert!(reg.get("/test_jobber/config").is_ok());
        // removing again is a no-op, not an error
        reg.remove("/test_job").unwrap();
    }

    #[test]
    fn registry_config_verifies() {
        let mut rc = RegistryConfig::default();
        assert!(rc.verify().is_err());
        rc.url = "http://registry.local:2379".into();
        assert!(rc.verify().is_err());
        rc.namespace = "prod/jobs".into();
        assert!(rc.verify().is_err());
        rc.namespace = "prod-jobs".into();
        assert!(rc.verify().is_ok());
    }
}
