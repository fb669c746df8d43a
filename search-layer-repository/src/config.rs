//! Configuration types for engines and the engine registry.

use std::env;

use url::Url;

use crate::errors::SearchError;

/// Environment variable listing the engines to build, as `name=dsn` entries
/// separated by `;`.
pub const ENGINES_ENV: &str = "SEARCH_ENGINES";

/// Environment variable overriding the bulk batch size limit. `0` disables
/// the limit.
pub const MAX_BATCH_SIZE_ENV: &str = "SEARCH_MAX_BATCH_SIZE";

/// Configuration for an [`Engine`](crate::Engine).
///
/// Bounds bulk requests so a caller cannot accidentally send an overly
/// large batch to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of operations allowed in a single bulk request.
    ///
    /// Set to `None` to disable the limit. Defaults to 1000.
    pub max_batch_size: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
        }
    }
}

impl EngineConfig {
    /// Create a config with no batch size limit.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    /// Create a config with a custom batch size limit.
    ///
    /// # Arguments
    ///
    /// * `max_batch_size` - Maximum number of operations allowed in a single bulk request
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }
}

/// A backend connection string such as `typesense://S3CR3T@127.0.0.1:8108`.
///
/// The scheme selects the adapter; host, port, credentials and query
/// parameters are interpreted by that adapter.
///
/// # Example
///
/// ```
/// use search_layer_repository::config::AdapterDsn;
///
/// let dsn = AdapterDsn::parse("read-write://replica?write=primary").unwrap();
/// assert_eq!(dsn.scheme(), "read-write");
/// assert_eq!(dsn.host(), Some("replica"));
/// assert_eq!(dsn.query("write").as_deref(), Some("primary"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterDsn {
    url: Url,
}

impl AdapterDsn {
    pub fn parse(dsn: &str) -> Result<Self, SearchError> {
        let url = Url::parse(dsn)
            .map_err(|e| SearchError::config(format!("Invalid DSN \"{}\": {}", dsn, e)))?;
        Ok(Self { url })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str().filter(|host| !host.is_empty())
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn user(&self) -> Option<&str> {
        Some(self.url.username()).filter(|user| !user.is_empty())
    }

    pub fn password(&self) -> Option<&str> {
        self.url.password()
    }

    /// First value of a query parameter.
    pub fn query(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Every value of a query parameter, accepting both `key=a&key=b` and
    /// `key[]=a&key[]=b`.
    pub fn query_all(&self, key: &str) -> Vec<String> {
        let list_key = format!("{}[]", key);
        self.url
            .query_pairs()
            .filter(|(k, _)| *k == key || *k == list_key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    /// `host[:port]`, if a host is present.
    pub fn authority(&self) -> Option<String> {
        let host = self.host()?;
        Some(match self.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Display for AdapterDsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Engines to build, in declaration order, plus the configuration they
/// share.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    pub engines: Vec<(String, AdapterDsn)>,
    pub engine: EngineConfig,
}

impl RegistryConfig {
    /// Add an engine.
    pub fn with_engine(mut self, name: impl Into<String>, dsn: &str) -> Result<Self, SearchError> {
        self.engines.push((name.into(), AdapterDsn::parse(dsn)?));
        Ok(self)
    }

    /// Read the configuration from [`ENGINES_ENV`] and [`MAX_BATCH_SIZE_ENV`].
    ///
    /// # Returns
    ///
    /// * `Ok(RegistryConfig)` - The parsed configuration
    /// * `Err(SearchError::ConfigError)` - If a variable is missing or malformed
    pub fn from_env() -> Result<Self, SearchError> {
        let engines = env::var(ENGINES_ENV)
            .map_err(|_| SearchError::config(format!("{} not set", ENGINES_ENV)))?;

        let engine = match env::var(MAX_BATCH_SIZE_ENV) {
            Ok(value) => parse_max_batch_size(&value)?,
            Err(_) => EngineConfig::default(),
        };

        Ok(Self {
            engines: parse_engines(&engines)?,
            engine,
        })
    }
}

/// Parse `name=dsn` entries separated by `;`. Blank entries are skipped.
pub fn parse_engines(value: &str) -> Result<Vec<(String, AdapterDsn)>, SearchError> {
    let mut engines: Vec<(String, AdapterDsn)> = Vec::new();

    for entry in value.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, dsn) = entry
            .split_once('=')
            .ok_or_else(|| SearchError::config(format!("Expected name=dsn, got \"{}\"", entry)))?;
        let name = name.trim();

        if name.is_empty() {
            return Err(SearchError::config(format!("Missing engine name in \"{}\"", entry)));
        }
        if engines.iter().any(|(existing, _)| existing == name) {
            return Err(SearchError::config(format!("Engine \"{}\" declared twice", name)));
        }

        engines.push((name.to_string(), AdapterDsn::parse(dsn.trim())?));
    }

    Ok(engines)
}

fn parse_max_batch_size(value: &str) -> Result<EngineConfig, SearchError> {
    let size: usize = value.trim().parse().map_err(|_| {
        SearchError::config(format!("{} must be a number, got \"{}\"", MAX_BATCH_SIZE_ENV, value))
    })?;

    Ok(match size {
        0 => EngineConfig::unlimited(),
        size => EngineConfig::with_max_batch_size(size),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert_eq!(EngineConfig::default().max_batch_size, Some(1000));
        assert_eq!(EngineConfig::unlimited().max_batch_size, None);
        assert_eq!(EngineConfig::with_max_batch_size(10).max_batch_size, Some(10));
    }

    #[test]
    fn test_dsn_parts() {
        let dsn = AdapterDsn::parse("typesense://S3CR3T@127.0.0.1:8108").unwrap();

        assert_eq!(dsn.scheme(), "typesense");
        assert_eq!(dsn.user(), Some("S3CR3T"));
        assert_eq!(dsn.password(), None);
        assert_eq!(dsn.authority().as_deref(), Some("127.0.0.1:8108"));
    }

    #[test]
    fn test_memory_dsn_has_no_host() {
        let dsn = AdapterDsn::parse("memory://").unwrap();

        assert_eq!(dsn.scheme(), "memory");
        assert_eq!(dsn.host(), None);
        assert_eq!(dsn.user(), None);
    }

    #[test]
    fn test_query_lists() {
        let dsn = AdapterDsn::parse("multi://primary?adapters[]=mirror&adapters=backup").unwrap();

        assert_eq!(dsn.host(), Some("primary"));
        assert_eq!(dsn.query_all("adapters"), vec!["mirror", "backup"]);
    }

    #[test]
    fn test_invalid_dsn() {
        assert!(matches!(
            AdapterDsn::parse("not a dsn"),
            Err(SearchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_parse_engines_keeps_order() {
        let engines =
            parse_engines("search=memory:// ; os=opensearch://127.0.0.1:9200;;").unwrap();

        let names: Vec<_> = engines.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["search", "os"]);
        assert_eq!(engines[1].1.port(), Some(9200));
    }

    #[test]
    fn test_parse_engines_rejects_duplicates() {
        assert!(matches!(
            parse_engines("a=memory://;a=memory://"),
            Err(SearchError::ConfigError(_))
        ));
        assert!(matches!(
            parse_engines("memory://"),
            Err(SearchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_parse_max_batch_size() {
        assert_eq!(parse_max_batch_size("0").unwrap(), EngineConfig::unlimited());
        assert_eq!(
            parse_max_batch_size("250").unwrap(),
            EngineConfig::with_max_batch_size(250)
        );
        assert!(parse_max_batch_size("many").is_err());
    }
}
