//! Named engines.

use std::sync::Arc;

use search_layer_shared::Schema;
use tracing::info;

use crate::algolia::{AlgoliaAdapter, HttpAlgoliaClient};
use crate::config::{AdapterDsn, EngineConfig, RegistryConfig};
use crate::engine::Engine;
use crate::errors::SearchError;
use crate::interfaces::Adapter;
use crate::memory::MemoryAdapter;
use crate::multi::MultiAdapter;
use crate::opensearch::OpenSearchAdapter;
use crate::read_write::ReadWriteAdapter;
use crate::typesense::{HttpTypesenseClient, TypesenseAdapter};

/// Engines looked up by name. Iteration follows registration order.
#[derive(Default)]
pub struct EngineRegistry {
    engines: Vec<(String, Arc<Engine>)>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine, replacing any engine already registered under
    /// the same name in place.
    pub fn add_engine(&mut self, name: impl Into<String>, engine: Arc<Engine>) {
        let name = name.into();
        match self.engines.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = engine,
            None => self.engines.push((name, engine)),
        }
    }

    pub fn get_engine(&self, name: &str) -> Result<Arc<Engine>, SearchError> {
        self.engines
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, engine)| engine.clone())
            .ok_or_else(|| SearchError::unknown_engine(name))
    }

    pub fn engines(&self) -> impl Iterator<Item = (&str, &Arc<Engine>)> {
        self.engines.iter().map(|(name, engine)| (name.as_str(), engine))
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Build a registry with a single memory engine, handy in tests.
    pub fn memory(name: impl Into<String>, schema: Arc<Schema>) -> Self {
        let mut registry = Self::new();
        registry.add_engine(
            name,
            Arc::new(Engine::with_config(
                Arc::new(MemoryAdapter::new()),
                schema,
                EngineConfig::default(),
            )),
        );
        registry
    }

    /// Build one engine per configured DSN, all serving `schema`.
    ///
    /// `multi` and `read-write` DSNs refer to engines by name and may only
    /// name engines declared before them.
    ///
    /// # Returns
    ///
    /// * `Ok(EngineRegistry)` - The engines in declaration order
    /// * `Err(SearchError::ConfigError)` - If a DSN is malformed, names an unknown scheme
    ///   or refers to an engine not declared before it
    pub fn from_config(schema: Arc<Schema>, config: RegistryConfig) -> Result<Self, SearchError> {
        let mut registry = Self::new();

        for (name, dsn) in &config.engines {
            let adapter = registry.build_adapter(name, dsn)?;
            info!(engine = %name, scheme = %dsn.scheme(), "Registered engine");
            registry.add_engine(
                name.clone(),
                Arc::new(Engine::with_config(adapter, schema.clone(), config.engine.clone())),
            );
        }

        Ok(registry)
    }

    fn build_adapter(&self, name: &str, dsn: &AdapterDsn) -> Result<Arc<dyn Adapter>, SearchError> {
        let adapter: Arc<dyn Adapter> = match dsn.scheme() {
            "memory" => Arc::new(MemoryAdapter::new()),
            "opensearch" => {
                let url = http_url(dsn, "opensearch", 9200)?;
                let credentials = match (dsn.user(), dsn.password()) {
                    (Some(user), Some(password)) => Some((user.to_string(), password.to_string())),
                    _ => None,
                };
                Arc::new(OpenSearchAdapter::connect(&url, credentials)?)
            }
            "algolia" => {
                let (application_id, api_key) = match (dsn.host(), dsn.user()) {
                    (Some(application_id), Some(api_key)) => (application_id, api_key),
                    _ => {
                        return Err(SearchError::config(format!(
                            "Engine \"{}\" needs algolia://API_KEY@APPLICATION_ID",
                            name
                        )))
                    }
                };
                let mut client = HttpAlgoliaClient::new(application_id, api_key)?;
                if let Some(host) = dsn.query("host") {
                    client = client.with_host(&host)?;
                }
                Arc::new(AlgoliaAdapter::new(Arc::new(client)))
            }
            "typesense" => {
                let api_key = dsn.user().ok_or_else(|| {
                    SearchError::config(format!(
                        "Engine \"{}\" needs typesense://API_KEY@host:port",
                        name
                    ))
                })?;
                let url = http_url(dsn, "typesense", 8108)?;
                Arc::new(TypesenseAdapter::new(Arc::new(HttpTypesenseClient::new(
                    &url, api_key,
                )?)))
            }
            "multi" => {
                let names: Vec<String> = dsn
                    .host()
                    .map(str::to_string)
                    .into_iter()
                    .chain(dsn.query_all("adapters"))
                    .collect();
                if names.is_empty() {
                    return Err(SearchError::config(format!(
                        "Engine \"{}\" does not name any adapter",
                        name
                    )));
                }

                let mut adapters = Vec::with_capacity(names.len());
                for reference in names {
                    let adapter = self.referenced(name, &reference)?;
                    adapters.push((reference, adapter));
                }
                Arc::new(MultiAdapter::new(adapters))
            }
            "read-write" => {
                let read = dsn.host().ok_or_else(|| {
                    SearchError::config(format!("Engine \"{}\" does not name a read engine", name))
                })?;
                let write = dsn.query("write").ok_or_else(|| {
                    SearchError::config(format!("Engine \"{}\" does not name a write engine", name))
                })?;
                Arc::new(ReadWriteAdapter::new(
                    self.referenced(name, read)?,
                    self.referenced(name, &write)?,
                ))
            }
            scheme => {
                return Err(SearchError::config(format!(
                    "Engine \"{}\" uses unknown scheme \"{}\"",
                    name, scheme
                )))
            }
        };

        Ok(adapter)
    }

    /// Adapter of an already registered engine.
    fn referenced(&self, name: &str, reference: &str) -> Result<Arc<dyn Adapter>, SearchError> {
        self.get_engine(reference)
            .map(|engine| engine.adapter())
            .map_err(|_| {
                SearchError::config(format!(
                    "Engine \"{}\" refers to \"{}\" which is not declared before it",
                    name, reference
                ))
            })
    }
}

/// Plain HTTP base url of a host based DSN. `?tls=true` switches to HTTPS.
fn http_url(dsn: &AdapterDsn, backend: &str, default_port: u16) -> Result<String, SearchError> {
    let host = dsn
        .host()
        .ok_or_else(|| SearchError::config(format!("{} DSN \"{}\" has no host", backend, dsn)))?;
    let scheme = match dsn.query("tls").as_deref() {
        Some("true") | Some("1") => "https",
        _ => "http",
    };

    Ok(format!(
        "{}://{}:{}",
        scheme,
        host,
        dsn.port().unwrap_or(default_port)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_layer_shared::{Field, Index};

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(vec![Index::new("blog", vec![Field::identifier("id")]).unwrap()]).unwrap(),
        )
    }

    fn config(entries: &[(&str, &str)]) -> RegistryConfig {
        entries
            .iter()
            .fold(RegistryConfig::default(), |config, (name, dsn)| {
                config.with_engine(*name, dsn).unwrap()
            })
    }

    #[test]
    fn test_builds_in_declaration_order() {
        let registry = EngineRegistry::from_config(
            schema(),
            config(&[
                ("default", "memory://"),
                ("mirror", "memory://"),
                ("both", "multi://default?adapters[]=mirror"),
                ("split", "read-write://default?write=both"),
                ("search", "opensearch://127.0.0.1:9200"),
                ("typesense", "typesense://S3CR3T@127.0.0.1:8108"),
                ("algolia", "algolia://KEY@APPLICATION"),
            ]),
        )
        .unwrap();

        let names: Vec<_> = registry.engines().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["default", "mirror", "both", "split", "search", "typesense", "algolia"]
        );
        assert!(registry.get_engine("split").is_ok());
    }

    #[test]
    fn test_unknown_engine() {
        let registry = EngineRegistry::memory("default", schema());

        assert!(matches!(
            registry.get_engine("other"),
            Err(SearchError::UnknownEngine(name)) if name == "other"
        ));
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let result = EngineRegistry::from_config(
            schema(),
            config(&[("split", "read-write://default?write=default"), ("default", "memory://")]),
        );

        assert!(matches!(result, Err(SearchError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_dsns() {
        for dsn in [
            "redis://127.0.0.1:6379",
            "multi://",
            "read-write://default",
            "typesense://127.0.0.1:8108",
            "algolia://APPLICATION",
        ] {
            let result = EngineRegistry::from_config(
                schema(),
                config(&[("default", "memory://"), ("broken", dsn)]),
            );
            assert!(
                matches!(result, Err(SearchError::ConfigError(_))),
                "{} should be rejected",
                dsn
            );
        }
    }

    #[tokio::test]
    async fn test_read_write_shares_adapters() {
        let registry = EngineRegistry::from_config(
            schema(),
            config(&[
                ("reader", "memory://"),
                ("writer", "memory://"),
                ("split", "read-write://reader?write=writer"),
            ]),
        )
        .unwrap();

        let split = registry.get_engine("split").unwrap();
        split.create_index("blog", Default::default()).await.unwrap();

        let writer = registry.get_engine("writer").unwrap();
        let reader = registry.get_engine("reader").unwrap();
        assert!(writer.exists_index("blog").await.unwrap());
        assert!(!reader.exists_index("blog").await.unwrap());
    }
}
