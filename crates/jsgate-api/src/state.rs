//! # Application State
//!
//! Configuration and shared state for the jsgate server.
//!
//! The state owns one [`SchemaCache`] for the lifetime of the application.
//! Every schema the server knows about is compiled during
//! [`AppState::bootstrap`], before the listener is bound.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use jsgate_schema::{
    CompileError, CompiledSchema, Dialect, SchemaCache, SchemaCatalog, SchemaLoadError,
    SchemaOptions,
};
use thiserror::Error;

use crate::body::DEFAULT_BODY_LIMIT;
use crate::middleware::SchemaGate;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port (`PORT`, default 8080).
    pub port: u16,
    /// Largest body buffered for validation (`JSGATE_BODY_LIMIT`, bytes).
    pub body_limit: usize,
    /// Directory of `*.schema.json` files served under `/v1/validate/{name}`
    /// (`JSGATE_SCHEMA_DIR`).
    pub schema_dir: Option<PathBuf>,
    /// Compiler options (`JSGATE_DRAFT`, `JSGATE_VALIDATE_FORMATS`).
    pub schema_options: SchemaOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            body_limit: DEFAULT_BODY_LIMIT,
            schema_dir: None,
            schema_options: SchemaOptions::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// Unset variables fall back to defaults; set but unparsable values are
    /// errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = get("PORT") {
            config.port = parse_var("PORT", &port)?;
        }
        if let Some(limit) = get("JSGATE_BODY_LIMIT") {
            config.body_limit = parse_var("JSGATE_BODY_LIMIT", &limit)?;
        }
        if let Some(dir) = get("JSGATE_SCHEMA_DIR").filter(|d| !d.is_empty()) {
            config.schema_dir = Some(PathBuf::from(dir));
        }
        if let Some(draft) = get("JSGATE_DRAFT") {
            let dialect = draft
                .parse::<Dialect>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "JSGATE_DRAFT",
                    reason,
                })?;
            config.schema_options.dialect = Some(dialect);
        }
        if let Some(formats) = get("JSGATE_VALIDATE_FORMATS") {
            config.schema_options.validate_formats = parse_var("JSGATE_VALIDATE_FORMATS", &formats)?;
        }

        Ok(config)
    }
}

fn parse_var<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

/// Invalid configuration value.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Startup failed before the server could accept traffic.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Load(#[from] SchemaLoadError),

    #[error("schema '{name}' does not compile: {source}")]
    Compile {
        name: String,
        #[source]
        source: CompileError,
    },
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gate: SchemaGate,
    /// Compiled catalog schemas, by name.
    pub catalog: Arc<BTreeMap<String, Arc<CompiledSchema>>>,
}

impl AppState {
    /// State with default configuration and an empty catalog.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// State for `config` without loading the schema directory.
    pub fn with_config(config: AppConfig) -> Self {
        let gate = SchemaGate::new(SchemaCache::with_options(config.schema_options))
            .with_body_limit(config.body_limit);
        Self {
            config,
            gate,
            catalog: Arc::new(BTreeMap::new()),
        }
    }

    /// Build state for `config`, loading and compiling every catalog schema.
    pub fn bootstrap(config: AppConfig) -> Result<Self, BootstrapError> {
        let mut state = Self::with_config(config);

        let catalog = match &state.config.schema_dir {
            Some(dir) => SchemaCatalog::load_dir(dir)?,
            None => SchemaCatalog::new(),
        };
        state.catalog = Arc::new(state.compile_catalog(&catalog)?);

        tracing::info!(
            catalog = state.catalog.len(),
            cached = state.gate.cache().len(),
            "schemas compiled"
        );
        Ok(state)
    }

    fn compile_catalog(
        &self,
        catalog: &SchemaCatalog,
    ) -> Result<BTreeMap<String, Arc<CompiledSchema>>, BootstrapError> {
        let cache = self.gate.cache();
        let compiled = cache.preload(catalog.sources()).map_err(|source| {
            // Preload stops at the first failure; every source before it is cached.
            let name = catalog
                .iter()
                .find(|(_, text)| !cache.contains(text))
                .map(|(name, _)| name.to_string())
                .unwrap_or_default();
            BootstrapError::Compile { name, source }
        })?;

        Ok(catalog
            .iter()
            .map(|(name, _)| name.to_string())
            .zip(compiled)
            .collect())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl FromRef<AppState> for SchemaGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert!(config.schema_dir.is_none());
        assert_eq!(config.schema_options, SchemaOptions::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("JSGATE_BODY_LIMIT", "4096"),
            ("JSGATE_SCHEMA_DIR", "/etc/jsgate/schemas"),
            ("JSGATE_DRAFT", "draft7"),
            ("JSGATE_VALIDATE_FORMATS", "true"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.body_limit, 4096);
        assert_eq!(config.schema_dir, Some(PathBuf::from("/etc/jsgate/schemas")));
        assert_eq!(config.schema_options.dialect, Some(Dialect::Draft7));
        assert!(config.schema_options.validate_formats);
    }

    #[test]
    fn rejects_bad_values() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(AppConfig::from_lookup(lookup(&[("JSGATE_DRAFT", "draft3")])).is_err());
    }

    #[test]
    fn bootstrap_compiles_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("order.schema.json"),
            r#"{"type":"object","required":["sku"]}"#,
        )
        .unwrap();

        let state = AppState::bootstrap(AppConfig {
            schema_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        })
        .unwrap();
        assert_eq!(state.catalog.len(), 1);
        assert!(state.catalog.contains_key("order"));
        assert_eq!(state.gate.cache().len(), 1);
    }

    #[test]
    fn bootstrap_fails_on_bad_schema() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.schema.json"), r#"{"a": "#).unwrap();

        let err = AppState::bootstrap(AppConfig {
            schema_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        })
        .unwrap_err();
        match err {
            BootstrapError::Compile { name, .. } => assert_eq!(name, "broken"),
            other => panic!("expected Compile, got: {other}"),
        }
    }

    #[test]
    fn bootstrap_names_failing_schema_after_good_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a-good.schema.json"), r#"{"type":"object"}"#).unwrap();
        std::fs::write(dir.path().join("b-bad.schema.json"), r#"{"type": 12}"#).unwrap();
        std::fs::write(dir.path().join("c-good.schema.json"), r#"{"type":"array"}"#).unwrap();

        let state = AppState::with_config(AppConfig {
            schema_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        });
        let catalog = SchemaCatalog::load_dir(dir.path()).unwrap();
        match state.compile_catalog(&catalog).unwrap_err() {
            BootstrapError::Compile { name, .. } => assert_eq!(name, "b-bad"),
            other => panic!("expected Compile, got: {other}"),
        }
        assert_eq!(state.gate.cache().len(), 1);
    }
}
