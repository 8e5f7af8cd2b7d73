//! # Schema Cache
//!
//! Process-scoped map from schema text to compiled schema.
//!
//! ## Locking
//!
//! `resolve` is double-checked: a shared read lock serves hits, and only a
//! miss takes the write lock, re-checks, and compiles while holding it. Once
//! warm, concurrent requests only ever share the read lock. Compilation for a
//! given source runs at most once; racing callers all receive the same
//! `Arc<CompiledSchema>`.
//!
//! The lock is `parking_lot::RwLock` and is never held across an `.await`.
//!
//! ## Lifecycle
//!
//! Entries are never evicted or replaced. Failed compiles are not recorded,
//! so resolving an invalid source repeats the compile and fails again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::compiler::{CompiledSchema, JsonSchemaCompiler, SchemaCompiler, SchemaOptions};
use crate::error::CompileError;
use crate::source::SchemaSource;

/// Thread-safe, cloneable compile-once schema cache.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct SchemaCache {
    entries: Arc<RwLock<HashMap<SchemaSource, Arc<CompiledSchema>>>>,
    compiler: Arc<dyn SchemaCompiler>,
}

impl SchemaCache {
    /// Empty cache using [`JsonSchemaCompiler`] with default options.
    pub fn new() -> Self {
        Self::with_compiler(JsonSchemaCompiler::default())
    }

    /// Empty cache using [`JsonSchemaCompiler`] with explicit options.
    pub fn with_options(options: SchemaOptions) -> Self {
        Self::with_compiler(JsonSchemaCompiler::new(options))
    }

    /// Empty cache using a custom compiler.
    pub fn with_compiler(compiler: impl SchemaCompiler + 'static) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            compiler: Arc::new(compiler),
        }
    }

    /// Return the compiled form of `source`, compiling it on first use.
    pub fn resolve(&self, source: impl AsRef<str>) -> Result<Arc<CompiledSchema>, CompileError> {
        let text = source.as_ref();

        if let Some(hit) = self.entries.read().get(text) {
            return Ok(Arc::clone(hit));
        }

        let mut entries = self.entries.write();
        if let Some(hit) = entries.get(text) {
            tracing::trace!("schema compiled by a concurrent caller");
            return Ok(Arc::clone(hit));
        }

        let source = SchemaSource::new(text);
        let compiled = match CompiledSchema::compile(source.clone(), self.compiler.as_ref()) {
            Ok(compiled) => Arc::new(compiled),
            Err(err) => {
                tracing::debug!(error = %err, "schema compile failed");
                return Err(err);
            }
        };
        entries.insert(source, Arc::clone(&compiled));
        tracing::debug!(cached = entries.len(), "compiled and cached schema");

        Ok(compiled)
    }

    /// Compile every source up front, stopping at the first failure.
    ///
    /// Intended for startup, so that no request is ever served against a
    /// schema that does not compile.
    pub fn preload<I>(&self, sources: I) -> Result<Vec<Arc<CompiledSchema>>, CompileError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        sources.into_iter().map(|source| self.resolve(source)).collect()
    }

    /// True if `source` has already been compiled.
    pub fn contains(&self, source: impl AsRef<str>) -> bool {
        self.entries.read().contains_key(source.as_ref())
    }

    /// Number of compiled schemas.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
