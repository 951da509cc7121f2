//! Connector abstractions and the profile registry.
//!
//! Fedgate uses a pluggable source architecture where each external
//! system implements the [`Fragmenter`] trait (fragment enumeration) and
//! the [`Accessor`] trait (fragment I/O). This module manages their
//! registration and lookup by profile name.
//!
//! Connectors are registered explicitly at startup; there is no dynamic
//! class loading. A profile string names one registered pair.
//!
//! # Adding a new connector
//!
//! 1. Create structs implementing `Fragmenter` and `Accessor`.
//! 2. Declare the operators and data types the source can evaluate
//!    server-side; the gateway prunes pushdown predicates to that set.
//! 3. Register the pair in [`default_registry`] (or on a custom
//!    [`SourceRegistry`]).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use fedgate_error::{closest_match, ErrorCode, ErrorContext, FedgateError, Result};

use crate::expression::{DataType, Node, Operator};
use crate::model::{Fragment, RequestContext};

pub mod file;

/// Enumerates the fragments of a data source path.
#[async_trait]
pub trait Fragmenter: std::fmt::Debug + Send + Sync {
    /// Profile name this connector is registered under (e.g. "file").
    fn profile(&self) -> &'static str;

    /// Operators the source can evaluate server-side. Comparison nodes
    /// outside this set are pruned before `enumerate` sees the predicate.
    /// Empty means no pushdown: the predicate arrives as `None`.
    fn supported_operators(&self) -> &[Operator] {
        &[]
    }

    /// Column types the source can evaluate predicates against.
    fn supported_types(&self) -> &[DataType] {
        &[]
    }

    /// Enumerate fragments for `ctx.data_source`. May block on remote
    /// I/O; runs under the fragment cache's single-flight guarantee. The
    /// pruned predicate may be used for server-side elimination or
    /// ignored. Fragment indices are assigned by the cache afterwards.
    async fn enumerate(
        &self,
        ctx: &RequestContext,
        predicate: Option<&Node>,
    ) -> Result<Vec<Fragment>>;
}

/// Opens one assigned fragment for streaming.
///
/// The actual wire format and transport are the connector's concern; the
/// core only defines the shape and threads the cancel flag through so a
/// bulk cancel can stop the read loop between chunks.
#[async_trait]
pub trait Accessor: Send + Sync {
    async fn open(
        &self,
        ctx: &RequestContext,
        fragment: &Fragment,
    ) -> Result<Box<dyn FragmentReader>>;
}

/// Streaming read over one fragment's content.
#[async_trait]
pub trait FragmentReader: Send {
    /// Next chunk, or `None` at end of stream.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

/// One registered connector.
#[derive(Clone)]
pub struct Source {
    pub fragmenter: Arc<dyn Fragmenter>,
    pub accessor: Arc<dyn Accessor>,
}

/// Profile-name → connector map, populated at startup and shared
/// read-only afterwards.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<&'static str, Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, fragmenter: Arc<dyn Fragmenter>, accessor: Arc<dyn Accessor>) {
        self.sources.insert(
            fragmenter.profile(),
            Source {
                fragmenter,
                accessor,
            },
        );
    }

    pub fn fragmenter(&self, profile: &str) -> Result<Arc<dyn Fragmenter>> {
        Ok(self.lookup(profile)?.fragmenter.clone())
    }

    pub fn accessor(&self, profile: &str) -> Result<Arc<dyn Accessor>> {
        Ok(self.lookup(profile)?.accessor.clone())
    }

    pub fn profiles(&self) -> Vec<&'static str> {
        let mut profiles: Vec<&'static str> = self.sources.keys().copied().collect();
        profiles.sort_unstable();
        profiles
    }

    fn lookup(&self, profile: &str) -> Result<&Source> {
        self.sources.get(profile).ok_or_else(|| {
            let available: Vec<String> =
                self.profiles().iter().map(|p| p.to_string()).collect();
            let mut err = FedgateError::new(
                ErrorCode::ProfileNotFound,
                format!("No connector registered for profile '{}'", profile),
            )
            .with_context(ErrorContext::ProfileNotFound {
                profile: profile.to_string(),
                available_profiles: available.clone(),
            });
            err = match closest_match(profile, &available) {
                Some(closest) => err.with_hint(format!("Did you mean '{}'?", closest)),
                None => err.with_hint(format!("Registered profiles: {}", available.join(", "))),
            };
            err
        })
    }
}

/// Registry with the built-in connectors.
pub fn default_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(
        Arc::new(file::FileFragmenter),
        Arc::new(file::FileAccessor::default()),
    );
    registry
}
