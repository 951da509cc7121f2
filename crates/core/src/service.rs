//! Request orchestration: one segment's scan request, end to end.
//!
//! A segment's request flows through the coordination layer in a fixed
//! order: resolve the connector by profile, prune the pushed-down
//! predicate to the connector's capabilities, consult (or populate) the
//! fragment listing cache, then filter the shared list down to this
//! segment's subset with the selected distribution strategy.

use std::sync::Arc;

use tracing::debug;

use fedgate_error::{ErrorCode, FedgateError, Result};

use crate::cache::FragmentCache;
use crate::distribution::DistributionPolicy;
use crate::expression::{prune_chain, Node, SupportedOperatorPruner, SupportedTypesPruner};
use crate::model::{Fragment, FragmentKey, RequestContext};
use crate::sources::{Fragmenter, SourceRegistry};

pub struct FragmenterService {
    cache: Arc<FragmentCache>,
    sources: Arc<SourceRegistry>,
}

impl FragmenterService {
    pub fn new(cache: Arc<FragmentCache>, sources: Arc<SourceRegistry>) -> Self {
        Self { cache, sources }
    }

    /// Return the fragments this segment must process.
    ///
    /// Fragment enumeration runs at most once per cache key; the N
    /// concurrent segment requests of a scan coalesce on the cache and
    /// then each apply the same pure distribution function to the shared
    /// list.
    pub async fn get_fragments(&self, ctx: &RequestContext) -> Result<Vec<Fragment>> {
        if ctx.total_segments == 0 {
            return Err(FedgateError::new(
                ErrorCode::InvalidRequest,
                "total_segments must be at least 1",
            ));
        }
        if ctx.segment_id >= ctx.total_segments {
            return Err(FedgateError::new(
                ErrorCode::InvalidRequest,
                format!(
                    "segment_id {} out of range for {} segments",
                    ctx.segment_id, ctx.total_segments
                ),
            ));
        }

        let fragmenter = self.sources.fragmenter(&ctx.profile)?;
        let strategy = DistributionPolicy::resolve(&ctx.options, ctx.total_segments)?;

        let predicate = prune_predicate(ctx.predicate.clone(), fragmenter.as_ref());
        let predicate_string = predicate
            .as_ref()
            .map(Node::to_string)
            .unwrap_or_default();

        let key = FragmentKey::new(ctx, predicate_string);
        let list = self
            .cache
            .get_or_populate(key, async {
                fragmenter.enumerate(ctx, predicate.as_ref()).await
            })
            .await?;

        let subset = strategy.filter(&list, ctx);
        debug!(
            target: "fragmenter_service",
            transaction_id = %ctx.transaction_id,
            segment_id = ctx.segment_id,
            strategy = strategy.name(),
            total = list.len(),
            assigned = subset.len(),
            "Distributed fragments"
        );
        Ok(subset)
    }
}

/// Narrow a pushed-down predicate to what the connector can honor.
/// `None` means no usable predicate: the connector does a full scan.
fn prune_predicate(predicate: Option<Node>, fragmenter: &dyn Fragmenter) -> Option<Node> {
    let tree = predicate?;
    let operators =
        SupportedOperatorPruner::new(fragmenter.supported_operators().iter().copied());
    let types = SupportedTypesPruner::new(fragmenter.supported_types().iter().copied());
    prune_chain(tree, &[&operators, &types])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{DataType, Operator};
    use crate::model::ScanOptions;
    use crate::sources::default_registry;
    use fedgate_common::config::FragmentCacheConfig;

    fn service() -> FragmenterService {
        FragmenterService::new(
            Arc::new(FragmentCache::new(&FragmentCacheConfig::default())),
            Arc::new(default_registry()),
        )
    }

    fn context() -> RequestContext {
        RequestContext {
            transaction_id: "xid-1".to_string(),
            session_id: 0,
            command_count: 0,
            segment_id: 0,
            total_segments: 2,
            schema: "public".to_string(),
            table: "events".to_string(),
            data_source: "/nonexistent".to_string(),
            profile: "file".to_string(),
            server: "default".to_string(),
            remote_port: 5888,
            predicate: None,
            options: ScanOptions::new(),
        }
    }

    #[tokio::test]
    async fn test_zero_segments_is_rejected() {
        let mut ctx = context();
        ctx.total_segments = 0;
        let err = service().get_fragments(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_segment_id_out_of_range_is_rejected() {
        let mut ctx = context();
        ctx.segment_id = 2;
        let err = service().get_fragments(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_rejected_before_enumeration() {
        let mut ctx = context();
        ctx.profile = "hbase".to_string();
        let err = service().get_fragments(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProfileNotFound);
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_surfaced() {
        // The file connector fails on a missing directory; the error
        // reaches the caller untransformed.
        let err = service().get_fragments(&context()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EnumerationFailed);
    }

    #[test]
    fn test_predicate_pruned_to_connector_capabilities() {
        #[derive(Debug)]
        struct NoPushdown;
        #[async_trait::async_trait]
        impl Fragmenter for NoPushdown {
            fn profile(&self) -> &'static str {
                "nopush"
            }
            async fn enumerate(
                &self,
                _ctx: &RequestContext,
                _predicate: Option<&Node>,
            ) -> fedgate_error::Result<Vec<Fragment>> {
                Ok(vec![])
            }
        }

        let tree = Node::comparison(
            Operator::Equal,
            Node::column("id", 0, DataType::BigInt),
            Node::scalar("1", DataType::BigInt),
        );
        // Empty capability sets prune everything: full scan.
        assert_eq!(prune_predicate(Some(tree), &NoPushdown), None);
    }
}
