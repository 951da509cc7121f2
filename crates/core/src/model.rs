//! Core data model: fragments, cache keys, and request identities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::expression::Node;

/// One enumerable unit of scan work against an external data source: a
/// file, byte range, partition, or key range.
///
/// `source` is an opaque location string; `metadata` is connector-defined
/// (byte offsets, partition keys, region boundaries). The `index` is
/// assigned by the cache layer during population, not by the connector,
/// and the fragment is immutable once cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub index: u32,
}

impl Fragment {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            metadata: None,
            index: 0,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// An ordered sequence of fragments for one logical scan.
///
/// Order is fixed at population time and never changes afterwards. All
/// distribution strategies depend on every segment observing this exact
/// order, so the list is only handed out behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentList {
    fragments: Vec<Fragment>,
}

impl FragmentList {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.fragments.iter()
    }
}

impl<'a> IntoIterator for &'a FragmentList {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

/// Composite identity of one cached fragment listing.
///
/// Two requests with the same key are always served the same list. The
/// predicate is part of the key, not an optimization detail: two scans of
/// one SQL statement (same transaction id) reading different predicate
/// branches must get different listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FragmentKey {
    pub transaction_id: String,
    pub schema: String,
    pub table: String,
    pub data_source: String,
    pub predicate: String,
}

impl FragmentKey {
    /// Build the key for a request, with the effective (pruned) predicate
    /// in serialized form. An absent predicate is the empty string.
    pub fn new(ctx: &RequestContext, predicate: String) -> Self {
        Self {
            transaction_id: ctx.transaction_id.clone(),
            schema: ctx.schema.clone(),
            table: ctx.table.clone(),
            data_source: ctx.data_source.clone(),
            predicate,
        }
    }
}

/// Scan options forwarded by the query engine, as an opaque string map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOptions(HashMap<String, String>);

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

impl From<HashMap<String, String>> for ScanOptions {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// One segment's participation in one scan.
///
/// Everything a strategy needs to compute this segment's share is here;
/// segments never talk to each other, so ownership agreement rests on
/// these fields being identical across all N requests of a scan (apart
/// from `segment_id`).
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub transaction_id: String,
    pub session_id: u32,
    pub command_count: u32,
    pub segment_id: u32,
    pub total_segments: u32,
    pub schema: String,
    pub table: String,
    pub data_source: String,
    pub profile: String,
    pub server: String,
    pub remote_port: u16,
    /// Pushed-down predicate tree, already parsed by the transport layer.
    pub predicate: Option<Node>,
    pub options: ScanOptions,
}

impl RequestContext {
    /// Session-dependent rotation applied by every strategy, so repeated
    /// statements in one session don't always favor segment 0.
    ///
    /// Callers must have validated `total_segments >= 1`.
    pub fn shift(&self) -> u32 {
        self.session_id % self.total_segments + self.command_count
    }

    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity {
            transaction_id: self.transaction_id.clone(),
            segment_id: self.segment_id,
            schema: self.schema.clone(),
            table: self.table.clone(),
            remote_port: self.remote_port,
            profile: self.profile.clone(),
            server: self.server.clone(),
        }
    }
}

/// Registry key uniquely identifying one segment's in-flight read or write.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct RequestIdentity {
    pub transaction_id: String,
    pub segment_id: u32,
    pub schema: String,
    pub table: String,
    pub remote_port: u16,
    pub profile: String,
    pub server: String,
}
