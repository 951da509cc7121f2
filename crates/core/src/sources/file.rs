//! Filesystem connector: one fragment per regular file in a directory.
//!
//! The simplest complete connector, mainly exercised by tests and local
//! deployments. It declares no pushdown capabilities, so the gateway
//! prunes every predicate to `None` and the full listing is enumerated.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::json;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use fedgate_error::{ErrorCode, ErrorContext, FedgateError, Result};

use crate::expression::Node;
use crate::model::{Fragment, RequestContext};
use crate::registry::CancelFlag;

use super::{Accessor, Fragmenter, FragmentReader};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub struct FileFragmenter;

#[async_trait]
impl Fragmenter for FileFragmenter {
    fn profile(&self) -> &'static str {
        "file"
    }

    async fn enumerate(
        &self,
        ctx: &RequestContext,
        _predicate: Option<&Node>,
    ) -> Result<Vec<Fragment>> {
        let mut read_dir = tokio::fs::read_dir(&ctx.data_source).await.map_err(|e| {
            enumeration_error(ctx, format!("Failed to list '{}': {}", ctx.data_source, e))
        })?;

        let mut fragments = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
            enumeration_error(ctx, format!("Failed to read directory entry: {}", e))
        })? {
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };
            let path = entry.path().to_string_lossy().into_owned();
            fragments
                .push(Fragment::new(path).with_metadata(json!({ "size": metadata.len() })));
        }

        // read_dir order is platform-dependent; every population of the
        // same directory must produce the same fragment order.
        fragments.sort_by(|a, b| a.source.cmp(&b.source));

        debug!(
            target: "file_source",
            data_source = %ctx.data_source,
            fragments = fragments.len(),
            "Enumerated directory"
        );
        Ok(fragments)
    }
}

fn enumeration_error(ctx: &RequestContext, message: String) -> FedgateError {
    FedgateError::new(ErrorCode::EnumerationFailed, message).with_context(
        ErrorContext::Enumeration {
            profile: "file".to_string(),
            data_source: ctx.data_source.clone(),
        },
    )
}

#[derive(Default)]
pub struct FileAccessor {
    chunk_size: Option<usize>,
}

impl FileAccessor {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: Some(chunk_size),
        }
    }
}

#[async_trait]
impl Accessor for FileAccessor {
    async fn open(
        &self,
        _ctx: &RequestContext,
        fragment: &Fragment,
    ) -> Result<Box<dyn FragmentReader>> {
        let path = PathBuf::from(&fragment.source);
        let file = File::open(&path).await?;
        Ok(Box::new(FileReader {
            file,
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        }))
    }
}

struct FileReader {
    file: File,
    chunk_size: usize,
}

#[async_trait]
impl FragmentReader for FileReader {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        let n = self.file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }
}

/// Drain a reader into `sink`, stopping between chunks once `cancel` is
/// signaled. Returns whether the stream ran to completion.
pub async fn drain_reader(
    reader: &mut dyn FragmentReader,
    cancel: &CancelFlag,
    sink: &mut Vec<u8>,
) -> Result<bool> {
    while let Some(chunk) = reader.next_chunk().await? {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        sink.extend_from_slice(&chunk);
    }
    Ok(true)
}
