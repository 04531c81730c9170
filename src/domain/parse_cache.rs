//! Single-slot memo of the most recently parsed motion program.
//!
//! Parsing large programs is expensive and every derived artifact needs the
//! same arrays, so the namespace keeps exactly one parse result. The slot is
//! keyed by filename: asking for a different file re-parses and evicts the
//! previous entry. The slot is cleared whenever a connection is accepted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ParsedGcode;
use crate::error::RelayError;
use crate::gcode::MotionParser;

/// Cached parse result for one file.
#[derive(Debug)]
struct CacheEntry {
    filename: PathBuf,
    parsed: Arc<ParsedGcode>,
}

/// Single-entry parse cache.
///
/// Parsing runs on the blocking thread pool so that large files do not stall
/// the async runtime; the caller still awaits the result, which keeps the
/// namespace's single-writer ordering intact.
pub struct ParseCache {
    parser: Arc<dyn MotionParser>,
    entry: Option<CacheEntry>,
}

impl std::fmt::Debug for ParseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseCache")
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}

impl ParseCache {
    /// Creates an empty cache backed by `parser`.
    #[must_use]
    pub fn new(parser: Arc<dyn MotionParser>) -> Self {
        Self {
            parser,
            entry: None,
        }
    }

    /// Returns the parse result for `filename`, parsing it on a miss.
    ///
    /// On failure the slot is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::FileNotFound`], [`RelayError::Parse`] or
    /// [`RelayError::Io`] from the parser, and [`RelayError::Internal`] if
    /// the blocking task is aborted.
    pub async fn get_parsed(
        &mut self,
        filename: impl AsRef<Path>,
    ) -> Result<Arc<ParsedGcode>, RelayError> {
        let filename = filename.as_ref();
        if let Some(entry) = &self.entry
            && entry.filename == filename
        {
            return Ok(Arc::clone(&entry.parsed));
        }

        let parser = Arc::clone(&self.parser);
        let path = filename.to_path_buf();
        let parsed = tokio::task::spawn_blocking(move || parser.parse(&path))
            .await
            .map_err(|e| RelayError::Internal(format!("parser task failed: {e}")))??;

        let parsed = Arc::new(parsed);
        tracing::debug!(
            filename = %filename.display(),
            segments = parsed.len(),
            "parse cache filled"
        );
        self.entry = Some(CacheEntry {
            filename: filename.to_path_buf(),
            parsed: Arc::clone(&parsed),
        });
        Ok(parsed)
    }

    /// Drops the cached entry, if any.
    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// Filename of the cached entry, if any.
    #[must_use]
    pub fn cached_file(&self) -> Option<&Path> {
        self.entry.as_ref().map(|e| e.filename.as_path())
    }
}
