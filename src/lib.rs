//! Upload ingestion and column profiling for CSV/JSON files.
//!
//! - Upload reader: local files or any `AsyncRead`, gzip/zstd, non-UTF-8 charsets.
//! - Parser: naive comma splitter (default) or quote-aware CSV, JSON arrays/objects.
//! - Profiler: bounded-sample type inference and null counting.
//!
//! Data shape:
//! - `NormalizedTable { columns, rows }`, rows are positional `Record`s
//! - `Profile { total_rows, total_columns, null_count, column_profiles, .. }`
//! - `Exploration` bundles both with a preview window and file info
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod codec;
mod config;
mod io;
pub mod logging;
mod parse;
mod profile;
mod quoted;
mod table;

pub use crate::config::{ExplorerConfig, ProfilerConfig};
pub use crate::io::{raw_file_from_reader, read_raw_file, FileMeta, RawFile};
pub use crate::parse::{parse, parse_with, CsvDialect, Format, SYNTHETIC_COLUMN};
pub use crate::profile::{
    profile, ColumnProfile, InferredType, Profile, Profiler, DEFAULT_SAMPLE_SIZE,
    DEFAULT_TYPE_THRESHOLD,
};
pub use crate::table::{NormalizedTable, Preview, Record};

use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Error type returned by this crate when not using `anyhow`.
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("Unsupported file format: '.{extension}' (expected .csv or .json)")]
    UnsupportedFormat { extension: String },
    #[error("Malformed {format} input: {message}")]
    MalformedInput { format: Format, message: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Background worker failed: {0}")]
    Worker(String),
}

pub type ExplorerResult<T> = std::result::Result<T, ExplorerError>;

/// What the upload screen shows about the file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub human_size: String,
    pub content_type: String,
    pub content_encoding: String,
    pub checksum: u32,
}

impl From<&RawFile> for FileInfo {
    fn from(raw: &RawFile) -> Self {
        Self {
            name: raw.name.clone(),
            size: raw.size,
            human_size: raw.human_size(),
            content_type: raw.content_type.clone(),
            content_encoding: raw.content_encoding.clone(),
            checksum: raw.checksum,
        }
    }
}

/// Everything derived from one upload. Re-uploading replaces it wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct Exploration {
    pub file: FileInfo,
    pub table: NormalizedTable,
    pub profile: Profile,
    pub preview: Preview,
}

/// Parse and profile an already-read upload.
pub fn explore(raw: &RawFile, config: &ExplorerConfig) -> ExplorerResult<Exploration> {
    let profiler = Profiler::new(config.profiler)?;
    let table = parse_with(&raw.name, &raw.text, config.dialect)?;
    let profile = profiler.profile(&table);
    let preview = table.preview(config.preview_rows, config.preview_columns);

    tracing::debug!(
        file = %raw.name,
        rows = profile.total_rows,
        columns = profile.total_columns,
        nulls = profile.null_count,
        "explored upload"
    );

    Ok(Exploration {
        file: FileInfo::from(raw),
        table,
        profile,
        preview,
    })
}

/// Read an upload from any async source, then parse and profile it off the
/// async executor.
pub async fn explore_reader<R>(
    reader: R,
    meta: FileMeta,
    config: &ExplorerConfig,
) -> ExplorerResult<Exploration>
where
    R: AsyncRead + Unpin + Send,
{
    let raw = raw_file_from_reader(reader, meta).await?;
    explore_blocking(raw, config.clone()).await
}

/// Read a local file (optionally `.gz`/`.zst`), then parse and profile it.
pub async fn explore_path(path: &Path, config: &ExplorerConfig) -> ExplorerResult<Exploration> {
    let raw = read_raw_file(path).await?;
    explore_blocking(raw, config.clone()).await
}

async fn explore_blocking(raw: RawFile, config: ExplorerConfig) -> ExplorerResult<Exploration> {
    tokio::task::spawn_blocking(move || explore(&raw, &config))
        .await
        .map_err(|e| ExplorerError::Worker(e.to_string()))?
}
