use crate::codec::CharsetDecoder;
use crate::parse::Format;
use crate::{ExplorerError, ExplorerResult};
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use futures::TryStreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio_util::codec::FramedRead;

/// Transport details that came with an upload.
#[derive(Debug, Clone)]
pub struct FileMeta {
    /// e.g. "text/csv; charset=windows-1252" or "application/gzip"
    pub content_type: String,
    /// e.g. "gzip", "zstd", "gzip, br" or empty
    pub content_encoding: String,
    /// the uploaded file name; selects the parser and the decompression fallback
    pub name_hint: String,
    /// Which character encoding to expect (defaults to UTF-8)
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for FileMeta {
    fn default() -> Self {
        Self {
            content_type: String::new(),
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

impl FileMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name_hint: name.into(),
            ..Default::default()
        }
    }

    /// Charset from a `charset=` content-type parameter, else `self.charset`.
    fn resolved_charset(&self) -> ExplorerResult<&'static encoding_rs::Encoding> {
        let label = self
            .content_type
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, v)| v.trim().trim_matches('"'));
        match label {
            None => Ok(self.charset),
            Some(label) => encoding_rs::Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                ExplorerError::InvalidArgument(format!("unknown charset '{label}'"))
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    fn encoding(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
        }
    }
}

/// Media type of an uncompressed payload, guessed from its name.
fn content_type_for(name: &str) -> &'static str {
    match Format::from_file_name(name) {
        Ok(Format::Csv) => "text/csv",
        Ok(Format::Json) => "application/json",
        Err(_) => "",
    }
}

fn is_compression_type(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    ["application/gzip", "application/x-gzip", "application/zstd"]
        .iter()
        .any(|t| mime.eq_ignore_ascii_case(t))
}

/// Decompression choice: encoding -> type -> extension.
fn detect_compression(meta: &FileMeta) -> Compression {
    let ce = meta.content_encoding.to_ascii_lowercase();
    let ct = meta.content_type.to_ascii_lowercase();
    let ct = ct.split(';').next().unwrap_or_default().trim();
    let name = meta.name_hint.to_ascii_lowercase();

    if ce.split(',').any(|s| s.trim() == "gzip")
        || matches!(ct, "application/gzip" | "application/x-gzip")
        || name.ends_with(".gz")
    {
        Compression::Gzip
    } else if ce.split(',').any(|s| s.trim() == "zstd")
        || ct == "application/zstd"
        || name.ends_with(".zst")
    {
        Compression::Zstd
    } else {
        Compression::None
    }
}

/// An upload read fully into memory and decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    /// Logical name, compression suffix removed (`data.csv.gz` -> `data.csv`).
    pub name: String,
    /// Bytes as uploaded, before decompression.
    pub size: u64,
    /// Media type of the decoded payload, e.g. `text/csv` for `data.csv.gz`.
    pub content_type: String,
    /// Transport compression that was undone (`gzip`, `zstd`) or empty.
    pub content_encoding: String,
    pub text: String,
    /// CRC32 of the uploaded bytes.
    pub checksum: u32,
}

impl RawFile {
    /// Wrap text that is already in memory.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let name = name.into();
        Self {
            content_type: content_type_for(&name).to_string(),
            content_encoding: String::new(),
            name,
            size: text.len() as u64,
            checksum: crc32fast::hash(text.as_bytes()),
            text,
        }
    }

    /// Size for display: base 1024, at most two decimals, e.g. `1.5 KB`.
    pub fn human_size(&self) -> String {
        format_file_size(self.size)
    }
}

pub(crate) fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// Undecodable bytes are malformed input of the format the name selects.
fn stream_error(e: std::io::Error, name: &str) -> ExplorerError {
    if e.kind() != std::io::ErrorKind::InvalidData {
        return ExplorerError::Io(e);
    }
    match Format::from_file_name(name) {
        Ok(format) => ExplorerError::MalformedInput {
            format,
            message: e.to_string(),
        },
        Err(unsupported) => unsupported,
    }
}

/// `data.csv.gz` -> `data.csv`
fn logical_name(name_hint: &str, compression: Compression) -> String {
    let mut name = name_hint.to_string();
    if compression != Compression::None {
        let lower = name.to_ascii_lowercase();
        if let Some(ext) = [".gz", ".zst"].into_iter().find(|ext| lower.ends_with(ext)) {
            name.truncate(name.len() - ext.len());
        }
    }
    name
}

/// From a generic AsyncRead, read the upload, undo compression and decode it
/// to UTF-8 text.
pub async fn raw_file_from_reader<R>(mut raw: R, meta: FileMeta) -> ExplorerResult<RawFile>
where
    R: AsyncRead + Unpin + Send,
{
    let charset = meta.resolved_charset()?;
    let compression = detect_compression(&meta);
    let name = logical_name(&meta.name_hint, compression);

    let mut bytes = Vec::new();
    raw.read_to_end(&mut bytes).await?;
    let checksum = crc32fast::hash(&bytes);

    let buf = BufReader::new(&bytes[..]);
    let decompressed: Box<dyn AsyncRead + Unpin + Send + '_> = match compression {
        Compression::Gzip => Box::new(GzipDecoder::new(buf)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buf)),
        Compression::None => Box::new(buf),
    };

    let text = FramedRead::new(decompressed, CharsetDecoder::new(charset))
        .try_fold(String::new(), |mut acc, chunk| async move {
            acc.push_str(&chunk);
            Ok::<_, std::io::Error>(acc)
        })
        .await
        .map_err(|e| stream_error(e, &name))?;

    let content_type = if meta.content_type.is_empty() || is_compression_type(&meta.content_type) {
        content_type_for(&name).to_string()
    } else {
        meta.content_type
    };

    tracing::debug!(
        file = %name,
        bytes = bytes.len(),
        chars = text.len(),
        ?compression,
        charset = charset.name(),
        "read upload"
    );

    Ok(RawFile {
        name,
        size: bytes.len() as u64,
        content_type,
        content_encoding: compression.encoding().to_string(),
        text,
        checksum,
    })
}

/// Read a local file (lightweight meta from extension).
pub async fn read_raw_file(path: &Path) -> ExplorerResult<RawFile> {
    let file = File::open(path).await?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let mut meta = FileMeta::named(name);

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "gz" => {
            meta.content_type = "application/gzip".into();
            meta.content_encoding = "gzip".into();
        }
        "zst" => {
            meta.content_type = "application/zstd".into();
            meta.content_encoding = "zstd".into();
        }
        "csv" => meta.content_type = "text/csv".into(),
        "json" => meta.content_type = "application/json".into(),
        _ => {}
    }

    raw_file_from_reader(file, meta).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes_like_the_upload_screen() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn compression_from_meta() {
        assert_eq!(
            detect_compression(&FileMeta::named("a.csv.GZ")),
            Compression::Gzip
        );
        let meta = FileMeta {
            content_encoding: "br, zstd".into(),
            ..FileMeta::named("a.csv")
        };
        assert_eq!(detect_compression(&meta), Compression::Zstd);
        assert_eq!(detect_compression(&FileMeta::named("a.json")), Compression::None);
    }

    #[test]
    fn charset_from_content_type() {
        let meta = FileMeta {
            content_type: "text/csv; charset=\"windows-1252\"".into(),
            ..Default::default()
        };
        assert_eq!(meta.resolved_charset().unwrap(), encoding_rs::WINDOWS_1252);
        let bad = FileMeta {
            content_type: "text/csv; charset=klingon".into(),
            ..Default::default()
        };
        assert!(bad.resolved_charset().is_err());
    }

    #[tokio::test]
    async fn decodes_latin1_upload() {
        let meta = FileMeta {
            charset: encoding_rs::WINDOWS_1252,
            ..FileMeta::named("cities.csv")
        };
        let raw = raw_file_from_reader(&b"city\nS\xe3o Paulo\n"[..], meta)
            .await
            .unwrap();
        assert_eq!(raw.text, "city\nSão Paulo\n");
        assert_eq!(raw.size, 15);
    }

    #[tokio::test]
    async fn compressed_upload_reports_payload_type() {
        use async_compression::tokio::bufread::GzipEncoder;

        let mut gz = Vec::new();
        GzipEncoder::new(&b"a,b\n1,2\n"[..])
            .read_to_end(&mut gz)
            .await
            .unwrap();
        let meta = FileMeta {
            content_type: "application/gzip".into(),
            content_encoding: "gzip".into(),
            ..FileMeta::named("Data.CSV.gz")
        };
        let raw = raw_file_from_reader(&gz[..], meta).await.unwrap();
        assert_eq!(raw.name, "Data.CSV");
        assert_eq!(raw.content_type, "text/csv");
        assert_eq!(raw.content_encoding, "gzip");
        assert_eq!(raw.text, "a,b\n1,2\n");
        assert_eq!(raw.size, gz.len() as u64);
    }

    #[tokio::test]
    async fn undecodable_bytes_name_the_format() {
        let err = raw_file_from_reader(&b"{\"a\":\"\xff\"}"[..], FileMeta::named("x.json"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::MalformedInput {
                format: Format::Json,
                ..
            }
        ));
    }
}
