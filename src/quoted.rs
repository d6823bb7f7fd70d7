use crate::parse::Format;
use crate::{ExplorerError, ExplorerResult};
use csv_async::{AsyncReaderBuilder, Trim};
use futures::StreamExt;

fn malformed(message: impl Into<String>) -> ExplorerError {
    ExplorerError::MalformedInput {
        format: Format::Csv,
        message: message.into(),
    }
}

/// True when the text ends inside a quoted field. A quote only opens a field
/// at its first byte; inside quotes `""` is an escaped quote.
fn ends_inside_quotes(text: &str) -> bool {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut bytes = text.bytes().peekable();
    while let Some(b) = bytes.next() {
        if in_quotes {
            if b == b'"' {
                if bytes.peek() == Some(&b'"') {
                    bytes.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        match b {
            b'"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            b',' | b'\n' | b'\r' => field_start = true,
            _ => field_start = false,
        }
    }
    in_quotes
}

/// Quote-aware read of in-memory CSV text: header plus trimmed data records.
///
/// Lines whose source text is only whitespace are skipped; a record made of
/// a quoted empty string (`""`) is kept.
pub(crate) async fn read_quoted(text: &str) -> ExplorerResult<(Vec<String>, Vec<Vec<String>>)> {
    if ends_inside_quotes(text) {
        return Err(malformed("unterminated quoted field"));
    }

    let mut rdr = AsyncReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .create_reader(text.as_bytes());

    // (start byte, fields) per record; the span up to the next start is the
    // record's source text.
    let mut raw: Vec<(usize, Vec<String>)> = Vec::new();
    let mut records = rdr.records();
    while let Some(record) = records.next().await {
        let record = record.map_err(|e| malformed(e.to_string()))?;
        let start = record.position().map_or(0, |p| p.byte() as usize);
        raw.push((start, record.iter().map(|f| f.trim().to_string()).collect()));
    }

    let ends = raw
        .iter()
        .skip(1)
        .map(|(start, _)| *start)
        .chain(std::iter::once(text.len()))
        .collect::<Vec<_>>();

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for ((start, fields), end) in raw.into_iter().zip(ends) {
        let source = text.get(start..end.max(start)).unwrap_or_default();
        if source.trim().is_empty() {
            continue;
        }
        if header.is_none() {
            header = Some(fields);
        } else {
            rows.push(fields);
        }
    }

    let header = header.ok_or_else(|| malformed("no header row"))?;
    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_quote_detection() {
        assert!(ends_inside_quotes("a,b\n\"x,1\n2,3\n"));
        assert!(ends_inside_quotes("a\n\"say \"\"hi\"\"\n"));
        assert!(!ends_inside_quotes("a\n\"say \"\"hi\"\"\"\n"));
        assert!(!ends_inside_quotes("a,b\n\"x, y\",\"\"\n"));
        // a quote mid-field is literal
        assert!(!ends_inside_quotes("a\n5\" pipe\n"));
    }
}
