//! Payload decoding: legacy Japanese encoding to text, text to [`RawTable`].

use std::borrow::Cow;

use encoding_rs::SHIFT_JIS;

use crate::models::raw_table::RawTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Name reported when decoding fails.
pub const ENCODING_NAME: &str = "Shift_JIS (cp932)";

/// Decodes a payload.
///
/// The provider serves Windows-31J; `encoding_rs`'s Shift_JIS decoder is the
/// WHATWG superset that covers the NEC/IBM extensions. A payload starting
/// with a UTF-8 BOM is decoded as UTF-8 instead. Returns `None` on any
/// malformed byte sequence; nothing is replaced silently.
pub fn decode_text(bytes: &[u8]) -> Option<Cow<'_, str>> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return std::str::from_utf8(rest).ok().map(Cow::Borrowed);
    }
    SHIFT_JIS.decode_without_bom_handling_and_without_replacement(bytes)
}

/// Splits decoded text into header + rows after discarding `skip_rows` lines.
///
/// The delimiter is `;` when the header line has more semicolons than
/// commas, `,` otherwise.
pub fn parse_table(text: &str, skip_rows: usize) -> Result<RawTable, csv::Error> {
    let body = skip_lines(text, skip_rows);
    let header_line = body.lines().next().unwrap_or_default();
    let delimiter = sniff_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let columns = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { columns, rows })
}

fn skip_lines(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return "",
        }
    }
    rest
}

fn sniff_delimiter(header: &str) -> u8 {
    let semis = header.matches(';').count();
    let commas = header.matches(',').count();
    if semis > commas { b';' } else { b',' }
}
