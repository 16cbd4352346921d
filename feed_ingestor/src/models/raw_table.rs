//! Schema-less tabular payload as delivered by the feed client.

/// Ordered column names plus string rows, exactly as decoded from the CSV.
///
/// No trimming or type conversion happens here; the normalizer owns all
/// interpretation of the cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Header cells in file order.
    pub columns: Vec<String>,
    /// Data rows. A row may be shorter or longer than `columns`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from borrowed cells; handy for tests and fakes.
    pub fn from_cells<H, R, C>(columns: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Number of header cells.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the payload had a header but no data rows (or nothing at all).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
