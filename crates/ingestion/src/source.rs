//! Row sources.
//!
//! A row source yields the raw, still-textual rows for one asset. The CSV
//! source reads CoinGecko-style exports: a header row followed by
//! `date, price, market_cap, total_volume` records.

use coinset_core::{Error, Result, SourceConfig};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use tracing::debug;

/// Zero-based column holding the observation date.
pub const DATE_COLUMN: usize = 0;
/// Zero-based column holding the price.
pub const PRICE_COLUMN: usize = 1;
/// Zero-based column holding the traded volume.
pub const VOLUME_COLUMN: usize = 3;

/// One unparsed row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source (header is line 1).
    pub line: usize,
    pub date: String,
    pub price: String,
    pub volume: String,
}

/// Supplies raw rows for an asset.
pub trait RowSource: Sync {
    /// All data rows for `asset`, header excluded.
    fn rows(&self, asset: &str) -> Result<Vec<RawRow>>;
}

/// Reads one CSV file per asset.
#[derive(Debug, Clone)]
pub struct CsvRowSource {
    config: SourceConfig,
}

impl CsvRowSource {
    /// Create a CSV source rooted at the configured directory.
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

impl RowSource for CsvRowSource {
    fn rows(&self, asset: &str) -> Result<Vec<RawRow>> {
        let path = self.config.path_for(asset);
        let file = File::open(&path).map_err(|e| Error::asset_load(asset, e))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers().map_err(|e| csv_error(asset, e))?;
        debug!(asset, path = %path.display(), ?headers, "Reading rows");

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| csv_error(asset, e))?;
            // records() starts after the header, lines are 1-based
            let line = idx + 2;

            let field = |col: usize| -> Result<String> {
                record.get(col).map(str::to_string).ok_or_else(|| {
                    Error::parse(
                        asset,
                        line,
                        format!("expected at least {} fields, found {}", VOLUME_COLUMN + 1, record.len()),
                    )
                })
            };

            rows.push(RawRow {
                line,
                date: field(DATE_COLUMN)?,
                price: field(PRICE_COLUMN)?,
                volume: field(VOLUME_COLUMN)?,
            });
        }

        Ok(rows)
    }
}

fn csv_error(asset: &str, err: csv::Error) -> Error {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io_err) = err.into_kind() {
            return Error::asset_load(asset, io_err);
        }
        return Error::parse(asset, line, "I/O failure while reading rows");
    }
    Error::parse(asset, line, err.to_string())
}

/// In-memory rows keyed by asset.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    rows: HashMap<String, Vec<RawRow>>,
}

impl MemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `(date, price, volume)` rows for an asset.
    ///
    /// Line numbers start at 2, as if a header preceded them.
    pub fn insert<I, S>(&mut self, asset: impl Into<String>, rows: I)
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, (date, price, volume))| RawRow {
                line: idx + 2,
                date: date.into(),
                price: price.into(),
                volume: volume.into(),
            })
            .collect();
        self.rows.insert(asset.into(), rows);
    }
}

impl RowSource for MemoryRowSource {
    fn rows(&self, asset: &str) -> Result<Vec<RawRow>> {
        self.rows.get(asset).cloned().ok_or_else(|| {
            Error::asset_load(
                asset,
                io::Error::new(io::ErrorKind::NotFound, "no rows registered"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn source_in(dir: &Path) -> CsvRowSource {
        CsvRowSource::new(SourceConfig {
            base_dir: dir.to_path_buf(),
            file_template: "{asset}-usd-max.csv".to_string(),
        })
    }

    #[test]
    fn test_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("btc-usd-max.csv"),
            "snapped_at,price,market_cap,total_volume\n\
             2021-12-06 00:00:00 UTC,49396.4,934000000000,37000000000\n\
             2021-12-07 00:00:00 UTC,50441.9,953000000000,29000000000\n",
        )
        .unwrap();

        let rows = source_in(dir.path()).rows("btc").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].date, "2021-12-06 00:00:00 UTC");
        assert_eq!(rows[0].price, "49396.4");
        assert_eq!(rows[0].volume, "37000000000");
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_csv_header_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("new-usd-max.csv"),
            "snapped_at,price,market_cap,total_volume\n",
        )
        .unwrap();

        let rows = source_in(dir.path()).rows("new").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_csv_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match source_in(dir.path()).rows("nope") {
            Err(Error::AssetLoad { asset, source }) => {
                assert_eq!(asset, "nope");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected asset load error, got {other:?}"),
        }
    }

    #[test]
    fn test_csv_short_row() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("eth-usd-max.csv"),
            "snapped_at,price,market_cap,total_volume\n2021-12-07,4300.1,510000000000\n",
        )
        .unwrap();

        match source_in(dir.path()).rows("eth") {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemoryRowSource::new();
        source.insert("btc", [("2021-12-07", "1.0", "2.0")]);

        let rows = source.rows("btc").unwrap();
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].volume, "2.0");
        assert!(matches!(source.rows("eth"), Err(Error::AssetLoad { .. })));
    }
}
