//! Data ingestion and alignment for the coinset dataset builder.
//!
//! This crate handles:
//! - Row sources (CSV files, in-memory rows)
//! - Day-index normalization against a reference end date
//! - Gap-fill alignment to a fixed window
//! - Asset record building and experiment assembly

pub mod source;
pub mod normalizer;
pub mod aligner;
pub mod assembly;

pub use source::{CsvRowSource, MemoryRowSource, RawRow, RowSource};
pub use normalizer::{day_offset, normalize_rows, parse_date};
pub use aligner::{align, Alignment, DiagnosticKind, GapDiagnostic};
pub use assembly::{build_coin, ExperimentAssembler, ExperimentBuild, LoadedAsset};
