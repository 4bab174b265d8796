//! Asset record building and experiment assembly.
//!
//! Runs source → normalizer → aligner → builder for every asset and collects
//! the records in caller order. Any failure aborts the whole experiment.

use chrono::NaiveDate;
use coinset_core::{Cryptocoin, CryptocoinExperiment, DatasetConfig, DateSnapshot, Result};
use rayon::prelude::*;
use tracing::info;

use crate::aligner::{align, GapDiagnostic};
use crate::normalizer::normalize_rows;
use crate::source::RowSource;

/// Pair an asset identifier with its aligned snapshots.
#[inline]
pub fn build_coin(name: &str, snapshots: Vec<DateSnapshot>) -> Cryptocoin {
    Cryptocoin::new(name.as_bytes(), snapshots)
}

/// One asset's record plus the gaps found while aligning it.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub coin: Cryptocoin,
    pub gaps: Vec<GapDiagnostic>,
}

/// A complete experiment and every gap diagnostic, in asset order.
#[derive(Debug, Clone)]
pub struct ExperimentBuild {
    pub experiment: CryptocoinExperiment,
    pub gaps: Vec<GapDiagnostic>,
}

/// Builds experiments from a row source.
pub struct ExperimentAssembler<'a, S: RowSource + ?Sized> {
    source: &'a S,
    end_date: NaiveDate,
    window_length: usize,
    parallel: bool,
}

impl<'a, S: RowSource + ?Sized> ExperimentAssembler<'a, S> {
    /// Create a sequential assembler.
    pub fn new(source: &'a S, end_date: NaiveDate, window_length: usize) -> Self {
        Self {
            source,
            end_date,
            window_length,
            parallel: false,
        }
    }

    /// Create an assembler using the dates and window of a config.
    pub fn from_config(source: &'a S, config: &DatasetConfig) -> Self {
        Self::new(source, config.end_date, config.window_length).parallel(config.parallel)
    }

    /// Load assets on the rayon pool instead of one by one.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load, normalize and align a single asset.
    pub fn load_asset(&self, asset: &str) -> Result<LoadedAsset> {
        let rows = self.source.rows(asset)?;
        let series = normalize_rows(asset, self.end_date, &rows)?;
        let alignment = align(asset, &series, self.window_length);

        info!(
            asset,
            rows = rows.len(),
            observed = series.len(),
            gaps = alignment.gaps.len(),
            "Loaded asset"
        );

        Ok(LoadedAsset {
            coin: build_coin(asset, alignment.snapshots),
            gaps: alignment.gaps,
        })
    }

    /// Assemble every asset, preserving the order of `assets`.
    pub fn assemble(&self, assets: &[String]) -> Result<ExperimentBuild> {
        info!(
            assets = assets.len(),
            window = self.window_length,
            end_date = %self.end_date,
            parallel = self.parallel,
            "Assembling experiment"
        );

        let loaded: Vec<LoadedAsset> = if self.parallel {
            let mut stamped = assets
                .par_iter()
                .enumerate()
                .map(|(idx, asset)| self.load_asset(asset).map(|l| (idx, l)))
                .collect::<Result<Vec<_>>>()?;
            stamped.sort_unstable_by_key(|(idx, _)| *idx);
            stamped.into_iter().map(|(_, l)| l).collect()
        } else {
            assets
                .iter()
                .map(|asset| self.load_asset(asset))
                .collect::<Result<Vec<_>>>()?
        };

        let mut experiment = CryptocoinExperiment::new();
        let mut gaps = Vec::new();
        for asset in loaded {
            experiment.push(asset.coin);
            gaps.extend(asset.gaps);
        }

        Ok(ExperimentBuild { experiment, gaps })
    }
}
