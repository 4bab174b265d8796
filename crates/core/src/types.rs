//! Core data types for the coinset dataset builder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signed number of calendar days between an observation date and the
/// reference end date. Days before the end date are negative.
pub type DayOffset = i64;

/// Price emitted for days before an asset's first real observation.
pub const PRELISTING_PRICE: f64 = 1.0;

/// Volume emitted for days before an asset's first real observation.
pub const PRELISTING_VOLUME: f64 = 0.0;

/// A single parsed observation for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Offset relative to the reference end date.
    pub day_offset: DayOffset,
    /// Price on that day.
    pub price: f64,
    /// Traded volume on that day.
    pub volume: f64,
}

/// One aligned day's values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateSnapshot {
    pub price: f64,
    pub volume: f64,
}

impl DateSnapshot {
    /// Placeholder for a day on which the asset was not yet tracked.
    pub const PRELISTING: DateSnapshot = DateSnapshot {
        price: PRELISTING_PRICE,
        volume: PRELISTING_VOLUME,
    };

    #[inline]
    pub fn new(price: f64, volume: f64) -> Self {
        Self { price, volume }
    }

    /// Whether this snapshot equals the pre-listing placeholder.
    #[inline]
    pub fn is_prelisting(&self) -> bool {
        *self == Self::PRELISTING
    }
}

impl From<Observation> for DateSnapshot {
    fn from(obs: Observation) -> Self {
        Self {
            price: obs.price,
            volume: obs.volume,
        }
    }
}

/// Sparse day-offset keyed observations for one asset.
///
/// Inserting an offset that is already present overwrites the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseSeries {
    points: BTreeMap<DayOffset, DateSnapshot>,
}

impl SparseSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapse observations into a series, later entries winning.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut series = Self::new();
        for obs in observations {
            series.insert(obs);
        }
        series
    }

    /// Insert an observation, returning the value it replaced.
    pub fn insert(&mut self, obs: Observation) -> Option<DateSnapshot> {
        self.points.insert(obs.day_offset, obs.into())
    }

    /// Look up the observation at an offset.
    #[inline]
    pub fn get(&self, offset: DayOffset) -> Option<DateSnapshot> {
        self.points.get(&offset).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest and latest offsets present.
    pub fn span(&self) -> Option<(DayOffset, DayOffset)> {
        let first = self.points.keys().next()?;
        let last = self.points.keys().next_back()?;
        Some((*first, *last))
    }
}

/// One asset record: identifier plus its dense, aligned snapshots.
///
/// `snapshots[0]` is the earliest day of the window and the last element is
/// the day immediately before the reference end date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cryptocoin {
    /// Ticker bytes (e.g. `b"btc"`).
    pub name: Vec<u8>,
    pub snapshots: Vec<DateSnapshot>,
}

impl Cryptocoin {
    /// Pair an identifier with its aligned snapshots.
    pub fn new(name: impl Into<Vec<u8>>, snapshots: Vec<DateSnapshot>) -> Self {
        Self {
            name: name.into(),
            snapshots,
        }
    }

    /// Identifier rendered for logs and reports.
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    #[inline]
    pub fn window_length(&self) -> usize {
        self.snapshots.len()
    }
}

/// A full experiment dataset, coins in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptocoinExperiment {
    pub coins: Vec<Cryptocoin>,
}

impl CryptocoinExperiment {
    /// Create an empty experiment.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, coin: Cryptocoin) {
        self.coins.push(coin);
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Check that the experiment has at least one coin and that every coin
    /// shares the same window length. Returns that length.
    pub fn validate_uniform(&self) -> crate::Result<usize> {
        let first = self
            .coins
            .first()
            .ok_or_else(|| crate::Error::inconsistent("experiment contains no coins"))?;
        let expected = first.window_length();

        for coin in &self.coins[1..] {
            if coin.window_length() != expected {
                return Err(crate::Error::inconsistent(format!(
                    "coin {} has {} snapshots, expected {}",
                    coin.display_name(),
                    coin.window_length(),
                    expected
                )));
            }
        }

        Ok(expected)
    }

    /// Price of every coin on day `idx`, in container order.
    pub fn prices_at(&self, idx: usize) -> Option<Vec<f64>> {
        self.coins
            .iter()
            .map(|c| c.snapshots.get(idx).map(|s| s.price))
            .collect()
    }

    /// Running sum of volumes across coins on day `idx`, in container order.
    ///
    /// The last element is the total volume traded that day.
    pub fn cumulative_volumes_at(&self, idx: usize) -> Option<Vec<f64>> {
        let mut acc = 0.0;
        self.coins
            .iter()
            .map(|c| {
                c.snapshots.get(idx).map(|s| {
                    acc += s.volume;
                    acc
                })
            })
            .collect()
    }
}
