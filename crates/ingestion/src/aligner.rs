//! Gap-fill alignment.
//!
//! Turns a sparse series into exactly `length` daily snapshots covering
//! offsets `-length..=-1`, oldest first.
//!
//! Missing days are filled according to where they fall:
//! - before the first real observation: the pre-listing placeholder
//!   ([`DateSnapshot::PRELISTING`]), silently
//! - after it: the most recent real observation, carried forward and
//!   reported as a [`GapDiagnostic`]

use coinset_core::{DateSnapshot, DayOffset, SparseSeries};
use std::fmt;
use tracing::warn;

/// Kind of non-fatal condition found while aligning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A day after listing had no observation; previous values were reused.
    CarriedForwardGap,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::CarriedForwardGap => "carried-forward-gap",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post-listing hole in an asset's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapDiagnostic {
    pub kind: DiagnosticKind,
    pub asset: String,
    pub offset: DayOffset,
}

/// How a single aligned day was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayFill {
    Observed,
    CarriedForward,
    Prelisting,
}

/// Running state of the scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignerState {
    /// Values emitted when a day is missing.
    pub last: DateSnapshot,
    /// Whether a real observation has been seen. Never reverts.
    pub seen_real: bool,
}

impl AlignerState {
    pub const INITIAL: AlignerState = AlignerState {
        last: DateSnapshot::PRELISTING,
        seen_real: false,
    };

    /// Advance by one day. Returns the new state and how the day was filled;
    /// the day's snapshot is `new_state.last`.
    #[inline]
    pub fn step(self, observed: Option<DateSnapshot>) -> (Self, DayFill) {
        match observed {
            Some(snapshot) => (
                AlignerState {
                    last: snapshot,
                    seen_real: true,
                },
                DayFill::Observed,
            ),
            None if self.seen_real => (self, DayFill::CarriedForward),
            None => (self, DayFill::Prelisting),
        }
    }
}

impl Default for AlignerState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Dense output of [`align`].
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub snapshots: Vec<DateSnapshot>,
    pub gaps: Vec<GapDiagnostic>,
}

/// Align `series` to a window of `length` days ending the day before the
/// reference end date.
pub fn align(asset: &str, series: &SparseSeries, length: usize) -> Alignment {
    let mut snapshots = Vec::with_capacity(length);
    let mut gaps = Vec::new();
    let mut state = AlignerState::INITIAL;
    let length = length as DayOffset;

    for offset in -length..0 {
        let (next, fill) = state.step(series.get(offset));
        state = next;

        if fill == DayFill::CarriedForward {
            warn!(asset, offset, "Missing day after listing, using previous day's values");
            gaps.push(GapDiagnostic {
                kind: DiagnosticKind::CarriedForwardGap,
                asset: asset.to_string(),
                offset,
            });
        }

        snapshots.push(state.last);
    }

    Alignment { snapshots, gaps }
}
