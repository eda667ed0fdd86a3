//! Validated telemetry fixes.
//!
//! A [`Fix`] is a single position-and-time observation with a quality-class
//! label. An [`ObservationSet`] owns one deployment's fixes and enforces the
//! sequence invariants once, at construction, so the filter and estimator
//! can assume them everywhere downstream: non-empty, finite coordinates and
//! timestamps, and strictly increasing times (near-duplicate timestamps must
//! be jittered upstream before reaching this layer).

use std::collections::BTreeSet;

use crate::movement::errors::{CtcrwError, CtcrwResult};

/// One telemetry fix: planar position, timestamp, and error-class label.
///
/// Positions are in a projected planar coordinate system; timestamps are
/// real-valued in a consistent unit (typically seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub class: String,
}

impl Fix {
    pub fn new(time: f64, x: f64, y: f64, class: impl Into<String>) -> Self {
        Self { time, x, y, class: class.into() }
    }
}

/// A validated, strictly time-ordered sequence of fixes for one deployment.
///
/// Construction is the single validation point: every consumer of an
/// `ObservationSet` may rely on non-emptiness, finiteness, and strict
/// temporal ordering without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet {
    fixes: Vec<Fix>,
}

impl ObservationSet {
    /// Validate and take ownership of a fix sequence.
    ///
    /// # Errors
    /// - [`CtcrwError::EmptySeries`] for an empty input.
    /// - [`CtcrwError::NonFiniteFix`] for any non-finite coordinate or time.
    /// - [`CtcrwError::NonMonotoneTime`] when timestamps are not strictly
    ///   increasing.
    pub fn new(fixes: Vec<Fix>) -> CtcrwResult<Self> {
        if fixes.is_empty() {
            return Err(CtcrwError::EmptySeries);
        }
        for (index, fix) in fixes.iter().enumerate() {
            if !fix.time.is_finite() || !fix.x.is_finite() || !fix.y.is_finite() {
                return Err(CtcrwError::NonFiniteFix { index });
            }
        }
        for index in 1..fixes.len() {
            let prev = fixes[index - 1].time;
            let curr = fixes[index].time;
            if curr <= prev {
                return Err(CtcrwError::NonMonotoneTime { index, prev, curr });
            }
        }
        Ok(Self { fixes })
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    /// First and last timestamps of the deployment.
    pub fn time_span(&self) -> (f64, f64) {
        (self.fixes[0].time, self.fixes[self.fixes.len() - 1].time)
    }

    /// Distinct error-class labels present, in sorted order.
    pub fn class_labels(&self) -> BTreeSet<&str> {
        self.fixes.iter().map(|f| f.class.as_str()).collect()
    }
}
