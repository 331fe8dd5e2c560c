// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::QfaError;

/// Borrowed view over one (time, flux) series.
///
/// Time order is assumed, not checked: upstream readers hand the series over
/// pre-sorted. NaN flux values are tolerated by the view so the I/O boundary
/// can count and impute them before the kernel runs; the kernel itself
/// requires finite input.
#[derive(Clone, Copy, Debug)]
pub struct FluxSeriesView<'a> {
    time: &'a [f64],
    flux: &'a [f64],
}

impl<'a> FluxSeriesView<'a> {
    /// Constructs a validated `FluxSeriesView`.
    pub fn new(time: &'a [f64], flux: &'a [f64]) -> Result<Self, QfaError> {
        if time.is_empty() {
            return Err(QfaError::invalid_input("series must contain at least one sample"));
        }
        if time.len() != flux.len() {
            return Err(QfaError::invalid_input(format!(
                "time/flux length mismatch: time has {}, flux has {}",
                time.len(),
                flux.len()
            )));
        }
        if let Some((idx, value)) = time
            .iter()
            .copied()
            .enumerate()
            .find(|(_, t)| !t.is_finite())
        {
            return Err(QfaError::invalid_input(format!(
                "time values must be finite: index {idx} has {value}"
            )));
        }
        Ok(Self { time, flux })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Returns true when the series holds no samples.
    ///
    /// Always false for a constructed view, kept for slice-like symmetry.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// The time column.
    pub fn time(&self) -> &'a [f64] {
        self.time
    }

    /// The flux column.
    pub fn flux(&self) -> &'a [f64] {
        self.flux
    }

    /// Counts NaN flux samples.
    pub fn n_nan(&self) -> usize {
        self.flux.iter().filter(|v| v.is_nan()).count()
    }

    /// Returns true when at least one flux sample is NaN.
    pub fn has_nan(&self) -> bool {
        self.flux.iter().any(|v| v.is_nan())
    }
}
