// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! One-series pipeline shared by the `qfa` binary, its tests, and the fuzz
//! target: condition the flux, rescale the gain to the noise level, run the
//! bidirectional fidelity scan, and reduce the series by augmented binning.

use std::time::Instant;

use qfa_core::{FluxSeriesView, QfaError, ScanConfig, ScanDiagnostics, SelectorConfig};
use qfa_engine::{augment, AugmentedPoint, MultiScaleQfa};
use qfa_preprocess::{adaptive_sensitivity, impute_nan_with_median, normalize_robust};

/// Everything one scan produces besides the traces themselves.
#[derive(Clone, Debug)]
pub struct ScanOutcome {
    pub fidelity: Vec<f64>,
    pub coherence: Vec<f64>,
    pub diagnostics: ScanDiagnostics,
}

/// The reduced series plus run metadata.
#[derive(Clone, Debug)]
pub struct AugmentOutcome {
    pub points: Vec<AugmentedPoint>,
    pub diagnostics: ScanDiagnostics,
}

fn conditioned_flux(view: &FluxSeriesView<'_>) -> Result<Vec<f64>, QfaError> {
    let mut flux = view.flux().to_vec();
    if view.has_nan() {
        impute_nan_with_median(&mut flux);
    }
    normalize_robust(&flux)
}

fn scan_normalized(
    normalized: &[f64],
    config: &ScanConfig,
    nan_imputed: usize,
    started_at: Instant,
) -> Result<ScanOutcome, QfaError> {
    let gain = adaptive_sensitivity(normalized, config.sensitivity)?;
    let scanner = MultiScaleQfa::new(gain, config.decays.clone(), config.gain_autoscaling)?;
    let (fidelity, coherence) = scanner.scan_with_coherence(normalized, config.bidirectional)?;

    let mut diagnostics = ScanDiagnostics {
        n: normalized.len(),
        n_scales: config.decays.len(),
        adaptive_sensitivity: Some(gain),
        bidirectional: config.bidirectional,
        ..ScanDiagnostics::default()
    };
    if nan_imputed > 0 {
        diagnostics
            .notes
            .push(format!("imputed {nan_imputed} NaN flux samples with the median"));
    }
    diagnostics.runtime_ms = Some(u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX));

    Ok(ScanOutcome {
        fidelity,
        coherence,
        diagnostics,
    })
}

/// Runs the fidelity scan over one (time, flux) series.
pub fn scan_series(
    time: &[f64],
    flux: &[f64],
    config: &ScanConfig,
) -> Result<ScanOutcome, QfaError> {
    config.validate()?;
    let started_at = Instant::now();
    let view = FluxSeriesView::new(time, flux)?;
    let normalized = conditioned_flux(&view)?;
    scan_normalized(&normalized, config, view.n_nan(), started_at)
}

/// Runs the full augmented-binning pipeline over one (time, flux) series.
///
/// Binning and anomaly selection operate on the raw flux; only the fidelity
/// trace is computed from the normalized stream.
pub fn augment_series(
    time: &[f64],
    flux: &[f64],
    scan_config: &ScanConfig,
    selector_config: &SelectorConfig,
) -> Result<AugmentOutcome, QfaError> {
    scan_config.validate()?;
    selector_config.validate()?;

    let started_at = Instant::now();
    let view = FluxSeriesView::new(time, flux)?;

    let mut raw_flux = view.flux().to_vec();
    let nan_imputed = view.n_nan();
    if nan_imputed > 0 {
        impute_nan_with_median(&mut raw_flux);
    }
    let normalized = normalize_robust(&raw_flux)?;

    let scan = scan_normalized(&normalized, scan_config, nan_imputed, started_at)?;
    let points = augment(time, &raw_flux, &scan.fidelity, selector_config)?;

    let mut diagnostics = scan.diagnostics;
    diagnostics.runtime_ms = Some(u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX));

    Ok(AugmentOutcome {
        points,
        diagnostics,
    })
}
