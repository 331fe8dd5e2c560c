// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Augmented binning: a uniform coarse baseline of bin means merged with
//! the lowest-fidelity full-resolution points, stable-sorted by time.

use qfa_core::{QfaError, SelectorConfig};

/// Provenance of one output point.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointSource {
    /// Arithmetic mean of one uniform baseline bin.
    Bin,
    /// Full-resolution sample selected for low fidelity.
    Qfa,
}

impl PointSource {
    /// Integer wire encoding used in augmented CSV output: 0 = bin, 1 = qfa.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Bin => 0,
            Self::Qfa => 1,
        }
    }
}

/// One point of the reduced output series.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AugmentedPoint {
    pub time: f64,
    pub flux: f64,
    pub source: PointSource,
}

/// Bins a series down to roughly `target_pct` percent of its points by
/// contiguous-group arithmetic means.
///
/// The trailing remainder that does not fill a whole bin is discarded; at
/// least one bin is always produced.
pub fn binning_downsample(
    time: &[f64],
    flux: &[f64],
    target_pct: f64,
) -> Result<Vec<AugmentedPoint>, QfaError> {
    if time.len() != flux.len() {
        return Err(QfaError::invalid_input(format!(
            "time/flux length mismatch: time has {}, flux has {}",
            time.len(),
            flux.len()
        )));
    }
    let n = time.len();
    if n == 0 {
        return Err(QfaError::invalid_input("cannot bin an empty series"));
    }

    let target_n = (((n as f64) * (target_pct / 100.0)) as usize).max(1);
    let bin_size = (n / target_n).max(1);
    let n_bins = n / bin_size;

    let mut points = Vec::with_capacity(n_bins);
    for bin in 0..n_bins {
        let start = bin * bin_size;
        let end = start + bin_size;
        let time_mean = time[start..end].iter().sum::<f64>() / bin_size as f64;
        let flux_mean = flux[start..end].iter().sum::<f64>() / bin_size as f64;
        points.push(AugmentedPoint {
            time: time_mean,
            flux: flux_mean,
            source: PointSource::Bin,
        });
    }
    Ok(points)
}

/// Indices of the `n_select` lowest-fidelity samples, ascending by fidelity
/// with ties broken by original index (stable argsort prefix).
fn lowest_fidelity_indices(fidelity: &[f64], n_select: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fidelity.len()).collect();
    order.sort_by(|a, b| fidelity[*a].total_cmp(&fidelity[*b]));
    order.truncate(n_select);
    order
}

/// Produces the reduced output series: baseline bin means plus the
/// lowest-fidelity full-resolution points, merged and stable-sorted
/// ascending by time.
///
/// Low fidelity is the anomaly signal: the kernel's trace tends toward 1
/// for baseline input and drops where the rotation history is consistent
/// with a sustained dip. Overlap between binned and selected points is
/// permitted; output length is exactly `n_bins + n_select`.
pub fn augment(
    time: &[f64],
    flux: &[f64],
    fidelity: &[f64],
    config: &SelectorConfig,
) -> Result<Vec<AugmentedPoint>, QfaError> {
    config.validate()?;
    if time.len() != flux.len() || time.len() != fidelity.len() {
        return Err(QfaError::invalid_input(format!(
            "time/flux/fidelity length mismatch: {} / {} / {}",
            time.len(),
            flux.len(),
            fidelity.len()
        )));
    }
    let n = time.len();
    if n == 0 {
        return Err(QfaError::invalid_input("cannot augment an empty series"));
    }

    let mut points = binning_downsample(time, flux, config.baseline_pct)?;

    let n_select = ((n as f64) * (config.anomaly_pct / 100.0)) as usize;
    for idx in lowest_fidelity_indices(fidelity, n_select) {
        points.push(AugmentedPoint {
            time: time[idx],
            flux: flux[idx],
            source: PointSource::Qfa,
        });
    }

    // stable sort keeps bin-vs-qfa order deterministic within time ties
    points.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::{augment, binning_downsample, lowest_fidelity_indices, PointSource};
    use qfa_core::SelectorConfig;

    fn ramp(n: usize) -> (Vec<f64>, Vec<f64>) {
        let time: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let flux: Vec<f64> = (0..n).map(|i| 1.0 + (i % 3) as f64).collect();
        (time, flux)
    }

    #[test]
    fn binning_produces_expected_count_and_means() {
        let time = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let flux = [1.0, 3.0, 5.0, 7.0, 2.0, 4.0, 6.0, 8.0, 0.0, 10.0];

        // target 20% of 10 points -> 2 bins of 5
        let points = binning_downsample(&time, &flux, 20.0).expect("binning should succeed");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, 2.0);
        assert_eq!(points[0].flux, 3.6);
        assert_eq!(points[1].time, 7.0);
        assert_eq!(points[1].flux, 5.6);
        assert!(points.iter().all(|p| p.source == PointSource::Bin));
    }

    #[test]
    fn binning_discards_trailing_remainder() {
        let (time, flux) = ramp(103);
        // bin_size = 103 / 15 = 6, n_bins = 103 / 6 = 17, remainder 1 dropped
        let points = binning_downsample(&time, &flux, 15.0).expect("binning should succeed");
        assert_eq!(points.len(), 17);
        let last = points.last().expect("at least one bin");
        assert!(last.time < 102.0);
    }

    #[test]
    fn binning_forces_at_least_one_bin_for_tiny_series() {
        let time = [0.0, 1.0, 2.0];
        let flux = [1.0, 2.0, 3.0];
        let points = binning_downsample(&time, &flux, 15.0).expect("binning should succeed");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time, 1.0);
        assert_eq!(points[0].flux, 2.0);
    }

    #[test]
    fn binning_rejects_empty_and_mismatched_input() {
        assert!(binning_downsample(&[], &[], 15.0).is_err());
        assert!(binning_downsample(&[0.0, 1.0], &[1.0], 15.0).is_err());
    }

    #[test]
    fn lowest_fidelity_prefix_is_stable_on_ties() {
        let fidelity = [0.9, 0.1, 0.5, 0.1, 0.2];
        assert_eq!(lowest_fidelity_indices(&fidelity, 3), vec![1, 3, 4]);
    }

    #[test]
    fn augment_output_length_matches_documented_formulas() {
        let n = 1000;
        let (time, flux) = ramp(n);
        let fidelity: Vec<f64> = (0..n).map(|i| 1.0 - (i as f64) / (n as f64)).collect();
        let config = SelectorConfig {
            baseline_pct: 15.0,
            anomaly_pct: 5.0,
        };

        let points = augment(&time, &flux, &fidelity, &config).expect("augment should succeed");

        let target_n = ((n as f64) * 0.15) as usize; // 150
        let bin_size = n / target_n; // 6
        let n_bins = n / bin_size; // 166
        let n_select = ((n as f64) * 0.05) as usize; // 50
        assert_eq!(points.len(), n_bins + n_select);

        let n_qfa = points
            .iter()
            .filter(|p| p.source == PointSource::Qfa)
            .count();
        assert_eq!(n_qfa, n_select);
    }

    #[test]
    fn augment_output_is_sorted_by_time() {
        let n = 500;
        let (time, flux) = ramp(n);
        let fidelity: Vec<f64> = (0..n).map(|i| ((i * 7919) % 101) as f64 / 101.0).collect();
        let points = augment(&time, &flux, &fidelity, &SelectorConfig::default())
            .expect("augment should succeed");

        for pair in points.windows(2) {
            assert!(pair[0].time <= pair[1].time, "output must be time-sorted");
        }
    }

    #[test]
    fn augment_selects_the_lowest_fidelity_samples() {
        let n = 200;
        let (time, flux) = ramp(n);
        let mut fidelity = vec![1.0; n];
        for (offset, f) in fidelity.iter_mut().skip(90).take(10).enumerate() {
            *f = 0.01 * (offset as f64 + 1.0);
        }
        let config = SelectorConfig {
            baseline_pct: 15.0,
            anomaly_pct: 5.0, // n_select = 10
        };

        let points = augment(&time, &flux, &fidelity, &config).expect("augment should succeed");
        let qfa_times: Vec<f64> = points
            .iter()
            .filter(|p| p.source == PointSource::Qfa)
            .map(|p| p.time)
            .collect();

        assert_eq!(qfa_times.len(), 10);
        assert!(qfa_times.iter().all(|t| (90.0..100.0).contains(t)));
    }

    #[test]
    fn zero_anomaly_pct_yields_bins_only() {
        let (time, flux) = ramp(120);
        let fidelity = vec![1.0; 120];
        let config = SelectorConfig {
            baseline_pct: 15.0,
            anomaly_pct: 0.0,
        };
        let points = augment(&time, &flux, &fidelity, &config).expect("augment should succeed");
        assert!(points.iter().all(|p| p.source == PointSource::Bin));
    }

    #[test]
    fn augment_rejects_invalid_percentages_and_mismatches() {
        let (time, flux) = ramp(50);
        let fidelity = vec![1.0; 50];

        let bad_pct = SelectorConfig {
            anomaly_pct: 101.0,
            ..SelectorConfig::default()
        };
        assert!(augment(&time, &flux, &fidelity, &bad_pct).is_err());

        let short_fidelity = vec![1.0; 49];
        assert!(augment(&time, &flux, &short_fidelity, &SelectorConfig::default()).is_err());
    }

    #[test]
    fn source_wire_encoding_matches_the_csv_contract() {
        assert_eq!(PointSource::Bin.as_u8(), 0);
        assert_eq!(PointSource::Qfa.as_u8(), 1);
    }
}
