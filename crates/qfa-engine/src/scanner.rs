// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::kernel::{multi_scale_scan, KernelTrace};
use qfa_core::{QfaError, ScanConfig};

/// Bidirectional multi-scale fidelity scanner.
///
/// Holds a validated scan configuration and runs the recursive kernel over
/// a flux stream, optionally in both directions. The forward pass lags a
/// dip slightly late, the backward pass slightly early; combining them with
/// a pointwise max and no shift correction is a conservative choice that
/// favors suppressing false positives over perfectly centering detections.
#[derive(Clone, Debug)]
pub struct MultiScaleQfa {
    sensitivity: f64,
    decays: Vec<f64>,
    gain_autoscaling: bool,
}

impl MultiScaleQfa {
    /// Constructs a scanner from explicit parameters.
    pub fn new(
        sensitivity: f64,
        decays: Vec<f64>,
        gain_autoscaling: bool,
    ) -> Result<Self, QfaError> {
        let config = ScanConfig {
            sensitivity,
            decays,
            gain_autoscaling,
            // direction is chosen per call, not per scanner
            bidirectional: true,
        };
        config.validate()?;
        Ok(Self {
            sensitivity: config.sensitivity,
            decays: config.decays,
            gain_autoscaling: config.gain_autoscaling,
        })
    }

    /// Constructs a scanner from a [`ScanConfig`], ignoring its
    /// `bidirectional` flag (passed per call instead).
    pub fn from_config(config: &ScanConfig) -> Result<Self, QfaError> {
        Self::new(
            config.sensitivity,
            config.decays.clone(),
            config.gain_autoscaling,
        )
    }

    fn forward(&self, data_stream: &[f64]) -> Result<KernelTrace, QfaError> {
        multi_scale_scan(
            data_stream,
            self.sensitivity,
            &self.decays,
            self.gain_autoscaling,
        )
    }

    fn backward(&self, data_stream: &[f64]) -> Result<KernelTrace, QfaError> {
        let reversed: Vec<f64> = data_stream.iter().rev().copied().collect();
        let mut trace = multi_scale_scan(
            &reversed,
            self.sensitivity,
            &self.decays,
            self.gain_autoscaling,
        )?;
        trace.fidelity.reverse();
        trace.coherence.reverse();
        Ok(trace)
    }

    /// Runs the forward and backward passes.
    ///
    /// The two passes share no mutable state and run as independent tasks
    /// when the `rayon` feature is enabled.
    fn dual_pass(&self, data_stream: &[f64]) -> Result<(KernelTrace, KernelTrace), QfaError> {
        #[cfg(feature = "rayon")]
        {
            let (forward, backward) =
                rayon::join(|| self.forward(data_stream), || self.backward(data_stream));
            Ok((forward?, backward?))
        }
        #[cfg(not(feature = "rayon"))]
        {
            Ok((self.forward(data_stream)?, self.backward(data_stream)?))
        }
    }

    /// Scans a flux stream and returns the combined fidelity trace.
    pub fn scan(&self, data_stream: &[f64], bidirectional: bool) -> Result<Vec<f64>, QfaError> {
        if !bidirectional {
            return Ok(self.forward(data_stream)?.fidelity);
        }
        let (forward, backward) = self.dual_pass(data_stream)?;
        Ok(combine_max(&forward.fidelity, &backward.fidelity))
    }

    /// Scans a flux stream and returns the combined fidelity trace together
    /// with the forward coherence trace.
    ///
    /// Coherence is directional by nature, so only the forward pass's
    /// coherence is reported; the fidelity combination is unchanged.
    pub fn scan_with_coherence(
        &self,
        data_stream: &[f64],
        bidirectional: bool,
    ) -> Result<(Vec<f64>, Vec<f64>), QfaError> {
        if !bidirectional {
            let trace = self.forward(data_stream)?;
            return Ok((trace.fidelity, trace.coherence));
        }
        let (forward, backward) = self.dual_pass(data_stream)?;
        let combined = combine_max(&forward.fidelity, &backward.fidelity);
        Ok((combined, forward.coherence))
    }
}

fn combine_max(forward: &[f64], backward: &[f64]) -> Vec<f64> {
    forward
        .iter()
        .zip(backward)
        .map(|(f, b)| f.max(*b))
        .collect()
}
