// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Diagnostics schema version for scan run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured metadata captured from one fidelity scan.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ScanDiagnostics {
    pub n: usize,
    pub n_scales: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    /// Gain actually used after noise-level rescaling, when applied.
    pub adaptive_sensitivity: Option<f64>,
    pub bidirectional: bool,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
}

impl Default for ScanDiagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            n_scales: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            adaptive_sensitivity: None,
            bidirectional: false,
            runtime_ms: None,
            notes: vec![],
        }
    }
}
