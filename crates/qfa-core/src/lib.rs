// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Shared types for the qfa workspace: the error taxonomy, a validated
//! borrowed view over (time, flux) series, scan/selector configuration,
//! and per-run diagnostics.

mod config;
mod diagnostics;
mod error;
mod series;

pub use config::{ScanConfig, SelectorConfig, DEFAULT_DECAYS, DEFAULT_SENSITIVITY};
pub use diagnostics::{ScanDiagnostics, DIAGNOSTICS_SCHEMA_VERSION};
pub use error::QfaError;
pub use series::FluxSeriesView;
