// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! The qfa core: a bank of decaying recursive filters over a pseudo-quantum
//! 2x2 state producing per-sample fidelity/coherence traces, a bidirectional
//! scanner combining forward and reversed passes, and the augmented-binning
//! selector that reduces a flux series to a baseline-plus-detail point set.

mod kernel;
mod scanner;
pub mod select;

pub use kernel::{multi_scale_scan, KernelTrace};
pub use scanner::MultiScaleQfa;
pub use select::{augment, AugmentedPoint, PointSource};
