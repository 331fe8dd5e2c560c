// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Benchmark namespace placeholder; the targets live under `benches/`.
pub fn crate_name() -> &'static str {
    "qfa-bench"
}
