// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use qfa_core::SelectorConfig;
use qfa_engine::{augment, MultiScaleQfa};

fn mapped_flux(bytes: &[u8]) -> Vec<f64> {
    bytes
        .iter()
        .map(|b| (f64::from(*b) - 127.5) / 8.0)
        .collect()
}

fn mapped_decays(seed: u8) -> Vec<f64> {
    let count = usize::from(seed % 5) + 1;
    (0..count)
        .map(|k| 0.005 + f64::from(seed.wrapping_add(k as u8)) / 256.0 * 0.98)
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let Some((&decay_seed, rest)) = data.split_first() else {
        return;
    };
    if rest.is_empty() {
        return;
    }

    let flux = mapped_flux(rest);
    let time: Vec<f64> = (0..flux.len()).map(|i| i as f64).collect();
    let decays = mapped_decays(decay_seed);

    let scanner = MultiScaleQfa::new(0.1, decays, true).expect("mapped decays must be valid");
    let fidelity = scanner
        .scan(&flux, true)
        .expect("scan over finite input must succeed");

    assert_eq!(fidelity.len(), flux.len());
    for f in &fidelity {
        assert!((0.0..=1.0).contains(f), "fidelity out of bounds: {f}");
    }

    let config = SelectorConfig {
        baseline_pct: 15.0,
        anomaly_pct: f64::from(decay_seed % 21),
    };
    let points =
        augment(&time, &flux, &fidelity, &config).expect("augment over finite input must succeed");

    for pair in points.windows(2) {
        assert!(pair[0].time <= pair[1].time, "output must be time-sorted");
    }
});
