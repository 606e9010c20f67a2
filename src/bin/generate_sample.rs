//! Writes a synthetic batch of exported traces for trying out `pmtraces`.
//!
//! Layout matches a real export: two groups, two series per group, five
//! sweeps per series, one current (`Imon`) and one voltage (`Vmon`) trace per
//! sweep, each as `<name>.npy` + `<name>.json`.
//!
//! ```bash
//! cargo run --bin generate_sample -- sample_traces
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;

use pmtraces::data::loader::write_trace;
use pmtraces::MetadataRecord;

const PREFIX: &str = "PM";
const POINTS: usize = 2000;
const DELTA_X: f64 = 5e-5;
const SWEEP_INTERVAL: f64 = 2.0;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Holding potential, then a step to `step_mv` between 20% and 70% of the sweep.
fn voltage_trace(step_mv: f64) -> Vec<f64> {
    (0..POINTS)
        .map(|i| {
            let in_step = i >= POINTS / 5 && i < POINTS * 7 / 10;
            if in_step {
                step_mv * 1e-3
            } else {
                -0.07
            }
        })
        .collect()
}

/// Capacitive transient at both step edges plus a leak current and noise.
fn current_trace(step_mv: f64, rng: &mut SimpleRng) -> Vec<f64> {
    let on = POINTS / 5;
    let off = POINTS * 7 / 10;
    let tau = 40.0;
    let leak = 1e-9;
    (0..POINTS)
        .map(|i| {
            let amp = (step_mv + 70.0) * 2e-11;
            let transient = if i >= off {
                -amp * (-((i - off) as f64) / tau).exp()
            } else if i >= on {
                amp * (-((i - on) as f64) / tau).exp() + leak * (step_mv + 70.0) / 100.0
            } else {
                0.0
            };
            transient + rng.gauss(0.0, 2e-12)
        })
        .collect()
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "sample_traces".to_string()),
    );
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut written = 0;

    for group in 1..=2 {
        for series in 1..=2 {
            for sweep in 1..=5 {
                let step_mv = -60.0 + 20.0 * (sweep - 1) as f64;
                let sweep_time = SWEEP_INTERVAL * (sweep - 1) as f64;
                let series_label = if series == 1 { "IV" } else { "IV-repeat" };
                let params = |trace_label: &str| {
                    json!({
                        "trace": { "Label": trace_label },
                        "sweep": { "Rel. Sweep Time": sweep_time, "Label": format!("Sweep {sweep}") },
                        "series": { "Label": series_label },
                        "group": { "Label": format!("Cell {group}") },
                    })
                };

                let traces = [
                    ("Imon", "A", current_trace(step_mv, &mut rng)),
                    ("Vmon", "V", voltage_trace(step_mv)),
                ];
                for (trace, unit_y, samples) in traces {
                    let record = MetadataRecord {
                        unit_x: "s".into(),
                        unit_y: unit_y.into(),
                        x_0: 0.0,
                        delta_x: DELTA_X,
                        numpnts: POINTS as i64,
                        params: params(trace),
                    };
                    let name = format!("{PREFIX}_{group}_{series}_{sweep}_{trace}.npy");
                    write_trace(&out_dir.join(&name), &record, &samples)
                        .with_context(|| format!("writing {name}"))?;
                    written += 1;
                }
            }
        }
    }

    println!(
        "Wrote {written} traces ({POINTS} points each) to {}",
        out_dir.display()
    );
    Ok(())
}
