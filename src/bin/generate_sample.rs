//! Write `sample_data.abf`: a synthetic current-clamp step protocol to try the viewer on.

use abf_crop::data::writer::write_abf1;

const SAMPLE_RATE_HZ: f64 = 20_000.0;
const SWEEP_SECONDS: f64 = 2.0;
const RESTING_MV: f64 = -70.0;
const TAU_S: f64 = 0.02;

/// Membrane response to a current step from 0.5 s to 1.5 s, with noise.
fn generate_sweep(step_mv: f64, noise: &mut Noise) -> Vec<f64> {
    let points = (SAMPLE_RATE_HZ * SWEEP_SECONDS) as usize;
    (0..points)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE_HZ;
            let charge = |since: f64| 1.0 - (-since / TAU_S).exp();
            let response = if t < 0.5 {
                0.0
            } else if t < 1.5 {
                step_mv * charge(t - 0.5)
            } else {
                step_mv * charge(1.0) * (-(t - 1.5) / TAU_S).exp()
            };
            RESTING_MV + response + noise.sample()
        })
        .collect()
}

/// Seeded Gaussian noise: splitmix64 uniforms through Box-Muller.
struct Noise {
    state: u64,
    sigma: f64,
}

impl Noise {
    fn new(seed: u64, sigma: f64) -> Self {
        Noise { state: seed, sigma }
    }

    fn uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    fn sample(&mut self) -> f64 {
        let radius = (-2.0 * self.uniform().max(f64::MIN_POSITIVE).ln()).sqrt();
        self.sigma * radius * (std::f64::consts::TAU * self.uniform()).cos()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut noise = Noise::new(42, 0.3);

    // -20 mV … +25 mV in 5 mV steps
    let sweeps: Vec<Vec<f64>> = (0..10)
        .map(|i| generate_sweep(-20.0 + 5.0 * i as f64, &mut noise))
        .collect();

    let output_path = "sample_data.abf";
    write_abf1(output_path, &sweeps, SAMPLE_RATE_HZ, "Vm", "mV")?;

    println!(
        "Wrote {} sweeps ({SWEEP_SECONDS} s each at {SAMPLE_RATE_HZ} Hz) to {output_path}",
        sweeps.len()
    );
    Ok(())
}
