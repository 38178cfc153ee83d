//! Synthetic demo dataset generation.
//!
//! Produces a calibration table that follows a known line plus Gaussian noise,
//! and first-order release profiles for several samples:
//!
//! ```text
//! M(t) = M∞ (1 - exp(-k t))
//! ```
//!
//! Each reading is taken from freshly replaced medium, so the concentration at
//! `t_i` carries the mass released since `t_{i-1}`:
//! `c_i = (M(t_i) - M(t_{i-1})) / V`. Summing `c_i * V` therefore recovers `M(t)`.

use std::fs::File;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{CalibrationPoint, DEFAULT_SAMPLE_VOLUME, MAX_SAMPLES};
use crate::error::AppError;
use crate::io::template::TEMPLATE_STANDARDS;

/// Sampling times (h) used for every demo sample.
pub const DEMO_TIMES: [f64; 10] = [0.0, 0.5, 1.0, 2.0, 4.0, 6.0, 8.0, 12.0, 24.0, 48.0];

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub samples: usize,
    pub seed: u64,
    /// True calibration slope (AU per µg/mL).
    pub slope: f64,
    /// True calibration intercept (AU).
    pub intercept: f64,
    /// Standard deviation of the absorbance noise (AU).
    pub noise_sd: f64,
    pub sample_volume: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            samples: 3,
            seed: 42,
            slope: 0.005,
            intercept: 0.002,
            noise_sd: 0.001,
            sample_volume: DEFAULT_SAMPLE_VOLUME,
        }
    }
}

/// One synthetic release profile.
#[derive(Debug, Clone)]
pub struct DemoSample {
    pub label: String,
    /// Total releasable mass (µg).
    pub plateau: f64,
    /// First-order rate constant (1/h).
    pub rate: f64,
    /// Absorbance at each of `DEMO_TIMES`.
    pub absorbances: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct DemoDataset {
    pub calibration: Vec<CalibrationPoint>,
    pub samples: Vec<DemoSample>,
}

pub fn generate_demo(config: &DemoConfig) -> Result<DemoDataset, AppError> {
    if config.samples == 0 || config.samples > MAX_SAMPLES {
        return Err(AppError::new(
            2,
            format!("Demo sample count must be in 1..={MAX_SAMPLES}."),
        ));
    }
    if !(config.slope.is_finite() && config.slope > 0.0) {
        return Err(AppError::new(2, "Demo calibration slope must be > 0."));
    }
    if !(config.sample_volume.is_finite() && config.sample_volume > 0.0) {
        return Err(AppError::new(2, "Demo sample volume must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sd.max(0.0))
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let calibration = TEMPLATE_STANDARDS
        .iter()
        .map(|&c| {
            let a = config.slope * c + config.intercept + noise.sample(&mut rng);
            CalibrationPoint::new(c, round4(a))
        })
        .collect();

    let mut samples = Vec::with_capacity(config.samples);
    for i in 0..config.samples {
        let plateau = rng.gen_range(400.0..=1200.0);
        // Spread rate constants so the profiles are visibly distinct.
        let rate = 0.05 * 1.8_f64.powi(i as i32);

        let mut absorbances = Vec::with_capacity(DEMO_TIMES.len());
        let mut released_before = 0.0;
        for &t in &DEMO_TIMES {
            let released = plateau * -(-rate * t).exp_m1();
            let concentration = (released - released_before) / config.sample_volume;
            released_before = released;

            let a = config.slope * concentration + config.intercept + noise.sample(&mut rng);
            absorbances.push(round4(a));
        }

        samples.push(DemoSample {
            label: format!("Sample {}", i + 1),
            plateau,
            rate,
            absorbances,
        });
    }

    Ok(DemoDataset {
        calibration,
        samples,
    })
}

/// Write the dataset as `calibration.csv` and a wide `release.csv` into `dir`.
pub fn write_demo(dir: &Path, dataset: &DemoDataset) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create demo dir '{}': {e}", dir.display())))?;
    let map = |e: csv::Error| AppError::new(2, format!("Failed to write demo CSV: {e}"));

    let path = dir.join("calibration.csv");
    let file = File::create(&path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(["concentration", "absorbance"]).map_err(map)?;
    for p in &dataset.calibration {
        wtr.write_record([p.concentration.to_string(), format!("{:.4}", p.absorbance)])
            .map_err(map)?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush demo CSV: {e}")))?;

    let path = dir.join("release.csv");
    let file = File::create(&path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    let mut wtr = csv::Writer::from_writer(file);

    let mut header = vec!["Time (h)".to_string()];
    header.extend(dataset.samples.iter().map(|s| s.label.clone()));
    wtr.write_record(&header).map_err(map)?;

    for (row, &t) in DEMO_TIMES.iter().enumerate() {
        let mut record = vec![t.to_string()];
        record.extend(dataset.samples.iter().map(|s| format!("{:.4}", s.absorbances[row])));
        wtr.write_record(&record).map_err(map)?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush demo CSV: {e}")))?;

    Ok(())
}

fn round4(v: f64) -> f64 {
    (v * 1e4).round() / 1e4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::fit;

    #[test]
    fn demo_is_reproducible() {
        let a = generate_demo(&DemoConfig::default()).unwrap();
        let b = generate_demo(&DemoConfig::default()).unwrap();
        assert_eq!(a.calibration, b.calibration);
        assert_eq!(a.samples[2].absorbances, b.samples[2].absorbances);
    }

    #[test]
    fn demo_calibration_recovers_true_line() {
        let config = DemoConfig::default();
        let data = generate_demo(&config).unwrap();
        let model = fit(&data.calibration).unwrap();
        assert!((model.slope - config.slope).abs() < 2e-4, "slope {}", model.slope);
        assert!(model.r_squared.unwrap() > 0.99);
    }

    #[test]
    fn demo_rates_are_distinct_and_increasing() {
        let data = generate_demo(&DemoConfig {
            samples: 4,
            ..DemoConfig::default()
        })
        .unwrap();
        for w in data.samples.windows(2) {
            assert!(w[1].rate > w[0].rate);
        }
        assert_eq!(data.samples[0].absorbances.len(), DEMO_TIMES.len());
    }

    #[test]
    fn demo_rejects_bad_sample_count() {
        let config = DemoConfig {
            samples: 0,
            ..DemoConfig::default()
        };
        assert!(generate_demo(&config).is_err());
    }
}
