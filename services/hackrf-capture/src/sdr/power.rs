//! Signal level estimation for decoded samples

use num_complex::Complex32;

/// Level reported for an empty or silent batch
const FLOOR_DBFS: f32 = -100.0;

/// Average power of a batch relative to full scale (|z| = 1.0).
///
/// Samples from the LUT never exceed 1.0 in either component, so a full-scale
/// carrier reads close to 0 dBFS.
pub fn mean_power_dbfs(samples: &[Complex32]) -> f32 {
    if samples.is_empty() {
        return FLOOR_DBFS;
    }

    let sum: f64 = samples.iter().map(|s| s.norm_sqr() as f64).sum();
    let mean = sum / samples.len() as f64;
    if mean <= 0.0 {
        return FLOOR_DBFS;
    }

    ((10.0 * mean.log10()) as f32).max(FLOOR_DBFS)
}
