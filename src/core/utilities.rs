//! Bounded sampling primitives used when a layer is initialized and while it learns.

use rand::Rng;
use std::f32::consts::PI;
use tracing::trace;

/// Draws an initial permanence value "near" `center`.
///
/// This evaluates the probability density of a Gaussian with mean `center` and standard
/// deviation `sqrt(center)` at a uniformly random point in `[0, 1)`. It does not sample from the
/// Gaussian. Values are concentrated in a predictable band for thresholds around `0.2`, and are
/// clamped into `[0, 1]` when the density exceeds one (small centers).
pub fn biased_sample<R: Rng>(center: f32, rng: &mut R) -> f32 {
    let std_dev = center.sqrt();

    if !std_dev.is_finite() || std_dev <= 0.0 {
        return 0.0;
    }

    let x: f32 = rng.random();
    let density = gaussian_density(x, center, std_dev);
    let clamped = clamp(density, 0.0, 1.0);

    if clamped != density {
        trace!(center, density, "bias sample clamped");
    }

    clamped
}

/// Probability density of `N(mean, std_dev²)` at `x`.
#[inline]
fn gaussian_density(x: f32, mean: f32, std_dev: f32) -> f32 {
    let z = (x - mean) / std_dev;
    (-0.5 * z * z).exp() / (std_dev * (2.0 * PI).sqrt())
}

/// Bounds `value` to `[lo, hi]`.
#[inline]
pub fn clamp(value: f32, lo: f32, hi: f32) -> f32 {
    value.min(hi).max(lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(1.3, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.2, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn test_biased_sample_band_for_default_threshold() {
        let mut rng = StdRng::seed_from_u64(7);

        // Density of N(0.2, 0.2) over [0, 1): peak ~0.892 at x = 0.2, minimum ~0.180 at x -> 1.
        for _ in 0..10_000 {
            let v = biased_sample(0.2, &mut rng);
            assert!((0.17..=0.90).contains(&v), "sample {v} outside expected band");
        }
    }

    #[test]
    fn test_biased_sample_always_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(11);

        for &center in &[0.001, 0.01, 0.05, 0.2, 0.5, 0.9, 1.0] {
            for _ in 0..1_000 {
                let v = biased_sample(center, &mut rng);
                assert!((0.0..=1.0).contains(&v), "center {center} gave {v}");
            }
        }
    }

    #[test]
    fn test_biased_sample_degenerate_center() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(biased_sample(0.0, &mut rng), 0.0);
        assert_eq!(biased_sample(-1.0, &mut rng), 0.0);
    }
}
