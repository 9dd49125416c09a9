use rand::Rng;

use gradnet_core::value::{randn_with_rng, zeros};
use gradnet_core::{DType, GradnetError, Value};

/// Standard normal samples scaled by `1 / sqrt(fan_in)`.
pub fn scaled_randn<R: Rng + ?Sized>(
    rng: &mut R,
    shape: &[usize],
    fan_in: usize,
    dtype: DType,
) -> Result<Value, GradnetError> {
    if fan_in == 0 {
        return Err(GradnetError::InvalidArgument(
            "fan_in must be positive for weight initialisation".to_string(),
        ));
    }
    randn_with_rng(rng, shape, dtype)?.mul_scalar(1.0 / (fan_in as f64).sqrt())
}

/// Zero-filled bias of length `features`.
pub fn zero_bias(features: usize, dtype: DType) -> Result<Value, GradnetError> {
    zeros(&[features], dtype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_scaled_randn_shape_and_scale() {
        let mut rng = StdRng::seed_from_u64(0);
        let w = scaled_randn(&mut rng, &[64, 100], 100, DType::F64).unwrap();
        assert_eq!(w.shape(), &[64, 100]);

        let data = w.to_vec_f64().unwrap();
        let mean_sq = data.iter().map(|x| x * x).sum::<f64>() / data.len() as f64;
        // Variance of N(0, 1) / sqrt(100) is 0.01.
        assert!(mean_sq > 0.005 && mean_sq < 0.02, "mean square {}", mean_sq);
    }

    #[test]
    fn test_zero_fan_in_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            scaled_randn(&mut rng, &[1, 0], 0, DType::F32),
            Err(GradnetError::InvalidArgument(_))
        ));
    }
}
