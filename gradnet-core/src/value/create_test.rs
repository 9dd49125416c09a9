#[cfg(test)]
mod tests {
    use crate::device::StorageDevice;
    use crate::types::DType;
    use crate::value::{full, ones, ones_like, rand_with_rng, randn_with_rng, zeros, zeros_like, Value};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zeros_ones_full() {
        let z = zeros(&[2, 3], DType::F32).unwrap();
        assert_eq!(z.shape(), &[2, 3]);
        assert_eq!(z.dtype(), Some(DType::F32));
        assert!(z.to_vec_f64().unwrap().iter().all(|&x| x == 0.0));

        let o = ones(&[4], DType::F64).unwrap();
        assert!(o.to_vec_f64().unwrap().iter().all(|&x| x == 1.0));

        let f = full(&[3, 1, 2], 42.5, DType::F32).unwrap();
        assert_eq!(f.numel(), 6);
        assert!(f.to_vec_f32().unwrap().iter().all(|&x| x == 42.5));
    }

    #[test]
    fn test_like_constructors_follow_device_and_dtype() {
        let src = Value::from_vec_f64(vec![1.0, 2.0], vec![2])
            .unwrap()
            .to_device(StorageDevice::GPU)
            .unwrap();
        let z = zeros_like(&src).unwrap();
        let o = ones_like(&src).unwrap();
        assert_eq!(z.device(), Some(StorageDevice::GPU));
        assert_eq!(o.dtype(), Some(DType::F64));
        assert_eq!(o.to_vec_f64().unwrap(), vec![1.0, 1.0]);
        assert!(zeros_like(&Value::empty()).is_err());
    }

    #[test]
    fn test_random_creation_is_reproducible_with_seeded_rng() {
        let a = randn_with_rng(&mut StdRng::seed_from_u64(7), &[3, 4], DType::F32).unwrap();
        let b = randn_with_rng(&mut StdRng::seed_from_u64(7), &[3, 4], DType::F32).unwrap();
        assert_eq!(a.to_vec_f64().unwrap(), b.to_vec_f64().unwrap());

        let u = rand_with_rng(&mut StdRng::seed_from_u64(1), &[100], DType::F64).unwrap();
        assert!(u.to_vec_f64().unwrap().iter().all(|&x| (0.0..1.0).contains(&x)));
    }
}
