#[cfg(test)]
mod tests {
    use crate::error::GradnetError;
    use crate::value::Value;

    #[test]
    fn test_matmul_2x3_3x2() {
        let a = Value::from_vec_f64(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let b = Value::from_vec_f64(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], vec![3, 2]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.to_vec_f64().unwrap(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_inner_dim_mismatch() {
        let a = Value::from_vec_f32(vec![1.0; 6], vec![2, 3]).unwrap();
        let b = Value::from_vec_f32(vec![1.0; 4], vec![2, 2]).unwrap();
        assert!(matches!(a.matmul(&b), Err(GradnetError::ShapeMismatch { .. })));

        let flat = Value::from_vec_f32(vec![1.0; 3], vec![3]).unwrap();
        assert!(matches!(a.matmul(&flat), Err(GradnetError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_transpose() {
        let a = Value::from_vec_f32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let t = a.transpose().unwrap();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.to_vec_f32().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }
}
