#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::autograd::function::{Function, Returns};
    use crate::autograd::grad_check::{check_grad, numeric_grad, GradCheckConfig, GradCheckError};
    use crate::autograd::module::{Context, Module};
    use crate::autograd::test_functions::{Fork, Plus, Scale, Square};
    use crate::autograd::variable::Variable;
    use crate::error::GradnetError;
    use crate::types::DType;
    use crate::utils::testing::init_logger;
    use crate::value::{ones, Value};

    fn leaf(data: Vec<f64>) -> Variable {
        let n = data.len();
        Variable::new(Value::from_vec_f64(data, vec![n]).unwrap())
    }

    /// Forward of `Square` with a backward that forgets the factor 2.
    #[derive(Debug)]
    struct WrongSquare;

    impl Function for WrongSquare {
        fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
            ctx.save_for_backward(inputs.clone());
            Ok(inputs[0].mul(&inputs[0])?.into())
        }

        fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
            Ok(vec![grad_outputs[0].mul(ctx.saved_value(0)?)?])
        }
    }

    #[test]
    fn test_default_config() {
        let config = GradCheckConfig::default();
        assert_eq!(config.eps, 1e-3);
        assert_eq!(config.rtol, 1e-3);
        assert_eq!(config.atol, 1e-5);
        assert_eq!(config.max_view, 20);

        let tuned = config.with_eps(1e-4).with_rtol(1e-2).with_atol(0.0).with_max_view(3);
        assert_eq!(tuned.eps, 1e-4);
        assert_eq!(tuned.rtol, 1e-2);
        assert_eq!(tuned.atol, 0.0);
        assert_eq!(tuned.max_view, 3);
    }

    #[test]
    fn test_numeric_grad_of_square() {
        let x = leaf(vec![1.0, -2.0, 3.0]);
        let square = Module::new(Square);
        let func = |xs: &[Variable]| -> Result<Vec<Variable>, GradnetError> {
            Ok(vec![square.call(xs)?])
        };
        let grads = numeric_grad(
            &func,
            &[x.clone()],
            &[ones(&[3], DType::F64).unwrap()],
            1e-3,
        )
        .unwrap();

        let g = grads[0].to_vec_f64().unwrap();
        assert_relative_eq!(g[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(g[1], -4.0, epsilon = 1e-6);
        assert_relative_eq!(g[2], 6.0, epsilon = 1e-6);

        // The originals are untouched.
        assert_eq!(x.data().to_vec_f64().unwrap(), vec![1.0, -2.0, 3.0]);
        assert!(x.grad().is_empty());
    }

    #[test]
    fn test_check_grad_single_input() {
        init_logger();
        let square = Module::new(Square);
        let x = leaf(vec![0.5, -1.5, 2.0, 4.0]);
        let gy = Value::from_vec_f64(vec![1.0, 0.5, -2.0, 0.25], vec![4]).unwrap();

        check_grad(
            |xs: &[Variable]| Ok(vec![square.call(xs)?]),
            &[x.clone()],
            &[gy],
            &GradCheckConfig::default(),
        )
        .unwrap();
        assert!(x.grad().is_defined());
    }

    #[test]
    fn test_check_grad_two_inputs() {
        let plus = Module::new(Plus);
        let square = Module::new(Square);
        let a = leaf(vec![1.0, 2.0]);
        let b = leaf(vec![-3.0, 0.5]);

        check_grad(
            |xs: &[Variable]| {
                let sq = square.call([&xs[1]])?;
                Ok(vec![plus.call([&xs[0], &sq])?])
            },
            &[a, b],
            &[ones(&[2], DType::F64).unwrap()],
            &GradCheckConfig::default(),
        )
        .unwrap();
    }

    #[test]
    fn test_check_grad_multi_output() {
        let fork = Module::new(Fork::default());
        let x = leaf(vec![1.0, 2.0, 3.0]);
        let g0 = Value::from_vec_f64(vec![1.0, 2.0, 3.0], vec![3]).unwrap();
        let g1 = Value::from_vec_f64(vec![-1.0, 0.0, 1.0], vec![3]).unwrap();

        check_grad(
            |xs: &[Variable]| Ok(fork.apply(xs)?.into_vec()),
            &[x],
            &[g0, g1],
            &GradCheckConfig::default(),
        )
        .unwrap();
    }

    #[test]
    fn test_check_grad_with_parameter() {
        let weight = leaf(vec![0.5, -1.0]);
        let scale = Module::new(Scale {
            weight: weight.clone(),
        });
        let x = leaf(vec![2.0, 3.0]);

        check_grad(
            |xs: &[Variable]| Ok(vec![scale.call(xs)?]),
            &[x],
            &[ones(&[2], DType::F64).unwrap()],
            &GradCheckConfig::default(),
        )
        .unwrap();
        assert_eq!(weight.grad().to_vec_f64().unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_check_grad_reports_mismatch() {
        let wrong = Module::new(WrongSquare);
        let x = leaf(vec![1.0, 2.0, 3.0]);
        let config = GradCheckConfig::default().with_max_view(2);

        let err = check_grad(
            |xs: &[Variable]| Ok(vec![wrong.call(xs)?]),
            &[x],
            &[ones(&[3], DType::F64).unwrap()],
            &config,
        )
        .unwrap_err();

        match err {
            GradCheckError::GradientMismatch {
                input_index,
                analytic,
                numeric,
            } => {
                assert_eq!(input_index, 0);
                assert_eq!(analytic.len(), 2);
                assert_eq!(numeric.len(), 2);
                assert_relative_eq!(analytic[1], 2.0, epsilon = 1e-9);
                assert_relative_eq!(numeric[1], 4.0, epsilon = 1e-6);
            }
            other => panic!("Expected GradientMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_check_grad_output_count_mismatch() {
        let square = Module::new(Square);
        let x = leaf(vec![1.0]);
        let gy = ones(&[1], DType::F64).unwrap();

        let err = check_grad(
            |xs: &[Variable]| Ok(vec![square.call(xs)?]),
            &[x],
            &[gy.clone(), gy],
            &GradCheckConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GradCheckError::OutputCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_check_grad_forward_error_is_wrapped() {
        let plus = Module::new(Plus);
        let x = leaf(vec![1.0]);

        let err = check_grad(
            |xs: &[Variable]| Ok(vec![plus.call(xs)?]),
            &[x],
            &[ones(&[1], DType::F64).unwrap()],
            &GradCheckConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GradCheckError::Forward(GradnetError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_check_grad_missing_gradient() {
        let square = Module::new(Square);
        let used = leaf(vec![1.0]);
        let unused = leaf(vec![5.0]);

        let err = check_grad(
            |xs: &[Variable]| Ok(vec![square.call([&xs[0]])?]),
            &[used, unused],
            &[ones(&[1], DType::F64).unwrap()],
            &GradCheckConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, GradCheckError::MissingGradient { input_index: 1 });
    }

    #[test]
    fn test_numeric_grad_rejects_eps_below_precision() {
        let x = Variable::new(Value::from_vec_f32(vec![1.0e6], vec![1]).unwrap());
        let square = Module::new(Square);
        let func = |xs: &[Variable]| -> Result<Vec<Variable>, GradnetError> {
            Ok(vec![square.call(xs)?])
        };

        let result = numeric_grad(&func, &[x], &[ones(&[1], DType::F32).unwrap()], 1e-3);
        assert!(matches!(
            result,
            Err(GradCheckError::Value(GradnetError::InvalidArgument(_)))
        ));
    }
}
