use gradnet_core::autograd::{expect_arity, Context, Function, Returns};
use gradnet_core::{GradnetError, Value};

/// y = x where x > threshold, `value` elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub threshold: f64,
    pub value: f64,
}

impl Threshold {
    pub fn new(threshold: f64, value: f64) -> Self {
        Threshold { threshold, value }
    }
}

/// ReLU is `Threshold(0, 0)`.
pub fn relu() -> Threshold {
    Threshold::new(0.0, 0.0)
}

impl Function for Threshold {
    fn name(&self) -> &'static str {
        "Threshold"
    }

    fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 1)?;
        let (threshold, value) = (self.threshold, self.value);
        let y = inputs[0].map(|x| if x > threshold { x } else { value })?;
        ctx.save_for_backward(inputs);
        Ok(y.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        expect_arity(self.name(), &grad_outputs, 1)?;
        let x = ctx.saved_value(0)?;
        let threshold = self.threshold;
        let gx = grad_outputs[0].zip_map(x, "threshold_backward", |g, x| {
            if x > threshold {
                g
            } else {
                0.0
            }
        })?;
        Ok(ctx.input_grads(vec![gx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradnet_core::autograd::{Module, Variable};
    use gradnet_core::utils::testing::check_value_near;

    #[test]
    fn test_relu_masks_gradient() {
        let x = Variable::new(Value::from_vec_f64(vec![-1.0, 0.0, 2.0], vec![3]).unwrap());
        let module = Module::new(relu());
        let y = module.call([&x]).unwrap();
        check_value_near(&y.data(), &[3], &[0.0, 0.0, 2.0], 1e-12);

        y.backward(Value::from_vec_f64(vec![5.0, 5.0, 5.0], vec![3]).unwrap())
            .unwrap();
        check_value_near(&x.grad(), &[3], &[0.0, 0.0, 5.0], 1e-12);
    }

    #[test]
    fn test_threshold_fills_value() {
        let x = Variable::new(Value::from_vec_f32(vec![0.5, 1.5], vec![2]).unwrap());
        let threshold = Module::new(Threshold::new(1.0, -7.0));
        let y = threshold.call([&x]).unwrap();
        check_value_near(&y.data(), &[2], &[-7.0, 1.5], 1e-6);
    }
}
