use gradnet_core::autograd::{expect_arity, Context, Function, Returns};
use gradnet_core::{GradnetError, Value};

/// y = a * b, element-wise.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mul;

impl Function for Mul {
    fn name(&self) -> &'static str {
        "Mul"
    }

    fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 2)?;
        let y = inputs[0].mul(&inputs[1])?;
        ctx.save_for_backward(inputs);
        Ok(y.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        expect_arity(self.name(), &grad_outputs, 1)?;
        let a = ctx.saved_value(0)?;
        let b = ctx.saved_value(1)?;
        let gy = &grad_outputs[0];
        Ok(ctx.input_grads(vec![gy.mul(b)?, gy.mul(a)?]))
    }
}
