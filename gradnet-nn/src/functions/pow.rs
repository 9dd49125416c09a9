use gradnet_core::autograd::{expect_arity, Context, Function, Returns};
use gradnet_core::{GradnetError, Value};

/// y = x^n, element-wise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pow {
    pub n: f64,
}

impl Pow {
    pub fn new(n: f64) -> Self {
        Pow { n }
    }
}

impl Function for Pow {
    fn name(&self) -> &'static str {
        "Pow"
    }

    fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 1)?;
        let y = inputs[0].pow_scalar(self.n)?;
        ctx.save_for_backward(inputs);
        Ok(y.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        expect_arity(self.name(), &grad_outputs, 1)?;
        let x = ctx.saved_value(0)?;
        let n = self.n;
        let local = x.map(|v| n * v.powf(n - 1.0))?;
        Ok(ctx.input_grads(vec![grad_outputs[0].mul(&local)?]))
    }
}
