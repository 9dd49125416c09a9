use gradnet_core::autograd::{expect_arity, Context, Function, Returns};
use gradnet_core::{GradnetError, Value};

/// y = a + b for two same-shaped inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Add;

impl Function for Add {
    fn name(&self) -> &'static str {
        "Add"
    }

    fn forward(&self, _ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 2)?;
        Ok(inputs[0].add(&inputs[1])?.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        expect_arity(self.name(), &grad_outputs, 1)?;
        Ok(ctx.input_grads(vec![grad_outputs[0].clone(), grad_outputs[0].clone()]))
    }
}
