//! Small functions used by the autograd unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::autograd::function::{expect_arity, Function, Returns};
use crate::autograd::module::Context;
use crate::autograd::variable::Variable;
use crate::error::GradnetError;
use crate::value::Value;

/// y = x * x
#[derive(Debug, Default)]
pub(crate) struct Square;

impl Function for Square {
    fn name(&self) -> &'static str {
        "Square"
    }

    fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 1)?;
        let x = &inputs[0];
        ctx.save_for_backward(vec![x.clone()]);
        Ok(x.mul(x)?.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        let x = ctx.saved_value(0)?;
        Ok(vec![grad_outputs[0].mul(x)?.mul_scalar(2.0)?])
    }
}

/// y = a + b
#[derive(Debug, Default)]
pub(crate) struct Plus;

impl Function for Plus {
    fn name(&self) -> &'static str {
        "Plus"
    }

    fn forward(&self, _ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 2)?;
        Ok(inputs[0].add(&inputs[1])?.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        Ok(ctx.input_grads(vec![grad_outputs[0].clone(), grad_outputs[0].clone()]))
    }
}

/// Two outputs (x, 2x); counts how often its backward runs.
#[derive(Debug, Default)]
pub(crate) struct Fork {
    pub(crate) backward_calls: AtomicUsize,
}

impl Fork {
    pub(crate) fn calls(&self) -> usize {
        self.backward_calls.load(Ordering::SeqCst)
    }
}

impl Function for Fork {
    fn name(&self) -> &'static str {
        "Fork"
    }

    fn forward(&self, _ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 1)?;
        Ok(vec![inputs[0].clone(), inputs[0].mul_scalar(2.0)?].into())
    }

    fn backward(&self, _ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        self.backward_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![grad_outputs[0].add(&grad_outputs[1].mul_scalar(2.0)?)?])
    }
}

/// y = w * x with a parameter `w` of the same shape as `x`.
#[derive(Debug)]
pub(crate) struct Scale {
    pub(crate) weight: Variable,
}

impl Function for Scale {
    fn name(&self) -> &'static str {
        "Scale"
    }

    fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 1)?;
        let weight = self.weight.data();
        let y = inputs[0].mul(&weight)?;
        ctx.save_for_backward(vec![inputs[0].clone(), weight]);
        Ok(y.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        let x = ctx.saved_value(0)?;
        let weight = ctx.saved_value(1)?;
        self.weight.accumulate_grad(&grad_outputs[0].mul(x)?)?;
        Ok(vec![grad_outputs[0].mul(weight)?])
    }

    fn parameters(&self) -> Vec<Variable> {
        vec![self.weight.clone()]
    }
}

/// Returns one gradient too many.
#[derive(Debug, Default)]
pub(crate) struct Broken;

impl Function for Broken {
    fn forward(&self, _ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        Ok(inputs[0].clone().into())
    }

    fn backward(&self, _ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        Ok(vec![grad_outputs[0].clone(), grad_outputs[0].clone()])
    }
}
