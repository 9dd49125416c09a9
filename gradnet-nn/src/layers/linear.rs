use log::debug;
use rand::Rng;

use gradnet_core::autograd::{expect_arity, Context, Function, Returns, Variable};
use gradnet_core::value::ones;
use gradnet_core::{DType, GradnetError, Value};

use crate::init::{scaled_randn, zero_bias};
use crate::kernel::{expect_rank, expect_same_layout};

/// Applies a linear transformation to the incoming data: y = x·Wᵀ + b
///
/// `x` has shape `[batch, in_features]`, the weight `[out_features, in_features]`
/// and the optional bias `[out_features]`. Only `x` is a graph input: backward
/// returns its gradient and accumulates the gradients of trainable parameters
/// directly.
#[derive(Debug)]
pub struct Linear {
    weight: Variable,
    bias: Option<Variable>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Creates a new Linear layer.
    ///
    /// # Arguments
    ///
    /// * `in_features` - Size of each input sample.
    /// * `out_features` - Size of each output sample.
    /// * `has_bias` - If `true`, the layer will learn an additive bias.
    /// * `dtype` - Element type of the parameters.
    pub fn new(
        in_features: usize,
        out_features: usize,
        has_bias: bool,
        dtype: DType,
    ) -> Result<Self, GradnetError> {
        Self::with_rng(&mut rand::thread_rng(), in_features, out_features, has_bias, dtype)
    }

    /// Like [`Linear::new`], drawing the initial weight from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        rng: &mut R,
        in_features: usize,
        out_features: usize,
        has_bias: bool,
        dtype: DType,
    ) -> Result<Self, GradnetError> {
        let weight = scaled_randn(rng, &[out_features, in_features], in_features, dtype)?;
        let bias = if has_bias {
            Some(zero_bias(out_features, dtype)?)
        } else {
            None
        };
        debug!(
            "Linear: created {} -> {} (bias: {})",
            in_features, out_features, has_bias
        );
        Self::from_parameters(Variable::new(weight), bias.map(Variable::new))
    }

    /// Builds a layer around existing parameter variables.
    pub fn from_parameters(weight: Variable, bias: Option<Variable>) -> Result<Self, GradnetError> {
        let shape = weight.shape();
        if shape.len() != 2 {
            return Err(GradnetError::DimensionMismatch {
                expected: 2,
                actual: shape.len(),
                operation: "Linear weight".to_string(),
            });
        }
        let (out_features, in_features) = (shape[0], shape[1]);
        if let Some(bias) = &bias {
            if bias.shape() != [out_features] {
                return Err(GradnetError::ShapeMismatch {
                    expected: vec![out_features],
                    actual: bias.shape(),
                    operation: "Linear bias".to_string(),
                });
            }
        }
        Ok(Linear {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    pub fn weight(&self) -> &Variable {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Variable> {
        self.bias.as_ref()
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Function for Linear {
    fn name(&self) -> &'static str {
        "Linear"
    }

    fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 1)?;
        let x = &inputs[0];
        expect_rank(x, 2, "linear")?;
        if x.shape()[1] != self.in_features {
            return Err(GradnetError::ShapeMismatch {
                expected: vec![x.shape()[0], self.in_features],
                actual: x.shape().to_vec(),
                operation: "linear".to_string(),
            });
        }

        let weight = self.weight.data();
        let (dtype, device) = expect_same_layout(x, &weight, "linear")?;
        let mut y = x.matmul(&weight.transpose()?)?;
        if let Some(bias) = &self.bias {
            // [batch, 1] x [1, out] repeats the bias on every row.
            let column = ones(&[x.shape()[0], 1], dtype)?.to_device(device)?;
            let row = bias.data().reshape(vec![1, self.out_features])?;
            y = y.add(&column.matmul(&row)?)?;
        }

        ctx.save_for_backward(vec![x.clone(), weight]);
        Ok(y.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        expect_arity(self.name(), &grad_outputs, 1)?;
        let x = ctx.saved_value(0)?;
        let weight = ctx.saved_value(1)?;
        let gy = &grad_outputs[0];

        // Frozen parameters (train = false) collect no gradient.
        if self.weight.train() {
            self.weight.accumulate_grad(&gy.transpose()?.matmul(x)?)?;
        }
        if let Some(bias) = self.bias.as_ref().filter(|bias| bias.train()) {
            bias.accumulate_grad(&gy.sum_dim(0)?)?;
        }
        // A plain value input is not part of the graph; only the parameters learn.
        if !ctx.is_input(0) {
            return Ok(Vec::new());
        }
        Ok(vec![gy.matmul(weight)?])
    }

    fn parameters(&self) -> Vec<Variable> {
        let mut parameters = vec![self.weight.clone()];
        parameters.extend(self.bias.clone());
        parameters
    }
}

#[cfg(test)]
#[path = "linear_test.rs"]
mod tests;
