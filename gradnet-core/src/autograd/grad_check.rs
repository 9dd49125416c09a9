use log::debug;
use thiserror::Error;

use crate::autograd::variable::Variable;
use crate::error::GradnetError;
use crate::value::{allclose, Value};

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input {input_index}: analytic {analytic:?} != numeric {numeric:?}")]
    GradientMismatch {
        input_index: usize,
        analytic: Vec<f64>,
        numeric: Vec<f64>,
    },

    #[error("Input {input_index} has no gradient after the backward pass")]
    MissingGradient { input_index: usize },

    #[error("Function returned {actual} outputs but {expected} output gradients were given")]
    OutputCountMismatch { expected: usize, actual: usize },

    #[error("Forward function execution failed during gradient check: {0}")]
    Forward(GradnetError),

    #[error("Backward pass execution failed during gradient check: {0}")]
    Backward(GradnetError),

    #[error("Value error during intermediate calculation: {0}")]
    Value(#[from] GradnetError),
}

/// Step size and tolerances of a gradient check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradCheckConfig {
    /// Half-width of the central difference.
    pub eps: f64,
    pub rtol: f64,
    pub atol: f64,
    /// Number of leading elements shown when reporting a mismatch.
    pub max_view: usize,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        GradCheckConfig {
            eps: 1e-3,
            rtol: 1e-3,
            atol: 1e-5,
            max_view: 20,
        }
    }
}

impl GradCheckConfig {
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    pub fn with_max_view(mut self, max_view: usize) -> Self {
        self.max_view = max_view;
        self
    }
}

/// Finite-difference gradient of `Σ_m Σ grad_outputs[m] * func(inputs)[m]`
/// with respect to every element of every input.
///
/// Each evaluation runs `func` on fresh leaf variables; the given `inputs`
/// are never modified.
pub fn numeric_grad<F>(
    func: &F,
    inputs: &[Variable],
    grad_outputs: &[Value],
    eps: f64,
) -> Result<Vec<Value>, GradCheckError>
where
    F: Fn(&[Variable]) -> Result<Vec<Variable>, GradnetError>,
{
    let mut numeric = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let data = input.data();
        let (dtype, device) = match (data.dtype(), data.device()) {
            (Some(dtype), Some(device)) => (dtype, device),
            _ => {
                return Err(GradCheckError::Value(GradnetError::EmptyValue {
                    operation: "numeric_grad".to_string(),
                }))
            }
        };
        let origin = data.to_vec_f64()?;
        let mut grad = vec![0.0; origin.len()];

        for (element, slot) in grad.iter_mut().enumerate() {
            // Perturb in the input's own precision so the step used in the
            // quotient is the one the function actually saw.
            let upper = dtype.round(origin[element] + eps);
            let lower = dtype.round(origin[element] - eps);
            if upper == lower {
                return Err(GradCheckError::Value(GradnetError::InvalidArgument(format!(
                    "eps {} vanishes at {} in {:?} precision (input {}, element {})",
                    eps, origin[element], dtype, index, element
                ))));
            }

            let mut shifted = origin.clone();
            shifted[element] = upper;
            let upper_value = Value::from_f64_on(shifted.clone(), data.shape().to_vec(), dtype, device)?;
            shifted[element] = lower;
            let lower_value = Value::from_f64_on(shifted, data.shape().to_vec(), dtype, device)?;

            let plus = evaluate(func, inputs, index, upper_value)?;
            let minus = evaluate(func, inputs, index, lower_value)?;
            if plus.len() != grad_outputs.len() {
                return Err(GradCheckError::OutputCountMismatch {
                    expected: grad_outputs.len(),
                    actual: plus.len(),
                });
            }

            let mut total = 0.0;
            for ((hi, lo), weight) in plus.iter().zip(minus.iter()).zip(grad_outputs) {
                let diff = hi.data().sub(&lo.data())?;
                total += weight.mul(&diff)?.sum()?.item()?;
            }
            *slot = total / (upper - lower);
        }

        numeric.push(Value::from_f64_on(grad, data.shape().to_vec(), dtype, device)?);
        debug!("numeric_grad: input {} done ({} elements)", index, origin.len());
    }
    Ok(numeric)
}

/// Runs `func` with input `index` replaced by a fresh leaf holding `value`.
fn evaluate<F>(
    func: &F,
    inputs: &[Variable],
    index: usize,
    value: Value,
) -> Result<Vec<Variable>, GradCheckError>
where
    F: Fn(&[Variable]) -> Result<Vec<Variable>, GradnetError>,
{
    let mut arguments = inputs.to_vec();
    arguments[index] = Variable::with_train(value, inputs[index].train());
    func(&arguments).map_err(GradCheckError::Forward)
}

/// Compares the engine's gradients of `func` at `inputs` with finite differences.
///
/// Every output `m` of `func` is seeded with `grad_outputs[m]`. Gradients
/// already stored on `inputs` are cleared first; afterwards they hold the
/// analytic gradients of this check.
pub fn check_grad<F>(
    func: F,
    inputs: &[Variable],
    grad_outputs: &[Value],
    config: &GradCheckConfig,
) -> Result<(), GradCheckError>
where
    F: Fn(&[Variable]) -> Result<Vec<Variable>, GradnetError>,
{
    let numeric = numeric_grad(&func, inputs, grad_outputs, config.eps)?;

    let outputs = func(inputs).map_err(GradCheckError::Forward)?;
    if outputs.len() != grad_outputs.len() {
        return Err(GradCheckError::OutputCountMismatch {
            expected: grad_outputs.len(),
            actual: outputs.len(),
        });
    }
    for input in inputs {
        input.clear_grads();
    }
    for (output, grad) in outputs.iter().zip(grad_outputs) {
        output
            .backward(grad.clone())
            .map_err(GradCheckError::Backward)?;
    }

    for (index, (input, expected)) in inputs.iter().zip(numeric.iter()).enumerate() {
        let analytic = input.grad();
        if analytic.is_empty() {
            return Err(GradCheckError::MissingGradient { input_index: index });
        }
        if !allclose(&analytic, expected, config.rtol, config.atol)? {
            return Err(GradCheckError::GradientMismatch {
                input_index: index,
                analytic: analytic.limit_view(config.max_view)?,
                numeric: expected.limit_view(config.max_view)?,
            });
        }
        debug!("check_grad: input {} matches", index);
    }
    Ok(())
}

#[cfg(test)]
#[path = "grad_check_test.rs"]
mod tests;
