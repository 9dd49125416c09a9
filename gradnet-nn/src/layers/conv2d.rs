use log::debug;
use rand::Rng;

use gradnet_core::autograd::{expect_arity, Context, Function, Returns, Variable};
use gradnet_core::{DType, GradnetError, Value};

use crate::init::{scaled_randn, zero_bias};
use crate::kernel::{expect_rank, expect_same_layout};

/// Kernel geometry of a [`Conv2d`] layer, as `(height, width)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dConfig {
    pub kernel_size: (usize, usize),
    pub stride: (usize, usize),
    pub padding: (usize, usize),
}

impl Default for Conv2dConfig {
    fn default() -> Self {
        Conv2dConfig {
            kernel_size: (3, 3),
            stride: (1, 1),
            padding: (0, 0),
        }
    }
}

/// 2-D convolution over NCHW input with weight `[out, in, kh, kw]` and bias `[out]`.
///
/// The input is the only graph input; backward accumulates the weight and
/// bias gradients directly, skipping any parameter with `train = false`.
#[derive(Debug)]
pub struct Conv2d {
    weight: Variable,
    bias: Variable,
    in_channels: usize,
    out_channels: usize,
    config: Conv2dConfig,
}

// Sizes of one convolution, resolved from the input shape.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    batch: usize,
    in_channels: usize,
    out_channels: usize,
    height: usize,
    width: usize,
    kernel: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
    out_height: usize,
    out_width: usize,
}

impl Geometry {
    fn input_index(&self, n: usize, c: usize, y: usize, x: usize) -> usize {
        ((n * self.in_channels + c) * self.height + y) * self.width + x
    }

    fn weight_index(&self, o: usize, c: usize, ky: usize, kx: usize) -> usize {
        ((o * self.in_channels + c) * self.kernel.0 + ky) * self.kernel.1 + kx
    }

    fn output_index(&self, n: usize, o: usize, y: usize, x: usize) -> usize {
        ((n * self.out_channels + o) * self.out_height + y) * self.out_width + x
    }

    /// Input coordinate read by output `(oy, ox)` at kernel tap `(ky, kx)`,
    /// or `None` when it falls into the padding.
    fn source(&self, oy: usize, ox: usize, ky: usize, kx: usize) -> Option<(usize, usize)> {
        let y = (oy * self.stride.0 + ky).checked_sub(self.padding.0)?;
        let x = (ox * self.stride.1 + kx).checked_sub(self.padding.1)?;
        if y < self.height && x < self.width {
            Some((y, x))
        } else {
            None
        }
    }

    fn output_shape(&self) -> Vec<usize> {
        vec![self.batch, self.out_channels, self.out_height, self.out_width]
    }
}

impl Conv2d {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        config: Conv2dConfig,
        dtype: DType,
    ) -> Result<Self, GradnetError> {
        Self::with_rng(&mut rand::thread_rng(), in_channels, out_channels, config, dtype)
    }

    /// Like [`Conv2d::new`], drawing the initial weight from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        rng: &mut R,
        in_channels: usize,
        out_channels: usize,
        config: Conv2dConfig,
        dtype: DType,
    ) -> Result<Self, GradnetError> {
        let (kh, kw) = config.kernel_size;
        if kh == 0 || kw == 0 || config.stride.0 == 0 || config.stride.1 == 0 {
            return Err(GradnetError::InvalidArgument(format!(
                "Conv2d needs a positive kernel size and stride, got {:?}",
                config
            )));
        }
        let fan_in = in_channels * kh * kw;
        let weight = scaled_randn(rng, &[out_channels, in_channels, kh, kw], fan_in, dtype)?;
        let bias = zero_bias(out_channels, dtype)?;
        debug!(
            "Conv2d: created {} -> {} channels, {:?}",
            in_channels, out_channels, config
        );
        Ok(Conv2d {
            weight: Variable::new(weight),
            bias: Variable::new(bias),
            in_channels,
            out_channels,
            config,
        })
    }

    pub fn weight(&self) -> &Variable {
        &self.weight
    }

    pub fn bias(&self) -> &Variable {
        &self.bias
    }

    pub fn config(&self) -> &Conv2dConfig {
        &self.config
    }

    fn geometry(&self, x: &Value) -> Result<Geometry, GradnetError> {
        expect_rank(x, 4, "conv2d")?;
        let shape = x.shape();
        if shape[1] != self.in_channels {
            return Err(GradnetError::ShapeMismatch {
                expected: vec![shape[0], self.in_channels, shape[2], shape[3]],
                actual: shape.to_vec(),
                operation: "conv2d".to_string(),
            });
        }
        let Conv2dConfig {
            kernel_size,
            stride,
            padding,
        } = self.config;
        let padded = (shape[2] + 2 * padding.0, shape[3] + 2 * padding.1);
        if padded.0 < kernel_size.0 || padded.1 < kernel_size.1 {
            return Err(GradnetError::InvalidArgument(format!(
                "conv2d kernel {:?} larger than padded input {:?}",
                kernel_size, padded
            )));
        }
        Ok(Geometry {
            batch: shape[0],
            in_channels: self.in_channels,
            out_channels: self.out_channels,
            height: shape[2],
            width: shape[3],
            kernel: kernel_size,
            stride,
            padding,
            out_height: (padded.0 - kernel_size.0) / stride.0 + 1,
            out_width: (padded.1 - kernel_size.1) / stride.1 + 1,
        })
    }
}

fn convolve(x: &[f64], weight: &[f64], bias: &[f64], g: &Geometry) -> Vec<f64> {
    let mut out = vec![0.0; g.batch * g.out_channels * g.out_height * g.out_width];
    for n in 0..g.batch {
        for o in 0..g.out_channels {
            for oy in 0..g.out_height {
                for ox in 0..g.out_width {
                    let mut acc = bias[o];
                    for c in 0..g.in_channels {
                        for ky in 0..g.kernel.0 {
                            for kx in 0..g.kernel.1 {
                                if let Some((y, xx)) = g.source(oy, ox, ky, kx) {
                                    acc += x[g.input_index(n, c, y, xx)]
                                        * weight[g.weight_index(o, c, ky, kx)];
                                }
                            }
                        }
                    }
                    out[g.output_index(n, o, oy, ox)] = acc;
                }
            }
        }
    }
    out
}

struct ConvGrads {
    input: Vec<f64>,
    weight: Vec<f64>,
    bias: Vec<f64>,
}

fn convolve_backward(gy: &[f64], x: &[f64], weight: &[f64], g: &Geometry) -> ConvGrads {
    let mut grads = ConvGrads {
        input: vec![0.0; x.len()],
        weight: vec![0.0; weight.len()],
        bias: vec![0.0; g.out_channels],
    };
    for n in 0..g.batch {
        for o in 0..g.out_channels {
            for oy in 0..g.out_height {
                for ox in 0..g.out_width {
                    let upstream = gy[g.output_index(n, o, oy, ox)];
                    grads.bias[o] += upstream;
                    for c in 0..g.in_channels {
                        for ky in 0..g.kernel.0 {
                            for kx in 0..g.kernel.1 {
                                if let Some((y, xx)) = g.source(oy, ox, ky, kx) {
                                    let xi = g.input_index(n, c, y, xx);
                                    let wi = g.weight_index(o, c, ky, kx);
                                    grads.weight[wi] += upstream * x[xi];
                                    grads.input[xi] += upstream * weight[wi];
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    grads
}

impl Function for Conv2d {
    fn name(&self) -> &'static str {
        "Conv2d"
    }

    fn forward(&self, ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 1)?;
        let x = &inputs[0];
        let geometry = self.geometry(x)?;
        let weight = self.weight.data();
        let bias = self.bias.data();
        let (dtype, device) = expect_same_layout(x, &weight, "conv2d")?;
        expect_same_layout(x, &bias, "conv2d")?;

        let out = convolve(
            &x.to_vec_f64()?,
            &weight.to_vec_f64()?,
            &bias.to_vec_f64()?,
            &geometry,
        );
        let y = Value::from_f64_on(out, geometry.output_shape(), dtype, device)?;
        ctx.save_for_backward(vec![x.clone(), weight]);
        Ok(y.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        expect_arity(self.name(), &grad_outputs, 1)?;
        let x = ctx.saved_value(0)?;
        let weight = ctx.saved_value(1)?;
        let gy = &grad_outputs[0];
        let geometry = self.geometry(x)?;
        if gy.shape() != geometry.output_shape().as_slice() {
            return Err(GradnetError::ShapeMismatch {
                expected: geometry.output_shape(),
                actual: gy.shape().to_vec(),
                operation: "conv2d_backward".to_string(),
            });
        }
        let (dtype, device) = expect_same_layout(gy, x, "conv2d_backward")?;

        let grads = convolve_backward(
            &gy.to_vec_f64()?,
            &x.to_vec_f64()?,
            &weight.to_vec_f64()?,
            &geometry,
        );
        if self.weight.train() {
            let grad_weight = Value::from_f64_on(grads.weight, weight.shape().to_vec(), dtype, device)?;
            self.weight.accumulate_grad(&grad_weight)?;
        }
        if self.bias.train() {
            let grad_bias = Value::from_f64_on(grads.bias, vec![self.out_channels], dtype, device)?;
            self.bias.accumulate_grad(&grad_bias)?;
        }
        if !ctx.is_input(0) {
            return Ok(Vec::new());
        }
        Ok(vec![Value::from_f64_on(grads.input, x.shape().to_vec(), dtype, device)?])
    }

    fn parameters(&self) -> Vec<Variable> {
        vec![self.weight.clone(), self.bias.clone()]
    }
}

#[cfg(test)]
#[path = "conv2d_test.rs"]
mod tests;
