use gradnet_core::autograd::{expect_arity, Context, Function, Returns};
use gradnet_core::{GradnetError, Value};

use crate::kernel::layout;

/// Splits dimension 0 into `chunks` equal parts, one output per part.
///
/// Backward concatenates the chunk gradients back along dimension 0, so it
/// only runs once every chunk has received a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub chunks: usize,
}

impl Split {
    pub fn new(chunks: usize) -> Self {
        Split { chunks }
    }
}

impl Function for Split {
    fn name(&self) -> &'static str {
        "Split"
    }

    fn forward(&self, _ctx: &mut Context, inputs: Vec<Value>) -> Result<Returns, GradnetError> {
        expect_arity(self.name(), &inputs, 1)?;
        let x = &inputs[0];
        let (dtype, device) = layout(x, "split")?;
        let shape = x.shape();
        if shape.is_empty() || self.chunks == 0 || shape[0] % self.chunks != 0 {
            return Err(GradnetError::InvalidArgument(format!(
                "cannot split shape {:?} into {} equal chunks along dimension 0",
                shape, self.chunks
            )));
        }

        let mut chunk_shape = shape.to_vec();
        chunk_shape[0] /= self.chunks;
        let chunk_len: usize = chunk_shape.iter().product();

        let data = x.to_vec_f64()?;
        let outputs = (0..self.chunks)
            .map(|i| {
                let chunk = data[i * chunk_len..(i + 1) * chunk_len].to_vec();
                Value::from_f64_on(chunk, chunk_shape.clone(), dtype, device)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(outputs.into())
    }

    fn backward(&self, ctx: &Context, grad_outputs: Vec<Value>) -> Result<Vec<Value>, GradnetError> {
        expect_arity(self.name(), &grad_outputs, self.chunks)?;
        let (dtype, device) = layout(&grad_outputs[0], "split_backward")?;

        let mut shape = grad_outputs[0].shape().to_vec();
        let mut data = Vec::new();
        for grad in &grad_outputs {
            data.extend(grad.to_vec_f64()?);
        }
        shape[0] *= self.chunks;
        Ok(ctx.input_grads(vec![Value::from_f64_on(data, shape, dtype, device)?]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradnet_core::autograd::{Module, Variable};
    use gradnet_core::utils::testing::check_value_near;

    #[test]
    fn test_split_forward_shapes() {
        let x = Variable::new(Value::from_vec_f64((0..6).map(f64::from).collect(), vec![3, 2]).unwrap());
        let split = Module::new(Split::new(3));
        let parts = split.apply([&x]).unwrap().into_vec();

        assert_eq!(parts.len(), 3);
        check_value_near(&parts[0].data(), &[1, 2], &[0.0, 1.0], 1e-12);
        check_value_near(&parts[2].data(), &[1, 2], &[4.0, 5.0], 1e-12);
    }

    #[test]
    fn test_split_rejects_uneven_chunks() {
        let x = Variable::new(Value::from_vec_f64(vec![1.0; 5], vec![5]).unwrap());
        let split = Module::new(Split::new(2));
        assert!(matches!(
            split.apply([&x]),
            Err(GradnetError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_split_backward_waits_for_every_chunk() {
        let x = Variable::new(Value::from_vec_f64(vec![1.0, 2.0, 3.0, 4.0], vec![4]).unwrap());
        let split = Module::new(Split::new(2));
        let parts = split.apply([&x]).unwrap().into_vec();

        parts[1]
            .backward(Value::from_vec_f64(vec![30.0, 40.0], vec![2]).unwrap())
            .unwrap();
        assert!(x.grad().is_empty());

        parts[0]
            .backward(Value::from_vec_f64(vec![10.0, 20.0], vec![2]).unwrap())
            .unwrap();
        check_value_near(&x.grad(), &[4], &[10.0, 20.0, 30.0, 40.0], 1e-12);
    }
}
