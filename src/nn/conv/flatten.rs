/*
 * @Author       : 老董
 * @Date         : 2026-09-24
 * @Description  : 展平：三维张量与一维向量之间按(depth,row,col)顺序互转
 */

use crate::errors::{NeuronError, NeuronResult};
use crate::tensor::{Tensor, TensorSize};

/// 三维张量与一维向量之间的无状态双向变形（按深度、行、列的顺序展开）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flatten {
    input_size: TensorSize,
}

impl Flatten {
    pub const fn new(input_size: TensorSize) -> Self {
        Self { input_size }
    }

    pub const fn input_size(&self) -> TensorSize {
        self.input_size
    }

    pub const fn output_len(&self) -> usize {
        self.input_size.len()
    }

    pub fn flatten(&self, input: &Tensor) -> NeuronResult<Vec<f32>> {
        if input.size() != self.input_size {
            return Err(NeuronError::ShapeMismatch {
                expected: self.input_size.to_vec(),
                got: input.size().to_vec(),
                message: "展平的输入张量形状不符".to_string(),
            });
        }
        Ok(input.to_vec())
    }

    /// 反向：把一维delta还原为输入张量的形状
    pub fn unflatten(&self, deltas: &[f32]) -> NeuronResult<Tensor> {
        Tensor::from_vec(deltas.to_vec(), self.input_size)
    }
}
