/*
 * @Author       : 老董
 * @Date         : 2026-09-24
 * @Description  : 2×2、步长2的最大池化
 *
 * 前向同时返回每个池化窗口内最大值的坐标（`PoolingIndices`），反向据此把delta只路由到该坐标。
 * 窗口内的比较顺序为(r, c)、(r+1, c)、(r, c+1)、(r+1, c+1)，并列时取最先出现者。
 */

use tracing::debug;

use super::TensorLobe;
use crate::errors::{NeuronError, NeuronResult};
use crate::nn::optimizer::Optimizer;
use crate::nn::{Initializer, PoolingLobeModel};
use crate::tensor::{Tensor, TensorSize};

/// 一次前向中每个池化窗口的最大值坐标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolingIndices {
    input_size: TensorSize,
    /// 按深度分组，组内按输出位置的行优先顺序排列的`(row, column)`
    maxima: Vec<Vec<(usize, usize)>>,
}

impl PoolingIndices {
    pub const fn input_size(&self) -> TensorSize {
        self.input_size
    }

    pub fn maxima(&self, depth: usize) -> &[(usize, usize)] {
        self.maxima.get(depth).map(Vec::as_slice).unwrap_or(&[])
    }
}

const fn pooled_size(input_size: TensorSize) -> TensorSize {
    TensorSize::new(input_size.rows / 2, input_size.columns / 2, input_size.depth)
}

/// 最大池化：输出尺寸为每个空间维度的floor(n/2)，深度不变
pub fn pool(input: &Tensor) -> (Tensor, PoolingIndices) {
    let input_size = input.size();
    let out_size = pooled_size(input_size);
    let mut output = Tensor::zeros(out_size);
    let mut maxima = Vec::with_capacity(out_size.depth);

    for d in 0..out_size.depth {
        let mut depth_maxima = Vec::with_capacity(out_size.rows * out_size.columns);
        for or in 0..out_size.rows {
            for oc in 0..out_size.columns {
                let (r, c) = (or * 2, oc * 2);
                let mut max_val = f32::NEG_INFINITY;
                let mut max_pos = (r, c);
                for (ir, ic) in [(r, c), (r + 1, c), (r, c + 1), (r + 1, c + 1)] {
                    let val = input[[d, ir, ic]];
                    if val > max_val {
                        max_val = val;
                        max_pos = (ir, ic);
                    }
                }
                output[[d, or, oc]] = max_val;
                depth_maxima.push(max_pos);
            }
        }
        maxima.push(depth_maxima);
    }

    (output, PoolingIndices { input_size, maxima })
}

/// 把delta路由回各窗口的最大值坐标，其余位置为0；
/// `indices`中缺失（或与delta对不上）的窗口得到0梯度
pub fn unpool(deltas: &Tensor, indices: &PoolingIndices) -> Tensor {
    let mut gradients = Tensor::zeros(indices.input_size);
    let delta_size = deltas.size();
    for d in 0..delta_size.depth {
        for (window, &(r, c)) in indices.maxima(d).iter().enumerate() {
            if delta_size.columns == 0 {
                break;
            }
            let (or, oc) = (window / delta_size.columns, window % delta_size.columns);
            if or >= delta_size.rows
                || r >= indices.input_size.rows
                || c >= indices.input_size.columns
                || d >= indices.input_size.depth
            {
                continue;
            }
            gradients[[d, r, c]] += deltas[[d, or, oc]];
        }
    }
    gradients
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolingLobe {
    input_size: TensorSize,
    /// 最近一次训练前向的最大值坐标，只被下一次反向消费一次
    pending: Option<PoolingIndices>,
}

impl PoolingLobe {
    pub const fn new(model: PoolingLobeModel) -> Self {
        Self {
            input_size: model.input_size,
            pending: None,
        }
    }

    pub fn has_pending_indices(&self) -> bool {
        self.pending.is_some()
    }
}

impl TensorLobe for PoolingLobe {
    fn feed(&mut self, input: &Tensor, training: bool) -> NeuronResult<Tensor> {
        if input.size() != self.input_size {
            return Err(NeuronError::ShapeMismatch {
                expected: self.input_size.to_vec(),
                got: input.size().to_vec(),
                message: "池化层的输入形状不符".to_string(),
            });
        }
        let (output, indices) = pool(input);
        self.pending = training.then_some(indices);
        Ok(output)
    }

    fn calculate_gradients(&mut self, deltas: &Tensor) -> NeuronResult<Tensor> {
        if deltas.size() != self.output_size() {
            return Err(NeuronError::ShapeMismatch {
                expected: self.output_size().to_vec(),
                got: deltas.size().to_vec(),
                message: "池化层收到的delta形状不符".to_string(),
            });
        }
        match self.pending.take() {
            Some(indices) => Ok(unpool(deltas, &indices)),
            None => {
                debug!("池化层没有可用的最大值坐标，梯度为0");
                Ok(Tensor::zeros(self.input_size))
            }
        }
    }

    // 池化层没有可学习参数
    fn adjust_weights(&mut self, _batch_size: usize, _optimizer: &dyn Optimizer) {}

    fn zero_gradients(&mut self) {}

    fn clear(&mut self, _initializer: &mut Initializer) {
        self.pending = None;
    }

    fn input_size(&self) -> TensorSize {
        self.input_size
    }

    fn output_size(&self) -> TensorSize {
        pooled_size(self.input_size)
    }
}
