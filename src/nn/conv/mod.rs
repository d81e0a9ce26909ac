/*
 * @Author       : 老董
 * @Date         : 2026-09-22
 * @Description  : 卷积网络的张量层：卷积、最大池化、展平，以及组合它们的ConvBrain
 *
 * 卷积层与池化层组成一个封闭的变体集合，统一实现`TensorLobe`（前向、求梯度、更新、清零、重置）。
 * 展平与全连接部分不属于该集合，由`ConvBrain`显式串联。
 */

mod conv_brain;
mod convolutional;
mod flatten;
mod pooling;

use enum_dispatch::enum_dispatch;

pub use conv_brain::ConvBrain;
pub use convolutional::ConvolutionalLobe;
pub use flatten::Flatten;
pub use pooling::{PoolingIndices, PoolingLobe, pool, unpool};

use super::Initializer;
use super::optimizer::Optimizer;
use crate::errors::NeuronResult;
use crate::tensor::{Tensor, TensorSize};

#[enum_dispatch]
pub trait TensorLobe {
    /// 前向；`training`为true时缓存反向传播所需的状态
    fn feed(&mut self, input: &Tensor, training: bool) -> NeuronResult<Tensor>;

    /// 根据对本层输出的梯度累积本层参数的梯度，并返回对本层输入的梯度
    fn calculate_gradients(&mut self, deltas: &Tensor) -> NeuronResult<Tensor>;

    fn adjust_weights(&mut self, batch_size: usize, optimizer: &dyn Optimizer);

    fn zero_gradients(&mut self);

    fn clear(&mut self, initializer: &mut Initializer);

    fn input_size(&self) -> TensorSize;

    fn output_size(&self) -> TensorSize;
}

#[enum_dispatch(TensorLobe)]
#[derive(Debug, Clone)]
pub enum ConvolutionalSupportedLobe {
    Convolutional(ConvolutionalLobe),
    Pooling(PoolingLobe),
}
