/*
 * @Author       : 老董
 * @Date         : 2026-09-08
 * @Description  : 层规格：构造各类Lobe时使用的描述对象
 */

use serde::{Deserialize, Serialize};

use super::Activation;
use crate::tensor::TensorSize;

/// 层在网络中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    Input,
    Hidden,
    Output,
}

/// 全连接层规格：节点数、激活函数、偏置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LobeModel {
    pub nodes: usize,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub bias: f32,
}

impl LobeModel {
    pub const fn new(nodes: usize, activation: Activation, bias: f32) -> Self {
        Self {
            nodes,
            activation,
            bias,
        }
    }
}

/// 带归一化的全连接层规格（归一化层不需要偏置）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLobeModel {
    pub nodes: usize,
    #[serde(default)]
    pub activation: Activation,
    pub momentum: f32,
    pub normalizer_learning_rate: f32,
}

impl NormalizedLobeModel {
    pub const fn new(
        nodes: usize,
        activation: Activation,
        momentum: f32,
        normalizer_learning_rate: f32,
    ) -> Self {
        Self {
            nodes,
            activation,
            momentum,
            normalizer_learning_rate,
        }
    }
}

/// 卷积层规格
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvolutionalLobeModel {
    pub input_size: TensorSize,
    pub activation: Activation,
    pub bias: f32,
    /// 卷积核尺寸，其深度必须等于输入深度
    pub filter_size: TensorSize,
    pub filter_count: usize,
}

impl ConvolutionalLobeModel {
    pub const fn new(
        input_size: TensorSize,
        activation: Activation,
        bias: f32,
        filter_size: TensorSize,
        filter_count: usize,
    ) -> Self {
        Self {
            input_size,
            activation,
            bias,
            filter_size,
            filter_count,
        }
    }
}

/// 池化层规格
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolingLobeModel {
    pub input_size: TensorSize,
}

impl PoolingLobeModel {
    pub const fn new(input_size: TensorSize) -> Self {
        Self { input_size }
    }
}
