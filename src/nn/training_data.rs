/*
 * @Author       : 老董
 * @Date         : 2026-09-08
 * @Description  : 训练样本
 */

use serde::{Deserialize, Serialize};

use crate::tensor::Tensor;

/// 全连接网络的一条样本：输入向量与期望输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingData {
    pub data: Vec<f32>,
    pub correct: Vec<f32>,
}

impl TrainingData {
    pub fn new(data: Vec<f32>, correct: Vec<f32>) -> Self {
        Self { data, correct }
    }
}

/// 卷积网络的一条样本：三维张量输入与标签
#[derive(Debug, Clone, PartialEq)]
pub struct ConvTrainingData {
    pub data: Tensor,
    pub label: Vec<f32>,
}

impl ConvTrainingData {
    pub fn new(data: Tensor, label: Vec<f32>) -> Self {
        Self { data, label }
    }
}
