/*
 * @Author       : 老董
 * @Date         : 2026-09-04
 * @Description  : 激活函数：标量值与导数
 */

use serde::{Deserialize, Serialize};

/// 神经元（或卷积输出位置）使用的激活函数
///
/// 注：`Softmax`在单个神经元层面只透传logit（导数为1），
/// 对整个输出向量的归一化由[`OutputModifier::Softmax`]负责。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    None,
    #[serde(rename = "relu")]
    ReLu,
    LeakyRelu {
        limit: f32,
    },
    Sigmoid,
    Tanh,
    Swish,
    Softmax,
}

impl Activation {
    /// 默认斜率为0.01的LeakyReLU
    pub const fn leaky_relu() -> Self {
        Self::LeakyRelu { limit: 0.01 }
    }

    /// f(z)
    pub fn apply(&self, z: f32) -> f32 {
        match *self {
            Self::None | Self::Softmax => z,
            Self::ReLu => z.max(0.),
            Self::LeakyRelu { limit } => {
                if z > 0. {
                    z
                } else {
                    limit * z
                }
            }
            Self::Sigmoid => sigmoid(z),
            Self::Tanh => z.tanh(),
            Self::Swish => z * sigmoid(z),
        }
    }

    /// f'(z)
    pub fn derivative(&self, z: f32) -> f32 {
        match *self {
            Self::None | Self::Softmax => 1.,
            Self::ReLu => {
                if z > 0. {
                    1.
                } else {
                    0.
                }
            }
            Self::LeakyRelu { limit } => {
                if z > 0. {
                    1.
                } else {
                    limit
                }
            }
            Self::Sigmoid => {
                let s = sigmoid(z);
                s * (1. - s)
            }
            Self::Tanh => 1. - z.tanh().powi(2),
            Self::Swish => {
                let s = sigmoid(z);
                s + z * s * (1. - s)
            }
        }
    }
}

fn sigmoid(z: f32) -> f32 {
    1. / (1. + (-z).exp())
}

/// 作用于整个输出向量的修饰器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputModifier {
    Softmax,
}

impl OutputModifier {
    pub fn apply(&self, outputs: &[f32]) -> Vec<f32> {
        match self {
            Self::Softmax => softmax(outputs),
        }
    }
}

// 先减去最大值，避免exp溢出
fn softmax(outputs: &[f32]) -> Vec<f32> {
    let max = outputs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = outputs.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
