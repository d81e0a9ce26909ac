/*
 * @Author       : 老董
 * @Date         : 2026-09-04
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-14 15:40:00
 * @Description  : 损失函数：标量损失值与对输出的导数
 */

use serde::{Deserialize, Serialize};

// 防止ln(0)
const LOG_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFunction {
    #[default]
    MeanSquareError,
    /// 配合softmax输出使用
    CrossEntropy,
    /// 配合sigmoid输出使用
    BinaryCrossEntropy,
}

impl LossFunction {
    /// 计算整个输出向量的损失
    pub fn calculate(&self, predicted: &[f32], correct: &[f32]) -> f32 {
        if predicted.is_empty() {
            return 0.;
        }
        let pairs = predicted.iter().zip(correct);
        match self {
            Self::MeanSquareError => {
                pairs.map(|(p, c)| (p - c).powi(2)).sum::<f32>() / predicted.len() as f32
            }
            Self::CrossEntropy => -pairs
                .map(|(p, c)| c * p.max(LOG_EPSILON).ln())
                .sum::<f32>(),
            Self::BinaryCrossEntropy => {
                -pairs
                    .map(|(p, c)| {
                        let p = p.clamp(LOG_EPSILON, 1. - LOG_EPSILON);
                        c * p.ln() + (1. - c) * (1. - p).ln()
                    })
                    .sum::<f32>()
                    / predicted.len() as f32
            }
        }
    }

    /// 损失对每个输出的梯度，与`calculate`的归一化方式一致：
    /// - 均方误差：2(p - c) / n，对激活值求导，还需乘以输出神经元的激活导数
    /// - 交叉熵：p - c，对logit求导（已包含softmax的导数）
    /// - 二元交叉熵：(p - c) / n，对logit求导（已包含sigmoid的导数）
    pub fn gradient(&self, predicted: &[f32], correct: &[f32]) -> Vec<f32> {
        let n = predicted.len().max(1) as f32;
        let scale = match self {
            Self::MeanSquareError => 2. / n,
            Self::CrossEntropy => 1.,
            Self::BinaryCrossEntropy => 1. / n,
        };
        predicted
            .iter()
            .zip(correct)
            .map(|(p, c)| scale * (p - c))
            .collect()
    }

    /// 导数是否已经融合了输出层激活函数的导数
    pub const fn fuses_output_activation(&self) -> bool {
        matches!(self, Self::CrossEntropy | Self::BinaryCrossEntropy)
    }
}
