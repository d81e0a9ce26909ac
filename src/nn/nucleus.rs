/*
 * @Author       : 老董
 * @Date         : 2026-09-08
 * @Description  : Nucleus：全网共享的超参数（学习率、偏置、激活函数）
 */

use serde::{Deserialize, Serialize};

use super::Activation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nucleus {
    pub learning_rate: f32,
    pub bias: f32,
    pub activation: Activation,
}

impl Nucleus {
    pub const fn new(learning_rate: f32, bias: f32, activation: Activation) -> Self {
        Self {
            learning_rate,
            bias,
            activation,
        }
    }
}

impl Default for Nucleus {
    fn default() -> Self {
        Self::new(0.1, 0.1, Activation::ReLu)
    }
}
