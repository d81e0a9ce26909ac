/*
 * @Author       : 老董
 * @Date         : 2026-09-06
 * @LastEditors  : 老董
 * @LastEditTime : 2026-09-28 09:30:00
 * @Description  : 优化器核心实现
 *
 * 设计要点：
 * - 优化器只保存超参数与迭代计数，不保存任何参数的状态
 * - 每个参数的矩估计（`Moment`）由持有该参数的神经元/卷积层按位置保存
 * - `run()`在应用梯度时逐参数调用；`step()`在一个batch的梯度全部应用后调用一次
 */

use serde::{Deserialize, Serialize};

/// 单个参数的矩估计（一阶`m`、二阶`v`）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moment {
    pub m: f32,
    pub v: f32,
}

/// 优化器 trait
///
/// # 使用示例
/// ```ignore
/// let optimizer = Adam::default();
/// // 对每个参数
/// weight = optimizer.run(&mut moment, weight, gradient / batch_size as f32, learning_rate);
/// // batch 结束后
/// optimizer.step();
/// ```
pub trait Optimizer: Send + Sync {
    /// 推进内部迭代计数
    fn step(&mut self);

    /// 参数更新规则：给定当前值、梯度与学习率，返回新值
    fn run(&self, moment: &mut Moment, weight: f32, gradient: f32, learning_rate: f32) -> f32;

    /// 重置迭代计数
    fn reset(&mut self);

    /// 当前迭代计数
    fn iteration(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// SGD 优化器（可选动量）
///
/// - 无动量：θ = θ - α * ∇θ
/// - 带动量：m = μ * m + ∇θ，θ = θ - α * m
#[derive(Debug, Clone, Default)]
pub struct SGD {
    momentum: f32,
    t: usize,
}

impl SGD {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_momentum(momentum: f32) -> Self {
        Self { momentum, t: 0 }
    }
}

impl Optimizer for SGD {
    fn step(&mut self) {
        self.t += 1;
    }

    fn run(&self, moment: &mut Moment, weight: f32, gradient: f32, learning_rate: f32) -> f32 {
        if self.momentum == 0. {
            return weight - learning_rate * gradient;
        }
        moment.m = self.momentum * moment.m + gradient;
        weight - learning_rate * moment.m
    }

    fn reset(&mut self) {
        self.t = 0;
    }

    fn iteration(&self) -> usize {
        self.t
    }

    fn name(&self) -> &'static str {
        "SGD"
    }
}

/// RMSProp 优化器
///
/// - v = β * v + (1 - β) * g²
/// - θ = θ - α * g / (√v + ε)
#[derive(Debug, Clone)]
pub struct RMSProp {
    decay: f32,
    epsilon: f32,
    t: usize,
}

impl RMSProp {
    pub fn new(decay: f32, epsilon: f32) -> Self {
        Self {
            decay,
            epsilon,
            t: 0,
        }
    }
}

impl Default for RMSProp {
    fn default() -> Self {
        Self::new(0.9, 1e-8)
    }
}

impl Optimizer for RMSProp {
    fn step(&mut self) {
        self.t += 1;
    }

    fn run(&self, moment: &mut Moment, weight: f32, gradient: f32, learning_rate: f32) -> f32 {
        moment.v = self.decay * moment.v + (1. - self.decay) * gradient * gradient;
        weight - learning_rate * gradient / (moment.v.sqrt() + self.epsilon)
    }

    fn reset(&mut self) {
        self.t = 0;
    }

    fn iteration(&self) -> usize {
        self.t
    }

    fn name(&self) -> &'static str {
        "RMSProp"
    }
}

/// Adam 优化器
///
/// Adam: Adaptive Moment Estimation
/// - m = β1 * m + (1 - β1) * g
/// - v = β2 * v + (1 - β2) * g²
/// - θ = θ - α * `m_hat` / (√`v_hat` + ε)
///
/// 时间步`t`从1开始，每次`step()`加1
#[derive(Debug, Clone)]
pub struct Adam {
    /// β1 (一阶矩衰减)
    beta1: f32,
    /// β2 (二阶矩衰减)
    beta2: f32,
    /// 数值稳定项
    epsilon: f32,
    /// 时间步
    t: usize,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            beta1,
            beta2,
            epsilon,
            t: 1,
        }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn step(&mut self) {
        self.t += 1;
    }

    fn run(&self, moment: &mut Moment, weight: f32, gradient: f32, learning_rate: f32) -> f32 {
        moment.m = self.beta1 * moment.m + (1. - self.beta1) * gradient;
        moment.v = self.beta2 * moment.v + (1. - self.beta2) * gradient * gradient;

        // 偏差修正
        let m_hat = moment.m / (1. - self.beta1.powi(self.t as i32));
        let v_hat = moment.v / (1. - self.beta2.powi(self.t as i32));

        weight - learning_rate * m_hat / (v_hat.sqrt() + self.epsilon)
    }

    fn reset(&mut self) {
        self.t = 1;
    }

    fn iteration(&self) -> usize {
        self.t
    }

    fn name(&self) -> &'static str {
        "Adam"
    }
}

/// 优化器配置（可从JSON反序列化）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd {
        #[serde(default)]
        momentum: f32,
    },
    RmsProp {
        decay: f32,
        epsilon: f32,
    },
    Adam {
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Sgd { momentum: 0. }
    }
}

impl OptimizerConfig {
    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            Self::Sgd { momentum } => Box::new(SGD::with_momentum(momentum)),
            Self::RmsProp { decay, epsilon } => Box::new(RMSProp::new(decay, epsilon)),
            Self::Adam {
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::new(beta1, beta2, epsilon)),
        }
    }
}
