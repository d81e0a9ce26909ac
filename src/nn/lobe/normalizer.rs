/*
 * @Author       : 老董
 * @Date         : 2026-09-13
 * @LastEditors  : 老董
 * @LastEditTime : 2026-09-20 17:10:00
 * @Description  : BatchNormalizer：对一层神经元的加权和做归一化，再做可学习的缩放与平移
 *
 * 训练时：以当前样本在该层所有神经元上的均值/方差做归一化，并以动量更新滑动均值/方差；
 * 推理时：使用滑动均值/方差。
 */

#[derive(Debug, Clone, PartialEq)]
pub struct BatchNormalizer {
    gamma: Vec<f32>,
    beta: Vec<f32>,
    running_mean: f32,
    running_variance: f32,
    momentum: f32,
    learning_rate: f32,
    epsilon: f32,
    /// 最近一次训练前向的归一化值x̂及1/√(σ²+ε)
    cache: Option<(Vec<f32>, f32)>,
    gamma_gradients: Vec<f32>,
    beta_gradients: Vec<f32>,
}

impl BatchNormalizer {
    pub fn new(size: usize, momentum: f32, learning_rate: f32) -> Self {
        Self {
            gamma: vec![1.; size],
            beta: vec![0.; size],
            running_mean: 0.,
            running_variance: 1.,
            momentum,
            learning_rate,
            epsilon: 1e-5,
            cache: None,
            gamma_gradients: vec![0.; size],
            beta_gradients: vec![0.; size],
        }
    }

    pub fn gamma(&self) -> &[f32] {
        &self.gamma
    }

    pub fn beta(&self) -> &[f32] {
        &self.beta
    }

    pub const fn running_mean(&self) -> f32 {
        self.running_mean
    }

    pub const fn running_variance(&self) -> f32 {
        self.running_variance
    }

    /// y_i = γ_i * x̂_i + β_i
    pub fn normalize(&mut self, values: &[f32], training: bool) -> Vec<f32> {
        if values.is_empty() {
            return Vec::new();
        }
        let (mean, variance) = if training {
            let n = values.len() as f32;
            let mean = values.iter().sum::<f32>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
            self.running_mean = self.momentum * self.running_mean + (1. - self.momentum) * mean;
            self.running_variance =
                self.momentum * self.running_variance + (1. - self.momentum) * variance;
            (mean, variance)
        } else {
            (self.running_mean, self.running_variance)
        };

        let inv_std = 1. / (variance + self.epsilon).sqrt();
        let normalized: Vec<f32> = values.iter().map(|v| (v - mean) * inv_std).collect();
        let output = normalized
            .iter()
            .zip(self.gamma.iter().zip(&self.beta))
            .map(|(x, (g, b))| g * x + b)
            .collect();
        self.cache = training.then_some((normalized, inv_std));
        output
    }

    /// 输入为对输出y的梯度，返回对归一化前的值的梯度，同时累积γ、β的梯度
    pub fn backward(&mut self, deltas: &[f32]) -> Vec<f32> {
        let Some((normalized, inv_std)) = self.cache.as_ref() else {
            // 推理模式下的前向：均值/方差视为常数
            let inv_std = 1. / (self.running_variance + self.epsilon).sqrt();
            return deltas
                .iter()
                .zip(&self.gamma)
                .map(|(d, g)| d * g * inv_std)
                .collect();
        };

        for (i, (&d, &x)) in deltas.iter().zip(normalized).enumerate() {
            self.gamma_gradients[i] += d * x;
            self.beta_gradients[i] += d;
        }

        let n = deltas.len() as f32;
        let d_normalized: Vec<f32> = deltas.iter().zip(&self.gamma).map(|(d, g)| d * g).collect();
        let sum_dx: f32 = d_normalized.iter().sum();
        let sum_dx_x: f32 = d_normalized.iter().zip(normalized).map(|(d, x)| d * x).sum();

        d_normalized
            .iter()
            .zip(normalized)
            .map(|(dx, x)| inv_std / n * (n * dx - sum_dx - x * sum_dx_x))
            .collect()
    }

    /// 以batch平均后的梯度更新γ、β（普通梯度下降，使用自身学习率）
    pub fn adjust(&mut self, batch_size: usize) {
        if batch_size == 0 {
            return;
        }
        let scale = self.learning_rate / batch_size as f32;
        for (g, grad) in self.gamma.iter_mut().zip(&self.gamma_gradients) {
            *g -= scale * grad;
        }
        for (b, grad) in self.beta.iter_mut().zip(&self.beta_gradients) {
            *b -= scale * grad;
        }
    }

    pub fn zero_gradients(&mut self) {
        self.gamma_gradients.iter_mut().for_each(|g| *g = 0.);
        self.beta_gradients.iter_mut().for_each(|g| *g = 0.);
    }

    pub fn reset(&mut self) {
        let size = self.gamma.len();
        *self = Self::new(size, self.momentum, self.learning_rate);
    }
}
