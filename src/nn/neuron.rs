/*
 * @Author       : 老董
 * @Date         : 2026-09-09
 * @Description  : Neuron：单个神经元，持有带权输入（dendrite）、偏置、激活函数与梯度
 *
 * 不变量：
 * - 每个输入槽同时保存权重与输入值，因此“输入数 == 权重数”在结构上恒成立
 * - `gradients`、`moments`的长度始终与输入槽数一致
 */

use tracing::error;

use super::optimizer::{Moment, Optimizer};
use super::{Activation, Initializer, Nucleus};
use crate::errors::{NeuronError, NeuronResult};

/// 神经元的一个带权输入槽
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dendrite {
    pub weight: f32,
    pub value: f32,
}

#[derive(Debug, Clone)]
pub struct Neuron {
    dendrites: Vec<Dendrite>,
    bias: f32,
    activation: Activation,
    learning_rate: f32,
    /// 反向传播得到的梯度（对激活函数输入的偏导）
    delta: f32,
    /// 最近一次送入激活函数的值
    pre_activation: f32,
    /// 当前batch累积的权重梯度
    gradients: Vec<f32>,
    bias_gradient: f32,
    moments: Vec<Moment>,
    bias_moment: Moment,
    /// 输入层的直通神经元不参与训练
    trainable: bool,
}

impl Neuron {
    /// 创建一个尚未连接的神经元（没有任何输入槽，需经`connect()`连接上一层）
    pub fn new(learning_rate: f32, bias: f32, activation: Activation) -> Self {
        Self {
            dendrites: Vec::new(),
            bias,
            activation,
            learning_rate,
            delta: 0.,
            pre_activation: 0.,
            gradients: Vec::new(),
            bias_gradient: 0.,
            moments: Vec::new(),
            bias_moment: Moment::default(),
            trainable: true,
        }
    }

    /// 输入层神经元：唯一的输入槽权重固定为1，无偏置，激活函数为恒等
    pub fn pass_through() -> Self {
        let mut neuron = Self::new(0., 0., Activation::None);
        neuron.dendrites = vec![Dendrite {
            weight: 1.,
            value: 0.,
        }];
        neuron.gradients = vec![0.];
        neuron.moments = vec![Moment::default()];
        neuron.trainable = false;
        neuron
    }

    /// 连接到含`fan_in`个神经元的上一层，并用初始化器随机化权重
    pub fn connect(&mut self, fan_in: usize, initializer: &mut Initializer, fan_out: usize) {
        self.dendrites = (0..fan_in)
            .map(|_| Dendrite {
                weight: initializer.draw(fan_in, fan_out),
                value: 0.,
            })
            .collect();
        self.gradients = vec![0.; fan_in];
        self.moments = vec![Moment::default(); fan_in];
        self.bias_moment = Moment::default();
        self.zero_gradients();
        self.delta = 0.;
    }

    pub fn inputs(&self) -> &[Dendrite] {
        &self.dendrites
    }

    pub fn fan_in(&self) -> usize {
        self.dendrites.len()
    }

    pub fn weights(&self) -> Vec<f32> {
        self.dendrites.iter().map(|d| d.weight).collect()
    }

    pub fn input_values(&self) -> Vec<f32> {
        self.dendrites.iter().map(|d| d.value).collect()
    }

    pub fn gradients(&self) -> &[f32] {
        &self.gradients
    }

    pub const fn bias(&self) -> f32 {
        self.bias
    }

    pub const fn activation_type(&self) -> Activation {
        self.activation
    }

    pub const fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub const fn is_trainable(&self) -> bool {
        self.trainable
    }

    pub const fn delta(&self) -> f32 {
        self.delta
    }

    pub fn set_delta(&mut self, delta: f32) {
        self.delta = delta;
    }

    /// Σ(weight_i * input_i) + bias
    pub fn weighted_sum(&self) -> f32 {
        self.dendrites
            .iter()
            .map(|d| d.weight * d.value)
            .sum::<f32>()
            + self.bias
    }

    /// f(Σ(weight_i * input_i) + bias)
    pub fn activation(&mut self) -> f32 {
        self.pre_activation = self.weighted_sum();
        self.activation.apply(self.pre_activation)
    }

    /// 以外部（归一化后）的值作为激活函数输入
    pub(crate) fn activate_normalized(&mut self, normalized: f32) -> f32 {
        self.pre_activation = normalized;
        self.activation.apply(normalized)
    }

    /// f'(z)，z为最近一次送入激活函数的值
    pub fn derivative(&self) -> f32 {
        self.activation.derivative(self.pre_activation)
    }

    /// 覆盖所有输入值，长度必须与输入槽数一致
    pub fn try_replace_inputs(&mut self, values: &[f32]) -> NeuronResult<()> {
        if values.len() != self.dendrites.len() {
            return Err(NeuronError::width_mismatch(
                self.dendrites.len(),
                values.len(),
                "输入值个数与神经元输入槽数不符",
            ));
        }
        for (dendrite, &value) in self.dendrites.iter_mut().zip(values) {
            dendrite.value = value;
        }
        Ok(())
    }

    /// 同`try_replace_inputs`，但长度不符时只记录错误、不做任何修改
    pub fn replace_inputs(&mut self, values: &[f32]) {
        if let Err(e) = self.try_replace_inputs(values) {
            error!(error = %e, "replace_inputs被忽略");
        }
    }

    pub fn replace_weights(&mut self, weights: &[f32]) -> NeuronResult<()> {
        if weights.len() != self.dendrites.len() {
            return Err(NeuronError::width_mismatch(
                self.dendrites.len(),
                weights.len(),
                "权重个数与神经元输入槽数不符",
            ));
        }
        for (dendrite, &weight) in self.dendrites.iter_mut().zip(weights) {
            dendrite.weight = weight;
        }
        Ok(())
    }

    /// 按当前delta与输入值累积梯度
    pub fn accumulate_gradients(&mut self) {
        if !self.trainable {
            return;
        }
        for (gradient, dendrite) in self.gradients.iter_mut().zip(&self.dendrites) {
            *gradient += self.delta * dendrite.value;
        }
        self.bias_gradient += self.delta;
    }

    /// 以batch平均后的累积梯度更新权重与偏置
    pub fn adjust_weights(&mut self, batch_size: usize, optimizer: &dyn Optimizer) {
        if !self.trainable || batch_size == 0 {
            return;
        }
        let scale = 1. / batch_size as f32;
        for ((dendrite, gradient), moment) in self
            .dendrites
            .iter_mut()
            .zip(&self.gradients)
            .zip(self.moments.iter_mut())
        {
            dendrite.weight =
                optimizer.run(moment, dendrite.weight, gradient * scale, self.learning_rate);
        }
        self.bias = optimizer.run(
            &mut self.bias_moment,
            self.bias,
            self.bias_gradient * scale,
            self.learning_rate,
        );
    }

    /// 只清零梯度累积，保留权重
    pub fn zero_gradients(&mut self) {
        self.gradients.iter_mut().for_each(|g| *g = 0.);
        self.bias_gradient = 0.;
    }

    /// 重新随机化权重并清零delta与梯度
    pub fn clear(&mut self, initializer: &mut Initializer, fan_out: usize) {
        self.delta = 0.;
        self.pre_activation = 0.;
        self.zero_gradients();
        if !self.trainable {
            return;
        }
        let fan_in = self.dendrites.len();
        for dendrite in &mut self.dendrites {
            dendrite.weight = initializer.draw(fan_in, fan_out);
            dendrite.value = 0.;
        }
        self.moments.iter_mut().for_each(|m| *m = Moment::default());
        self.bias_moment = Moment::default();
    }

    pub fn update_nucleus(&mut self, nucleus: &Nucleus) {
        if !self.trainable {
            return;
        }
        self.learning_rate = nucleus.learning_rate;
        self.bias = nucleus.bias;
        self.activation = nucleus.activation;
    }
}
