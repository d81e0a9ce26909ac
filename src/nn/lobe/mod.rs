/*
 * @Author       : 老董
 * @Date         : 2026-09-11
 * @Description  : Lobe：全连接网络中的一层神经元
 *
 * 各神经元按位置由本层持有，层与层之间不互相引用：
 * 前向时由网络把上一层的激活值交给下一层，反向时由网络把下一层的delta加权和交给上一层。
 */

mod normalizer;

pub use normalizer::BatchNormalizer;

use super::optimizer::Optimizer;
use super::{Activation, Initializer, LayerType, LobeModel, Neuron, NormalizedLobeModel, Nucleus};
use crate::errors::{NeuronError, NeuronResult};

#[derive(Debug, Clone)]
pub struct Lobe {
    neurons: Vec<Neuron>,
    layer: LayerType,
    activation: Activation,
    normalizer: Option<BatchNormalizer>,
}

impl Lobe {
    /// 输入层：每个神经元只有一个权重恒为1的输入槽，原样透传输入值
    pub fn input(count: usize) -> Self {
        Self {
            neurons: (0..count).map(|_| Neuron::pass_through()).collect(),
            layer: LayerType::Input,
            activation: Activation::None,
            normalizer: None,
        }
    }

    pub fn new(model: LobeModel, nucleus: &Nucleus, layer: LayerType) -> Self {
        Self {
            neurons: (0..model.nodes)
                .map(|_| Neuron::new(nucleus.learning_rate, model.bias, model.activation))
                .collect(),
            layer,
            activation: model.activation,
            normalizer: None,
        }
    }

    /// 带BatchNormalizer的层
    pub fn normalized(model: NormalizedLobeModel, nucleus: &Nucleus, layer: LayerType) -> Self {
        Self {
            neurons: (0..model.nodes)
                .map(|_| Neuron::new(nucleus.learning_rate, 0., model.activation))
                .collect(),
            layer,
            activation: model.activation,
            normalizer: Some(BatchNormalizer::new(
                model.nodes,
                model.momentum,
                model.normalizer_learning_rate,
            )),
        }
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub const fn layer(&self) -> LayerType {
        self.layer
    }

    pub(crate) fn set_layer(&mut self, layer: LayerType) {
        self.layer = layer;
    }

    pub const fn activation(&self) -> Activation {
        self.activation
    }

    pub fn normalizer(&self) -> Option<&BatchNormalizer> {
        self.normalizer.as_ref()
    }

    /// 每个神经元的输入槽数（输入层为1）
    pub fn fan_in(&self) -> usize {
        self.neurons.first().map_or(0, Neuron::fan_in)
    }

    pub fn update_nucleus(&mut self, nucleus: &Nucleus) {
        if self.layer == LayerType::Input {
            return;
        }
        self.activation = nucleus.activation;
        for neuron in &mut self.neurons {
            neuron.update_nucleus(nucleus);
        }
    }

    /// 连接到含`fan_in`个神经元的上一层
    pub fn connect(&mut self, fan_in: usize, initializer: &mut Initializer, fan_out: usize) {
        if self.layer == LayerType::Input {
            return;
        }
        for neuron in &mut self.neurons {
            neuron.connect(fan_in, initializer, fan_out);
        }
    }

    /// 输入层：第i个值交给第i个神经元；其他层：整组值交给每个神经元
    pub fn present(&mut self, values: &[f32]) -> NeuronResult<()> {
        if self.layer == LayerType::Input {
            if values.len() != self.neurons.len() {
                return Err(NeuronError::width_mismatch(
                    self.neurons.len(),
                    values.len(),
                    "输入向量长度与输入层节点数不符",
                ));
            }
            for (neuron, &value) in self.neurons.iter_mut().zip(values) {
                neuron.try_replace_inputs(&[value])?;
            }
            return Ok(());
        }
        for neuron in &mut self.neurons {
            neuron.try_replace_inputs(values)?;
        }
        Ok(())
    }

    /// 计算本层的激活值
    pub fn activations(&mut self, training: bool) -> Vec<f32> {
        match self.normalizer.as_mut() {
            None => self.neurons.iter_mut().map(Neuron::activation).collect(),
            Some(normalizer) => {
                let sums: Vec<f32> = self.neurons.iter().map(Neuron::weighted_sum).collect();
                let normalized = normalizer.normalize(&sums, training);
                self.neurons
                    .iter_mut()
                    .zip(normalized)
                    .map(|(neuron, y)| neuron.activate_normalized(y))
                    .collect()
            }
        }
    }

    /// 根据对本层输出的梯度设置各神经元的delta
    /// * `upstream` - 对本层各神经元输出的梯度
    /// * `include_derivative` - 是否乘以激活函数导数（损失函数已融合输出激活时为false）
    pub fn propagate_deltas(&mut self, upstream: &[f32], include_derivative: bool) {
        let mut deltas: Vec<f32> = self
            .neurons
            .iter()
            .zip(upstream)
            .map(|(neuron, &u)| {
                if include_derivative {
                    u * neuron.derivative()
                } else {
                    u
                }
            })
            .collect();
        if let Some(normalizer) = self.normalizer.as_mut() {
            deltas = normalizer.backward(&deltas);
        }
        for (neuron, delta) in self.neurons.iter_mut().zip(deltas) {
            neuron.set_delta(delta);
        }
    }

    /// 对上一层第j个神经元输出的梯度：Σ_k(delta_k * weight_kj)
    pub fn upstream_sums(&self, previous_count: usize) -> Vec<f32> {
        (0..previous_count)
            .map(|j| {
                self.neurons
                    .iter()
                    .filter_map(|n| n.inputs().get(j).map(|d| n.delta() * d.weight))
                    .sum()
            })
            .collect()
    }

    pub fn deltas(&self) -> Vec<f32> {
        self.neurons.iter().map(Neuron::delta).collect()
    }

    pub fn accumulate_gradients(&mut self) {
        for neuron in &mut self.neurons {
            neuron.accumulate_gradients();
        }
    }

    pub fn adjust_weights(&mut self, batch_size: usize, optimizer: &dyn Optimizer) {
        for neuron in &mut self.neurons {
            neuron.adjust_weights(batch_size, optimizer);
        }
        if let Some(normalizer) = self.normalizer.as_mut() {
            normalizer.adjust(batch_size);
        }
    }

    pub fn zero_gradients(&mut self) {
        for neuron in &mut self.neurons {
            neuron.zero_gradients();
        }
        if let Some(normalizer) = self.normalizer.as_mut() {
            normalizer.zero_gradients();
        }
    }

    /// 重新随机化权重，清零delta与梯度，重置归一化状态
    pub fn clear(&mut self, initializer: &mut Initializer, fan_out: usize) {
        for neuron in &mut self.neurons {
            neuron.clear(initializer, fan_out);
        }
        if let Some(normalizer) = self.normalizer.as_mut() {
            normalizer.reset();
        }
    }

    pub fn weights(&self) -> Vec<Vec<f32>> {
        self.neurons.iter().map(Neuron::weights).collect()
    }

    pub fn replace_weights(&mut self, weights: &[Vec<f32>]) -> NeuronResult<()> {
        if weights.len() != self.neurons.len() {
            return Err(NeuronError::width_mismatch(
                self.neurons.len(),
                weights.len(),
                "权重组数与本层神经元数不符",
            ));
        }
        for (neuron, row) in self.neurons.iter_mut().zip(weights) {
            neuron.replace_weights(row)?;
        }
        Ok(())
    }
}
