/*
 * @Author       : 老董
 * @Date         : 2026-10-03
 * @Description  : 网络的JSON配置：超参数与各层规格一次性描述，再由`from_config`构建并编译网络
 */

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::conv::ConvBrain;
use super::metric::Metric;
use super::optimizer::OptimizerConfig;
use super::{
    Activation, Brain, EarlyStopping, GradientDescent, InitializerType, LobeModel, LossFunction,
    NormalizedLobeModel, Nucleus, OutputModifier,
};
use crate::errors::{NeuronError, NeuronResult};
use crate::tensor::TensorSize;

/// 全连接网络中输入层之后的一层
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerConfig {
    Dense(LobeModel),
    Normalized(NormalizedLobeModel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    pub nucleus: Nucleus,
    pub epochs: usize,
    pub loss_function: LossFunction,
    pub early_stopping: EarlyStopping,
    pub initializer: InitializerType,
    pub seed: Option<u64>,
    pub descent: GradientDescent,
    pub optimizer: OptimizerConfig,
    pub output_modifier: Option<OutputModifier>,
    pub inputs: usize,
    pub layers: Vec<LayerConfig>,
    pub metrics: HashSet<Metric>,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            nucleus: Nucleus::default(),
            epochs: 100,
            loss_function: LossFunction::default(),
            early_stopping: EarlyStopping::default(),
            initializer: InitializerType::default(),
            seed: None,
            descent: GradientDescent::default(),
            optimizer: OptimizerConfig::default(),
            output_modifier: None,
            inputs: 0,
            layers: Vec::new(),
            metrics: HashSet::new(),
        }
    }
}

impl BrainConfig {
    pub fn from_json(json: &str) -> NeuronResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| NeuronError::Configuration(format!("无法解析网络配置：{e}")))
    }
}

/// 卷积网络中的一层（张量层按顺序排在全连接层之前）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvLayerConfig {
    Convolution {
        filter_rows: usize,
        filter_columns: usize,
        filter_count: usize,
    },
    MaxPool,
    Dense {
        nodes: usize,
        #[serde(default)]
        activation: Activation,
    },
    DenseNormal {
        nodes: usize,
        #[serde(default)]
        activation: Activation,
        rate: f32,
        momentum: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvBrainConfig {
    pub epochs: usize,
    pub learning_rate: f32,
    #[serde(default = "default_conv_bias")]
    pub bias: f32,
    pub input_size: TensorSize,
    pub batch_size: usize,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default = "default_conv_initializer")]
    pub initializer: InitializerType,
    #[serde(default)]
    pub seed: Option<u64>,
    pub layers: Vec<ConvLayerConfig>,
    #[serde(default)]
    pub metrics: HashSet<Metric>,
}

const fn default_conv_bias() -> f32 {
    1.
}

const fn default_conv_initializer() -> InitializerType {
    InitializerType::HeNormal
}

impl ConvBrainConfig {
    pub fn from_json(json: &str) -> NeuronResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| NeuronError::Configuration(format!("无法解析卷积网络配置：{e}")))
    }
}

impl Brain {
    /// 按配置构建并编译网络
    ///
    /// # Panics
    /// 配置中没有输入层也没有任何层时panic（同`compile()`）
    pub fn from_config(config: &BrainConfig) -> Self {
        let mut brain = Self::new(config.nucleus, config.epochs)
            .with_loss_function(config.loss_function)
            .with_early_stopping(config.early_stopping)
            .with_initializer(config.initializer)
            .with_descent(config.descent)
            .with_optimizer(config.optimizer.build())
            .with_metrics(config.metrics.clone());
        if let Some(seed) = config.seed {
            brain = brain.with_seed(seed);
        }
        if config.inputs > 0 {
            brain.add_inputs(config.inputs);
        }
        for layer in &config.layers {
            match *layer {
                LayerConfig::Dense(model) => brain.add(model),
                LayerConfig::Normalized(model) => brain.add_normalized(model),
            }
        }
        if let Some(modifier) = config.output_modifier {
            brain.add_modifier(modifier);
        }
        brain.compile();
        brain
    }
}

impl ConvBrain {
    /// 按配置构建并编译卷积网络
    pub fn from_config(config: &ConvBrainConfig) -> NeuronResult<Self> {
        let mut brain = Self::new(
            config.epochs,
            config.learning_rate,
            config.input_size,
            config.batch_size,
        )
        .with_bias(config.bias)
        .with_initializer(config.initializer)
        .with_optimizer(config.optimizer.build())
        .with_metrics(config.metrics.clone());
        if let Some(seed) = config.seed {
            brain = brain.with_seed(seed);
        }
        for layer in &config.layers {
            match *layer {
                ConvLayerConfig::Convolution {
                    filter_rows,
                    filter_columns,
                    filter_count,
                } => brain.add_convolution((filter_rows, filter_columns), filter_count)?,
                ConvLayerConfig::MaxPool => brain.add_max_pool(),
                ConvLayerConfig::Dense { nodes, activation } => brain.add_dense(nodes, activation),
                ConvLayerConfig::DenseNormal {
                    nodes,
                    activation,
                    rate,
                    momentum,
                } => brain.add_dense_normal(nodes, rate, momentum, activation),
            }
        }
        brain.compile();
        Ok(brain)
    }
}
