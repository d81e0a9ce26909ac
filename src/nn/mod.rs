/*
 * @Author       : 老董
 * @Date         : 2026-09-02
 * @Description  : 负责神经网络（neural network）的构建、前向、反向传播与训练
 */

mod activation;
mod brain;
mod config;
pub mod conv;
mod initializer;
pub mod lobe;
mod loss;
pub mod metric;
mod model;
mod neuron;
mod nucleus;
pub mod optimizer;
mod training_data;

pub use activation::{Activation, OutputModifier};
pub use brain::{Brain, EarlyStopping, GradientDescent, TrainingOutcome};
pub use config::{BrainConfig, ConvBrainConfig, ConvLayerConfig, LayerConfig};
pub use conv::{
    ConvBrain, ConvolutionalLobe, ConvolutionalSupportedLobe, Flatten, PoolingIndices,
    PoolingLobe, TensorLobe,
};
pub use initializer::{Initializer, InitializerType};
pub use lobe::{BatchNormalizer, Lobe};
pub use loss::LossFunction;
pub use metric::{Metric, MetricTracker, MetricsReporter};
pub use model::{ConvolutionalLobeModel, LayerType, LobeModel, NormalizedLobeModel, PoolingLobeModel};
pub use neuron::{Dendrite, Neuron};
pub use nucleus::Nucleus;
pub use optimizer::{Adam, Moment, Optimizer, OptimizerConfig, RMSProp, SGD};
pub use training_data::{ConvTrainingData, TrainingData};

#[cfg(test)]
mod tests;
