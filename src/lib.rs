//! # Neuron
//!
//! `neuron`是一个从零实现的神经网络计算引擎：
//! 全连接网络（[`nn::Brain`]）与卷积网络（[`nn::ConvBrain`]）的前向推理、精确的反向传播、
//! 可替换的优化器以及mini-batch训练流程，不依赖任何外部自动微分框架。
//!
//! 本crate只通过`tracing`输出日志，不会安装任何subscriber，由使用方自行配置。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;
