/*
 * @Author       : 老董
 * @Date         : 2026-09-27
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-14 11:05:00
 * @Description  : ConvBrain：卷积/池化层 → 展平 → 全连接网络（交叉熵 + softmax输出）
 *
 * 全连接部分的输入宽度由各张量层声明的形状推算；该宽度发生变化时由`reconfigure()`
 * 显式重新连接（并记录warn日志），不会在前向中隐式改变。
 */

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use super::{
    ConvolutionalLobe, ConvolutionalSupportedLobe, Flatten, PoolingLobe, TensorLobe,
};
use crate::errors::{NeuronError, NeuronResult};
use crate::nn::metric::{Metric, MetricTracker, MetricsReporter};
use crate::nn::optimizer::{Optimizer, SGD};
use crate::nn::{
    Activation, Brain, ConvTrainingData, ConvolutionalLobeModel, EarlyStopping, Initializer,
    InitializerType, LobeModel, LossFunction, NormalizedLobeModel, Nucleus, OutputModifier,
    PoolingLobeModel, TrainingOutcome,
};
use crate::tensor::{Tensor, TensorSize};

pub struct ConvBrain {
    epochs: usize,
    learning_rate: f32,
    bias: f32,
    input_size: TensorSize,
    batch_size: usize,
    optimizer: Box<dyn Optimizer>,
    initializer: Initializer,
    lobes: Vec<ConvolutionalSupportedLobe>,
    flatten: Flatten,
    fully_connected: Brain,
    compiled: bool,
    loss: Vec<f32>,
    metrics: MetricTracker,
}

impl ConvBrain {
    pub fn new(epochs: usize, learning_rate: f32, input_size: TensorSize, batch_size: usize) -> Self {
        let bias = 1.;
        let kind = InitializerType::HeNormal;
        let mut fully_connected = Brain::new(Nucleus::new(learning_rate, bias, Activation::ReLu), epochs)
            .with_loss_function(LossFunction::CrossEntropy)
            .with_early_stopping(EarlyStopping::Disabled)
            .with_initializer(kind);
        fully_connected.add_inputs(input_size.len());
        fully_connected.add_modifier(OutputModifier::Softmax);

        Self {
            epochs,
            learning_rate,
            bias,
            input_size,
            batch_size: batch_size.max(1),
            optimizer: Box::new(SGD::new()),
            initializer: Initializer::new(kind),
            lobes: Vec::new(),
            flatten: Flatten::new(input_size),
            fully_connected,
            compiled: false,
            loss: Vec::new(),
            metrics: MetricTracker::default(),
        }
    }

    /// 之后添加的层使用的偏置
    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_optimizer(mut self, optimizer: Box<dyn Optimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_initializer(mut self, kind: InitializerType) -> Self {
        self.initializer = Initializer::new(kind);
        self.fully_connected = self.fully_connected.with_initializer(kind);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.initializer = Initializer::seeded(self.initializer.kind(), seed);
        self.fully_connected = self.fully_connected.with_seed(seed.wrapping_add(1));
        self
    }

    pub fn with_metrics(mut self, metrics: HashSet<Metric>) -> Self {
        self.metrics.set_metrics(metrics);
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn MetricsReporter>) -> Self {
        self.metrics.set_reporter(reporter);
        self
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓ 构建 ↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    // 最后一个张量层的输出形状（没有张量层时为网络输入形状）
    fn current_size(&self) -> TensorSize {
        self.lobes
            .last()
            .map_or(self.input_size, TensorLobe::output_size)
    }

    /// 添加卷积层（ReLU激活），卷积核深度自动取上一层输出的深度
    /// * `filter_size` - 卷积核的(行数, 列数)
    pub fn add_convolution(&mut self, filter_size: (usize, usize), filter_count: usize) -> NeuronResult<()> {
        let incoming = self.current_size();
        let model = ConvolutionalLobeModel::new(
            incoming,
            Activation::ReLu,
            self.bias,
            TensorSize::new(filter_size.0, filter_size.1, incoming.depth),
            filter_count,
        );
        let lobe = ConvolutionalLobe::new(model, self.learning_rate, &mut self.initializer)?;
        self.lobes.push(lobe.into());
        self.reconfigure();
        Ok(())
    }

    pub fn add_max_pool(&mut self) {
        let model = PoolingLobeModel::new(self.current_size());
        self.lobes.push(PoolingLobe::new(model).into());
        self.reconfigure();
    }

    pub fn add_dense(&mut self, count: usize, activation: Activation) {
        self.fully_connected
            .add(LobeModel::new(count, activation, self.bias));
        self.compiled = false;
    }

    /// 添加带BatchNormalizer的全连接层
    /// * `rate` - 归一化参数的学习率
    pub fn add_dense_normal(&mut self, count: usize, rate: f32, momentum: f32, activation: Activation) {
        self.fully_connected
            .add_normalized(NormalizedLobeModel::new(count, activation, momentum, rate));
        self.compiled = false;
    }

    /// 由各层声明的形状推算展平宽度并编译全连接部分
    pub fn compile(&mut self) {
        self.reconfigure();
        self.fully_connected.compile();
        self.compiled = self.fully_connected.is_compiled();
        debug!(
            tensor_lobes = self.lobes.len(),
            flattened = self.flatten.output_len(),
            "卷积网络编译完成"
        );
    }

    /// 展平宽度与全连接输入宽度不一致时，显式重新连接全连接部分的输入
    pub fn reconfigure(&mut self) {
        let size = self.current_size();
        self.flatten = Flatten::new(size);
        let width = size.len();
        let previous = self.fully_connected.input_width();
        if width == previous {
            return;
        }
        if self.fully_connected.is_compiled() {
            warn!(previous, current = width, "展平宽度变化，重新连接全连接部分的输入层");
        } else {
            debug!(previous, current = width, "设置全连接部分的输入宽度");
        }
        self.fully_connected.replace_inputs(width);
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑ 构建 ↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /// 推理；出错时记录日志并返回空向量
    pub fn feed(&mut self, input: &Tensor) -> Vec<f32> {
        self.try_feed(input).unwrap_or_else(|e| {
            error!(error = %e, "feed失败");
            Vec::new()
        })
    }

    pub fn try_feed(&mut self, input: &Tensor) -> NeuronResult<Vec<f32>> {
        self.forward(input, false)
    }

    fn forward(&mut self, input: &Tensor, training: bool) -> NeuronResult<Vec<f32>> {
        if !self.compiled {
            return Err(NeuronError::NotCompiled);
        }
        let mut out = input.clone();
        for lobe in &mut self.lobes {
            out = lobe.feed(&out, training)?;
        }
        let flat = self.flatten.flatten(&out)?;
        if training {
            self.fully_connected.train_forward(&flat)
        } else {
            self.fully_connected.try_feed(&flat, false)
        }
    }

    // 单个样本：前向 + 全连接与张量层的反向，只累积梯度
    fn accumulate(&mut self, sample: &ConvTrainingData) -> NeuronResult<f32> {
        let width = self.fully_connected.output_width();
        if sample.label.len() != width {
            return Err(NeuronError::width_mismatch(
                width,
                sample.label.len(),
                "标签长度与输出层节点数不符",
            ));
        }
        let output = self.forward(&sample.data, true)?;
        self.metrics.record_guess(&output, &sample.label);
        let loss = self
            .fully_connected
            .loss_function()
            .calculate(&output, &sample.label);
        let output_deltas = self.fully_connected.output_deltas(&output, &sample.label);
        self.backpropagate(&output_deltas)?;
        Ok(loss)
    }

    fn backpropagate(&mut self, output_deltas: &[f32]) -> NeuronResult<()> {
        let first_layer_deltas = self.fully_connected.backpropagate(output_deltas)?;
        let mut deltas = self.flatten.unflatten(&first_layer_deltas)?;
        for lobe in self.lobes.iter_mut().rev() {
            deltas = lobe.calculate_gradients(&deltas)?;
        }
        Ok(())
    }

    /// 整个batch累积梯度后统一更新一次，返回有效样本的平均loss；出错时记录日志并返回0
    /// 形状不符的样本记录日志后跳过，整个batch都无效时才返回错误
    pub fn train_on(&mut self, batch: &[ConvTrainingData]) -> f32 {
        self.try_train_on(batch).unwrap_or_else(|e| {
            error!(error = %e, "train_on失败");
            0.
        })
    }

    pub fn try_train_on(&mut self, batch: &[ConvTrainingData]) -> NeuronResult<f32> {
        if batch.is_empty() {
            return Err(NeuronError::EmptyDataset);
        }
        if !self.compiled {
            return Err(NeuronError::NotCompiled);
        }
        self.zero_gradients();
        let mut total = 0.;
        let mut counted = 0;
        let mut last_error = None;
        for (index, sample) in batch.iter().enumerate() {
            match self.accumulate(sample) {
                Ok(loss) => {
                    total += loss;
                    counted += 1;
                }
                Err(e) => {
                    error!(error = %e, index, "训练样本被跳过");
                    last_error = Some(e);
                }
            }
        }
        if counted == 0 {
            return Err(last_error.unwrap_or(NeuronError::EmptyDataset));
        }
        self.adjust_weights(counted);
        self.optimizer.step();
        Ok(total / counted as f32)
    }

    /// 不更新权重，返回该batch上的平均loss
    pub fn validate_on(&mut self, batch: &[ConvTrainingData]) -> f32 {
        let mut total = 0.;
        let mut count = 0;
        for sample in batch {
            match self.forward(&sample.data, false) {
                Ok(output) if output.len() == sample.label.len() => {
                    self.metrics.record_guess(&output, &sample.label);
                    total += self
                        .fully_connected
                        .loss_function()
                        .calculate(&output, &sample.label);
                    count += 1;
                }
                Ok(output) => {
                    let e = NeuronError::width_mismatch(
                        output.len(),
                        sample.label.len(),
                        "验证标签长度与输出层节点数不符",
                    );
                    error!(error = %e, "验证样本被跳过");
                }
                Err(e) => error!(error = %e, "验证样本被跳过"),
            }
        }
        if count == 0 {
            return 0.;
        }
        total / count as f32
    }

    /// 多个epoch的完整训练；每5个batch在一个验证batch上计算一次验证loss
    /// * `epoch_completed` - 每个epoch结束后以(epoch, 当前指标)调用
    /// * `complete` - 训练成功结束后以最终指标调用
    pub fn train(
        &mut self,
        training: &[ConvTrainingData],
        validation: &[ConvTrainingData],
        mut epoch_completed: impl FnMut(usize, &HashMap<Metric, f32>),
        complete: impl FnOnce(&HashMap<Metric, f32>),
    ) -> TrainingOutcome {
        if !self.compiled {
            error!(error = %NeuronError::NotCompiled, "训练失败");
            return TrainingOutcome::failed();
        }
        if training.is_empty() {
            error!(error = %NeuronError::EmptyDataset, "训练失败");
            return TrainingOutcome::failed();
        }

        info!(epochs = self.epochs, samples = training.len(), batch_size = self.batch_size, "开始训练");
        let validation_batches: Vec<&[ConvTrainingData]> = validation.chunks(self.batch_size).collect();
        let mut validations = 0;

        for epoch in 0..self.epochs {
            for (b, batch) in training.chunks(self.batch_size).enumerate() {
                let batch_loss = match self.try_train_on(batch) {
                    Ok(loss) => loss,
                    Err(e) => {
                        error!(error = %e, epoch, batch = b, "batch被跳过");
                        continue;
                    }
                };
                self.loss.push(batch_loss);
                self.metrics.add(Metric::Loss, batch_loss);
                debug!(epoch, batch = b, loss = batch_loss, "batch训练完成");

                if (b + 1) % 5 == 0 && !validation_batches.is_empty() {
                    let val_batch = validation_batches[validations % validation_batches.len()];
                    validations += 1;
                    let val_loss = self.validate_on(val_batch);
                    self.metrics.add(Metric::ValLoss, val_loss);
                    debug!(epoch, val_loss, "验证");
                }
            }
            info!(epoch, "epoch完成");
            epoch_completed(epoch, self.metrics.values());
        }

        complete(self.metrics.values());
        TrainingOutcome {
            success: true,
            converged: false,
            epochs_completed: self.epochs,
        }
    }

    pub fn zero_gradients(&mut self) {
        for lobe in &mut self.lobes {
            lobe.zero_gradients();
        }
        self.fully_connected.zero_gradients();
    }

    /// 以batch平均后的梯度更新所有层（各层之间互不依赖，并行执行）
    pub fn adjust_weights(&mut self, batch_size: usize) {
        let optimizer = self.optimizer.as_ref();
        self.fully_connected
            .adjust_weights_with(batch_size, optimizer);
        self.lobes
            .par_iter_mut()
            .for_each(|lobe| lobe.adjust_weights(batch_size, optimizer));
    }

    /// 重新随机化所有参数并清空loss记录
    pub fn clear(&mut self) {
        self.loss.clear();
        self.metrics.reset();
        for lobe in &mut self.lobes {
            lobe.clear(&mut self.initializer);
        }
        self.fully_connected.clear();
        self.optimizer.reset();
    }

    /// 每个batch的平均loss
    pub fn loss(&self) -> &[f32] {
        &self.loss
    }

    pub fn metrics(&self) -> &MetricTracker {
        &self.metrics
    }

    pub fn lobes(&self) -> &[ConvolutionalSupportedLobe] {
        &self.lobes
    }

    pub fn fully_connected(&self) -> &Brain {
        &self.fully_connected
    }

    pub const fn input_size(&self) -> TensorSize {
        self.input_size
    }

    pub const fn is_compiled(&self) -> bool {
        self.compiled
    }
}
