/*
 * @Author       : 老董
 * @Date         : 2026-09-15
 * @LastEditors  : 老董
 * @LastEditTime : 2026-10-14 10:20:00
 * @Description  : Brain：全连接神经网络（构建、编译、前向、反向传播与训练）
 *
 * 状态：未编译 → 已编译。`compile()`之前的前向与训练都只记录错误并返回空结果。
 * 第0层恒为输入层，最后一层为输出层。
 */

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace};

use super::lobe::Lobe;
use super::metric::{Metric, MetricTracker, MetricsReporter};
use super::optimizer::{Optimizer, SGD};
use super::{
    Initializer, InitializerType, LayerType, LobeModel, LossFunction, NormalizedLobeModel,
    Nucleus, OutputModifier, TrainingData,
};
use crate::errors::{NeuronError, NeuronResult};

/// 梯度下降方式：决定一个batch含多少样本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientDescent {
    /// 每个样本后立即更新
    #[default]
    Stochastic,
    /// 整个训练集作为一个batch
    Batch,
    MiniBatch(usize),
}

impl GradientDescent {
    pub fn batch_size(&self, dataset_len: usize) -> usize {
        match *self {
            Self::Stochastic => 1,
            Self::Batch => dataset_len.max(1),
            Self::MiniBatch(size) => size.max(1),
        }
    }
}

/// 早停策略
///
/// `AverageDelta`：每个epoch记录相邻两次验证loss之差的绝对值；
/// 每`interval`个epoch检查一次这段窗口内的平均值，不大于`threshold`即视为收敛，随后清空窗口。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyStopping {
    Disabled,
    AverageDelta { threshold: f32, interval: usize },
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self::AverageDelta {
            threshold: 0.001,
            interval: 5,
        }
    }
}

/// `train()`的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrainingOutcome {
    pub success: bool,
    /// 是否因早停而提前结束
    pub converged: bool,
    pub epochs_completed: usize,
}

impl TrainingOutcome {
    pub(crate) const fn failed() -> Self {
        Self {
            success: false,
            converged: false,
            epochs_completed: 0,
        }
    }
}

pub struct Brain {
    nucleus: Nucleus,
    epochs: usize,
    loss_function: LossFunction,
    early_stopping: EarlyStopping,
    initializer: Initializer,
    descent: GradientDescent,
    optimizer: Box<dyn Optimizer>,
    output_modifier: Option<OutputModifier>,
    lobes: Vec<Lobe>,
    compiled: bool,
    loss: Vec<f32>,
    metrics: MetricTracker,
}

impl Brain {
    pub fn new(nucleus: Nucleus, epochs: usize) -> Self {
        Self {
            nucleus,
            epochs,
            loss_function: LossFunction::default(),
            early_stopping: EarlyStopping::default(),
            initializer: Initializer::default(),
            descent: GradientDescent::default(),
            optimizer: Box::new(SGD::new()),
            output_modifier: None,
            lobes: Vec::new(),
            compiled: false,
            loss: Vec::new(),
            metrics: MetricTracker::default(),
        }
    }

    pub fn with_loss_function(mut self, loss_function: LossFunction) -> Self {
        self.loss_function = loss_function;
        self
    }

    pub fn with_early_stopping(mut self, early_stopping: EarlyStopping) -> Self {
        self.early_stopping = early_stopping;
        self
    }

    pub fn with_initializer(mut self, kind: InitializerType) -> Self {
        self.initializer = Initializer::new(kind);
        self
    }

    /// 使用带种子的初始化器（保留当前初始化方式）
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.initializer = Initializer::seeded(self.initializer.kind(), seed);
        self
    }

    pub fn with_descent(mut self, descent: GradientDescent) -> Self {
        self.descent = descent;
        self
    }

    pub fn with_optimizer(mut self, optimizer: Box<dyn Optimizer>) -> Self {
        self.optimizer = optimizer;
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
    /// 设置（或替换）输入层
    pub fn add_inputs(&mut self, count: usize) {
        if self
            .lobes
            .first()
            .is_some_and(|first| first.layer() == LayerType::Input)
        {
            self.lobes[0] = Lobe::input(count);
        } else {
            self.lobes.insert(0, Lobe::input(count));
        }
        self.compiled = false;
    }

    /// 追加一层；网络为空时该层作为输入层
    pub fn add(&mut self, model: LobeModel) {
        let lobe = if self.lobes.is_empty() {
            Lobe::input(model.nodes)
        } else {
            Lobe::new(model, &self.nucleus, LayerType::Hidden)
        };
        self.lobes.push(lobe);
        self.compiled = false;
    }

    pub fn add_normalized(&mut self, model: NormalizedLobeModel) {
        let lobe = if self.lobes.is_empty() {
            Lobe::input(model.nodes)
        } else {
            Lobe::normalized(model, &self.nucleus, LayerType::Hidden)
        };
        self.lobes.push(lobe);
        self.compiled = false;
    }

    pub fn add_modifier(&mut self, modifier: OutputModifier) {
        self.output_modifier = Some(modifier);
    }

    /// 连接相邻层并随机化权重
    ///
    /// # Panics
    /// 网络中没有任何层时panic（不可恢复的配置错误）
    pub fn compile(&mut self) {
        assert!(
            !self.lobes.is_empty(),
            "{}",
            NeuronError::Configuration("网络中至少需要一层才能编译".to_string())
        );

        let last = self.lobes.len() - 1;
        for i in 1..self.lobes.len() {
            self.lobes[i].set_layer(if i == last {
                LayerType::Output
            } else {
                LayerType::Hidden
            });
            let fan_in = self.lobes[i - 1].len();
            let fan_out = self.lobes.get(i + 1).map_or(self.lobes[i].len(), Lobe::len);
            self.lobes[i].connect(fan_in, &mut self.initializer, fan_out);
        }
        self.compiled = true;
        debug!(layers = self.lobes.len(), weights = self.weight_count(), "网络编译完成");
    }

    /// 显式改变输入层宽度，并重新连接第一个隐藏层（已编译时）
    pub fn replace_inputs(&mut self, count: usize) {
        let compiled = self.compiled;
        self.add_inputs(count);
        if !compiled {
            return;
        }
        if self.lobes.len() > 1 {
            let fan_out = self.lobes.get(2).map_or(self.lobes[1].len(), Lobe::len);
            self.lobes[1].connect(count, &mut self.initializer, fan_out);
        }
        self.compiled = true;
    }

    pub fn replace_optimizer(&mut self, optimizer: Box<dyn Optimizer>) {
        self.optimizer = optimizer;
    }

    pub fn update_nucleus(&mut self, nucleus: Nucleus) {
        self.nucleus = nucleus;
        for lobe in &mut self.lobes {
            lobe.update_nucleus(&nucleus);
        }
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑ 构建 ↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓ 前向 ↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 前向推理；出错时记录日志并返回空向量
    /// * `ranked` - 为true时按降序返回
    pub fn feed(&mut self, input: &[f32], ranked: bool) -> Vec<f32> {
        self.try_feed(input, ranked).unwrap_or_else(|e| {
            error!(error = %e, "feed失败");
            Vec::new()
        })
    }

    pub fn try_feed(&mut self, input: &[f32], ranked: bool) -> NeuronResult<Vec<f32>> {
        let mut output = self.forward(input, false)?;
        if ranked {
            output.sort_by(|a, b| b.total_cmp(a));
        }
        Ok(output)
    }

    /// 训练模式的前向（归一化层使用当前样本的统计量并缓存反向所需的值）
    pub(crate) fn train_forward(&mut self, input: &[f32]) -> NeuronResult<Vec<f32>> {
        self.forward(input, true)
    }

    // 严格从左到右：每层都依赖上一层已算出的激活值
    fn forward(&mut self, input: &[f32], training: bool) -> NeuronResult<Vec<f32>> {
        if !self.compiled {
            return Err(NeuronError::NotCompiled);
        }
        let mut values = input.to_vec();
        for lobe in &mut self.lobes {
            lobe.present(&values)?;
            values = lobe.activations(training);
        }
        if let Some(modifier) = self.output_modifier {
            values = modifier.apply(&values);
        }
        Ok(values)
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑ 前向 ↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓ 反向 ↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 输出层各神经元的损失导数
    pub fn output_deltas(&self, predicted: &[f32], correct: &[f32]) -> Vec<f32> {
        self.loss_function.gradient(predicted, correct)
    }

    /// 从输出层的损失导数开始反向传播并累积梯度，返回输入层的delta
    pub fn backpropagate(&mut self, deltas: &[f32]) -> NeuronResult<Vec<f32>> {
        if !self.compiled {
            return Err(NeuronError::NotCompiled);
        }
        let last = self.lobes.len() - 1;
        if deltas.len() != self.lobes[last].len() {
            return Err(NeuronError::width_mismatch(
                self.lobes[last].len(),
                deltas.len(),
                "delta个数与输出层节点数不符",
            ));
        }

        let fused = self.loss_function.fuses_output_activation();
        self.lobes[last].propagate_deltas(deltas, !fused);
        for i in (0..last).rev() {
            let upstream = self.lobes[i + 1].upstream_sums(self.lobes[i].len());
            self.lobes[i].propagate_deltas(&upstream, true);
        }
        for lobe in self.lobes.iter_mut().skip(1) {
            lobe.accumulate_gradients();
        }
        Ok(self.lobes[0].deltas())
    }

    // 单个样本：前向 + 反向，只累积梯度，返回该样本的loss
    // 标签宽度在前向之前检查，出错的样本不会留下任何训练状态
    fn accumulate(&mut self, sample: &TrainingData) -> NeuronResult<f32> {
        if sample.correct.len() != self.output_width() {
            return Err(NeuronError::width_mismatch(
                self.output_width(),
                sample.correct.len(),
                "标签长度与输出层节点数不符",
            ));
        }
        let output = self.forward(&sample.data, true)?;
        let loss = self.loss_function.calculate(&output, &sample.correct);
        let deltas = self.output_deltas(&output, &sample.correct);
        trace!(?deltas, "输出层delta");
        self.backpropagate(&deltas)?;
        self.metrics.record_guess(&output, &sample.correct);
        Ok(loss)
    }

    /// 单样本训练：前向、反向并立即更新权重；出错时记录日志并返回0
    pub fn train_on(&mut self, sample: &TrainingData) -> f32 {
        self.try_train_on(sample).unwrap_or_else(|e| {
            error!(error = %e, "train_on失败");
            0.
        })
    }

    pub fn try_train_on(&mut self, sample: &TrainingData) -> NeuronResult<f32> {
        self.try_train_on_batch(std::slice::from_ref(sample))
    }

    /// 整个batch累积梯度后统一更新一次，返回有效样本的平均loss
    /// 形状不符的样本记录日志后跳过；整个batch都无效时返回最后一个错误且不更新权重
    pub fn train_on_batch(&mut self, batch: &[TrainingData]) -> f32 {
        self.try_train_on_batch(batch).unwrap_or_else(|e| {
            error!(error = %e, "train_on_batch失败");
            0.
        })
    }

    pub fn try_train_on_batch(&mut self, batch: &[TrainingData]) -> NeuronResult<f32> {
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
        let loss = total / counted as f32;
        debug!(batch = batch.len(), counted, loss, "batch训练完成");
        Ok(loss)
    }

    /// 不更新权重，返回验证集上的平均loss
    pub fn validate_on(&mut self, batch: &[TrainingData]) -> f32 {
        let mut total = 0.;
        let mut count = 0;
        for sample in batch {
            match self.forward(&sample.data, false) {
                Ok(output) if output.len() == sample.correct.len() => {
                    total += self.loss_function.calculate(&output, &sample.correct);
                    count += 1;
                }
                Ok(output) => {
                    let e = NeuronError::width_mismatch(
                        output.len(),
                        sample.correct.len(),
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
        let val_loss = total / count as f32;
        self.metrics.add(Metric::ValLoss, val_loss);
        val_loss
    }

    /// 多个epoch的完整训练
    /// * `complete` - 训练结束时以是否成功为参数调用
    pub fn train(
        &mut self,
        data: &[TrainingData],
        validation: &[TrainingData],
        complete: impl FnOnce(bool),
    ) -> TrainingOutcome {
        let outcome = match self.run_epochs(data, validation) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "训练失败");
                TrainingOutcome::failed()
            }
        };
        complete(outcome.success);
        outcome
    }

    fn run_epochs(
        &mut self,
        data: &[TrainingData],
        validation: &[TrainingData],
    ) -> NeuronResult<TrainingOutcome> {
        if !self.compiled {
            return Err(NeuronError::NotCompiled);
        }
        if data.is_empty() {
            return Err(NeuronError::EmptyDataset);
        }

        let batch_size = self.descent.batch_size(data.len());
        info!(epochs = self.epochs, samples = data.len(), batch_size, "开始训练");

        let mut previous_val_loss: Option<f32> = None;
        let mut window: Vec<f32> = Vec::new();
        for epoch in 0..self.epochs {
            self.metrics.reset();
            let mut epoch_loss = 0.;
            let mut batches = 0;
            for (b, batch) in data.chunks(batch_size).enumerate() {
                match self.try_train_on_batch(batch) {
                    Ok(loss) => {
                        epoch_loss += loss;
                        batches += 1;
                    }
                    Err(e) => error!(error = %e, epoch, batch = b, "batch被跳过"),
                }
            }
            if batches == 0 {
                continue;
            }
            let epoch_loss = epoch_loss / batches as f32;
            self.loss.push(epoch_loss);
            self.metrics.add(Metric::Loss, epoch_loss);
            debug!(epoch, loss = epoch_loss, "epoch完成");

            let EarlyStopping::AverageDelta {
                threshold,
                interval,
            } = self.early_stopping
            else {
                continue;
            };
            if validation.is_empty() {
                continue;
            }

            let val_loss = self.validate_on(validation);
            if epoch % interval.max(1) == 0 {
                if !window.is_empty() {
                    let average = window.iter().sum::<f32>() / window.len() as f32;
                    debug!(epoch, val_loss, average, "验证检查");
                    if average <= threshold {
                        info!(epoch, val_loss, "验证误差变化已低于阈值，提前结束训练");
                        return Ok(TrainingOutcome {
                            success: true,
                            converged: true,
                            epochs_completed: epoch + 1,
                        });
                    }
                }
                window.clear();
            } else if let Some(previous) = previous_val_loss {
                window.push((val_loss - previous).abs());
            }
            previous_val_loss = Some(val_loss);
        }

        info!(epochs = self.epochs, "训练完成");
        Ok(TrainingOutcome {
            success: true,
            converged: false,
            epochs_completed: self.epochs,
        })
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑ 反向 ↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

    pub fn zero_gradients(&mut self) {
        for lobe in &mut self.lobes {
            lobe.zero_gradients();
        }
    }

    /// 以batch平均后的梯度更新所有层（各层之间互不依赖，并行执行）
    pub fn adjust_weights(&mut self, batch_size: usize) {
        adjust_lobes(&mut self.lobes, batch_size, self.optimizer.as_ref());
    }

    /// 使用外部优化器更新（卷积网络统一管理优化器时使用）
    pub(crate) fn adjust_weights_with(&mut self, batch_size: usize, optimizer: &dyn Optimizer) {
        adjust_lobes(&mut self.lobes, batch_size, optimizer);
    }

    /// 重新随机化所有权重并清空loss记录
    pub fn clear(&mut self) {
        for i in 0..self.lobes.len() {
            let fan_out = self
                .lobes
                .get(i + 1)
                .map_or(self.lobes[i].len(), Lobe::len);
            self.lobes[i].clear(&mut self.initializer, fan_out);
        }
        self.loss.clear();
        self.metrics.reset();
        self.optimizer.reset();
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓ 访问 ↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    /// 每个epoch的平均loss
    pub fn loss(&self) -> &[f32] {
        &self.loss
    }

    pub fn metrics(&self) -> &MetricTracker {
        &self.metrics
    }

    pub fn lobes(&self) -> &[Lobe] {
        &self.lobes
    }

    pub const fn is_compiled(&self) -> bool {
        self.compiled
    }

    pub const fn nucleus(&self) -> Nucleus {
        self.nucleus
    }

    pub const fn epochs(&self) -> usize {
        self.epochs
    }

    pub const fn loss_function(&self) -> LossFunction {
        self.loss_function
    }

    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }

    pub fn input_width(&self) -> usize {
        self.lobes.first().map_or(0, Lobe::len)
    }

    pub fn output_width(&self) -> usize {
        self.lobes.last().map_or(0, Lobe::len)
    }

    /// 各层（不含输入层）各神经元的权重
    pub fn layer_weights(&self) -> Vec<Vec<Vec<f32>>> {
        self.lobes.iter().skip(1).map(Lobe::weights).collect()
    }

    pub fn replace_weights(&mut self, weights: &[Vec<Vec<f32>>]) -> NeuronResult<()> {
        if weights.len() + 1 != self.lobes.len() {
            return Err(NeuronError::width_mismatch(
                self.lobes.len().saturating_sub(1),
                weights.len(),
                "权重层数与网络层数不符",
            ));
        }
        for (lobe, layer) in self.lobes.iter_mut().skip(1).zip(weights) {
            lobe.replace_weights(layer)?;
        }
        Ok(())
    }

    /// 可学习权重总数：Σ(相邻两层节点数之积)
    pub fn weight_count(&self) -> usize {
        self.lobes
            .iter()
            .skip(1)
            .map(|lobe| lobe.len() * lobe.fan_in())
            .sum()
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑ 访问 ↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
}

fn adjust_lobes(lobes: &mut [Lobe], batch_size: usize, optimizer: &dyn Optimizer) {
    lobes
        .par_iter_mut()
        .for_each(|lobe| lobe.adjust_weights(batch_size, optimizer));
}
