/*
 * @Author       : 老董
 * @Date         : 2026-09-18
 * @Description  : 训练指标（loss / 验证loss / 准确率）的记录与上报
 */

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Loss,
    ValLoss,
    Accuracy,
}

/// 外部指标收集者，每次计算出loss或准确率后都会被调用
pub trait MetricsReporter {
    fn update(&mut self, metric: Metric, value: f32);
}

/// 网络内部的指标记录：只保存每种指标的最新值，持久化交给`MetricsReporter`
#[derive(Default)]
pub struct MetricTracker {
    to_gather: HashSet<Metric>,
    values: HashMap<Metric, f32>,
    total_correct: usize,
    total_guesses: usize,
    reporter: Option<Box<dyn MetricsReporter>>,
}

impl MetricTracker {
    pub fn new(to_gather: HashSet<Metric>) -> Self {
        Self {
            to_gather,
            ..Default::default()
        }
    }

    pub fn set_metrics(&mut self, to_gather: HashSet<Metric>) {
        self.to_gather = to_gather;
    }

    pub fn set_reporter(&mut self, reporter: Box<dyn MetricsReporter>) {
        self.reporter = Some(reporter);
    }

    pub fn gathers(&self, metric: Metric) -> bool {
        self.to_gather.contains(&metric)
    }

    /// 记录一个指标值（未要求收集的指标会被忽略）
    pub fn add(&mut self, metric: Metric, value: f32) {
        if !self.gathers(metric) {
            return;
        }
        self.values.insert(metric, value);
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.update(metric, value);
        }
    }

    /// 记录一次预测，并更新累计准确率
    pub fn record_guess(&mut self, output: &[f32], label: &[f32]) {
        if !self.gathers(Metric::Accuracy) || output.is_empty() {
            return;
        }
        self.total_guesses += 1;
        if is_correct_guess(output, label) {
            self.total_correct += 1;
        }
        let accuracy = self.total_correct as f32 / self.total_guesses as f32;
        self.add(Metric::Accuracy, accuracy);
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.total_correct = 0;
        self.total_guesses = 0;
    }

    pub fn get(&self, metric: Metric) -> Option<f32> {
        self.values.get(&metric).copied()
    }

    pub fn values(&self) -> &HashMap<Metric, f32> {
        &self.values
    }
}

/// 单输出（二分类）时按四舍五入比较，多输出时比较最大值所在位置
pub fn is_correct_guess(output: &[f32], label: &[f32]) -> bool {
    if output.len() != label.len() || output.is_empty() {
        return false;
    }
    if output.len() == 1 {
        return output[0].round() == label[0].round();
    }
    argmax(output) == argmax(label)
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_i, best), (i, &v)| {
            if v > best { (i, v) } else { (best_i, best) }
        })
        .0
}
