/*
 * @Author       : 老董
 * @Date         : 2026-10-06
 * @Description  : 端到端测试：用全连接网络区分红、绿、蓝三种颜色
 */

use std::collections::HashSet;

use neuron::nn::{
    Activation, Brain, EarlyStopping, GradientDescent, InitializerType, LobeModel, LossFunction,
    Metric, NormalizedLobeModel, Nucleus, OutputModifier, TrainingData,
};

const COLORS: [[f32; 3]; 3] = [[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]];

fn one_hot(index: usize) -> Vec<f32> {
    (0..COLORS.len())
        .map(|i| if i == index { 1. } else { 0. })
        .collect()
}

// 在纯色上叠加确定性的轻微扰动
fn dataset(count: usize) -> Vec<TrainingData> {
    (0..count)
        .map(|i| {
            let class = i % COLORS.len();
            let jitter = (i * 7 % 10) as f32 / 50.;
            let data = COLORS[class]
                .iter()
                .map(|&v| if v > 0. { v - jitter } else { v + jitter / 2. })
                .collect();
            TrainingData::new(data, one_hot(class))
        })
        .collect()
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(i, _)| i)
}

#[test]
fn test_dense_brain_learns_colors() {
    let mut brain = Brain::new(Nucleus::new(0.05, 0.01, Activation::Tanh), 60)
        .with_loss_function(LossFunction::CrossEntropy)
        .with_initializer(InitializerType::XavierNormal)
        .with_seed(2024)
        .with_descent(GradientDescent::MiniBatch(16))
        .with_early_stopping(EarlyStopping::Disabled)
        .with_metrics(HashSet::from([Metric::Loss, Metric::Accuracy]));
    brain.add_inputs(3);
    brain.add(LobeModel::new(8, Activation::Tanh, 0.01));
    brain.add(LobeModel::new(3, Activation::Softmax, 0.01));
    brain.add_modifier(OutputModifier::Softmax);
    brain.compile();

    let mut completed = false;
    let outcome = brain.train(&dataset(300), &dataset(30), |success| completed = success);
    assert!(outcome.success);
    assert!(completed);

    let loss = brain.loss();
    assert!(loss[loss.len() - 1] < loss[0]);

    for (class, color) in COLORS.iter().enumerate() {
        let output = brain.feed(color, false);
        assert!(output.iter().all(|v| !v.is_nan()));
        assert_eq!(argmax(&output), class, "颜色{class}未被识别：{output:?}");

        let ranked = brain.feed(color, true);
        assert_eq!(ranked[0], output[class]);
    }
    assert!(brain.metrics().get(Metric::Accuracy).unwrap() > 0.9);
}

#[test]
fn test_normalized_brain_reduces_loss() {
    let mut brain = Brain::new(Nucleus::new(0.01, 0.0001, Activation::ReLu), 40)
        .with_loss_function(LossFunction::CrossEntropy)
        .with_seed(7)
        .with_descent(GradientDescent::MiniBatch(16))
        .with_early_stopping(EarlyStopping::Disabled);
    brain.add_inputs(3);
    brain.add_normalized(NormalizedLobeModel::new(8, Activation::ReLu, 0.9, 0.01));
    brain.add_normalized(NormalizedLobeModel::new(8, Activation::ReLu, 0.9, 0.01));
    brain.add(LobeModel::new(3, Activation::Softmax, 0.0001));
    brain.add_modifier(OutputModifier::Softmax);
    brain.compile();

    let outcome = brain.train(&dataset(300), &[], |_| {});
    assert!(outcome.success);
    let loss = brain.loss();
    assert_eq!(loss.len(), 40);
    assert!(loss.iter().all(|l| l.is_finite()));
    assert!(loss[39] < loss[0]);
}
