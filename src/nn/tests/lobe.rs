use approx::assert_abs_diff_eq;

use crate::assert_err;
use crate::errors::NeuronError;
use crate::nn::optimizer::SGD;
use crate::nn::{
    Activation, Initializer, InitializerType, LayerType, Lobe, LobeModel, NormalizedLobeModel,
    Nucleus,
};

fn initializer() -> Initializer {
    Initializer::seeded(InitializerType::XavierNormal, 11)
}

fn dense(nodes: usize, activation: Activation, fan_in: usize) -> Lobe {
    let mut lobe = Lobe::new(
        LobeModel::new(nodes, activation, 0.),
        &Nucleus::default(),
        LayerType::Hidden,
    );
    lobe.connect(fan_in, &mut initializer(), 1);
    lobe
}

#[test]
fn test_input_lobe_passes_values_through() {
    let mut lobe = Lobe::input(3);
    assert_eq!(lobe.layer(), LayerType::Input);
    lobe.present(&[0.5, -2., 7.]).unwrap();
    assert_eq!(lobe.activations(false), vec![0.5, -2., 7.]);
    assert_eq!(lobe.fan_in(), 1);
}

#[test]
fn test_present_with_wrong_width() {
    let mut lobe = Lobe::input(3);
    assert_err!(
        lobe.present(&[1., 2.]),
        NeuronError::ShapeMismatch([3], [2], "输入向量长度与输入层节点数不符")
    );

    let mut lobe = dense(2, Activation::None, 4);
    assert_err!(lobe.present(&[1., 2.]), NeuronError::ShapeMismatch { .. });
}

#[test]
fn test_connect_gives_every_neuron_the_same_fan_in() {
    let lobe = dense(5, Activation::ReLu, 3);
    assert_eq!(lobe.len(), 5);
    assert_eq!(lobe.fan_in(), 3);
    assert!(lobe.neurons().iter().all(|n| n.fan_in() == 3));
    assert!(
        lobe.neurons()
            .iter()
            .all(|n| n.inputs().len() == n.weights().len())
    );
}

#[test]
fn test_upstream_sums() {
    let mut lobe = dense(2, Activation::None, 3);
    lobe.replace_weights(&[vec![1., 2., 3.], vec![4., 5., 6.]])
        .unwrap();
    lobe.present(&[0., 0., 0.]).unwrap();
    lobe.activations(true);
    lobe.propagate_deltas(&[1., 0.5], true);
    assert_eq!(lobe.deltas(), vec![1., 0.5]);
    assert_eq!(lobe.upstream_sums(3), vec![3., 4.5, 6.]);
}

#[test]
fn test_propagate_deltas_applies_derivative() {
    let mut lobe = dense(2, Activation::ReLu, 1);
    lobe.replace_weights(&[vec![1.], vec![-1.]]).unwrap();
    lobe.present(&[2.]).unwrap();
    assert_eq!(lobe.activations(true), vec![2., 0.]);

    lobe.propagate_deltas(&[0.3, 0.3], true);
    assert_eq!(lobe.deltas(), vec![0.3, 0.]);

    lobe.propagate_deltas(&[0.3, 0.3], false);
    assert_eq!(lobe.deltas(), vec![0.3, 0.3]);
}

#[test]
fn test_adjust_weights() {
    let mut lobe = dense(1, Activation::None, 2);
    lobe.replace_weights(&[vec![1., 1.]]).unwrap();
    lobe.present(&[1., 2.]).unwrap();
    lobe.activations(true);
    lobe.propagate_deltas(&[1.], true);
    lobe.accumulate_gradients();
    lobe.adjust_weights(1, &SGD::new());
    // 默认Nucleus的学习率为0.1
    let weights = lobe.weights();
    assert_abs_diff_eq!(weights[0][0], 0.9, epsilon = 1e-6);
    assert_abs_diff_eq!(weights[0][1], 0.8, epsilon = 1e-6);
}

#[test]
fn test_replace_weights_with_wrong_shape() {
    let mut lobe = dense(2, Activation::None, 3);
    assert_err!(
        lobe.replace_weights(&[vec![1., 2., 3.]]),
        NeuronError::ShapeMismatch([2], [1], "权重组数与本层神经元数不符")
    );
    assert_err!(
        lobe.replace_weights(&[vec![1., 2., 3.], vec![1.]]),
        NeuronError::ShapeMismatch([3], [1], "权重个数与神经元输入槽数不符")
    );
}

#[test]
fn test_update_nucleus_reaches_every_neuron() {
    let mut lobe = dense(3, Activation::ReLu, 2);
    lobe.update_nucleus(&Nucleus::new(0.5, 0.3, Activation::Tanh));
    assert_eq!(lobe.activation(), Activation::Tanh);
    assert!(lobe.neurons().iter().all(|n| n.learning_rate() == 0.5));
}

fn normalized(nodes: usize, fan_in: usize) -> Lobe {
    let mut lobe = Lobe::normalized(
        NormalizedLobeModel::new(nodes, Activation::None, 0.9, 0.1),
        &Nucleus::default(),
        LayerType::Hidden,
    );
    lobe.connect(fan_in, &mut initializer(), 1);
    lobe
}

#[test]
fn test_normalized_lobe_training_output_is_standardized() {
    let mut lobe = normalized(3, 1);
    lobe.replace_weights(&[vec![1.], vec![2.], vec![3.]]).unwrap();
    lobe.present(&[1.]).unwrap();
    let output = lobe.activations(true);

    let mean = output.iter().sum::<f32>() / 3.;
    let variance = output.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / 3.;
    assert_abs_diff_eq!(mean, 0., epsilon = 1e-5);
    assert_abs_diff_eq!(variance, 1., epsilon = 1e-3);

    // 滑动均值：0.9 * 0 + 0.1 * 2
    let normalizer = lobe.normalizer().unwrap();
    assert_abs_diff_eq!(normalizer.running_mean(), 0.2, epsilon = 1e-6);
}

#[test]
fn test_normalized_lobe_deltas_sum_to_zero() {
    let mut lobe = normalized(3, 1);
    lobe.replace_weights(&[vec![1.], vec![2.], vec![4.]]).unwrap();
    lobe.present(&[1.]).unwrap();
    lobe.activations(true);
    lobe.propagate_deltas(&[1., -2., 0.5], true);
    let deltas = lobe.deltas();
    assert_abs_diff_eq!(deltas.iter().sum::<f32>(), 0., epsilon = 1e-4);
}

#[test]
fn test_normalized_lobe_updates_gamma_and_beta() {
    let mut lobe = normalized(2, 1);
    lobe.replace_weights(&[vec![1.], vec![3.]]).unwrap();
    lobe.present(&[1.]).unwrap();
    lobe.activations(true);
    lobe.propagate_deltas(&[1., 1.], true);
    lobe.adjust_weights(1, &SGD::new());

    let normalizer = lobe.normalizer().unwrap();
    // dβ = 1，学习率0.1
    assert_abs_diff_eq!(normalizer.beta()[0], -0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(normalizer.beta()[1], -0.1, epsilon = 1e-6);
    // x̂ = [-1, 1]
    assert_abs_diff_eq!(normalizer.gamma()[0], 1.1, epsilon = 1e-3);
    assert_abs_diff_eq!(normalizer.gamma()[1], 0.9, epsilon = 1e-3);
}
