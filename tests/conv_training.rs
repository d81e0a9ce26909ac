/*
 * @Author       : 老董
 * @Date         : 2026-10-08
 * @Description  : 端到端测试：卷积网络的形状传递与训练
 */

use neuron::nn::{
    Activation, ConvBrain, ConvTrainingData, Flatten, OptimizerConfig, TensorLobe,
};
use neuron::tensor::{Tensor, TensorSize};

#[test]
fn test_shapes_through_the_pipeline() {
    let mut brain = ConvBrain::new(1, 0.01, TensorSize::new(28, 28, 3), 1).with_seed(1);
    brain.add_convolution((3, 3), 32).unwrap();
    brain.add_max_pool();
    brain.add_dense(10, Activation::ReLu);
    brain.add_dense(2, Activation::Softmax);
    brain.compile();

    assert_eq!(brain.lobes()[0].output_size(), TensorSize::new(28, 28, 32));
    assert_eq!(brain.lobes()[1].output_size(), TensorSize::new(14, 14, 32));
    assert_eq!(brain.fully_connected().input_width(), 14 * 14 * 32);

    let input = Tensor::filled(TensorSize::new(28, 28, 3), 0.1);
    assert_eq!(brain.feed(&input).len(), 2);

    let flatten = Flatten::new(TensorSize::new(28, 28, 3));
    let flat = flatten.flatten(&input).unwrap();
    assert_eq!(flat.len(), 2352);
    assert_eq!(flatten.unflatten(&flat).unwrap(), input);
}

// 横条纹为第0类，竖条纹为第1类
fn stripes(horizontal: bool, phase: usize) -> ConvTrainingData {
    let mut data = Tensor::zeros(TensorSize::new(8, 8, 1));
    for r in 0..8 {
        for c in 0..8 {
            let line = if horizontal { r } else { c };
            if (line + phase) % 2 == 0 {
                data[[0, r, c]] = 1.;
            }
        }
    }
    let label = if horizontal { vec![1., 0.] } else { vec![0., 1.] };
    ConvTrainingData::new(data, label)
}

#[test]
fn test_conv_brain_reduces_loss() {
    let mut brain = ConvBrain::new(20, 0.01, TensorSize::new(8, 8, 1), 4)
        .with_seed(33)
        .with_optimizer(
            OptimizerConfig::Adam {
                beta1: 0.9,
                beta2: 0.999,
                epsilon: 1e-8,
            }
            .build(),
        );
    brain.add_convolution((3, 3), 4).unwrap();
    brain.add_max_pool();
    brain.add_dense(8, Activation::ReLu);
    brain.add_dense(2, Activation::Softmax);
    brain.compile();

    let training: Vec<ConvTrainingData> = (0..16).map(|i| stripes(i % 2 == 0, i / 2)).collect();
    let validation = vec![stripes(true, 1), stripes(false, 0)];

    let mut epochs = 0;
    let outcome = brain.train(&training, &validation, |_, _| epochs += 1, |_| {});
    assert!(outcome.success);
    assert_eq!(epochs, 20);

    // 每个epoch 4个batch
    let loss = brain.loss();
    assert_eq!(loss.len(), 80);
    let first: f32 = loss[..4].iter().sum();
    let last: f32 = loss[76..].iter().sum();
    assert!(last < first, "loss没有下降：{first} -> {last}");

    let output = brain.feed(&stripes(true, 0).data);
    assert!(output[0] > output[1]);
}
