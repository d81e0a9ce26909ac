use crate::nn::{
    Activation, Brain, BrainConfig, ConvBrain, ConvBrainConfig, ConvLayerConfig, EarlyStopping,
    GradientDescent, LayerConfig, LossFunction, OutputModifier, TensorLobe,
};
use crate::tensor::TensorSize;

const BRAIN_JSON: &str = r#"{
    "nucleus": {"learning_rate": 0.05, "bias": 0.1, "activation": "relu"},
    "epochs": 20,
    "loss_function": "cross_entropy",
    "early_stopping": {"average_delta": {"threshold": 0.01, "interval": 4}},
    "seed": 9,
    "descent": {"mini_batch": 16},
    "optimizer": {"adam": {"beta1": 0.9, "beta2": 0.999, "epsilon": 1e-8}},
    "output_modifier": "softmax",
    "inputs": 3,
    "layers": [
        {"type": "dense", "nodes": 5, "activation": "relu", "bias": 0.1},
        {"type": "normalized", "nodes": 4, "activation": "tanh", "momentum": 0.9, "normalizer_learning_rate": 0.1},
        {"type": "dense", "nodes": 2, "activation": "softmax"}
    ],
    "metrics": ["loss", "accuracy"]
}"#;

#[test]
fn test_brain_config_from_json() {
    let config = BrainConfig::from_json(BRAIN_JSON).unwrap();
    assert_eq!(config.epochs, 20);
    assert_eq!(config.loss_function, LossFunction::CrossEntropy);
    assert_eq!(
        config.early_stopping,
        EarlyStopping::AverageDelta {
            threshold: 0.01,
            interval: 4
        }
    );
    assert_eq!(config.descent, GradientDescent::MiniBatch(16));
    assert_eq!(config.output_modifier, Some(OutputModifier::Softmax));
    assert_eq!(config.layers.len(), 3);
    assert!(matches!(config.layers[1], LayerConfig::Normalized(_)));

    let mut brain = Brain::from_config(&config);
    assert!(brain.is_compiled());
    assert_eq!(brain.optimizer().name(), "Adam");
    assert_eq!(brain.weight_count(), 3 * 5 + 5 * 4 + 4 * 2);
    assert!(brain.lobes()[2].normalizer().is_some());
    assert_eq!(brain.lobes()[3].activation(), Activation::Softmax);
    assert_eq!(brain.feed(&[0.1, 0.2, 0.3], false).len(), 2);
}

#[test]
fn test_brain_config_defaults() {
    let config = BrainConfig::from_json(r#"{"inputs": 2, "layers": [{"type": "dense", "nodes": 1}]}"#)
        .unwrap();
    assert_eq!(config.epochs, 100);
    assert_eq!(config.early_stopping, EarlyStopping::default());
    assert_eq!(config.loss_function, LossFunction::MeanSquareError);
    let brain = Brain::from_config(&config);
    assert_eq!(brain.weight_count(), 2);
}

#[test]
fn test_invalid_json_is_configuration_error() {
    let result = BrainConfig::from_json("{\"epochs\": \"many\"}");
    assert!(matches!(result, Err(crate::errors::NeuronError::Configuration(_))));
    let result = ConvBrainConfig::from_json("not json");
    assert!(matches!(result, Err(crate::errors::NeuronError::Configuration(_))));
}

#[test]
fn test_conv_brain_config_from_json() {
    let json = r#"{
        "epochs": 3,
        "learning_rate": 0.01,
        "input_size": {"rows": 8, "columns": 8, "depth": 3},
        "batch_size": 4,
        "seed": 1,
        "layers": [
            {"type": "convolution", "filter_rows": 3, "filter_columns": 3, "filter_count": 4},
            {"type": "max_pool"},
            {"type": "dense_normal", "nodes": 6, "activation": "relu", "rate": 0.1, "momentum": 0.99},
            {"type": "dense", "nodes": 3, "activation": "softmax"}
        ]
    }"#;
    let config = ConvBrainConfig::from_json(json).unwrap();
    assert_eq!(config.bias, 1.);
    assert_eq!(config.input_size, TensorSize::new(8, 8, 3));
    assert_eq!(
        config.layers[0],
        ConvLayerConfig::Convolution {
            filter_rows: 3,
            filter_columns: 3,
            filter_count: 4
        }
    );

    let brain = ConvBrain::from_config(&config).unwrap();
    assert!(brain.is_compiled());
    assert_eq!(brain.lobes()[0].output_size(), TensorSize::new(8, 8, 4));
    assert_eq!(brain.fully_connected().input_width(), 4 * 4 * 4);
    assert_eq!(brain.fully_connected().output_width(), 3);
}
