/*
 * @Author       : 老董
 * @Date         : 2026-10-06
 * @Description  : 端到端测试：从JSON配置构建、训练全连接网络
 */

use neuron::nn::{Brain, BrainConfig, LayerConfig, TrainingData};

const CONFIG: &str = r#"{
    "nucleus": {"learning_rate": 0.1, "bias": 0.0, "activation": "tanh"},
    "epochs": 50,
    "loss_function": "mean_square_error",
    "early_stopping": "disabled",
    "initializer": "xavier_uniform",
    "seed": 5,
    "descent": "stochastic",
    "optimizer": {"sgd": {"momentum": 0.5}},
    "inputs": 2,
    "layers": [
        {"type": "dense", "nodes": 6, "activation": "tanh"},
        {"type": "dense", "nodes": 1, "activation": "tanh"}
    ],
    "metrics": ["loss"]
}"#;

fn dataset() -> Vec<TrainingData> {
    [[0., 0.], [0., 1.], [1., 0.], [1., 1.]]
        .iter()
        .map(|&[a, b]| TrainingData::new(vec![a, b], vec![0.8 * (a - b)]))
        .collect()
}

#[test]
fn test_brain_from_json_trains() {
    let config = BrainConfig::from_json(CONFIG).unwrap();
    assert_eq!(config.layers.len(), 2);
    assert!(matches!(config.layers[0], LayerConfig::Dense(model) if model.nodes == 6));

    let mut brain = Brain::from_config(&config);
    assert_eq!(brain.weight_count(), 2 * 6 + 6);
    assert_eq!(brain.optimizer().name(), "SGD");

    let outcome = brain.train(&dataset(), &[], |_| {});
    assert!(outcome.success);
    assert_eq!(outcome.epochs_completed, 50);
    let loss = brain.loss();
    assert!(loss[49] < loss[0]);
}

#[test]
fn test_config_survives_serialization() {
    let config = BrainConfig::from_json(CONFIG).unwrap();
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(BrainConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_same_seed_gives_same_network() {
    let config = BrainConfig::from_json(CONFIG).unwrap();
    let a = Brain::from_config(&config);
    let b = Brain::from_config(&config);
    assert_eq!(a.layer_weights(), b.layer_weights());
}
