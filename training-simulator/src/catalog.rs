use serde::Serialize;

/// Model kinds the simulator accepts.
pub const SUPPORTED_MODELS: [&str; 7] = [
    "cnn",
    "transformer",
    "mlp",
    "resnet-18",
    "lstm",
    "vit",
    "efficientnet",
];

pub const PRELOADED_DATASETS: [&str; 6] = [
    "mnist",
    "cifar-10",
    "fashion-mnist",
    "imdb",
    "sst-2",
    "iris",
];

pub const SIMULATED_DEVICE: &str = "cloud-gpu-free-tier";

pub fn is_supported_model(model: &str) -> bool {
    let model = model.trim().to_ascii_lowercase();
    SUPPORTED_MODELS.contains(&model.as_str())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelSummary {
    pub model: &'static str,
    pub use_case: &'static str,
    pub avg_accuracy: f64,
    pub avg_epochs: u32,
    pub difficulty: &'static str,
    pub recommended_for: &'static [&'static str],
}

const SUMMARIES: [(&str, ModelSummary); 3] = [
    (
        "cnn",
        ModelSummary {
            model: "CNN",
            use_case: "Image Classification",
            avg_accuracy: 0.95,
            avg_epochs: 10,
            difficulty: "Beginner",
            recommended_for: &["MNIST", "CIFAR-10", "Fashion-MNIST"],
        },
    ),
    (
        "transformer",
        ModelSummary {
            model: "Transformer",
            use_case: "Text Classification",
            avg_accuracy: 0.88,
            avg_epochs: 15,
            difficulty: "Intermediate",
            recommended_for: &["IMDB", "SST-2", "News Classification"],
        },
    ),
    (
        "mlp",
        ModelSummary {
            model: "MLP",
            use_case: "Tabular Data",
            avg_accuracy: 0.82,
            avg_epochs: 50,
            difficulty: "Beginner",
            recommended_for: &["Iris", "Wine", "Breast Cancer"],
        },
    ),
];

/// Reference numbers for a model kind, used by the results overview.
pub fn model_summary(model: &str) -> Option<ModelSummary> {
    let model = model.trim().to_ascii_lowercase();
    SUMMARIES
        .iter()
        .find(|(key, _)| *key == model)
        .map(|(_, summary)| summary.clone())
}
