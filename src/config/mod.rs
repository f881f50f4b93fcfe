mod app_config;

pub use app_config::{AppConfig, EvaluationConfig, JudgeConfig, RetrieverConfig};
