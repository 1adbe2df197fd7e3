// src/algorithms/mod.rs
pub mod mask_explainer;
pub mod optimizer;

pub use mask_explainer::{MaskExplainer, MaskExplainerConfig, MaskGranularity};
pub use optimizer::Adam;
