// src/nn/mod.rs

pub mod layers;
pub mod module;

pub use layers::linear::Linear;
pub use module::Module;
