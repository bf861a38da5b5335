// src/nn/layers/mod.rs

pub mod linear;

pub use linear::Linear;
