// src/lib.rs

pub mod client;
pub mod config;
pub mod gemini;
pub mod relay;
pub mod sse;
pub mod types;
