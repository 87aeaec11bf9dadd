// src/services/mod.rs

pub mod classifier;
pub mod credentials;
pub mod extraction;
pub mod llm;
pub mod prompts;
pub mod quiz;
