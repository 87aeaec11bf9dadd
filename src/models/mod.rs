// src/models/mod.rs

pub mod assistant;
pub mod document;
pub mod quiz;
pub mod user;
