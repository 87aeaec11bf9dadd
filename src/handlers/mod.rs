// src/handlers/mod.rs

pub mod assistant;
pub mod auth;
pub mod document;
pub mod quiz;
