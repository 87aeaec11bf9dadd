use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::services::{
    credentials::CredentialStore, extraction::TextExtractor, llm::LlmGateway,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: Arc<dyn LlmGateway>,
    pub extractor: Arc<dyn TextExtractor>,
    pub users: Arc<dyn CredentialStore>,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn LlmGateway> {
    fn from_ref(state: &AppState) -> Self {
        state.llm.clone()
    }
}

impl FromRef<AppState> for Arc<dyn TextExtractor> {
    fn from_ref(state: &AppState) -> Self {
        state.extractor.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CredentialStore> {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}
