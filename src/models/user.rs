// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO for signup and login.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// Returned by signup and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub ok: bool,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user: Option<String>,
}
