//! Account and Subscription Clients
//!
//! Thin wrappers over the auth and subscription REST endpoints. The bearer
//! token comes from an injected [`TokenProvider`].

mod client;
mod token;

pub use client::{
    validate_new_password, AccountClient, AccountInfo, Plan, Subscription, MIN_PASSWORD_LEN,
};
pub use token::{FileTokenStore, MemoryTokenStore, TokenProvider, TOKEN_KEY};

use thiserror::Error;

/// Errors from account operations
#[derive(Debug, Error)]
pub enum AccountError {
    /// No session token is stored
    #[error("Not signed in")]
    NotAuthenticated,

    /// Input rejected before sending
    #[error("{0}")]
    Validation(String),

    /// The server answered with a failure status
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-provided or fallback message
        message: String,
    },

    /// The request did not complete
    #[error("Network error: {0}")]
    Transport(String),

    /// The token store could not be read or written
    #[error("Session token error: {0}")]
    Token(String),
}

impl From<reqwest::Error> for AccountError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
