//! Account REST Client
//!
//! # Endpoints
//!
//! - `POST /auth/forgot-password` - `{email}`
//! - `POST /auth/reset-password` - `{token, new_password}`
//! - `GET /auth/me` - bearer
//! - `GET /subscriptions/plans`
//! - `POST /subscriptions/subscribe` - `{plan_type}`, bearer
//! - `POST /subscriptions/cancel` - bearer
//!
//! Failures carry the server's `error` field when it sends one, otherwise a
//! fixed message per operation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::token::TokenProvider;
use super::AccountError;

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 6;

const FORGOT_FAILED: &str = "Failed to send reset email";
const RESET_FAILED: &str = "Failed to reset password";
const ME_FAILED: &str = "Failed to fetch subscription";
const PLANS_FAILED: &str = "Failed to fetch plans";
const SUBSCRIBE_FAILED: &str = "Failed to subscribe";
const CANCEL_FAILED: &str = "Failed to cancel subscription";

/// Generic `{message, error}` reply
#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// An active or past subscription
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Plan identifier
    pub plan_type: String,
    /// e.g. `active`, `canceled`
    pub status: String,
    /// Expiry timestamp as the server sent it
    #[serde(default)]
    pub end_date: Option<String>,
}

impl Subscription {
    /// Expiry date, if the server sent one in a recognizable format
    pub fn expires_on(&self) -> Option<NaiveDate> {
        let raw = self.end_date.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| dt.date())
            .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
    }
}

/// The signed-in account
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Current subscription, if any
    #[serde(default)]
    pub subscription: Option<Subscription>,
}

/// A purchasable plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Identifier passed to [`AccountClient::subscribe`]
    pub id: String,
    /// Display name
    pub name: String,
    /// Price per period
    pub price: f64,
    /// Feature bullet points
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlansReply {
    #[serde(default)]
    plans: Vec<Plan>,
}

/// Check a new password before it is sent
///
/// # Errors
///
/// [`AccountError::Validation`] if the two entries differ or the password is
/// shorter than [`MIN_PASSWORD_LEN`] characters.
pub fn validate_new_password(new_password: &str, confirm: &str) -> Result<(), AccountError> {
    if new_password != confirm {
        return Err(AccountError::Validation("Passwords don't match".to_string()));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Client for the auth and subscription endpoints
#[derive(Clone)]
pub struct AccountClient {
    base_url: String,
    http_client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl AccountClient {
    /// Create a new client
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, AccountError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http_client, tokens))
    }

    /// Create a client around an existing HTTP client
    pub fn with_client(
        base_url: impl Into<String>,
        http_client: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            tokens,
        }
    }

    /// The token provider in use
    pub fn tokens(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn bearer(&self) -> Result<String, AccountError> {
        self.tokens
            .token()
            .await?
            .ok_or(AccountError::NotAuthenticated)
    }

    /// Ask for a password reset email; returns the server's confirmation
    pub async fn forgot_password(&self, email: &str) -> Result<String, AccountError> {
        let response = self
            .http_client
            .post(self.url("/auth/forgot-password"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;
        let reply = expect_ok(response, FORGOT_FAILED).await?;
        Ok(reply
            .message
            .unwrap_or_else(|| "Reset email sent".to_string()))
    }

    /// Set a new password using an emailed reset token
    ///
    /// The password pair is validated before anything is sent.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<String, AccountError> {
        validate_new_password(new_password, confirm)?;

        let response = self
            .http_client
            .post(self.url("/auth/reset-password"))
            .json(&serde_json::json!({ "token": token, "new_password": new_password }))
            .send()
            .await?;
        let reply = expect_ok(response, RESET_FAILED).await?;
        Ok(reply
            .message
            .unwrap_or_else(|| "Password reset successfully".to_string()))
    }

    /// The signed-in account and its subscription
    pub async fn me(&self) -> Result<AccountInfo, AccountError> {
        let token = self.bearer().await?;
        let response = self
            .http_client
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await?;
        parse_ok(response, ME_FAILED).await
    }

    /// Available plans; a reply without a list yields none
    pub async fn plans(&self) -> Result<Vec<Plan>, AccountError> {
        let response = self
            .http_client
            .get(self.url("/subscriptions/plans"))
            .send()
            .await?;
        let reply: PlansReply = parse_ok(response, PLANS_FAILED).await?;
        Ok(reply.plans)
    }

    /// Subscribe to a plan
    pub async fn subscribe(&self, plan_type: &str) -> Result<String, AccountError> {
        let token = self.bearer().await?;
        let response = self
            .http_client
            .post(self.url("/subscriptions/subscribe"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "plan_type": plan_type }))
            .send()
            .await?;
        expect_ok(response, SUBSCRIBE_FAILED).await?;
        tracing::info!(plan = plan_type, "Subscription activated");
        Ok("Subscription activated successfully!".to_string())
    }

    /// Cancel the current subscription
    pub async fn cancel(&self) -> Result<String, AccountError> {
        let token = self.bearer().await?;
        let response = self
            .http_client
            .post(self.url("/subscriptions/cancel"))
            .bearer_auth(token)
            .send()
            .await?;
        expect_ok(response, CANCEL_FAILED).await?;
        tracing::info!("Subscription canceled");
        Ok("Subscription canceled".to_string())
    }
}

/// Read a `{message, error}` reply, mapping non-2xx to [`AccountError::Api`]
async fn expect_ok(response: reqwest::Response, fallback: &str) -> Result<ApiReply, AccountError> {
    let status = response.status();
    let body = response.text().await?;
    let reply: ApiReply = serde_json::from_str(&body).unwrap_or_default();

    if status.is_success() {
        Ok(reply)
    } else {
        tracing::warn!(status = status.as_u16(), "Account request failed");
        Err(AccountError::Api {
            status: status.as_u16(),
            message: reply.error.unwrap_or_else(|| fallback.to_string()),
        })
    }
}

/// Parse a typed success body, mapping non-2xx like [`expect_ok`]
async fn parse_ok<T>(response: reqwest::Response, fallback: &str) -> Result<T, AccountError>
where
    T: serde::de::DeserializeOwned + Default,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let reply: ApiReply = serde_json::from_str(&body).unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Account request failed");
        return Err(AccountError::Api {
            status: status.as_u16(),
            message: reply.error.unwrap_or_else(|| fallback.to_string()),
        });
    }

    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&body).map_err(|e| AccountError::Transport(e.to_string()))
}
