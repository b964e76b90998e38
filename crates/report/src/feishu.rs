//! Feishu Open API client.
//!
//! Obtains a tenant access token from the app credentials and delivers
//! interactive cards to a user by open id.

use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use stockcard_core::{config::FeishuConfig, Error, Result};
use tracing::{debug, info};

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";
const MESSAGE_PATH: &str = "/open-apis/im/v1/messages";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Token endpoint reply. Fields sit at the top level.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    tenant_access_token: Option<String>,
}

/// Standard `{code, msg, data}` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    message_id: String,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

/// Blocking Feishu client.
pub struct FeishuClient {
    client: Client,
    base_url: String,
    app_id: String,
    app_secret: SecretString,
}

impl std::fmt::Debug for FeishuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuClient")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl FeishuClient {
    /// Build a client. Both credentials must be configured.
    pub fn new(config: &FeishuConfig) -> Result<Self> {
        let app_id = config
            .app_id
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config("feishu app_id is not configured"))?;
        let app_secret = config
            .app_secret
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config("feishu app_secret is not configured"))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::messaging(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id,
            app_secret: SecretString::new(app_secret.into()),
        })
    }

    /// Request a tenant access token.
    pub fn tenant_token(&self) -> Result<String> {
        let body = TokenRequest {
            app_id: &self.app_id,
            app_secret: self.app_secret.expose_secret(),
        };
        let response: TokenResponse = self.post(TOKEN_PATH, &[], None, &body)?;
        let token = parse_token(response)?;
        debug!("tenant token acquired");
        Ok(token)
    }

    /// Send an interactive card to `open_id` and return the message id.
    pub fn send_card(&self, open_id: &str, card: &Value) -> Result<String> {
        let token = self.tenant_token()?;
        let body = message_body(open_id, card)?;
        let response: Envelope<MessageData> = self.post(
            MESSAGE_PATH,
            &[("receive_id_type", "open_id")],
            Some(&token),
            &body,
        )?;
        let message_id = parse_message(response)?;
        info!(%open_id, %message_id, "card sent");
        Ok(message_id)
    }

    fn post<B, R>(&self, path: &str, query: &[(&str, &str)], token: Option<&str>, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .query(query)
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| Error::messaging(format!("{path}: {e}")))?;
        let text = response
            .text()
            .map_err(|e| Error::messaging(format!("{path}: {e}")))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::messaging(format!("{path}: unexpected response: {e}")))
    }
}

/// Message request body. The card travels as a JSON string.
fn message_body(open_id: &str, card: &Value) -> Result<Value> {
    Ok(json!({
        "receive_id": open_id,
        "msg_type": "interactive",
        "content": serde_json::to_string(card)?,
    }))
}

fn parse_token(response: TokenResponse) -> Result<String> {
    if response.code != 0 {
        return Err(Error::messaging(format!(
            "token request failed: {} (code {})",
            response.msg, response.code
        )));
    }
    response
        .tenant_access_token
        .ok_or_else(|| Error::messaging("token response without tenant_access_token"))
}

fn parse_message(response: Envelope<MessageData>) -> Result<String> {
    if response.code != 0 {
        return Err(Error::messaging(format!(
            "send failed: {} (code {})",
            response.msg, response.code
        )));
    }
    response
        .data
        .map(|d| d.message_id)
        .ok_or_else(|| Error::messaging("message response without data"))
}
