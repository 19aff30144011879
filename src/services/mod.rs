//! HTTP collaborators: public platform APIs and the Notion proxy.
//!
//! Every call is blocking and issued one at a time; there is no retry.

pub mod chesscom;
pub mod lichess;
pub mod proxy;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("chess-notion/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{message} (HTTP {status})")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("invalid archive month '{0}', expected YYYY/MM")]
    InvalidMonth(String),
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// The `message` field of a JSON error body, when there is one.
fn body_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

pub(crate) fn build_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
}

pub(crate) fn map_call_error(url: &str, err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::Status(status, response) => {
            let status_text = response.status_text().to_string();
            let body = response.into_string().unwrap_or_default();
            ServiceError::Status {
                url: url.to_string(),
                status,
                message: body_message(&body).unwrap_or(status_text),
            }
        }
        ureq::Error::Transport(transport) => ServiceError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(
    url: &str,
    response: ureq::Response,
) -> Result<T, ServiceError> {
    response.into_json::<T>().map_err(|err| ServiceError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

pub(crate) fn get_json<T: DeserializeOwned>(
    agent: &ureq::Agent,
    url: &str,
) -> Result<T, ServiceError> {
    let response = agent
        .get(url)
        .set("Accept", "application/json")
        .call()
        .map_err(|err| map_call_error(url, err))?;
    decode_json(url, response)
}
