use super::{ServiceError, body_message, build_agent, decode_json, get_json, map_call_error};
use crate::chess::CanonicalGame;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static PARTIAL_COUNTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) succeeded, (\d+) failed").expect("valid partial counts regex")
});
static IMPORTED_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)imported (\d+) games?").expect("valid imported count regex"));

const MULTI_STATUS: u16 = 207;

/// The three server-side calls the export flow depends on.
pub trait ImportProxy {
    fn confirm_password(&self, password: &str) -> Result<bool, ServiceError>;

    /// URLs of the given games that already exist in the database.
    fn check_duplicates(
        &self,
        games: &[CanonicalGame],
        database_id: &str,
    ) -> Result<Vec<String>, ServiceError>;

    fn import_games(
        &self,
        games: &[CanonicalGame],
        database_id: &str,
    ) -> Result<ImportStatus, ServiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    Success {
        imported: usize,
        message: String,
    },
    Partial {
        imported: Option<usize>,
        failed: Option<usize>,
        message: String,
    },
    Failed {
        message: String,
    },
}

impl ImportStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportStatus::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            ImportStatus::Success { message, .. }
            | ImportStatus::Partial { message, .. }
            | ImportStatus::Failed { message } => message,
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub imported_count: Option<usize>,
    pub failed_count: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub success: bool,
    pub message: String,
    pub duplicate_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxyEnv {
    pub notion_api_key: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GamesRequest<'a> {
    games: &'a [CanonicalGame],
    database_id: &'a str,
}

#[derive(Serialize)]
struct PasswordRequest<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    #[serde(default)]
    is_confirmed: bool,
}

/// Maps an import-endpoint reply onto [`ImportStatus`].
///
/// `207` is a partial import. Counts come from the body fields when the
/// proxy sends them, otherwise from its message. Any other non-success
/// reply is a total failure.
pub fn interpret_import_response(
    status: u16,
    body: &ImportResponse,
    submitted: usize,
) -> ImportStatus {
    let message = body.message.clone();

    if status == MULTI_STATUS {
        let parsed = PARTIAL_COUNTS_RE
            .captures(&body.message)
            .map(|caps| (caps[1].parse().ok(), caps[2].parse().ok()));
        let (parsed_imported, parsed_failed) = parsed.unwrap_or((None, None));
        return ImportStatus::Partial {
            imported: body.imported_count.or(parsed_imported),
            failed: body.failed_count.or(parsed_failed),
            message,
        };
    }

    if (200..300).contains(&status) && body.success {
        let imported = body
            .imported_count
            .or_else(|| {
                IMPORTED_COUNT_RE
                    .captures(&body.message)
                    .and_then(|caps| caps[1].parse().ok())
            })
            .unwrap_or(submitted);
        return ImportStatus::Success { imported, message };
    }

    if message.trim().is_empty() {
        return ImportStatus::Failed {
            message: format!("Import failed with HTTP {status}."),
        };
    }
    ImportStatus::Failed { message }
}

/// Client for the serverless proxy that holds the Notion credentials.
pub struct NotionProxy {
    agent: ureq::Agent,
    base_url: String,
}

impl NotionProxy {
    pub fn new(base_url: &str) -> Self {
        Self {
            agent: build_agent(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/api/{name}", self.base_url)
    }

    /// Whether the proxy has a Notion API key configured.
    pub fn env_status(&self) -> Result<ProxyEnv, ServiceError> {
        get_json(&self.agent, &self.endpoint("env"))
    }
}

impl ImportProxy for NotionProxy {
    fn confirm_password(&self, password: &str) -> Result<bool, ServiceError> {
        let url = self.endpoint("password");
        let response = self
            .agent
            .post(&url)
            .send_json(PasswordRequest { password })
            .map_err(|err| map_call_error(&url, err))?;
        let reply: PasswordResponse = decode_json(&url, response)?;
        debug!(confirmed = reply.is_confirmed, "password check");
        Ok(reply.is_confirmed)
    }

    fn check_duplicates(
        &self,
        games: &[CanonicalGame],
        database_id: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let url = self.endpoint("notion-check-duplicates");
        let response = self
            .agent
            .post(&url)
            .send_json(GamesRequest { games, database_id })
            .map_err(|err| map_call_error(&url, err))?;
        let check: DuplicateCheck = decode_json(&url, response)?;

        if !check.success {
            return Err(ServiceError::Rejected(check.message));
        }
        debug!(checked = games.len(), duplicates = check.duplicate_urls.len(), "duplicate check");
        Ok(check.duplicate_urls)
    }

    fn import_games(
        &self,
        games: &[CanonicalGame],
        database_id: &str,
    ) -> Result<ImportStatus, ServiceError> {
        let url = self.endpoint("notion-import-games");
        let (status, body) = match self
            .agent
            .post(&url)
            .send_json(GamesRequest { games, database_id })
        {
            Ok(response) => {
                let status = response.status();
                (status, decode_json::<ImportResponse>(&url, response)?)
            }
            Err(ureq::Error::Status(status, response)) => {
                let raw = response.into_string().unwrap_or_default();
                let body = serde_json::from_str::<ImportResponse>(&raw).unwrap_or_else(|_| {
                    ImportResponse {
                        message: body_message(&raw).unwrap_or_default(),
                        ..ImportResponse::default()
                    }
                });
                (status, body)
            }
            Err(err) => return Err(map_call_error(&url, err)),
        };

        let outcome = interpret_import_response(status, &body, games.len());
        match &outcome {
            ImportStatus::Success { imported, .. } => info!(imported, "import finished"),
            ImportStatus::Partial { imported, failed, .. } => {
                warn!(?imported, ?failed, "import partially failed")
            }
            ImportStatus::Failed { message } => warn!(status, reason = %message, "import failed"),
        }
        Ok(outcome)
    }
}
