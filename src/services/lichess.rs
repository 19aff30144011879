use super::{ServiceError, build_agent, get_json, map_call_error};
use crate::chess::LichessGame;
use chrono::{DateTime, Datelike, Local, Months, NaiveDate, NaiveDateTime, TimeZone};
use serde::Deserialize;
use tracing::{debug, warn};

pub const LICHESS_API: &str = "https://lichess.org/api";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LichessUser {
    pub id: String,
    pub username: String,
    /// Account creation, milliseconds since the epoch.
    #[serde(default)]
    pub created_at: i64,
}

pub struct LichessClient {
    agent: ureq::Agent,
    base_url: String,
}

impl Default for LichessClient {
    fn default() -> Self {
        Self::with_base_url(LICHESS_API)
    }
}

impl LichessClient {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            agent: build_agent(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn get_user(&self, username: &str) -> Result<LichessUser, ServiceError> {
        let url = format!("{}/user/{}", self.base_url, username.trim());
        get_json(&self.agent, &url)
    }

    /// Games finished within `year_month` (`"YYYY/MM"`), in local time.
    pub fn get_games_for_month(
        &self,
        username: &str,
        year_month: &str,
    ) -> Result<Vec<LichessGame>, ServiceError> {
        let (since, until) = month_bounds(year_month)
            .ok_or_else(|| ServiceError::InvalidMonth(year_month.to_string()))?;
        let url = format!(
            "{}/games/user/{}?since={since}&until={until}&pgnInJson=true",
            self.base_url,
            username.trim()
        );

        let body = self
            .agent
            .get(&url)
            .set("Accept", "application/x-ndjson")
            .call()
            .map_err(|err| map_call_error(&url, err))?
            .into_string()
            .map_err(|err| ServiceError::Decode {
                url: url.clone(),
                message: err.to_string(),
            })?;

        let games = parse_ndjson(&body);
        debug!(username, month = year_month, count = games.len(), "fetched lichess games");
        Ok(games)
    }
}

/// One game per line; unparsable lines are logged and skipped.
pub fn parse_ndjson(body: &str) -> Vec<LichessGame> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str::<LichessGame>(line) {
            Ok(game) => Some(game),
            Err(err) => {
                warn!(line = index + 1, error = %err, "skipping unparsable game line");
                None
            }
        })
        .collect()
}

/// Every month from the account's creation month up to `today`, most recent first.
pub fn generate_monthly_archives(created_at_ms: i64, today: NaiveDate) -> Vec<String> {
    let Some(created) = DateTime::from_timestamp_millis(created_at_ms) else {
        return Vec::new();
    };
    let created = created.with_timezone(&Local).date_naive();

    let (Some(mut current), Some(end)) = (created.with_day(1), today.with_day(1)) else {
        return Vec::new();
    };

    let mut archives = Vec::new();
    while current <= end {
        archives.push(format!("{:04}/{:02}", current.year(), current.month()));
        let Some(next) = current.checked_add_months(Months::new(1)) else {
            break;
        };
        current = next;
    }

    archives.reverse();
    archives
}

fn parse_year_month(year_month: &str) -> Option<NaiveDate> {
    let (year, month) = year_month.trim().split_once('/')?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

fn local_millis(naive: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
        .timestamp_millis()
}

/// `(since, until)` in epoch milliseconds: first day 00:00:00 through last
/// day 23:59:59 of the month.
pub fn month_bounds(year_month: &str) -> Option<(i64, i64)> {
    let first = parse_year_month(year_month)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    let since = local_millis(first.and_hms_opt(0, 0, 0)?);
    let until = local_millis(last.and_hms_opt(23, 59, 59)?);
    Some((since, until))
}
