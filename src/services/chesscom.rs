use super::{ServiceError, build_agent, get_json};
use crate::chess::ChessComGame;
use serde::Deserialize;
use tracing::{debug, info};

pub const CHESS_COM_API: &str = "https://api.chess.com/pub";

#[derive(Debug, Deserialize)]
struct ArchivesResponse {
    #[serde(default)]
    archives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GamesResponse {
    #[serde(default)]
    games: Vec<ChessComGame>,
}

pub struct ChessComClient {
    agent: ureq::Agent,
    base_url: String,
}

impl Default for ChessComClient {
    fn default() -> Self {
        Self::with_base_url(CHESS_COM_API)
    }
}

impl ChessComClient {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            agent: build_agent(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Monthly archive URLs, newest first.
    pub fn get_player_archives(&self, username: &str) -> Result<Vec<String>, ServiceError> {
        let url = format!("{}/player/{}/games/archives", self.base_url, username.trim());
        let response: ArchivesResponse = get_json(&self.agent, &url)?;
        debug!(username, count = response.archives.len(), "fetched archive list");
        Ok(newest_first(response.archives))
    }

    pub fn get_games_from_archive(
        &self,
        archive_url: &str,
    ) -> Result<Vec<ChessComGame>, ServiceError> {
        let response: GamesResponse = get_json(&self.agent, archive_url)?;
        debug!(archive = archive_url, count = response.games.len(), "fetched archive games");
        Ok(response.games)
    }

    /// Walks every archive one request at a time, reporting `(done, total)`
    /// after each archive.
    pub fn fetch_all_games(
        &self,
        username: &str,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<Vec<ChessComGame>, ServiceError> {
        let archives = self.get_player_archives(username)?;
        let total = archives.len();
        let mut games = Vec::new();

        for (index, archive) in archives.iter().enumerate() {
            games.extend(self.get_games_from_archive(archive)?);
            on_progress(index + 1, total);
        }

        info!(username, archives = total, games = games.len(), "fetched all archives");
        Ok(games)
    }
}

/// The API lists archives oldest first.
pub fn newest_first(mut archives: Vec<String>) -> Vec<String> {
    archives.reverse();
    archives
}
