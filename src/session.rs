//! Selection list of games awaiting export, and the export flow itself.

use crate::chess::headers::result_tag;
use crate::chess::outcome::result_for_color;
use crate::chess::{CanonicalGame, GameType, UserColor};
use crate::services::ServiceError;
use crate::services::proxy::{ImportProxy, ImportStatus};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please assign your color (White/Black) for all games.")]
    MissingColor,
    #[error("Notion Database ID not set in settings.")]
    MissingDatabaseId,
    #[error("No games selected to import.")]
    EmptySelection,
    #[error("Found {0} duplicate game(s). Please remove duplicates and try again.")]
    Duplicates(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Incorrect password.")]
    PasswordRejected,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Default)]
pub struct ImportSession {
    games: Vec<CanonicalGame>,
    duplicates: HashSet<String>,
    require_color: bool,
}

impl ImportSession {
    /// Session for pasted games, where the user must pick a side for each one.
    pub fn pasted() -> Self {
        Self {
            require_color: true,
            ..Self::default()
        }
    }

    /// Session for platform games, whose color comes from the username match.
    pub fn platform() -> Self {
        Self::default()
    }

    pub fn games(&self) -> &[CanonicalGame] {
        &self.games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn duplicates(&self) -> &HashSet<String> {
        &self.duplicates
    }

    pub fn is_duplicate(&self, url: &str) -> bool {
        self.duplicates.contains(url)
    }

    pub fn is_selected(&self, url: &str) -> bool {
        self.games.iter().any(|g| g.url == url)
    }

    /// Appends games not yet selected. Games whose URL is already present
    /// are handed back.
    pub fn add_games(
        &mut self,
        games: impl IntoIterator<Item = CanonicalGame>,
    ) -> Vec<CanonicalGame> {
        let mut rejected = Vec::new();
        for game in games {
            if self.is_selected(&game.url) {
                rejected.push(game);
            } else {
                self.games.push(game);
            }
        }

        if !rejected.is_empty() {
            debug!(rejected = rejected.len(), "skipped games already selected");
        }
        rejected
    }

    /// Selects or deselects `game`. Returns whether it is selected afterwards;
    /// known duplicates are left untouched.
    pub fn toggle(&mut self, game: &CanonicalGame) -> bool {
        if self.is_duplicate(&game.url) {
            return self.is_selected(&game.url);
        }

        match self.games.iter().position(|g| g.url == game.url) {
            Some(index) => {
                self.games.remove(index);
                false
            }
            None => {
                self.games.push(game.clone());
                true
            }
        }
    }

    /// Moves the game `active_id` to the slot currently held by `over_id`.
    pub fn move_game(&mut self, active_id: &str, over_id: &str) {
        let from = self.games.iter().position(|g| g.id == active_id);
        let to = self.games.iter().position(|g| g.id == over_id);
        if let (Some(from), Some(to)) = (from, to)
            && from != to
        {
            let game = self.games.remove(from);
            self.games.insert(to, game);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<CanonicalGame> {
        let index = self.games.iter().position(|g| g.id == id)?;
        let game = self.games.remove(index);
        if self.duplicates.remove(&game.url) {
            debug!(url = %game.url, remaining = self.duplicates.len(), "removed duplicate game");
        }
        Some(game)
    }

    /// Sets the user's side and re-derives the result from the `Result` tag.
    pub fn assign_color(&mut self, id: &str, color: UserColor) -> bool {
        let Some(game) = self.games.iter_mut().find(|g| g.id == id) else {
            return false;
        };
        game.user_color = color;
        game.user_result = result_for_color(result_tag(&game.pgn).as_deref(), color);
        true
    }

    pub fn set_game_type(&mut self, id: &str, game_type: GameType) -> bool {
        let Some(game) = self.games.iter_mut().find(|g| g.id == id) else {
            return false;
        };
        let (rated, guest) = match game_type {
            GameType::Rated => (true, false),
            GameType::Casual => (false, false),
            GameType::Guest => (false, true),
        };
        game.rated = rated;
        game.is_guest = Some(guest);
        true
    }

    /// Preconditions checked before any network call.
    pub fn validate_export(&self, database_id: Option<&str>) -> Result<(), ValidationError> {
        if self.require_color && self.games.iter().any(|g| g.user_color == UserColor::None) {
            return Err(ValidationError::MissingColor);
        }
        if database_id.is_none_or(|id| id.trim().is_empty()) {
            return Err(ValidationError::MissingDatabaseId);
        }
        if self.games.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        if !self.duplicates.is_empty() {
            return Err(ValidationError::Duplicates(self.duplicates.len()));
        }
        Ok(())
    }

    /// Validation, password gate, duplicate check, then the import itself.
    ///
    /// Duplicates found by the proxy are recorded and stop the flow. A fully
    /// successful import empties the session; anything else leaves it as is.
    pub fn export(
        &mut self,
        proxy: &impl ImportProxy,
        database_id: Option<&str>,
        password: &str,
    ) -> Result<ImportStatus, ExportError> {
        self.validate_export(database_id)?;
        let database_id = database_id.unwrap_or_default().trim();

        if !proxy.confirm_password(password)? {
            warn!("password rejected");
            return Err(ExportError::PasswordRejected);
        }

        let found = proxy.check_duplicates(&self.games, database_id)?;
        let found: HashSet<String> =
            found.into_iter().filter(|url| self.is_selected(url)).collect();
        if !found.is_empty() {
            let count = found.len();
            warn!(count, "duplicates already in the database");
            self.duplicates = found;
            return Err(ValidationError::Duplicates(count).into());
        }

        info!(games = self.games.len(), "exporting games");
        let status = proxy.import_games(&self.games, database_id)?;
        if status.is_success() {
            self.games.clear();
            self.duplicates.clear();
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{PlayerInfo, TimeClass, UserResult};
    use std::cell::RefCell;

    fn game(id: &str, result: &str) -> CanonicalGame {
        let url = format!("https://lichess.org/{id}");
        CanonicalGame {
            id: url.clone(),
            url,
            pgn: format!("[Event \"Casual game\"]\n[Result \"{result}\"]\n\n1. e4 e5 {result}"),
            time_control: "300".to_string(),
            time_class: TimeClass::Blitz,
            rated: false,
            is_guest: None,
            white: PlayerInfo {
                rating: 1500,
                username: "alice".to_string(),
                rating_diff: None,
            },
            black: PlayerInfo {
                rating: 1500,
                username: "bob".to_string(),
                rating_diff: None,
            },
            user_result: UserResult::Unknown,
            user_color: UserColor::None,
            end_time: 1_700_000_000,
        }
    }

    fn colored(id: &str) -> CanonicalGame {
        CanonicalGame {
            user_color: UserColor::White,
            ..game(id, "1-0")
        }
    }

    fn ids(session: &ImportSession) -> Vec<&str> {
        session.games().iter().map(|g| g.url.rsplit('/').next().unwrap_or("")).collect()
    }

    #[derive(Default)]
    struct FakeProxy {
        password_ok: bool,
        duplicates: Vec<String>,
        status: Option<ImportStatus>,
        calls: RefCell<Vec<&'static str>>,
    }

    impl FakeProxy {
        fn accepting() -> Self {
            Self {
                password_ok: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.borrow().clone()
        }
    }

    impl ImportProxy for FakeProxy {
        fn confirm_password(&self, _password: &str) -> Result<bool, ServiceError> {
            self.calls.borrow_mut().push("password");
            Ok(self.password_ok)
        }

        fn check_duplicates(
            &self,
            _games: &[CanonicalGame],
            _database_id: &str,
        ) -> Result<Vec<String>, ServiceError> {
            self.calls.borrow_mut().push("duplicates");
            Ok(self.duplicates.clone())
        }

        fn import_games(
            &self,
            games: &[CanonicalGame],
            _database_id: &str,
        ) -> Result<ImportStatus, ServiceError> {
            self.calls.borrow_mut().push("import");
            Ok(self.status.clone().unwrap_or(ImportStatus::Success {
                imported: games.len(),
                message: format!("Successfully imported {} games to Notion!", games.len()),
            }))
        }
    }

    #[test]
    fn test_add_games_rejects_already_selected() {
        let mut session = ImportSession::pasted();
        assert!(session.add_games([game("a", "1-0"), game("b", "0-1")]).is_empty());

        let rejected = session.add_games([game("b", "0-1"), game("c", "1-0"), game("c", "1-0")]);
        assert_eq!(rejected.len(), 2);
        assert_eq!(ids(&session), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_toggle() {
        let mut session = ImportSession::platform();
        let a = game("a", "1-0");
        assert!(session.toggle(&a));
        assert!(!session.toggle(&a));
        assert!(session.is_empty());
    }

    #[test]
    fn test_toggle_refuses_duplicates() {
        let mut session = ImportSession::platform();
        let a = game("a", "1-0");
        session.duplicates.insert(a.url.clone());
        assert!(!session.toggle(&a));
        assert!(session.is_empty());
    }

    #[test]
    fn test_move_game() {
        let mut session = ImportSession::platform();
        session.add_games([game("a", "1-0"), game("b", "1-0"), game("c", "1-0")]);

        session.move_game("https://lichess.org/a", "https://lichess.org/c");
        assert_eq!(ids(&session), vec!["b", "c", "a"]);

        session.move_game("https://lichess.org/a", "https://lichess.org/b");
        assert_eq!(ids(&session), vec!["a", "b", "c"]);

        session.move_game("https://lichess.org/zzz", "https://lichess.org/b");
        assert_eq!(ids(&session), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_shrinks_duplicate_set() {
        let mut session = ImportSession::platform();
        session.add_games([game("a", "1-0"), game("b", "1-0")]);
        session.duplicates.insert("https://lichess.org/a".to_string());
        session.duplicates.insert("https://lichess.org/b".to_string());

        assert!(session.remove("https://lichess.org/a").is_some());
        assert_eq!(session.duplicates().len(), 1);
        assert_eq!(
            session.validate_export(Some("db")),
            Err(ValidationError::Duplicates(1))
        );

        session.remove("https://lichess.org/b");
        assert!(session.duplicates().is_empty());
        assert!(session.remove("https://lichess.org/b").is_none());
    }

    #[test]
    fn test_assign_color_recomputes_result() {
        let mut session = ImportSession::pasted();
        session.add_games([game("a", "1-0"), game("b", "1/2-1/2"), game("c", "*")]);

        assert!(session.assign_color("https://lichess.org/a", UserColor::Black));
        assert!(session.assign_color("https://lichess.org/b", UserColor::White));
        assert!(session.assign_color("https://lichess.org/c", UserColor::White));
        assert!(!session.assign_color("https://lichess.org/missing", UserColor::White));

        let results: Vec<UserResult> = session.games().iter().map(|g| g.user_result).collect();
        assert_eq!(results, vec![UserResult::Loss, UserResult::Draw, UserResult::Unknown]);

        session.assign_color("https://lichess.org/a", UserColor::White);
        assert_eq!(session.games()[0].user_result, UserResult::Win);
    }

    #[test]
    fn test_set_game_type() {
        let mut session = ImportSession::pasted();
        session.add_games([game("a", "1-0")]);
        let id = "https://lichess.org/a";

        session.set_game_type(id, GameType::Rated);
        assert!(session.games()[0].rated);
        assert_eq!(session.games()[0].is_guest, Some(false));

        session.set_game_type(id, GameType::Guest);
        assert!(!session.games()[0].rated);
        assert_eq!(session.games()[0].is_guest, Some(true));

        session.set_game_type(id, GameType::Casual);
        assert!(!session.games()[0].rated);
        assert_eq!(session.games()[0].is_guest, Some(false));
    }

    #[test]
    fn test_validation_order() {
        let mut session = ImportSession::pasted();
        assert_eq!(session.validate_export(None), Err(ValidationError::MissingDatabaseId));
        assert_eq!(session.validate_export(Some("  ")), Err(ValidationError::MissingDatabaseId));
        assert_eq!(session.validate_export(Some("db")), Err(ValidationError::EmptySelection));

        session.add_games([game("a", "1-0")]);
        assert_eq!(session.validate_export(None), Err(ValidationError::MissingColor));

        session.assign_color("https://lichess.org/a", UserColor::White);
        assert_eq!(session.validate_export(Some("db")), Ok(()));
    }

    #[test]
    fn test_platform_session_skips_color_check() {
        let mut session = ImportSession::platform();
        session.add_games([game("a", "1-0")]);
        assert_eq!(session.validate_export(Some("db")), Ok(()));
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::MissingColor.to_string(),
            "Please assign your color (White/Black) for all games."
        );
        assert_eq!(
            ValidationError::Duplicates(2).to_string(),
            "Found 2 duplicate game(s). Please remove duplicates and try again."
        );
    }

    #[test]
    fn test_missing_color_makes_no_network_call() {
        let mut session = ImportSession::pasted();
        session.add_games([game("a", "1-0")]);
        let proxy = FakeProxy::accepting();

        let err = session.export(&proxy, Some("db"), "pw").unwrap_err();
        assert!(matches!(err, ExportError::Validation(ValidationError::MissingColor)));
        assert!(proxy.calls().is_empty());
    }

    #[test]
    fn test_wrong_password_stops_before_duplicate_check() {
        let mut session = ImportSession::pasted();
        session.add_games([colored("a")]);
        let proxy = FakeProxy::default();

        let err = session.export(&proxy, Some("db"), "nope").unwrap_err();
        assert!(matches!(err, ExportError::PasswordRejected));
        assert_eq!(proxy.calls(), vec!["password"]);
    }

    #[test]
    fn test_duplicates_stop_export_and_are_recorded() {
        let mut session = ImportSession::pasted();
        session.add_games([colored("a"), colored("b")]);
        let proxy = FakeProxy {
            duplicates: vec!["https://lichess.org/b".to_string()],
            ..FakeProxy::accepting()
        };

        let err = session.export(&proxy, Some("db"), "pw").unwrap_err();
        assert!(matches!(err, ExportError::Validation(ValidationError::Duplicates(1))));
        assert_eq!(proxy.calls(), vec!["password", "duplicates"]);
        assert!(session.is_duplicate("https://lichess.org/b"));
        assert_eq!(session.len(), 2);

        session.remove("https://lichess.org/b");
        let proxy = FakeProxy::accepting();
        let status = session.export(&proxy, Some("db"), "pw").unwrap();
        assert!(status.is_success());
        assert_eq!(proxy.calls(), vec!["password", "duplicates", "import"]);
    }

    #[test]
    fn test_success_clears_session() {
        let mut session = ImportSession::pasted();
        session.add_games([colored("a"), colored("b")]);
        let proxy = FakeProxy::accepting();

        let status = session.export(&proxy, Some("db"), "pw").unwrap();
        assert!(matches!(status, ImportStatus::Success { imported: 2, .. }));
        assert!(session.is_empty());
    }

    #[test]
    fn test_partial_failure_keeps_selection() {
        let mut session = ImportSession::pasted();
        session.add_games([colored("a"), colored("b")]);
        let proxy = FakeProxy {
            status: Some(ImportStatus::Partial {
                imported: Some(1),
                failed: Some(1),
                message: "Import partially failed. 1 succeeded, 1 failed.".to_string(),
            }),
            ..FakeProxy::accepting()
        };

        let status = session.export(&proxy, Some("db"), "pw").unwrap();
        assert!(matches!(status, ImportStatus::Partial { .. }));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_service_error_keeps_selection() {
        struct Offline;
        impl ImportProxy for Offline {
            fn confirm_password(&self, _password: &str) -> Result<bool, ServiceError> {
                Ok(true)
            }
            fn check_duplicates(
                &self,
                _games: &[CanonicalGame],
                _id: &str,
            ) -> Result<Vec<String>, ServiceError> {
                Err(ServiceError::Rejected("Failed to connect to Notion database.".to_string()))
            }
            fn import_games(
                &self,
                _games: &[CanonicalGame],
                _id: &str,
            ) -> Result<ImportStatus, ServiceError> {
                unreachable!("import after failed duplicate check")
            }
        }

        let mut session = ImportSession::pasted();
        session.add_games([colored("a")]);
        let err = session.export(&Offline, Some("db"), "pw").unwrap_err();
        assert_eq!(err.to_string(), "Failed to connect to Notion database.");
        assert_eq!(session.len(), 1);
        assert!(session.duplicates().is_empty());
    }
}
