#![forbid(unsafe_code)]

use anyhow::{Context, Result, bail};
use chess_notion::chess::input::{CompressionMode, read_pgn_inputs};
use chess_notion::chess::{
    CanonicalGame, GameType, NormalizeContext, UserColor, parse_from_chess_com_api,
    parse_from_lichess_api, parse_pasted_batch,
};
use chess_notion::logging::init_tracing;
use chess_notion::services::chesscom::ChessComClient;
use chess_notion::services::lichess::{LichessClient, generate_monthly_archives};
use chess_notion::services::proxy::{ImportStatus, NotionProxy};
use chess_notion::session::{ExportError, ImportSession, ValidationError};
use chess_notion::settings::Settings;
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

const PASSWORD_ENV: &str = "CHESS_NOTION_PASSWORD";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "chess-notion: normalize chess games and import them into Notion",
    long_about = None
)]
struct Cli {
    /// Settings file (defaults to the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Notion database id (overrides settings).
    #[arg(long, global = true)]
    database_id: Option<String>,

    /// Proxy base URL (overrides settings).
    #[arg(long, global = true)]
    proxy_url: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse pasted PGN text and print the canonical games as JSON.
    Parse(InputArgs),

    /// Browse Chess.com archives for the configured user.
    #[command(subcommand)]
    Chesscom(ChessComCommand),

    /// Browse Lichess months for the configured user.
    #[command(subcommand)]
    Lichess(LichessCommand),

    /// Import pasted PGN games into the Notion database.
    Import(ImportArgs),

    /// Import one month of platform games into the Notion database.
    ExportMonth(ExportMonthArgs),

    /// Check whether the proxy has a Notion API key configured.
    ProxyStatus,
}

#[derive(Subcommand, Debug)]
enum ChessComCommand {
    /// List monthly archive URLs, newest first.
    Archives,
    /// Print the normalized games of one archive.
    Games { archive_url: String },
    /// Print the normalized games of every archive.
    All,
}

#[derive(Subcommand, Debug)]
enum LichessCommand {
    /// List months since account creation, newest first.
    Months,
    /// Print the normalized games of one month (YYYY/MM).
    Games { month: String },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// File, glob pattern, or '-' for stdin.
    input: String,

    /// Input compression: auto or zstd.
    #[arg(long, default_value = "auto")]
    compression: String,
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Your side in every imported game.
    #[arg(long)]
    color: Option<ColorArg>,

    /// Game type applied to every imported game.
    #[arg(long = "type")]
    game_type: Option<GameTypeArg>,

    /// Import password (falls back to CHESS_NOTION_PASSWORD).
    #[arg(long)]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct ExportMonthArgs {
    source: SourceArg,

    /// Chess.com archive URL or Lichess month (YYYY/MM).
    archive: String,

    /// Only import games with these URLs.
    #[arg(long)]
    only: Vec<String>,

    /// Import password (falls back to CHESS_NOTION_PASSWORD).
    #[arg(long)]
    password: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ColorArg {
    White,
    Black,
}

impl From<ColorArg> for UserColor {
    fn from(color: ColorArg) -> Self {
        match color {
            ColorArg::White => UserColor::White,
            ColorArg::Black => UserColor::Black,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GameTypeArg {
    Rated,
    Casual,
    Guest,
}

impl From<GameTypeArg> for GameType {
    fn from(game_type: GameTypeArg) -> Self {
        match game_type {
            GameTypeArg::Rated => GameType::Rated,
            GameTypeArg::Casual => GameType::Casual,
            GameTypeArg::Guest => GameType::Guest,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SourceArg {
    Chesscom,
    Lichess,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe(game: &CanonicalGame) -> String {
    let side = match game.user_player() {
        Some(me) => format!("{} as {} ({})", game.user_result, game.user_color, me.rating),
        None => game.user_result.to_string(),
    };
    format!(
        "{} {} vs {} [{} {}] {}",
        game.platform(),
        game.white.username,
        game.black.username,
        game.time_class,
        game.time_control,
        side
    )
}

fn require<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        bail!("{what} not set in settings.");
    }
    Ok(value)
}

fn parse_inputs(args: &InputArgs, ctx: &NormalizeContext) -> Result<Vec<CanonicalGame>> {
    let compression = CompressionMode::parse(&args.compression)?;
    let mut games = Vec::new();
    let mut failed = 0;

    for input in read_pgn_inputs(&args.input, compression)? {
        let mut batch = parse_pasted_batch(&input.text, ctx);
        debug!(
            source = %input.source,
            parsed = batch.games.len(),
            failed = batch.failed,
            "parsed input"
        );
        failed += batch.failed;
        if let Some(errors) = batch.errors.take() {
            warn!(source = %input.source, %errors, "some games could not be parsed");
        }
        games.append(&mut batch.games);
    }

    if failed > 0 {
        warn!(parsed = games.len(), failed, "skipped unparsable games");
    }
    Ok(games)
}

fn run_chesscom(
    command: ChessComCommand,
    settings: &Settings,
    ctx: &NormalizeContext,
) -> Result<()> {
    let client = ChessComClient::default();
    match command {
        ChessComCommand::Archives => {
            let username = require(&settings.chess_com_username, "Chess.com username")?;
            for archive in client.get_player_archives(username)? {
                println!("{archive}");
            }
            Ok(())
        }
        ChessComCommand::Games { archive_url } => {
            let games: Vec<CanonicalGame> = client
                .get_games_from_archive(&archive_url)?
                .iter()
                .map(|raw| parse_from_chess_com_api(raw, ctx))
                .collect();
            print_json(&games)
        }
        ChessComCommand::All => {
            let username = require(&settings.chess_com_username, "Chess.com username")?;
            let raw = client.fetch_all_games(username, |done, total| {
                info!(done, total, "fetched archive");
            })?;
            let games: Vec<CanonicalGame> =
                raw.iter().map(|raw| parse_from_chess_com_api(raw, ctx)).collect();
            print_json(&games)
        }
    }
}

fn run_lichess(command: LichessCommand, settings: &Settings, ctx: &NormalizeContext) -> Result<()> {
    let client = LichessClient::default();
    let username = require(&settings.lichess_username, "Lichess username")?;
    match command {
        LichessCommand::Months => {
            let user = client.get_user(username)?;
            for month in generate_monthly_archives(user.created_at, Local::now().date_naive()) {
                println!("{month}");
            }
            Ok(())
        }
        LichessCommand::Games { month } => {
            let games: Vec<CanonicalGame> = client
                .get_games_for_month(username, &month)?
                .iter()
                .map(|raw| parse_from_lichess_api(raw, ctx))
                .collect();
            print_json(&games)
        }
    }
}

fn run_export(
    session: &mut ImportSession,
    settings: &Settings,
    password: Option<String>,
) -> Result<()> {
    for game in session.games() {
        println!("{}", describe(game));
    }

    let proxy = NotionProxy::new(&settings.proxy_base_url);
    let password = password.or_else(|| env::var(PASSWORD_ENV).ok()).unwrap_or_default();

    match session.export(&proxy, settings.database_id(), &password) {
        Ok(ImportStatus::Success { message, .. }) => {
            println!("{message}");
            Ok(())
        }
        Ok(status) => bail!("{status}"),
        Err(ExportError::Validation(ValidationError::Duplicates(count))) => {
            for url in session.duplicates() {
                println!("duplicate: {url}");
            }
            bail!(ValidationError::Duplicates(count))
        }
        Err(err) => Err(err.into()),
    }
}

fn run_import(args: ImportArgs, settings: &Settings, ctx: &NormalizeContext) -> Result<()> {
    let games = parse_inputs(&args.input, ctx)?;
    let mut session = ImportSession::pasted();
    let rejected = session.add_games(games);
    if !rejected.is_empty() {
        warn!(count = rejected.len(), "duplicate game(s) found in the input");
    }

    let ids: Vec<String> = session.games().iter().map(|g| g.id.clone()).collect();
    for id in &ids {
        if let Some(color) = args.color {
            session.assign_color(id, color.into());
        }
        if let Some(game_type) = args.game_type {
            session.set_game_type(id, game_type.into());
        }
    }

    run_export(&mut session, settings, args.password)
}

fn run_export_month(
    args: ExportMonthArgs,
    settings: &Settings,
    ctx: &NormalizeContext,
) -> Result<()> {
    let games: Vec<CanonicalGame> = match args.source {
        SourceArg::Chesscom => ChessComClient::default()
            .get_games_from_archive(&args.archive)?
            .iter()
            .map(|raw| parse_from_chess_com_api(raw, ctx))
            .collect(),
        SourceArg::Lichess => {
            let username = require(&settings.lichess_username, "Lichess username")?;
            LichessClient::default()
                .get_games_for_month(username, &args.archive)?
                .iter()
                .map(|raw| parse_from_lichess_api(raw, ctx))
                .collect()
        }
    };

    let selected = games
        .into_iter()
        .filter(|g| args.only.is_empty() || args.only.contains(&g.url));
    let mut session = ImportSession::platform();
    session.add_games(selected);

    run_export(&mut session, settings, args.password)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(database_id) = &cli.database_id {
        settings.notion_database_id = database_id.clone();
    }
    if let Some(proxy_url) = &cli.proxy_url {
        settings.proxy_base_url = proxy_url.clone();
    }
    Ok(settings)
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let ctx = NormalizeContext::from_settings(&settings);

    match cli.command {
        Commands::Parse(args) => print_json(&parse_inputs(&args, &ctx)?),
        Commands::Chesscom(command) => run_chesscom(command, &settings, &ctx),
        Commands::Lichess(command) => run_lichess(command, &settings, &ctx),
        Commands::Import(args) => run_import(args, &settings, &ctx),
        Commands::ExportMonth(args) => run_export_month(args, &settings, &ctx),
        Commands::ProxyStatus => {
            let env = NotionProxy::new(&settings.proxy_base_url).env_status()?;
            let state = if env.notion_api_key { "configured" } else { "missing" };
            println!("Notion API key: {state}");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "command failed");
    }
    result
}
