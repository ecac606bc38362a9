use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use seat_trap::api::{create_request, GameApi, HttpGameApi, JoinGameRequest};
use seat_trap::config::{ClientConfig, DEFAULT_API_URL};
use seat_trap::domain::{default_seats, GameId, GameMode, PlayerId, SeatNumber};
use seat_trap::engine::{radius_for_viewport, LegalAction, PlayerRole};
use seat_trap::session::{GameSession, SessionUpdate};

const LOG_TARGET: &str = "bin::seat_trap_client";

#[derive(Debug, Parser)]
#[command(name = "seat_trap_client")]
#[command(about = "Terminal client for the seat trap game service", long_about = None)]
struct Cli {
    /// Game service base URL
    #[arg(long, env = "SEAT_TRAP_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Optional explicit realtime websocket URL (derived from the API URL otherwise)
    #[arg(long, env = "SEAT_TRAP_REALTIME_URL", global = true)]
    realtime_url: Option<String>,

    /// Local player identifier
    #[arg(long, env = "SEAT_TRAP_PLAYER_ID", global = true)]
    player_id: Option<PlayerId>,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "SEAT_TRAP_LOG_JSON", default_value_t = false, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new game with the default seats
    Create {
        #[arg(long, default_value_t = GameMode::Cpu)]
        mode: GameMode,
    },
    /// Join an existing game as the second player
    Join { game_id: GameId },
    /// Follow a game and play it from stdin
    Play {
        game_id: GameId,

        /// Width used to pick the seat circle radius
        #[arg(long, default_value_t = 1024)]
        viewport_width: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json)?;

    let cfg = build_config(&cli).context("failed to build client config")?;
    let player_id = cli
        .player_id
        .clone()
        .context("a player id is required (--player-id or SEAT_TRAP_PLAYER_ID)")?;

    match cli.command {
        Command::Create { mode } => create(&cfg, &player_id, mode).await,
        Command::Join { game_id } => join(&cfg, &player_id, &game_id).await,
        Command::Play {
            game_id,
            viewport_width,
        } => play(&cfg, player_id, game_id, radius_for_viewport(viewport_width)).await,
    }
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let cfg = ClientConfig::parse(&cli.api_url).context("invalid SEAT_TRAP_API_URL")?;
    match &cli.realtime_url {
        Some(url) => {
            let url = Url::parse(url).context("invalid SEAT_TRAP_REALTIME_URL")?;
            Ok(cfg.with_realtime_url(url))
        }
        None => Ok(cfg),
    }
}

async fn create(cfg: &ClientConfig, player_id: &str, mode: GameMode) -> Result<()> {
    let api = HttpGameApi::from_config(cfg)?;
    let game = api
        .create_game(create_request(player_id, mode, default_seats()))
        .await
        .context("failed to create game")?;
    info!(target: LOG_TARGET, game_id = %game.id, %mode, "game created");
    println!("{}", game.id);
    Ok(())
}

async fn join(cfg: &ClientConfig, player_id: &str, game_id: &str) -> Result<()> {
    let api = HttpGameApi::from_config(cfg)?;
    api.join_game(
        game_id,
        JoinGameRequest {
            player_id: player_id.to_string(),
        },
    )
    .await
    .with_context(|| format!("failed to join game {game_id}"))?;
    println!("joined {game_id}");
    Ok(())
}

async fn play(cfg: &ClientConfig, player_id: PlayerId, game_id: GameId, radius: f64) -> Result<()> {
    let session = GameSession::connect(cfg, game_id, player_id)?;
    run_session(session, BufReader::new(tokio::io::stdin()), radius).await
}

/// Drive `session` from `input` lines until quit, end of input or a lost channel.
async fn run_session<R>(mut session: GameSession, input: R, radius: f64) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    match session.initialize().await {
        Ok(update) => render(&session, &update, radius),
        // pushes may still bring the game in
        Err(err) => eprintln!("could not load game: {err}"),
    }

    let mut lines = input.lines();
    let outcome: Result<()> = loop {
        tokio::select! {
            update = session.next_update() => match update {
                Some(update) => render(&session, &update, radius),
                None => {
                    warn!(target: LOG_TARGET, game_id = %session.game_id(), "realtime updates stopped");
                    break Ok(());
                }
            },
            line = lines.next_line() => {
                let line = match line.context("failed to read stdin") {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(err) => break Err(err),
                };
                match line.trim() {
                    "" => {}
                    "q" | "quit" => break Ok(()),
                    input => match input.parse::<SeatNumber>() {
                        Ok(seat) => act(&mut session, seat).await,
                        Err(_) => println!("enter a seat number, or `q` to quit"),
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    // leave the game on every exit, errors included
    session.close().await;
    outcome
}

/// Send whichever move is legal right now for `seat`.
async fn act(session: &mut GameSession, seat: SeatNumber) {
    let Some(turn) = session.turn_view() else {
        println!("no game loaded yet");
        return;
    };
    let result = match turn.legal_action {
        LegalAction::PlaceTrap => session.place_trap(seat).await,
        LegalAction::SelectSeat => session.select_seat(seat).await,
        LegalAction::None => {
            println!("{}", turn.message);
            return;
        }
    };
    match result {
        Ok(()) => println!("{} on seat {seat} sent", turn.legal_action),
        Err(err) if err.is_suppressed() => println!("{err}"),
        Err(err) => eprintln!("request failed: {err}"),
    }
}

fn render(session: &GameSession, update: &SessionUpdate, radius: f64) {
    let game = &update.game;
    if update.trap_sprung {
        println!("*** TRAPPED! your score was reset ***");
    }
    println!("[{:?}] {}", game.status, update.turn.message);

    if let Some(board) = session.scoreboard() {
        let role = match board.role {
            PlayerRole::First => "player 1",
            PlayerRole::Second => "player 2",
        };
        println!(
            "you ({role}): {} pts, {} failures | opponent: {} pts, {} failures",
            board.mine.score, board.mine.failures, board.opponent.score, board.opponent.failures
        );
    }

    let seats = session
        .layout(radius)
        .iter()
        .map(|p| format!("{}@{:.0}°", p.seat, p.angle_degrees))
        .collect::<Vec<_>>()
        .join(" ");
    println!("seats: {seats}");

    if let Some(err) = session.last_error() {
        println!("last error: {err}");
    }
}
