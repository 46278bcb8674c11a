use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use log::{info, warn};
use tokio::sync::mpsc;

mod app;
mod artifact;
mod audio;
mod config;
mod controller;
mod error;
mod exchange;
mod handler;
mod identity;
mod storage;
mod transcript;
mod tui;
mod ui;

use app::App;
use artifact::Artifact;
use audio::{AudioPlayer, CommandPlayer, SilentPlayer};
use config::Config;
use controller::ChatController;
use error::ChatError;
use exchange::ChatClient;
use identity::IdentityProvider;
use storage::FileStorage;

#[derive(Parser)]
#[command(name = "artifact-chat")]
#[command(version, about = "Chat with a museum artifact from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Chat server base URL (the client posts to <server>/chat)
    #[arg(long, env = "ARTIFACT_CHAT_SERVER", global = true)]
    server: Option<String>,

    /// Artifact persona to talk to (a or b)
    #[arg(long, global = true)]
    artifact: Option<String>,

    /// Directory for client storage and the log file
    #[arg(long, env = "ARTIFACT_CHAT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Never start the audio player
    #[arg(long, global = true)]
    no_audio: bool,

    /// Fall back to an unsaved identity if local storage cannot be used
    #[arg(long, global = true)]
    session_identity: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Send one message, print the exchange and exit
    Send {
        /// Message text (may be empty)
        message: String,
    },
    /// Print this client's identifier
    Whoami,
}

/// Everything resolved from the CLI, config file and defaults
struct Settings {
    server_url: String,
    artifact: Artifact,
    data_dir: PathBuf,
    config: Config,
}

impl Settings {
    fn resolve(cli: &Cli) -> Result<Self> {
        let config = Config::load().unwrap_or_else(|_| Config::new());

        let server_url = cli
            .server
            .clone()
            .unwrap_or_else(|| config.server_url().to_string());

        let artifact_tag = cli
            .artifact
            .clone()
            .or_else(|| config.artifact.clone())
            .unwrap_or_else(|| Artifact::default().as_str().to_string());
        let artifact = Artifact::from_str(&artifact_tag).ok_or_else(|| {
            let known: Vec<&str> = Artifact::all().iter().map(|a| a.as_str()).collect();
            anyhow!("Unknown artifact '{}', expected one of: {}", artifact_tag, known.join(", "))
        })?;

        let data_dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => config::default_data_dir()?,
        };

        Ok(Self {
            server_url,
            artifact,
            data_dir,
            config,
        })
    }
}

fn init_logging(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("artifact-chat.log"))?;

    // The TUI owns the terminal, so logs go to a file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

fn resolve_identity(data_dir: &Path, allow_session: bool) -> Result<IdentityProvider> {
    let resolved = FileStorage::open(data_dir).and_then(|mut storage| IdentityProvider::resolve(&mut storage));

    match resolved {
        Ok(identity) => Ok(identity),
        Err(e @ ChatError::StorageUnavailable { .. }) if allow_session => {
            warn!("{}; continuing with a session-only identity", e);
            Ok(IdentityProvider::session_only())
        }
        Err(e) => Err(e).context("Could not load client identity (use --session-identity to continue without saving one)"),
    }
}

/// True when `id` was typed on the command line, as opposed to coming from the environment
fn given_as_flag(matches: &ArgMatches, id: &str) -> bool {
    let from_flag = |m: &ArgMatches| m.value_source(id) == Some(ValueSource::CommandLine);
    from_flag(matches) || matches.subcommand().map(|(_, sub)| from_flag(sub)).unwrap_or(false)
}

/// Only explicit `--server`/`--artifact` flags are remembered in the config file
fn should_save_connection(matches: &ArgMatches) -> bool {
    given_as_flag(matches, "server") || given_as_flag(matches, "artifact")
}

fn build_player(settings: &Settings, no_audio: bool) -> Arc<dyn AudioPlayer> {
    if no_audio {
        return Arc::new(SilentPlayer);
    }

    match CommandPlayer::from_command(&settings.config.audio_player()) {
        Some(player) => Arc::new(player),
        None => {
            warn!("Empty audio_player command in config; audio disabled");
            Arc::new(SilentPlayer)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let settings = Settings::resolve(&cli)?;

    // Logging is best effort; a read-only data dir shows up as StorageUnavailable below
    if let Err(e) = init_logging(&settings.data_dir) {
        eprintln!("Logging disabled: {}", e);
    }
    info!(
        "Starting artifact-chat v{} against {} as artifact {}",
        env!("CARGO_PKG_VERSION"),
        settings.server_url,
        settings.artifact.as_str()
    );

    let identity = resolve_identity(&settings.data_dir, cli.session_identity)?;

    match cli.command {
        Some(Commands::Whoami) => {
            println!("{}", identity.user_id());
            Ok(())
        }
        Some(Commands::Send { ref message }) => send_once(&settings, identity, message, cli.no_audio).await,
        Some(Commands::Chat) | None => {
            if should_save_connection(&matches) {
                if let Err(e) = Config::save_connection(&settings.server_url, settings.artifact.as_str()) {
                    warn!("Could not save config: {}", e);
                }
            }
            run_tui(&settings, identity, cli.no_audio).await
        }
    }
}

fn build_controller(
    settings: &Settings,
    identity: IdentityProvider,
    no_audio: bool,
) -> Result<(ChatController, mpsc::UnboundedReceiver<controller::Completion>)> {
    let endpoint = ChatClient::new(&settings.server_url, settings.config.request_timeout())?;
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = ChatController::new(
        identity,
        settings.artifact,
        Arc::new(endpoint),
        build_player(settings, no_audio),
        tx,
    );
    Ok((controller, rx))
}

async fn send_once(settings: &Settings, identity: IdentityProvider, message: &str, no_audio: bool) -> Result<()> {
    let (mut controller, mut completions) = build_controller(settings, identity, no_audio)?;

    let mut input = message.to_string();
    controller.on_submit(&mut input);
    println!("{}", controller.transcript().lines().join("\n"));

    let (id, result) = completions
        .recv()
        .await
        .ok_or_else(|| anyhow!("Exchange task ended without a result"))?;
    let failed = result.is_err();
    controller.on_completion(id, result);

    if let Some(last) = controller.transcript().last() {
        println!("{}", last);
    }
    if failed {
        return Err(anyhow!("Chat exchange failed"));
    }
    Ok(())
}

async fn run_tui(settings: &Settings, identity: IdentityProvider, no_audio: bool) -> Result<()> {
    let (controller, completions) = build_controller(settings, identity, no_audio)?;
    let mut app = App::new(controller, &settings.server_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(completions);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    info!("Session ended with {} messages", app.controller.transcript().len());
    result
}
