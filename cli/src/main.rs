//! `vault-presence`: watch who is in a vault room from a terminal.

use clap::{Parser, Subcommand};
use uuid::Uuid;
use vault_presence::{
    ConfigError, ConnectionState, Identity, PresenceClient, PresenceConfig, PresenceError, PresenceSnapshot,
    WsConnector,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Presence(#[from] PresenceError),
    #[error("failed to render snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to listen for ctrl-c: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "vault-presence", about = "Vault realtime presence client")]
struct Cli {
    /// Backend address; overrides the compiled-in default.
    #[arg(long, env = "VAULT_BACKEND_URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join a room and print every presence change until ctrl-c.
    Watch {
        #[arg(long)]
        room: String,
        /// Defaults to a random `anon-<uuid>` id.
        #[arg(long)]
        user: Option<String>,
        /// Print each snapshot as one JSON line.
        #[arg(long)]
        json: bool,
    },
    /// Print the socket URL the client would open.
    Url {
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    if let Err(error) = dotenvy::dotenv() {
        tracing::debug!(%error, "no .env loaded");
    }

    let cli = Cli::parse();
    let mut config = PresenceConfig::from_env()?;
    if let Some(backend_url) = cli.backend_url {
        config.backend_url = backend_url;
    }

    match cli.command {
        Command::Watch { room, user, json } => {
            let user = user.unwrap_or_else(|| format!("anon-{}", Uuid::new_v4()));
            run_watch(config, Identity::new(room, user), json).await
        }
        Command::Url { user } => {
            println!("{}", config.ws_url(user.as_deref())?);
            Ok(())
        }
    }
}

async fn run_watch(config: PresenceConfig, identity: Identity, json: bool) -> Result<(), CliError> {
    // Fail fast on a bad address instead of surfacing it as last_error.
    config.ws_url(identity.user_id.as_deref())?;
    tracing::info!(room_id = ?identity.room_id, user_id = ?identity.user_id, "watching room");

    let client = PresenceClient::spawn(config, WsConnector, identity);
    let mut updates = client.subscribe();
    let outcome = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Err(error) = render(&snapshot, json) {
                    break Err(error);
                }
            }
            signal = tokio::signal::ctrl_c() => break signal.map_err(CliError::from),
        }
    };

    client.dispose().await;
    outcome
}

fn render(snapshot: &PresenceSnapshot, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }

    let state = match snapshot.state {
        ConnectionState::Disconnected if snapshot.gave_up => "gave up",
        ConnectionState::Disconnected if snapshot.retry_pending => "reconnecting",
        ConnectionState::Disconnected => "disconnected",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Connected => "connected",
    };
    let users = snapshot
        .users
        .iter()
        .map(|entry| {
            let name = entry.display_name.as_deref().unwrap_or(&entry.user_id);
            if entry.is_typing {
                format!("{name} (typing)")
            } else {
                name.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    println!(
        "[{state}] attempts={} users=[{users}]",
        snapshot.reconnect_attempts
    );
    if let Some(error) = &snapshot.last_error {
        eprintln!("  last error: {error}");
    }
    Ok(())
}
