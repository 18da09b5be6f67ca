use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use pairlink::client::{
    ClientConfig, ConnectRequest, ConnectionStateChange, ErrorEvent, KeepaliveConfig, Paired,
    PairingClient, RemoteAudioStream,
};
use pairlink::{ConnectionState, DeviceType, RoomCode};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pairlink")]
#[command(about = "Pair with a companion device and receive its audio")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the relay for a new room code.
    CreateRoom {
        #[arg(long, default_value = "http://localhost:8080")]
        server: String,
    },

    /// Join a room and stay connected until Ctrl-C.
    Connect {
        #[arg(long, default_value = "http://localhost:8080")]
        server: String,

        /// Room code to join; prompted for when omitted.
        #[arg(long)]
        room: Option<String>,

        #[arg(long, value_enum, default_value_t = Role::Primary)]
        role: Role,

        /// Create a fresh room instead of joining an existing one.
        #[arg(long, conflicts_with = "room")]
        create: bool,

        /// Ping the relay periodically; only for relays that answer with `pong`.
        #[arg(long)]
        keepalive: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Primary,
    Companion,
}

impl From<Role> for DeviceType {
    fn from(role: Role) -> Self {
        match role {
            Role::Primary => DeviceType::Primary,
            Role::Companion => DeviceType::Companion,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::CreateRoom { server } => {
            let client = PairingClient::with_defaults(ClientConfig::default());
            let room = client
                .create_room(&server)
                .await
                .context("Failed to create a room")?;
            println!("{} {}", "Room code:".green().bold(), room.as_str().bold());
        }

        Commands::Connect {
            server,
            room,
            role,
            create,
            keepalive,
        } => {
            let config = ClientConfig::default()
                .with_device_type(role.into())
                .with_keepalive(keepalive.then(KeepaliveConfig::default));
            let client = PairingClient::with_defaults(config);
            attach_printers(&client);

            let room = match (room, create) {
                (Some(code), _) => RoomCode::from(code),
                (None, true) => {
                    let code = client.create_room(&server).await?;
                    println!("{} {}", "Share this code:".green().bold(), code.as_str().bold());
                    code
                }
                (None, false) => prompt_room_code().await?,
            };

            println!("{} room {} at {}", "Joining".cyan(), room, server);
            client
                .connect(ConnectRequest::new(server, room))
                .await
                .context("Failed to join the room")?;
            println!("{}", "Joined. Waiting for the other device...".cyan());

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("{}", "Disconnecting...".yellow());
                }
                _ = session_ended(client.watch_state()) => {}
            }

            client.disconnect().await?;
            println!("{}", "Disconnected.".green().bold());
        }
    }

    Ok(())
}

fn attach_printers(client: &PairingClient) {
    client.on::<ConnectionStateChange, _>(|state| {
        println!("{} {}", "state".blue().bold(), state);
    });
    client.on::<Paired, _>(|info| {
        println!("{} as {:?}", "Paired".green().bold(), info.role);
    });
    client.on::<RemoteAudioStream, _>(|stream| {
        println!(
            "{} stream {} (track {})",
            "Receiving audio".green().bold(),
            stream.stream_id(),
            stream.track_id()
        );
    });
    client.on::<ErrorEvent, _>(|err| {
        eprintln!("{} {}", "error".red().bold(), err);
    });
}

async fn prompt_room_code() -> Result<RoomCode> {
    let code = tokio::task::spawn_blocking(|| {
        dialoguer::Input::<String>::new()
            .with_prompt("Room code")
            .interact_text()
    })
    .await?
    .context("Failed to read the room code")?;
    Ok(RoomCode::from(code.trim()))
}

/// Resolves once the connection falls back to DISCONNECTED or ERROR.
async fn session_ended(mut state: watch::Receiver<ConnectionState>) {
    let _ = state
        .wait_for(|s| matches!(s, ConnectionState::Disconnected | ConnectionState::Error))
        .await;
}
