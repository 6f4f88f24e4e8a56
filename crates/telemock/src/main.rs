//! telemock: standalone gateway process.
//!
//! Runs a [`Gateway`] on its own so WebSocket harnesses can be developed and
//! debugged without a bot attached.  Every update is logged; with `--echo`
//! the process also answers like a trivial bot, which is handy for checking
//! a harness end to end.
//!
//! # Usage
//!
//! ```text
//! telemock [OPTIONS]
//!
//! Options:
//!   --bind <IP>                   Listener IP [default: 127.0.0.1]
//!   --port <PORT>                 Listener port [default: 8765]
//!   --queue-capacity <N>          Undelivered updates kept [default: 256]
//!   --write-timeout-ms <MS>       Per-session write deadline [default: 2000]
//!   --shutdown-timeout-ms <MS>    Bound on each shutdown wait [default: 2000]
//!   --echo                        Reply to messages and button presses
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                       | Default     |
//! |--------------------------------|-------------|
//! | `TELEMOCK_BIND`                | `127.0.0.1` |
//! | `TELEMOCK_PORT`                | `8765`      |
//! | `TELEMOCK_QUEUE_CAPACITY`      | `256`       |
//! | `TELEMOCK_WRITE_TIMEOUT_MS`    | `2000`      |
//! | `TELEMOCK_SHUTDOWN_TIMEOUT_MS` | `2000`      |
//! | `TELEMOCK_ECHO`                | `false`     |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use telemock::domain::{
    DEFAULT_BIND_ADDR, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};
use telemock::{Gateway, GatewayConfig, GatewayError, SendMessageParams, Update, UpdateKind};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Local WebSocket test double for a chat-bot long-polling API.
#[derive(Debug, Parser)]
#[command(
    name = "telemock",
    about = "Local WebSocket test double for a chat-bot long-polling API",
    version
)]
struct Cli {
    /// IP address to bind the WebSocket listener to.
    #[arg(long, default_value_t = DEFAULT_BIND_ADDR.ip(), env = "TELEMOCK_BIND")]
    bind: IpAddr,

    /// TCP port for the WebSocket listener.  0 picks a free port.
    #[arg(long, default_value_t = DEFAULT_BIND_ADDR.port(), env = "TELEMOCK_PORT")]
    port: u16,

    /// Maximum number of undelivered updates; the oldest is dropped when full.
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, env = "TELEMOCK_QUEUE_CAPACITY")]
    queue_capacity: usize,

    /// Deadline for writing one reply to one session, in milliseconds.
    #[arg(
        long,
        default_value_t = millis(DEFAULT_WRITE_TIMEOUT),
        env = "TELEMOCK_WRITE_TIMEOUT_MS"
    )]
    write_timeout_ms: u64,

    /// Bound on each shutdown wait, in milliseconds.
    #[arg(
        long,
        default_value_t = millis(DEFAULT_SHUTDOWN_TIMEOUT),
        env = "TELEMOCK_SHUTDOWN_TIMEOUT_MS"
    )]
    shutdown_timeout_ms: u64,

    /// Answer every message with "Echo: <text>" and every button press with
    /// "Button pressed: <data>".
    #[arg(long, env = "TELEMOCK_ECHO")]
    echo: bool,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`GatewayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is zero.
    fn to_gateway_config(&self) -> anyhow::Result<GatewayConfig> {
        let config = GatewayConfig {
            bind_addr: SocketAddr::new(self.bind, self.port),
            queue_capacity: self.queue_capacity,
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// The reply a trivial echo bot would send for `update`.
fn echo_reply(update: &Update) -> SendMessageParams {
    match &update.kind {
        UpdateKind::Message(message) => {
            SendMessageParams::new(message.chat.id, format!("Echo: {}", message.text))
                .reply_to(message.message_id)
        }
        UpdateKind::CallbackQuery(query) => {
            let chat_id = query
                .message
                .as_ref()
                .map_or(query.from.id, |message| message.chat.id);
            SendMessageParams::new(chat_id, format!("Button pressed: {}", query.data))
        }
    }
}

/// Acknowledges a button press, then sends the echo reply.
async fn echo(gateway: &Gateway, update: &Update) -> Result<(), GatewayError> {
    if let UpdateKind::CallbackQuery(query) = &update.kind {
        gateway.answer_callback_query(&query.id, "").await?;
    }
    gateway.send_message(&echo_reply(update)).await?;
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_gateway_config()?;

    let gateway = Gateway::with_config("telemock", config)
        .await
        .context("failed to start gateway")?;

    // Ctrl+C ends the update stream; the loop below then closes the gateway.
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                cancel_on_signal.cancel();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let mut updates = gateway.updates_via_long_polling(cancel);
    while let Some(update) = updates.recv().await {
        match &update.kind {
            UpdateKind::Message(message) => info!(
                "update {}: message {} in chat {}: {:?}",
                update.update_id, message.message_id, message.chat.id, message.text
            ),
            UpdateKind::CallbackQuery(query) => info!(
                "update {}: button {:?} pressed by {}",
                update.update_id, query.data, query.from.id
            ),
        }

        if cli.echo {
            if let Err(e) = echo(&gateway, &update).await {
                error!("echo for update {} failed: {e}", update.update_id);
            }
        }
    }

    gateway.close().await;
    info!("telemock stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
