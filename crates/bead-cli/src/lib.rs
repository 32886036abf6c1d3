//! # Bead CLI
//!
//! Command-line interface for Bead queues and encryption envelopes.
//!
//! This module provides CLI commands for:
//! - Generating encryption keys
//! - Encrypting and decrypting values with the configured key
//! - Peeking, receiving, sending and settling Service Bus queue messages
//!
//! Configuration is read from `/etc/bead/bead.toml`, `./config/bead.toml`,
//! the `--config` file and `BEAD__*` environment variables, in that order.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bead_crypt::{
    Algorithm, CryptConfig, CryptError, Crypter, Decrypt, Encrypt, EncryptionKey, Plaintext,
    SerializationMode,
};
use bead_queue::config::ConfigLoader;
use bead_queue::{
    ConfigurationError, LockToken, MessageId, Queue, QueueError, QueueMessage, ServiceBusConfig,
};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Structure
// ============================================================================

/// Bead CLI - Service Bus queues and encryption envelopes
#[derive(Parser, Debug)]
#[command(name = "bead")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Service Bus queue operations and encryption envelopes")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BEAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a random key and print it as base64
    Keygen {
        /// Cipher the key is for
        #[arg(short, long, default_value = "xchacha20-poly1305")]
        algorithm: String,
    },

    /// Encrypt a value with the configured key
    Encrypt {
        /// Value to encrypt
        data: String,

        /// Serialisation mode (auto, on, off)
        #[arg(short, long, default_value = "auto")]
        mode: String,

        /// Parse the value as JSON before encrypting
        #[arg(long)]
        json: bool,
    },

    /// Decrypt an envelope with the configured key
    Decrypt {
        /// Base64 envelope
        envelope: String,
    },

    /// Queue operations against the configured Service Bus queue
    Queue {
        #[command(subcommand)]
        action: QueueCommands,
    },
}

/// Queue subcommands
#[derive(Subcommand, Debug)]
pub enum QueueCommands {
    /// Lock and show the message at the head of the queue
    Peek,

    /// Remove and show the message at the head of the queue
    Get,

    /// Send a message
    Put {
        /// Message body
        payload: String,
    },

    /// Delete a locked message
    Delete {
        /// Message ID
        id: String,
        /// Lock token from peek
        lock_token: String,
    },

    /// Release the lock on a message
    Release {
        /// Message ID
        id: String,
        /// Lock token from peek
        lock_token: String,
    },

    /// Renew the lock on a message
    Renew {
        /// Message ID
        id: String,
        /// Lock token from peek
        lock_token: String,
    },
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Crypt error: {0}")]
    Crypt(#[from] CryptError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Queue(_) => 2,
            Self::Crypt(_) => 3,
            Self::InvalidArgument { .. } => 4,
            Self::Io(_) => 5,
        }
    }
}

impl From<ConfigurationError> for CliError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e.to_string())
    }
}

fn invalid_argument(arg: &str, message: impl ToString) -> CliError {
    CliError::InvalidArgument {
        arg: arg.to_string(),
        message: message.to_string(),
    }
}

/// Parse `--mode`; kept out of clap so a bad value exits with the argument code
pub fn parse_mode(mode: &str) -> Result<SerializationMode, CliError> {
    mode.parse().map_err(|e: String| invalid_argument("mode", e))
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Everything the CLI can be configured with
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BeadConfig {
    #[serde(default)]
    pub queue: Option<ServiceBusConfig>,
    #[serde(default)]
    pub crypt: Option<CryptConfig>,
}

impl BeadConfig {
    fn crypter(&self) -> Result<Crypter, CliError> {
        let crypt = self.crypt.as_ref().ok_or_else(|| {
            CliError::Configuration("missing [crypt] section".to_string())
        })?;
        crypt.build().map_err(|e| CliError::Configuration(format!("crypt: {}", e)))
    }

    fn queue_config(&self) -> Result<&ServiceBusConfig, CliError> {
        self.queue
            .as_ref()
            .ok_or_else(|| CliError::Configuration("missing [queue] section".to_string()))
    }
}

/// Load configuration from the standard locations plus an optional explicit file
pub fn load_configuration(config_path: Option<&Path>) -> Result<BeadConfig, CliError> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = config_path {
        loader = loader.with_explicit_path(path);
    }

    Ok(loader.load()?)
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&cli, &mut out).await
}

/// Execute a parsed command, writing results to `out`
pub async fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), CliError> {
    match &cli.command {
        Commands::Keygen { algorithm } => execute_keygen_command(algorithm, out),
        Commands::Encrypt { data, mode, json } => {
            let mode = parse_mode(mode)?;
            let config = load_configuration(cli.config.as_deref())?;
            execute_encrypt_command(&config.crypter()?, data, mode, *json, out)
        }
        Commands::Decrypt { envelope } => {
            let config = load_configuration(cli.config.as_deref())?;
            execute_decrypt_command(&config.crypter()?, envelope, out)
        }
        Commands::Queue { action } => {
            let config = load_configuration(cli.config.as_deref())?;
            let queue = config.queue_config()?.build().map_err(|e| match e {
                QueueError::Configuration(e) => CliError::from(e),
                other => CliError::from(other),
            })?;
            execute_queue_command(&queue, action, out).await
        }
    }
}

/// Initialize logging based on CLI arguments
///
/// `RUST_LOG` wins over `--log-level`. Logs go to stderr so command output
/// on stdout stays machine-readable.
fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cli.log_level)
            .map_err(|e| invalid_argument("log-level", e))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::Configuration(format!("logging: {}", e)))
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Execute keygen command
pub fn execute_keygen_command<W: Write>(algorithm: &str, out: &mut W) -> Result<(), CliError> {
    let algorithm: Algorithm = algorithm
        .parse()
        .map_err(|e| invalid_argument("algorithm", e))?;

    let key = EncryptionKey::generate(algorithm)?;
    info!(algorithm = %algorithm, "Generated key");

    writeln!(out, "{}", key.to_base64().as_str())?;
    Ok(())
}

/// Execute encrypt command
pub fn execute_encrypt_command<W: Write>(
    crypter: &Crypter,
    data: &str,
    mode: SerializationMode,
    json: bool,
    out: &mut W,
) -> Result<(), CliError> {
    let plaintext = if json {
        let value: serde_json::Value =
            serde_json::from_str(data).map_err(|e| invalid_argument("data", e))?;
        Plaintext::Value(value)
    } else {
        Plaintext::Text(data.to_string())
    };

    debug!(mode = %mode, algorithm = %crypter.algorithm(), "Encrypting value");
    writeln!(out, "{}", crypter.encrypt(plaintext, mode)?)?;
    Ok(())
}

/// Execute decrypt command
///
/// Text is printed as-is, serialised values as JSON and binary data as base64.
pub fn execute_decrypt_command<W: Write>(
    crypter: &Crypter,
    envelope: &str,
    out: &mut W,
) -> Result<(), CliError> {
    match crypter.decrypt(envelope)? {
        Plaintext::Text(text) => writeln!(out, "{}", text)?,
        Plaintext::Value(value) => writeln!(out, "{}", value)?,
        Plaintext::Binary(bytes) => writeln!(out, "{}", STANDARD.encode(bytes))?,
    }
    Ok(())
}

/// Execute a queue subcommand against any queue implementation
pub async fn execute_queue_command<W: Write>(
    queue: &dyn Queue,
    action: &QueueCommands,
    out: &mut W,
) -> Result<(), CliError> {
    match action {
        QueueCommands::Peek => {
            let message = queue.peek().await?;
            write_message(message.as_ref(), out)
        }
        QueueCommands::Get => {
            let message = queue.get().await?;
            write_message(message.as_ref(), out)
        }
        QueueCommands::Put { payload } => {
            queue.put(Bytes::from(payload.clone())).await?;
            info!(queue = %queue.name(), "Message sent");
            Ok(())
        }
        QueueCommands::Delete { id, lock_token } => {
            queue.delete(&message_ref(id, lock_token)?).await?;
            info!(queue = %queue.name(), message_id = %id, "Message deleted");
            Ok(())
        }
        QueueCommands::Release { id, lock_token } => {
            queue.release(&message_ref(id, lock_token)?).await?;
            info!(queue = %queue.name(), message_id = %id, "Message released");
            Ok(())
        }
        QueueCommands::Renew { id, lock_token } => {
            queue.renew_lock(&message_ref(id, lock_token)?).await?;
            info!(queue = %queue.name(), message_id = %id, "Lock renewed");
            Ok(())
        }
    }
}

/// Rebuild enough of a fetched message to address it again
fn message_ref(id: &str, lock_token: &str) -> Result<QueueMessage, CliError> {
    let id = MessageId::new(id).map_err(|e| invalid_argument("id", e))?;
    Ok(QueueMessage::new(id, LockToken::new(lock_token), Bytes::new()))
}

/// Print a fetched message as JSON, or `null` for an empty queue
fn write_message<W: Write>(message: Option<&QueueMessage>, out: &mut W) -> Result<(), CliError> {
    let rendered = match message {
        Some(message) => serde_json::json!({
            "id": message.id().as_str(),
            "lockToken": message.lock_token().as_str(),
            "payload": String::from_utf8_lossy(message.payload()),
            "properties": message.properties(),
        }),
        None => serde_json::Value::Null,
    };

    writeln!(out, "{}", rendered)?;
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
