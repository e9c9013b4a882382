#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::sync::Arc;

use anyhow::Context;
use rewind_app_server_protocol::ServerNotification;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod message_handler;
mod message_processor;
mod outgoing_message;
mod rewind_handler;
mod sdk_bridge;
mod workspace_context;

pub use cli::Cli;
pub use cli::CliConfigOverrides;
pub use config::BridgeConfig;
pub use config::Config;
pub use config::ConfigError;
pub use config::ConfigOverrides;
pub use message_handler::MessageHandler;
pub use message_processor::MessageProcessor;
pub use outgoing_message::OutgoingMessageSender;
pub use rewind_handler::RewindHandler;
pub use sdk_bridge::ProcessSdkBridge;
pub use sdk_bridge::SdkBridge;
pub use sdk_bridge::SdkBridgeError;
pub use workspace_context::ProjectContext;
pub use workspace_context::SessionContext;
pub use workspace_context::WorkspaceContext;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Reads `type:content` lines from stdin, routes them, and writes
/// notifications to stdout as JSON lines until stdin closes and every
/// in-flight rewind has reported.
pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Cli {
        cwd,
        config_overrides,
    } = cli;

    let cli_kv_overrides = config_overrides
        .parse_overrides()
        .map_err(|err| anyhow::anyhow!("error parsing -c overrides: {err}"))?;
    let config = Config::load_with_cli_overrides(
        cli_kv_overrides,
        ConfigOverrides {
            project_root: cwd,
            rewind_home: None,
        },
    )
    .context("failed to load configuration")?;
    info!(
        project_root = %config.project_root.display(),
        bridge = %config.bridge.program,
        "rewind app server starting"
    );

    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel::<ServerNotification>();
    let outgoing = Arc::new(OutgoingMessageSender::new(outgoing_tx));
    let sdk_bridge = Arc::new(ProcessSdkBridge::from_config(&config.bridge));
    let processor = MessageProcessor::new(outgoing, sdk_bridge, config.workspace_context());

    let stdout_writer = tokio::spawn(write_notifications(outgoing_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }
        processor.process_line(&line);
    }

    debug!("stdin closed, waiting for in-flight rewinds");
    drop(processor);
    stdout_writer
        .await
        .context("stdout writer task failed")?
        .context("failed to write notifications")?;
    Ok(())
}

async fn write_notifications(
    mut outgoing_rx: mpsc::UnboundedReceiver<ServerNotification>,
) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(notification) = outgoing_rx.recv().await {
        let mut line = match serde_json::to_string(&notification) {
            Ok(line) => line,
            Err(err) => {
                error!("failed to serialize notification: {err}");
                continue;
            }
        };
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}
