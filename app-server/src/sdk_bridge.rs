use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::process::ExitStatus;
use std::process::Stdio;

use async_trait::async_trait;
use rewind_app_server_protocol::RewindFilesResult;
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::BridgeConfig;

const REWIND_FILES_METHOD: &str = "rewindFiles";

#[derive(Debug, Error)]
pub enum SdkBridgeError {
    #[error("failed to start SDK bridge `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode SDK bridge request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("SDK bridge exited with {status}: {stderr}")]
    NonZeroExit { status: ExitStatus, stderr: String },

    #[error("SDK bridge produced no output")]
    EmptyResponse,

    #[error("SDK bridge returned an invalid response: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    #[error("SDK bridge task ended unexpectedly: {0}")]
    Aborted(String),

    /// Failure reported by an in-process bridge, surfaced verbatim.
    #[error("{0}")]
    Message(String),
}

impl SdkBridgeError {
    fn io(context: &'static str, source: io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// The external capability that actually restores files. Implementations own
/// snapshot storage and diffing; callers only see the result object.
#[async_trait]
pub trait SdkBridge: Send + Sync {
    async fn rewind_files(
        &self,
        session_id: &str,
        user_message_id: &str,
        cwd: Option<&Path>,
    ) -> Result<RewindFilesResult, SdkBridgeError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BridgeRequest<'a> {
    method: &'static str,
    session_id: &'a str,
    user_message_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<&'a Path>,
}

/// Runs the SDK bridge as a child process per call.
///
/// The request is written to stdin as a single JSON line; the last non-empty
/// line the child prints on stdout is the result. Anything else the child
/// prints earlier is treated as chatter and ignored.
#[derive(Debug, Clone)]
pub struct ProcessSdkBridge {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl ProcessSdkBridge {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: HashMap::new(),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone()).with_env(config.env.clone())
    }

    async fn run(&self, request_line: String, cwd: Option<&Path>) -> Result<String, SdkBridgeError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|source| SdkBridgeError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(request_line.as_bytes()).await {
                Ok(()) => {}
                // The bridge may exit without reading its input; its output
                // still decides the result.
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("SDK bridge closed stdin before reading the request");
                }
                Err(err) => {
                    return Err(SdkBridgeError::io("failed to write SDK bridge request", err));
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| SdkBridgeError::io("failed waiting for SDK bridge", err))?;

        if !output.status.success() {
            return Err(SdkBridgeError::NonZeroExit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl SdkBridge for ProcessSdkBridge {
    async fn rewind_files(
        &self,
        session_id: &str,
        user_message_id: &str,
        cwd: Option<&Path>,
    ) -> Result<RewindFilesResult, SdkBridgeError> {
        let request = BridgeRequest {
            method: REWIND_FILES_METHOD,
            session_id,
            user_message_id,
            cwd,
        };
        let mut request_line = serde_json::to_string(&request).map_err(SdkBridgeError::Encode)?;
        request_line.push('\n');

        debug!(program = %self.program, "invoking SDK bridge: {}", request_line.trim_end());
        let stdout = self.run(request_line, cwd).await?;
        parse_bridge_output(&stdout)
    }
}

fn parse_bridge_output(stdout: &str) -> Result<RewindFilesResult, SdkBridgeError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .ok_or(SdkBridgeError::EmptyResponse)?;

    serde_json::from_str(line).map_err(SdkBridgeError::InvalidResponse)
}
