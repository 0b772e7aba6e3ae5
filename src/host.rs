/// Host power control capability.
///
/// Isolates the one privileged side effect in the system, so the poll loop
/// can be exercised in tests without halting the test machine.
use crate::config::ShutdownConfig;
use tokio::process::Command;

pub trait HostControl {
    /// Ask the operating system to halt and power off.
    fn request_shutdown(
        &mut self,
    ) -> impl std::future::Future<Output = Result<(), HostError>> + Send;
}

/// Errors from invoking the host shutdown command.
#[derive(Debug)]
pub enum HostError {
    /// The shutdown command could not be started.
    Spawn { source: std::io::Error },
    /// The shutdown command ran but reported failure.
    Failed { code: Option<i32> },
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Spawn { source } => {
                write!(f, "failed to spawn shutdown command: {}", source)
            }
            HostError::Failed { code: Some(code) } => {
                write!(f, "shutdown command exited with status {}", code)
            }
            HostError::Failed { code: None } => {
                write!(f, "shutdown command was killed by a signal")
            }
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Spawn { source } => Some(source),
            HostError::Failed { .. } => None,
        }
    }
}

/// Runs the configured shutdown command, `sudo shutdown -h now` by default.
pub struct SystemHost {
    command: String,
    args: Vec<String>,
}

impl SystemHost {
    pub fn new(config: &ShutdownConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

impl HostControl for SystemHost {
    async fn request_shutdown(&mut self) -> Result<(), HostError> {
        tracing::info!(command = %self.command, args = ?self.args, "invoking host shutdown command");
        let status = Command::new(&self.command)
            .args(&self.args)
            .status()
            .await
            .map_err(|e| HostError::Spawn { source: e })?;

        if status.success() {
            Ok(())
        } else {
            Err(HostError::Failed {
                code: status.code(),
            })
        }
    }
}
