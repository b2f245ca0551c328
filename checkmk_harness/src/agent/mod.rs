//! Agent executables
//!
//! Agents and agent plugins are run directly (no shell) with a timeout; their
//! stdout is the agent output that check tests feed to the section parser.

mod error;

pub use error::AgentError;

use crate::config::constants::compile_time::harness::AGENT_PLUGINS_DIR;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// Directory agent executables are resolved against
#[derive(Debug, Clone)]
pub struct AgentDirectory {
    root: PathBuf,
    timeout: Duration,
}

impl AgentDirectory {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Agent at `relpath` below the directory; the file must exist
    pub fn agent(&self, relpath: impl AsRef<Path>) -> Result<Agent, AgentError> {
        let path = self.root.join(relpath);
        if !path.exists() {
            let error = AgentError::MissingExecutable { path };
            log_error!(error.error_code(), "Agent executable not found",
                "agents_dir" => self.root.display(),
                "error" => &error);
            return Err(error);
        }
        Ok(Agent {
            path,
            timeout: self.timeout,
        })
    }

    /// Agent plugin `name` below `plugins/`
    pub fn plugin(&self, name: &str) -> Result<Agent, AgentError> {
        self.agent(Path::new(AGENT_PLUGINS_DIR).join(name))
    }
}

/// Captured result of one agent run
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// One resolved agent executable
#[derive(Debug, Clone)]
pub struct Agent {
    path: PathBuf,
    timeout: Duration,
}

impl Agent {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the agent with `args` and capture its output
    ///
    /// Fails on spawn errors, non-zero exit and timeout; a timed out agent
    /// is killed.
    pub fn run(&self, args: &[&str]) -> Result<AgentOutput, AgentError> {
        let start = Instant::now();
        log_debug!("Running agent",
            "path" => self.path.display(),
            "args" => args.join(" "));

        let spawn_error = |e: std::io::Error| AgentError::Spawn {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        let mut child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.logged(spawn_error(e)))?;

        // Drain both pipes while waiting so a chatty agent cannot block
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match child
            .wait_timeout(self.timeout)
            .map_err(|e| self.logged(spawn_error(e)))?
        {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.logged(AgentError::Timeout {
                    path: self.path.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }));
            }
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            return Err(self.logged(AgentError::NonZeroExit {
                path: self.path.clone(),
                code: status.code(),
                stderr: stderr.trim_end().to_string(),
            }));
        }

        let duration = start.elapsed();
        log_success!(codes::success::AGENT_COMPLETED, "Agent completed",
            "path" => self.path.display(),
            "bytes" => stdout.len(),
            "duration_ms" => duration.as_millis());

        Ok(AgentOutput {
            stdout,
            stderr,
            duration,
        })
    }

    fn logged(&self, error: AgentError) -> AgentError {
        log_error!(error.error_code(), "Agent run failed",
            "path" => self.path.display(),
            "error" => &error);
        error
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<thread::JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(reader: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
        .unwrap_or_default()
}
