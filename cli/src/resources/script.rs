//! Remote install scripts: fetched over HTTPS and piped to a shell.
use anyhow::Result;
use std::sync::Arc;

use crate::error::ResourceError;
use crate::exec::Executor;

/// A script to download and run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteScript {
    /// HTTPS URL of the script body.
    pub url: String,
    /// Interpreter that reads the script from stdin (`sh` or `bash`).
    pub shell: &'static str,
    /// Arguments passed after `-s --`.
    pub args: Vec<String>,
    /// Extra environment for the interpreter.
    pub env: Vec<(String, String)>,
}

/// Runs remote install scripts.
pub trait ScriptRunner: Send + Sync + std::fmt::Debug {
    /// Fetch `script.url` and run it.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails or the script exits non-zero.
    fn run(&self, script: &RemoteScript) -> Result<()>;
}

/// Production [`ScriptRunner`]: fetches with `ureq` and pipes the body to
/// `<shell> -s -- <args>` through the [`Executor`].
#[derive(Debug, Clone)]
pub struct HttpScriptRunner {
    executor: Arc<dyn Executor>,
}

impl HttpScriptRunner {
    /// Create a runner that executes scripts through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    fn fetch(url: &str) -> Result<String, ResourceError> {
        let failed = |e: ureq::Error| ResourceError::DownloadFailed {
            url: url.to_string(),
            message: e.to_string(),
        };
        ureq::get(url)
            .call()
            .map_err(failed)?
            .body_mut()
            .read_to_string()
            .map_err(failed)
    }
}

impl ScriptRunner for HttpScriptRunner {
    fn run(&self, script: &RemoteScript) -> Result<()> {
        let body = Self::fetch(&script.url)?;
        self.executor.run_with_input(
            script.shell,
            &script_args(script),
            &script.env,
            &body,
        )?;
        Ok(())
    }
}

/// Interpreter arguments for reading a script from stdin.
fn script_args(script: &RemoteScript) -> Vec<&str> {
    let mut args = vec!["-s", "--"];
    args.extend(script.args.iter().map(String::as_str));
    args
}
