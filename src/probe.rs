use std::collections::BTreeSet;
use tokio::{
    process::Command,
    time::{timeout, Duration},
};

use crate::Id;

mod parser;
pub use parser::{parse_counter_output, parse_switch_report};

#[derive(Debug)]
/// Why a probe produced no usable reading
pub enum ProbeError {
    /// The probe did not finish within the configured limit
    Timeout,
    /// The probe command line was empty
    BadCommand,
    /// A non-zero exit code
    ExitCode(i32),
    /// The probe was killed by an external signal
    ExternalSignal,
    /// The probe ran but printed something we could not parse
    BadOutput,
    /// An IO error happened while spawning or reaping the probe
    IOError(std::io::Error),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for ProbeError {}

/// Splits a configured command line on whitespace into a spawnable command.
/// No shell quoting; probes needing one get wrapped in a script.
pub fn probe_command(cmdline: &str) -> Option<Command> {
    let mut parts = cmdline.split_whitespace();
    let mut cmd = Command::new(parts.next()?);
    cmd.args(parts);
    Some(cmd)
}

async fn run_probe(cmdline: &str, limit: Duration) -> Result<String, ProbeError> {
    let mut cmd = probe_command(cmdline).ok_or(ProbeError::BadCommand)?;
    let output = timeout(limit, cmd.output())
        .await
        .map_err(|_| ProbeError::Timeout)?
        .map_err(ProbeError::IOError)?;
    match output.status.code() {
        Some(0) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
        Some(code) => Err(ProbeError::ExitCode(code)),
        None => Err(ProbeError::ExternalSignal),
    }
}

/// Runs a counter probe and parses its single decimal line.
pub async fn run_counter_probe(cmdline: &str, limit: Duration) -> Result<u64, ProbeError> {
    let out = run_probe(cmdline, limit).await?;
    parse_counter_output(&out).ok_or(ProbeError::BadOutput)
}

/// Runs the switch report probe; returns the ids currently off.
pub async fn run_switch_probe(
    cmdline: &str,
    limit: Duration,
) -> Result<BTreeSet<Id>, ProbeError> {
    let out = run_probe(cmdline, limit).await?;
    Ok(parse_switch_report(&out))
}

/// Runs the restore command for one switch. `{id}` in the configured
/// template is replaced with the switch id.
pub async fn run_restore_probe(
    template: &str,
    id: &str,
    limit: Duration,
) -> Result<(), ProbeError> {
    let cmdline = template.replace("{id}", id);
    run_probe(&cmdline, limit).await.map(|_| ())
}
