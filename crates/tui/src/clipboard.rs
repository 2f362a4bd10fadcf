use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Clipboard programs tried in order, with their arguments.
#[cfg(target_os = "macos")]
const PROGRAMS: &[(&str, &[&str])] = &[("pbcopy", &[])];
#[cfg(target_os = "linux")]
const PROGRAMS: &[(&str, &[&str])] = &[("wl-copy", &[]), ("xclip", &["-selection", "clipboard"]), ("xsel", &["--clipboard", "--input"])];
#[cfg(target_os = "windows")]
const PROGRAMS: &[(&str, &[&str])] = &[("clip", &[])];
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const PROGRAMS: &[(&str, &[&str])] = &[];

fn pipe_to(program: &str, args: &[&str], value: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("launch {program}"))?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(value.as_bytes())
            .with_context(|| format!("write {program}"))?;
    }
    let status = child.wait().with_context(|| format!("wait {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

/// Copies `value` to the system clipboard with the first program that works.
pub fn copy(value: &str) -> Result<()> {
    let mut last = None;
    for (program, args) in PROGRAMS {
        match pipe_to(program, args, value) {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!("clipboard via {program} failed: {e:#}");
                last = Some(e);
            }
        }
    }
    match last {
        Some(e) => Err(e.context("clipboard copy failed")),
        None => bail!("clipboard copy is unavailable on this platform"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_reports_launch_failure() {
        let err = pipe_to("tempo-no-such-clipboard", &[], "x").unwrap_err();
        assert!(err.to_string().contains("launch tempo-no-such-clipboard"));
    }
}
