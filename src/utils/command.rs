//! External command execution utilities.
//!
//! Optimizers and the svn backend are plain child processes: arguments in,
//! stdout back as data, stderr surfaced through the log with known noise
//! filtered out.

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    ffi::OsString,
    io::Write,
    process::{Command, Output, Stdio},
    thread,
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments and capture its output.
///
/// # Examples
/// ```ignore
/// exec!(&config.version.vcs; "log", "--verbose", "-r", "42", target)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec(
            &$crate::utils::command::to_cmd_vec($cmd),
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
}

// ============================================================================
// Argument Conversion
// ============================================================================

/// Convert to OsString.
#[inline]
pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
    s.into()
}

/// Trait for converting to command vector.
pub trait ToCmd {
    fn to_cmd(self) -> Vec<OsString>;
}

impl<const N: usize> ToCmd for [&str; N] {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.into_iter().map(OsString::from).collect()
    }
}

impl ToCmd for &[String] {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.iter().map(OsString::from).collect()
    }
}

impl ToCmd for &Vec<String> {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.iter().map(OsString::from).collect()
    }
}

/// Convert command to Vec<OsString>.
#[inline]
pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
    cmd.to_cmd()
}

/// Filter out empty args.
#[inline]
pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
    args.iter().filter(|a| !a.is_empty()).cloned().collect()
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// Stdout is returned to the caller untouched; stderr is logged.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(cmd: &[OsString], args: &[OsString]) -> Result<Output> {
    let (name, mut command) = prepare(cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    check_output(&name, &output)?;
    Ok(output)
}

/// Feed `input` to a command's stdin and collect its stdout.
///
/// Stdin is written from a scoped thread so a child that starts emitting
/// output before it has consumed all input cannot deadlock us.
pub fn pipe(cmd: &[String], input: &[u8]) -> Result<Vec<u8>> {
    let (name, mut command) = prepare(&to_cmd_vec(cmd), &[])?;

    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn `{name}`"))?;
    let mut stdin = child.stdin.take().context("Failed to acquire stdin")?;

    let output = thread::scope(|scope| {
        let writer = scope.spawn(move || stdin.write_all(input));
        let output = child.wait_with_output();
        let written = writer
            .join()
            .map_err(|_| anyhow::anyhow!("stdin writer for `{name}` panicked"))?;
        // A child that exits early closes the pipe; its status says more than EPIPE
        let output = output.with_context(|| format!("`{name}` process failed"))?;
        if output.status.success() {
            written.with_context(|| format!("Failed to write stdin of `{name}`"))?;
        }
        Ok::<_, anyhow::Error>(output)
    })?;

    check_output(&name, &output)?;
    Ok(output.stdout)
}

/// Prepare a Command from components.
fn prepare(cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);
    Ok((name, command))
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for CLI output noise.
///
/// Matches lines that start with a prefix AND contain all required keywords.
struct FilterRule {
    /// Line must start with one of these (case-insensitive, after trim).
    starts_with: &'static [&'static str],
    /// Line must also contain ALL of these keywords (case-insensitive).
    contains: &'static [&'static str],
}

impl FilterRule {
    const fn new(starts_with: &'static [&'static str], contains: &'static [&'static str]) -> Self {
        Self { starts_with, contains }
    }

    fn matches(&self, line: &str) -> bool {
        let lower = line.trim().to_ascii_lowercase();
        let has_prefix = self.starts_with.is_empty()
            || self.starts_with.iter().any(|p| lower.starts_with(p));
        let has_keywords = self.contains.iter().all(|kw| lower.contains(kw));
        has_prefix && has_keywords
    }
}

// uglifyjs example:
//   WARN: Dropping unused variable tmp [app.js:12,6]
//   WARN: Side effects in initialization of unused variable x
// svn example:
//   svn: warning: W155010: The node '/usr/local/app/x' was not found.
const STDERR_RULES: &[FilterRule] = &[
    FilterRule::new(&["warn:"], &["dropping unused"]),
    FilterRule::new(&["warn:"], &["unused variable"]),
    FilterRule::new(&["svn: warning:"], &["was not found"]),
];

fn should_filter_line(line: &str) -> bool {
    STDERR_RULES.iter().any(|r| r.matches(line))
}

/// Extract error message, skipping filtered lines at start.
fn extract_error(stderr: &str) -> &str {
    stderr
        .lines()
        .find(|line| !line.trim().is_empty() && !should_filter_line(line))
        .map(|first| {
            let offset = first.as_ptr() as usize - stderr.as_ptr() as usize;
            &stderr[offset..]
        })
        .unwrap_or(stderr)
        .trim()
}

/// Fail on non-zero exit, otherwise log stderr minus known noise.
fn check_output(name: &str, output: &Output) -> Result<()> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();

    if !output.status.success() {
        let error_msg = extract_error(stderr);
        if error_msg.is_empty() {
            bail!("Command `{name}` failed with {}", output.status);
        }
        bail!("Command `{name}` failed with {}: {error_msg}", output.status);
    }

    for line in stderr.lines() {
        if !line.trim().is_empty() && !should_filter_line(line) {
            log!(name; "{line}");
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cmd_vec_array() {
        let cmd = to_cmd_vec(["svn", "info"]);
        assert_eq!(cmd, vec![OsString::from("svn"), OsString::from("info")]);
    }

    #[test]
    fn test_to_cmd_vec_vec() {
        let v = vec!["uglifyjs".to_string(), "--compress".to_string()];
        let cmd = to_cmd_vec(&v);
        assert_eq!(cmd.len(), 2);
        assert_eq!(cmd[1], OsString::from("--compress"));
    }

    #[test]
    fn test_filter_args() {
        let args = [OsString::from("-r"), OsString::from(""), OsString::from("42")];
        assert_eq!(filter_args(&args), vec![OsString::from("-r"), OsString::from("42")]);
    }

    #[test]
    fn test_prepare_empty() {
        assert!(prepare(&[], &[]).is_err());
    }

    #[test]
    fn test_filter_rule_matches() {
        assert!(should_filter_line("WARN: Dropping unused variable tmp [app.js:12,6]"));
        assert!(should_filter_line(
            "svn: warning: W155010: The node '/usr/local/app/x' was not found."
        ));
        assert!(!should_filter_line("svn: E170013: Unable to connect to a repository"));
    }

    #[test]
    fn test_extract_error_skips_noise() {
        let stderr = "WARN: Dropping unused variable a\nParse error at app.js:3,4\nmore";
        assert_eq!(extract_error(stderr), "Parse error at app.js:3,4\nmore");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_captures_stdout() {
        let output = exec!(["echo"]; "r42").unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "r42");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_failure() {
        assert!(exec!(["false"];).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_roundtrip() {
        let out = pipe(&["cat".to_string()], b"body{color:red}").unwrap();
        assert_eq!(out, b"body{color:red}");
    }
}
