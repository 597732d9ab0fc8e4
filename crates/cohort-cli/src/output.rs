//! Shared output layer for pretty/text/JSON rendering.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for agents and pipes,
//! or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` flag
//! 2. hidden `--json` flag, `FORMAT` env var, then user config `output`
//!    (folded together by [`cohort_core::config::resolve_config`])
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use cohort_core::{ErrorCode, GroupError};
use serde::Serialize;
use std::fmt;
use std::io::{self, IsTerminal, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Token-efficient plain text for agents and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Parse a resolved mode name (`pretty`, `text`, `json`).
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Core resolution logic, separated from I/O for testability.
///
/// `format_flag` — explicit `--format` value if provided.
/// `resolved` — mode name from config resolution, if it succeeded.
/// `json_flag` — hidden `--json` alias, used when config failed to load.
/// `is_tty` — true if stdout is a TTY.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    resolved: Option<&str>,
    json_flag: bool,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if let Some(mode) = resolved.and_then(OutputMode::from_name) {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from the `--format` flag and the config-resolved
/// mode name.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    resolved: Option<&str>,
    json_flag: bool,
) -> OutputMode {
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, resolved, json_flag, is_tty)
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_mode(mode, value, &mut out, text_fn, pretty_fn)
}

fn write_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    out: &mut dyn Write,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, out)?,
        OutputMode::Pretty => pretty_fn(value, out)?,
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. `E2003`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create an error carrying the code and hint of `code`.
    pub fn coded(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

impl From<&GroupError> for CliError {
    fn from(err: &GroupError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: Some(err.suggestion()),
            error_code: Some(err.error_code().code().to_string()),
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match error.error_code {
                Some(ref code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// A failure that has already been rendered to stderr.
///
/// `main` only sets the exit status for these.
#[derive(Debug)]
pub struct Reported(pub String);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Reported {}

/// Render `error` to stderr and return it as a [`Reported`] failure.
pub fn report(mode: OutputMode, error: &CliError) -> anyhow::Error {
    match render_error(mode, error) {
        Ok(()) => anyhow::Error::new(Reported(error.message.clone())),
        Err(render_err) => render_err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered_error(mode: OutputMode, error: &CliError) -> String {
        let mut out = Vec::new();
        write_error(mode, error, &mut out).expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn format_flag_wins_over_everything() {
        let mode = resolve_output_mode_inner(Some(OutputMode::Text), Some("json"), true, true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolved_config_mode_is_used() {
        assert_eq!(
            resolve_output_mode_inner(None, Some("json"), false, true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode_inner(None, Some("pretty"), false, false),
            OutputMode::Pretty
        );
    }

    #[test]
    fn json_flag_applies_without_config() {
        let mode = resolve_output_mode_inner(None, None, true, true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn unknown_resolved_mode_falls_through_to_tty() {
        assert_eq!(
            resolve_output_mode_inner(None, Some("fancy"), false, true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, Some("fancy"), false, false),
            OutputMode::Text
        );
    }

    #[test]
    fn render_mode_dispatches_to_text_and_pretty() {
        let value = serde_json::json!({"n": 1});

        let mut text = Vec::new();
        write_mode(
            OutputMode::Text,
            &value,
            &mut text,
            |_, w| writeln!(w, "text"),
            |_, w| writeln!(w, "pretty"),
        )
        .expect("render");
        assert_eq!(String::from_utf8(text).expect("utf8"), "text\n");

        let mut json = Vec::new();
        write_mode(
            OutputMode::Json,
            &value,
            &mut json,
            |_, w| writeln!(w, "text"),
            |_, w| writeln!(w, "pretty"),
        )
        .expect("render");
        let parsed: serde_json::Value =
            serde_json::from_slice(&json).expect("json output must parse");
        assert_eq!(parsed["n"], 1);
    }

    #[test]
    fn cli_error_from_group_error_carries_code_and_hint() {
        let err = GroupError::Cycle {
            unordered: vec![1, 2],
            cycles: vec![vec![1, 2]],
        };
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2003"));
        assert!(cli.message.contains("#1, #2"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn render_error_json_wraps_in_error_object() {
        let error = CliError::coded("no snapshot", ErrorCode::SnapshotMissing);
        let out = rendered_error(OutputMode::Json, &error);
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(parsed["error"]["error_code"], "E1004");
        assert_eq!(parsed["error"]["message"], "no snapshot");
    }

    #[test]
    fn render_error_human_shows_code_and_suggestion() {
        let error = CliError::coded("no snapshot", ErrorCode::SnapshotMissing);
        let out = rendered_error(OutputMode::Text, &error);
        assert!(out.starts_with("error[E1004]: no snapshot"));
        assert!(out.contains("suggestion: Pass --snapshot"));
    }

    #[test]
    fn render_error_without_code_is_plain() {
        let error = CliError {
            message: "boom".to_string(),
            suggestion: None,
            error_code: None,
        };
        let out = rendered_error(OutputMode::Pretty, &error);
        assert_eq!(out, "error: boom\n");
    }
}
