//! `cohort detect` — discover and order the ticket group around a seed.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use cohort_core::config::EffectiveConfig;
use cohort_core::error::format_numbers;
use cohort_core::source::{SnapshotError, SnapshotSource};
use cohort_core::{ErrorCode, GroupError, GroupResult, RelationshipSource, detect_group};
use tracing::debug;

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_mode, report};

/// Arguments for `cohort detect`.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Seed ticket number.
    pub number: u64,

    /// Tracker snapshot to read (overrides `tracker.snapshot` in config).
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Tracker scope used in messages (overrides the snapshot's own scope).
    #[arg(long)]
    pub scope: Option<String>,
}

/// Execute `cohort detect`.
pub async fn run_detect(
    args: &DetectArgs,
    output: OutputMode,
    config: &EffectiveConfig,
    project_root: &Path,
) -> anyhow::Result<()> {
    let Some(path) = args
        .snapshot
        .clone()
        .or_else(|| config.snapshot_path(project_root))
    else {
        return Err(report(
            output,
            &CliError::coded("no tracker snapshot configured", ErrorCode::SnapshotMissing),
        ));
    };

    debug!(path = %path.display(), "loading tracker snapshot");
    let source = match load_source(&path, args.scope.as_deref(), config) {
        Ok(source) => source,
        Err(err) => return Err(report(output, &snapshot_error(&err))),
    };

    let result = match detect_group(&source, args.number).await {
        Ok(result) => result,
        Err(err) => return Err(report(output, &group_error(&err, &source))),
    };

    let scope = source.scope().to_string();
    render_mode(output, &result, render_group_text, |result, w| {
        render_group_pretty(result, args.number, &scope, w)
    })
}

fn load_source(
    path: &Path,
    scope_flag: Option<&str>,
    config: &EffectiveConfig,
) -> Result<SnapshotSource, SnapshotError> {
    let source = SnapshotSource::load(path)?;
    let scope = match scope_flag {
        Some(scope) => scope.to_string(),
        None if source.scope().is_empty() => config.project.tracker.scope.clone(),
        None => return Ok(source),
    };
    Ok(source.with_scope(scope))
}

fn snapshot_error(err: &SnapshotError) -> CliError {
    let code = match err {
        SnapshotError::Io { .. } => ErrorCode::SnapshotMissing,
        SnapshotError::Parse(_) | SnapshotError::DuplicateTicket(_) => ErrorCode::SnapshotInvalid,
    };
    CliError::coded(err.to_string(), code)
}

/// Map a detection failure to a CLI error, naming cycle members by title.
fn group_error(err: &GroupError, source: &SnapshotSource) -> CliError {
    let mut cli_error = CliError::from(err);
    if let GroupError::Cycle { unordered, .. } = err {
        let listed: Vec<String> = unordered
            .iter()
            .map(|&number| match source.ticket(number) {
                Some(ticket) if !ticket.title.is_empty() => format!("#{number} ({})", ticket.title),
                _ => format!("#{number}"),
            })
            .collect();
        cli_error.message = format!("dependency cycle among tickets {}", listed.join(", "));
    }
    cli_error
}

fn render_group_text(result: &GroupResult, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "order  number  state  title")?;
    for member in &result.members {
        writeln!(
            w,
            "{}  #{}  {}  {}",
            member.order, member.number, member.state, member.title
        )?;
    }
    if !result.unresolved.is_empty() {
        writeln!(w, "unresolved  {}", format_numbers(&result.unresolved))?;
    }
    Ok(())
}

fn render_group_pretty(
    result: &GroupResult,
    seed: u64,
    scope: &str,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    pretty_section(w, &format!("Ticket group for #{seed} ({scope})"))?;
    pretty_kv(
        w,
        "Primary",
        format!("#{} {}", result.primary.number, result.primary.title),
    )?;
    pretty_kv(w, "Tickets", result.total_tickets.to_string())?;
    pretty_kv(w, "Group", if result.is_group { "yes" } else { "no" })?;
    if !result.unresolved.is_empty() {
        pretty_kv(w, "Unresolved", format_numbers(&result.unresolved))?;
    }

    writeln!(w)?;
    pretty_section(w, "Implementation order")?;
    for member in &result.members {
        let state = if member.state.is_empty() {
            String::new()
        } else {
            format!(" [{}]", member.state)
        };
        writeln!(w, "{:>3}. #{}{state} {}", member.order, member.number, member.title)?;
    }
    Ok(())
}
