use std::io::Write;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::analysis::{self, Analyzer};
use crate::editor::{self, DraftBuilder, FormError};
use crate::models::PerformanceAnalysis;
use crate::report;
use crate::state::{Action, AnalysisTicket, Dashboard, Effect, StoreError};

const HELP: &str = "\
Commands:
  stats                         overview statistics
  list [query]                  filter the directory by name or email
  add key=value ...             create a student (name, email, gpa, attendance,
                                grade, status, notes)
  edit <id> key=value ...       update fields of an existing student
  analyze <id>                  request an AI performance insight
  show                          print the open insight
  close                         close the insight
  report                        print the full dashboard report
  quit";

#[derive(Error, Debug)]
enum ShellError {
    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("expected key=value, got {0:?}")]
    BadField(String),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

enum Step {
    Continue,
    Spawn(AnalysisTicket),
    Quit,
}

struct Completion {
    seq: u64,
    analysis: Option<PerformanceAnalysis>,
}

/// Reads commands until `quit` or end of input. Analysis requests run as
/// separate tasks so the directory stays usable while one is outstanding;
/// their results re-enter through `Action::AnalysisResolved`/`AnalysisFailed`.
pub async fn run<R, W>(
    dashboard: &mut Dashboard,
    analyzer: Arc<dyn Analyzer>,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut lines = input.lines();
    let mut in_flight = 0usize;

    writeln!(out, "EduStream dashboard. Type `help` for commands.")?;

    loop {
        tokio::select! {
            Some(done) = rx.recv(), if in_flight > 0 => {
                in_flight -= 1;
                complete(dashboard, done, out)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match execute(dashboard, &line, out) {
                    Ok(Step::Continue) => {}
                    Ok(Step::Spawn(ticket)) => {
                        in_flight += 1;
                        spawn_analysis(analyzer.clone(), ticket, tx.clone());
                    }
                    Ok(Step::Quit) => return Ok(()),
                    Err(ShellError::Io(e)) => return Err(e.into()),
                    Err(e) => writeln!(out, "error: {e}")?,
                }
            }
        }
    }

    // Input is exhausted; let outstanding requests land before returning.
    while in_flight > 0 {
        let Some(done) = rx.recv().await else {
            break;
        };
        in_flight -= 1;
        complete(dashboard, done, out)?;
    }
    Ok(())
}

fn spawn_analysis(
    analyzer: Arc<dyn Analyzer>,
    ticket: AnalysisTicket,
    tx: mpsc::UnboundedSender<Completion>,
) {
    tokio::spawn(async move {
        let analysis = analysis::analyze_student(analyzer.as_ref(), &ticket.student).await;
        let _ = tx.send(Completion {
            seq: ticket.seq,
            analysis,
        });
    });
}

fn complete<W: Write>(
    dashboard: &mut Dashboard,
    done: Completion,
    out: &mut W,
) -> anyhow::Result<()> {
    let action = match done.analysis {
        Some(analysis) => Action::AnalysisResolved {
            seq: done.seq,
            analysis,
        },
        None => Action::AnalysisFailed { seq: done.seq },
    };

    match dashboard.dispatch(action)? {
        Effect::Stale(seq) => writeln!(out, "(discarded result of request #{seq})")?,
        _ => {
            if let Some(section) = report::overlay_section(dashboard.overlay()) {
                write!(out, "{section}")?;
            }
        }
    }
    Ok(())
}

fn execute<W: Write>(
    dashboard: &mut Dashboard,
    line: &str,
    out: &mut W,
) -> Result<Step, ShellError> {
    let args = split_args(line)?;
    let Some((command, rest)) = args.split_first() else {
        return Ok(Step::Continue);
    };
    debug!(command = %command, "shell command");

    match command.as_str() {
        "help" => writeln!(out, "{HELP}")?,
        "stats" => {
            for (label, value) in report::stat_cards(&dashboard.stats()) {
                writeln!(out, "{label}: {value}")?;
            }
        }
        "list" => {
            dashboard.dispatch(Action::FilterChanged(rest.join(" ")))?;
            write!(out, "{}", report::directory_table(&dashboard.visible()))?;
        }
        "add" => {
            let mut builder = DraftBuilder::new();
            fill(&mut builder, rest)?;
            let draft = builder.build()?;
            if let Effect::Created(id) = dashboard.dispatch(Action::RecordCreated(draft))? {
                writeln!(out, "Created student {id}")?;
            }
        }
        "edit" => {
            let (id, fields) = rest
                .split_first()
                .ok_or(ShellError::Usage("edit <id> key=value ..."))?;
            let existing = dashboard
                .find(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            let mut builder = DraftBuilder::from_draft(editor::draft_from(existing));
            fill(&mut builder, fields)?;
            let action = Action::RecordUpdated {
                id: id.clone(),
                draft: builder.build()?,
            };
            if let Effect::Updated(id) = dashboard.dispatch(action)? {
                writeln!(out, "Updated student {id}")?;
            }
        }
        "analyze" => {
            let [id] = rest else {
                return Err(ShellError::Usage("analyze <id>"));
            };
            if let Effect::StartAnalysis(ticket) = dashboard.dispatch(Action::AnalysisRequested {
                student_id: id.clone(),
            })? {
                writeln!(out, "Analyzing {}...", ticket.student.name)?;
                return Ok(Step::Spawn(ticket));
            }
        }
        "show" => match report::overlay_section(dashboard.overlay()) {
            Some(section) => write!(out, "{section}")?,
            None => writeln!(out, "No analysis open.")?,
        },
        "close" => {
            dashboard.dispatch(Action::OverlayClosed)?;
        }
        "report" => {
            let today = dashboard.today();
            write!(out, "{}", report::build_report(dashboard, today))?;
        }
        "quit" | "exit" => return Ok(Step::Quit),
        other => writeln!(out, "Unknown command: {other}. Type `help` for commands.")?,
    }
    Ok(Step::Continue)
}

fn fill(builder: &mut DraftBuilder, fields: &[String]) -> Result<(), ShellError> {
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| ShellError::BadField(field.clone()))?;
        builder.set(key, value)?;
    }
    Ok(())
}

/// Whitespace-separated words; double quotes group words and are dropped.
fn split_args(line: &str) -> Result<Vec<String>, ShellError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if in_quotes {
        return Err(ShellError::UnterminatedQuote);
    }
    if started {
        args.push(current);
    }
    Ok(args)
}
