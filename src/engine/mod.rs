//! Execution and snapshot engine.
//!
//! Runs a scanned source top to bottom in one persistent interpreter. The
//! code between two directives is executed as one chunk; at each directive
//! the engine runs the pending chunk, then the directive's payload if its
//! kind executes one, and captures a [`Snapshot`]. A fault stops execution:
//! the directive it belongs to and every later one are left without a
//! snapshot.

mod snapshot;

pub use snapshot::Snapshot;

use tracing::debug;

use crate::errors::WeaveError;
use crate::host::{HostError, Interpreter};
use crate::readers::{Directive, LineKind, ScannedSource};
use crate::text_location::TextLocation;

/// Snapshots indexed by directive, plus the fault that stopped execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    snapshots: Vec<Option<Snapshot>>,
    fault: Option<WeaveError>,
}

impl ExecutionTrace {
    /// Snapshot of the directive at `index`, if execution reached it.
    pub fn snapshot(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index).and_then(Option::as_ref)
    }

    /// The execution fault, if any.
    pub fn fault(&self) -> Option<&WeaveError> {
        self.fault.as_ref()
    }
}

/// Code lines gathered since the previous directive.
#[derive(Default)]
struct Chunk<'a> {
    lines: Vec<(usize, &'a str)>,
}

impl<'a> Chunk<'a> {
    fn first_line(&self) -> Option<usize> {
        self.lines.first().map(|(n, _)| *n)
    }

    /// Source text with surrounding blank lines removed.
    fn text(&self) -> String {
        let texts: Vec<&str> = self.lines.iter().map(|(_, t)| *t).collect();
        let start = texts.iter().position(|t| !t.trim().is_empty());
        let end = texts.iter().rposition(|t| !t.trim().is_empty());
        match (start, end) {
            (Some(start), Some(end)) => texts[start..=end].join("\n"),
            _ => String::new(),
        }
    }
}

/// Executes a scanned source and records one snapshot per directive.
pub fn execute(scanned: &ScannedSource) -> ExecutionTrace {
    let mut interp = Interpreter::new();
    let mut snapshots: Vec<Option<Snapshot>> = vec![None; scanned.directives.len()];
    let mut chunk = Chunk::default();
    let mut next_directive = 0;

    for line in &scanned.lines {
        match line.kind {
            LineKind::Code => chunk.lines.push((line.line, &line.text)),
            LineKind::Directive(index) if index == next_directive => {
                let directive = &scanned.directives[index];
                match take_snapshot(&mut interp, &chunk, directive) {
                    Ok(snapshot) => snapshots[index] = Some(snapshot),
                    Err(fault) => {
                        return ExecutionTrace {
                            snapshots,
                            fault: Some(fault),
                        }
                    }
                }
                chunk = Chunk::default();
                next_directive += 1;
            }
            LineKind::Directive(_) | LineKind::Comment | LineKind::Invalid => {}
        }
    }

    // trailing code still runs so its faults surface
    let fault = run_chunk(&mut interp, &chunk).err();
    if fault.is_none() {
        let leftover = interp.take_output();
        if !leftover.is_empty() {
            debug!("{} byte(s) of output after the last capture", leftover.len());
        }
    }

    ExecutionTrace { snapshots, fault }
}

fn take_snapshot(
    interp: &mut Interpreter,
    chunk: &Chunk<'_>,
    directive: &Directive,
) -> Result<Snapshot, WeaveError> {
    run_chunk(interp, chunk)?;

    let stray = interp.take_artifacts();
    if !stray.is_empty() {
        debug!(
            "ignoring {} figure(s) saved outside a plot directive before line {}",
            stray.len(),
            directive.line
        );
    }

    if directive.kind().is_some_and(|kind| kind.executes_payload()) {
        debug!("running {} payload at line {}", directive.name(), directive.line);
        interp
            .run(directive.payload_lines())
            .map_err(|e| execution_fault(directive.name(), directive.line, e))?;
    }

    Ok(Snapshot::new(
        directive.line,
        interp.bindings(),
        interp.take_output(),
        chunk.text(),
        interp.take_artifacts(),
    ))
}

fn run_chunk(interp: &mut Interpreter, chunk: &Chunk<'_>) -> Result<(), WeaveError> {
    let Some(first) = chunk.first_line() else {
        return Ok(());
    };
    debug!("running {} code line(s) from line {}", chunk.lines.len(), first);
    interp
        .run(chunk.lines.iter().copied())
        .map_err(|e| execution_fault("code", first, e))
}

fn execution_fault(kind: &str, fallback_line: usize, error: HostError) -> WeaveError {
    WeaveError::Execution {
        kind: kind.to_string(),
        location: TextLocation::line_only(error.line.unwrap_or(fallback_line)),
        message: error.to_string(),
    }
}
