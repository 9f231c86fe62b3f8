//! Watch command implementation.

use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::errors::{LitweaveError, Result};
use crate::interface::{weave_file, Context};

use super::weave::{render, write_document, OutputFormat};

/// Options for the watch command.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Source file to weave.
    pub file: PathBuf,
    /// Output file; stdout when absent.
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    /// Poll interval in milliseconds.
    pub debounce_ms: u64,
}

fn weave_once(ctx: &Context, options: &WatchOptions) -> Result<()> {
    let doc = weave_file(ctx, &options.file)?;
    let rendered = render(&doc, options.format)?;
    write_document(ctx, &rendered, options.output.as_deref())?;
    if !doc.is_clean() {
        eprintln!("{}", doc.error_report());
    }
    Ok(())
}

/// Returns true if the event touches something other than our own output.
fn is_relevant(event: &Event, ignored: &[PathBuf]) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| !ignored.iter().any(|i| p.starts_with(i)))
}

/// Re-weaves the file whenever something in its directory changes.
pub fn watch(ctx: &Context, options: WatchOptions) -> Result<()> {
    let debounce = if options.debounce_ms > 0 {
        options.debounce_ms
    } else {
        100
    };

    let source = ctx.resolve_path(&options.file);
    let watch_dir = source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.base_dir.clone());
    let mut ignored = vec![ctx.resolve_path(&ctx.config.figure_dir)];
    if let Some(output) = &options.output {
        ignored.push(ctx.resolve_path(output));
    }

    println!("Watching {} (debounce: {}ms)...", source.display(), debounce);
    println!("Press Ctrl+C to stop.");

    if let Err(e) = weave_once(ctx, &options) {
        eprintln!("Initial weave error: {}", e);
    }

    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        move |res| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        Config::default().with_poll_interval(Duration::from_millis(debounce)),
    )
    .map_err(|e| LitweaveError::Watch(e.to_string()))?;

    watcher
        .watch(&watch_dir, RecursiveMode::Recursive)
        .map_err(|e| LitweaveError::Watch(e.to_string()))?;

    loop {
        match rx.recv() {
            Ok(event) => {
                if is_relevant(&event, &ignored) {
                    tracing::debug!("File changed: {:?}", event.paths);
                    if let Err(e) = weave_once(ctx, &options) {
                        eprintln!("Weave error: {}", e);
                    }
                }
            }
            Err(e) => {
                return Err(LitweaveError::Watch(format!("Watch error: {}", e)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, EventKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevance_filter() {
        let ignored = vec![PathBuf::from("/p/figures"), PathBuf::from("/p/out.md")];
        let modify = || EventKind::Modify(ModifyKind::Any);

        assert!(is_relevant(&event(modify(), "/p/report.py"), &ignored));
        assert!(is_relevant(&event(EventKind::Create(CreateKind::File), "/p/data.txt"), &ignored));
        assert!(!is_relevant(&event(modify(), "/p/out.md"), &ignored));
        assert!(!is_relevant(&event(modify(), "/p/figures/a.svg"), &ignored));
        assert!(!is_relevant(&event(EventKind::Access(AccessKind::Any), "/p/report.py"), &ignored));
    }
}
