//! The weave pipeline: scan, execute, resolve, render, substitute.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backends::FigureRequest;
use crate::engine::{self, Snapshot};
use crate::errors::{LitweaveError, Result, WeaveError};
use crate::model::{FigureRef, Segment, UnresolvedDirective, WovenDocument};
use crate::readers::{scan, Directive};
use crate::resolve::{ResolveContext, ResolverTable};
use crate::weaver::Weaver;

use super::context::Context;

/// Weaves a source text.
///
/// `source_path` is the source's path relative to the context's base
/// directory; include and figure paths are resolved against its parent.
pub fn weave_source(ctx: &Context, source: &str, source_path: Option<&Path>) -> WovenDocument {
    let scanned = scan(source, &ctx.config.markers);
    debug!(
        "scanned {} line(s), {} directive(s), {} scan error(s)",
        scanned.lines.len(),
        scanned.directives.len(),
        scanned.errors.len()
    );

    let trace = engine::execute(&scanned);

    let source_dir = source_path
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let resolve_ctx = ResolveContext {
        file_cache: ctx.file_cache.as_ref(),
        source_dir: &source_dir,
        languages: &ctx.config.languages,
    };
    let resolvers = ResolverTable::new();
    let weaver = Weaver::new(&ctx.config.markers);

    let mut doc = WovenDocument::new(source_path.map(Path::to_path_buf), &ctx.config.host_language);
    let mut errors = scanned.errors.clone();

    for (index, directive) in scanned.directives.iter().enumerate() {
        let Some(snapshot) = trace.snapshot(index) else {
            doc.unresolved.push(UnresolvedDirective {
                line: directive.line,
                kind: directive.name().to_string(),
            });
            continue;
        };

        if ctx.config.echo && !snapshot.code().is_empty() {
            doc.segments.push(Segment::code_echo(directive.line, snapshot.code()));
        }

        match resolvers.resolve(directive, snapshot, &resolve_ctx) {
            Ok(segments) => {
                for segment in segments {
                    let segment = finish_segment(ctx, &weaver, segment, directive, snapshot, &mut errors);
                    doc.segments.push(segment);
                }
            }
            Err(err) => errors.push(err),
        }
    }

    if let Some(fault) = trace.fault() {
        errors.push(fault.clone());
    }

    errors.sort_by_key(|e| e.location().line);
    doc.errors = match source_path {
        Some(path) => errors
            .into_iter()
            .map(|e| e.with_filename(path.to_path_buf()))
            .collect(),
        None => errors,
    };
    doc
}

/// Renders figures and substitutes prose; failures stay attached to the segment.
fn finish_segment(
    ctx: &Context,
    weaver: &Weaver<'_>,
    segment: Segment,
    directive: &Directive,
    snapshot: &Snapshot,
    errors: &mut Vec<WeaveError>,
) -> Segment {
    let segment = weaver.weave_segment(render_figure(ctx, segment, directive), snapshot);
    if let Some(err) = &segment.error {
        errors.push(err.clone());
    }
    segment
}

/// Returns the figure segment with its rendered artifacts, or with the
/// render error attached. Other segments pass through.
fn render_figure(ctx: &Context, segment: Segment, directive: &Directive) -> Segment {
    let target = match (segment.kind, segment.figure_ref()) {
        (Some(kind), Some(figure)) if kind.is_figure() => Some((kind, figure.clone())),
        _ => None,
    };
    let Some((kind, figure)) = target else {
        return segment;
    };
    let line = segment.line;
    let request = FigureRequest {
        kind,
        line,
        source: figure.source.clone(),
        artifacts: figure.artifacts.clone(),
    };

    let render_error = |backend: &str, message: String| WeaveError::Render {
        kind: directive.name().to_string(),
        location: directive.location(),
        backend: backend.to_string(),
        path: request.display_path(),
        message,
    };

    let result = match ctx.backends.get(kind) {
        Some(backend) => backend
            .render(&request, ctx.file_cache.as_ref())
            .map_err(|message| render_error(backend.name(), message)),
        None => Err(render_error(&figure.backend, "no backend registered".to_string())),
    };

    let rendered = |artifacts: Vec<PathBuf>| FigureRef {
        backend: figure.backend.clone(),
        source: figure.source.clone(),
        artifacts,
    };
    match result {
        Ok(artifacts) => {
            debug!("{} figure at line {} -> {:?}", kind, line, artifacts);
            Segment::figure(line, kind, rendered(artifacts))
        }
        Err(err) => Segment::figure(line, kind, rendered(request.artifacts.clone())).with_error(err),
    }
}

/// Reads and weaves a source file.
pub fn weave_file(ctx: &Context, path: &Path) -> Result<WovenDocument> {
    let relative: PathBuf = ctx.relative_path(path);
    if !ctx.file_cache.exists(&relative) {
        return Err(LitweaveError::SourceNotFound(path.to_path_buf()));
    }
    let source = ctx.file_cache.read(&relative)?;
    info!("Weaving {}", relative.display());
    Ok(weave_source(ctx, &source, Some(&relative)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use crate::io::VirtualFS;
    use crate::model::{Role, SegmentContent};
    use crate::readers::DirectiveKind;
    use crate::test_utils::{self, FakeBackend, FIXTURE_SOURCE};

    fn context(vfs: VirtualFS) -> Context {
        let mut ctx = Context::default_for_dir(PathBuf::from("/project"))
            .with_file_cache(Arc::new(vfs));
        ctx.add_backend(DirectiveKind::Diagram, FakeBackend::ok("fake-dot"));
        ctx.add_backend(DirectiveKind::Schematic, FakeBackend::failing("fake-ink", "no display"));
        ctx
    }

    fn weave(source: &str) -> WovenDocument {
        weave_source(&context(VirtualFS::new()), source, None)
    }

    fn texts(doc: &WovenDocument) -> Vec<&str> {
        doc.segments.iter().filter_map(|s| s.text()).collect()
    }

    #[test]
    fn test_fixture_end_to_end() {
        let doc = weave(FIXTURE_SOURCE);
        assert!(doc.is_clean(), "{}", doc.error_report());
        assert_eq!(
            doc.to_markdown(),
            "The value is 369.\n\n```\n1\n```\n"
        );
        assert_eq!(doc.segments[0].role, Role::Substituted);
        assert_eq!(doc.segments[1].role, Role::Literal);
    }

    #[test]
    fn test_segment_order_matches_directives() {
        let doc = weave("#' one\n#% hidden x = 1\n#% text two\nprint('three')\n#>\n");
        assert_eq!(texts(&doc), vec!["one", "two", "three\n"]);
        let lines: Vec<usize> = doc.segments.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 3, 5]);
    }

    #[test]
    fn test_ordering_of_substitutions() {
        let doc = weave("value = 1\n#' {{ value }}\nvalue = 2\n#' {{ value }}\n");
        assert_eq!(texts(&doc), vec!["1", "2"]);
    }

    #[test]
    fn test_output_capture_boundary() {
        let doc = weave("print('before')\n#>\nprint('after')\n#% output\n");
        assert_eq!(texts(&doc), vec!["before\n", "after\n"]);
    }

    #[test]
    fn test_float_bindings_substitute_exactly() {
        let doc = weave("x = 1.5\n#' x is {{ x }} and {{ 0.25 + 0.25 }}\n");
        assert!(doc.is_clean(), "{}", doc.error_report());
        assert_eq!(doc.to_markdown(), "x is 1.5 and 0.5\n");
    }

    #[test]
    fn test_hidden_produces_no_segment() {
        let doc = weave("#% hidden value = 123 * 3\n#' {{ value }}\n");
        assert_eq!(doc.segments.len(), 1);
        assert_eq!(texts(&doc), vec!["369"]);
    }

    #[test]
    fn test_unknown_tag_is_reported() {
        let doc = weave("#' a\n#% chart sales.csv\n#' b\n");
        assert_eq!(texts(&doc), vec!["a", "b"]);
        assert_eq!(doc.errors.len(), 1);
        assert!(matches!(doc.errors[0], WeaveError::Resolution { .. }));
        assert_eq!(doc.errors[0].location().line, 2);
    }

    #[test]
    fn test_scan_errors_do_not_stop_weaving() {
        let doc = weave("#%}\n#' still here\n");
        assert_eq!(texts(&doc), vec!["still here"]);
        assert!(matches!(doc.errors[0], WeaveError::Scan { .. }));
    }

    #[test]
    fn test_execution_fault_leaves_earlier_segments() {
        let doc = weave("#' before\nx = 1 / 0\n#' after\n#>\n");
        assert_eq!(texts(&doc), vec!["before"]);
        assert_eq!(
            doc.unresolved,
            vec![
                UnresolvedDirective { line: 3, kind: "text".to_string() },
                UnresolvedDirective { line: 4, kind: "output".to_string() },
            ]
        );
        assert_eq!(doc.errors.len(), 1);
        assert!(matches!(doc.errors[0], WeaveError::Execution { .. }));
    }

    #[test]
    fn test_substitution_error_keeps_segment() {
        let doc = weave("#' {{ missing }} stays\nx = 2\n#' next {{ x }}\n");
        assert_eq!(texts(&doc), vec!["{{ missing }} stays", "next 2"]);
        assert_eq!(doc.segments[0].role, Role::Prose);
        assert!(doc.segments[0].error.is_some());
        assert_eq!(doc.segments[1].role, Role::Substituted);
        assert!(matches!(doc.errors[0], WeaveError::Substitution { .. }));
    }

    #[test]
    fn test_includes_are_idempotent() {
        let vfs = VirtualFS::new()
            .with_file("docs/table.txt", "a | b\n")
            .with_file("docs/util.py", "def f():\n    return 1\n");
        let ctx = context(vfs);
        let source = "#% include table.txt\n#% listing util.py\n";
        let first = weave_source(&ctx, source, Some(Path::new("docs/report.py")));
        let second = weave_source(&ctx, source, Some(Path::new("docs/report.py")));

        assert!(first.is_clean(), "{}", first.error_report());
        assert_eq!(first.digest(), second.digest());
        assert_eq!(
            first.segments[1].content,
            SegmentContent::Listing {
                language: Some("python".to_string()),
                text: "def f():\n    return 1\n".to_string()
            }
        );
    }

    #[test]
    fn test_missing_include_names_file() {
        let doc = weave_source(
            &context(VirtualFS::new()),
            "#% include gone.txt\n",
            Some(Path::new("report.py")),
        );
        assert_eq!(doc.errors.len(), 1);
        let message = doc.errors[0].to_string();
        assert!(message.starts_with("report.py:1:"), "{}", message);
        assert!(message.contains("gone.txt"), "{}", message);
    }

    #[test]
    fn test_figures_and_render_errors() {
        let vfs = VirtualFS::new()
            .with_file("flow.dot", "digraph {}")
            .with_file("board.svg", "<svg/>")
            .with_file("logo.png", "");
        let source = "#% image logo.png\n#% diagram flow.dot\n#% schematic board.svg\n#%{ plot\n# savefig('figures/p.png')\n#%}\n";
        let doc = weave_source(&context(vfs), source, None);

        let artifacts: Vec<Vec<PathBuf>> = doc
            .segments
            .iter()
            .map(|s| s.figure_ref().unwrap().artifacts.clone())
            .collect();
        assert_eq!(
            artifacts,
            vec![
                vec![PathBuf::from("logo.png")],
                vec![PathBuf::from("figures/flow.svg")],
                vec![],
                vec![PathBuf::from("figures/p.png")],
            ]
        );

        assert_eq!(doc.errors.len(), 1);
        match &doc.errors[0] {
            WeaveError::Render { backend, path, message, .. } => {
                assert_eq!(backend, "fake-ink");
                assert_eq!(path, "board.svg");
                assert_eq!(message, "no display");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(doc.segments[2].error.is_some());
    }

    #[test]
    fn test_echo_emits_code_before_directive() {
        let mut ctx = context(VirtualFS::new());
        ctx.config.echo = true;
        let doc = weave_source(&ctx, "x = 2\nprint(x)\n#>\n#' done\n", None);
        let roles: Vec<Role> = doc.segments.iter().map(|s| s.role).collect();
        assert_eq!(roles, vec![Role::CodeEcho, Role::Literal, Role::Substituted]);
        assert_eq!(
            doc.to_markdown(),
            "```python\nx = 2\nprint(x)\n```\n\n```\n2\n```\n\ndone\n"
        );
    }

    #[test]
    fn test_weave_file() {
        let ctx = context(VirtualFS::new().with_file("report.py", FIXTURE_SOURCE));
        let doc = weave_file(&ctx, Path::new("/project/report.py")).unwrap();
        assert_eq!(doc.source, Some(PathBuf::from("report.py")));
        assert_eq!(doc.digest(), weave(FIXTURE_SOURCE).digest());

        let err = weave_file(&ctx, Path::new("missing.py")).unwrap_err();
        assert!(matches!(err, LitweaveError::SourceNotFound(_)));
    }

    #[test]
    fn test_rescanned_source_weaves_identically() {
        let scanned = scan(test_utils::FIXTURE_SOURCE, &Default::default());
        let canonical = scanned.to_source(&Default::default());
        assert_eq!(weave(&canonical).to_markdown(), weave(FIXTURE_SOURCE).to_markdown());
    }
}
