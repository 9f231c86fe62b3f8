//! Segment resolution.
//!
//! Maps each (directive, snapshot) pair to the segments it contributes,
//! dispatching on the directive kind through a lookup table.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::config::{language_for_path, Language};
use crate::engine::Snapshot;
use crate::errors::WeaveError;
use crate::io::FileCache;
use crate::model::{FigureRef, Segment};
use crate::readers::{Directive, DirectiveKind, Tag};

/// What a resolver may consult besides the directive and its snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub file_cache: &'a dyn FileCache,
    /// Directory of the source, relative to the file cache's base.
    pub source_dir: &'a Path,
    /// Extra languages for typing listings.
    pub languages: &'a [Language],
}

impl ResolveContext<'_> {
    /// Path of a payload file as seen by the file cache.
    pub fn source_path(&self, payload: &Path) -> PathBuf {
        self.source_dir.join(payload)
    }
}

pub type ResolverFn =
    fn(&Directive, &Snapshot, &ResolveContext<'_>) -> Result<Vec<Segment>, WeaveError>;

/// Kind-indexed resolver dispatch table.
#[derive(Debug, Clone)]
pub struct ResolverTable {
    resolvers: IndexMap<DirectiveKind, ResolverFn>,
}

impl Default for ResolverTable {
    fn default() -> Self {
        let mut resolvers: IndexMap<DirectiveKind, ResolverFn> = IndexMap::new();
        resolvers.insert(DirectiveKind::Text, resolve_text);
        resolvers.insert(DirectiveKind::Output, resolve_output);
        resolvers.insert(DirectiveKind::Hidden, resolve_hidden);
        resolvers.insert(DirectiveKind::Listing, resolve_listing);
        resolvers.insert(DirectiveKind::Include, resolve_include);
        resolvers.insert(DirectiveKind::Image, resolve_path_figure);
        resolvers.insert(DirectiveKind::Plot, resolve_plot);
        resolvers.insert(DirectiveKind::Diagram, resolve_path_figure);
        resolvers.insert(DirectiveKind::Schematic, resolve_path_figure);
        Self { resolvers }
    }
}

impl ResolverTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the resolver for a kind.
    pub fn insert(&mut self, kind: DirectiveKind, resolver: ResolverFn) {
        self.resolvers.insert(kind, resolver);
    }

    /// Kinds with a registered resolver, in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = DirectiveKind> + '_ {
        self.resolvers.keys().copied()
    }

    pub fn resolve(
        &self,
        directive: &Directive,
        snapshot: &Snapshot,
        ctx: &ResolveContext<'_>,
    ) -> Result<Vec<Segment>, WeaveError> {
        let kind = match &directive.tag {
            Tag::Known(kind) => *kind,
            Tag::Unknown(name) => {
                return Err(resolution_error(
                    directive,
                    format!("unknown directive tag '{}'", name),
                ))
            }
        };
        let resolver = self
            .resolvers
            .get(&kind)
            .ok_or_else(|| resolution_error(directive, "no resolver registered"))?;
        resolver(directive, snapshot, ctx)
    }
}

fn resolution_error(directive: &Directive, message: impl Into<String>) -> WeaveError {
    WeaveError::Resolution {
        kind: directive.name().to_string(),
        location: directive.location(),
        message: message.into(),
    }
}

fn resolve_text(
    directive: &Directive,
    _snapshot: &Snapshot,
    _ctx: &ResolveContext<'_>,
) -> Result<Vec<Segment>, WeaveError> {
    Ok(vec![Segment::prose(
        directive.line,
        DirectiveKind::Text,
        directive.payload.clone(),
    )])
}

fn resolve_output(
    directive: &Directive,
    snapshot: &Snapshot,
    _ctx: &ResolveContext<'_>,
) -> Result<Vec<Segment>, WeaveError> {
    Ok(vec![Segment::literal(
        directive.line,
        DirectiveKind::Output,
        snapshot.output(),
    )])
}

fn resolve_hidden(
    _directive: &Directive,
    _snapshot: &Snapshot,
    _ctx: &ResolveContext<'_>,
) -> Result<Vec<Segment>, WeaveError> {
    Ok(Vec::new())
}

/// Validates a payload that names a single file.
fn payload_path(directive: &Directive) -> Result<PathBuf, WeaveError> {
    let path = directive.payload.trim();
    if path.is_empty() {
        return Err(resolution_error(directive, "missing file path"));
    }
    if path.contains('\n') {
        return Err(resolution_error(directive, "file path must fit on one line"));
    }
    Ok(PathBuf::from(path))
}

fn read_payload_file(
    directive: &Directive,
    ctx: &ResolveContext<'_>,
) -> Result<(PathBuf, String), WeaveError> {
    let path = payload_path(directive)?;
    let full = ctx.source_path(&path);
    let content = ctx.file_cache.read(&full).map_err(|e| {
        let message = match e.kind() {
            std::io::ErrorKind::NotFound => format!("file not found: {}", full.display()),
            _ => format!("cannot read {}: {}", full.display(), e),
        };
        resolution_error(directive, message)
    })?;
    Ok((path, content))
}

fn resolve_include(
    directive: &Directive,
    _snapshot: &Snapshot,
    ctx: &ResolveContext<'_>,
) -> Result<Vec<Segment>, WeaveError> {
    let (_, content) = read_payload_file(directive, ctx)?;
    Ok(vec![Segment::literal(
        directive.line,
        DirectiveKind::Include,
        content,
    )])
}

fn resolve_listing(
    directive: &Directive,
    _snapshot: &Snapshot,
    ctx: &ResolveContext<'_>,
) -> Result<Vec<Segment>, WeaveError> {
    let (path, content) = read_payload_file(directive, ctx)?;
    let language = language_for_path(&path, ctx.languages);
    Ok(vec![Segment::listing(
        directive.line,
        DirectiveKind::Listing,
        language,
        content,
    )])
}

fn resolve_path_figure(
    directive: &Directive,
    _snapshot: &Snapshot,
    ctx: &ResolveContext<'_>,
) -> Result<Vec<Segment>, WeaveError> {
    let kind = directive
        .kind()
        .ok_or_else(|| resolution_error(directive, "not a figure directive"))?;
    let path = payload_path(directive)?;
    Ok(vec![Segment::figure(
        directive.line,
        kind,
        FigureRef {
            backend: kind.keyword().to_string(),
            source: Some(ctx.source_path(&path)),
            artifacts: Vec::new(),
        },
    )])
}

fn resolve_plot(
    directive: &Directive,
    snapshot: &Snapshot,
    _ctx: &ResolveContext<'_>,
) -> Result<Vec<Segment>, WeaveError> {
    if snapshot.artifacts().is_empty() {
        return Err(resolution_error(
            directive,
            "plot code did not save a figure (call savefig)",
        ));
    }
    Ok(vec![Segment::figure(
        directive.line,
        DirectiveKind::Plot,
        FigureRef {
            backend: DirectiveKind::Plot.keyword().to_string(),
            source: None,
            artifacts: snapshot.artifacts().to_vec(),
        },
    )])
}
