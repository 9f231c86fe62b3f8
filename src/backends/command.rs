//! Backend that shells out to an external renderer.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::config::CommandSpec;
use crate::io::FileCache;

use super::{FigureRequest, RenderBackend};

/// Runs a configured program to turn a source file into an artifact.
///
/// The artifact is written to `figure_dir` (relative to `base_dir`) and
/// named after the source file's stem with the configured extension.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    name: String,
    spec: CommandSpec,
    base_dir: PathBuf,
    figure_dir: PathBuf,
}

impl CommandBackend {
    pub fn new(name: &str, spec: CommandSpec, base_dir: PathBuf, figure_dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            spec,
            base_dir,
            figure_dir,
        }
    }

    /// Artifact path for a source, relative to the base directory.
    pub fn output_path(&self, source: &std::path::Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "figure".to_string());
        self.figure_dir
            .join(format!("{}.{}", stem, self.spec.extension))
    }

    fn arguments(&self, input: &str, output: &str) -> Vec<String> {
        self.spec.command[1..]
            .iter()
            .map(|arg| arg.replace("{input}", input).replace("{output}", output))
            .collect()
    }
}

impl RenderBackend for CommandBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, request: &FigureRequest, files: &dyn FileCache) -> Result<Vec<PathBuf>, String> {
        let program = self
            .spec
            .command
            .first()
            .ok_or_else(|| "no command configured".to_string())?;
        let source = request
            .source
            .as_ref()
            .ok_or_else(|| "directive names no source file".to_string())?;
        if !files.exists(source) {
            return Err(format!("source not found: {}", source.display()));
        }

        let output = self.output_path(source);
        fs::create_dir_all(self.base_dir.join(&self.figure_dir))
            .map_err(|e| format!("cannot create {}: {}", self.figure_dir.display(), e))?;

        let args = self.arguments(
            &source.display().to_string(),
            &output.display().to_string(),
        );
        debug!("{}: {} {}", self.name, program, args.join(" "));

        let result = Command::new(program)
            .args(&args)
            .current_dir(&self.base_dir)
            .output()
            .map_err(|e| format!("cannot run {}: {}", program, e))?;

        if result.status.success() {
            Ok(vec![output])
        } else {
            let stderr = String::from_utf8_lossy(&result.stderr);
            Err(format!("{} exited with {}: {}", program, result.status, stderr.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RealFileCache;
    use crate::readers::DirectiveKind;
    use tempfile::tempdir;

    fn request(source: &str) -> FigureRequest {
        FigureRequest {
            kind: DirectiveKind::Diagram,
            line: 4,
            source: Some(PathBuf::from(source)),
            artifacts: vec![],
        }
    }

    #[test]
    fn test_output_path() {
        let backend = CommandBackend::new(
            "diagram",
            CommandSpec::new(&["dot", "-Tsvg", "{input}", "-o", "{output}"], "svg"),
            PathBuf::from("."),
            PathBuf::from("figures"),
        );
        assert_eq!(
            backend.output_path(std::path::Path::new("docs/flow.dot")),
            PathBuf::from("figures/flow.svg")
        );
        assert_eq!(
            backend.arguments("docs/flow.dot", "figures/flow.svg"),
            vec!["-Tsvg", "docs/flow.dot", "-o", "figures/flow.svg"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_command() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("flow.dot"), "digraph { a -> b }").unwrap();
        let backend = CommandBackend::new(
            "diagram",
            CommandSpec::new(&["cp", "{input}", "{output}"], "txt"),
            dir.path().to_path_buf(),
            PathBuf::from("figures"),
        );
        let files = RealFileCache::new(dir.path().to_path_buf());

        let artifacts = backend.render(&request("flow.dot"), &files).unwrap();
        assert_eq!(artifacts, vec![PathBuf::from("figures/flow.txt")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("figures/flow.txt")).unwrap(),
            "digraph { a -> b }"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("flow.dot"), "").unwrap();
        let backend = CommandBackend::new(
            "diagram",
            CommandSpec::new(&["false"], "svg"),
            dir.path().to_path_buf(),
            PathBuf::from("figures"),
        );
        let files = RealFileCache::new(dir.path().to_path_buf());
        let err = backend.render(&request("flow.dot"), &files).unwrap_err();
        assert!(err.starts_with("false exited with"), "{}", err);
    }

    #[test]
    fn test_missing_source_and_program() {
        let dir = tempdir().unwrap();
        let files = RealFileCache::new(dir.path().to_path_buf());
        let backend = CommandBackend::new(
            "schematic",
            CommandSpec::new(&["definitely-not-a-renderer", "{input}"], "png"),
            dir.path().to_path_buf(),
            PathBuf::from("figures"),
        );
        let err = backend.render(&request("none.svg"), &files).unwrap_err();
        assert!(err.contains("source not found"));

        fs::write(dir.path().join("s.svg"), "<svg/>").unwrap();
        let err = backend.render(&request("s.svg"), &files).unwrap_err();
        assert!(err.starts_with("cannot run definitely-not-a-renderer"), "{}", err);
    }
}
