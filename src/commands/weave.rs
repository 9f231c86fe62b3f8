//! Weave command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{LitweaveError, Result};
use crate::interface::{weave_file, Context};
use crate::model::WovenDocument;

/// Serialization of the woven document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

/// Options for the weave command.
#[derive(Debug, Clone, Default)]
pub struct WeaveOptions {
    /// Source file to weave.
    pub file: PathBuf,
    /// Output file; stdout when absent.
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    /// Echo executed code before each directive.
    pub echo: bool,
}

/// Serializes a woven document.
pub fn render(doc: &WovenDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(doc.to_markdown()),
        OutputFormat::Json => {
            let mut json = doc.to_json()?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Writes a rendered document to `output`, or to stdout.
pub fn write_document(ctx: &Context, rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let path = ctx.resolve_path(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, rendered)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Executes the weave command.
///
/// The document is written even when it carries errors; the command then
/// fails with the number of problems.
pub fn weave(ctx: &mut Context, options: WeaveOptions) -> Result<()> {
    if options.echo {
        ctx.config.echo = true;
    }

    let doc = weave_file(ctx, &options.file)?;
    let rendered = render(&doc, options.format)?;
    write_document(ctx, &rendered, options.output.as_deref())?;

    if doc.is_clean() {
        Ok(())
    } else {
        eprintln!("{}", doc.error_report());
        Err(LitweaveError::DocumentErrors(doc.problem_count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FIXTURE_SOURCE;
    use tempfile::tempdir;

    #[test]
    fn test_weave_to_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("report.py"), FIXTURE_SOURCE).unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf());

        let options = WeaveOptions {
            file: PathBuf::from("report.py"),
            output: Some(PathBuf::from("out/report.md")),
            ..Default::default()
        };
        weave(&mut ctx, options).unwrap();

        let content = fs::read_to_string(dir.path().join("out/report.md")).unwrap();
        assert_eq!(content, "The value is 369.\n\n```\n1\n```\n");
    }

    #[test]
    fn test_weave_json_with_echo() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("report.py"), FIXTURE_SOURCE).unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf());

        let options = WeaveOptions {
            file: PathBuf::from("report.py"),
            output: Some(PathBuf::from("report.json")),
            format: OutputFormat::Json,
            echo: true,
        };
        weave(&mut ctx, options).unwrap();

        let json = fs::read_to_string(dir.path().join("report.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["segments"][0]["role"], "code_echo");
        assert_eq!(value["segments"][0]["content"]["text"], "foo = 1");
        assert_eq!(value["source"], "report.py");
    }

    #[test]
    fn test_weave_with_errors_still_writes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.py"), "#' ok\n#% include nope.txt\n").unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf());

        let options = WeaveOptions {
            file: PathBuf::from("bad.py"),
            output: Some(PathBuf::from("bad.md")),
            ..Default::default()
        };
        let err = weave(&mut ctx, options).unwrap_err();
        assert!(matches!(err, LitweaveError::DocumentErrors(1)));
        assert_eq!(fs::read_to_string(dir.path().join("bad.md")).unwrap(), "ok\n");
    }

    #[test]
    fn test_missing_source() {
        let dir = tempdir().unwrap();
        let mut ctx = Context::default_for_dir(dir.path().to_path_buf());
        let options = WeaveOptions {
            file: PathBuf::from("absent.py"),
            ..Default::default()
        };
        assert!(matches!(
            weave(&mut ctx, options),
            Err(LitweaveError::SourceNotFound(_))
        ));
    }
}
