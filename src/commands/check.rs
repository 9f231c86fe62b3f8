//! Check command implementation.

use std::path::PathBuf;

use crate::errors::{LitweaveError, Result};
use crate::interface::{weave_file, Context};

/// Options for the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Source file to check.
    pub file: PathBuf,
}

/// Weaves a file without writing it and reports every problem.
///
/// Figure backends still run, so external renderers are exercised too.
pub fn check(ctx: &Context, options: CheckOptions) -> Result<()> {
    let doc = weave_file(ctx, &options.file)?;

    if doc.is_clean() {
        println!(
            "{}: {} segment(s), no problems",
            options.file.display(),
            doc.segments.len()
        );
        return Ok(());
    }

    println!("{}", doc.error_report());
    Err(LitweaveError::DocumentErrors(doc.problem_count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_check_clean() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ok.py"), crate::test_utils::FIXTURE_SOURCE).unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        let options = CheckOptions {
            file: PathBuf::from("ok.py"),
        };
        check(&ctx, options).unwrap();
        assert!(!dir.path().join("ok.md").exists());
    }

    #[test]
    fn test_check_counts_problems() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("bad.py"),
            "#% chart x\nx = 1 / 0\n#' never\n",
        )
        .unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        let err = check(&ctx, CheckOptions { file: PathBuf::from("bad.py") }).unwrap_err();
        // unknown tag, division fault, one unresolved directive
        assert!(matches!(err, LitweaveError::DocumentErrors(3)));
    }
}
