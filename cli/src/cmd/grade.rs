use std::path::PathBuf;

use qgrade_core::{action, Config};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Answers file to grade (defaults to `answers.file` in qgrade.toml)
    #[arg()] // positional argument
    pub answers_file: Option<PathBuf>,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let mut cfg = Config::from_file_finding_in_ancestors(global_args.base_dir())?;
    if let Some(path) = &args.answers_file {
        cfg.answers.file = fsutil::canonicalize_path(path)?;
    }
    let _ = action::do_grade(&cfg)?;
    Ok(())
}
