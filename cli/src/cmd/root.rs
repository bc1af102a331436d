use anyhow::Context as _;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn exec(_args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = qgrade_core::Config::from_file_finding_in_ancestors(global_args.base_dir())?;
    let root = cfg
        .root_dir()
        .context("Loaded config has no source file path")?;
    println!("{}", fsutil::canonicalize_path(root)?.to_string_lossy());
    Ok(())
}
