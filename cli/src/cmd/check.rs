use anyhow::bail;
use qgrade_core::{action, print_success, Config};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn exec(_args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = Config::from_file_finding_in_ancestors(global_args.base_dir())?;
    let summary = action::check_questions(&cfg)?;
    if summary.num_invalid > 0 {
        bail!("{} invalid question file(s)", summary.num_invalid);
    }
    print_success!("All {} question file(s) are valid", summary.num_ok);
    Ok(())
}
