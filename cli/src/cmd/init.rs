use qgrade_core::{action, print_success};
use std::path::PathBuf;

use crate::util;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = "./")]
    dir: PathBuf,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    action::init_workspace(&args.dir)?;
    print_success!(
        "Successfully initialized qgrade workspace. (path: {})",
        util::replace_homedir_to_tilde(&args.dir).to_string_lossy()
    );
    Ok(())
}
