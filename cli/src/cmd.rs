pub mod check;
pub mod grade;
pub mod init;
pub mod root;
pub mod unlock;

use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Run as if started in this directory
    #[arg(short = 'C', long)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    #[command(alias("c"))]
    Check(check::Args),

    #[command(alias("g"))]
    Grade(grade::Args),

    Init(init::Args),
    Root(root::Args),
    Unlock(unlock::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Check(args) => check::exec(args, self),
            Grade(args) => grade::exec(args, self),
            Init(args) => init::exec(args, self),
            Root(args) => root::exec(args, self),
            Unlock(args) => unlock::exec(args, self),
        }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(crate::util::current_dir)
    }
}
