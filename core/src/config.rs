use std::path::{Path, PathBuf};
use std::result::Result as StdResult;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::Deserialize;

use serdable::GlobPattern;

use crate::storage::UnlockRecord;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub questions: QuestionsConfig,
    pub answers: AnswersConfig,
    pub grading: GradingConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestionsConfig {
    /// Directory holding question descriptor files.
    pub dir: PathBuf,
    /// Filename glob selecting descriptor files inside `dir`.
    pub include: GlobPattern,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnswersConfig {
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradingConfig {
    pub rel_tolerance: f64,
    pub abs_tolerance: f64,
    pub stop_on_first_failure: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportConfig {
    /// Print expected/actual detail for failing cases (hidden cases stay
    /// suppressed regardless).
    pub show_failure_detail: bool,
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "qgrade.toml";

    pub fn example_toml() -> String {
        Self::asset_str(Self::FILENAME)
    }

    pub fn example_question_toml() -> String {
        Self::asset_str("q_p_lt_15.toml")
    }

    pub fn example_answers_toml() -> String {
        Self::asset_str("answers.toml")
    }

    fn asset_str(filename: &str) -> String {
        let file = Asset::get(filename).unwrap();
        std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
            .with_context(|| {
                format!(
                    "Not in a qgrade workspace dir: Cannot find '{}'",
                    Self::FILENAME
                )
            })
    }

    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_filepath = Config::find_file_in_ancestors(cur_dir)?;
        Self::from_toml_file(config_filepath)
    }

    /// Workspace root: the directory holding the config file.
    pub fn root_dir(&self) -> Option<&Path> {
        self.source_config_file.as_deref().and_then(Path::parent)
    }

    /// Resolve a config-relative path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_owned();
        }
        match self.root_dir() {
            Some(root) => root.join(path.strip_prefix(".").unwrap_or(path)),
            None => path.to_owned(),
        }
    }

    pub fn questions_dir(&self) -> PathBuf {
        self.resolve(&self.questions.dir)
    }

    pub fn answers_file(&self) -> PathBuf {
        self.resolve(&self.answers.file)
    }

    pub fn unlocks_file(&self) -> PathBuf {
        self.resolve(Path::new(UnlockRecord::FILENAME))
    }
}
