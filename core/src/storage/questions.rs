use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serdable::GlobPattern;

use crate::descriptor::Question;

/// Descriptor files in `dir` whose filename matches `include`, sorted by
/// filename so report order is stable.
pub fn enumerate_question_files(
    dir: impl AsRef<Path>,
    include: &GlobPattern,
) -> fsutil::Result<Vec<PathBuf>> {
    fsutil::files_matching_glob(dir, include)
}

pub fn load_question(path: impl AsRef<Path>) -> anyhow::Result<Question> {
    let path = path.as_ref();
    let question: Question = fsutil::read_toml_with_deserialize(path)?;
    question
        .validate()
        .with_context(|| format!("Invalid question file {:?}", path))?;
    Ok(question)
}

/// Load every matching descriptor. A broken file must not abort grading of
/// the others, so each entry carries its own result.
pub fn load_questions(
    dir: impl AsRef<Path>,
    include: &GlobPattern,
) -> fsutil::Result<Vec<(PathBuf, anyhow::Result<Question>)>> {
    let files = enumerate_question_files(dir, include)?;
    Ok(files
        .into_iter()
        .map(|path| {
            let res = load_question(&path);
            (path, res)
        })
        .collect())
}
