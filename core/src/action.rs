pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}
use std::path::Path;

use colored::Colorize as _;
use error::*;

use crate::config::Config;
use crate::descriptor::Case;
use crate::doctest;
use crate::grading::{case_key, GradeRunner, QuestionOutcome};
use crate::interactive;
use crate::print_success;
use crate::storage::{self, UnlockRecord};
use crate::style;

pub fn init_workspace(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if let Ok(config_filepath) = Config::find_file_in_ancestors(dir) {
        bail!(
            "Already inside a qgrade workspace.\nIf it's intentional, remove {:?} and then try again.",
            config_filepath
        );
    }

    fsutil::write_with_mkdir(dir.join(Config::FILENAME), Config::example_toml())?;
    fsutil::write_with_mkdir(
        dir.join("questions").join("q_p_lt_15.toml"),
        Config::example_question_toml(),
    )?;
    fsutil::write_with_mkdir(dir.join("answers.toml"), Config::example_answers_toml())?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub num_ok: usize,
    pub num_invalid: usize,
}

/// Load and validate every question file, reporting per-file diagnostics.
pub fn check_questions(cfg: &Config) -> Result<CheckSummary> {
    let entries = storage::load_questions(cfg.questions_dir(), &cfg.questions.include)?;

    let mut summary = CheckSummary {
        num_ok: 0,
        num_invalid: 0,
    };
    for (path, res) in &entries {
        match res {
            Ok(question) => {
                summary.num_ok += 1;
                println!(
                    "{} {} ({})",
                    " OK ".on_green().bold(),
                    path.to_string_lossy(),
                    question.name
                );
            }
            Err(e) => {
                summary.num_invalid += 1;
                println!(
                    "{} {}\n    {:#}",
                    " NG ".on_red().bold(),
                    path.to_string_lossy(),
                    e
                );
            }
        }
    }
    Ok(summary)
}

#[derive(Debug)]
pub struct GradeReport {
    pub outcomes: Vec<QuestionOutcome>,
    pub num_load_failures: usize,
}

impl GradeReport {
    pub fn total_earned(&self) -> f64 {
        self.outcomes.iter().map(|o| o.points_earned).sum()
    }

    pub fn total_possible(&self) -> f64 {
        self.outcomes.iter().map(|o| o.points_possible).sum()
    }

    pub fn all_passed(&self) -> bool {
        self.num_load_failures == 0 && self.outcomes.iter().all(QuestionOutcome::passed)
    }
}

/// Grade every question against the answers file and print the report.
/// A question file that fails to load is reported and skipped; it never
/// aborts grading of the others.
pub fn do_grade(cfg: &Config) -> Result<GradeReport> {
    let answers_path = cfg.answers_file();
    let env = storage::load_answers(&answers_path)?;
    log::info!(
        "Loaded {} answer binding(s) from {}",
        env.len(),
        answers_path.to_string_lossy()
    );

    let unlocks = UnlockRecord::load_or_default(cfg.unlocks_file())?;

    let entries = storage::load_questions(cfg.questions_dir(), &cfg.questions.include)?;

    let runner = GradeRunner::new()
        .tolerances(cfg.grading.rel_tolerance, cfg.grading.abs_tolerance)
        .stop_on_first_failure(cfg.grading.stop_on_first_failure)
        .unlocked(unlocks.keys.clone());

    let mut outcomes = Vec::with_capacity(entries.len());
    let mut num_load_failures = 0;
    for (path, res) in entries {
        match res {
            Ok(question) => {
                let outcome = runner.grade(&question, &env);
                style::print_question_result(&outcome, cfg.report.show_failure_detail);
                outcomes.push(outcome);
            }
            Err(e) => {
                num_load_failures += 1;
                log::error!("Skipping {}: {:#}", path.to_string_lossy(), e);
            }
        }
    }

    let report = GradeReport {
        outcomes,
        num_load_failures,
    };
    style::print_grade_summary(&report);
    Ok(report)
}

/// Walk every still-locked case and let the learner unlock it by typing the
/// expected output of each check.
pub fn do_unlock(cfg: &Config) -> Result<()> {
    let unlocks_path = cfg.unlocks_file();
    let mut record = UnlockRecord::load_or_default(&unlocks_path)?;

    let entries = storage::load_questions(cfg.questions_dir(), &cfg.questions.include)?;

    let mut num_attempted = 0;
    let mut num_unlocked = 0;
    for (path, res) in entries {
        let question = match res {
            Ok(q) => q,
            Err(e) => {
                log::warn!("Skipping {}: {:#}", path.to_string_lossy(), e);
                continue;
            }
        };
        for (si, suite) in question.suites.iter().enumerate() {
            for case in suite.cases.iter().filter(|c| c.locked) {
                let key = case_key(&question.name, si, case);
                if record.contains(&key) {
                    continue;
                }
                if case.hidden {
                    log::info!(
                        "Question '{}' has a hidden locked case; it cannot be unlocked interactively",
                        question.name
                    );
                    continue;
                }

                num_attempted += 1;
                if unlock_one_case(&question.name, case)? {
                    record.insert(key);
                    record.save(&unlocks_path)?;
                    num_unlocked += 1;
                    print_success!("Unlocked a case of '{}'", question.name);
                }
            }
        }
    }

    if num_attempted == 0 {
        println!("No locked cases remain.");
    } else {
        println!("Unlocked {}/{} case(s).", num_unlocked, num_attempted);
    }
    Ok(())
}

const MAX_UNLOCK_ATTEMPTS: u32 = 3;

fn unlock_one_case(question_name: &str, case: &Case) -> Result<bool> {
    // blocks are validated at load time, so this parse cannot fail
    let checks = doctest::parse_block(&case.code)?;

    println!("\n{}", format!("Unlocking: {}", question_name).bold());
    for check in &checks {
        for comment in &check.comments {
            println!("{}", format!("# {}", comment).dimmed());
        }
        println!("{} {}", ">>>".bright_black(), check.source.bold());
        if check.expected.is_empty() {
            continue;
        }

        let mut correct = false;
        for attempt in 1..=MAX_UNLOCK_ATTEMPTS {
            let guess = interactive::util::ask_text("Expected output")?;
            if guess.trim() == check.expected {
                correct = true;
                break;
            }
            if attempt < MAX_UNLOCK_ATTEMPTS {
                println!("{}", "Not quite. Try again.".yellow());
            }
        }
        if !correct {
            println!("{}", "Case remains locked.".red());
            return Ok(false);
        }
    }
    Ok(true)
}
