//! Typed records describing one gradable question.
//!
//! A question descriptor is authored as TOML, loaded once, validated, and
//! then only read; nothing mutates it afterwards.

use std::result::Result as StdResult;

use serde::{Deserialize, Serialize};

use crate::{doctest, expr};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Question {
    /// Human-readable label, shown in reports. Must not be empty.
    pub name: String,
    /// Points awarded on full success. Finite and non-negative.
    pub points: f64,
    #[serde(default)]
    pub suites: Vec<Suite>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Suite {
    /// Checked top to bottom; order is significant.
    pub cases: Vec<Case>,
    /// Whether this suite contributes to the question's points.
    pub scored: bool,
    /// Statement script run before the cases, may bind variables.
    #[serde(default)]
    pub setup: String,
    /// Statement script run after the cases.
    #[serde(default)]
    pub teardown: String,
    #[serde(rename = "type")]
    pub kind: SuiteKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteKind {
    Doctest,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Case {
    /// A doctest block (see [`crate::doctest`]).
    pub code: String,
    /// Withhold the case's content and failure detail from the learner.
    #[serde(default)]
    pub hidden: bool,
    /// Withhold the expected output until the learner unlocks the case.
    #[serde(default)]
    pub locked: bool,
}

pub type ValidateResult = StdResult<(), ValidateError>;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidateError {
    #[error("Question name must not be empty")]
    EmptyName,

    #[error("Question '{name}': points must be a finite non-negative number (got {points})")]
    InvalidPoints { name: String, points: f64 },

    #[error("Question '{name}': suite {suite}, case {case}: {source}")]
    MalformedCase {
        name: String,
        suite: usize,
        case: usize,
        source: doctest::ParseError,
    },

    #[error("Question '{name}': suite {suite}, case {case}, prompt at line {line}: {source}")]
    BadPrompt {
        name: String,
        suite: usize,
        case: usize,
        line: usize,
        source: expr::ParseError,
    },

    #[error("Question '{name}': suite {suite} {section}, line {line}: {source}")]
    BadScript {
        name: String,
        suite: usize,
        section: &'static str,
        line: usize,
        source: expr::ParseError,
    },
}

impl Question {
    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load-time validation: a descriptor that passes grades without
    /// further structural surprises (run-time evaluation errors remain
    /// per-case failures).
    pub fn validate(&self) -> ValidateResult {
        if self.name.trim().is_empty() {
            return Err(ValidateError::EmptyName);
        }
        if !(self.points.is_finite() && self.points >= 0.0) {
            return Err(ValidateError::InvalidPoints {
                name: self.name.clone(),
                points: self.points,
            });
        }

        for (si, suite) in self.suites.iter().enumerate() {
            match suite.kind {
                SuiteKind::Doctest => {}
            }
            self.validate_script(si, "setup", &suite.setup)?;
            self.validate_script(si, "teardown", &suite.teardown)?;

            for (ci, case) in suite.cases.iter().enumerate() {
                let checks = doctest::parse_block(&case.code).map_err(|source| {
                    ValidateError::MalformedCase {
                        name: self.name.clone(),
                        suite: si + 1,
                        case: ci + 1,
                        source,
                    }
                })?;
                for check in &checks {
                    expr::parse_stmt(&check.source).map_err(|source| {
                        ValidateError::BadPrompt {
                            name: self.name.clone(),
                            suite: si + 1,
                            case: ci + 1,
                            line: check.line,
                            source,
                        }
                    })?;
                }
            }
        }

        if !self.suites.iter().any(|s| s.scored) {
            log::warn!(
                "Question '{}' has no scored suite and will never award points",
                self.name
            );
        }
        Ok(())
    }

    fn validate_script(&self, suite: usize, section: &'static str, src: &str) -> ValidateResult {
        for (line, stmt) in expr::script_lines(src) {
            expr::parse_stmt(stmt).map_err(|source| ValidateError::BadScript {
                name: self.name.clone(),
                suite: suite + 1,
                section,
                line,
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn minimal_question(code: &str) -> Question {
        Question {
            name: "Question x".to_owned(),
            points: 1.0,
            suites: vec![Suite {
                cases: vec![Case {
                    code: code.to_owned(),
                    hidden: false,
                    locked: false,
                }],
                scored: true,
                setup: String::new(),
                teardown: String::new(),
                kind: SuiteKind::Doctest,
            }],
        }
    }

    #[test]
    fn parse_question_from_toml() {
        let toml = r#"
            name = "Question x"
            points = 2.0

            [[suites]]
            scored = true
            type = "doctest"

            [[suites.cases]]
            code = '''
            >>> defined("x")
            true
            '''
            locked = true
        "#;
        let q = Question::from_toml(toml).unwrap();
        assert_eq!(q.name, "Question x");
        assert_eq!(q.points, 2.0);
        assert_eq!(q.suites.len(), 1);
        let suite = &q.suites[0];
        assert_eq!(suite.kind, SuiteKind::Doctest);
        assert!(suite.scored);
        assert_eq!(suite.setup, "");
        assert_eq!(suite.teardown, "");
        assert_eq!(suite.cases.len(), 1);
        assert!(!suite.cases[0].hidden);
        assert!(suite.cases[0].locked);
        q.validate().unwrap();
    }

    #[test]
    fn missing_required_field_fails_to_parse() {
        // no `points`
        let toml = r#"
            name = "Question x"
            [[suites]]
            scored = true
            type = "doctest"
            cases = []
        "#;
        assert!(Question::from_toml(toml).is_err());
    }

    #[test]
    fn unknown_suite_type_fails_to_parse() {
        let toml = r#"
            name = "Question x"
            points = 1.0
            [[suites]]
            scored = true
            type = "unittest"
            cases = []
        "#;
        assert!(Question::from_toml(toml).is_err());
    }

    #[test]
    fn empty_name_is_invalid() {
        let mut q = minimal_question(">>> 1 == 1\ntrue\n");
        q.name = "  ".to_owned();
        assert_eq!(q.validate().unwrap_err(), ValidateError::EmptyName);
    }

    #[test]
    fn negative_points_are_invalid() {
        let mut q = minimal_question(">>> 1 == 1\ntrue\n");
        q.points = -1.0;
        assert!(matches!(
            q.validate().unwrap_err(),
            ValidateError::InvalidPoints { .. }
        ));
    }

    #[test]
    fn malformed_doctest_block_is_invalid() {
        let q = minimal_question("stray output\n");
        assert!(matches!(
            q.validate().unwrap_err(),
            ValidateError::MalformedCase { suite: 1, case: 1, .. }
        ));
    }

    #[test]
    fn bad_prompt_syntax_is_invalid() {
        let q = minimal_question(">>> 0 <= <= 1\ntrue\n");
        assert!(matches!(
            q.validate().unwrap_err(),
            ValidateError::BadPrompt { suite: 1, case: 1, .. }
        ));
    }

    #[test]
    fn bad_setup_line_is_invalid() {
        let mut q = minimal_question(">>> 1 == 1\ntrue\n");
        q.suites[0].setup = "tol = = 1".to_owned();
        assert!(matches!(
            q.validate().unwrap_err(),
            ValidateError::BadScript { section: "setup", .. }
        ));
    }

    #[test]
    fn question_without_scored_suite_is_degenerate_but_valid() {
        let mut q = minimal_question(">>> 1 == 1\ntrue\n");
        q.suites[0].scored = false;
        q.validate().unwrap();

        q.suites.clear();
        q.validate().unwrap();
    }
}
