use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use super::outcome::{CaseFailure, CaseOutcome, QuestionOutcome, SuiteOutcome, Verdict};
use crate::descriptor::{Case, Question, Suite, SuiteKind};
use crate::doctest;
use crate::expr::{self, Evaluator};
use crate::value::Environment;

/// Keys of cases the learner has unlocked (see `storage::unlocks` for the
/// on-disk record).
pub type UnlockedKeys = BTreeSet<String>;

/// Stable identity of a case, used by the unlock record. Derived from the
/// question name, the suite position and the case code, so editing any of
/// them re-locks the case.
pub fn case_key(question_name: &str, suite_idx: usize, case: &Case) -> String {
    let mut h = Sha256::new();
    h.update(question_name.as_bytes());
    h.update([0]);
    h.update((suite_idx as u64).to_le_bytes());
    h.update([0]);
    h.update(case.code.as_bytes());
    hex::encode(h.finalize())
}

/// Grades questions against a learner environment.
///
/// Grading never returns an error: every way a case can go wrong becomes a
/// case verdict, so one broken question cannot abort the run.
#[derive(Debug, Clone, Default)]
pub struct GradeRunner {
    evaluator: Evaluator,
    stop_on_first_failure: bool,
    unlocked: UnlockedKeys,
}

impl GradeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tolerances(mut self, rel: f64, abs: f64) -> Self {
        self.evaluator = Evaluator::new().tolerances(rel, abs);
        self
    }

    pub fn stop_on_first_failure(mut self, enable: bool) -> Self {
        self.stop_on_first_failure = enable;
        self
    }

    pub fn unlocked(mut self, keys: UnlockedKeys) -> Self {
        self.unlocked = keys;
        self
    }

    pub fn grade(&self, question: &Question, env: &Environment) -> QuestionOutcome {
        let suites: Vec<SuiteOutcome> = question
            .suites
            .iter()
            .enumerate()
            .map(|(si, suite)| self.run_suite(question, si, suite, env.clone()))
            .collect();

        let any_scored = suites.iter().any(|s| s.scored);
        let all_scored_passed = suites
            .iter()
            .filter(|s| s.scored)
            .all(SuiteOutcome::all_passed);
        let points_earned = if any_scored && all_scored_passed {
            question.points
        } else {
            0.0
        };

        QuestionOutcome {
            name: question.name.clone(),
            points_possible: question.points,
            points_earned,
            suites,
        }
    }

    /// Each suite gets its own copy of the environment, so setup bindings
    /// never leak across suites.
    fn run_suite(
        &self,
        question: &Question,
        suite_idx: usize,
        suite: &Suite,
        mut env: Environment,
    ) -> SuiteOutcome {
        match suite.kind {
            SuiteKind::Doctest => {}
        }

        if let Err(failure) = self.run_script(&suite.setup, &mut env) {
            let cases = suite
                .cases
                .iter()
                .enumerate()
                .map(|(ci, case)| CaseOutcome {
                    ord: ci + 1,
                    verdict: Verdict::Error,
                    hidden: case.hidden,
                    locked: case.locked,
                    failure: Some(failure.clone()),
                })
                .collect();
            return SuiteOutcome {
                scored: suite.scored,
                cases,
            };
        }

        let mut cases = Vec::with_capacity(suite.cases.len());
        for (ci, case) in suite.cases.iter().enumerate() {
            let outcome = self.run_case(question, suite_idx, ci, case, &mut env);
            let failed = !outcome.verdict.is_pass();
            cases.push(outcome);
            if failed && self.stop_on_first_failure {
                break;
            }
        }

        if let Err(failure) = self.run_script(&suite.teardown, &mut env) {
            if let CaseFailure::Eval { prompt, message } = &failure {
                log::warn!(
                    "Question '{}': teardown failed at '{}': {}",
                    question.name,
                    prompt,
                    message
                );
            }
        }

        SuiteOutcome {
            scored: suite.scored,
            cases,
        }
    }

    fn run_script(&self, src: &str, env: &mut Environment) -> Result<(), CaseFailure> {
        for (line_no, line) in expr::script_lines(src) {
            let fail = |message: String| CaseFailure::Eval {
                prompt: line.to_owned(),
                message: format!("line {}: {}", line_no, message),
            };
            let stmt = expr::parse_stmt(line).map_err(|e| fail(e.to_string()))?;
            self.evaluator
                .eval_stmt(&stmt, env)
                .map_err(|e| fail(e.to_string()))?;
        }
        Ok(())
    }

    fn run_case(
        &self,
        question: &Question,
        suite_idx: usize,
        case_idx: usize,
        case: &Case,
        env: &mut Environment,
    ) -> CaseOutcome {
        let outcome = |verdict, failure| CaseOutcome {
            ord: case_idx + 1,
            verdict,
            hidden: case.hidden,
            locked: case.locked,
            failure,
        };

        if case.locked && !self.unlocked.contains(&case_key(&question.name, suite_idx, case)) {
            return outcome(Verdict::Locked, Some(CaseFailure::StillLocked));
        }

        // validation parses every block at load time; a failure here means
        // the descriptor bypassed it
        let checks = match doctest::parse_block(&case.code) {
            Ok(checks) => checks,
            Err(e) => {
                return outcome(
                    Verdict::Error,
                    Some(CaseFailure::Eval {
                        prompt: "<doctest block>".to_owned(),
                        message: e.to_string(),
                    }),
                )
            }
        };

        for check in &checks {
            let eval_failure = |message: String| {
                Some(CaseFailure::Eval {
                    prompt: check.source.clone(),
                    message,
                })
            };

            let stmt = match expr::parse_stmt(&check.source) {
                Ok(stmt) => stmt,
                Err(e) => return outcome(Verdict::Error, eval_failure(e.to_string())),
            };
            let produced = match self.evaluator.eval_stmt(&stmt, env) {
                Ok(v) => v,
                Err(e) => return outcome(Verdict::Error, eval_failure(e.to_string())),
            };

            let actual = produced.map(|v| v.to_string()).unwrap_or_default();
            if actual.trim() != check.expected {
                return outcome(
                    Verdict::Fail,
                    Some(CaseFailure::Mismatch {
                        prompt: check.source.clone(),
                        expected: check.expected.clone(),
                        actual,
                    }),
                );
            }
        }

        outcome(Verdict::Pass, None)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;

    fn p_lt_15_question() -> Question {
        let q = Question::from_toml(include_str!("../../assets/q_p_lt_15.toml")).unwrap();
        q.validate().unwrap();
        q
    }

    fn env_with(p: Value) -> Environment {
        let mut env = Environment::new();
        env.bind("p_lt_15", p);
        env
    }

    struct X {
        env: Environment,
        want_earned: f64,
        want_verdicts: Vec<Verdict>,
    }

    fn run_scenario(x: X) {
        let q = p_lt_15_question();
        let res = GradeRunner::new().grade(&q, &x.env);
        assert_eq!(res.points_possible, 1.0);
        assert_eq!(res.points_earned, x.want_earned);
        assert_eq!(res.case_verdicts(), x.want_verdicts);
    }

    #[test]
    fn scenario_a_correct_answer_earns_the_point() {
        use Verdict::*;
        run_scenario(X {
            env: env_with(Value::Number(0.87895612)),
            want_earned: 1.0,
            want_verdicts: vec![Pass, Pass, Pass, Pass],
        });
    }

    #[test]
    fn scenario_b_placeholder_left_unset_earns_nothing() {
        use Verdict::*;
        run_scenario(X {
            env: env_with(Value::Unset),
            want_earned: 0.0,
            // case 1 passes (the binding exists), case 2 fails, later cases
            // cannot even evaluate
            want_verdicts: vec![Pass, Fail, Error, Error],
        });
    }

    #[test]
    fn scenario_c_out_of_range_probability_earns_nothing() {
        use Verdict::*;
        run_scenario(X {
            env: env_with(Value::Number(1.5)),
            want_earned: 0.0,
            want_verdicts: vec![Pass, Pass, Fail, Fail],
        });
    }

    #[test]
    fn scenario_d_wrong_value_fails_only_the_closeness_case() {
        use Verdict::*;
        run_scenario(X {
            env: env_with(Value::Number(0.5)),
            want_earned: 0.0,
            want_verdicts: vec![Pass, Pass, Pass, Fail],
        });
    }

    #[test]
    fn missing_binding_reports_error_distinct_from_mismatch() {
        use Verdict::*;
        let q = p_lt_15_question();
        let res = GradeRunner::new().grade(&q, &Environment::new());
        assert_eq!(res.case_verdicts(), vec![Fail, Error, Error, Error]);

        let first = &res.suites[0].cases[0];
        assert!(matches!(
            first.failure,
            Some(CaseFailure::Mismatch { ref actual, .. }) if actual == "false"
        ));
        let second = &res.suites[0].cases[1];
        assert!(matches!(second.failure, Some(CaseFailure::Eval { .. })));
    }

    #[test]
    fn stop_on_first_failure_short_circuits_the_suite() {
        let q = p_lt_15_question();
        let res = GradeRunner::new()
            .stop_on_first_failure(true)
            .grade(&q, &Environment::new());
        assert_eq!(res.case_verdicts(), vec![Verdict::Fail]);
        assert_eq!(res.points_earned, 0.0);
    }

    fn question_with_suite(suite: Suite) -> Question {
        Question {
            name: "Question s".to_owned(),
            points: 2.0,
            suites: vec![suite],
        }
    }

    #[test]
    fn setup_bindings_are_visible_to_cases() {
        let suite = Suite {
            cases: vec![Case {
                code: ">>> isclose(x, limit / 2)\ntrue\n".to_owned(),
                hidden: false,
                locked: false,
            }],
            scored: true,
            setup: "limit = 1\nx = 0.5\n".to_owned(),
            teardown: String::new(),
            kind: SuiteKind::Doctest,
        };
        let res = GradeRunner::new().grade(&question_with_suite(suite), &Environment::new());
        assert!(res.passed());
        assert_eq!(res.points_earned, 2.0);
    }

    #[test]
    fn setup_failure_marks_every_case_as_error() {
        let suite = Suite {
            cases: vec![
                Case {
                    code: ">>> 1 == 1\ntrue\n".to_owned(),
                    hidden: false,
                    locked: false,
                },
                Case {
                    code: ">>> 2 == 2\ntrue\n".to_owned(),
                    hidden: false,
                    locked: false,
                },
            ],
            scored: true,
            setup: "x = missing + 1\n".to_owned(),
            teardown: String::new(),
            kind: SuiteKind::Doctest,
        };
        let res = GradeRunner::new().grade(&question_with_suite(suite), &Environment::new());
        assert_eq!(res.case_verdicts(), vec![Verdict::Error, Verdict::Error]);
        assert_eq!(res.points_earned, 0.0);
    }

    #[test]
    fn unscored_suite_failure_does_not_cost_points() {
        let scored = Suite {
            cases: vec![Case {
                code: ">>> 1 == 1\ntrue\n".to_owned(),
                hidden: false,
                locked: false,
            }],
            scored: true,
            setup: String::new(),
            teardown: String::new(),
            kind: SuiteKind::Doctest,
        };
        let unscored = Suite {
            cases: vec![Case {
                code: ">>> 1 == 2\ntrue\n".to_owned(),
                hidden: false,
                locked: false,
            }],
            scored: false,
            setup: String::new(),
            teardown: String::new(),
            kind: SuiteKind::Doctest,
        };
        let q = Question {
            name: "Question u".to_owned(),
            points: 1.0,
            suites: vec![scored, unscored],
        };
        let res = GradeRunner::new().grade(&q, &Environment::new());
        assert!(res.passed());
        assert_eq!(res.points_earned, 1.0);
    }

    #[test]
    fn question_without_scored_suite_awards_nothing() {
        let suite = Suite {
            cases: vec![Case {
                code: ">>> 1 == 1\ntrue\n".to_owned(),
                hidden: false,
                locked: false,
            }],
            scored: false,
            setup: String::new(),
            teardown: String::new(),
            kind: SuiteKind::Doctest,
        };
        let res = GradeRunner::new().grade(&question_with_suite(suite), &Environment::new());
        assert_eq!(res.points_earned, 0.0);
    }

    #[test]
    fn locked_case_stays_locked_without_record() {
        let case = Case {
            code: ">>> 1 == 1\ntrue\n".to_owned(),
            hidden: false,
            locked: true,
        };
        let suite = Suite {
            cases: vec![case.clone()],
            scored: true,
            setup: String::new(),
            teardown: String::new(),
            kind: SuiteKind::Doctest,
        };
        let q = question_with_suite(suite);

        let res = GradeRunner::new().grade(&q, &Environment::new());
        assert_eq!(res.case_verdicts(), vec![Verdict::Locked]);
        assert_eq!(res.points_earned, 0.0);

        // with the unlock record present the case executes normally
        let keys: UnlockedKeys = [case_key(&q.name, 0, &case)].into_iter().collect();
        let res = GradeRunner::new().unlocked(keys).grade(&q, &Environment::new());
        assert_eq!(res.case_verdicts(), vec![Verdict::Pass]);
        assert_eq!(res.points_earned, 2.0);
    }

    #[test]
    fn case_key_changes_when_code_changes() {
        let a = Case {
            code: ">>> 1 == 1\ntrue\n".to_owned(),
            hidden: false,
            locked: true,
        };
        let mut b = a.clone();
        b.code.push_str(">>> 2 == 2\ntrue\n");
        assert_ne!(case_key("q", 0, &a), case_key("q", 0, &b));
        assert_ne!(case_key("q", 0, &a), case_key("q", 1, &a));
        assert_ne!(case_key("q", 0, &a), case_key("r", 0, &a));
        assert_eq!(case_key("q", 0, &a), case_key("q", 0, &a.clone()));
    }
}
