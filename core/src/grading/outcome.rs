#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Verdict {
    /// Every check produced its expected output.
    #[strum(serialize = "PASS")]
    Pass,
    /// A check produced output different from the expected text.
    #[strum(serialize = "FAIL")]
    Fail,
    /// A prompt raised during evaluation instead of producing output.
    #[strum(serialize = "ERROR")]
    Error,
    /// The case is locked and no unlock record exists for it.
    #[strum(serialize = "LOCKED")]
    Locked,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseFailure {
    Mismatch {
        prompt: String,
        expected: String,
        actual: String,
    },
    Eval {
        prompt: String,
        message: String,
    },
    StillLocked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    /// 1-based position within the suite.
    pub ord: usize,
    pub verdict: Verdict,
    pub hidden: bool,
    pub locked: bool,
    pub failure: Option<CaseFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuiteOutcome {
    pub scored: bool,
    pub cases: Vec<CaseOutcome>,
}

impl SuiteOutcome {
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(|c| c.verdict.is_pass())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionOutcome {
    pub name: String,
    pub points_possible: f64,
    pub points_earned: f64,
    pub suites: Vec<SuiteOutcome>,
}

impl QuestionOutcome {
    /// All-or-nothing: true iff every case of every scored suite passed.
    pub fn passed(&self) -> bool {
        self.suites
            .iter()
            .filter(|s| s.scored)
            .all(SuiteOutcome::all_passed)
    }

    pub fn case_verdicts(&self) -> Vec<Verdict> {
        self.suites
            .iter()
            .flat_map(|s| s.cases.iter().map(|c| c.verdict))
            .collect()
    }
}
