//! Check results reported back to the test runner

use std::fmt;

/// Verdict of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
    /// The check could not be evaluated (no lease, server unreachable, ...)
    Inconclusive,
}

impl Verdict {
    /// The runner-facing form: `None` for inconclusive
    pub fn as_option(self) -> Option<bool> {
        match self {
            Verdict::Pass => Some(true),
            Verdict::Fail => Some(false),
            Verdict::Inconclusive => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Inconclusive => "INCONCLUSIVE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a check plus a human-readable explanation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub verdict: Verdict,
    pub detail: String,
}

impl TestOutcome {
    pub fn pass<S: Into<String>>(detail: S) -> Self {
        Self {
            verdict: Verdict::Pass,
            detail: detail.into(),
        }
    }

    pub fn fail<S: Into<String>>(detail: S) -> Self {
        Self {
            verdict: Verdict::Fail,
            detail: detail.into(),
        }
    }

    pub fn inconclusive<S: Into<String>>(detail: S) -> Self {
        Self {
            verdict: Verdict::Inconclusive,
            detail: detail.into(),
        }
    }

    /// PASS or FAIL depending on `passed`
    pub fn from_bool<S: Into<String>>(passed: bool, detail: S) -> Self {
        if passed {
            Self::pass(detail)
        } else {
            Self::fail(detail)
        }
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    pub fn is_fail(&self) -> bool {
        self.verdict == Verdict::Fail
    }

    pub fn is_inconclusive(&self) -> bool {
        self.verdict == Verdict::Inconclusive
    }

    /// Convert into the `(outcome, detail)` pair the test runner consumes
    pub fn into_result(self) -> (Option<bool>, String) {
        (self.verdict.as_option(), self.detail)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.verdict, self.detail)
    }
}
