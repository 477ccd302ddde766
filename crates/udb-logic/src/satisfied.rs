//! Three-valued truth used when a configuration is only partially known.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of evaluating a condition against incomplete knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SatisfiedResult {
    /// Known to hold.
    Yes,
    /// Known not to hold.
    No,
    /// Cannot be decided from what is currently known.
    Maybe,
}

impl std::ops::Not for SatisfiedResult {
    type Output = SatisfiedResult;

    /// Logical negation. `Maybe` stays `Maybe`.
    fn not(self) -> Self {
        match self {
            SatisfiedResult::Yes => SatisfiedResult::No,
            SatisfiedResult::No => SatisfiedResult::Yes,
            SatisfiedResult::Maybe => SatisfiedResult::Maybe,
        }
    }
}

impl SatisfiedResult {
    /// Yes only if every input is Yes; No if any input is No.
    pub fn all<I: IntoIterator<Item = SatisfiedResult>>(results: I) -> Self {
        let mut acc = SatisfiedResult::Yes;
        for r in results {
            match r {
                SatisfiedResult::No => return SatisfiedResult::No,
                SatisfiedResult::Maybe => acc = SatisfiedResult::Maybe,
                SatisfiedResult::Yes => {}
            }
        }
        acc
    }

    /// Yes if any input is Yes; No only if every input is No.
    pub fn any<I: IntoIterator<Item = SatisfiedResult>>(results: I) -> Self {
        let mut acc = SatisfiedResult::No;
        for r in results {
            match r {
                SatisfiedResult::Yes => return SatisfiedResult::Yes,
                SatisfiedResult::Maybe => acc = SatisfiedResult::Maybe,
                SatisfiedResult::No => {}
            }
        }
        acc
    }

    /// Yes only if every input is No; No if any input is Yes.
    pub fn none<I: IntoIterator<Item = SatisfiedResult>>(results: I) -> Self {
        !Self::any(results)
    }

    /// Exactly-one: Yes iff one input is Yes and none are Maybe, No if two
    /// or more are Yes (or all are No), otherwise Maybe.
    pub fn exactly_one<I: IntoIterator<Item = SatisfiedResult>>(results: I) -> Self {
        let mut yes = 0usize;
        let mut maybe = 0usize;
        for r in results {
            match r {
                SatisfiedResult::Yes => yes += 1,
                SatisfiedResult::Maybe => maybe += 1,
                SatisfiedResult::No => {}
            }
        }
        if yes >= 2 {
            SatisfiedResult::No
        } else if maybe == 0 {
            if yes == 1 {
                SatisfiedResult::Yes
            } else {
                SatisfiedResult::No
            }
        } else {
            SatisfiedResult::Maybe
        }
    }

    /// Material implication.
    pub fn implies(self, consequent: SatisfiedResult) -> Self {
        match (self, consequent) {
            (SatisfiedResult::No, _) | (_, SatisfiedResult::Yes) => SatisfiedResult::Yes,
            (SatisfiedResult::Yes, SatisfiedResult::No) => SatisfiedResult::No,
            _ => SatisfiedResult::Maybe,
        }
    }

    pub fn is_yes(self) -> bool {
        self == SatisfiedResult::Yes
    }

    pub fn is_no(self) -> bool {
        self == SatisfiedResult::No
    }

    pub fn is_maybe(self) -> bool {
        self == SatisfiedResult::Maybe
    }
}

impl From<bool> for SatisfiedResult {
    fn from(value: bool) -> Self {
        if value {
            SatisfiedResult::Yes
        } else {
            SatisfiedResult::No
        }
    }
}

impl fmt::Display for SatisfiedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SatisfiedResult::Yes => write!(f, "yes"),
            SatisfiedResult::No => write!(f, "no"),
            SatisfiedResult::Maybe => write!(f, "maybe"),
        }
    }
}
