use std::fmt;

/// A violation of one of the data-model invariants an external reader is
/// expected to uphold (see `GrammarInput`'s field documentation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    NoRules,
    RuleNotTerminated(usize),
    SentinelRuleMismatch,
    AugmentedRuleMismatch,
    EndTokenInRuleBody(usize),
    SymbolOutOfRange { rule: usize, symbol: i32 },
    GoalNotNonTerm,
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::NoRules => write!(f, "grammar has no rules"),
            GrammarError::RuleNotTerminated(r) => {
                write!(f, "rule {r} has no terminating negative marker in ritem")
            }
            GrammarError::SentinelRuleMismatch => {
                write!(f, "rules 0 and 1 must be reserved sentinel rules with lhs = 0")
            }
            GrammarError::AugmentedRuleMismatch => {
                write!(f, "rule 2 must be the augmented rule `$accept : <goal> $end`")
            }
            GrammarError::EndTokenInRuleBody(r) => {
                write!(f, "rule {r} body references $end, which may not appear in a rule body")
            }
            GrammarError::SymbolOutOfRange { rule, symbol } => {
                write!(f, "rule {rule} references out-of-range symbol {symbol}")
            }
            GrammarError::GoalNotNonTerm => write!(f, "goal symbol must be a nonterminal"),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Everything that can keep `Generator::run` from producing tables.
#[derive(Debug)]
pub enum GeneratorError {
    InvalidGrammar(GrammarError),
    /// Internal limits exceeded (state count, table size) that the
    /// underlying representation cannot carry. Not a grammar defect.
    Fatal(String),
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::InvalidGrammar(e) => write!(f, "invalid grammar: {e}"),
            GeneratorError::Fatal(msg) => write!(f, "fatal: {msg}"),
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::InvalidGrammar(e) => Some(e),
            GeneratorError::Fatal(_) => None,
        }
    }
}

impl From<GrammarError> for GeneratorError {
    fn from(e: GrammarError) -> Self {
        GeneratorError::InvalidGrammar(e)
    }
}
