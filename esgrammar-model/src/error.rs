use std::fmt;

/// Errors raised while reading grammar notation and assembling the model.
///
/// Every variant is fatal for the current run; there is no partial model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The lexer could not classify a piece of input text.
    #[error("unrecognized grammar token {text:?} at {location}")]
    UnrecognizedGrammarToken { text: String, location: Location },

    /// The token stream does not follow the grammar notation.
    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },

    #[error("unsupported: multiple definitions for nonterminal {0}")]
    DuplicateNonterminalDefinition(String),

    #[error("grammar contains both a terminal `{0}` and nonterminal {0}")]
    TerminalNonterminalNameCollision(String),

    #[error("flag {flag} passed multiple times to {nt}")]
    DuplicateFlagArgument { nt: String, flag: String },

    #[error("invalid grammar: conditional alternative [{param}] used in parameterized nonterminal {nt}")]
    UnsupportedConditionalContext { nt: String, param: String },

    #[error("unsupported: lookahead > 1 token, {0}")]
    UnsupportedMultiTokenLookaheadExclusion(String),

    #[error("unrecognized grammar symbol: {symbol:?} (in {nt})")]
    MalformedTerminalLiteral { symbol: String, nt: String },

    /// A production's reducer does not line up with its concrete elements.
    #[error("{method} takes {expected} argument(s) but the production `{production}` has {found} concrete element(s)")]
    ArityMismatch {
        method: String,
        production: String,
        expected: usize,
        found: usize,
    },

    #[error("{method} reads element {index} of `{production}` more than once")]
    RepeatedArgument {
        method: String,
        production: String,
        index: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// 1-based line and column of a token in the grammar text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
