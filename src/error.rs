/// Errors raised while turning a parse table into Rust code.
///
/// Emission stops at the first error; no partial output is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{first} and {second} have the same camel-case spelling ({name})")]
    IdentifierCollision {
        first: String,
        second: String,
        name: String,
    },

    /// A shift state has transitions that do not fit any table column.
    #[error(
        "some edges of state {state} are not encoded ({encoded} of {expected})\n\
         state having the issue: {dump}\n\
         list of terminals: {terminals}\n\
         list of nonterminals: {nonterminals}"
    )]
    TransitionEncodingMismatch {
        state: usize,
        encoded: usize,
        expected: usize,
        dump: String,
        terminals: String,
        nonterminals: String,
    },

    #[error("unsupported {kind} action in state {state}: {detail}")]
    UnsupportedActionKind {
        kind: &'static str,
        state: usize,
        detail: String,
    },

    #[error("unsupported automaton representation: {0}")]
    UnsupportedAutomatonRepresentation(String),

    #[error("method {method} takes {expected} argument(s) but is called with {found}")]
    MethodArity {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("{0:?} is not a valid Rust identifier")]
    InvalidIdentifier(String),

    #[error("invalid {method} call in state {state}: {reason}")]
    InvalidReducer {
        method: String,
        state: usize,
        reason: String,
    },

    #[error("invalid parser trait bound: {0}")]
    InvalidTraitBound(#[from] syn::Error),

    #[error("malformed handler info: {0}")]
    HandlerInfo(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Grammar(#[from] esgrammar_model::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
