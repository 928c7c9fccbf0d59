//! The parse table handed over by an automaton builder.
//!
//! These types are read-only input for the code generator. States must be
//! indexed by their position and partitioned so that every shift state comes
//! before every action state.

use crate::error::{Error, Result};
use esgrammar_model::model::Production;
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Terminal {
    Token(String),
    /// End of input.
    End,
    /// Stands for any error-recovery transition. The generator appends it
    /// after the declared terminals; tables do not need to list it.
    ErrorToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NtName {
    Plain(String),
    /// Synthetic start nonterminal of a goal. Only ever accepted.
    Init { goal: String },
}

/// A nonterminal instance, with the boolean value of each flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nt {
    pub name: NtName,
    pub args: Vec<(String, bool)>,
}

impl Nt {
    pub fn plain(name: &str) -> Self {
        Nt {
            name: NtName::Plain(name.to_string()),
            args: Vec::new(),
        }
    }

    pub fn init(goal: &str) -> Self {
        Nt {
            name: NtName::Init {
                goal: goal.to_string(),
            },
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, flag: &str, value: bool) -> Self {
        self.args.push((flag.to_string(), value));
        self
    }

    /// The name without flag values.
    pub fn base_name(&self) -> String {
        match &self.name {
            NtName::Plain(name) => name.clone(),
            NtName::Init { goal } => format!("InitNt({})", goal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorSymbol {
    pub error_code: String,
}

/// Key of a state's transition map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(Terminal),
    Nonterminal(Nt),
    Error(ErrorSymbol),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Goto(usize),
    /// Destination depends on whether the next token starts a new line.
    IfSameLine {
        same_line: Option<usize>,
        new_line: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduce {
    pub nt: Nt,
    /// Stack slots consumed by the production.
    pub pop: usize,
    /// Lookahead slots popped with them and pushed back after the reduction.
    pub replay: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunArg {
    /// Stack slot, relative to the call's offset.
    Offset(usize),
    /// A variable bound by an earlier call of the same sequence.
    Binding(String),
    Some(Box<FunArg>),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunCall {
    pub method: String,
    pub args: Vec<FunArg>,
    pub set_to: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Reduce(Reduce),
    FunCall(FunCall),
    Seq(Vec<Action>),
    CheckNotOnNewLine { offset: i64 },
    Lookahead { terminals: Vec<Terminal>, accept: bool },
    FilterFlag { flag: String, value: bool },
    PushFlag { flag: String, value: bool },
    PopFlag { flag: String },
}

impl Action {
    /// Whether running the action changes the parser stack.
    pub fn update_stack(&self) -> bool {
        match self {
            Action::Reduce(_) => true,
            Action::Seq(actions) => actions.iter().any(Action::update_stack),
            _ => false,
        }
    }

    /// The reduction performed by this action, if any.
    pub fn reduce_with(&self) -> Option<&Reduce> {
        match self {
            Action::Reduce(reduce) => Some(reduce),
            Action::Seq(actions) => actions.iter().rev().find_map(Action::reduce_with),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct State {
    pub index: usize,
    /// Shift and goto transitions, including the error-recovery symbol.
    pub transitions: IndexMap<Symbol, Transition>,
    /// Outgoing actions with their destination state. Empty for shift states.
    pub edges: Vec<(Action, usize)>,
}

impl State {
    pub fn error_symbol(&self) -> Option<&ErrorSymbol> {
        self.transitions.keys().find_map(|s| match s {
            Symbol::Error(e) => Some(e),
            _ => None,
        })
    }

    pub fn shifted_edges(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_action_state(&self) -> bool {
        !self.edges.is_empty()
    }
}

/// A production as the reduce-mode backend sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProduction {
    pub nt: Nt,
    pub production: Production,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseTable {
    pub terminals: Vec<Terminal>,
    pub nonterminals: Vec<Nt>,
    pub states: Vec<State>,
    pub named_goals: Vec<(Nt, usize)>,
    /// Productions by index, for the table-less `reduce` function.
    pub productions: Vec<TableProduction>,
}

impl ParseTable {
    pub fn shift_count(&self) -> usize {
        self.states.iter().filter(|s| !s.is_action_state()).count()
    }

    pub fn action_count(&self) -> usize {
        self.states.len() - self.shift_count()
    }

    pub fn shift_states(&self) -> &[State] {
        &self.states[..self.shift_count()]
    }

    pub fn action_states(&self) -> &[State] {
        &self.states[self.shift_count()..]
    }

    /// Checks the layout the generator relies on.
    pub fn check_representation(&self) -> Result<()> {
        let shift_count = self.shift_count();
        for (i, state) in self.states.iter().enumerate() {
            if state.index != i {
                return Err(Error::UnsupportedAutomatonRepresentation(format!(
                    "state at position {} has index {}",
                    i, state.index
                )));
            }
            if state.is_action_state() != (i >= shift_count) {
                return Err(Error::UnsupportedAutomatonRepresentation(format!(
                    "state {} breaks the shift-then-action partition",
                    i
                )));
            }
            let error_symbols = state
                .transitions
                .keys()
                .filter(|s| matches!(s, Symbol::Error(_)))
                .count();
            if error_symbols > 1 {
                return Err(Error::UnsupportedAutomatonRepresentation(format!(
                    "state {} has {} error symbols",
                    i, error_symbols
                )));
            }
        }
        Ok(())
    }
}

/// What an automaton builder can hand over.
#[derive(Debug, Clone)]
pub enum Automaton {
    ParseTable(ParseTable),
    /// Unpacked LR states without a table layout. Not supported.
    ParserStates(Vec<State>),
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Token(t) => write!(f, "{:?}", t),
            Terminal::End => f.write_str("End()"),
            Terminal::ErrorToken => f.write_str("ErrorToken"),
        }
    }
}

impl fmt::Display for Nt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_name())?;
        if !self.args.is_empty() {
            let args = self
                .args
                .iter()
                .map(|(flag, value)| format!("{}{}", if *value { '+' } else { '~' }, flag))
                .join(", ");
            write!(f, "[{}]", args)?;
        }
        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => write!(f, "{}", t),
            Symbol::Nonterminal(nt) => write!(f, "{}", nt),
            Symbol::Error(e) => write!(f, "ErrorSymbol({})", e.error_code),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Goto(d) => write!(f, "{}", d),
            Transition::IfSameLine { same_line, new_line } => {
                write!(f, "IfSameLine({:?}, {:?})", same_line, new_line)
            }
        }
    }
}

impl fmt::Display for FunArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunArg::Offset(i) => write!(f, "{}", i),
            FunArg::Binding(name) => f.write_str(name),
            FunArg::Some(inner) => write!(f, "Some({})", inner),
            FunArg::None => f.write_str("None"),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Reduce(r) => write!(f, "Reduce({}, pop: {}, replay: {})", r.nt, r.pop, r.replay),
            Action::FunCall(call) => write!(
                f,
                "FunCall({} = {}({}) @{})",
                call.set_to,
                call.method,
                call.args.iter().join(", "),
                call.offset
            ),
            Action::Seq(actions) => write!(f, "Seq([{}])", actions.iter().join(", ")),
            Action::CheckNotOnNewLine { offset } => write!(f, "CheckNotOnNewLine({})", offset),
            Action::Lookahead { terminals, accept } => {
                write!(f, "Lookahead({{{}}}, {})", terminals.iter().join(", "), accept)
            }
            Action::FilterFlag { flag, value } => write!(f, "FilterFlag({}, {})", flag, value),
            Action::PushFlag { flag, value } => write!(f, "PushFlag({}, {})", flag, value),
            Action::PopFlag { flag } => write!(f, "PopFlag({})", flag),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State {}:", self.index)?;
        for (symbol, transition) in &self.transitions {
            write!(f, " {} --> {};", symbol, transition)?;
        }
        for (action, dest) in &self.edges {
            write!(f, " {} --> {};", action, dest)?;
        }
        Ok(())
    }
}
