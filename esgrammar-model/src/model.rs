use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Boolean value bound to a flag of a parameterized nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// `+Flag` or `~Flag`
    Literal(bool),
    /// `?Flag`: inherit the value the caller was instantiated with.
    Var(String),
}

/// Invocation of a parameterized nonterminal, `Name[+In, ?Yield]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apply {
    pub nt: String,
    pub args: Vec<(String, FlagValue)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Terminal(String),
    Nonterminal(String),
    /// `<CHR> through <CHR>`
    Range(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookaheadRule {
    /// `== t`, `!= t` and `<! {t1, t2}`. `positive` is true only for `==`.
    Terminals { set: Vec<String>, positive: bool },
    /// `<! Nt`: excluded first set of a whole nonterminal. Left symbolic,
    /// the automaton builder expands it.
    NotNonterminal(String),
}

/// One element of a right-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// Backtick-quoted literal as it appears in the text. The finisher
    /// rewrites every occurrence to [`Element::Terminal`].
    Quoted(String),
    Terminal(String),
    Nonterminal(String),
    Apply(Apply),
    Optional(Box<Element>),
    Exclude {
        inner: Box<Element>,
        exclusions: Vec<Exclusion>,
    },
    Lookahead(LookaheadRule),
    NoLineTerminatorHere,
    Prose(String),
}

impl Element {
    /// Whether the element produces a value on the parser stack, and thus
    /// takes a positional argument in the production's reducer.
    pub fn is_concrete(&self) -> bool {
        !matches!(
            self,
            Element::Lookahead(_) | Element::NoLineTerminatorHere | Element::Prose(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMethod {
    pub method: String,
    pub args: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reducer {
    /// Pass the value at this concrete position through unchanged.
    Pass(usize),
    Call(CallMethod),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub nt: String,
    pub body: Vec<Element>,
    pub reducer: Reducer,
    /// Production id tag (`#name`) when the source gives one.
    pub id: Option<String>,
}

impl Production {
    pub fn concrete_elements(&self) -> impl Iterator<Item = &Element> {
        self.body.iter().filter(|e| e.is_concrete())
    }

    pub fn arity(&self) -> usize {
        self.concrete_elements().count()
    }
}

/// A production guarded by `[+Param]` or `[~Param]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalRhs {
    pub param: String,
    pub value: bool,
    pub production: Production,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alternative {
    Production(Production),
    Conditional(ConditionalRhs),
}

impl Alternative {
    pub fn production(&self) -> &Production {
        match self {
            Alternative::Production(p) => p,
            Alternative::Conditional(c) => &c.production,
        }
    }

    pub fn production_mut(&mut self) -> &mut Production {
        match self {
            Alternative::Production(p) => p,
            Alternative::Conditional(c) => &mut c.production,
        }
    }
}

/// The run of colons after a definition's left-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionMarker {
    /// `:` syntactic grammar.
    Syntactic,
    /// `::` lexical grammar; the name stands for an open terminal class.
    Lexical,
    /// `:::` and longer, parsed but not part of the syntactic grammar.
    Auxiliary,
}

impl DefinitionMarker {
    pub fn from_colons(colons: usize) -> Self {
        match colons {
            0 | 1 => DefinitionMarker::Syntactic,
            2 => DefinitionMarker::Lexical,
            _ => DefinitionMarker::Auxiliary,
        }
    }
}

/// A definition as produced by the builder, before the finisher runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtDef {
    pub name: String,
    /// Flag names for `Name[A, B] :` definitions.
    pub params: Option<Vec<String>>,
    pub marker: DefinitionMarker,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Productions(Vec<Alternative>),
    Parameterized {
        params: Vec<String>,
        productions: Vec<Production>,
    },
}

impl Definition {
    pub fn productions(&self) -> Box<dyn Iterator<Item = &Production> + '_> {
        match self {
            Definition::Productions(alts) => Box::new(alts.iter().map(Alternative::production)),
            Definition::Parameterized { productions, .. } => Box::new(productions.iter()),
        }
    }
}

/// Validated grammar. Built once by [`crate::validator::finish_grammar`] and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub nonterminals: IndexMap<String, Definition>,
    pub goals: Vec<String>,
    pub variable_terminals: IndexSet<String>,
    pub terminals: IndexSet<String>,
}

impl Grammar {
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.nonterminals.values().flat_map(Definition::productions)
    }

    /// Every semantic-action method named by a reducer, with its arity, in
    /// first-use order.
    pub fn methods(&self) -> IndexMap<String, usize> {
        let mut methods = IndexMap::new();
        for p in self.productions() {
            if let Reducer::Call(call) = &p.reducer {
                methods
                    .entry(call.method.clone())
                    .or_insert(call.args.len());
            }
        }
        methods
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Literal(true) => f.write_str("+"),
            FlagValue::Literal(false) => f.write_str("~"),
            FlagValue::Var(_) => f.write_str("?"),
        }
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::Terminal(t) => write!(f, "`{}`", t),
            Exclusion::Nonterminal(nt) => f.write_str(nt),
            Exclusion::Range(from, to) => write!(f, "{:?} through {:?}", from, to),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Quoted(raw) => f.write_str(raw),
            Element::Terminal(t) => write!(f, "`{}`", t),
            Element::Nonterminal(nt) => f.write_str(nt),
            Element::Apply(apply) => {
                write!(f, "{}[", apply.nt)?;
                for (i, (flag, value)) in apply.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}{}", value, flag)?;
                }
                f.write_str("]")
            }
            Element::Optional(inner) => write!(f, "{}?", inner),
            Element::Exclude { inner, exclusions } => {
                write!(f, "{} but not ", inner)?;
                for (i, e) in exclusions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
            Element::Lookahead(LookaheadRule::Terminals { set, positive }) => {
                match (set.as_slice(), positive) {
                    ([t], true) => write!(f, "[lookahead == `{}`]", t),
                    ([t], false) => write!(f, "[lookahead != `{}`]", t),
                    _ => {
                        f.write_str("[lookahead <! {")?;
                        for (i, t) in set.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "`{}`", t)?;
                        }
                        f.write_str("}]")
                    }
                }
            }
            Element::Lookahead(LookaheadRule::NotNonterminal(nt)) => {
                write!(f, "[lookahead <! {}]", nt)
            }
            Element::NoLineTerminatorHere => f.write_str("[no LineTerminator here]"),
            Element::Prose(text) => write!(f, "[> {}]", text),
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::=", self.nt)?;
        if self.body.is_empty() {
            f.write_str(" [empty]")?;
        }
        for e in &self.body {
            write!(f, " {}", e)?;
        }
        match &self.reducer {
            Reducer::Pass(i) => write!(f, " => {}", i),
            Reducer::Call(call) => {
                let args: Vec<String> = call.args.iter().map(usize::to_string).collect();
                write!(f, " => {}({})", call.method, args.join(", "))
            }
        }
    }
}
