//! Identifier derivation and allocation.
//!
//! Every terminal and nonterminal gets one Rust identifier and one index in a
//! single ordered symbol set: the table's terminals, then `ErrorToken`, then
//! the nonterminals. All emitted tables iterate this order.

use crate::error::{Error, Result};
use crate::table::{Nt, NtName, ParseTable, Terminal};
use indexmap::IndexSet;
use itertools::Itertools;
use once_cell::sync::Lazy;
use proc_macro2::{Ident, Span};
use regex::Regex;
use syn::ext::IdentExt;
use syn::parse::Parser;

static TERMINAL_NAMES: &[(&str, &str)] = &[
    ("{", "OpenBrace"),
    ("}", "CloseBrace"),
    ("(", "OpenParenthesis"),
    (")", "CloseParenthesis"),
    ("[", "OpenBracket"),
    ("]", "CloseBracket"),
    ("+", "Plus"),
    ("-", "Minus"),
    ("~", "BitwiseNot"),
    ("!", "LogicalNot"),
    ("++", "Increment"),
    ("--", "Decrement"),
    (":", "Colon"),
    ("=>", "Arrow"),
    ("=", "EqualSign"),
    ("*=", "MultiplyAssign"),
    ("/=", "DivideAssign"),
    ("%=", "RemainderAssign"),
    ("+=", "AddAssign"),
    ("-=", "SubtractAssign"),
    ("<<=", "LeftShiftAssign"),
    (">>=", "SignedRightShiftAssign"),
    (">>>=", "UnsignedRightShiftAssign"),
    ("&=", "BitwiseAndAssign"),
    ("^=", "BitwiseXorAssign"),
    ("|=", "BitwiseOrAssign"),
    ("**=", "ExponentiateAssign"),
    (".", "Dot"),
    ("**", "Exponentiate"),
    ("?.", "OptionalChain"),
    ("?", "QuestionMark"),
    ("??", "Coalesce"),
    ("*", "Star"),
    ("/", "Divide"),
    ("%", "Remainder"),
    ("<<", "LeftShift"),
    (">>", "SignedRightShift"),
    (">>>", "UnsignedRightShift"),
    ("<", "LessThan"),
    (">", "GreaterThan"),
    ("<=", "LessThanOrEqualTo"),
    (">=", "GreaterThanOrEqualTo"),
    ("==", "LaxEqual"),
    ("!=", "LaxNotEqual"),
    ("===", "StrictEqual"),
    ("!==", "StrictNotEqual"),
    ("&", "BitwiseAnd"),
    ("^", "BitwiseXor"),
    ("|", "BitwiseOr"),
    ("&&", "LogicalAnd"),
    ("||", "LogicalOr"),
    (",", "Comma"),
    ("...", "Ellipsis"),
];

static WORD_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());
static LOWER_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Rust name of a terminal.
pub fn terminal_name(terminal: &Terminal) -> String {
    match terminal {
        Terminal::End => "End".to_string(),
        Terminal::ErrorToken => "ErrorToken".to_string(),
        Terminal::Token(value) => token_name(value),
    }
}

fn token_name(value: &str) -> String {
    if let Some((_, name)) = TERMINAL_NAMES.iter().find(|(t, _)| *t == value) {
        return name.to_string();
    }
    if !value.is_empty() && value.chars().all(char::is_alphabetic) {
        return if is_lower(value) {
            capitalize(value)
        } else {
            value.to_string()
        };
    }
    let raw_name = value.chars().map(char_name).join(" ");
    let snake_case = raw_name.replace('-', " ").replace(' ', "_").to_lowercase();
    to_camel_case(&snake_case)
}

fn char_name(c: char) -> String {
    match unicode_names2::name(c) {
        Some(name) => name.to_string(),
        None => format!("U {:04X}", c as u32),
    }
}

/// `a_b` to `AB`, `abc` to `Abc`; anything else is returned unchanged.
pub fn to_camel_case(ident: &str) -> String {
    if ident.contains('_') {
        ident.split('_').map(capitalize).collect()
    } else if is_lower(ident) {
        capitalize(ident)
    } else {
        ident.to_string()
    }
}

pub fn to_snake_case(ident: &str) -> String {
    let s1 = WORD_BOUNDARY.replace_all(ident, "${1}_${2}");
    LOWER_UPPER.replace_all(&s1, "${1}_${2}").to_lowercase()
}

pub fn nonterminal_to_snake(nt: &Nt) -> String {
    let base = match &nt.name {
        NtName::Plain(name) => to_snake_case(name),
        NtName::Init { goal } => to_snake_case(&format!("Start{}", goal)),
    };
    let flags: String = nt
        .args
        .iter()
        .filter(|(_, value)| *value)
        .map(|(flag, _)| format!("_{}", to_snake_case(flag)))
        .collect();
    base + &flags
}

pub fn nonterminal_to_camel(nt: &Nt) -> String {
    to_camel_case(&nonterminal_to_snake(nt))
}

/// `"Block"` to `block`, `"Block 2"` to `block_p2`.
pub fn method_name_to_rust(name: &str) -> String {
    match name.split_once(' ') {
        Some((nt, number)) => format!("{}_p{}", to_snake_case(nt), number),
        None => to_snake_case(name),
    }
}

/// Parses `name` as an identifier. Keywords are rejected, so the result can
/// name an enum variant or a constant.
pub fn ident(name: &str) -> Result<Ident> {
    syn::parse_str::<Ident>(name).map_err(|_| Error::InvalidIdentifier(name.to_string()))
}

/// Identifier for a method or a local binding. Keywords come out as raw
/// identifiers (`r#type`); the ones that cannot be raw are rejected.
pub fn raw_ident(name: &str) -> Result<Ident> {
    if let Ok(id) = syn::parse_str::<Ident>(name) {
        return Ok(id);
    }
    match name {
        "self" | "Self" | "super" | "crate" | "_" => Err(Error::InvalidIdentifier(name.to_string())),
        _ => Ident::parse_any
            .parse_str(name)
            .map(|_| Ident::new_raw(name, Span::call_site()))
            .map_err(|_| Error::InvalidIdentifier(name.to_string())),
    }
}

// Python-style `str.islower`: at least one cased character, none uppercase.
fn is_lower(s: &str) -> bool {
    s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The shared symbol order with the identifier of every symbol.
///
/// Construction fails with [`Error::IdentifierCollision`] when two symbols of
/// the same kind derive the same identifier, so no output is produced for an
/// ambiguous table.
#[derive(Debug, Clone)]
pub struct SymbolOrder {
    terminals: IndexSet<Terminal>,
    nonterminals: IndexSet<Nt>,
    terminal_idents: Vec<Ident>,
    nonterminal_idents: Vec<Ident>,
}

impl SymbolOrder {
    pub fn new(table: &ParseTable) -> Result<Self> {
        let mut terminals: IndexSet<Terminal> = table
            .terminals
            .iter()
            .filter(|t| **t != Terminal::ErrorToken)
            .cloned()
            .collect();
        terminals.insert(Terminal::ErrorToken);
        let nonterminals: IndexSet<Nt> = table.nonterminals.iter().cloned().collect();

        let terminal_idents = allocate(terminals.iter(), terminal_name)?;
        let nonterminal_idents = allocate(nonterminals.iter(), nonterminal_to_camel)?;

        Ok(SymbolOrder {
            terminals,
            nonterminals,
            terminal_idents,
            nonterminal_idents,
        })
    }

    pub fn terminals(&self) -> impl Iterator<Item = (&Terminal, &Ident)> {
        self.terminals.iter().zip(&self.terminal_idents)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = (&Nt, &Ident)> {
        self.nonterminals.iter().zip(&self.nonterminal_idents)
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    /// Row width of the shift table.
    pub fn width(&self) -> usize {
        self.terminals.len() + self.nonterminals.len()
    }

    pub fn nonterminal_ident(&self, nt: &Nt) -> Option<&Ident> {
        self.nonterminals
            .get_index_of(nt)
            .map(|i| &self.nonterminal_idents[i])
    }

    pub fn terminal_list(&self) -> String {
        self.terminals.iter().join(", ")
    }

    pub fn nonterminal_list(&self) -> String {
        self.nonterminals.iter().join(", ")
    }
}

fn allocate<'a, K, I, F>(keys: I, name: F) -> Result<Vec<Ident>>
where
    K: std::fmt::Display + 'a,
    I: Iterator<Item = &'a K>,
    F: Fn(&K) -> String,
{
    let mut seen: indexmap::IndexMap<String, &K> = indexmap::IndexMap::new();
    let mut idents = Vec::new();
    for key in keys {
        let spelling = name(key);
        if let Some(first) = seen.get(&spelling) {
            return Err(Error::IdentifierCollision {
                first: first.to_string(),
                second: key.to_string(),
                name: spelling,
            });
        }
        idents.push(ident(&spelling)?);
        seen.insert(spelling, key);
    }
    Ok(idents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(">>>=", "UnsignedRightShiftAssign")]
    #[case(",", "Comma")]
    #[case("...", "Ellipsis")]
    #[case("get", "Get")]
    #[case("NaN", "NaN")]
    #[case("@", "CommercialAt")]
    #[case("#", "NumberSign")]
    #[case("\u{2028}", "LineSeparator")]
    #[case("${", "DollarSignLeftCurlyBracket")]
    fn test_terminal_names(#[case] terminal: &str, #[case] expected: &str) {
        assert_eq!(terminal_name(&Terminal::Token(terminal.into())), expected);
    }

    #[test]
    fn test_terminal_names_are_deterministic() {
        let t = Terminal::Token("@".into());
        let first = terminal_name(&t);
        assert!(!first.is_empty());
        assert_eq!(first, terminal_name(&t));
        assert_eq!(terminal_name(&Terminal::End), "End");
        assert_eq!(terminal_name(&Terminal::ErrorToken), "ErrorToken");
    }

    #[rstest]
    #[case("IdentifierReference", "identifier_reference")]
    #[case("HTMLComment", "html_comment")]
    #[case("Expression", "expression")]
    #[case("ES6Module", "es6_module")]
    fn test_snake_case(#[case] ident: &str, #[case] expected: &str) {
        assert_eq!(to_snake_case(ident), expected);
    }

    #[test]
    fn test_nonterminal_names_include_true_flags() {
        let nt = Nt::plain("Expression").with_arg("In", true).with_arg("Yield", false);
        assert_eq!(nonterminal_to_snake(&nt), "expression_in");
        assert_eq!(nonterminal_to_camel(&nt), "ExpressionIn");
        assert_eq!(nonterminal_to_camel(&Nt::init("Script")), "StartScript");
        assert_eq!(nonterminal_to_snake(&Nt::init("Script")).to_uppercase(), "START_SCRIPT");
    }

    #[test]
    fn test_keywords_need_raw_identifiers() {
        assert!(matches!(ident("Self"), Err(Error::InvalidIdentifier(_))));
        assert!(matches!(ident("type"), Err(Error::InvalidIdentifier(_))));
        assert_eq!(ident("Type").unwrap().to_string(), "Type");
        assert_eq!(raw_ident("type").unwrap().to_string(), "r#type");
        assert_eq!(raw_ident("value").unwrap().to_string(), "value");
        assert!(matches!(raw_ident("self"), Err(Error::InvalidIdentifier(_))));
        assert!(matches!(raw_ident("a b"), Err(Error::InvalidIdentifier(_))));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(method_name_to_rust("Block"), "block");
        assert_eq!(method_name_to_rust("ArrowParameters 3"), "arrow_parameters_p3");
    }

    #[test]
    fn test_symbol_order_appends_error_token_once() {
        let table = ParseTable {
            terminals: vec![
                Terminal::Token("x".into()),
                Terminal::ErrorToken,
                Terminal::End,
            ],
            nonterminals: vec![Nt::plain("A"), Nt::plain("B")],
            ..ParseTable::default()
        };
        let order = SymbolOrder::new(&table).unwrap();
        let names: Vec<String> = order.terminals().map(|(_, id)| id.to_string()).collect();
        assert_eq!(names, vec!["X", "End", "ErrorToken"]);
        assert_eq!(order.width(), 5);
    }

    #[test]
    fn test_nonterminal_collision_is_reported() {
        let table = ParseTable {
            nonterminals: vec![Nt::plain("FooBar"), Nt::plain("Foo_bar")],
            ..ParseTable::default()
        };
        match SymbolOrder::new(&table) {
            Err(Error::IdentifierCollision { first, second, name }) => {
                assert_eq!((first.as_str(), second.as_str()), ("FooBar", "Foo_bar"));
                assert_eq!(name, "FooBar");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
