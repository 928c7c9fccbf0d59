//! Semantic actions run while the notation parser reduces definitions.

use crate::error::{Error, Result};
use crate::model::*;
use std::collections::HashSet;

/// A right-hand side line before it is attached to its nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rhs {
    pub guard: Option<(String, bool)>,
    pub body: Vec<Element>,
    pub id: Option<String>,
}

/// Left-hand side of a definition, `Name` or `Name[A, B]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtLhs {
    pub name: String,
    pub params: Option<Vec<String>>,
}

/// One member of a `[lookahead <! {...}]` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookaheadItem {
    Terminal(String),
    NoLineTerminatorHere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    True,
    False,
    Inherit,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GrammarBuilder;

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder
    }

    pub fn single<T>(&self, x: T) -> Vec<T> {
        vec![x]
    }

    pub fn append<T>(&self, mut xs: Vec<T>, x: T) -> Vec<T> {
        xs.push(x);
        xs
    }

    pub fn concat<T>(&self, mut xs: Vec<T>, ys: Vec<T>) -> Vec<T> {
        xs.extend(ys);
        xs
    }

    pub fn blank_line<T>(&self) -> Vec<T> {
        Vec::new()
    }

    /// Wraps a right-hand side in a production with a synthesized reducer.
    ///
    /// A sole alternative calls the method named after the nonterminal;
    /// otherwise alternative `i` calls `"<Nonterminal> <i>"`. Arguments are
    /// the positions of the concrete elements.
    pub fn to_production(&self, nt: &str, index: usize, rhs: Rhs, is_sole: bool) -> Alternative {
        let nargs = rhs.body.iter().filter(|e| e.is_concrete()).count();
        let method = if is_sole {
            nt.to_string()
        } else {
            format!("{} {}", nt, index)
        };
        let production = Production {
            nt: nt.to_string(),
            body: rhs.body,
            reducer: Reducer::Call(CallMethod {
                method,
                args: (0..nargs).collect(),
            }),
            id: rhs.id,
        };
        match rhs.guard {
            Some((param, value)) => Alternative::Conditional(ConditionalRhs {
                param,
                value,
                production,
            }),
            None => Alternative::Production(production),
        }
    }

    pub fn make_nt_def(&self, lhs: NtLhs, marker: DefinitionMarker, rhs_list: Vec<Rhs>) -> NtDef {
        let is_sole = rhs_list.len() == 1;
        let alternatives = rhs_list
            .into_iter()
            .enumerate()
            .map(|(i, rhs)| self.to_production(&lhs.name, i, rhs, is_sole))
            .collect();
        NtDef {
            name: lhs.name,
            params: lhs.params,
            marker,
            alternatives,
        }
    }

    pub fn nt_def(&self, lhs: NtLhs, marker: DefinitionMarker, rhs_lines: Vec<Rhs>) -> NtDef {
        self.make_nt_def(lhs, marker, rhs_lines)
    }

    /// `Name : one of` expands to one singleton alternative per terminal.
    pub fn nt_def_one_of(
        &self,
        lhs: NtLhs,
        marker: DefinitionMarker,
        terminals: Vec<Element>,
    ) -> NtDef {
        let rhs_list = terminals
            .into_iter()
            .map(|t| Rhs {
                guard: None,
                body: vec![t],
                id: None,
            })
            .collect();
        self.make_nt_def(lhs, marker, rhs_list)
    }

    pub fn nt_lhs(&self, name: &str, params: Option<Vec<String>>) -> NtLhs {
        NtLhs {
            name: name.to_string(),
            params,
        }
    }

    /// Strips the backticks of a quoted terminal.
    pub fn terminal(&self, quoted: &str) -> Result<String> {
        strip_backticks(quoted).ok_or_else(|| Error::MalformedTerminalLiteral {
            symbol: quoted.to_string(),
            nt: String::new(),
        })
    }

    /// Resolves a control character designator to the character it denotes.
    /// Designators naming a class of characters (`<USP>`) are kept as text.
    pub fn terminal_chr(&self, chr: &str) -> String {
        if let Some(hex) = chr.strip_prefix("U+") {
            if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return c.to_string();
            }
            return chr.to_string();
        }
        let c = match chr {
            "<TAB>" => '\u{9}',
            "<LF>" => '\u{a}',
            "<VT>" => '\u{b}',
            "<FF>" => '\u{c}',
            "<CR>" => '\u{d}',
            "<SP>" => ' ',
            "<NBSP>" => '\u{a0}',
            "<ZWNJ>" => '\u{200c}',
            "<ZWJ>" => '\u{200d}',
            "<LS>" => '\u{2028}',
            "<PS>" => '\u{2029}',
            "<ZWNBSP>" => '\u{feff}',
            _ => return chr.to_string(),
        };
        c.to_string()
    }

    pub fn rhs_line(&self, ifdef: Option<(String, bool)>, rhs: Vec<Element>, prodid: Option<&str>) -> Rhs {
        Rhs {
            guard: ifdef,
            body: rhs,
            id: prodid.map(|id| id.trim_start_matches('#').to_string()),
        }
    }

    pub fn rhs_line_prose(&self, prose: &str) -> Rhs {
        Rhs {
            guard: None,
            body: vec![Element::Prose(prose_text(prose))],
            id: None,
        }
    }

    pub fn empty_rhs(&self) -> Vec<Element> {
        Vec::new()
    }

    pub fn ifdef(&self, value: bool, nt: &str) -> (String, bool) {
        (nt.to_string(), value)
    }

    pub fn optional(&self, e: Element) -> Element {
        Element::Optional(Box::new(e))
    }

    pub fn but_not(&self, e: Element, exclusion: Exclusion) -> Element {
        self.but_not_one_of(e, vec![exclusion])
    }

    pub fn but_not_one_of(&self, e: Element, exclusions: Vec<Exclusion>) -> Element {
        Element::Exclude {
            inner: Box::new(e),
            exclusions,
        }
    }

    pub fn la_eq(&self, t: String) -> Element {
        Element::Lookahead(LookaheadRule::Terminals {
            set: vec![t],
            positive: true,
        })
    }

    pub fn la_ne(&self, t: String) -> Element {
        Element::Lookahead(LookaheadRule::Terminals {
            set: vec![t],
            positive: false,
        })
    }

    pub fn la_not_in_nonterminal(&self, nt: &str) -> Element {
        Element::Lookahead(LookaheadRule::NotNonterminal(nt.to_string()))
    }

    /// `[lookahead <! {...}]`. Only single-terminal members are supported.
    pub fn la_not_in_set(&self, exclusions: Vec<Vec<LookaheadItem>>) -> Result<Element> {
        let mut set: Vec<String> = Vec::new();
        for excl in &exclusions {
            match excl.as_slice() {
                [LookaheadItem::Terminal(t)] => {
                    if !set.contains(t) {
                        set.push(t.clone());
                    }
                }
                _ => {
                    return Err(Error::UnsupportedMultiTokenLookaheadExclusion(
                        format_lookahead_set(&exclusions),
                    ))
                }
            }
        }
        Ok(Element::Lookahead(LookaheadRule::Terminals {
            set,
            positive: false,
        }))
    }

    pub fn no_line_terminator_here(&self) -> Element {
        Element::NoLineTerminatorHere
    }

    pub fn nonterminal(&self, nt: &str) -> Element {
        Element::Nonterminal(nt.trim_matches('|').to_string())
    }

    pub fn nonterminal_apply(&self, name: &str, args: Vec<(String, FlagValue)>) -> Result<Element> {
        let mut seen = HashSet::new();
        for (flag, _) in &args {
            if !seen.insert(flag.as_str()) {
                return Err(Error::DuplicateFlagArgument {
                    nt: name.to_string(),
                    flag: flag.clone(),
                });
            }
        }
        Ok(Element::Apply(Apply {
            nt: name.to_string(),
            args,
        }))
    }

    pub fn arg_expr(&self, sigil: Sigil, argname: &str) -> (String, FlagValue) {
        let value = match sigil {
            Sigil::True => FlagValue::Literal(true),
            Sigil::False => FlagValue::Literal(false),
            Sigil::Inherit => FlagValue::Var(argname.to_string()),
        };
        (argname.to_string(), value)
    }

    pub fn exclusion_terminal(&self, t: String) -> Exclusion {
        Exclusion::Terminal(t)
    }

    pub fn exclusion_nonterminal(&self, nt: &str) -> Exclusion {
        Exclusion::Nonterminal(nt.trim_matches('|').to_string())
    }

    pub fn exclusion_chr_range(&self, from: &str, to: &str) -> Exclusion {
        Exclusion::Range(self.terminal_chr(from), self.terminal_chr(to))
    }
}

/// `` `x` `` to `x`, and ```` ``` ```` to `` ` ``.
pub(crate) fn strip_backticks(quoted: &str) -> Option<String> {
    if quoted.len() < 3 || !quoted.starts_with('`') || !quoted.ends_with('`') {
        return None;
    }
    Some(quoted[1..quoted.len() - 1].to_string())
}

fn prose_text(prose: &str) -> String {
    let text = prose
        .strip_prefix("[>")
        .and_then(|p| p.strip_suffix(']'))
        .or_else(|| prose.strip_prefix('>'))
        .unwrap_or(prose);
    text.trim().to_string()
}

fn format_lookahead_set(exclusions: &[Vec<LookaheadItem>]) -> String {
    let members: Vec<String> = exclusions
        .iter()
        .map(|excl| {
            excl.iter()
                .map(|item| match item {
                    LookaheadItem::Terminal(t) => format!("`{}`", t),
                    LookaheadItem::NoLineTerminatorHere => "[no LineTerminator here]".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    format!("{{{}}}", members.join(", "))
}
