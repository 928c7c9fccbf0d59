use super::names::{ident, to_camel_case};
use super::ParserWriter;
use crate::error::{Error, Result};
use crate::table::{State, Symbol, Terminal, Transition};
use indexmap::IndexSet;
use proc_macro2::{Literal, TokenStream};
use quote::quote;

/// One cell of the shift table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    State(usize),
    Error,
    /// Index into `SPECIAL_CASES`.
    Special(usize),
}

pub(super) struct ShiftOutput {
    pub table: TokenStream,
    pub special_cases: Vec<TokenStream>,
}

impl ShiftOutput {
    pub fn special_cases_tokens(&self) -> TokenStream {
        if self.special_cases.is_empty() {
            return TokenStream::new();
        }
        let len = Literal::usize_unsuffixed(self.special_cases.len());
        let cases = &self.special_cases;
        quote! {
            static SPECIAL_CASES: [fn(&Token<'_>) -> i64; #len] = [
                #(#cases,)*
            ];
        }
    }
}

impl ParserWriter<'_> {
    pub(super) fn terms_id(&self) -> TokenStream {
        let offset = self.order.terminal_count();

        let terminal_variants = self.order.terminals().enumerate().map(|(i, (_, name))| {
            let i = Literal::usize_unsuffixed(i);
            quote!(#name = #i,)
        });
        let nonterminal_variants = self.order.nonterminals().enumerate().map(|(j, (_, name))| {
            let j = Literal::usize_unsuffixed(offset + j);
            quote!(#name = #j,)
        });
        let terminal_strs = self.order.terminals().map(|(t, name)| {
            let text = match t {
                Terminal::Token(text) => text.clone(),
                other => other.to_string(),
            };
            quote!(Term::Terminal(TerminalId::#name) => #text,)
        });
        let nonterminal_strs = self.order.nonterminals().map(|(nt, name)| {
            let text = nt.base_name();
            quote!(Term::Nonterminal(NonterminalId::#name) => #text,)
        });

        quote! {
            #[derive(Copy, Clone, Debug, PartialEq)]
            pub enum TerminalId {
                #(#terminal_variants)*
            }

            #[derive(Clone, Copy, Debug, PartialEq)]
            pub enum NonterminalId {
                #(#nonterminal_variants)*
            }

            #[derive(Clone, Copy, Debug, PartialEq)]
            pub enum Term {
                Terminal(TerminalId),
                Nonterminal(NonterminalId),
            }

            impl From<Term> for usize {
                fn from(term: Term) -> Self {
                    match term {
                        Term::Terminal(t) => t as usize,
                        Term::Nonterminal(nt) => nt as usize,
                    }
                }
            }

            impl From<Term> for &'static str {
                fn from(term: Term) -> Self {
                    match term {
                        #(#terminal_strs)*
                        #(#nonterminal_strs)*
                    }
                }
            }
        }
    }

    /// Flat `SHIFT` table, one row per shift state.
    ///
    /// Every transition of a state must land in exactly one column; the
    /// error-recovery symbol goes in the `ErrorToken` column.
    pub(super) fn shift(&self) -> Result<ShiftOutput> {
        let width = self.order.width();
        let mut cells = Vec::with_capacity(self.shift_count * width);
        let mut special_cases = Vec::new();

        for state in self.table.shift_states() {
            let mut encoded = 0;
            for (t, _) in self.order.terminals() {
                let transition = match t {
                    Terminal::ErrorToken => state
                        .transitions
                        .get(&Symbol::Terminal(Terminal::ErrorToken))
                        .or_else(|| error_transition(state)),
                    t => state.transitions.get(&Symbol::Terminal(t.clone())),
                };
                if transition.is_some() {
                    encoded += 1;
                }
                cells.push(render(transition, &mut special_cases));
            }
            for (nt, _) in self.order.nonterminals() {
                let transition = state.transitions.get(&Symbol::Nonterminal(nt.clone()));
                if transition.is_some() {
                    encoded += 1;
                }
                cells.push(render(transition, &mut special_cases));
            }

            if encoded != state.shifted_edges() {
                return Err(Error::TransitionEncodingMismatch {
                    state: state.index,
                    encoded,
                    expected: state.shifted_edges(),
                    dump: state.to_string(),
                    terminals: self.order.terminal_list(),
                    nonterminals: self.order.nonterminal_list(),
                });
            }
        }

        if !special_cases.is_empty() {
            log::debug!("allocated {} special cases", special_cases.len());
        }

        let len = Literal::usize_unsuffixed(cells.len());
        let cells = cells.into_iter().map(|cell| match cell {
            Cell::State(d) => {
                let d = Literal::i64_unsuffixed(d as i64);
                quote!(#d)
            }
            Cell::Error => quote!(ERROR),
            Cell::Special(i) => {
                let i = Literal::i64_unsuffixed(i as i64);
                quote!(SPECIAL_CASE_TAG + #i)
            }
        });

        let special_cases = special_cases
            .into_iter()
            .map(|(same_line, new_line)| {
                let same_line = destination(same_line);
                let new_line = destination(new_line);
                quote!(|token| { if token.is_on_new_line { #new_line } else { #same_line } })
            })
            .collect();

        Ok(ShiftOutput {
            table: quote! {
                #[rustfmt::skip]
                static SHIFT: [i64; #len] = [
                    #(#cells,)*
                ];
            },
            special_cases,
        })
    }

    /// `ErrorCode` in first-seen order and the per-state mapping.
    pub(super) fn error_codes(&self) -> Result<TokenStream> {
        let codes: IndexSet<&str> = self
            .table
            .shift_states()
            .iter()
            .filter_map(State::error_symbol)
            .map(|e| e.error_code.as_str())
            .collect();
        let variants = codes
            .iter()
            .map(|code| ident(&to_camel_case(code)))
            .collect::<Result<Vec<_>>>()?;

        let per_state = self
            .table
            .shift_states()
            .iter()
            .map(|state| -> Result<TokenStream> {
                match state.error_symbol() {
                    Some(e) => {
                        let code = ident(&to_camel_case(&e.error_code))?;
                        Ok(quote!(Some(ErrorCode::#code)))
                    }
                    None => Ok(quote!(None)),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let len = Literal::usize_unsuffixed(per_state.len());

        Ok(quote! {
            #[derive(Clone, Copy, Debug, PartialEq)]
            pub enum ErrorCode {
                #(#variants,)*
            }

            static STATE_TO_ERROR_CODE: [Option<ErrorCode>; #len] = [
                #(#per_state,)*
            ];
        })
    }
}

fn error_transition(state: &State) -> Option<&Transition> {
    state
        .transitions
        .iter()
        .find(|(symbol, _)| matches!(symbol, Symbol::Error(_)))
        .map(|(_, transition)| transition)
}

fn render(
    transition: Option<&Transition>,
    special_cases: &mut Vec<(Option<usize>, Option<usize>)>,
) -> Cell {
    match transition {
        None => Cell::Error,
        Some(Transition::Goto(d)) => Cell::State(*d),
        Some(Transition::IfSameLine {
            same_line,
            new_line,
        }) => {
            special_cases.push((*same_line, *new_line));
            Cell::Special(special_cases.len() - 1)
        }
    }
}

fn destination(state: Option<usize>) -> TokenStream {
    match state {
        Some(d) => {
            let d = Literal::i64_unsuffixed(d as i64);
            quote!(#d)
        }
        None => quote!(ERROR),
    }
}
