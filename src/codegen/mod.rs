//! Compiles a [`ParseTable`] into Rust source.
//!
//! Output sections, in order: header, symbol enumerations, shift table,
//! special cases, error codes, parser trait, `actions` / `noop_actions`,
//! `reduce` with its simulator table, and the table descriptor with the
//! start states.

pub mod actions;
pub mod names;
pub mod reduce;
pub mod shift;

use crate::error::{Error, Result};
use crate::handler_info::{HandlerInfo, MethodTable};
use crate::table::ParseTable;
use names::{nonterminal_to_snake, SymbolOrder};
use proc_macro2::{Literal, Span, TokenStream};
use quote::{format_ident, quote, ToTokens};
use std::fmt;

/// Selects the optional sections of the generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// `actions`, calling the AST builder.
    pub semantic_actions: bool,
    /// `noop_actions`, which only maintains the stack.
    pub noop_actions: bool,
    /// `reduce` and `REDUCE_SIMULATOR`, when the table carries productions.
    pub reduce: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            semantic_actions: true,
            noop_actions: true,
            reduce: true,
        }
    }
}

/// Generated parser source.
#[derive(Debug, Clone)]
pub struct GeneratedParser {
    tokens: TokenStream,
}

impl fmt::Display for GeneratedParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// WARNING: This file is autogenerated.")?;
        writeln!(f)?;
        writeln!(f, "{}", self.tokens)
    }
}

impl ToTokens for GeneratedParser {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.tokens.to_tokens(tokens);
    }
}

/// One-shot writer for a single parse table.
pub struct ParserWriter<'a> {
    table: &'a ParseTable,
    info: &'a HandlerInfo,
    methods: Option<&'a MethodTable>,
    options: EmitOptions,
    order: SymbolOrder,
    shift_count: usize,
    action_count: usize,
}

impl<'a> ParserWriter<'a> {
    /// Validates the table layout and allocates all identifiers.
    pub fn new(
        table: &'a ParseTable,
        info: &'a HandlerInfo,
        methods: Option<&'a MethodTable>,
        options: EmitOptions,
    ) -> Result<Self> {
        table.check_representation()?;
        let order = SymbolOrder::new(table)?;
        Ok(ParserWriter {
            table,
            info,
            methods,
            options,
            order,
            shift_count: table.shift_count(),
            action_count: table.action_count(),
        })
    }

    pub fn emit(&self) -> Result<GeneratedParser> {
        log::debug!(
            "emitting {} shift states and {} action states over {} symbols",
            self.shift_count,
            self.action_count,
            self.order.width()
        );

        let terms = self.terms_id();
        let shift = self.shift()?;
        let error_codes = self.error_codes()?;
        let parser_trait = self.parser_trait();
        let actions = if self.options.semantic_actions {
            self.actions(actions::Mode::Semantic)?
        } else {
            TokenStream::new()
        };
        let noop_actions = if self.options.noop_actions {
            self.actions(actions::Mode::Structural)?
        } else {
            TokenStream::new()
        };
        let (reduce, reduce_simulator) = if self.emits_reduce() {
            (self.reduce()?, self.reduce_simulator()?)
        } else {
            (TokenStream::new(), TokenStream::new())
        };
        let entry = self.entry()?;
        let header = self.header(!shift.special_cases.is_empty());
        let special_cases = shift.special_cases_tokens();
        let shift_table = shift.table;

        Ok(GeneratedParser {
            tokens: quote! {
                #header
                #terms
                #shift_table
                #special_cases
                #error_codes
                #parser_trait
                #actions
                #noop_actions
                #reduce
                #reduce_simulator
                #entry
            },
        })
    }

    fn emits_reduce(&self) -> bool {
        self.options.reduce && !self.table.productions.is_empty()
    }

    fn header(&self, has_special_cases: bool) -> TokenStream {
        let error = syn::LitInt::new("0x7fffffffffffffff", Span::call_site());
        let ast_builder = if self.emits_reduce() {
            quote!(use crate::ast_builder::AstBuilder;)
        } else {
            TokenStream::new()
        };
        let special = if has_special_cases {
            quote! {
                use crate::token::Token;
                const SPECIAL_CASE_TAG: i64 = i64::MIN;
            }
        } else {
            TokenStream::new()
        };
        quote! {
            use crate::ast_builder::AstBuilderDelegate;
            #ast_builder
            use crate::stack_value_generated::{StackValue, TryIntoStack};
            use crate::error::Result;

            const ERROR: i64 = #error;
            #special
        }
    }

    fn parser_trait(&self) -> TokenStream {
        quote! {
            pub struct TermValue<Value> {
                pub term: Term,
                pub value: Value,
            }

            pub trait ParserTrait<'alloc, Value> {
                fn shift(&mut self, tv: TermValue<Value>) -> Result<'alloc, bool>;
                fn replay(&mut self, tv: TermValue<Value>);
                fn epsilon(&mut self, state: usize);
                fn pop(&mut self) -> TermValue<Value>;
                fn check_not_on_new_line(&self, peek: usize) -> Result<'alloc, bool>;
            }
        }
    }

    fn entry(&self) -> Result<TokenStream> {
        let shift_count = Literal::usize_unsuffixed(self.shift_count);
        let action_count = Literal::usize_unsuffixed(self.action_count);
        let shift_width = Literal::usize_unsuffixed(self.order.width());

        let mut start_states = Vec::new();
        for (goal, index) in &self.table.named_goals {
            if !goal.args.is_empty() {
                return Err(Error::UnsupportedAutomatonRepresentation(format!(
                    "goal {} is instantiated with flags",
                    goal
                )));
            }
            let name = format_ident!(
                "START_STATE_{}",
                names::ident(&nonterminal_to_snake(goal).to_uppercase())?
            );
            let index = Literal::usize_unsuffixed(*index);
            start_states.push(quote!(pub static #name: usize = #index;));
        }

        Ok(quote! {
            #[derive(Clone, Copy)]
            pub struct ParseTable<'a> {
                pub shift_count: usize,
                pub action_count: usize,
                pub shift_table: &'a [i64],
                pub shift_width: usize,
                pub error_codes: &'a [Option<ErrorCode>],
            }

            impl<'a> ParseTable<'a> {
                pub fn check(&self) {
                    assert_eq!(
                        self.shift_table.len(),
                        (self.shift_count * self.shift_width) as usize
                    );
                }
            }

            pub static TABLES: ParseTable<'static> = ParseTable {
                shift_count: #shift_count,
                action_count: #action_count,
                shift_table: &SHIFT,
                shift_width: #shift_width,
                error_codes: &STATE_TO_ERROR_CODE,
            };

            #(#start_states)*
        })
    }

    /// Checks a builder call against the method table, when one is known.
    fn check_arity(&self, method: &str, found: usize) -> Result<()> {
        let expected = match self.methods.and_then(|m| m.arity(method)) {
            Some(expected) => expected,
            None => return Ok(()),
        };
        if expected != found {
            return Err(Error::MethodArity {
                method: method.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }
}
