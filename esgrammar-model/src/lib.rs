//! # esgrammar-model
//!
//! Front end for ECMArkup-style grammar notation: the lexer, the notation
//! parser, and the validated grammar model consumed by automaton builders
//! and by the `esgrammar` code generator.
//!
//! ## Pipeline
//!
//! 1. **[lexer]**: Split grammar text into tokens with source locations.
//! 2. **[parser]**: Read definitions, calling the [builder] for every construct.
//! 3. **[validator]**: Record terminals, check the model and assemble the [model::Grammar].

pub mod builder;
pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod validator;

pub use error::{Error, Location, Result};
pub use model::Grammar;

/// Reusable pipeline: tokenizes, parses and finishes the grammar.
///
/// `goals` names the nonterminals an automaton builder should start from.
/// They are recorded as given; undefined goals only produce a warning.
pub fn parse_grammar(text: &str, goals: &[&str]) -> Result<Grammar> {
    // 1. Tokenizing
    let tokens = lexer::tokenize(text)?;
    log::trace!("grammar text split into {} tokens", tokens.len());

    // 2. Parsing: from tokens to definitions
    let defs = parser::parse_definitions(&tokens, &builder::GrammarBuilder::new())?;

    // 3. Finishing and validation
    let grammar = validator::finish_grammar(defs, goals)?;
    log::debug!(
        "grammar has {} nonterminals and {} terminals",
        grammar.nonterminals.len(),
        grammar.terminals.len()
    );
    Ok(grammar)
}
