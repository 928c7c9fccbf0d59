//! Side-channel information about the AST builder the generated code calls.

use crate::codegen::names::method_name_to_rust;
use crate::error::Result;
use esgrammar_model::Grammar;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Contents of the handler info file (`info.json`).
///
/// ```json
/// { "fallible-methods": ["binding_identifier"], "parser-traits": ["ParserTrait"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HandlerInfo {
    /// Builder methods returning a `Result`; calls to them get a `?`.
    pub fallible_methods: Vec<String>,
    /// Extra trait bounds required of the semantic `Handler`.
    pub parser_traits: Vec<String>,
}

impl HandlerInfo {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads the handler info, falling back to empty defaults when no file
    /// is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                log::debug!("reading handler info from {}", path.display());
                Self::from_json(&std::fs::read_to_string(path)?)
            }
            None => {
                log::warn!("handler info is not provided, assuming no fallible methods");
                Ok(Self::default())
            }
        }
    }

    pub fn is_fallible(&self, method: &str) -> bool {
        self.fallible_methods.iter().any(|m| m == method)
    }

    pub fn trait_bounds(&self) -> Result<Vec<syn::TypeParamBound>> {
        self.parser_traits
            .iter()
            .map(|t| Ok(syn::parse_str::<syn::TypeParamBound>(t)?))
            .collect()
    }
}

/// Arity of every builder method, keyed by its Rust name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodTable {
    arities: IndexMap<String, usize>,
}

impl MethodTable {
    pub fn from_grammar(grammar: &Grammar) -> Self {
        let arities = grammar
            .methods()
            .into_iter()
            .map(|(method, arity)| (method_name_to_rust(&method), arity))
            .collect();
        MethodTable { arities }
    }

    pub fn insert(&mut self, method: &str, arity: usize) {
        self.arities.insert(method.to_string(), arity);
    }

    pub fn arity(&self, method: &str) -> Option<usize> {
        self.arities.get(method).copied()
    }

    pub fn len(&self) -> usize {
        self.arities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arities.is_empty()
    }
}
