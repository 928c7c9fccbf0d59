//! # esgrammar
//!
//! Back end of the grammar toolchain. Grammar text is read by
//! [`esgrammar_model`]; an external automaton builder turns the model into a
//! [`table::ParseTable`]; this crate compiles that table into Rust source:
//! symbol enumerations, a dense shift table, and per-state reduction code.

use std::io::Write;
use std::path::Path;

pub mod codegen;
pub mod error;
pub mod handler_info;
pub mod table;
pub mod testing;

pub use codegen::{EmitOptions, GeneratedParser};
pub use error::{Error, Result};
pub use esgrammar_model::{parse_grammar, Grammar};
pub use handler_info::{HandlerInfo, MethodTable};
pub use table::{Automaton, ParseTable};

pub struct Generator {
    info: HandlerInfo,
    methods: Option<MethodTable>,
    options: EmitOptions,
}

impl Generator {
    pub fn new(info: HandlerInfo) -> Self {
        Self {
            info,
            methods: None,
            options: EmitOptions::default(),
        }
    }

    /// Checks every builder call against these arities before emitting.
    pub fn with_methods(mut self, methods: MethodTable) -> Self {
        self.methods = Some(methods);
        self
    }

    pub fn with_options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn generate(&self, automaton: &Automaton) -> Result<GeneratedParser> {
        match automaton {
            Automaton::ParseTable(table) => self.generate_table(table),
            Automaton::ParserStates(_) => Err(Error::UnsupportedAutomatonRepresentation(
                "ParserStates".to_string(),
            )),
        }
    }

    pub fn generate_table(&self, table: &ParseTable) -> Result<GeneratedParser> {
        let writer =
            codegen::ParserWriter::new(table, &self.info, self.methods.as_ref(), self.options)?;
        writer.emit()
    }
}

/// Writes the generated parser for `table` to `out`.
///
/// Nothing is written unless generation succeeds as a whole.
pub fn write_rust_parse_table<W: Write>(
    out: &mut W,
    table: &ParseTable,
    handler_info: Option<&Path>,
) -> Result<()> {
    let info = HandlerInfo::load(handler_info)?;
    let parser = Generator::new(info).generate_table(table)?;
    write!(out, "{}", parser)?;
    Ok(())
}
