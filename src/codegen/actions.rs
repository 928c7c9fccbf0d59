//! Per-state reduction code.
//!
//! Every `(Action, destination)` edge of an action state is compiled to a
//! straight-line block. The block pops the slots the reduction consumes up
//! front, runs the actions in order and ends with a control transfer:
//! `return Ok(false)` after a replay or epsilon move, `return Ok(true)` on
//! accept.

use super::names::{method_name_to_rust, raw_ident};
use super::ParserWriter;
use crate::error::{Error, Result};
use crate::table::{Action, FunArg, FunCall, Reduce};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `actions`: calls the AST builder and converts values.
    Semantic,
    /// `noop_actions`: keeps the stack shape only.
    Structural,
}

/// Whether a local still holds a stack entry (`TermValue`) or an unwrapped
/// builder value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Packing {
    Packed,
    Unpacked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Fallthrough,
    Stop,
}

impl ParserWriter<'_> {
    pub(super) fn actions(&self, mode: Mode) -> Result<TokenStream> {
        let mut arms = Vec::with_capacity(self.action_count);
        for state in self.table.action_states() {
            let mut edges = Vec::with_capacity(state.edges.len());
            for (action, dest) in &state.edges {
                edges.push(self.compile_edge(mode, state.index, action, *dest)?);
            }
            let index = Literal::usize_unsuffixed(state.index);
            arms.push(quote! {
                #index => {
                    #(#edges)*
                }
            });
        }

        let (name, bounds) = match mode {
            Mode::Semantic => {
                let extra = self.info.trait_bounds()?;
                (
                    quote!(actions),
                    quote!(ParserTrait<'alloc, StackValue<'alloc>> + AstBuilderDelegate<'alloc> #(+ #extra)*),
                )
            }
            Mode::Structural => (quote!(noop_actions), quote!(ParserTrait<'alloc, ()>)),
        };

        Ok(quote! {
            pub fn #name<'alloc, Handler>(parser: &mut Handler, state: usize) -> Result<'alloc, bool>
            where
                Handler: #bounds
            {
                match state {
                    #(#arms)*
                    _ => panic!("no such state: {}", state),
                }
            }
        })
    }

    fn compile_edge(&self, mode: Mode, state: usize, action: &Action, dest: usize) -> Result<TokenStream> {
        log::trace!("state {}: {} --> {}", state, action, dest);

        // A bare reduction pops its own slots.
        let action = match action {
            Action::Reduce(_) => Action::Seq(vec![action.clone()]),
            other => other.clone(),
        };

        let mut used_offsets = HashSet::new();
        collect_offsets(&action, mode, &mut used_offsets);
        let mut compiler = EdgeCompiler {
            writer: self,
            mode,
            state,
            used_offsets,
            packing: HashMap::new(),
            out: Vec::new(),
        };
        if compiler.write_action(&action, false)? == Flow::Fallthrough {
            let dest = Literal::usize_unsuffixed(dest);
            compiler.out.push(quote! {
                parser.epsilon(#dest);
                return Ok(false);
            });
        }
        let out = compiler.out;
        Ok(quote!(#(#out)*))
    }
}

/// Stack slots an action reads.
fn collect_offsets(action: &Action, mode: Mode, used: &mut HashSet<usize>) {
    match action {
        Action::Reduce(reduce) => used.extend(1..=reduce.replay),
        Action::FunCall(call) => {
            if mode == Mode::Semantic || call.method == "id" {
                for arg in &call.args {
                    arg_offsets(arg, call.offset, used);
                }
            }
        }
        Action::Seq(actions) => {
            for a in actions {
                collect_offsets(a, mode, used);
            }
        }
        _ => {}
    }
}

fn arg_offsets(arg: &FunArg, offset: usize, used: &mut HashSet<usize>) {
    match arg {
        FunArg::Offset(i) => {
            used.insert(i + offset);
        }
        FunArg::Some(inner) => arg_offsets(inner, offset, used),
        FunArg::Binding(_) | FunArg::None => {}
    }
}

struct EdgeCompiler<'w, 'a> {
    writer: &'w ParserWriter<'a>,
    mode: Mode,
    state: usize,
    used_offsets: HashSet<usize>,
    packing: HashMap<String, Packing>,
    out: Vec<TokenStream>,
}

impl EdgeCompiler<'_, '_> {
    fn write_action(&mut self, action: &Action, popped: bool) -> Result<Flow> {
        match action {
            Action::Reduce(reduce) => self.reduce(reduce),
            Action::FunCall(call) => self.fun_call(call),
            Action::Seq(actions) => {
                let mut popped = popped;
                if !popped {
                    if let Some(reduce) = action.reduce_with() {
                        self.pop_slots(reduce.pop + reduce.replay);
                        popped = true;
                    }
                }
                for a in actions {
                    if self.write_action(a, popped)? == Flow::Stop {
                        return Ok(Flow::Stop);
                    }
                }
                Ok(Flow::Fallthrough)
            }
            Action::CheckNotOnNewLine { offset } => {
                let peek = 1i64
                    .checked_sub(*offset)
                    .and_then(|peek| usize::try_from(peek).ok())
                    .ok_or_else(|| self.unsupported("CheckNotOnNewLine", action))?;
                let peek = Literal::usize_unsuffixed(peek);
                self.out.push(quote!(parser.check_not_on_new_line(#peek)?;));
                Ok(Flow::Fallthrough)
            }
            Action::Lookahead { .. } => Err(self.unsupported("Lookahead", action)),
            Action::FilterFlag { .. } => Err(self.unsupported("FilterFlag", action)),
            Action::PushFlag { .. } => Err(self.unsupported("PushFlag", action)),
            Action::PopFlag { .. } => Err(self.unsupported("PopFlag", action)),
        }
    }

    fn unsupported(&self, kind: &'static str, action: &Action) -> Error {
        Error::UnsupportedActionKind {
            kind,
            state: self.state,
            detail: action.to_string(),
        }
    }

    /// Pops `depth` slots into `s1..=sN`; unread slots get a `_` prefix.
    fn pop_slots(&mut self, depth: usize) {
        for i in 1..=depth {
            let name = if self.used_offsets.contains(&i) {
                format_ident!("s{}", i)
            } else {
                format_ident!("_s{}", i)
            };
            self.out.push(quote!(let #name = parser.pop();));
        }
    }

    fn reduce(&mut self, reduce: &Reduce) -> Result<Flow> {
        let nt = self
            .writer
            .order
            .nonterminal_ident(&reduce.nt)
            .ok_or_else(|| {
                Error::UnsupportedAutomatonRepresentation(format!(
                    "state {} reduces to {}, which is not in the nonterminal list",
                    self.state, reduce.nt
                ))
            })?
            .clone();
        self.out
            .push(quote!(let term = Term::Nonterminal(NonterminalId::#nt);));

        let value = match (self.packing.get("value"), self.mode) {
            (Some(Packing::Packed), _) => Some(quote!(value.value)),
            (Some(Packing::Unpacked), Mode::Semantic) => {
                Some(quote!(TryIntoStack::try_into_stack(value)?))
            }
            (Some(Packing::Unpacked), Mode::Structural) => None,
            (None, Mode::Semantic) => Some(quote!(TryIntoStack::try_into_stack(None)?)),
            (None, Mode::Structural) => Some(quote!(())),
        };
        if let Some(value) = value {
            self.out.push(quote!(let value = #value;));
        }

        for i in 1..=reduce.replay {
            let slot = format_ident!("s{}", i);
            self.out.push(quote!(parser.replay(#slot);));
        }
        self.out.push(quote! {
            parser.replay(TermValue { term, value });
            return Ok(false);
        });
        Ok(Flow::Stop)
    }

    fn fun_call(&mut self, call: &FunCall) -> Result<Flow> {
        match call.method.as_str() {
            "id" => {
                let arg = match call.args.as_slice() {
                    [arg] => self.arg(arg, call.offset, false)?,
                    _ => return Err(self.invalid(call, "`id` takes exactly one argument")),
                };
                let set_to = raw_ident(&call.set_to)?;
                self.out.push(quote!(let #set_to = #arg;));
                self.packing.insert(call.set_to.clone(), Packing::Packed);
                Ok(Flow::Fallthrough)
            }
            "accept" => {
                if !call.args.is_empty() {
                    return Err(self.invalid(call, "`accept` takes no arguments"));
                }
                self.out.push(quote!(return Ok(true);));
                Ok(Flow::Stop)
            }
            _ if self.mode == Mode::Semantic => {
                let method = method_name_to_rust(&call.method);
                self.writer.check_arity(&method, call.args.len())?;
                let args = call
                    .args
                    .iter()
                    .map(|a| self.arg(a, call.offset, true))
                    .collect::<Result<Vec<_>>>()?;
                let method_ident = raw_ident(&method)?;
                let set_to = raw_ident(&call.set_to)?;
                let forward_errors = if self.writer.info.is_fallible(&method) {
                    quote!(?)
                } else {
                    TokenStream::new()
                };
                self.out.push(quote! {
                    let #set_to = parser.ast_builder_refmut().#method_ident(#(#args),*)#forward_errors;
                });
                self.packing.insert(call.set_to.clone(), Packing::Unpacked);
                Ok(Flow::Fallthrough)
            }
            _ => {
                if call.set_to == "value" {
                    self.out.push(quote!(let value = ();));
                    self.packing.insert(call.set_to.clone(), Packing::Unpacked);
                }
                Ok(Flow::Fallthrough)
            }
        }
    }

    fn invalid(&self, call: &FunCall, reason: &str) -> Error {
        Error::InvalidReducer {
            method: call.method.clone(),
            state: self.state,
            reason: reason.to_string(),
        }
    }

    fn arg(&self, arg: &FunArg, offset: usize, unpack: bool) -> Result<TokenStream> {
        match arg {
            FunArg::Offset(i) => self.value_of(&format!("s{}", i + offset), unpack),
            FunArg::Binding(name) => self.value_of(name, unpack),
            FunArg::Some(inner) => {
                let inner = self.arg(inner, offset, unpack)?;
                Ok(quote!(Some(#inner)))
            }
            FunArg::None => Ok(quote!(None)),
        }
    }

    /// Stack slots are always packed; bindings are whatever produced them.
    fn value_of(&self, name: &str, unpack: bool) -> Result<TokenStream> {
        let var = raw_ident(name)?;
        let packed = self.packing.get(name).copied().unwrap_or(Packing::Packed);
        if unpack && packed == Packing::Packed {
            Ok(quote!(#var.value.to_ast()?))
        } else {
            Ok(quote!(#var))
        }
    }
}
