//! Table-less reduction: `reduce` pops the values of one production off a
//! plain value stack and pushes the builder's result.

use super::names::{method_name_to_rust, raw_ident};
use super::ParserWriter;
use crate::error::Result;
use esgrammar_model::model::Reducer;
use esgrammar_model::validator::validate_production;
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

impl ParserWriter<'_> {
    pub(super) fn reduce(&self) -> Result<TokenStream> {
        let mut arms = Vec::new();
        for (i, prod) in self.table.productions.iter().enumerate() {
            // Goal start nonterminals are accepted, never reduced.
            let nt = match self.order.nonterminal_ident(&prod.nt) {
                Some(nt) => nt,
                None => continue,
            };
            validate_production(&prod.production)?;
            let arity = prod.production.arity();
            let mut body = Vec::new();

            match &prod.production.reducer {
                // A single concrete element passed through: nothing to do.
                Reducer::Pass(0) if arity == 1 => {}
                Reducer::Pass(kept) => {
                    for index in (0..arity).rev() {
                        if index == *kept {
                            let x = format_ident!("x{}", index);
                            body.push(quote!(let #x = stack.pop().unwrap();));
                        } else {
                            body.push(quote!(stack.pop();));
                        }
                    }
                    let x = format_ident!("x{}", kept);
                    body.push(quote!(stack.push(#x);));
                }
                Reducer::Call(call) => {
                    let method = method_name_to_rust(&call.method);
                    self.check_arity(&method, call.args.len())?;
                    for index in (0..arity).rev() {
                        if call.args.contains(&index) {
                            let x = format_ident!("x{}", index);
                            body.push(quote!(let #x = stack.pop().unwrap().to_ast()?;));
                        } else {
                            body.push(quote!(stack.pop();));
                        }
                    }
                    let arg_defs = call.args.iter().enumerate().map(|(j, index)| {
                        let a = format_ident!("a{}", j);
                        let x = format_ident!("x{}", index);
                        quote!(let #a = #x;)
                    });
                    let arg_names = (0..call.args.len()).map(|j| format_ident!("a{}", j));
                    let method_ident = raw_ident(&method)?;
                    let forward_errors = if self.info.is_fallible(&method) {
                        quote!(?)
                    } else {
                        TokenStream::new()
                    };
                    body.push(quote! {
                        stack.push(TryIntoStack::try_into_stack({
                            #(#arg_defs)*
                            handler.#method_ident(#(#arg_names),*)
                        }#forward_errors)?);
                    });
                }
            }

            let i = Literal::usize_unsuffixed(i);
            arms.push(quote! {
                #i => {
                    #(#body)*
                    Ok(NonterminalId::#nt)
                }
            });
        }

        Ok(quote! {
            pub fn reduce<'alloc>(
                handler: &mut AstBuilder<'alloc>,
                prod: usize,
                stack: &mut std::vec::Vec<StackValue<'alloc>>,
            ) -> Result<'alloc, NonterminalId> {
                match prod {
                    #(#arms)*
                    _ => panic!("no such production: {}", prod),
                }
            }
        })
    }

    /// `(arity, NonterminalId)` per reducible production, in production order.
    pub(super) fn reduce_simulator(&self) -> Result<TokenStream> {
        let entries: Vec<TokenStream> = self
            .table
            .productions
            .iter()
            .filter_map(|prod| {
                let nt = self.order.nonterminal_ident(&prod.nt)?;
                let arity = Literal::usize_unsuffixed(prod.production.arity());
                Some(quote!((#arity, NonterminalId::#nt)))
            })
            .collect();
        let len = Literal::usize_unsuffixed(entries.len());
        Ok(quote! {
            static REDUCE_SIMULATOR: [(usize, NonterminalId); #len] = [
                #(#entries,)*
            ];
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::{EmitOptions, ParserWriter};
    use crate::handler_info::HandlerInfo;
    use crate::table::{Nt, ParseTable, State, TableProduction, Terminal};
    use crate::testing::{normalize, Testable};
    use esgrammar_model::model::{CallMethod, Element, Production, Reducer};

    fn production(nt: &str, body: Vec<Element>, reducer: Reducer) -> Production {
        Production {
            nt: nt.into(),
            body,
            reducer,
            id: None,
        }
    }

    fn table() -> ParseTable {
        let nt = |s: &str| Element::Nonterminal(s.into());
        let t = |s: &str| Element::Terminal(s.into());
        ParseTable {
            terminals: vec![Terminal::Token("(".into()), Terminal::Token(")".into())],
            nonterminals: vec![Nt::plain("Expr"), Nt::plain("Primary")],
            states: vec![State::default()],
            named_goals: vec![(Nt::init("Expr"), 0)],
            productions: vec![
                TableProduction {
                    nt: Nt::init("Expr"),
                    production: production("InitNt", vec![nt("Expr")], Reducer::Pass(0)),
                },
                TableProduction {
                    nt: Nt::plain("Expr"),
                    production: production("Expr", vec![nt("Primary")], Reducer::Pass(0)),
                },
                TableProduction {
                    nt: Nt::plain("Primary"),
                    production: production(
                        "Primary",
                        vec![t("("), nt("Expr"), t(")")],
                        Reducer::Pass(1),
                    ),
                },
                TableProduction {
                    nt: Nt::plain("Expr"),
                    production: production(
                        "Expr",
                        vec![nt("Expr"), Element::NoLineTerminatorHere, t("("), nt("Expr"), t(")")],
                        Reducer::Call(CallMethod {
                            method: "Expr 1".into(),
                            args: vec![0, 2],
                        }),
                    ),
                },
            ],
        }
    }

    fn emit(info: &HandlerInfo) -> String {
        let table = table();
        let writer = ParserWriter::new(&table, info, None, EmitOptions::default()).unwrap();
        let code = writer.emit().test().assert_success();
        normalize(&code.to_string())
    }

    #[test]
    fn test_reduction_kinds() {
        let info = HandlerInfo {
            fallible_methods: vec!["expr_p1".into()],
            ..HandlerInfo::default()
        };
        let code = emit(&info);
        assert!(!code.contains("0=>{"), "goal productions are never reduced: {}", code);
        assert!(code.contains("1=>{Ok(NonterminalId::Expr)}"), "{}", code);
        assert!(code.contains(&normalize(
            "2 => { stack.pop(); let x1 = stack.pop().unwrap(); stack.pop(); stack.push(x1); Ok(NonterminalId::Primary) }"
        )), "{}", code);
        assert!(code.contains(&normalize(
            "3 => {
                stack.pop();
                let x2 = stack.pop().unwrap().to_ast()?;
                stack.pop();
                let x0 = stack.pop().unwrap().to_ast()?;
                stack.push(TryIntoStack::try_into_stack({ let a0 = x0; let a1 = x2; handler.expr_p1(a0, a1) }?)?);
                Ok(NonterminalId::Expr)
            }"
        )), "{}", code);
        assert!(code.contains("usecrate::ast_builder::AstBuilder;"));
    }

    #[test]
    fn test_reduce_simulator_lists_arities() {
        let code = emit(&HandlerInfo::default());
        assert!(code.contains(
            "staticREDUCE_SIMULATOR:[(usize,NonterminalId);3]=[(1,NonterminalId::Expr),(3,NonterminalId::Primary),(4,NonterminalId::Expr),];"
        ), "{}", code);
    }

    #[test]
    fn test_reduce_can_be_disabled() {
        let table = table();
        let info = HandlerInfo::default();
        let options = EmitOptions {
            reduce: false,
            ..EmitOptions::default()
        };
        let code = ParserWriter::new(&table, &info, None, options)
            .and_then(|w| w.emit())
            .test()
            .assert_success()
            .to_string();
        assert!(!normalize(&code).contains("REDUCE_SIMULATOR"));
    }

    #[test]
    fn test_inconsistent_productions_are_rejected() {
        let mut repeated = table();
        repeated.productions[3].production.reducer = Reducer::Call(CallMethod {
            method: "Expr 1".into(),
            args: vec![0, 0, 2, 3],
        });
        let info = HandlerInfo::default();
        ParserWriter::new(&repeated, &info, None, EmitOptions::default())
            .and_then(|w| w.emit())
            .test()
            .assert_failure_contains("Expr 1 reads element 0");

        let mut missing = table();
        missing.productions[2].production.reducer = Reducer::Pass(3);
        ParserWriter::new(&missing, &info, None, EmitOptions::default())
            .and_then(|w| w.emit())
            .test()
            .assert_failure_contains("has 3 concrete element(s)");
    }
}
