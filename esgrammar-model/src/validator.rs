use crate::builder::strip_backticks;
use crate::error::{Error, Result};
use crate::model::*;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Assembles the parsed definitions into a [`Grammar`].
///
/// Quoted literals are rewritten in place to bare terminals and recorded in
/// the grammar's terminal set. `::` definitions name variable terminal
/// classes. Only `:` definitions (and parameterized families) become
/// nonterminals.
pub fn finish_grammar(defs: Vec<NtDef>, goals: &[&str]) -> Result<Grammar> {
    let mut terminals = IndexSet::new();
    let mut nonterminals = IndexMap::new();
    let mut variable_terminals = IndexSet::new();

    for mut def in defs {
        for alt in &mut def.alternatives {
            let production = alt.production_mut();
            for element in &mut production.body {
                record_terminals(element, &def.name, &mut terminals)?;
            }
        }

        if let Some(params) = def.params {
            let mut productions = Vec::with_capacity(def.alternatives.len());
            for alt in def.alternatives {
                match alt {
                    Alternative::Production(p) => productions.push(p),
                    Alternative::Conditional(c) => {
                        return Err(Error::UnsupportedConditionalContext {
                            nt: def.name,
                            param: c.param,
                        })
                    }
                }
            }
            if def.marker == DefinitionMarker::Lexical {
                variable_terminals.insert(def.name.clone());
            }
            nonterminals.insert(def.name, Definition::Parameterized { params, productions });
            continue;
        }

        match def.marker {
            DefinitionMarker::Lexical => {
                variable_terminals.insert(def.name);
            }
            DefinitionMarker::Syntactic => {
                if nonterminals.contains_key(&def.name) || variable_terminals.contains(&def.name) {
                    return Err(Error::DuplicateNonterminalDefinition(def.name));
                }
                nonterminals.insert(def.name, Definition::Productions(def.alternatives));
            }
            DefinitionMarker::Auxiliary => {}
        }
    }

    if let Some(t) = terminals.iter().find(|t| nonterminals.contains_key(*t)) {
        return Err(Error::TerminalNonterminalNameCollision(t.clone()));
    }

    for goal in goals {
        if !nonterminals.contains_key(*goal) {
            log::warn!("goal nonterminal {} is not defined by the grammar", goal);
        }
    }

    let grammar = Grammar {
        nonterminals,
        goals: goals.iter().map(|g| g.to_string()).collect(),
        variable_terminals,
        terminals,
    };
    validate(&grammar)?;
    Ok(grammar)
}

/// Checks that every reducer lines up with the concrete elements of its
/// production.
pub fn validate(grammar: &Grammar) -> Result<()> {
    grammar.productions().try_for_each(validate_production)
}

/// Checks one production: call arguments cover each concrete element once,
/// and a passed-through index exists.
pub fn validate_production(production: &Production) -> Result<()> {
    let arity = production.arity();
    match &production.reducer {
        Reducer::Call(call) => {
            let out_of_range = call.args.iter().any(|&i| i >= arity);
            if call.args.len() != arity || out_of_range {
                return Err(Error::ArityMismatch {
                    method: call.method.clone(),
                    production: production.to_string(),
                    expected: call.args.len(),
                    found: arity,
                });
            }
            let mut seen = HashSet::new();
            if let Some(&index) = call.args.iter().find(|&&i| !seen.insert(i)) {
                return Err(Error::RepeatedArgument {
                    method: call.method.clone(),
                    production: production.to_string(),
                    index,
                });
            }
        }
        Reducer::Pass(i) if *i >= arity => {
            return Err(Error::ArityMismatch {
                method: i.to_string(),
                production: production.to_string(),
                expected: i + 1,
                found: arity,
            });
        }
        Reducer::Pass(_) => {}
    }
    Ok(())
}

fn record_terminals(element: &mut Element, nt: &str, terminals: &mut IndexSet<String>) -> Result<()> {
    match element {
        Element::Quoted(raw) => {
            let t = strip_backticks(raw).ok_or_else(|| Error::MalformedTerminalLiteral {
                symbol: raw.clone(),
                nt: nt.to_string(),
            })?;
            terminals.insert(t.clone());
            *element = Element::Terminal(t);
        }
        Element::Terminal(t) => {
            terminals.insert(t.clone());
        }
        Element::Optional(inner) => record_terminals(inner, nt, terminals)?,
        Element::Exclude { inner, .. } => record_terminals(inner, nt, terminals)?,
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{GrammarBuilder, Rhs};

    fn def(name: &str, marker: DefinitionMarker, bodies: Vec<Vec<Element>>) -> NtDef {
        let b = GrammarBuilder::new();
        let lines = bodies
            .into_iter()
            .map(|body| Rhs {
                guard: None,
                body,
                id: None,
            })
            .collect();
        b.nt_def(b.nt_lhs(name, None), marker, lines)
    }

    #[test]
    fn test_quoted_literals_become_terminals() {
        let g = finish_grammar(
            vec![def(
                "A",
                DefinitionMarker::Syntactic,
                vec![vec![
                    Element::Quoted("`x`".into()),
                    Element::Optional(Box::new(Element::Quoted("`y`".into()))),
                ]],
            )],
            &["A"],
        )
        .unwrap();
        assert_eq!(g.terminals.iter().collect::<Vec<_>>(), vec!["x", "y"]);
        let p = g.productions().next().unwrap();
        assert_eq!(p.body[0], Element::Terminal("x".into()));
    }

    #[test]
    fn test_malformed_literal_names_the_nonterminal() {
        let err = finish_grammar(
            vec![def("A", DefinitionMarker::Syntactic, vec![vec![Element::Quoted("`".into())]])],
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::MalformedTerminalLiteral {
                symbol: "`".into(),
                nt: "A".into()
            }
        );
    }

    #[test]
    fn test_syntactic_definition_after_variable_terminal_is_duplicate() {
        let err = finish_grammar(
            vec![
                def("Id", DefinitionMarker::Lexical, vec![vec![]]),
                def("Id", DefinitionMarker::Syntactic, vec![vec![]]),
            ],
            &[],
        )
        .unwrap_err();
        assert_eq!(err, Error::DuplicateNonterminalDefinition("Id".into()));
    }

    #[test]
    fn test_auxiliary_definitions_are_not_nonterminals() {
        let g = finish_grammar(
            vec![def("Digit", DefinitionMarker::Auxiliary, vec![vec![Element::Quoted("`0`".into())]])],
            &[],
        )
        .unwrap();
        assert!(g.nonterminals.is_empty());
        assert!(g.variable_terminals.is_empty());
        assert!(g.terminals.contains("0"));
    }

    #[test]
    fn test_reducer_arity_is_checked() {
        let mut d = def(
            "A",
            DefinitionMarker::Syntactic,
            vec![vec![Element::Nonterminal("B".into())]],
        );
        if let Reducer::Call(call) = &mut d.alternatives[0].production_mut().reducer {
            call.args.push(1);
        }
        match finish_grammar(vec![d], &[]) {
            Err(Error::ArityMismatch {
                method,
                expected,
                found,
                ..
            }) => {
                assert_eq!(method, "A");
                assert_eq!((expected, found), (2, 1));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_repeated_call_argument_is_rejected() {
        let production = Production {
            nt: "A".into(),
            body: vec![Element::Terminal("x".into()), Element::Terminal("y".into())],
            reducer: Reducer::Call(CallMethod {
                method: "A".into(),
                args: vec![1, 1],
            }),
            id: None,
        };
        match validate_production(&production) {
            Err(Error::RepeatedArgument { method, index, .. }) => {
                assert_eq!((method.as_str(), index), ("A", 1));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_pass_through_index_must_exist() {
        let production = Production {
            nt: "A".into(),
            body: vec![Element::Terminal("x".into())],
            reducer: Reducer::Pass(1),
            id: None,
        };
        assert!(matches!(
            validate_production(&production),
            Err(Error::ArityMismatch { found: 1, .. })
        ));
    }
}
