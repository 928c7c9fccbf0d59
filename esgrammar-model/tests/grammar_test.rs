use esgrammar_model::model::{Alternative, Definition, Element, Reducer};
use esgrammar_model::{parse_grammar, Error, Grammar};
use rstest::rstest;

fn methods_of(grammar: &Grammar, nt: &str) -> Vec<(String, Vec<usize>)> {
    grammar.nonterminals[nt]
        .productions()
        .map(|p| match &p.reducer {
            Reducer::Call(call) => (call.method.clone(), call.args.clone()),
            Reducer::Pass(i) => (i.to_string(), vec![*i]),
        })
        .collect()
}

#[test]
fn test_single_production_end_to_end() {
    let grammar = parse_grammar("A : `x` `y`\n", &["A"]).unwrap();

    let productions: Vec<_> = grammar.productions().collect();
    assert_eq!(productions.len(), 1);
    assert_eq!(
        productions[0].body,
        vec![Element::Terminal("x".into()), Element::Terminal("y".into())]
    );
    assert_eq!(methods_of(&grammar, "A"), vec![("A".to_string(), vec![0, 1])]);
    assert_eq!(grammar.terminals.iter().collect::<Vec<_>>(), vec!["x", "y"]);
    assert_eq!(grammar.goals, vec!["A".to_string()]);
}

#[test]
fn test_one_of_end_to_end() {
    let grammar = parse_grammar("A : one of\n  `x`\n  `y`\n", &[]).unwrap();

    let alternatives = match &grammar.nonterminals["A"] {
        Definition::Productions(alts) => alts,
        other => panic!("expected plain productions, got {:?}", other),
    };
    let bodies: Vec<_> = alternatives
        .iter()
        .map(|a| a.production().body.clone())
        .collect();
    assert_eq!(
        bodies,
        vec![
            vec![Element::Terminal("x".into())],
            vec![Element::Terminal("y".into())]
        ]
    );
    assert_eq!(
        methods_of(&grammar, "A"),
        vec![
            ("A 0".to_string(), vec![0]),
            ("A 1".to_string(), vec![0])
        ]
    );
}

#[rstest]
#[case("A :\n  B\n\nB : `b`\n", "A", &["A"])]
#[case("A :\n  B\n  C\n  [empty]\n\nB : `b`\nC : `c`\n", "A", &["A 0", "A 1", "A 2"])]
#[case("Op : one of `+` `-` `*`\n", "Op", &["Op 0", "Op 1", "Op 2"])]
fn test_method_naming(#[case] text: &str, #[case] nt: &str, #[case] expected: &[&str]) {
    let grammar = parse_grammar(text, &[]).unwrap();
    let names: Vec<String> = methods_of(&grammar, nt).into_iter().map(|(m, _)| m).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_one_of_preserves_list_order() {
    let grammar = parse_grammar("Kw : one of\n  `while` `do`\n  `if`\n", &[]).unwrap();
    let firsts: Vec<_> = grammar.nonterminals["Kw"]
        .productions()
        .map(|p| p.body.clone())
        .collect();
    assert_eq!(
        firsts,
        vec![
            vec![Element::Terminal("while".into())],
            vec![Element::Terminal("do".into())],
            vec![Element::Terminal("if".into())],
        ]
    );
}

#[test]
fn test_duplicate_definition_is_rejected() {
    let err = parse_grammar("A : `x`\n\nA : `y`\n", &[]).unwrap_err();
    assert_eq!(err, Error::DuplicateNonterminalDefinition("A".into()));
}

#[test]
fn test_terminal_nonterminal_collision() {
    let err = parse_grammar("A : `B`\n\nB : `b`\n", &[]).unwrap_err();
    assert_eq!(err, Error::TerminalNonterminalNameCollision("B".into()));
}

#[test]
fn test_variable_terminal_classes() {
    let grammar = parse_grammar(
        "IdentifierName ::\n  IdentifierStart\n\nPrimary :\n  IdentifierName\n  `this`\n",
        &["Primary"],
    )
    .unwrap();
    assert!(grammar.variable_terminals.contains("IdentifierName"));
    assert!(!grammar.nonterminals.contains_key("IdentifierName"));
    assert!(grammar.nonterminals.contains_key("Primary"));
}

#[test]
fn test_parameterized_definition() {
    let grammar = parse_grammar(
        "Expr[In] :\n  Assign[?In]\n  Expr[?In] `,` Assign[?In]\n",
        &[],
    )
    .unwrap();
    match &grammar.nonterminals["Expr"] {
        Definition::Parameterized { params, productions } => {
            assert_eq!(params, &vec!["In".to_string()]);
            assert_eq!(productions.len(), 2);
            assert_eq!(productions[1].arity(), 3);
        }
        other => panic!("expected a parameterized family, got {:?}", other),
    }
}

#[test]
fn test_guard_in_parameterized_definition_is_rejected() {
    let err = parse_grammar("S[Yield] :\n  [+Yield] `yield`\n", &[]).unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedConditionalContext {
            nt: "S".into(),
            param: "Yield".into()
        }
    );
}

#[test]
fn test_guard_in_plain_definition_is_kept() {
    let grammar = parse_grammar("S :\n  [+Yield] `yield`\n  `x`\n", &[]).unwrap();
    match &grammar.nonterminals["S"] {
        Definition::Productions(alts) => {
            assert!(matches!(alts[0], Alternative::Conditional(_)));
            assert!(matches!(alts[1], Alternative::Production(_)));
        }
        other => panic!("unexpected definition {:?}", other),
    }
}

#[rstest]
#[case("S : E[+In, ~In]\n", "flag In passed multiple times to E")]
#[case("S : [lookahead <! {`let` `[`}] E\n", "lookahead > 1 token")]
#[case("S : `x` @\n", "unrecognized grammar token \"@\" at line 1, column 9")]
#[case("S : `x` ]\n", "expected grammar symbol")]
fn test_rejected_grammars(#[case] text: &str, #[case] message: &str) {
    let err = parse_grammar(text, &[]).unwrap_err();
    assert!(
        err.to_string().contains(message),
        "error {:?} should mention {:?}",
        err.to_string(),
        message
    );
}

#[test]
fn test_exclusions_and_lookahead_keep_terminal_text() {
    let grammar = parse_grammar(
        "S :\n  [lookahead != `else`] Id but not `yield` `;`\n",
        &[],
    )
    .unwrap();
    let p = grammar.productions().next().unwrap();
    assert_eq!(p.arity(), 2);
    assert_eq!(p.to_string(), "S ::= [lookahead != `else`] Id but not `yield` `;` => S(0, 1)");
    assert!(grammar.terminals.contains(";"));
    assert!(!grammar.terminals.contains("yield"));
}
