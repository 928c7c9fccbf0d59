mod common;

use common::*;
use esgrammar::table::{Nt, ParseTable, Terminal, Transition};
use esgrammar::testing::{normalize, Testable};
use esgrammar::{Error, Generator, HandlerInfo};

fn generate(table: &ParseTable) -> esgrammar::Result<String> {
    Generator::new(HandlerInfo::default())
        .generate_table(table)
        .map(|parser| normalize(&parser.to_string()))
}

#[test]
fn test_mismatched_state_is_reported_with_its_index() {
    let err = generate(&mismatched_table()).test().assert_failure();
    match &err {
        Error::TransitionEncodingMismatch {
            state,
            encoded,
            expected,
            terminals,
            nonterminals,
            ..
        } => {
            assert_eq!(*state, 1);
            assert_eq!((*encoded, *expected), (1, 2));
            assert!(terminals.contains("\"x\""));
            assert!(terminals.contains("ErrorToken"));
            assert_eq!(nonterminals, "A");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("state 1"), "{}", message);
    assert!(message.contains("\"y\" --> 0"), "{}", message);
}

#[test]
fn test_mismatch_is_deterministic() {
    let first = generate(&mismatched_table()).unwrap_err().to_string();
    let second = generate(&mismatched_table()).unwrap_err().to_string();
    assert_eq!(first, second);
}

#[test]
fn test_shift_table_layout() {
    let code = generate(&x_y_table()).test().assert_success();
    // Columns: X, Y, End, ErrorToken, A.
    assert!(code.contains(&normalize(
        "#[rustfmt::skip]
         static SHIFT: [i64; 15] = [
             1, ERROR, ERROR, ERROR, 2,
             ERROR, 3, ERROR, ERROR, ERROR,
             ERROR, ERROR, 4, ERROR, ERROR,
         ];"
    )), "{}", code);
    assert!(code.contains(&normalize(
        "pub enum TerminalId { X = 0, Y = 1, End = 2, ErrorToken = 3, }"
    )));
    assert!(code.contains(&normalize("pub enum NonterminalId { A = 4, }")));
    assert!(code.contains(&normalize(
        "Term::Terminal(TerminalId::X) => \"x\","
    )));
    assert!(code.contains(&normalize("pub static START_STATE_START_A: usize = 0;")));
}

#[test]
fn test_error_symbol_uses_error_token_column() {
    let mut table = x_y_table();
    table.states[1]
        .transitions
        .insert(error_symbol("asi"), Transition::Goto(3));
    table.states[2]
        .transitions
        .insert(error_symbol("do_while_asi"), Transition::Goto(4));
    let code = generate(&table).test().assert_success();
    assert!(code.contains(&normalize("ERROR, 3, ERROR, 3, ERROR,")), "{}", code);
    assert!(code.contains(&normalize("pub enum ErrorCode { Asi, DoWhileAsi, }")), "{}", code);
    assert!(code.contains(&normalize(
        "static STATE_TO_ERROR_CODE: [Option<ErrorCode>; 3] = [
             None,
             Some(ErrorCode::Asi),
             Some(ErrorCode::DoWhileAsi),
         ];"
    )), "{}", code);
}

#[test]
fn test_if_same_line_becomes_a_special_case() {
    let mut table = x_y_table();
    table.states[1].transitions.insert(
        token("x"),
        Transition::IfSameLine {
            same_line: Some(2),
            new_line: None,
        },
    );
    let code = generate(&table).test().assert_success();
    assert!(code.contains(&normalize("SPECIAL_CASE_TAG + 0, 3,")), "{}", code);
    assert!(code.contains(&normalize(
        "static SPECIAL_CASES: [fn(&Token<'_>) -> i64; 1] = [
             |token| { if token.is_on_new_line { ERROR } else { 2 } },
         ];"
    )), "{}", code);
    assert!(code.contains(&normalize("const SPECIAL_CASE_TAG: i64 = i64::MIN;")));
}

#[test]
fn test_error_token_is_not_duplicated() {
    let mut table = x_y_table();
    table.terminals.push(Terminal::ErrorToken);
    let code = generate(&table).test().assert_success();
    assert_eq!(code.matches("ErrorToken=").count(), 1, "{}", code);
}

#[test]
fn test_nonterminal_collision_stops_generation() {
    let mut table = x_y_table();
    table.nonterminals.push(Nt::plain("a"));
    generate(&table)
        .test()
        .assert_failure_contains("have the same camel-case spelling (A)");
}

#[test]
fn test_states_must_be_indexed_by_position() {
    let mut table = x_y_table();
    table.states[1].index = 7;
    generate(&table)
        .test()
        .assert_failure_contains("state at position 1 has index 7");
}

#[test]
fn test_keyword_terminal_cannot_name_a_variant() {
    let mut table = x_y_table();
    table.terminals.push(Terminal::Token("self".into()));
    generate(&table)
        .test()
        .assert_failure_contains("\"Self\" is not a valid Rust identifier");
}
