#![allow(dead_code)]

use esgrammar::table::{
    Action, ErrorSymbol, FunArg, FunCall, Nt, ParseTable, Reduce, State, Symbol, TableProduction,
    Terminal, Transition,
};
use esgrammar_model::model::{CallMethod, Element, Production, Reducer};
use indexmap::IndexMap;

pub fn token(t: &str) -> Symbol {
    Symbol::Terminal(Terminal::Token(t.to_string()))
}

pub fn nonterminal(name: &str) -> Symbol {
    Symbol::Nonterminal(Nt::plain(name))
}

pub fn shift_state(index: usize, transitions: Vec<(Symbol, Transition)>) -> State {
    State {
        index,
        transitions: transitions.into_iter().collect::<IndexMap<_, _>>(),
        edges: Vec::new(),
    }
}

pub fn action_state(index: usize, action: Action, dest: usize) -> State {
    State {
        index,
        transitions: IndexMap::new(),
        edges: vec![(action, dest)],
    }
}

pub fn error_symbol(code: &str) -> Symbol {
    Symbol::Error(ErrorSymbol {
        error_code: code.to_string(),
    })
}

/// Two shift states; the second declares a transition on a terminal the
/// table does not list, so it cannot be encoded.
pub fn mismatched_table() -> ParseTable {
    ParseTable {
        terminals: vec![Terminal::Token("x".into()), Terminal::End],
        nonterminals: vec![Nt::plain("A")],
        states: vec![
            shift_state(0, vec![(token("x"), Transition::Goto(1))]),
            shift_state(
                1,
                vec![
                    (token("x"), Transition::Goto(0)),
                    (token("y"), Transition::Goto(0)),
                ],
            ),
        ],
        named_goals: vec![(Nt::init("A"), 0)],
        productions: Vec::new(),
    }
}

/// Table for `A : `x` `y``:
///
/// ```text
/// 0: x -> 1, A -> 2
/// 1: y -> 3
/// 2: End -> 4
/// 3: reduce A from 2 slots, then epsilon to 0
/// 4: accept
/// ```
pub fn x_y_table() -> ParseTable {
    let reduce = Action::Seq(vec![
        Action::FunCall(FunCall {
            method: "A".into(),
            args: vec![FunArg::Offset(0), FunArg::Offset(1)],
            set_to: "value".into(),
            offset: 1,
        }),
        Action::Reduce(Reduce {
            nt: Nt::plain("A"),
            pop: 2,
            replay: 0,
        }),
    ]);
    let accept = Action::FunCall(FunCall {
        method: "accept".into(),
        args: Vec::new(),
        set_to: "value".into(),
        offset: 0,
    });
    ParseTable {
        terminals: vec![
            Terminal::Token("x".into()),
            Terminal::Token("y".into()),
            Terminal::End,
        ],
        nonterminals: vec![Nt::plain("A")],
        states: vec![
            shift_state(
                0,
                vec![(token("x"), Transition::Goto(1)), (nonterminal("A"), Transition::Goto(2))],
            ),
            shift_state(1, vec![(token("y"), Transition::Goto(3))]),
            shift_state(
                2,
                vec![(Symbol::Terminal(Terminal::End), Transition::Goto(4))],
            ),
            action_state(3, reduce, 0),
            action_state(4, accept, 0),
        ],
        named_goals: vec![(Nt::init("A"), 0)],
        productions: Vec::new(),
    }
}

/// `x_y_table` with every optional section in use: an error code, a
/// same-line special case and the production list for reduce mode.
pub fn full_table() -> ParseTable {
    let mut table = x_y_table();
    table.states[0].transitions.insert(
        token("x"),
        Transition::IfSameLine {
            same_line: Some(1),
            new_line: None,
        },
    );
    table.states[1]
        .transitions
        .insert(error_symbol("asi"), Transition::Goto(3));
    table.productions = vec![TableProduction {
        nt: Nt::plain("A"),
        production: Production {
            nt: "A".into(),
            body: vec![Element::Terminal("x".into()), Element::Terminal("y".into())],
            reducer: Reducer::Call(CallMethod {
                method: "A".into(),
                args: vec![0, 1],
            }),
            id: None,
        },
    }];
    table
}
