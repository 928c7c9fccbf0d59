//! Tokenizer for the grammar notation.
//!
//! Raw tokenization is done by logos. A second pass attaches source
//! locations and reclassifies nonterminals that are immediately followed by
//! `[` as call-style nonterminals, without consuming the bracket.

use crate::error::{Error, Location, Result};
use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token(",")]
    Comma,
    #[token("~")]
    Tilde,
    #[token("+")]
    Plus,
    #[token("?")]
    Question,
    #[token("<!")]
    NotIn,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,

    #[token("but")]
    But,
    #[token("empty")]
    Empty,
    #[token("here")]
    Here,
    #[token("lookahead")]
    Lookahead,
    #[token("no")]
    No,
    #[token("not")]
    Not,
    #[token("of")]
    Of,
    #[token("one")]
    One,
    #[token("or")]
    Or,
    #[token("through")]
    Through,

    /// Line breaks separate definitions and right-hand sides.
    #[token("\n")]
    Newline,

    /// Any number of colons. `:` and `::` mean different things.
    #[regex(r":+")]
    DefinitionMarker,

    #[regex(r"`[^` \n]+`|```")]
    Terminal,

    /// Control characters, `<TAB>` or `U+00A0`.
    #[regex(r"<[A-Z]+>|U\+[0-9A-Fa-f]{4}")]
    Chr,

    /// Produced by the reclassification pass only.
    NonterminalCall,

    #[regex(r"(uri|[A-Z])[A-Za-z0-9_]*")]
    Nonterminal,

    /// Nonterminal wrapped in vertical bars, `|Name|`.
    #[regex(r"\|[A-Z][A-Za-z0-9_]+\|")]
    NonterminalAlt,

    #[regex(r"#[A-Za-z][A-Za-z0-9_]*")]
    ProductionId,

    /// Prose to the end of the line, `> text`.
    #[regex(r">[^\n]*")]
    Prose,

    /// Prose wrapped in square brackets, `[> text]`.
    #[regex(r"\[>[^\]\n]*\]")]
    WrappedProse,
}

impl TokenKind {
    /// Human readable description used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::OpenBracket => "`[`",
            TokenKind::CloseBracket => "`]`",
            TokenKind::OpenBrace => "`{`",
            TokenKind::CloseBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Tilde => "`~`",
            TokenKind::Plus => "`+`",
            TokenKind::Question => "`?`",
            TokenKind::NotIn => "`<!`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::But => "`but`",
            TokenKind::Empty => "`empty`",
            TokenKind::Here => "`here`",
            TokenKind::Lookahead => "`lookahead`",
            TokenKind::No => "`no`",
            TokenKind::Not => "`not`",
            TokenKind::Of => "`of`",
            TokenKind::One => "`one`",
            TokenKind::Or => "`or`",
            TokenKind::Through => "`through`",
            TokenKind::Newline => "end of line",
            TokenKind::DefinitionMarker => "definition marker",
            TokenKind::Terminal => "quoted terminal",
            TokenKind::Chr => "control character",
            TokenKind::NonterminalCall => "parameterized nonterminal",
            TokenKind::Nonterminal => "nonterminal",
            TokenKind::NonterminalAlt => "nonterminal",
            TokenKind::ProductionId => "production id",
            TokenKind::Prose => "prose",
            TokenKind::WrappedProse => "prose",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'s> {
    pub kind: TokenKind,
    pub text: &'s str,
    pub span: Range<usize>,
    pub location: Location,
}

/// Tokenizes grammar text.
///
/// Fails with [`Error::UnrecognizedGrammarToken`] on the first piece of text
/// that matches no token kind.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut line_start = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let location = Location {
            line,
            column: source[line_start..span.start].chars().count() + 1,
        };
        let kind = match result {
            Ok(kind) => kind,
            Err(()) => {
                return Err(Error::UnrecognizedGrammarToken {
                    text: lexer.slice().to_string(),
                    location,
                })
            }
        };
        let kind = if kind == TokenKind::Nonterminal && is_call_site(&source[span.end..]) {
            TokenKind::NonterminalCall
        } else {
            kind
        };
        if kind == TokenKind::Newline {
            line += 1;
            line_start = span.end;
        }
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            span,
            location,
        });
    }

    Ok(tokens)
}

// `Name[` starts an argument list, `Name [>` or `Name [` do not.
fn is_call_site(rest: &str) -> bool {
    rest.starts_with('[') && !rest.starts_with("[>")
}
