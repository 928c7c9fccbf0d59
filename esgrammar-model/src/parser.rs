//! Recursive-descent reader for the grammar notation.
//!
//! The reader walks the token list produced by [`crate::lexer::tokenize`]
//! and hands every recognized construct to the [`GrammarBuilder`]. A
//! definition runs from its left-hand side to the first blank line, the end
//! of input, or the next line that carries a definition marker.

use crate::builder::{GrammarBuilder, LookaheadItem, NtLhs, Rhs, Sigil};
use crate::error::{Error, Location, Result};
use crate::lexer::{Token, TokenKind};
use crate::model::{DefinitionMarker, Element, Exclusion, FlagValue, NtDef};

/// Parses every definition in `tokens`, in source order.
pub fn parse_definitions(tokens: &[Token<'_>], builder: &GrammarBuilder) -> Result<Vec<NtDef>> {
    let mut parser = Parser::new(tokens, builder);
    let mut defs = Vec::new();
    loop {
        parser.skip_blank_lines();
        if parser.is_eof() {
            break;
        }
        defs.push(parser.nt_def()?);
    }
    Ok(defs)
}

struct Parser<'t, 's> {
    tokens: &'t [Token<'s>],
    pos: usize,
    builder: &'t GrammarBuilder,
}

impl<'t, 's> Parser<'t, 's> {
    fn new(tokens: &'t [Token<'s>], builder: &'t GrammarBuilder) -> Self {
        Parser {
            tokens,
            pos: 0,
            builder,
        }
    }

    // --- Cursor ---

    fn peek(&self) -> Option<TokenKind> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(TokenKind::Newline))
    }

    /// Whether the line starting at the cursor opens a new definition.
    fn at_definition_start(&self) -> bool {
        self.tokens[self.pos..]
            .iter()
            .take_while(|t| t.kind != TokenKind::Newline)
            .any(|t| t.kind == TokenKind::DefinitionMarker)
    }

    fn bump(&mut self) -> Option<&'t Token<'s>> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: TokenKind) -> Option<&'t Token<'s>> {
        if self.peek() == Some(kind) {
            self.bump()
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'t Token<'s>> {
        match self.eat(kind) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(kind.describe())),
        }
    }

    /// Accepts a nonterminal whose text must be exactly `word`.
    fn expect_word(&mut self, word: &str) -> Result<()> {
        match self.tokens.get(self.pos) {
            Some(t) if t.kind == TokenKind::Nonterminal && t.text == word => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.unexpected(&format!("`{}`", word))),
        }
    }

    fn skip_blank_lines(&mut self) {
        while self.eat(TokenKind::Newline).is_some() {}
    }

    fn unexpected(&self, expected: &str) -> Error {
        let (found, location) = match self.tokens.get(self.pos) {
            Some(t) if t.kind == TokenKind::Newline => ("end of line".to_string(), t.location),
            Some(t) => (format!("{:?}", t.text), t.location),
            None => ("end of input".to_string(), self.eof_location()),
        };
        Error::UnexpectedToken {
            expected: expected.to_string(),
            found,
            location,
        }
    }

    fn eof_location(&self) -> Location {
        match self.tokens.last() {
            Some(t) if t.kind == TokenKind::Newline => Location {
                line: t.location.line + 1,
                column: 1,
            },
            Some(t) => Location {
                line: t.location.line,
                column: t.location.column + t.text.chars().count(),
            },
            None => Location { line: 1, column: 1 },
        }
    }

    // --- Definitions ---

    fn nt_def(&mut self) -> Result<NtDef> {
        let lhs = self.nt_lhs()?;
        let eq = self.expect(TokenKind::DefinitionMarker)?;
        let marker = DefinitionMarker::from_colons(eq.text.len());

        if self.peek() == Some(TokenKind::One) && self.peek_nth(1) == Some(TokenKind::Of) {
            self.pos += 2;
            let terminals = self.t_list_lines()?;
            return Ok(self.builder.nt_def_one_of(lhs, marker, terminals));
        }

        let mut lines = if self.at_line_end() {
            self.builder.blank_line()
        } else {
            let line = self.rhs_line()?;
            self.builder.single(line)
        };
        while self.next_line_continues() {
            let line = self.rhs_line()?;
            lines = self.builder.append(lines, line);
        }
        if lines.is_empty() {
            return Err(self.unexpected("right-hand side"));
        }
        Ok(self.builder.nt_def(lhs, marker, lines))
    }

    /// Consumes the line break after a right-hand side and reports whether
    /// another right-hand side of the same definition follows.
    fn next_line_continues(&mut self) -> bool {
        if self.eat(TokenKind::Newline).is_none() {
            return false;
        }
        !self.at_line_end() && !self.at_definition_start()
    }

    fn nt_lhs(&mut self) -> Result<NtLhs> {
        if let Some(name) = self.eat(TokenKind::Nonterminal) {
            return Ok(self.builder.nt_lhs(name.text, None));
        }
        let name = self.expect(TokenKind::NonterminalCall)?;
        self.expect(TokenKind::OpenBracket)?;
        let mut params = vec![self.expect(TokenKind::Nonterminal)?.text.to_string()];
        while self.eat(TokenKind::Comma).is_some() {
            params.push(self.expect(TokenKind::Nonterminal)?.text.to_string());
        }
        self.expect(TokenKind::CloseBracket)?;
        Ok(self.builder.nt_lhs(name.text, Some(params)))
    }

    fn t_list_lines(&mut self) -> Result<Vec<Element>> {
        let mut terminals = self.builder.blank_line();
        loop {
            let mut line = self.builder.blank_line();
            while let Some(t) = self.terminal_element() {
                line = self.builder.append(line, t);
            }
            terminals = self.builder.concat(terminals, line);
            if !self.at_line_end() {
                return Err(self.unexpected("terminal"));
            }
            if !self.next_line_continues() {
                return Ok(terminals);
            }
        }
    }

    fn terminal_element(&mut self) -> Option<Element> {
        if let Some(t) = self.eat(TokenKind::Terminal) {
            return Some(Element::Quoted(t.text.to_string()));
        }
        let chr = self.eat(TokenKind::Chr)?;
        Some(Element::Terminal(self.builder.terminal_chr(chr.text)))
    }

    // --- Right-hand sides ---

    fn rhs_line(&mut self) -> Result<Rhs> {
        if let Some(prose) = self.eat(TokenKind::Prose) {
            return Ok(self.builder.rhs_line_prose(prose.text));
        }

        let ifdef = self.ifdef()?;
        let body = if self.peek() == Some(TokenKind::OpenBracket)
            && self.peek_nth(1) == Some(TokenKind::Empty)
        {
            self.pos += 2;
            self.expect(TokenKind::CloseBracket)?;
            self.builder.empty_rhs()
        } else {
            let first = self.symbol()?;
            let mut symbols = self.builder.single(first);
            while !self.at_line_end() && self.peek() != Some(TokenKind::ProductionId) {
                let symbol = self.symbol()?;
                symbols = self.builder.append(symbols, symbol);
            }
            symbols
        };
        let prodid = self.eat(TokenKind::ProductionId).map(|t| t.text);
        if !self.at_line_end() {
            return Err(self.unexpected("end of line"));
        }
        Ok(self.builder.rhs_line(ifdef, body, prodid))
    }

    fn ifdef(&mut self) -> Result<Option<(String, bool)>> {
        let value = match (self.peek(), self.peek_nth(1)) {
            (Some(TokenKind::OpenBracket), Some(TokenKind::Plus)) => true,
            (Some(TokenKind::OpenBracket), Some(TokenKind::Tilde)) => false,
            _ => return Ok(None),
        };
        self.pos += 2;
        let nt = self.expect(TokenKind::Nonterminal)?;
        self.expect(TokenKind::CloseBracket)?;
        Ok(Some(self.builder.ifdef(value, nt.text)))
    }

    fn symbol(&mut self) -> Result<Element> {
        let token = match self.tokens.get(self.pos) {
            Some(t) => t,
            None => return Err(self.unexpected("grammar symbol")),
        };
        let element = match token.kind {
            TokenKind::Terminal => {
                self.pos += 1;
                Element::Quoted(token.text.to_string())
            }
            TokenKind::Chr => {
                self.pos += 1;
                Element::Terminal(self.builder.terminal_chr(token.text))
            }
            TokenKind::Nonterminal | TokenKind::NonterminalAlt => {
                self.pos += 1;
                self.builder.nonterminal(token.text)
            }
            TokenKind::NonterminalCall => {
                self.pos += 1;
                let args = self.args()?;
                self.builder.nonterminal_apply(token.text, args)?
            }
            TokenKind::WrappedProse => {
                self.pos += 1;
                return Ok(Element::Prose(
                    token.text[2..token.text.len() - 1].trim().to_string(),
                ));
            }
            TokenKind::OpenBracket => return self.bracketed_assertion(),
            _ => return Err(self.unexpected("grammar symbol")),
        };
        self.postfix(element)
    }

    fn postfix(&mut self, element: Element) -> Result<Element> {
        if self.eat(TokenKind::Question).is_some() {
            return Ok(self.builder.optional(element));
        }
        if self.eat(TokenKind::But).is_none() {
            return Ok(element);
        }
        self.expect(TokenKind::Not)?;
        if self.peek() == Some(TokenKind::One) {
            self.pos += 1;
            self.expect(TokenKind::Of)?;
            let first = self.exclusion()?;
            let mut exclusions = self.builder.single(first);
            while self.eat(TokenKind::Or).is_some() {
                let exclusion = self.exclusion()?;
                exclusions = self.builder.append(exclusions, exclusion);
            }
            return Ok(self.builder.but_not_one_of(element, exclusions));
        }
        let exclusion = self.exclusion()?;
        Ok(self.builder.but_not(element, exclusion))
    }

    fn exclusion(&mut self) -> Result<Exclusion> {
        let token = match self.tokens.get(self.pos) {
            Some(t) => t,
            None => return Err(self.unexpected("exclusion")),
        };
        match token.kind {
            TokenKind::Terminal => {
                self.pos += 1;
                Ok(self.builder.exclusion_terminal(self.builder.terminal(token.text)?))
            }
            TokenKind::Nonterminal | TokenKind::NonterminalAlt => {
                self.pos += 1;
                Ok(self.builder.exclusion_nonterminal(token.text))
            }
            TokenKind::Chr => {
                self.pos += 1;
                if self.eat(TokenKind::Through).is_some() {
                    let to = self.expect(TokenKind::Chr)?;
                    Ok(self.builder.exclusion_chr_range(token.text, to.text))
                } else {
                    Ok(self
                        .builder
                        .exclusion_terminal(self.builder.terminal_chr(token.text)))
                }
            }
            _ => Err(self.unexpected("exclusion")),
        }
    }

    /// `[lookahead ...]` or `[no LineTerminator here]`.
    fn bracketed_assertion(&mut self) -> Result<Element> {
        self.expect(TokenKind::OpenBracket)?;
        let element = match self.peek() {
            Some(TokenKind::Lookahead) => {
                self.pos += 1;
                self.lookahead_assertion()?
            }
            Some(TokenKind::No) => {
                self.pos += 1;
                self.expect_word("LineTerminator")?;
                self.expect(TokenKind::Here)?;
                self.builder.no_line_terminator_here()
            }
            _ => return Err(self.unexpected("`lookahead` or `no`")),
        };
        self.expect(TokenKind::CloseBracket)?;
        Ok(element)
    }

    fn lookahead_assertion(&mut self) -> Result<Element> {
        if self.eat(TokenKind::EqEq).is_some() {
            let t = self.lookahead_terminal()?;
            return Ok(self.builder.la_eq(t));
        }
        if self.eat(TokenKind::NotEq).is_some() {
            let t = self.lookahead_terminal()?;
            return Ok(self.builder.la_ne(t));
        }
        self.expect(TokenKind::NotIn)?;
        if self.eat(TokenKind::OpenBrace).is_none() {
            let nt = match self.eat(TokenKind::NonterminalAlt) {
                Some(nt) => nt,
                None => self.expect(TokenKind::Nonterminal)?,
            };
            return Ok(self.builder.la_not_in_nonterminal(nt.text.trim_matches('|')));
        }
        let mut exclusions = vec![self.lookahead_exclusion()?];
        while self.eat(TokenKind::Comma).is_some() {
            exclusions.push(self.lookahead_exclusion()?);
        }
        self.expect(TokenKind::CloseBrace)?;
        self.builder.la_not_in_set(exclusions)
    }

    fn lookahead_terminal(&mut self) -> Result<String> {
        if let Some(t) = self.eat(TokenKind::Terminal) {
            return self.builder.terminal(t.text);
        }
        match self.eat(TokenKind::Chr) {
            Some(chr) => Ok(self.builder.terminal_chr(chr.text)),
            None => Err(self.unexpected("terminal")),
        }
    }

    /// One member of a lookahead set: a sequence of terminals, possibly
    /// interleaved with `[no LineTerminator here]`.
    fn lookahead_exclusion(&mut self) -> Result<Vec<LookaheadItem>> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::Terminal) | Some(TokenKind::Chr) => {
                    items.push(LookaheadItem::Terminal(self.lookahead_terminal()?));
                }
                Some(TokenKind::OpenBracket) if self.peek_nth(1) == Some(TokenKind::No) => {
                    self.pos += 2;
                    self.expect_word("LineTerminator")?;
                    self.expect(TokenKind::Here)?;
                    self.expect(TokenKind::CloseBracket)?;
                    items.push(LookaheadItem::NoLineTerminatorHere);
                }
                _ if items.is_empty() => return Err(self.unexpected("terminal")),
                _ => return Ok(items),
            }
        }
    }

    fn args(&mut self) -> Result<Vec<(String, FlagValue)>> {
        self.expect(TokenKind::OpenBracket)?;
        let first = self.arg()?;
        let mut args = self.builder.single(first);
        while self.eat(TokenKind::Comma).is_some() {
            let arg = self.arg()?;
            args = self.builder.append(args, arg);
        }
        self.expect(TokenKind::CloseBracket)?;
        Ok(args)
    }

    fn arg(&mut self) -> Result<(String, FlagValue)> {
        let sigil = match self.peek() {
            Some(TokenKind::Plus) => Sigil::True,
            Some(TokenKind::Tilde) => Sigil::False,
            Some(TokenKind::Question) => Sigil::Inherit,
            _ => return Err(self.unexpected("`+`, `~` or `?`")),
        };
        self.pos += 1;
        let name = self.expect(TokenKind::Nonterminal)?;
        Ok(self.builder.arg_expr(sigil, name.text))
    }
}
