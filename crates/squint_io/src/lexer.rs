//! Character-cursor scanner shared by the parser.
//!
//! This is deliberately not a stand-alone "tokenize the whole file up front"
//! lexer: raw argument payloads (angle expressions, `return { … }` bodies,
//! damping annotations) use characters — `π`, `η`, `Φ`, `⊕` — that have no
//! place in the structured grammar at all. A whole-file tokenizer would have
//! to choke on them. Instead the parser drives this cursor: it asks for a
//! structural [`Token`] when it expects grammar, and asks for a raw capture
//! when it expects an opaque payload, and the cursor never classifies text
//! it's told to capture raw. The parser is responsible for never requesting
//! a structural token when a raw payload is what actually comes next — see
//! the "one token of lookahead" discipline documented in `parser.rs`.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Arrow,
    Eq,
    EqEq,
    Ge,
    Le,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0, line: 1 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skips whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.rest().starts_with("//") => {
                    while !matches!(self.peek_char(), None | Some('\n')) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Produces the next structural token per the DSL grammar.
    ///
    /// Only call this where the grammar guarantees a well-formed token comes
    /// next. Calling it where a raw payload (an angle expression, a defect
    /// body, …) starts instead will misread that payload's content or fail
    /// outright on a character the structured grammar has no token for.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();
        let line = self.line;
        let Some(c) = self.peek_char() else {
            return Ok(Token { kind: TokenKind::Eof, line });
        };

        let kind = match c {
            '{' => { self.bump(); TokenKind::LBrace }
            '}' => { self.bump(); TokenKind::RBrace }
            '(' => { self.bump(); TokenKind::LParen }
            ')' => { self.bump(); TokenKind::RParen }
            '[' => { self.bump(); TokenKind::LBracket }
            ']' => { self.bump(); TokenKind::RBracket }
            ',' => { self.bump(); TokenKind::Comma }
            ';' => { self.bump(); TokenKind::Semicolon }
            ':' => { self.bump(); TokenKind::Colon }
            '≥' => { self.bump(); TokenKind::Ge }
            '≤' => { self.bump(); TokenKind::Le }
            '-' if self.rest().starts_with("->") => {
                self.bump();
                self.bump();
                TokenKind::Arrow
            }
            '=' if self.rest().starts_with("==") => {
                self.bump();
                self.bump();
                TokenKind::EqEq
            }
            '=' => { self.bump(); TokenKind::Eq }
            '>' if self.rest().starts_with(">=") => {
                self.bump();
                self.bump();
                TokenKind::Ge
            }
            '<' if self.rest().starts_with("<=") => {
                self.bump();
                self.bump();
                TokenKind::Le
            }
            c if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
                let text = &self.src[start..self.pos];
                TokenKind::Int(text.parse().map_err(|_| ParseError::new(line, format!("bad integer literal '{text}'")))?)
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = self.pos;
                while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '_') {
                    self.bump();
                }
                TokenKind::Ident(self.src[start..self.pos].to_string())
            }
            other => {
                return Err(ParseError::new(line, format!("unexpected character '{other}'")));
            }
        };
        Ok(Token { kind, line })
    }

    /// Captures text starting at the cursor's current position (right after
    /// an `open` delimiter the caller has already seen but not tokenized
    /// past), through its matching `close`, tracking nested occurrences of
    /// the same pair. Leaves the cursor past the consumed `close`.
    pub fn capture_balanced(&mut self, open: char, close: char) -> Result<String, ParseError> {
        let start = self.pos;
        let mut depth = 1usize;
        loop {
            let line = self.line;
            match self.bump() {
                None => return Err(ParseError::new(line, "unbalanced braces: unexpected end of input")),
                Some(c) if c == open => depth += 1,
                Some(c) if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.src[start..self.pos - close.len_utf8()].trim().to_string());
                    }
                }
                _ => {}
            }
        }
    }

    /// Captures raw text from the cursor's current position up to (not
    /// including) the first top-level occurrence of one of `stop_chars` or
    /// `stop_words`, tracking bracket depth across `(){}[]` so nested
    /// payloads aren't cut short.
    pub fn capture_until_top_level(
        &mut self,
        stop_chars: &[char],
        stop_words: &[&str],
    ) -> Result<String, ParseError> {
        let start = self.pos;
        let mut depth: i32 = 0;
        loop {
            let Some(c) = self.peek_char() else {
                return Err(ParseError::new(self.line, "unexpected end of input while reading argument text"));
            };
            if depth == 0 {
                if stop_chars.contains(&c) {
                    return Ok(self.src[start..self.pos].trim().to_string());
                }
                if stop_words.iter().any(|w| self.matches_word(w)) {
                    return Ok(self.src[start..self.pos].trim().to_string());
                }
            }
            match c {
                '(' | '{' | '[' => depth += 1,
                ')' | '}' | ']' => depth -= 1,
                _ => {}
            }
            self.bump();
        }
    }

    fn matches_word(&self, word: &str) -> bool {
        let rest = self.rest();
        if !rest.starts_with(word) {
            return false;
        }
        match rest[word.len()..].chars().next() {
            Some(c) => !(c.is_alphanumeric() || c == '_'),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn normalises_ascii_overlay_operators() {
        assert_eq!(kinds(">="), vec![TokenKind::Ge]);
        assert_eq!(kinds("<="), vec![TokenKind::Le]);
        assert_eq!(kinds("≥"), vec![TokenKind::Ge]);
    }

    #[test]
    fn strips_line_comments() {
        assert_eq!(kinds("qubits // trailing note\nq"), vec![
            TokenKind::Ident("qubits".to_string()),
            TokenKind::Ident("q".to_string()),
        ]);
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let mut lexer = Lexer::new("a\nb\nc");
        assert_eq!(lexer.next_token().unwrap().line, 1);
        assert_eq!(lexer.next_token().unwrap().line, 2);
        assert_eq!(lexer.next_token().unwrap().line, 3);
    }

    #[test]
    fn captures_balanced_braces_verbatim() {
        let mut lexer = Lexer::new("{(0,0),(1,1)}");
        let open = lexer.next_token().unwrap();
        assert_eq!(open.kind, TokenKind::LBrace);
        let raw = lexer.capture_balanced('{', '}').unwrap();
        assert_eq!(raw, "(0,0),(1,1)");
    }

    #[test]
    fn captures_until_top_level_semicolon_past_nested_braces() {
        let mut lexer = Lexer::new("T_eff into X with corrections {defects=D, field=Phi};");
        let raw = lexer.capture_until_top_level(&[';'], &[]).unwrap();
        assert_eq!(raw, "T_eff into X with corrections {defects=D, field=Phi}");
    }

    #[test]
    fn captures_until_top_level_keyword() {
        let mut lexer = Lexer::new("π/2 with overlay {}");
        let raw = lexer.capture_until_top_level(&[';'], &["with", "unless"]).unwrap();
        assert_eq!(raw, "π/2");
    }
}
