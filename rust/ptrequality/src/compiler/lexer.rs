//! Lexer for the Go subset, including automatic semicolon insertion.

use crate::compiler::tokens::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at line {line}, col {col}")]
    UnexpectedChar { ch: char, line: usize, col: usize },
    #[error("unterminated string at line {line}, col {col}")]
    UnterminatedString { line: usize, col: usize },
    #[error("unterminated rune literal at line {line}, col {col}")]
    UnterminatedChar { line: usize, col: usize },
    #[error("unterminated comment at line {line}, col {col}")]
    UnterminatedComment { line: usize, col: usize },
    #[error("invalid number at line {line}, col {col}")]
    InvalidNumber { line: usize, col: usize },
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    byte_offset: usize,
    insert_semi: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0, line: 1, col: 1, byte_offset: 0,
            insert_semi: false,
        }
    }

    fn current(&self) -> Option<char> { self.source.get(self.pos).copied() }
    fn peek(&self) -> Option<char> { self.source.get(self.pos + 1).copied() }
    fn peek2(&self) -> Option<char> { self.source.get(self.pos + 2).copied() }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        self.byte_offset += ch.len_utf8();
        if ch == '\n' { self.line += 1; self.col = 1; } else { self.col += 1; }
        Some(ch)
    }

    fn span_here(&self) -> Span {
        Span::new(self.byte_offset, self.byte_offset, self.line, self.col)
    }

    fn span_from(&self, so: usize, sl: usize, sc: usize) -> Span {
        Span::new(so, self.byte_offset, sl, sc)
    }

    fn push(&mut self, tokens: &mut Vec<Token>, token: Token) {
        self.insert_semi = token.kind.ends_statement();
        tokens.push(token);
    }

    fn skip_block_comment(&mut self) -> Result<bool, LexError> {
        let (sl, sc) = (self.line, self.col);
        self.advance(); self.advance();
        let mut saw_newline = false;
        loop {
            match self.current() {
                None => return Err(LexError::UnterminatedComment { line: sl, col: sc }),
                Some('*') if self.peek() == Some('/') => { self.advance(); self.advance(); return Ok(saw_newline); }
                Some('\n') => { saw_newline = true; self.advance(); }
                Some(_) => { self.advance(); }
            }
        }
    }

    fn read_escape(&mut self, quote: char, sl: usize, sc: usize) -> Result<char, LexError> {
        let unterminated = || if quote == '"' {
            LexError::UnterminatedString { line: sl, col: sc }
        } else {
            LexError::UnterminatedChar { line: sl, col: sc }
        };
        self.advance(); // backslash
        let ch = self.advance().ok_or_else(unterminated)?;
        Ok(match ch {
            'n' => '\n', 't' => '\t', 'r' => '\r', 'a' => '\u{07}', 'b' => '\u{08}',
            'f' => '\u{0c}', 'v' => '\u{0b}', '\\' => '\\', '\'' => '\'', '"' => '"',
            'x' | 'u' | 'U' => {
                let width = match ch { 'x' => 2, 'u' => 4, _ => 8 };
                let mut digits = String::new();
                for _ in 0..width {
                    match self.current() {
                        Some(d) if d.is_ascii_hexdigit() => { digits.push(d); self.advance(); }
                        _ => break,
                    }
                }
                u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32).unwrap_or('\u{fffd}')
            }
            '0'..='7' => {
                let mut digits = ch.to_string();
                for _ in 0..2 {
                    match self.current() {
                        Some(d @ '0'..='7') => { digits.push(d); self.advance(); }
                        _ => break,
                    }
                }
                u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32).unwrap_or('\u{fffd}')
            }
            other => other,
        })
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.current() {
                None | Some('\n') => return Err(LexError::UnterminatedString { line: sl, col: sc }),
                Some('\\') => s.push(self.read_escape('"', sl, sc)?),
                Some('"') => { self.advance(); break; }
                Some(c) => { s.push(c); self.advance(); }
            }
        }
        Ok(Token::new(TokenKind::StringLit(s), self.span_from(so, sl, sc)))
    }

    fn read_raw_string(&mut self) -> Result<Token, LexError> {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        self.advance();
        let mut s = String::new();
        loop {
            match self.current() {
                None => return Err(LexError::UnterminatedString { line: sl, col: sc }),
                Some('`') => { self.advance(); break; }
                Some('\r') => { self.advance(); }
                Some(c) => { s.push(c); self.advance(); }
            }
        }
        Ok(Token::new(TokenKind::StringLit(s), self.span_from(so, sl, sc)))
    }

    fn read_char(&mut self) -> Result<Token, LexError> {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        self.advance();
        let ch = match self.current() {
            None | Some('\n') | Some('\'') => return Err(LexError::UnterminatedChar { line: sl, col: sc }),
            Some('\\') => self.read_escape('\'', sl, sc)?,
            Some(c) => { self.advance(); c }
        };
        if self.current() != Some('\'') {
            return Err(LexError::UnterminatedChar { line: sl, col: sc });
        }
        self.advance();
        Ok(Token::new(TokenKind::CharLit(ch), self.span_from(so, sl, sc)))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        let mut ns = String::new();
        let mut is_float = false;
        let prefixed = self.current() == Some('0') && matches!(self.peek(), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'));
        if prefixed {
            ns.push('0'); self.advance();
            if let Some(p) = self.advance() { ns.push(p); }
            while let Some(ch) = self.current() {
                if ch.is_ascii_hexdigit() || ch == '_' { ns.push(ch); self.advance(); } else { break; }
            }
            if ns.len() <= 2 {
                return Err(LexError::InvalidNumber { line: sl, col: sc });
            }
            return Ok(Token::new(TokenKind::IntLit(ns), self.span_from(so, sl, sc)));
        }
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() || ch == '_' { ns.push(ch); self.advance(); }
            else if ch == '.' && !is_float { is_float = true; ns.push(ch); self.advance(); }
            else if matches!(ch, 'e' | 'E') {
                is_float = true; ns.push(ch); self.advance();
                if let Some(sign @ ('+' | '-')) = self.current() { ns.push(sign); self.advance(); }
                if !matches!(self.current(), Some(d) if d.is_ascii_digit()) {
                    return Err(LexError::InvalidNumber { line: sl, col: sc });
                }
            }
            else { break; }
        }
        let span = self.span_from(so, sl, sc);
        if is_float { Ok(Token::new(TokenKind::FloatLit(ns), span)) } else { Ok(Token::new(TokenKind::IntLit(ns), span)) }
    }

    fn read_ident(&mut self) -> Token {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        let mut id = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' { id.push(ch); self.advance(); } else { break; }
        }
        let span = self.span_from(so, sl, sc);
        let kind = TokenKind::keyword(&id).unwrap_or(TokenKind::Ident(id));
        Token::new(kind, span)
    }

    /// Longest match over `candidates`, each a (text, kind) pair; the first
    /// character is already known to match.
    fn operator(&mut self, candidates: &[(&str, TokenKind)]) -> Token {
        let (so, sl, sc) = (self.byte_offset, self.line, self.col);
        for (text, kind) in candidates {
            let matched = text.chars().enumerate().all(|(i, c)| self.source.get(self.pos + i) == Some(&c));
            if matched {
                for _ in 0..text.chars().count() { self.advance(); }
                return Token::new(kind.clone(), self.span_from(so, sl, sc));
            }
        }
        let ch = self.advance().unwrap_or('\0');
        Token::new(TokenKind::Ident(ch.to_string()), self.span_from(so, sl, sc))
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        use TokenKind as T;
        let mut tokens = Vec::new();
        loop {
            let ch = match self.current() {
                Some(c) => c,
                None => {
                    if self.insert_semi { let span = self.span_here(); self.push(&mut tokens, Token::new(T::Semi, span)); }
                    tokens.push(Token::new(T::Eof, self.span_here()));
                    return Ok(tokens);
                }
            };
            match ch {
                '\n' => {
                    if self.insert_semi { let span = self.span_here(); self.push(&mut tokens, Token::new(T::Semi, span)); }
                    self.advance();
                }
                ' ' | '\t' | '\r' => { self.advance(); }
                '/' if self.peek() == Some('/') => { while matches!(self.current(), Some(c) if c != '\n') { self.advance(); } }
                '/' if self.peek() == Some('*') => {
                    let span = self.span_here();
                    if self.skip_block_comment()? && self.insert_semi { self.push(&mut tokens, Token::new(T::Semi, span)); }
                }
                '"' => { let tok = self.read_string()?; self.push(&mut tokens, tok); }
                '`' => { let tok = self.read_raw_string()?; self.push(&mut tokens, tok); }
                '\'' => { let tok = self.read_char()?; self.push(&mut tokens, tok); }
                '0'..='9' => { let tok = self.read_number()?; self.push(&mut tokens, tok); }
                '.' if matches!(self.peek(), Some(d) if d.is_ascii_digit()) => { let tok = self.read_number()?; self.push(&mut tokens, tok); }
                c if c.is_alphabetic() || c == '_' => { let tok = self.read_ident(); self.push(&mut tokens, tok); }
                _ => {
                    let tok = match ch {
                        '+' => self.operator(&[("++", T::Inc), ("+=", T::PlusAssign), ("+", T::Plus)]),
                        '-' => self.operator(&[("--", T::Dec), ("-=", T::MinusAssign), ("-", T::Minus)]),
                        '*' => self.operator(&[("*=", T::StarAssign), ("*", T::Star)]),
                        '/' => self.operator(&[("/=", T::SlashAssign), ("/", T::Slash)]),
                        '%' => self.operator(&[("%=", T::PercentAssign), ("%", T::Percent)]),
                        '&' => self.operator(&[("&^=", T::AndNotAssign), ("&^", T::AndNot), ("&&", T::AndAnd), ("&=", T::AmpAssign), ("&", T::Amp)]),
                        '|' => self.operator(&[("||", T::OrOr), ("|=", T::PipeAssign), ("|", T::Pipe)]),
                        '^' => self.operator(&[("^=", T::CaretAssign), ("^", T::Caret)]),
                        '<' => self.operator(&[("<<=", T::ShlAssign), ("<<", T::Shl), ("<=", T::LtEq), ("<-", T::Arrow), ("<", T::Lt)]),
                        '>' => self.operator(&[(">>=", T::ShrAssign), (">>", T::Shr), (">=", T::GtEq), (">", T::Gt)]),
                        '=' => self.operator(&[("==", T::Eq), ("=", T::Assign)]),
                        '!' => self.operator(&[("!=", T::NotEq), ("!", T::Not)]),
                        ':' => self.operator(&[(":=", T::Define), (":", T::Colon)]),
                        '.' if self.peek() == Some('.') && self.peek2() == Some('.') => self.operator(&[("...", T::Ellipsis)]),
                        '.' => self.operator(&[(".", T::Dot)]),
                        '~' => self.operator(&[("~", T::Tilde)]),
                        ',' => self.operator(&[(",", T::Comma)]),
                        ';' => self.operator(&[(";", T::Semi)]),
                        '(' => self.operator(&[("(", T::LParen)]),
                        ')' => self.operator(&[(")", T::RParen)]),
                        '[' => self.operator(&[("[", T::LBracket)]),
                        ']' => self.operator(&[("]", T::RBracket)]),
                        '{' => self.operator(&[("{", T::LBrace)]),
                        '}' => self.operator(&[("}", T::RBrace)]),
                        _ => return Err(LexError::UnexpectedChar { ch, line: self.line, col: self.col }),
                    };
                    self.push(&mut tokens, tok);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_comparison() {
        let k = kinds("_ = &T{} == new(T)");
        assert_eq!(k[0], TokenKind::Ident("_".into()));
        assert_eq!(k[1], TokenKind::Assign);
        assert_eq!(k[2], TokenKind::Amp);
        assert_eq!(k[6], TokenKind::Eq);
        assert_eq!(k[7], TokenKind::Ident("new".into()));
    }

    #[test]
    fn test_lex_semicolon_insertion() {
        let k = kinds("x := 1\nreturn\n}\nfoo(\n  a,\n)");
        assert_eq!(k[3], TokenKind::Semi);
        assert_eq!(k[4], TokenKind::Return);
        assert_eq!(k[5], TokenKind::Semi);
        assert_eq!(k[6], TokenKind::RBrace);
        assert_eq!(k[7], TokenKind::Semi);
        // no semicolon after `(` or `,`
        assert_eq!(k[10], TokenKind::Ident("a".into()));
        assert_eq!(k[11], TokenKind::Comma);
        assert_eq!(k[12], TokenKind::RParen);
    }

    #[test]
    fn test_lex_operators() {
        let k = kinds("a &^= b <- c && d != e ... :=");
        assert!(k.contains(&TokenKind::AndNotAssign));
        assert!(k.contains(&TokenKind::Arrow));
        assert!(k.contains(&TokenKind::AndAnd));
        assert!(k.contains(&TokenKind::NotEq));
        assert!(k.contains(&TokenKind::Ellipsis));
        assert!(k.contains(&TokenKind::Define));
    }

    #[test]
    fn test_lex_literals() {
        let k = kinds(r#"0x1F 1.5e3 'a' '\n' "hi\t" `raw
string`"#);
        assert_eq!(k[0], TokenKind::IntLit("0x1F".into()));
        assert_eq!(k[1], TokenKind::FloatLit("1.5e3".into()));
        assert_eq!(k[2], TokenKind::CharLit('a'));
        assert_eq!(k[3], TokenKind::CharLit('\n'));
        assert_eq!(k[4], TokenKind::StringLit("hi\t".into()));
        assert_eq!(k[5], TokenKind::StringLit("raw\nstring".into()));
    }

    #[test]
    fn test_lex_comments() {
        let k = kinds("a // trailing\n/* block\n */ b");
        assert_eq!(k, vec![
            TokenKind::Ident("a".into()),
            TokenKind::Semi,
            TokenKind::Ident("b".into()),
            TokenKind::Semi,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_lex_positions() {
        let toks = Lexer::new("package a\n\nfunc f() {}").tokenize().unwrap();
        let func = toks.iter().find(|t| t.kind == TokenKind::Func).unwrap();
        assert_eq!(func.span.line, 3);
        assert_eq!(func.span.col, 1);
    }

    #[test]
    fn test_lex_errors() {
        assert!(matches!(Lexer::new("\"open").tokenize(), Err(LexError::UnterminatedString { .. })));
        assert!(matches!(Lexer::new("/* open").tokenize(), Err(LexError::UnterminatedComment { .. })));
        assert!(matches!(Lexer::new("a $ b").tokenize(), Err(LexError::UnexpectedChar { ch: '$', .. })));
    }
}
