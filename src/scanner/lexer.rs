use winnow::combinator::{alt, opt};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::stream::{LocatingSlice, Location, Stream};
use winnow::token::{any, take_till, take_while};

use crate::scanner::token::{Span, Token, TokenKind, keyword_kind};

type Input<'src> = LocatingSlice<&'src str>;

/// A lazy tokenizer over a single source string.
///
/// `scan_token` produces one token per call and returns `Eof` forever once
/// the input is exhausted. Invalid input never aborts the scan: it yields an
/// `Error` token whose lexeme is the diagnostic message, and scanning
/// resumes at the next character.
pub struct Scanner<'src> {
    source: &'src str,
    input: Input<'src>,
    line: usize,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut input = LocatingSlice::new(source);
        let _ = opt(shebang).parse_next(&mut input);
        let line = 1 + count_newlines(&source[..input.current_token_start()]);
        Self {
            source,
            input,
            line,
        }
    }

    /// Scan and return the next token.
    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        let start = self.input.current_token_start();
        if self.input.is_empty() {
            return Token::new(TokenKind::Eof, "", Span::new(start, 0), self.line);
        }
        if self.input.starts_with("\"") {
            return self.string(start);
        }
        let checkpoint = self.input.checkpoint();
        match lexeme_kind(&mut self.input) {
            Ok(kind) => self.make_token(kind, start),
            Err(_) => {
                // Consume the offending character so the scan can continue.
                self.input.reset(&checkpoint);
                let _ = any::<_, ContextError>.parse_next(&mut self.input);
                let len = self.input.current_token_start() - start;
                Token::new(
                    TokenKind::Error,
                    "Unexpected character.",
                    Span::new(start, len),
                    self.line,
                )
            }
        }
    }

    fn make_token(&self, kind: TokenKind, start: usize) -> Token<'src> {
        let end = self.input.current_token_start();
        let lexeme = &self.source[start..end];
        // Reserved words are ordinary identifiers until proven otherwise.
        let kind = if kind == TokenKind::Identifier {
            keyword_kind(lexeme).unwrap_or(TokenKind::Identifier)
        } else {
            kind
        };
        Token::new(kind, lexeme, Span::new(start, end - start), self.line)
    }

    fn string(&mut self, start: usize) -> Token<'src> {
        let checkpoint = self.input.checkpoint();
        match string_literal(&mut self.input) {
            Ok(()) => {
                let end = self.input.current_token_start();
                let lexeme = &self.source[start..end];
                self.line += count_newlines(lexeme);
                Token::new(
                    TokenKind::String,
                    lexeme,
                    Span::new(start, end - start),
                    self.line,
                )
            }
            Err(_) => {
                // No closing quote before end of input. Consume the rest so
                // subsequent calls report Eof.
                self.input.reset(&checkpoint);
                if let Ok(rest) = take_while::<_, _, ContextError>(0.., |_: char| true)
                    .parse_next(&mut self.input)
                {
                    self.line += count_newlines(rest);
                }
                let len = self.input.current_token_start() - start;
                Token::new(
                    TokenKind::Error,
                    "Unterminated string.",
                    Span::new(start, len),
                    self.line,
                )
            }
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            let before = self.input.current_token_start();
            if let Ok(ws) = take_while::<_, _, ContextError>(0.., |c: char| {
                c == ' ' || c == '\t' || c == '\r' || c == '\n'
            })
            .parse_next(&mut self.input)
            {
                self.line += count_newlines(ws);
            }

            if self.input.starts_with("//") {
                let _ = take_till::<_, _, ContextError>(0.., '\n').parse_next(&mut self.input);
            } else if self.input.current_token_start() == before {
                break;
            }
        }
    }
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

fn shebang(input: &mut Input<'_>) -> ModalResult<()> {
    ("#!", take_till(0.., '\n'), opt('\n'))
        .void()
        .parse_next(input)
}

fn lexeme_kind(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        number_literal,
        identifier,
        two_char_token,
        single_char_token,
    ))
    .parse_next(input)
}

fn string_literal(input: &mut Input<'_>) -> ModalResult<()> {
    ('"', take_till(0.., '"'), '"').void().parse_next(input)
}

fn number_literal(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
    )
        .value(TokenKind::Number)
        .parse_next(input)
}

fn identifier(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    (
        any.verify(|c: &char| c.is_ascii_alphabetic() || *c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .value(TokenKind::Identifier)
        .parse_next(input)
}

fn two_char_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        "!=".value(TokenKind::BangEqual),
        "==".value(TokenKind::EqualEqual),
        ">=".value(TokenKind::GreaterEqual),
        "<=".value(TokenKind::LessEqual),
    ))
    .parse_next(input)
}

fn single_char_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let c = any
        .verify(|c: &char| "(){},.;-+/*!=<>".contains(*c))
        .parse_next(input)?;
    let kind = match c {
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        '-' => TokenKind::Minus,
        '+' => TokenKind::Plus,
        ';' => TokenKind::Semicolon,
        '/' => TokenKind::Slash,
        '*' => TokenKind::Star,
        '!' => TokenKind::Bang,
        '=' => TokenKind::Equal,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        _ => unreachable!("verify guarantees valid char"),
    };
    Ok(kind)
}
