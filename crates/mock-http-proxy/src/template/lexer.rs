//! Tokenizer for predicate templates.
//!
//! Literal text is passed through untouched. Everything between `{{` and
//! `}}` is split into tokens. `{{- ` and ` -}}` trim the adjacent text's
//! whitespace, and `{{/* ... */}}` is a comment.

use super::TemplateError;
use regex::Regex;
use serde_json::Number;
use std::sync::OnceLock;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_number_regex() -> &'static Regex {
    NUMBER_REGEX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$").unwrap()
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Text(String),
    LeftDelim,
    RightDelim,
    LeftParen,
    RightParen,
    Pipe,
    /// `.` on its own
    Dot,
    /// `.Query.id` as `["Query", "id"]`
    Field(Vec<String>),
    Identifier(String),
    String(String),
    Number(Number),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

pub(crate) fn lex(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut lexer = Lexer {
        src: source,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_field_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn emit(&mut self, kind: TokenKind, pos: usize) {
        self.tokens.push(Token { kind, pos });
    }

    fn error<T>(&self, pos: usize, message: impl Into<String>) -> Result<T, TemplateError> {
        Err(TemplateError::Parse {
            pos,
            message: message.into(),
        })
    }

    fn run(&mut self) -> Result<(), TemplateError> {
        let mut trim_leading = false;

        loop {
            let rest = self.rest();
            let Some(offset) = rest.find(LEFT_DELIM) else {
                let text = if trim_leading {
                    rest.trim_start_matches(is_space)
                } else {
                    rest
                };
                if !text.is_empty() {
                    let pos = self.src.len() - text.len();
                    self.emit(TokenKind::Text(text.to_string()), pos);
                }
                return Ok(());
            };

            let delim_pos = self.pos + offset;
            let after_delim = delim_pos + LEFT_DELIM.len();
            let trim_trailing = self.src[after_delim..].starts_with('-')
                && self.src[after_delim + 1..].starts_with(is_space);

            let mut text = &rest[..offset];
            let mut text_pos = self.pos;
            if trim_leading {
                let trimmed = text.trim_start_matches(is_space);
                text_pos += text.len() - trimmed.len();
                text = trimmed;
            }
            if trim_trailing {
                text = text.trim_end_matches(is_space);
            }
            if !text.is_empty() {
                self.emit(TokenKind::Text(text.to_string()), text_pos);
            }

            self.pos = after_delim + usize::from(trim_trailing);
            trim_leading = self.lex_action(delim_pos)?;
        }
    }

    /// Lex one action. Returns whether the following text must be left-trimmed.
    fn lex_action(&mut self, delim_pos: usize) -> Result<bool, TemplateError> {
        let body = self.rest().trim_start_matches(is_space);
        if body.starts_with(LEFT_COMMENT) {
            self.pos = self.src.len() - body.len();
            return self.lex_comment(delim_pos);
        }

        self.emit(TokenKind::LeftDelim, delim_pos);

        loop {
            let before = self.pos;
            while self.peek().is_some_and(is_space) {
                self.pos += 1;
            }
            let skipped_space = self.pos > before;

            if skipped_space && self.rest().starts_with("-}}") {
                self.emit(TokenKind::RightDelim, self.pos);
                self.pos += 3;
                return Ok(true);
            }
            if self.rest().starts_with(RIGHT_DELIM) {
                self.emit(TokenKind::RightDelim, self.pos);
                self.pos += RIGHT_DELIM.len();
                return Ok(false);
            }

            let start = self.pos;
            let Some(c) = self.peek() else {
                return self.error(delim_pos, "unclosed action");
            };

            match c {
                '(' => {
                    self.pos += 1;
                    self.emit(TokenKind::LeftParen, start);
                }
                ')' => {
                    self.pos += 1;
                    self.emit(TokenKind::RightParen, start);
                }
                '|' => {
                    self.pos += 1;
                    self.emit(TokenKind::Pipe, start);
                }
                '"' => self.lex_quote()?,
                '`' => self.lex_raw_quote()?,
                '.' => match self.peek_second() {
                    Some(next) if next.is_ascii_digit() => self.lex_number()?,
                    Some(next) if is_ident_start(next) => self.lex_field(),
                    _ => {
                        self.pos += 1;
                        self.emit(TokenKind::Dot, start);
                    }
                },
                '+' | '-'
                    if self
                        .peek_second()
                        .is_some_and(|n| n.is_ascii_digit() || n == '.') =>
                {
                    self.lex_number()?
                }
                c if c.is_ascii_digit() => self.lex_number()?,
                c if is_ident_start(c) => {
                    let len = self
                        .rest()
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .unwrap_or(self.rest().len());
                    let name = self.rest()[..len].to_string();
                    self.pos += len;
                    self.emit(TokenKind::Identifier(name), start);
                }
                '$' => return self.error(start, "variables are not supported"),
                other => {
                    return self.error(start, format!("unexpected {other:?} in action"));
                }
            }
        }
    }

    fn lex_comment(&mut self, delim_pos: usize) -> Result<bool, TemplateError> {
        let Some(end) = self.rest().find(RIGHT_COMMENT) else {
            return self.error(delim_pos, "unclosed comment");
        };
        self.pos += end + RIGHT_COMMENT.len();

        let after = self.rest();
        let trimmed = after.trim_start_matches(is_space);
        if trimmed.len() < after.len() && trimmed.starts_with("-}}") {
            self.pos = self.src.len() - trimmed.len() + 3;
            return Ok(true);
        }
        if trimmed.starts_with(RIGHT_DELIM) {
            self.pos = self.src.len() - trimmed.len() + RIGHT_DELIM.len();
            return Ok(false);
        }
        self.error(delim_pos, "comment ends before closing delimiter")
    }

    fn lex_field(&mut self) {
        let start = self.pos;
        let mut segments = Vec::new();
        while self.peek() == Some('.') && self.peek_second().is_some_and(is_ident_start) {
            self.pos += 1;
            let len = self
                .rest()
                .find(|c: char| !is_field_char(c))
                .unwrap_or(self.rest().len());
            segments.push(self.rest()[..len].to_string());
            self.pos += len;
        }
        self.emit(TokenKind::Field(segments), start);
    }

    fn lex_number(&mut self) -> Result<(), TemplateError> {
        let start = self.pos;
        let mut prev = '\0';
        let len = self
            .rest()
            .char_indices()
            .find(|&(i, c)| {
                let in_number = c.is_ascii_alphanumeric()
                    || c == '.'
                    || ((c == '+' || c == '-') && (i == 0 || matches!(prev, 'e' | 'E')));
                prev = c;
                !in_number
            })
            .map(|(i, _)| i)
            .unwrap_or(self.rest().len());

        let text = &self.rest()[..len];
        self.pos += len;

        if !get_number_regex().is_match(text) {
            return self.error(start, format!("bad number syntax: {text:?}"));
        }

        let number = match text.parse::<i64>() {
            Ok(int) => Number::from(int),
            Err(_) => match text.parse::<f64>().ok().and_then(Number::from_f64) {
                Some(float) => float,
                None => return self.error(start, format!("bad number syntax: {text:?}")),
            },
        };
        self.emit(TokenKind::Number(number), start);
        Ok(())
    }

    fn lex_quote(&mut self) -> Result<(), TemplateError> {
        let start = self.pos;
        let mut value = String::new();
        let mut chars = self.rest().char_indices().skip(1);

        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    self.emit(TokenKind::String(value), start);
                    return Ok(());
                }
                '\\' => {
                    let escaped = match chars.next() {
                        Some((_, 'n')) => '\n',
                        Some((_, 't')) => '\t',
                        Some((_, 'r')) => '\r',
                        Some((_, '\\')) => '\\',
                        Some((_, '"')) => '"',
                        Some((_, '\'')) => '\'',
                        Some((_, other)) => {
                            return self.error(start, format!("unknown escape sequence \\{other}"))
                        }
                        None => break,
                    };
                    value.push(escaped);
                }
                '\n' => break,
                c => value.push(c),
            }
        }
        self.error(start, "unterminated quoted string")
    }

    fn lex_raw_quote(&mut self) -> Result<(), TemplateError> {
        let start = self.pos;
        let Some(len) = self.rest()[1..].find('`') else {
            return self.error(start, "unterminated raw quoted string");
        };
        let value = self.rest()[1..1 + len].to_string();
        self.pos += len + 2;
        self.emit(TokenKind::String(value), start);
        Ok(())
    }
}
