//! Parser producing the template syntax tree from lexer tokens.

use super::funcs::Func;
use super::lexer::{Token, TokenKind};
use super::TemplateError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
    If {
        branches: Vec<(Pipeline, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
}

/// Commands separated by `|`. Each command after the first is a function
/// call that receives the previous result as its last argument.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Call { func: Func, args: Vec<Operand> },
    Operand(Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Dot,
    Field(Vec<String>),
    Literal(Value),
    Pipeline(Box<Pipeline>),
}

enum ListEnd {
    Eof,
    End,
    Else,
    ElseIf(Pipeline),
}

/// Deepest allowed nesting of `{{if}}` blocks and parenthesised pipelines.
const MAX_DEPTH: usize = 100;

#[derive(Clone, Copy, PartialEq)]
enum Closing {
    Delim,
    Paren,
}

pub(crate) fn parse(tokens: Vec<Token>, source_len: usize) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        source_len,
        depth: 0,
    };
    let (nodes, end) = parser.parse_list()?;
    match end {
        ListEnd::Eof => Ok(nodes),
        ListEnd::End => parser.error_at_previous("unexpected {{end}}"),
        ListEnd::Else | ListEnd::ElseIf(_) => parser.error_at_previous("unexpected {{else}}"),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source_len: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn current_pos(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.pos)
            .unwrap_or(self.source_len)
    }

    fn error<T>(&self, pos: usize, message: impl Into<String>) -> Result<T, TemplateError> {
        Err(TemplateError::Parse {
            pos,
            message: message.into(),
        })
    }

    fn error_at_previous<T>(&self, message: &str) -> Result<T, TemplateError> {
        let pos = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.pos)
            .unwrap_or(self.source_len);
        self.error(pos, message)
    }

    fn descend(&mut self, pos: usize) -> Result<(), TemplateError> {
        if self.depth >= MAX_DEPTH {
            return self.error(pos, format!("exceeded max nesting depth of {MAX_DEPTH}"));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Identifier(name)) if name == keyword)
    }

    fn expect_right_delim(&mut self, context: &str) -> Result<(), TemplateError> {
        let pos = self.current_pos();
        match self.next().map(|t| t.kind) {
            Some(TokenKind::RightDelim) => Ok(()),
            _ => self.error(pos, format!("unexpected token in {context}")),
        }
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, ListEnd), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Text(text) => nodes.push(Node::Text(text)),
                TokenKind::LeftDelim => {
                    if self.peek_keyword("if") {
                        self.pos += 1;
                        self.descend(token.pos)?;
                        let node = self.parse_if(token.pos)?;
                        self.depth -= 1;
                        nodes.push(node);
                    } else if self.peek_keyword("end") {
                        self.pos += 1;
                        self.expect_right_delim("{{end}}")?;
                        return Ok((nodes, ListEnd::End));
                    } else if self.peek_keyword("else") {
                        self.pos += 1;
                        if self.peek_keyword("if") {
                            self.pos += 1;
                            let condition = self.parse_pipeline(Closing::Delim)?;
                            return Ok((nodes, ListEnd::ElseIf(condition)));
                        }
                        self.expect_right_delim("{{else}}")?;
                        return Ok((nodes, ListEnd::Else));
                    } else {
                        nodes.push(Node::Action(self.parse_pipeline(Closing::Delim)?));
                    }
                }
                _ => return self.error(token.pos, "unexpected token outside action"),
            }
        }

        Ok((nodes, ListEnd::Eof))
    }

    fn parse_if(&mut self, start: usize) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut condition = self.parse_pipeline(Closing::Delim)?;

        loop {
            let (body, end) = self.parse_list()?;
            branches.push((condition, body));
            match end {
                ListEnd::End => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    })
                }
                ListEnd::ElseIf(next) => condition = next,
                ListEnd::Else => {
                    let (otherwise, end) = self.parse_list()?;
                    return match end {
                        ListEnd::End => Ok(Node::If {
                            branches,
                            otherwise,
                        }),
                        ListEnd::Eof => self.error(start, "unexpected EOF: {{if}} without {{end}}"),
                        ListEnd::Else | ListEnd::ElseIf(_) => {
                            self.error_at_previous("expected {{end}} after {{else}}")
                        }
                    };
                }
                ListEnd::Eof => return self.error(start, "unexpected EOF: {{if}} without {{end}}"),
            }
        }
    }

    fn parse_pipeline(&mut self, closing: Closing) -> Result<Pipeline, TemplateError> {
        let mut commands = Vec::new();

        loop {
            let command_pos = self.current_pos();
            let command = self.parse_command()?;
            if !commands.is_empty() && !matches!(command, Command::Call { .. }) {
                return self.error(command_pos, "non-function in pipeline");
            }
            commands.push(command);

            let pos = self.current_pos();
            match (self.next().map(|t| t.kind), closing) {
                (Some(TokenKind::Pipe), _) => continue,
                (Some(TokenKind::RightDelim), Closing::Delim) => break,
                (Some(TokenKind::RightParen), Closing::Paren) => break,
                (Some(TokenKind::RightDelim), Closing::Paren) => {
                    return self.error(pos, "unclosed left paren")
                }
                (Some(TokenKind::RightParen), Closing::Delim) => {
                    return self.error(pos, "unexpected right paren")
                }
                (None, _) => return self.error(pos, "unclosed action"),
                _ => return self.error(pos, "unexpected token in pipeline"),
            }
        }

        Ok(Pipeline { commands })
    }

    fn at_command_end(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(TokenKind::Pipe | TokenKind::RightDelim | TokenKind::RightParen)
        )
    }

    fn parse_command(&mut self) -> Result<Command, TemplateError> {
        let pos = self.current_pos();
        if self.at_command_end() {
            return self.error(pos, "missing value for command");
        }

        if let Some(TokenKind::Identifier(name)) = self.peek() {
            if let Some(func) = Func::from_name(name) {
                self.pos += 1;
                let mut args = Vec::new();
                while !self.at_command_end() {
                    args.push(self.parse_operand()?);
                }
                return Ok(Command::Call { func, args });
            }
        }

        let operand = self.parse_operand()?;
        if !self.at_command_end() {
            return self.error(pos, "can't give argument to non-function");
        }
        Ok(Command::Operand(operand))
    }

    fn parse_operand(&mut self) -> Result<Operand, TemplateError> {
        let pos = self.current_pos();
        let Some(token) = self.next() else {
            return self.error(pos, "unclosed action");
        };

        match token.kind {
            TokenKind::Dot => Ok(Operand::Dot),
            TokenKind::Field(path) => Ok(Operand::Field(path)),
            TokenKind::String(s) => Ok(Operand::Literal(Value::String(s))),
            TokenKind::Number(n) => Ok(Operand::Literal(Value::Number(n))),
            TokenKind::LeftParen => {
                self.descend(token.pos)?;
                let pipeline = self.parse_pipeline(Closing::Paren)?;
                self.depth -= 1;
                Ok(Operand::Pipeline(Box::new(pipeline)))
            }
            TokenKind::Identifier(name) => match name.as_str() {
                "true" => Ok(Operand::Literal(Value::Bool(true))),
                "false" => Ok(Operand::Literal(Value::Bool(false))),
                "nil" => Ok(Operand::Literal(Value::Null)),
                "if" | "else" | "end" => self.error(token.pos, format!("unexpected {{{{{name}}}}}")),
                _ if Func::from_name(&name).is_some() => self.error(
                    token.pos,
                    format!("function {name:?} must be called in parentheses when used as an argument"),
                ),
                _ => self.error(token.pos, format!("function {name:?} not defined")),
            },
            _ => self.error(token.pos, "unexpected token in operand"),
        }
    }
}
