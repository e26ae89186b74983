//! Calculator tool: arithmetic only, no general expression evaluation.

use dispatch::{Tool, ToolDescriptor, ToolError};

pub const NAME: &str = "calculator";

/// Deepest nesting of parentheses, signs and exponents the parser accepts.
const MAX_DEPTH: usize = 64;

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        NAME,
        "Evaluates arithmetic expressions with + - * / % ^ and parentheses.",
        Calculator,
    )
    .with_tags(["calculate", "math", "compute"])
    .with_examples(["calculate 2 + 2", "compute (3 + 4) * 5", "math 2^10"])
}

#[derive(Debug, Clone, Copy)]
pub struct Calculator;

impl Tool for Calculator {
    fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let expr = extract_expression(input)
            .ok_or_else(|| ToolError::InvalidInput(format!("no expression in {input:?}")))?;
        let value = evaluate(expr)?;
        Ok(format!("{expr} = {}", format_number(value)))
    }
}

/// Drop leading words and trailing punctuation, so "what is 2+2?" yields "2+2".
fn extract_expression(input: &str) -> Option<&str> {
    let start = input.find(|c: char| c.is_ascii_digit() || matches!(c, '.' | '(' | '-' | '+'))?;
    let expr = input[start..].trim_end_matches(['?', '!', '=', ' ', '\t', '\n']);
    let expr = expr.strip_suffix('.').unwrap_or(expr).trim_end();
    (!expr.is_empty()).then_some(expr)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        // Also folds -0 into 0.
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn lex(input: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        let token = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' || c == '_' {
                        if c != '_' {
                            literal.push(c);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| ToolError::InvalidInput(format!("bad number {literal:?}")))?;
                tokens.push(Token::Number(n));
                continue;
            }
            '+' => Token::Plus,
            '-' | '−' => Token::Minus,
            '*' | '×' | 'x' => Token::Star,
            '/' | '÷' => Token::Slash,
            '%' => Token::Percent,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(ToolError::InvalidInput(format!(
                    "unexpected character {other:?}"
                )));
            }
        };
        tokens.push(token);
        chars.next();
    }

    Ok(tokens)
}

/// Evaluate an arithmetic expression.
///
/// Grammar, loosest binding first:
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/' | '%') unary)*
/// unary   := ('-' | '+') unary | power
/// power   := primary ('^' unary)?
/// primary := number | '(' expr ')'
/// ```
pub fn evaluate(input: &str) -> Result<f64, ToolError> {
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Err(ToolError::InvalidInput("empty expression".into()));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(ToolError::InvalidInput(
            "unexpected tokens after expression".into(),
        ));
    }
    if !value.is_finite() {
        return Err(ToolError::Execution("result is not a finite number".into()));
    }
    Ok(value)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    /// Run one level of recursion, failing once [`MAX_DEPTH`] is reached.
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<f64, ToolError>,
    ) -> Result<f64, ToolError> {
        if self.depth >= MAX_DEPTH {
            return Err(ToolError::InvalidInput("expression nested too deeply".into()));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut left = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    left += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    left -= self.term()?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut left = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    left *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let right = self.unary()?;
                    if right == 0.0 {
                        return Err(ToolError::Execution("division by zero".into()));
                    }
                    left /= right;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    let right = self.unary()?;
                    if right == 0.0 {
                        return Err(ToolError::Execution("modulo by zero".into()));
                    }
                    left %= right;
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Caret) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, ToolError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.nested(Self::expr)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(ToolError::InvalidInput("missing closing parenthesis".into())),
                }
            }
            Some(other) => Err(ToolError::InvalidInput(format!(
                "unexpected {other:?}"
            ))),
            None => Err(ToolError::InvalidInput("unexpected end of expression".into())),
        }
    }
}
