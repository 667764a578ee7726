//! `calculate{expression}` — a hand-rolled recursive-descent evaluator
//! (spec.md §4.2, P9; ground truth: `internal/tools/calculator/calculate.go`,
//! which walks a `go/ast` tree produced by `go/parser.ParseExpr`).
//!
//! Go's binary-operator precedence puts `^` (there, the XOR token reused as
//! `math.Pow`) at the *same* precedence level as `+`/`-`, not above
//! multiplication — so `2+3^2` evaluates as `(2+3)^2 = 25`, not `2+9`. This
//! evaluator reproduces that quirk rather than giving `^` the higher-binding
//! precedence a hand-written calculator would normally choose.

use crate::error::ToolError;

const ALLOWED_FUNCTIONS: &[&str] = &[
    "sqrt", "abs", "ceil", "floor", "round", "log", "log2", "log10", "sin", "cos", "tan", "pow",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    End,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ToolError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value: f64 = text
                    .parse()
                    .map_err(|_| ToolError::Message(format!("invalid number: {text}")))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(text));
            }
            other => {
                return Err(ToolError::Message(format!("unsupported character: {other}")));
            }
        }
    }
    tokens.push(Token::End);
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    /// additive := multiplicative (('+' | '-' | '^') multiplicative)*
    fn parse_additive(&mut self) -> Result<f64, ToolError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            match self.peek() {
                Token::Plus => {
                    self.advance();
                    left += self.parse_multiplicative()?;
                }
                Token::Minus => {
                    self.advance();
                    left -= self.parse_multiplicative()?;
                }
                Token::Caret => {
                    self.advance();
                    let rhs = self.parse_multiplicative()?;
                    left = left.powf(rhs);
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// multiplicative := unary (('*' | '/' | '%') unary)*
    fn parse_multiplicative(&mut self) -> Result<f64, ToolError> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek() {
                Token::Star => {
                    self.advance();
                    left *= self.parse_unary()?;
                }
                Token::Slash => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    if rhs == 0.0 {
                        return Err(ToolError::Message("division by zero".into()));
                    }
                    left /= rhs;
                }
                Token::Percent => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    if rhs == 0.0 {
                        return Err(ToolError::Message("modulo by zero".into()));
                    }
                    left %= rhs;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// unary := ('+' | '-') unary | primary
    fn parse_unary(&mut self) -> Result<f64, ToolError> {
        match self.peek() {
            Token::Plus => {
                self.advance();
                self.parse_unary()
            }
            Token::Minus => {
                self.advance();
                Ok(-self.parse_unary()?)
            }
            _ => self.parse_primary(),
        }
    }

    /// primary := number | ident '(' args ')' | '(' additive ')'
    fn parse_primary(&mut self) -> Result<f64, ToolError> {
        match self.advance() {
            Token::Number(v) => Ok(v),
            Token::LParen => {
                let v = self.parse_additive()?;
                match self.advance() {
                    Token::RParen => Ok(v),
                    other => Err(ToolError::Message(format!("expected ')', found {other:?}"))),
                }
            }
            Token::Ident(name) => self.parse_call(&name),
            other => Err(ToolError::Message(format!("unexpected token: {other:?}"))),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<f64, ToolError> {
        if !ALLOWED_FUNCTIONS.contains(&name) {
            return Err(ToolError::Message(format!("unknown function: {name}")));
        }
        if *self.peek() != Token::LParen {
            return Err(ToolError::Message(format!("{name} requires arguments")));
        }
        self.advance();

        let mut args = vec![self.parse_additive()?];
        while *self.peek() == Token::Comma {
            self.advance();
            args.push(self.parse_additive()?);
        }
        match self.advance() {
            Token::RParen => {}
            other => return Err(ToolError::Message(format!("expected ')', found {other:?}"))),
        }

        apply_function(name, &args)
    }
}

fn apply_function(name: &str, args: &[f64]) -> Result<f64, ToolError> {
    let arg = args[0];
    match name {
        "sqrt" => {
            if arg < 0.0 {
                Err(ToolError::Message("sqrt of negative number".into()))
            } else {
                Ok(arg.sqrt())
            }
        }
        "abs" => Ok(arg.abs()),
        "ceil" => Ok(arg.ceil()),
        "floor" => Ok(arg.floor()),
        "round" => Ok(arg.round()),
        "log" => {
            if arg <= 0.0 {
                Err(ToolError::Message("log of non-positive number".into()))
            } else {
                Ok(arg.ln())
            }
        }
        "log2" => {
            if arg <= 0.0 {
                Err(ToolError::Message("log2 of non-positive number".into()))
            } else {
                Ok(arg.log2())
            }
        }
        "log10" => {
            if arg <= 0.0 {
                Err(ToolError::Message("log10 of non-positive number".into()))
            } else {
                Ok(arg.log10())
            }
        }
        "sin" => Ok(arg.sin()),
        "cos" => Ok(arg.cos()),
        "tan" => Ok(arg.tan()),
        "pow" => {
            if args.len() < 2 {
                Err(ToolError::Message("pow requires 2 arguments".into()))
            } else {
                Ok(arg.powf(args[1]))
            }
        }
        other => Err(ToolError::Message(format!("unknown function: {other}"))),
    }
}

/// Evaluate `expression`, formatting an integral finite result without a
/// decimal point (spec.md §4.2: "integer-printing when result is integral
/// and finite").
pub fn calculate(expression: &str) -> Result<String, ToolError> {
    if expression.is_empty() {
        return Err(ToolError::Message("expression is required".into()));
    }
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let result = parser.parse_additive()?;
    if *parser.peek() != Token::End {
        return Err(ToolError::Message(format!(
            "unexpected trailing input: {:?}",
            parser.peek()
        )));
    }

    if result.is_finite() && result == result.trunc() {
        Ok(format!("{}", result as i64))
    } else {
        Ok(format!("{result}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(calculate("2 + 3 * 4").unwrap(), "14");
    }

    #[test]
    fn integer_result_has_no_decimal_point() {
        assert_eq!(calculate("10 / 2").unwrap(), "5");
    }

    #[test]
    fn fractional_result_keeps_decimal() {
        assert_eq!(calculate("1 / 4").unwrap(), "0.25");
    }

    #[test]
    fn caret_shares_additive_precedence_like_the_go_source() {
        // (2+3)^2 = 25, matching go/parser's actual operator precedence for
        // the XOR token reused as power — not the "usual" `2 + 9 = 11`.
        assert_eq!(calculate("2+3^2").unwrap(), "25");
    }

    #[test]
    fn function_call() {
        assert_eq!(calculate("sqrt(16)").unwrap(), "4");
    }

    #[test]
    fn pow_function_with_two_args() {
        assert_eq!(calculate("pow(2, 10)").unwrap(), "1024");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(calculate("1 / 0").is_err());
    }

    #[test]
    fn parentheses_change_grouping() {
        assert_eq!(calculate("(2 + 3) * 4").unwrap(), "20");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(calculate("-5 + 3").unwrap(), "-2");
    }

    #[test]
    fn p9_unknown_identifier_fails_before_any_side_effect() {
        assert!(calculate("rm_rf(1)").is_err());
        assert!(calculate("x + 1").is_err());
    }

    #[test]
    fn empty_expression_is_an_error() {
        assert!(calculate("").is_err());
    }
}
