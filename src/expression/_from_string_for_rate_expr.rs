use crate::expression::RateExpr::*;
use crate::expression::RateOp::*;
use crate::expression::{RateExpr, RateOp};
use crate::MabossError;
use std::convert::TryFrom;
use std::iter::Peekable;
use std::str::Chars;

impl TryFrom<&str> for RateExpr {
    type Error = MabossError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let tokens = tokenize_group(&mut value.chars().peekable(), true)
            .map_err(|e| MabossError::InvalidExpression(format!("{e} (in `{value}`)")))?;
        parse_expression(&tokens)
            .map(|it| *it)
            .map_err(|e| MabossError::InvalidExpression(format!("{e} (in `{value}`)")))
    }
}

/// **(internal)** An enum of possible tokens occurring in a string representation of
/// a `RateExpr`.
#[derive(Debug, PartialEq)]
enum Token {
    Not,                // '!', 'NOT'
    And,                // '&', '&&', 'AND'
    Or,                 // '|', '||', 'OR'
    Xor,                // '^', 'XOR'
    Plus,               // '+'
    Minus,              // '-'
    Times,              // '*'
    Divide,             // '/'
    Eq,                 // '=='
    Neq,                // '!='
    Lt,                 // '<'
    Gt,                 // '>'
    Le,                 // '<='
    Ge,                 // '>='
    Question,           // '?'
    Colon,              // ':'
    Number(f64),        // '1.5e3'
    Name(String),       // 'name'
    Param(String),      // '$name'
    Attribute(String),  // '@name'
    Tokens(Vec<Token>), // A block of tokens inside parentheses
}

impl Token {
    /// **(internal)** True if this token can be the last token of an operand.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::Name(_)
                | Token::Param(_)
                | Token::Attribute(_)
                | Token::Tokens(_)
        )
    }
}

/// **(internal)** Process a peekable iterator of characters into a vector of `Token`s.
///
/// The outer method always consumes the opening parenthesis and the recursive call consumes the
/// closing parenthesis. Use `top_level` to indicate that there will be no closing parenthesis.
fn tokenize_group(data: &mut Peekable<Chars>, top_level: bool) -> Result<Vec<Token>, String> {
    let mut output = Vec::new();
    while let Some(c) = data.next() {
        match c {
            c if c.is_whitespace() => { /* Skip whitespace */ }
            '^' => output.push(Token::Xor),
            '+' => output.push(Token::Plus),
            '-' => output.push(Token::Minus),
            '*' => output.push(Token::Times),
            '/' => output.push(Token::Divide),
            '?' => output.push(Token::Question),
            ':' => output.push(Token::Colon),
            '&' => {
                next_if_eq(data, '&');
                output.push(Token::And);
            }
            '|' => {
                next_if_eq(data, '|');
                output.push(Token::Or);
            }
            '!' => {
                if next_if_eq(data, '=') {
                    output.push(Token::Neq);
                } else {
                    output.push(Token::Not);
                }
            }
            '=' => {
                if next_if_eq(data, '=') {
                    output.push(Token::Eq);
                } else {
                    return Err("Expected '=' after '='.".to_string());
                }
            }
            '<' => {
                if next_if_eq(data, '=') {
                    output.push(Token::Le);
                } else {
                    output.push(Token::Lt);
                }
            }
            '>' => {
                if next_if_eq(data, '=') {
                    output.push(Token::Ge);
                } else {
                    output.push(Token::Gt);
                }
            }
            ')' => {
                return if !top_level {
                    Ok(output)
                } else {
                    Err("Unexpected ')'.".to_string())
                };
            }
            '(' => {
                // start a nested token group
                let tokens = tokenize_group(data, false)?;
                output.push(Token::Tokens(tokens));
            }
            '$' | '@' => {
                let name = read_name(data, None);
                if name.is_empty() {
                    return Err(format!("Expected name after '{c}'."));
                }
                if c == '$' {
                    output.push(Token::Param(name));
                } else {
                    output.push(Token::Attribute(name));
                }
            }
            c if c.is_ascii_digit() || c == '.' => {
                output.push(Token::Number(read_number(data, c)?));
            }
            c if is_valid_name_start(c) => {
                let name = read_name(data, Some(c));
                output.push(match name.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "XOR" => Token::Xor,
                    "NOT" => Token::Not,
                    _ => Token::Name(name),
                });
            }
            _ => return Err(format!("Unexpected '{c}'.")),
        }
    }
    if top_level {
        Ok(output)
    } else {
        Err("Expected ')'.".to_string())
    }
}

/// **(internal)** Advance the iterator if the next char is `expected`.
fn next_if_eq(data: &mut Peekable<Chars>, expected: char) -> bool {
    if data.peek() == Some(&expected) {
        data.next();
        true
    } else {
        false
    }
}

/// **(internal)** Check if given char can start a name.
fn is_valid_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// **(internal)** Check if given char can appear in a name.
fn is_valid_in_name(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// **(internal)** Read the remainder of a name, optionally starting with `first`.
fn read_name(data: &mut Peekable<Chars>, first: Option<char>) -> String {
    let mut name: Vec<char> = first.into_iter().collect();
    while let Some(c) = data.peek() {
        if !is_valid_in_name(*c) {
            break;
        }
        name.push(*c);
        data.next();
    }
    name.into_iter().collect()
}

/// **(internal)** Read a numeric literal (with an optional exponent) starting with `first`.
fn read_number(data: &mut Peekable<Chars>, first: char) -> Result<f64, String> {
    let mut literal = vec![first];
    while let Some(c) = data.peek() {
        if c.is_ascii_digit() || *c == '.' {
            literal.push(*c);
            data.next();
        } else {
            break;
        }
    }
    if let Some(e) = data.peek().copied() {
        if e == 'e' || e == 'E' {
            literal.push(e);
            data.next();
            if let Some(sign) = data.peek().copied() {
                if sign == '+' || sign == '-' {
                    literal.push(sign);
                    data.next();
                }
            }
            while let Some(c) = data.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                literal.push(*c);
                data.next();
            }
        }
    }
    let literal: String = literal.into_iter().collect();
    let value = literal
        .parse::<f64>()
        .map_err(|_| format!("Invalid number `{literal}`."))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("Number `{literal}` is out of range."))
    }
}

/// **(internal)** Parse a `RateExpr` using the recursive steps.
fn parse_expression(data: &[Token]) -> Result<Box<RateExpr>, String> {
    ternary(data)
}

/// **(internal)** Recursive parsing step 1: extract `? :` operators.
///
/// The ternary operator is right associative, so the first `?` is the top-level condition
/// and its `:` is the first one which is not claimed by a nested `?`.
fn ternary(data: &[Token]) -> Result<Box<RateExpr>, String> {
    let Some(question) = data.iter().position(|t| *t == Token::Question) else {
        return or(data);
    };
    let mut depth = 0usize;
    let mut colon = None;
    for (i, token) in data.iter().enumerate().skip(question + 1) {
        match token {
            Token::Question => depth += 1,
            Token::Colon if depth == 0 => {
                colon = Some(i);
                break;
            }
            Token::Colon => depth -= 1,
            _ => {}
        }
    }
    let Some(colon) = colon else {
        return Err("Expected ':' after '?'.".to_string());
    };
    Ok(Box::new(Ternary(
        or(&data[..question])?,
        ternary(&data[(question + 1)..colon])?,
        ternary(&data[(colon + 1)..])?,
    )))
}

/// **(internal)** Recursive parsing step 2: extract `|` operators.
fn or(data: &[Token]) -> Result<Box<RateExpr>, String> {
    binary_level(data, &[(Token::Or, Or)], or, xor)
}

/// **(internal)** Recursive parsing step 3: extract `^` operators.
fn xor(data: &[Token]) -> Result<Box<RateExpr>, String> {
    binary_level(data, &[(Token::Xor, Xor)], xor, and)
}

/// **(internal)** Recursive parsing step 4: extract `&` operators.
fn and(data: &[Token]) -> Result<Box<RateExpr>, String> {
    binary_level(data, &[(Token::And, And)], and, equality)
}

/// **(internal)** Recursive parsing step 5: extract `==` and `!=` operators.
fn equality(data: &[Token]) -> Result<Box<RateExpr>, String> {
    binary_level(
        data,
        &[(Token::Eq, Eq), (Token::Neq, Neq)],
        equality,
        comparison,
    )
}

/// **(internal)** Recursive parsing step 6: extract `<`, `>`, `<=` and `>=` operators.
fn comparison(data: &[Token]) -> Result<Box<RateExpr>, String> {
    binary_level(
        data,
        &[(Token::Lt, Lt), (Token::Gt, Gt), (Token::Le, Le), (Token::Ge, Ge)],
        comparison,
        additive,
    )
}

/// **(internal)** Recursive parsing step 7: extract `+` and `-` operators.
fn additive(data: &[Token]) -> Result<Box<RateExpr>, String> {
    binary_level(
        data,
        &[(Token::Plus, Add), (Token::Minus, Sub)],
        additive,
        multiplicative,
    )
}

/// **(internal)** Recursive parsing step 8: extract `*` and `/` operators.
fn multiplicative(data: &[Token]) -> Result<Box<RateExpr>, String> {
    binary_level(
        data,
        &[(Token::Times, Mul), (Token::Divide, Div)],
        multiplicative,
        terminal,
    )
}

/// **(internal)** Split `data` on the *last* binary occurrence of one of the `operators`,
/// making the operators of one level left associative.
///
/// An operator token only counts as binary when it follows a complete operand, which
/// distinguishes `a - b` from `a * -b`.
fn binary_level(
    data: &[Token],
    operators: &[(Token, RateOp)],
    this_level: fn(&[Token]) -> Result<Box<RateExpr>, String>,
    next_level: fn(&[Token]) -> Result<Box<RateExpr>, String>,
) -> Result<Box<RateExpr>, String> {
    let split = data.iter().enumerate().rev().find_map(|(i, token)| {
        if i == 0 || !data[i - 1].ends_operand() {
            return None;
        }
        operators
            .iter()
            .find(|(op_token, _)| op_token == token)
            .map(|(_, op)| (i, *op))
    });
    if let Some((i, op)) = split {
        Ok(Box::new(Binary(
            op,
            this_level(&data[..i])?,
            next_level(&data[(i + 1)..])?,
        )))
    } else {
        next_level(data)
    }
}

/// **(internal)** Recursive parsing step 9: extract terminals, negations and unary minus.
fn terminal(data: &[Token]) -> Result<Box<RateExpr>, String> {
    if data.is_empty() {
        return Err("Expected expression, found nothing.".to_string());
    }
    if data[0] == Token::Not {
        return Ok(Box::new(Not(terminal(&data[1..])?)));
    }
    if data[0] == Token::Minus {
        return Ok(Box::new(Neg(terminal(&data[1..])?)));
    }
    if data.len() == 1 {
        match &data[0] {
            Token::Number(value) => return Ok(Box::new(Const(*value))),
            Token::Name(name) => {
                return Ok(Box::new(match name.as_str() {
                    "True" | "TRUE" | "true" => Bool(true),
                    "False" | "FALSE" | "false" => Bool(false),
                    _ => Node(name.clone()),
                }));
            }
            Token::Param(name) => return Ok(Box::new(Param(name.clone()))),
            Token::Attribute(name) => return Ok(Box::new(Attribute(name.clone()))),
            Token::Tokens(inner) => return parse_expression(inner),
            _ => {} // otherwise, fall through to the error at the end.
        }
    }
    Err(format!("Unexpected: {data:?}. Expecting expression."))
}
