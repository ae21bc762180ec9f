//! Source-literal evaluation for environment overrides
//!
//! Accepts the literal syntax of Python-style config values that strict JSON
//! rejects: `True`/`False`/`None`, single-quoted strings, tuples, sets,
//! trailing commas, hex/octal/binary integers and digit separators.
//!
//! Tuples and sets become JSON arrays; dict keys that are not strings are
//! rendered the way a JSON encoder would (`1` → `"1"`, `True` → `"true"`).

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Input is not a supported literal
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed literal at offset {offset}: {message}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Evaluate `input` as a single literal expression.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(input.trim_start_matches([' ', '\t']));
    let value = parser.expression()?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected trailing input {c:?}")));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expression(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some(sign @ ('-' | '+')) => {
                self.pos += 1;
                self.skip_whitespace();
                match self.peek() {
                    Some(c) if c.is_ascii_digit() || c == '.' => self.number(sign == '-'),
                    _ => Err(self.error("sign must be followed by a number")),
                }
            }
            Some('[') => {
                self.pos += 1;
                Ok(Value::Array(self.sequence(']')?.0))
            }
            Some('(') => self.tuple(),
            Some('{') => self.dict_or_set(),
            Some('\'' | '"') => self.strings(),
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(false),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            Some(c) => Err(self.error(format!("unexpected character {c:?}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Parse comma-separated expressions up to `close`. Returns the items and
    /// whether a separating comma was seen.
    fn sequence(&mut self, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_whitespace();
            if self.eat(close) {
                return Ok((items, saw_comma));
            }
            items.push(self.expression()?);
            self.skip_whitespace();
            if self.eat(',') {
                saw_comma = true;
                continue;
            }
            if self.eat(close) {
                return Ok((items, saw_comma));
            }
            return Err(self.error(format!("expected ',' or {close:?}")));
        }
    }

    fn tuple(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        let (mut items, saw_comma) = self.sequence(')')?;
        // `(x)` is a parenthesised value, `(x,)` a one-element tuple
        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn dict_or_set(&mut self) -> Result<Value, LiteralError> {
        self.pos += 1;
        self.skip_whitespace();
        if self.eat('}') {
            return Ok(Value::Object(Map::new()));
        }

        let first = self.expression()?;
        self.skip_whitespace();
        if !self.eat(':') {
            // set literal
            let mut items = vec![first];
            self.skip_whitespace();
            if self.eat(',') {
                items.extend(self.sequence('}')?.0);
            } else if !self.eat('}') {
                return Err(self.error("expected ',' or '}'"));
            }
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            return Ok(Value::Array(unique));
        }

        let mut map = Map::new();
        let mut key = first;
        loop {
            let value = self.expression()?;
            map.insert(self.dict_key(key)?, value);
            self.skip_whitespace();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' or '}'"));
            }
            self.skip_whitespace();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            key = self.expression()?;
            self.skip_whitespace();
            if !self.eat(':') {
                return Err(self.error("expected ':' in dict literal"));
            }
        }
    }

    fn dict_key(&self, key: Value) -> Result<String, LiteralError> {
        match key {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok("null".to_string()),
            Value::Array(_) | Value::Object(_) => Err(self.error("unhashable dict key")),
        }
    }

    fn name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let ident: String = self.chars[start..self.pos].iter().collect();

        if matches!(self.peek(), Some('\'' | '"')) {
            return match ident.to_ascii_lowercase().as_str() {
                "r" | "u" => {
                    self.pos = start;
                    self.strings()
                }
                _ => Err(self.error(format!("unsupported string prefix {ident:?}"))),
            };
        }

        match ident.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            _ => Err(LiteralError {
                offset: start,
                message: format!("malformed node or name {ident:?}"),
            }),
        }
    }

    /// Adjacent string literals concatenate: `'a' "b"` is `"ab"`.
    fn strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_whitespace();
            let quoted = match self.peek() {
                Some('\'' | '"') => true,
                Some('r' | 'R' | 'u' | 'U') => matches!(self.peek_at(1), Some('\'' | '"')),
                _ => false,
            };
            if !quoted {
                self.pos = save;
                return Ok(Value::String(out));
            }
            out.push_str(&self.string()?);
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        match self.peek() {
            Some('r' | 'R') => {
                raw = true;
                self.pos += 1;
            }
            Some('u' | 'U') => self.pos += 1,
            _ => {}
        }

        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected string")),
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            if c == quote {
                if !triple {
                    return Ok(out);
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.pos += 2;
                    return Ok(out);
                }
                out.push(c);
                continue;
            }
            if c == '\n' && !triple {
                return Err(self.error("newline in single-quoted string"));
            }
            if c == '\\' {
                if raw {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                    continue;
                }
                self.escape(&mut out)?;
                continue;
            }
            out.push(c);
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
        match c {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).ok_or_else(|| self.error("invalid octal escape"))?);
            }
            other => {
                // unknown escapes are kept verbatim
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, LiteralError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let d = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("truncated hex escape"))?;
            code = code * 16 + d;
        }
        char::from_u32(code).ok_or_else(|| self.error("escape is not a valid code point"))
    }

    fn number(&mut self, negative: bool) -> Result<Value, LiteralError> {
        let start = self.pos;
        let radix = match (self.peek(), self.peek_at(1)) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('o' | 'O')) => 8,
            (Some('0'), Some('b' | 'B')) => 2,
            _ => 10,
        };

        if radix != 10 {
            self.pos += 2;
            let digits = self.digits(|c| c.is_digit(radix))?;
            let magnitude = i64::from_str_radix(&digits, radix)
                .map_err(|e| self.error(format!("invalid integer: {e}")))?;
            return self.finish_integer(if negative { -magnitude } else { magnitude });
        }

        let mut text = String::new();
        if negative {
            text.push('-');
        }
        let int_part = if self.peek() == Some('.') {
            String::new()
        } else {
            self.digits(|c| c.is_ascii_digit())?
        };
        text.push_str(&int_part);

        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            text.push('.');
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                text.push_str(&self.digits(|c| c.is_ascii_digit())?);
            } else if int_part.is_empty() {
                return Err(self.error("expected digits"));
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.pos += 1;
            text.push('e');
            if let Some(sign @ ('+' | '-')) = self.peek() {
                self.pos += 1;
                text.push(sign);
            }
            text.push_str(&self.digits(|c| c.is_ascii_digit())?);
        }
        if matches!(self.peek(), Some('j' | 'J')) {
            return Err(self.error("complex numbers are not supported"));
        }

        if is_float {
            let parsed: f64 = text
                .parse()
                .map_err(|e| self.error(format!("invalid float: {e}")))?;
            return Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| LiteralError {
                    offset: start,
                    message: "float is not finite".to_string(),
                });
        }

        if int_part.len() > 1 && int_part.starts_with('0') && int_part.chars().any(|c| c != '0') {
            return Err(LiteralError {
                offset: start,
                message: "leading zeros in decimal integer literals are not permitted".to_string(),
            });
        }
        let value: i64 = text
            .parse()
            .map_err(|e| self.error(format!("invalid integer: {e}")))?;
        self.finish_integer(value)
    }

    fn finish_integer(&self, value: i64) -> Result<Value, LiteralError> {
        if matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            return Err(self.error("invalid character in number"));
        }
        Ok(Value::from(value))
    }

    /// Consume digits with optional single `_` separators between them.
    fn digits(&mut self, is_digit: impl Fn(char) -> bool) -> Result<String, LiteralError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(c) if is_digit(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                Some('_') if !out.is_empty() && self.peek_at(1).is_some_and(&is_digit) => {
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if out.is_empty() {
            return Err(self.error("expected digits"));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keywords() {
        assert_eq!(parse_literal("True"), Ok(json!(true)));
        assert_eq!(parse_literal("False"), Ok(json!(false)));
        assert_eq!(parse_literal("None"), Ok(Value::Null));
        assert!(parse_literal("true").is_err());
        assert!(parse_literal("null").is_err());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_literal("42"), Ok(json!(42)));
        assert_eq!(parse_literal("-7"), Ok(json!(-7)));
        assert_eq!(parse_literal("+3"), Ok(json!(3)));
        assert_eq!(parse_literal("1_000"), Ok(json!(1000)));
        assert_eq!(parse_literal("0x1F"), Ok(json!(31)));
        assert_eq!(parse_literal("0o17"), Ok(json!(15)));
        assert_eq!(parse_literal("0b101"), Ok(json!(5)));
        assert_eq!(parse_literal("1.5"), Ok(json!(1.5)));
        assert_eq!(parse_literal(".5"), Ok(json!(0.5)));
        assert_eq!(parse_literal("2."), Ok(json!(2.0)));
        assert_eq!(parse_literal("1e3"), Ok(json!(1000.0)));
        assert!(parse_literal("007").is_err());
        assert!(parse_literal("1__0").is_err());
        assert!(parse_literal("2abc").is_err());
        assert!(parse_literal("--1").is_err());
        assert!(parse_literal("1j").is_err());
    }

    #[test]
    fn test_strings() {
        assert_eq!(parse_literal("'single'"), Ok(json!("single")));
        assert_eq!(parse_literal("\"double\""), Ok(json!("double")));
        assert_eq!(parse_literal(r"'a\nb'"), Ok(json!("a\nb")));
        assert_eq!(parse_literal(r"r'a\nb'"), Ok(json!("a\\nb")));
        assert_eq!(parse_literal(r"'\x41é'"), Ok(json!("Aé")));
        assert_eq!(parse_literal("'a' 'b'"), Ok(json!("ab")));
        assert_eq!(parse_literal("'''tri'ple'''"), Ok(json!("tri'ple")));
        assert!(parse_literal("'open").is_err());
        assert!(parse_literal("b'bytes'").is_err());
    }

    #[test]
    fn test_containers() {
        assert_eq!(parse_literal("[1, 'two', None]"), Ok(json!([1, "two", null])));
        assert_eq!(parse_literal("(1, 2)"), Ok(json!([1, 2])));
        assert_eq!(parse_literal("(1,)"), Ok(json!([1])));
        assert_eq!(parse_literal("(1)"), Ok(json!(1)));
        assert_eq!(parse_literal("()"), Ok(json!([])));
        assert_eq!(parse_literal("[1, 2,]"), Ok(json!([1, 2])));
        assert_eq!(parse_literal("{}"), Ok(json!({})));
        assert_eq!(
            parse_literal("{'a': [1, (2, 3)], 1: True, None: 'x',}"),
            Ok(json!({"a": [1, [2, 3]], "1": true, "null": "x"}))
        );
        assert_eq!(parse_literal("{1, 2, 2}"), Ok(json!([1, 2])));
        assert!(parse_literal("{[1]: 2}").is_err());
        assert!(parse_literal("[1 2]").is_err());
    }

    #[test]
    fn test_whitespace_and_names() {
        assert_eq!(parse_literal("  \t[ 1 ,\n 2 ]  \n"), Ok(json!([1, 2])));
        assert!(parse_literal("hello").is_err());
        assert!(parse_literal("").is_err());
        assert!(parse_literal("1 2").is_err());
    }
}
