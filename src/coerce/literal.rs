//! Permissive parser for Python literal syntax.
//!
//! Accepts the subset of Python expressions that dataframe exports write for nested cells:
//! single- or double-quoted (and triple-quoted) strings with Python escapes, `True`/`False`/`None`,
//! integers and floats (with `_` separators and a unary sign), lists, tuples, sets and dicts.
//! Tuples and sets become JSON arrays. Dict keys are converted to strings the way a JSON encoder
//! would (`16` -> `"16"`, `True` -> `"true"`, `None` -> `"null"`).

use std::fmt;

use serde_json::{Map, Number, Value};

const MAX_DEPTH: usize = 128;

/// Error returned when the input is not a valid literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    /// Byte offset at which parsing failed.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for LiteralError {}

/// Parse a complete Python literal into a JSON value.
///
/// Leading and trailing whitespace is ignored; anything else after the literal is an error.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser { src: input, pos: 0 };
    parser.skip_ws();
    let value = parser.parse_value(0)?;
    parser.skip_ws();
    if parser.pos != input.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else if c == '\\' && self.rest()[1..].starts_with('\n') {
                // explicit line continuation
                self.pos += 2;
            } else {
                break;
            }
        }
    }

    fn error(&self, message: &str) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, LiteralError> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => {
                self.pos += 1;
                self.parse_sequence(']', depth).map(Value::Array)
            }
            Some('(') => {
                self.pos += 1;
                self.parse_parenthesized(depth)
            }
            Some('{') => {
                self.pos += 1;
                self.parse_brace(depth)
            }
            Some('\'' | '"') => self.parse_strings(),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_word(),
            Some(c) => Err(self.error(&format!("unexpected character '{c}'"))),
        }
    }

    /// Comma-separated values up to `close`; trailing comma allowed.
    fn parse_sequence(&mut self, close: char, depth: usize) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_value(depth + 1)?);
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(',')?;
        }
    }

    /// `()` is an empty tuple, `(x)` is just `x`, `(x,)` / `(x, y)` are tuples.
    fn parse_parenthesized(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.skip_ws();
        if self.eat(')') {
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.parse_value(depth + 1)?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        items.extend(self.parse_sequence(')', depth)?);
        Ok(Value::Array(items))
    }

    /// Dict (`{k: v, ...}`) or set (`{a, b}`); `{}` is an empty dict.
    fn parse_brace(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.skip_ws();
        if self.eat('}') {
            return Ok(Value::Object(Map::new()));
        }
        let first = self.parse_value(depth + 1)?;
        self.skip_ws();
        if !self.eat(':') {
            // set literal
            let mut items = vec![first];
            if !self.eat('}') {
                self.expect(',')?;
                items.extend(self.parse_sequence('}', depth)?);
            }
            return Ok(Value::Array(items));
        }

        let mut map = Map::new();
        let mut key = first;
        loop {
            let key_offset = self.pos;
            self.skip_ws();
            let value = self.parse_value(depth + 1)?;
            let name = object_key(key).map_err(|message| LiteralError {
                offset: key_offset,
                message,
            })?;
            map.insert(name, value);

            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            self.expect(',')?;
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            key = self.parse_value(depth + 1)?;
            self.skip_ws();
            self.expect(':')?;
        }
    }

    fn parse_word(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let src = self.src;
        let word = &src[start..self.pos];
        match word {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            _ if matches!(self.peek(), Some('\'' | '"')) => {
                self.pos = start;
                self.parse_strings()
            }
            _ => Err(LiteralError {
                offset: start,
                message: format!("unknown name '{word}'"),
            }),
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn parse_strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = self.parse_string()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            match self.peek() {
                Some('\'' | '"') => out.push_str(&self.parse_string()?),
                Some(c) if c.is_alphabetic() && self.prefix_len().is_some() => {
                    out.push_str(&self.parse_string()?)
                }
                _ => {
                    self.pos = save;
                    return Ok(Value::String(out));
                }
            }
        }
    }

    /// Length of a string prefix (`u`, `r`, ...) directly followed by a quote.
    fn prefix_len(&self) -> Option<usize> {
        let rest = self.rest();
        let prefix_end = rest.find(['\'', '"'])?;
        let prefix = &rest[..prefix_end];
        matches!(prefix, "" | "u" | "U" | "r" | "R").then_some(prefix_end)
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let prefix_len = self
            .prefix_len()
            .ok_or_else(|| self.error("unsupported string prefix"))?;
        let raw = self.src[start..start + prefix_len].eq_ignore_ascii_case("r");
        self.pos += prefix_len;

        let quote = self.bump().ok_or_else(|| self.error("expected quote"))?;
        let triple = self.rest().starts_with(&format!("{quote}{quote}"));
        if triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(|| LiteralError {
                offset: start,
                message: "unterminated string".to_string(),
            })?;
            if c == quote {
                if !triple {
                    return Ok(out);
                }
                if self.rest().starts_with(&format!("{quote}{quote}")) {
                    self.pos += 2;
                    return Ok(out);
                }
                out.push(c);
            } else if c == '\n' && !triple {
                return Err(self.error("newline in single-quoted string"));
            } else if c == '\\' {
                if raw {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.parse_escape(&mut out)?;
                }
            } else {
                out.push(c);
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let escape_at = self.pos - 1;
        let c = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            'a' => out.push('\u{07}'),
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
                out.push(char_from_code(code, escape_at)?);
            }
            'x' => out.push(self.parse_hex_escape(2, escape_at)?),
            'u' => out.push(self.parse_hex_escape(4, escape_at)?),
            'U' => out.push(self.parse_hex_escape(8, escape_at)?),
            other => {
                // unknown escapes are kept verbatim
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn parse_hex_escape(&mut self, digits: usize, escape_at: usize) -> Result<char, LiteralError> {
        let hex = self
            .rest()
            .get(..digits)
            .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| LiteralError {
                offset: escape_at,
                message: format!("truncated \\x/\\u escape (expected {digits} hex digits)"),
            })?;
        let code = u32::from_str_radix(hex, 16).map_err(|e| LiteralError {
            offset: escape_at,
            message: e.to_string(),
        })?;
        self.pos += digits;
        char_from_code(code, escape_at)
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let mut negative = false;
        loop {
            if self.eat('-') {
                negative = !negative;
            } else if !self.eat('+') {
                break;
            }
            self.skip_ws();
        }

        let digits_start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.pos += 1;
                    }
                    continue;
                }
                'j' | 'J' => return Err(self.error("complex numbers are not supported")),
                _ if c.is_alphanumeric() => return Err(self.error("malformed number")),
                _ => break,
            }
            self.pos += 1;
        }

        let src = self.src;
        let text = &src[digits_start..self.pos];
        if text.is_empty() || text.starts_with('_') || text.ends_with('_') || text.contains("__") {
            return Err(LiteralError {
                offset: start,
                message: format!("malformed number '{}'", &self.src[start..self.pos]),
            });
        }
        let cleaned = text.replace('_', "");
        let signed = if negative {
            format!("-{cleaned}")
        } else {
            cleaned
        };

        let malformed = || LiteralError {
            offset: start,
            message: format!("malformed number '{signed}'"),
        };

        if !is_float {
            if cleaned_has_leading_zero(text) {
                return Err(malformed());
            }
            if let Ok(n) = signed.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if let Ok(n) = signed.parse::<u64>() {
                return Ok(Value::Number(n.into()));
            }
        }
        let f: f64 = signed.parse().map_err(|_| malformed())?;
        Number::from_f64(f).map(Value::Number).ok_or_else(|| LiteralError {
            offset: start,
            message: format!("number '{signed}' is not finite"),
        })
    }
}

/// Python rejects integer literals like `007` (but accepts `0` and `000`).
fn cleaned_has_leading_zero(text: &str) -> bool {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    digits.len() > 1 && digits.starts_with('0') && digits.chars().any(|c| c != '0')
}

fn char_from_code(code: u32, offset: usize) -> Result<char, LiteralError> {
    char::from_u32(code).ok_or_else(|| LiteralError {
        offset,
        message: format!("invalid code point {code:#x}"),
    })
}

fn object_key(key: Value) -> Result<String, String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(_) | Value::Object(_) => Err("unsupported dict key type".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_literal;

    #[test]
    fn parses_python_repr_of_genre_list() {
        let v = parse_literal("[{'id': 16, 'name': 'Animation'}, {'id': 35, 'name': 'Comedy'}]")
            .unwrap();
        assert_eq!(
            v,
            json!([{"id": 16, "name": "Animation"}, {"id": 35, "name": "Comedy"}])
        );
    }

    #[test]
    fn parses_collection_dict_with_none() {
        let v = parse_literal(
            "{'id': 10194, 'name': 'Toy Story Collection', 'poster_path': '/7G9915LfUQ2lVfwMEEhDsn3kT4B.jpg', 'backdrop_path': None}",
        )
        .unwrap();
        assert_eq!(v["id"], json!(10194));
        assert_eq!(v["backdrop_path"], json!(null));
    }

    #[test]
    fn handles_apostrophes_inside_double_quoted_strings() {
        let v = parse_literal(r#"[{'name': "Jim Henson's Company", 'id': 2504}]"#).unwrap();
        assert_eq!(v, json!([{"name": "Jim Henson's Company", "id": 2504}]));
    }

    #[test]
    fn decodes_python_escapes() {
        let v = parse_literal(r"['caf\xe9', 'tab\there', 'it\'s', 'é', 'keep\q']").unwrap();
        assert_eq!(v, json!(["café", "tab\there", "it's", "é", "keep\\q"]));
    }

    #[test]
    fn tuples_and_sets_become_arrays() {
        assert_eq!(parse_literal("(1, 2)").unwrap(), json!([1, 2]));
        assert_eq!(parse_literal("(1,)").unwrap(), json!([1]));
        assert_eq!(parse_literal("()").unwrap(), json!([]));
        assert_eq!(parse_literal("(5)").unwrap(), json!(5));
        assert_eq!(parse_literal("{'a', 'b'}").unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn parses_literal_tokens_numbers_and_trailing_commas() {
        assert_eq!(
            parse_literal("[True, False, None, -3, 1_000, 2.5e3, +7, ]").unwrap(),
            json!([true, false, null, -3, 1000, 2500.0, 7])
        );
        assert_eq!(parse_literal("{1: 'a', True: 'b',}").unwrap(), json!({"1": "a", "true": "b"}));
    }

    #[test]
    fn concatenates_adjacent_strings_and_prefixes() {
        assert_eq!(parse_literal("'a' \"b\" u'c'").unwrap(), json!("abc"));
        assert_eq!(parse_literal(r"r'\d+'").unwrap(), json!("\\d+"));
        assert_eq!(parse_literal("'''multi\nline'''").unwrap(), json!("multi\nline"));
    }

    #[test]
    fn rejects_non_literals() {
        for bad in [
            "not valid json or literal",
            "[1, 2",
            "{'a': 1",
            "'unterminated",
            "[1] extra",
            "1e999",
            "007",
            "3j",
            "b'bytes'",
            "{[1]: 2}",
            "",
        ] {
            assert!(parse_literal(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn rejects_excessive_nesting() {
        let deep = format!("{}{}", "[".repeat(500), "]".repeat(500));
        let err = parse_literal(&deep).unwrap_err();
        assert!(err.message.contains("nesting"));
    }
}
