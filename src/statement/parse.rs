//! INSERT statement parser.
//!
//! Byte cursor over a single INSERT statement. Understands:
//! - `INSERT [IGNORE] INTO t [(cols)] VALUES (..), (..)`
//! - nested tuple lists `VALUES ((..), (..))`
//! - the assignment form `INSERT INTO t SET a = 1, b = 'x'`
//!
//! Literals are typed by lexical form only; coercion against the target
//! column's declared type happens in the statement model.

use crate::error::{Error, Result};
use crate::parser::split_qualified_name;

/// A literal as written in the statement text
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Int(i64),
    Double(f64),
    Bool(bool),
    /// Quoted string, typed date/time literal, or hex literal
    Text(String),
}

/// Raw structure of a parsed INSERT
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInsert {
    /// Table name written in the statement, unquoted and unqualified
    pub table: String,
    /// Explicit column list, or assignment targets for the SET form
    pub columns: Option<Vec<String>>,
    /// One entry per value tuple
    pub tuples: Vec<Vec<Literal>>,
}

/// Parser for one INSERT statement
pub struct InsertParser<'a> {
    stmt: &'a [u8],
    pos: usize,
}

impl<'a> InsertParser<'a> {
    /// Create a new parser for an INSERT statement
    pub fn new(stmt: &'a str) -> Self {
        Self {
            stmt: stmt.as_bytes(),
            pos: 0,
        }
    }

    /// Parse the whole statement
    pub fn parse(mut self) -> Result<ParsedInsert> {
        self.expect_keyword("INSERT")?;
        for modifier in ["LOW_PRIORITY", "DELAYED", "HIGH_PRIORITY", "IGNORE"] {
            self.try_keyword(modifier);
        }
        self.expect_keyword("INTO")?;

        let table = self.parse_table_name()?;

        let parsed = if self.try_keyword("SET") {
            let (columns, values) = self.parse_assignments()?;
            ParsedInsert {
                table,
                columns: Some(columns),
                tuples: vec![values],
            }
        } else {
            let columns = if self.peek() == Some(b'(') {
                Some(self.parse_column_names()?)
            } else {
                None
            };

            if !self.try_keyword("VALUES") && !self.try_keyword("VALUE") {
                return Err(self.error("expected VALUES or SET"));
            }

            ParsedInsert {
                table,
                columns,
                tuples: self.parse_tuples()?,
            }
        };

        self.skip_whitespace();
        if self.peek() == Some(b';') {
            self.pos += 1;
            self.skip_whitespace();
        }
        if self.pos < self.stmt.len() {
            return Err(self.error("unexpected trailing text"));
        }

        Ok(parsed)
    }

    fn parse_table_name(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        loop {
            self.parse_identifier()?;
            self.skip_whitespace();
            if self.peek() == Some(b'.') {
                self.pos += 1;
                self.skip_whitespace();
            } else {
                break;
            }
        }
        let raw = String::from_utf8_lossy(&self.stmt[start..self.pos]);
        Ok(split_qualified_name(&raw).1)
    }

    /// Parse `(a, b, c)`
    fn parse_column_names(&mut self) -> Result<Vec<String>> {
        self.expect_byte(b'(')?;
        let mut names = Vec::new();
        loop {
            self.skip_whitespace();
            names.push(self.parse_identifier()?);
            self.skip_whitespace();
            match self.next_byte() {
                Some(b',') => continue,
                Some(b')') => break,
                _ => return Err(self.error("malformed column list")),
            }
        }
        Ok(names)
    }

    /// Parse `a = 1, b = 'x'`
    fn parse_assignments(&mut self) -> Result<(Vec<String>, Vec<Literal>)> {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            columns.push(self.parse_identifier()?);
            self.expect_byte(b'=')?;
            values.push(self.parse_value()?);
            self.skip_whitespace();
            if self.peek() == Some(b',') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok((columns, values))
    }

    /// Parse `(..), (..)` including a nested `((..), (..))` list
    fn parse_tuples(&mut self) -> Result<Vec<Vec<Literal>>> {
        let mut tuples = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'(') {
                return Err(self.error("expected value tuple"));
            }

            if self.peek_after_paren() == Some(b'(') {
                self.pos += 1;
                tuples.extend(self.parse_tuples()?);
                self.expect_byte(b')')?;
            } else {
                tuples.push(self.parse_tuple()?);
            }

            self.skip_whitespace();
            if self.peek() == Some(b',') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(tuples)
    }

    /// Parse a single tuple "(val1, val2, ...)"
    fn parse_tuple(&mut self) -> Result<Vec<Literal>> {
        self.expect_byte(b'(')?;
        let mut values = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(values);
        }

        loop {
            values.push(self.parse_value()?);
            self.skip_whitespace();
            match self.next_byte() {
                Some(b',') => continue,
                Some(b')') => break,
                _ => return Err(self.error("malformed value tuple")),
            }
        }

        Ok(values)
    }

    /// Parse a single value (string, number, NULL, boolean, typed literal)
    fn parse_value(&mut self) -> Result<Literal> {
        self.skip_whitespace();

        let b = self.peek().ok_or_else(|| self.error("missing value"))?;

        if b == b'\'' || b == b'"' {
            return self.parse_string_value().map(Literal::Text);
        }

        if b == b'0' && matches!(self.stmt.get(self.pos + 1), Some(b'x') | Some(b'X')) {
            return Ok(self.parse_hex_value());
        }

        if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.' {
            return self.parse_number_value();
        }

        if b.is_ascii_alphabetic() {
            let word = self.parse_word().to_ascii_uppercase();
            return match word.as_str() {
                "NULL" => Ok(Literal::Null),
                "TRUE" => Ok(Literal::Bool(true)),
                "FALSE" => Ok(Literal::Bool(false)),
                "DATE" | "TIME" | "TIMESTAMP" | "DATETIME" => {
                    self.skip_whitespace();
                    match self.peek() {
                        Some(b'\'') => self.parse_string_value().map(Literal::Text),
                        _ => Err(self.error("typed literal without string")),
                    }
                }
                _ => Err(self.error(&format!("unsupported value expression {}", word))),
            };
        }

        Err(self.error("unsupported value"))
    }

    /// Parse a quoted string literal, handling backslash escapes and doubled quotes
    fn parse_string_value(&mut self) -> Result<String> {
        let quote = self.stmt[self.pos];
        self.pos += 1; // Skip opening quote

        let mut value = Vec::new();

        while self.pos < self.stmt.len() {
            let b = self.stmt[self.pos];

            if b == b'\\' && self.pos + 1 < self.stmt.len() {
                let escaped = match self.stmt[self.pos + 1] {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'0' => 0,
                    other => other, // \', \\, etc.
                };
                value.push(escaped);
                self.pos += 2;
            } else if b == quote {
                // Doubled quote stays inside the literal
                if self.stmt.get(self.pos + 1) == Some(&quote) {
                    value.push(quote);
                    self.pos += 2;
                } else {
                    self.pos += 1; // End of string
                    return Ok(String::from_utf8_lossy(&value).into_owned());
                }
            } else {
                value.push(b);
                self.pos += 1;
            }
        }

        Err(self.error("unterminated string literal"))
    }

    /// Parse a hex literal 0xABCD...
    fn parse_hex_value(&mut self) -> Literal {
        let start = self.pos;
        self.pos += 2; // Skip 0x

        while self.pos < self.stmt.len() && self.stmt[self.pos].is_ascii_hexdigit() {
            self.pos += 1;
        }

        Literal::Text(String::from_utf8_lossy(&self.stmt[start..self.pos]).into_owned())
    }

    /// Parse an integer or floating point number
    fn parse_number_value(&mut self) -> Result<Literal> {
        let start = self.pos;
        let mut is_float = false;

        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }

        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else if b == b'.' && !is_float {
                is_float = true;
                self.pos += 1;
            } else if b == b'e' || b == b'E' {
                // Scientific notation
                is_float = true;
                self.pos += 1;
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }

        let raw = String::from_utf8_lossy(&self.stmt[start..self.pos]).into_owned();
        let raw = raw.strip_prefix('+').unwrap_or(&raw);

        if !is_float {
            if let Ok(n) = raw.parse::<i64>() {
                return Ok(Literal::Int(n));
            }
        }
        raw.parse::<f64>()
            .map(Literal::Double)
            .map_err(|_| self.error(&format!("malformed number {}", raw)))
    }

    /// Parse a bare or quoted identifier
    fn parse_identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        match self.peek() {
            Some(open @ (b'`' | b'"' | b'[')) => {
                let close = if open == b'[' { b']' } else { open };
                self.pos += 1;
                let start = self.pos;
                while self.pos < self.stmt.len() && self.stmt[self.pos] != close {
                    self.pos += 1;
                }
                if self.pos >= self.stmt.len() {
                    return Err(self.error("unterminated identifier"));
                }
                let ident = String::from_utf8_lossy(&self.stmt[start..self.pos]).into_owned();
                self.pos += 1;
                Ok(ident)
            }
            Some(b) if b.is_ascii_alphabetic() || b == b'_' || b >= 0x80 => Ok(self.parse_word()),
            _ => Err(self.error("expected identifier")),
        }
    }

    fn parse_word(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.stmt[start..self.pos]).into_owned()
    }

    /// Consume `keyword` if it is the next word
    fn try_keyword(&mut self, keyword: &str) -> bool {
        self.skip_whitespace();
        let end = self.pos + keyword.len();
        if end > self.stmt.len() || !self.stmt[self.pos..end].eq_ignore_ascii_case(keyword.as_bytes()) {
            return false;
        }
        if let Some(&b) = self.stmt.get(end) {
            if b.is_ascii_alphanumeric() || b == b'_' {
                return false;
            }
        }
        self.pos = end;
        true
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.try_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", keyword)))
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected as char)))
        }
    }

    fn peek(&self) -> Option<u8> {
        self.stmt.get(self.pos).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// First non-whitespace byte after the `(` at the cursor
    fn peek_after_paren(&self) -> Option<u8> {
        self.stmt[self.pos + 1..]
            .iter()
            .copied()
            .find(|b| !b.is_ascii_whitespace())
    }

    /// Skip whitespace and newlines
    fn skip_whitespace(&mut self) {
        while self.pos < self.stmt.len() && self.stmt[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::StatementParse(format!("{} at offset {}", message, self.pos))
    }
}

/// Parse one INSERT statement into its raw structure
pub fn parse_insert(stmt: &str) -> Result<ParsedInsert> {
    InsertParser::new(stmt).parse()
}
