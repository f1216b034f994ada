//! Strict structured field parsing (RFC 8941, section 4.2).

use super::{BareItem, Decimal, Dictionary, InnerList, Item, List, ListEntry, Parameters, Token};
use indexmap::IndexMap;
use thiserror::Error;

/// A structured field parse failure, with the byte offset it occurred at.
#[derive(Debug, Error)]
#[error("malformed structured field value at offset {offset}: {message}")]
pub struct ParseError {
    offset: usize,
    message: &'static str,
}

impl ParseError {
    /// Byte offset into the input at which parsing failed.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Strict recursive-descent parser over a single field value.
///
/// Entry points discard leading and trailing spaces and reject any input
/// that is not consumed completely.
pub struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Parse the input as an item (RFC 8941, section 3.3).
    pub fn parse_item(input: &'a str) -> Result<Item, ParseError> {
        Self::run(input, Self::item)
    }

    /// Parse the input as a list (RFC 8941, section 3.1).
    pub fn parse_list(input: &'a str) -> Result<List, ParseError> {
        Self::run(input, Self::list)
    }

    /// Parse the input as a dictionary (RFC 8941, section 3.2).
    pub fn parse_dictionary(input: &'a str) -> Result<Dictionary, ParseError> {
        Self::run(input, Self::dictionary)
    }

    fn run<T>(
        input: &'a str,
        parse_fn: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let mut parser = Self {
            input: input.as_bytes(),
            pos: 0,
        };

        parser.discard_sp();
        let value = parse_fn(&mut parser)?;
        parser.discard_sp();

        if parser.pos != parser.input.len() {
            return Err(parser.error("trailing characters after the parsed value"));
        }

        Ok(value)
    }

    fn list(&mut self) -> Result<List, ParseError> {
        let mut entries = Vec::new();

        while self.pos < self.input.len() {
            entries.push(self.item_or_inner_list()?);
            self.discard_ows();

            if self.pos == self.input.len() {
                break;
            }

            self.expect(b',', "expected ',' between list members")?;
            self.discard_ows();

            if self.pos == self.input.len() {
                return Err(self.error("trailing comma at the end of the list"));
            }
        }

        Ok(List(entries))
    }

    fn dictionary(&mut self) -> Result<Dictionary, ParseError> {
        let mut members = IndexMap::new();

        while self.pos < self.input.len() {
            let key = self.key()?;

            let member = if self.eat(b'=') {
                self.item_or_inner_list()?
            } else {
                // A member without a value is boolean true; its parameters
                // still follow the key.
                ListEntry::Item(Item::new(true).with_params(self.parameters()?))
            };

            // A duplicate key overwrites the previous value in place.
            members.insert(key, member);
            self.discard_ows();

            if self.pos == self.input.len() {
                break;
            }

            self.expect(b',', "expected ',' between dictionary members")?;
            self.discard_ows();

            if self.pos == self.input.len() {
                return Err(self.error("trailing comma at the end of the dictionary"));
            }
        }

        Ok(Dictionary { inner: members })
    }

    fn item_or_inner_list(&mut self) -> Result<ListEntry, ParseError> {
        if self.peek() == Some(b'(') {
            self.inner_list().map(ListEntry::InnerList)
        } else {
            self.item().map(ListEntry::Item)
        }
    }

    fn inner_list(&mut self) -> Result<InnerList, ParseError> {
        self.expect(b'(', "expected '(' at the start of an inner list")?;
        let mut items = Vec::new();

        loop {
            self.discard_sp();

            if self.eat(b')') {
                return Ok(InnerList {
                    items,
                    params: self.parameters()?,
                });
            }

            items.push(self.item()?);

            match self.peek() {
                Some(b' ' | b')') => {}
                _ => return Err(self.error("expected ' ' or ')' after an inner list item")),
            }
        }
    }

    fn item(&mut self) -> Result<Item, ParseError> {
        let bare_item = self.bare_item()?;
        let params = self.parameters()?;

        Ok(Item { bare_item, params })
    }

    fn bare_item(&mut self) -> Result<BareItem, ParseError> {
        match self.peek() {
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(b'"') => self.string().map(BareItem::String),
            Some(b':') => self.byte_sequence().map(BareItem::ByteSequence),
            Some(b'?') => self.boolean().map(BareItem::Boolean),
            Some(ch) if ch == b'*' || ch.is_ascii_alphabetic() => {
                self.token().map(BareItem::Token)
            }
            Some(..) => Err(self.error("expected a bare item")),
            None => Err(self.error("unexpected end of input, expected a bare item")),
        }
    }

    fn number(&mut self) -> Result<BareItem, ParseError> {
        let negative = self.eat(b'-');

        if !matches!(self.peek(), Some(b'0'..=b'9')) {
            return Err(self.error("expected a digit after '-'"));
        }

        let mut integral: i64 = 0;
        let mut integral_digits = 0usize;

        while let Some(digit @ b'0'..=b'9') = self.peek() {
            integral = integral * 10 + i64::from(digit - b'0');
            integral_digits += 1;
            self.bump();

            if integral_digits > 15 {
                return Err(self.error("integer with more than 15 digits"));
            }
        }

        if !self.eat(b'.') {
            let value = if negative { -integral } else { integral };
            return Ok(BareItem::Integer(value));
        }

        if integral_digits > 12 {
            return Err(self.error("decimal with more than 12 integral digits"));
        }

        let mut fractional: i64 = 0;
        let mut fractional_digits = 0usize;

        while let Some(digit @ b'0'..=b'9') = self.peek() {
            fractional = fractional * 10 + i64::from(digit - b'0');
            fractional_digits += 1;
            self.bump();

            if fractional_digits > 3 {
                return Err(self.error("decimal with more than 3 fractional digits"));
            }
        }

        if fractional_digits == 0 {
            return Err(self.error("decimal ends with '.'"));
        }

        for _ in fractional_digits..3 {
            fractional *= 10;
        }

        let mut thousandths = integral * 1000 + fractional;
        if negative {
            thousandths = -thousandths;
        }

        // Within range by the digit limits above.
        Decimal::from_thousandths(thousandths)
            .map(BareItem::Decimal)
            .map_err(|_| self.error("decimal out of range"))
    }

    fn string(&mut self) -> Result<String, ParseError> {
        self.expect(b'"', "expected '\"' at the start of a string")?;
        let mut value = String::new();

        loop {
            let Some(ch) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            self.bump();

            match ch {
                b'\\' => {
                    let Some(escaped @ (b'"' | b'\\')) = self.peek() else {
                        return Err(self.error("invalid escape sequence in string"));
                    };
                    self.bump();
                    value.push(char::from(escaped));
                }
                b'"' => return Ok(value),
                0x20..=0x7e => value.push(char::from(ch)),
                _ => return Err(self.error("invalid character in string")),
            }
        }
    }

    fn token(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;

        // The caller verified the first character is ALPHA / "*".
        self.bump();

        while let Some(ch) = self.peek() {
            if super::is_token_char(char::from(ch)) {
                self.bump();
            } else {
                break;
            }
        }

        let token = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("invalid character in token"))?;

        Ok(Token::from_validated(token.to_owned()))
    }

    fn byte_sequence(&mut self) -> Result<Vec<u8>, ParseError> {
        self.expect(b':', "expected ':' at the start of a byte sequence")?;
        let start = self.pos;

        loop {
            match self.peek() {
                Some(b':') => break,
                Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'+' | b'/' | b'=') => self.bump(),
                Some(..) => return Err(self.error("invalid character in byte sequence")),
                None => return Err(self.error("unterminated byte sequence")),
            }
        }

        let encoded = &self.input[start..self.pos];
        self.bump();

        base64_simd::STANDARD.decode_to_vec(encoded).map_err(|_| ParseError {
            offset: start,
            message: "invalid base64 in byte sequence",
        })
    }

    fn boolean(&mut self) -> Result<bool, ParseError> {
        self.expect(b'?', "expected '?' at the start of a boolean")?;

        match self.peek() {
            Some(b'1') => {
                self.bump();
                Ok(true)
            }
            Some(b'0') => {
                self.bump();
                Ok(false)
            }
            _ => Err(self.error("expected '0' or '1' after '?'")),
        }
    }

    fn parameters(&mut self) -> Result<Parameters, ParseError> {
        let mut params = Parameters::new();

        while self.peek() == Some(b';') {
            self.bump();
            self.discard_sp();

            let key = self.key()?;
            let value = if self.eat(b'=') {
                self.bare_item()?
            } else {
                BareItem::Boolean(true)
            };

            params.insert(key, value);
        }

        Ok(params)
    }

    fn key(&mut self) -> Result<String, ParseError> {
        if !matches!(self.peek(), Some(b'a'..=b'z' | b'*')) {
            return Err(self.error("expected a key"));
        }

        let start = self.pos;
        self.bump();

        while let Some(b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b'*') = self.peek() {
            self.bump();
        }

        // Keys are a subset of ASCII; the slice is always valid UTF-8.
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8, message: &'static str) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn discard_sp(&mut self) {
        while self.peek() == Some(b' ') {
            self.bump();
        }
    }

    fn discard_ows(&mut self) {
        while let Some(b' ' | b'\t') = self.peek() {
            self.bump();
        }
    }

    fn error(&self, message: &'static str) -> ParseError {
        ParseError {
            offset: self.pos,
            message,
        }
    }
}
