//! Minimal JSON object scanner.
//!
//! The shell only needs the top-level members of a single object, so this
//! scanner validates the whole text once and then iterates the top-level
//! members in order, borrowing keys and values from the input. Nested
//! objects and arrays are validated and handed out as raw text. String
//! escapes are validated but not decoded.

/// Maximum nesting depth accepted
pub const MAX_DEPTH: usize = 8;

/// Errors from scanning a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JsonError {
    /// Input is not valid UTF-8
    InvalidUtf8,
    /// Top-level value is not an object
    NotAnObject,
    /// Unexpected byte at the given offset
    Unexpected { at: usize },
    /// Input ended inside a value
    UnexpectedEnd,
    /// Nesting deeper than [`MAX_DEPTH`]
    TooDeep,
}

/// A scanned JSON value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// String contents without the quotes (escapes not decoded)
    String(&'a str),
    /// Number as written
    Number(&'a str),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
    /// Nested object, raw text including braces
    Object(&'a str),
    /// Array, raw text including brackets
    Array(&'a str),
}

impl<'a> Value<'a> {
    /// Text of the value: string contents, or the literal as written
    pub fn text(&self) -> &'a str {
        match *self {
            Value::String(s) | Value::Number(s) | Value::Object(s) | Value::Array(s) => s,
            Value::Bool(true) => "true",
            Value::Bool(false) => "false",
            Value::Null => "null",
        }
    }

    /// First character of [`Value::text`], if any
    pub fn initial(&self) -> Option<char> {
        self.text().chars().next()
    }
}

/// One top-level `"key": value` pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member<'a> {
    /// Key without quotes
    pub key: &'a str,
    /// Value
    pub value: Value<'a>,
}

/// A validated JSON object
#[derive(Debug, Clone, Copy)]
pub struct Object<'a> {
    src: &'a str,
}

impl<'a> Object<'a> {
    /// Validate `bytes` as exactly one JSON object (surrounding whitespace allowed)
    pub fn parse(bytes: &'a [u8]) -> Result<Self, JsonError> {
        let src = core::str::from_utf8(bytes).map_err(|_| JsonError::InvalidUtf8)?;
        let mut cursor = Cursor::new(src);

        cursor.skip_ws();
        if cursor.peek() != Some(b'{') {
            return Err(JsonError::NotAnObject);
        }
        cursor.value(0)?;
        cursor.skip_ws();
        if cursor.pos < src.len() {
            return Err(JsonError::Unexpected { at: cursor.pos });
        }

        Ok(Self { src })
    }

    /// Iterate the top-level members in document order
    pub fn members(&self) -> Members<'a> {
        let mut cursor = Cursor::new(self.src);
        cursor.skip_ws();
        // Step past the opening brace
        cursor.pos += 1;
        Members {
            cursor,
            done: false,
        }
    }
}

/// Iterator over the members of a validated [`Object`]
pub struct Members<'a> {
    cursor: Cursor<'a>,
    done: bool,
}

impl<'a> Iterator for Members<'a> {
    type Item = Member<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let cursor = &mut self.cursor;
        cursor.skip_ws();
        if cursor.peek() == Some(b',') {
            cursor.pos += 1;
            cursor.skip_ws();
        }
        if cursor.peek() != Some(b'"') {
            // Closing brace (the text was validated up front)
            self.done = true;
            return None;
        }

        let member = cursor.member(1).ok();
        if member.is_none() {
            self.done = true;
        }
        member
    }
}

/// Byte cursor over the input
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<u8, JsonError> {
        let byte = self.peek().ok_or(JsonError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, want: u8) -> Result<(), JsonError> {
        let at = self.pos;
        match self.bump()? {
            b if b == want => Ok(()),
            _ => Err(JsonError::Unexpected { at }),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value<'a>, JsonError> {
        if depth > MAX_DEPTH {
            return Err(JsonError::TooDeep);
        }

        self.skip_ws();
        let start = self.pos;
        match self.peek().ok_or(JsonError::UnexpectedEnd)? {
            b'{' => {
                self.object_body(depth)?;
                Ok(Value::Object(&self.src[start..self.pos]))
            }
            b'[' => {
                self.array_body(depth)?;
                Ok(Value::Array(&self.src[start..self.pos]))
            }
            b'"' => self.string().map(Value::String),
            b't' => self.literal("true").map(|_| Value::Bool(true)),
            b'f' => self.literal("false").map(|_| Value::Bool(false)),
            b'n' => self.literal("null").map(|_| Value::Null),
            b'-' | b'0'..=b'9' => self.number().map(Value::Number),
            _ => Err(JsonError::Unexpected { at: start }),
        }
    }

    fn member(&mut self, depth: usize) -> Result<Member<'a>, JsonError> {
        let key = self.string()?;
        self.skip_ws();
        self.expect(b':')?;
        let value = self.value(depth)?;
        Ok(Member { key, value })
    }

    fn object_body(&mut self, depth: usize) -> Result<(), JsonError> {
        self.expect(b'{')?;
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(());
        }

        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return match self.peek() {
                    Some(_) => Err(JsonError::Unexpected { at: self.pos }),
                    None => Err(JsonError::UnexpectedEnd),
                };
            }
            self.member(depth + 1)?;
            self.skip_ws();
            let at = self.pos;
            match self.bump()? {
                b',' => continue,
                b'}' => return Ok(()),
                _ => return Err(JsonError::Unexpected { at }),
            }
        }
    }

    fn array_body(&mut self, depth: usize) -> Result<(), JsonError> {
        self.expect(b'[')?;
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(());
        }

        loop {
            self.value(depth + 1)?;
            self.skip_ws();
            let at = self.pos;
            match self.bump()? {
                b',' => continue,
                b']' => return Ok(()),
                _ => return Err(JsonError::Unexpected { at }),
            }
        }
    }

    /// Scan a string, returning its contents without quotes
    fn string(&mut self) -> Result<&'a str, JsonError> {
        self.expect(b'"')?;
        let start = self.pos;

        loop {
            let at = self.pos;
            match self.bump()? {
                b'"' => return Ok(&self.src[start..at]),
                b'\\' => {
                    let esc_at = self.pos;
                    match self.bump()? {
                        b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => {}
                        b'u' => {
                            for _ in 0..4 {
                                let hex_at = self.pos;
                                if !self.bump()?.is_ascii_hexdigit() {
                                    return Err(JsonError::Unexpected { at: hex_at });
                                }
                            }
                        }
                        _ => return Err(JsonError::Unexpected { at: esc_at }),
                    }
                }
                b if b < 0x20 => return Err(JsonError::Unexpected { at }),
                _ => {}
            }
        }
    }

    fn literal(&mut self, word: &str) -> Result<(), JsonError> {
        for &want in word.as_bytes() {
            self.expect(want)?;
        }
        Ok(())
    }

    fn digits(&mut self) -> Result<(), JsonError> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == start {
            return match self.peek() {
                Some(_) => Err(JsonError::Unexpected { at: self.pos }),
                None => Err(JsonError::UnexpectedEnd),
            };
        }
        Ok(())
    }

    fn number(&mut self) -> Result<&'a str, JsonError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        self.digits()?;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.digits()?;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            self.digits()?;
        }
        Ok(&self.src[start..self.pos])
    }
}
