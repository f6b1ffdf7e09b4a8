use text_size::TextSize;

pub(crate) const EOF_CHAR: char = '\0';

/// A position in the text plus the start of the token being lexed.
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str, offset: TextSize) -> Self {
        let pos = usize::from(offset);
        Self { text, pos, start: pos }
    }

    pub(crate) fn text(&self) -> &'a str {
        self.text
    }

    pub(crate) fn offset(&self) -> TextSize {
        TextSize::new(self.pos as u32)
    }

    pub(crate) fn reset(&mut self, offset: TextSize) {
        self.pos = usize::from(offset);
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub(crate) fn peek(&self) -> char {
        self.rest().chars().next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn second(&self) -> char {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn matches(&self, c: char) -> bool {
        !self.is_eof() && self.peek() == c
    }

    pub(crate) fn advance(&mut self) -> char {
        let c = self.peek();
        if !self.is_eof() {
            self.pos += c.len_utf8();
        }
        c
    }

    pub(crate) fn advance_while(&mut self, f: impl Fn(char) -> bool) {
        while !self.is_eof() && f(self.peek()) {
            self.advance();
        }
    }

    pub(crate) fn start_token(&mut self) {
        self.start = self.pos;
    }

    pub(crate) fn token_text(&self) -> &'a str {
        &self.text[self.start..self.pos]
    }
}
