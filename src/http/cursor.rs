/// Read position over a byte slice.
///
/// Every accessor checks the remaining length and returns `None` instead of
/// reading past the end, so truncated input surfaces as "need more data".
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Returns the bytes up to the next CRLF and moves past it.
    pub fn next_line(&mut self) -> Option<&'a [u8]> {
        let rest = self.remaining();
        let end = rest.windows(2).position(|w| w == b"\r\n")?;
        self.pos += end + 2;
        Some(&rest[..end])
    }

    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let rest = self.remaining();
        if rest.len() < n {
            return None;
        }
        self.pos += n;
        Some(&rest[..n])
    }

    /// Consumes a CRLF if one comes next.
    pub fn expect_crlf(&mut self) -> bool {
        if self.remaining().starts_with(b"\r\n") {
            self.pos += 2;
            true
        } else {
            false
        }
    }
}
