//! Line assembly for the command shell.
//!
//! Bytes from the serial link are collected until a CR or LF arrives. The
//! assembler then holds the line until the consumer calls
//! [`LineAssembler::clear`], which zeroes the whole buffer.
//!
//! - Printable bytes are appended while capacity remains, dropped otherwise.
//! - BS (0x08) and DEL (0x7F) erase the last byte.
//! - A terminator on an empty buffer is ignored, so CRLF yields one line.

/// Default shell line capacity in bytes
pub const LINE_CAPACITY: usize = 128;

/// Backspace
const BS: u8 = 0x08;

/// Delete (sent by most terminals for the backspace key)
const DEL: u8 = 0x7F;

/// Result of feeding one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feed {
    /// Byte appended to the line
    Stored,
    /// Last byte removed by a backspace
    Erased,
    /// Byte rejected: buffer full, or a line is waiting to be consumed
    Dropped,
    /// Byte had no effect (empty-line terminator, backspace on empty line)
    Ignored,
    /// Terminator received, a line is ready
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Appending bytes
    Collecting,
    /// Line complete, waiting for the consumer
    Ready,
}

/// Bounded line buffer with a two-state machine
#[derive(Debug, Clone)]
pub struct LineAssembler<const N: usize> {
    buffer: [u8; N],
    cursor: usize,
    state: LineState,
    overflowed: bool,
}

/// Line assembler sized for the command shell
pub type ShellLine = LineAssembler<LINE_CAPACITY>;

impl<const N: usize> Default for LineAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineAssembler<N> {
    /// Create an empty assembler
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            cursor: 0,
            state: LineState::Collecting,
            overflowed: false,
        }
    }

    /// Feed a single byte
    pub fn feed(&mut self, byte: u8) -> Feed {
        if self.state == LineState::Ready {
            return Feed::Dropped;
        }

        match byte {
            b'\r' | b'\n' => {
                if self.cursor == 0 {
                    Feed::Ignored
                } else {
                    self.state = LineState::Ready;
                    Feed::Ready
                }
            }
            BS | DEL => {
                if self.cursor == 0 {
                    Feed::Ignored
                } else {
                    self.cursor -= 1;
                    self.buffer[self.cursor] = 0;
                    Feed::Erased
                }
            }
            _ => {
                if self.cursor < N {
                    self.buffer[self.cursor] = byte;
                    self.cursor += 1;
                    Feed::Stored
                } else {
                    self.overflowed = true;
                    Feed::Dropped
                }
            }
        }
    }

    /// The completed line, if one is ready
    ///
    /// The terminator is not included.
    pub fn line(&self) -> Option<&[u8]> {
        match self.state {
            LineState::Ready => Some(&self.buffer[..self.cursor]),
            LineState::Collecting => None,
        }
    }

    /// Check if a line is waiting to be consumed
    pub fn is_ready(&self) -> bool {
        self.state == LineState::Ready
    }

    /// Number of bytes currently buffered
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Whether bytes were dropped for lack of capacity since the last clear
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Zero the whole buffer and return to collecting
    pub fn clear(&mut self) {
        self.buffer.fill(0);
        self.cursor = 0;
        self.state = LineState::Collecting;
        self.overflowed = false;
    }

    /// Raw buffer contents including the unused tail
    pub fn raw(&self) -> &[u8; N] {
        &self.buffer
    }
}
