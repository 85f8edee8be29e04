//! Flash page abstractions
//!
//! Provides the raw NOR-flash primitives the persistence layer is built on.
//! Two fixed pages are reserved at the end of flash; each holds exactly one
//! persisted block. Implementations map a [`Page`] onto a physical address
//! and perform no caching.

/// Reserved flash pages
///
/// Each page holds one persisted block. The pages are disjoint, so a
/// corrupt or absent block on one never affects the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Page {
    /// Opaque fusion-algorithm state
    FusionState = 0,
    /// Device configuration record
    Config = 1,
}

impl Page {
    /// Get the page as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Errors from flash page operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Page erase failed
    Erase,
    /// Programming a unit failed
    Program,
    /// Read failed
    Read,
    /// Offset/length falls outside the page
    OutOfBounds,
    /// Offset or unit length is not aligned to the program unit
    Unaligned,
    /// Target unit was not in the erased state
    NotErased,
}

/// Raw access to the reserved flash pages
///
/// Blocking by nature: an erase stalls the CPU for milliseconds, and the
/// caller is expected to have refreshed the watchdog beforehand.
///
/// Offsets are relative to the start of the page. Implementations must:
/// - reject programming of a unit whose length is not exactly
///   [`NorPages::PROGRAM_UNIT`] or whose offset is unaligned
/// - never cache page contents
pub trait NorPages {
    /// Smallest atomically programmable width in bytes (4 or 8)
    const PROGRAM_UNIT: usize;

    /// Size of one page in bytes
    const PAGE_SIZE: usize;

    /// Erase the whole page back to the erased state (all bits set)
    fn erase(&mut self, page: Page) -> Result<(), FlashError>;

    /// Program exactly one unit at `offset`
    fn program_unit(&mut self, page: Page, offset: usize, unit: &[u8]) -> Result<(), FlashError>;

    /// Read `buf.len()` bytes starting at `offset`
    fn read(&mut self, page: Page, offset: usize, buf: &mut [u8]) -> Result<(), FlashError>;
}
