//! Block store over the reserved flash pages
//!
//! Flash is NOR: a page must be erased before any unit in it can be
//! programmed again, and programming happens one unit at a time. The block
//! store owns the watchdog so that every erase is preceded by a refresh.

use envnode_hal::{FlashError, NorPages, Page, Watchdog};

/// Largest program unit supported (double-word)
pub const MAX_PROGRAM_UNIT: usize = 8;

/// Value of an erased flash byte
pub const ERASED: u8 = 0xFF;

/// Block store error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Page erase failed
    Erase(FlashError),
    /// Programming failed
    Program(FlashError),
    /// Read failed
    Read(FlashError),
    /// Write length not a multiple of the program unit
    Unaligned,
    /// Write would run past the end of the page
    PageFull,
}

impl StoreError {
    /// Storage faults that must halt the node
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Erase(_))
    }
}

/// Raw erase/program/read access with watchdog-safe sequencing
pub struct BlockStore<F, W> {
    pages: F,
    watchdog: W,
}

impl<F: NorPages, W: Watchdog> BlockStore<F, W> {
    /// Create a block store
    pub fn new(pages: F, watchdog: W) -> Self {
        Self { pages, watchdog }
    }

    /// Refresh the watchdog
    pub fn feed_watchdog(&mut self) {
        self.watchdog.feed();
    }

    /// Erase `page` and return a writer positioned at its start
    ///
    /// The watchdog is refreshed immediately before the erase.
    pub fn erase(&mut self, page: Page) -> Result<PageWriter<'_, F>, StoreError> {
        self.watchdog.feed();
        self.pages.erase(page).map_err(StoreError::Erase)?;

        Ok(PageWriter {
            pages: &mut self.pages,
            page,
            offset: 0,
        })
    }

    /// Erase `page` and program `bytes` from its start
    ///
    /// `bytes` must be a whole number of program units.
    pub fn erase_and_write(&mut self, page: Page, bytes: &[u8]) -> Result<(), StoreError> {
        if bytes.len() % F::PROGRAM_UNIT != 0 {
            return Err(StoreError::Unaligned);
        }
        if bytes.len() > F::PAGE_SIZE {
            return Err(StoreError::PageFull);
        }
        self.erase(page)?.write(bytes)
    }

    /// Read `buf.len()` bytes at `offset`, straight from flash
    pub fn read(&mut self, page: Page, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        self.pages.read(page, offset, buf).map_err(StoreError::Read)
    }

    /// Access the underlying pages
    pub fn pages(&self) -> &F {
        &self.pages
    }
}

/// Sequential programmer for a freshly erased page
pub struct PageWriter<'a, F> {
    pages: &'a mut F,
    page: Page,
    offset: usize,
}

impl<'a, F: NorPages> PageWriter<'a, F> {
    /// Program whole units; `bytes.len()` must be a multiple of the unit
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        if bytes.len() % F::PROGRAM_UNIT != 0 {
            return Err(StoreError::Unaligned);
        }
        if self.offset + bytes.len() > F::PAGE_SIZE {
            return Err(StoreError::PageFull);
        }

        for unit in bytes.chunks_exact(F::PROGRAM_UNIT) {
            self.pages
                .program_unit(self.page, self.offset, unit)
                .map_err(StoreError::Program)?;
            self.offset += F::PROGRAM_UNIT;
        }
        Ok(())
    }

    /// Program `bytes`, padding the last unit with erased bytes
    pub fn write_padded(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        if F::PROGRAM_UNIT > MAX_PROGRAM_UNIT {
            return Err(StoreError::Unaligned);
        }

        let whole = bytes.len() - bytes.len() % F::PROGRAM_UNIT;
        let (body, tail) = bytes.split_at(whole);
        self.write(body)?;

        if !tail.is_empty() {
            let mut unit = [ERASED; MAX_PROGRAM_UNIT];
            unit[..tail.len()].copy_from_slice(tail);
            self.write(&unit[..F::PROGRAM_UNIT])?;
        }
        Ok(())
    }

    /// Offset of the next unit to program
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemPages, Op};

    type Pages = MemPages<8, 256>;

    fn store() -> (BlockStore<Pages, crate::mock::MockWatchdog>, crate::mock::OpLog) {
        let pages = Pages::new();
        let watchdog = pages.watchdog();
        let log = pages.log();
        (BlockStore::new(pages, watchdog), log)
    }

    #[test]
    fn test_watchdog_fed_before_erase() {
        let (mut store, log) = store();
        store.erase_and_write(Page::Config, &[0u8; 16]).unwrap();

        let log = log.borrow();
        assert_eq!(log[0], Op::Feed);
        assert_eq!(log[1], Op::Erase(Page::Config));
        assert_eq!(log[2], Op::Program(Page::Config, 0));
        assert_eq!(log[3], Op::Program(Page::Config, 8));
    }

    #[test]
    fn test_unaligned_write_rejected() {
        let (mut store, log) = store();
        assert_eq!(
            store.erase_and_write(Page::Config, &[0u8; 12]),
            Err(StoreError::Unaligned)
        );
        // Rejected before touching flash
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_padded_write() {
        let (mut store, _) = store();
        {
            let mut writer = store.erase(Page::FusionState).unwrap();
            writer.write_padded(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap();
            assert_eq!(writer.offset(), 16);
        }

        let mut buf = [0u8; 16];
        store.read(Page::FusionState, 0, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_rewrite_requires_erase() {
        let (mut store, _) = store();
        store.erase_and_write(Page::Config, &[0u8; 8]).unwrap();
        // A second erase_and_write succeeds because it erases first
        store.erase_and_write(Page::Config, &[1u8; 8]).unwrap();

        let mut buf = [0u8; 8];
        store.read(Page::Config, 0, &mut buf).unwrap();
        assert_eq!(buf, [1u8; 8]);
    }

    #[test]
    fn test_erase_failure_is_fatal() {
        let mut pages = Pages::new();
        pages.fail_erase = true;
        let watchdog = pages.watchdog();
        let mut store = BlockStore::new(pages, watchdog);

        let err = store.erase_and_write(Page::Config, &[0u8; 8]).unwrap_err();
        assert_eq!(err, StoreError::Erase(FlashError::Erase));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_write_past_page_end() {
        let (mut store, _) = store();
        assert_eq!(
            store.erase_and_write(Page::Config, &[0u8; 264]),
            Err(StoreError::PageFull)
        );
    }

    #[test]
    fn test_pages_are_independent() {
        let (mut store, _) = store();
        store.erase_and_write(Page::Config, &[0xA5; 8]).unwrap();
        store.erase_and_write(Page::FusionState, &[0x5A; 8]).unwrap();

        assert_eq!(store.pages().page(Page::Config)[..8], [0xA5; 8]);
        assert_eq!(store.pages().page(Page::FusionState)[..8], [0x5A; 8]);
    }
}
