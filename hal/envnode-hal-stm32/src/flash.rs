//! Flash page driver for STM32L4
//!
//! STM32L432KC has 256KB flash with 2KB pages and is programmed one
//! 64-bit double-word at a time. The last two pages are reserved for the
//! persisted blocks; `memory.x` keeps the linker out of them.

use embassy_stm32::flash::{Blocking, Flash};
use embassy_stm32::peripherals::FLASH;
use embassy_stm32::Peri;

pub use envnode_hal::flash::{FlashError, NorPages, Page};

/// Total flash size
pub const FLASH_SIZE: usize = 256 * 1024; // 256KB

/// Flash page size for STM32L4 series
pub const FLASH_PAGE_SIZE: usize = 2048; // 2KB pages

/// Double-word programming
pub const PROGRAM_UNIT: usize = 8;

/// Page index holding the fusion state block
pub const FUSION_STATE_PAGE: usize = 126;

/// Page index holding the configuration block
pub const CONFIG_PAGE: usize = 127;

/// Offset of a reserved page from the start of flash
pub const fn page_offset(page: Page) -> u32 {
    let index = match page {
        Page::FusionState => FUSION_STATE_PAGE,
        Page::Config => CONFIG_PAGE,
    };
    (index * FLASH_PAGE_SIZE) as u32
}

/// Reserved flash pages on STM32L4
pub struct Stm32Pages<'d> {
    flash: Flash<'d, Blocking>,
}

impl<'d> Stm32Pages<'d> {
    /// Take ownership of the flash peripheral
    pub fn new(flash: Peri<'d, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }

    fn check_range(offset: usize, len: usize) -> Result<(), FlashError> {
        match offset.checked_add(len) {
            Some(end) if end <= FLASH_PAGE_SIZE => Ok(()),
            _ => Err(FlashError::OutOfBounds),
        }
    }
}

impl<'d> NorPages for Stm32Pages<'d> {
    const PROGRAM_UNIT: usize = PROGRAM_UNIT;
    const PAGE_SIZE: usize = FLASH_PAGE_SIZE;

    fn erase(&mut self, page: Page) -> Result<(), FlashError> {
        let start = page_offset(page);
        self.flash
            .blocking_erase(start, start + FLASH_PAGE_SIZE as u32)
            .map_err(|_| FlashError::Erase)
    }

    fn program_unit(&mut self, page: Page, offset: usize, unit: &[u8]) -> Result<(), FlashError> {
        if unit.len() != PROGRAM_UNIT || offset % PROGRAM_UNIT != 0 {
            return Err(FlashError::Unaligned);
        }
        Self::check_range(offset, unit.len())?;

        self.flash
            .blocking_write(page_offset(page) + offset as u32, unit)
            .map_err(|_| FlashError::Program)
    }

    fn read(&mut self, page: Page, offset: usize, buf: &mut [u8]) -> Result<(), FlashError> {
        Self::check_range(offset, buf.len())?;

        self.flash
            .blocking_read(page_offset(page) + offset as u32, buf)
            .map_err(|_| FlashError::Read)
    }
}
