//! Host mocks for the hardware traits

use std::cell::RefCell;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use envnode_hal::{FlashError, NorPages, OutputPin, Page, ReplySink, TxError, Watchdog};

use crate::shell::Reply;

/// Operation observed by the mocks, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Feed,
    Erase(Page),
    Program(Page, usize),
    Read(Page, usize),
}

pub type OpLog = Rc<RefCell<Vec<Op>>>;

/// NOR-flash emulation of the two reserved pages
///
/// Erased bytes read 0xFF and a unit can only be programmed while fully
/// erased.
pub struct MemPages<const UNIT: usize, const SIZE: usize> {
    pages: [[u8; SIZE]; 2],
    log: OpLog,
    pub fail_erase: bool,
}

impl<const UNIT: usize, const SIZE: usize> MemPages<UNIT, SIZE> {
    pub fn new() -> Self {
        Self {
            pages: [[0xFF; SIZE]; 2],
            log: Rc::new(RefCell::new(Vec::new())),
            fail_erase: false,
        }
    }

    /// Watchdog sharing this flash's operation log
    pub fn watchdog(&self) -> MockWatchdog {
        MockWatchdog {
            log: self.log.clone(),
        }
    }

    pub fn log(&self) -> OpLog {
        self.log.clone()
    }

    pub fn page(&self, page: Page) -> &[u8; SIZE] {
        &self.pages[page.as_u8() as usize]
    }

    pub fn page_mut(&mut self, page: Page) -> &mut [u8; SIZE] {
        &mut self.pages[page.as_u8() as usize]
    }
}

impl<const UNIT: usize, const SIZE: usize> NorPages for MemPages<UNIT, SIZE> {
    const PROGRAM_UNIT: usize = UNIT;
    const PAGE_SIZE: usize = SIZE;

    fn erase(&mut self, page: Page) -> Result<(), FlashError> {
        self.log.borrow_mut().push(Op::Erase(page));
        if self.fail_erase {
            return Err(FlashError::Erase);
        }
        self.page_mut(page).fill(0xFF);
        Ok(())
    }

    fn program_unit(&mut self, page: Page, offset: usize, unit: &[u8]) -> Result<(), FlashError> {
        self.log.borrow_mut().push(Op::Program(page, offset));
        if unit.len() != UNIT || offset % UNIT != 0 {
            return Err(FlashError::Unaligned);
        }
        let target = self
            .page_mut(page)
            .get_mut(offset..offset + UNIT)
            .ok_or(FlashError::OutOfBounds)?;
        if target.iter().any(|&b| b != 0xFF) {
            return Err(FlashError::NotErased);
        }
        target.copy_from_slice(unit);
        Ok(())
    }

    fn read(&mut self, page: Page, offset: usize, buf: &mut [u8]) -> Result<(), FlashError> {
        self.log.borrow_mut().push(Op::Read(page, offset));
        let source = self
            .page(page)
            .get(offset..offset + buf.len())
            .ok_or(FlashError::OutOfBounds)?;
        buf.copy_from_slice(source);
        Ok(())
    }
}

pub struct MockWatchdog {
    log: OpLog,
}

impl Watchdog for MockWatchdog {
    fn feed(&mut self) {
        self.log.borrow_mut().push(Op::Feed);
    }
}

/// Sink keeping every reply
#[derive(Default)]
pub struct RecordingSink {
    pub replies: Vec<String>,
}

impl RecordingSink {
    pub fn last(&self) -> &str {
        self.replies.last().map(String::as_str).unwrap_or("")
    }

    pub fn all(&self) -> String {
        self.replies.concat()
    }
}

impl ReplySink for RecordingSink {
    fn transmit(&mut self, data: &[u8]) -> Result<(), TxError> {
        self.replies.push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }
}

/// Sink admitting only what fits one [`Reply`]
#[derive(Default)]
pub struct BoundedSink {
    pub replies: Vec<Reply>,
}

impl ReplySink for BoundedSink {
    fn transmit(&mut self, data: &[u8]) -> Result<(), TxError> {
        let reply = Reply::from_slice(data).map_err(|_| TxError::TooLong)?;
        self.replies.push(reply);
        Ok(())
    }
}

/// Sink that is always busy
pub struct BusySink;

impl ReplySink for BusySink {
    fn transmit(&mut self, _data: &[u8]) -> Result<(), TxError> {
        Err(TxError::Busy)
    }
}

#[derive(Default)]
pub struct MockPin {
    pub on: bool,
    pub toggles: u32,
}

impl OutputPin for MockPin {
    fn set_on(&mut self) {
        self.on = true;
    }

    fn set_off(&mut self) {
        self.on = false;
    }

    fn toggle(&mut self) {
        self.on = !self.on;
        self.toggles += 1;
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
