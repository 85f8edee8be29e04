//! Persistence codec
//!
//! Each reserved page holds at most one block:
//!
//! ```text
//! ┌──────────┬──────────┬───────────────────────────────┐
//! │ MAGIC    │ LENGTH   │ PAYLOAD (padded with 0xFF)    │
//! │ 1 unit   │ 1 unit   │ LENGTH bytes, unit aligned    │
//! └──────────┴──────────┴───────────────────────────────┘
//! ```
//!
//! Magic and length are little-endian and one program unit wide. A block is
//! valid only if the magic matches exactly; anything else (including an
//! erased page) reads as "no block". Every save erases the whole page.

use envnode_hal::{NorPages, Page, Watchdog};

use super::block::{BlockStore, StoreError, MAX_PROGRAM_UNIT};

/// Fusion state magic, 4-byte program unit
pub const STATE_MAGIC_WORD: u32 = 0xDEAD_BEEF;
/// Configuration magic, 4-byte program unit
pub const CONFIG_MAGIC_WORD: u32 = 0xC0DE_CAFE;
/// Fusion state magic, 8-byte program unit
pub const STATE_MAGIC_DWORD: u64 = 0xDEAD_BEEF_5EED_F00D;
/// Configuration magic, 8-byte program unit
pub const CONFIG_MAGIC_DWORD: u64 = 0xC0DE_CAFE_0BAD_F00D;

/// Persistence error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Underlying block store failed
    Store(StoreError),
    /// Caller's buffer is not larger than the stored length
    BufferTooSmall { stored: usize, capacity: usize },
    /// Payload does not fit in a page
    TooLarge,
    /// Record could not be serialized
    Encode,
}

impl PersistError {
    /// Storage faults that must halt the node
    pub fn is_fatal(&self) -> bool {
        matches!(self, PersistError::Store(e) if e.is_fatal())
    }
}

impl From<StoreError> for PersistError {
    fn from(e: StoreError) -> Self {
        PersistError::Store(e)
    }
}

/// Magic tag for a page at a given program unit width
pub fn magic(page: Page, unit: usize) -> u64 {
    match (page, unit) {
        (Page::FusionState, 4) => STATE_MAGIC_WORD as u64,
        (Page::Config, 4) => CONFIG_MAGIC_WORD as u64,
        (Page::FusionState, _) => STATE_MAGIC_DWORD,
        (Page::Config, _) => CONFIG_MAGIC_DWORD,
    }
}

/// Encode `value` as one program unit
fn unit_bytes(value: u64, unit: usize) -> ([u8; MAX_PROGRAM_UNIT], usize) {
    let mut bytes = [0u8; MAX_PROGRAM_UNIT];
    bytes.copy_from_slice(&value.to_le_bytes());
    (bytes, unit.min(MAX_PROGRAM_UNIT))
}

/// Decode one program unit
fn unit_value(bytes: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(word)
}

/// Framed, validated storage of opaque payloads
pub struct Persistence<F, W> {
    store: BlockStore<F, W>,
}

impl<F: NorPages, W: Watchdog> Persistence<F, W> {
    /// Header size: magic plus length
    pub const HEADER_LEN: usize = 2 * F::PROGRAM_UNIT;

    /// Largest payload a page can hold
    pub const MAX_PAYLOAD: usize = F::PAGE_SIZE - Self::HEADER_LEN;

    /// Create the codec over a block store
    pub fn new(store: BlockStore<F, W>) -> Self {
        Self { store }
    }

    /// Refresh the watchdog through the block store
    pub fn feed_watchdog(&mut self) {
        self.store.feed_watchdog();
    }

    /// Access the underlying block store
    pub fn store(&self) -> &BlockStore<F, W> {
        &self.store
    }

    /// Erase `page` and write `payload` as a framed block
    ///
    /// An oversized payload is refused before the page is erased, so the
    /// previous block survives.
    pub fn save(&mut self, page: Page, payload: &[u8]) -> Result<(), PersistError> {
        if payload.len() > Self::MAX_PAYLOAD {
            return Err(PersistError::TooLarge);
        }

        let unit = F::PROGRAM_UNIT;
        let mut writer = self.store.erase(page)?;

        let (tag, n) = unit_bytes(magic(page, unit), unit);
        writer.write(&tag[..n])?;

        let (len, n) = unit_bytes(payload.len() as u64, unit);
        writer.write(&len[..n])?;

        writer.write_padded(payload)?;
        Ok(())
    }

    /// Load the block on `page` into `buf`
    ///
    /// Returns the payload length, or 0 if the page holds no valid block, in
    /// which case `buf` is not touched. `buf` must be strictly larger than
    /// the stored payload.
    pub fn load(&mut self, page: Page, buf: &mut [u8]) -> Result<usize, PersistError> {
        let unit = F::PROGRAM_UNIT.min(MAX_PROGRAM_UNIT);
        let mut word = [0u8; MAX_PROGRAM_UNIT];

        self.store.read(page, 0, &mut word[..unit])?;
        if unit_value(&word[..unit]) != magic(page, unit) {
            return Ok(0);
        }

        self.store.read(page, unit, &mut word[..unit])?;
        // A length beyond the address space can never fit any buffer
        let stored = usize::try_from(unit_value(&word[..unit])).unwrap_or(usize::MAX);
        if buf.len() <= stored {
            return Err(PersistError::BufferTooSmall {
                stored,
                capacity: buf.len(),
            });
        }

        let whole = stored - stored % unit;
        self.store.read(page, Self::HEADER_LEN, &mut buf[..whole])?;

        let tail = stored - whole;
        if tail > 0 {
            // Read the padded last unit, keep only the payload bytes
            self.store
                .read(page, Self::HEADER_LEN + whole, &mut word[..unit])?;
            buf[whole..stored].copy_from_slice(&word[..tail]);
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemPages, MockWatchdog, Op};
    use proptest::prelude::*;

    fn codec<const UNIT: usize>() -> Persistence<MemPages<UNIT, 256>, MockWatchdog> {
        let pages = MemPages::<UNIT, 256>::new();
        let watchdog = pages.watchdog();
        Persistence::new(BlockStore::new(pages, watchdog))
    }

    #[test]
    fn test_word_layout() {
        let mut codec = codec::<4>();
        codec.save(Page::FusionState, &[1, 2, 3, 4, 5]).unwrap();

        let page = codec.store().pages().page(Page::FusionState);
        assert_eq!(page[0..4], 0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(page[4..8], 5u32.to_le_bytes());
        assert_eq!(page[8..16], [1, 2, 3, 4, 5, 0xFF, 0xFF, 0xFF]);
        assert_eq!(page[16], 0xFF);
    }

    #[test]
    fn test_double_word_layout() {
        let mut codec = codec::<8>();
        codec.save(Page::Config, &[7; 3]).unwrap();

        let page = codec.store().pages().page(Page::Config);
        assert_eq!(page[0..8], CONFIG_MAGIC_DWORD.to_le_bytes());
        assert_eq!(page[8..16], 3u64.to_le_bytes());
        assert_eq!(page[16..24], [7, 7, 7, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_magic_differs_per_kind_and_width() {
        let tags = [
            magic(Page::FusionState, 4),
            magic(Page::Config, 4),
            magic(Page::FusionState, 8),
            magic(Page::Config, 8),
        ];
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_absent_block_leaves_buffer_untouched() {
        let mut codec = codec::<8>();
        let mut buf = [0x42u8; 32];
        assert_eq!(codec.load(Page::FusionState, &mut buf), Ok(0));
        assert_eq!(buf, [0x42u8; 32]);
    }

    #[test]
    fn test_other_kind_magic_is_absence() {
        let mut codec = codec::<4>();
        codec.save(Page::FusionState, &[1, 2, 3]).unwrap();

        // Copy the fusion block over the config page: wrong magic for that page
        let state = *codec.store().pages().page(Page::FusionState);
        let mut pages = MemPages::<4, 256>::new();
        *pages.page_mut(Page::Config) = state;
        let watchdog = pages.watchdog();
        let mut codec = Persistence::new(BlockStore::new(pages, watchdog));

        let mut buf = [0u8; 16];
        assert_eq!(codec.load(Page::Config, &mut buf), Ok(0));
    }

    #[test]
    fn test_capacity_must_exceed_length() {
        let mut codec = codec::<4>();
        codec.save(Page::Config, &[9u8; 10]).unwrap();

        let mut exact = [0u8; 10];
        assert_eq!(
            codec.load(Page::Config, &mut exact),
            Err(PersistError::BufferTooSmall {
                stored: 10,
                capacity: 10
            })
        );
        assert_eq!(exact, [0u8; 10]);

        let mut roomy = [0u8; 11];
        assert_eq!(codec.load(Page::Config, &mut roomy), Ok(10));
        assert_eq!(roomy[..10], [9u8; 10]);
        assert_eq!(roomy[10], 0);
    }

    #[test]
    fn test_corrupt_length_is_too_small() {
        let mut pages = MemPages::<8, 256>::new();
        let page = pages.page_mut(Page::Config);
        page[0..8].copy_from_slice(&CONFIG_MAGIC_DWORD.to_le_bytes());
        page[8..16].copy_from_slice(&u64::MAX.to_le_bytes());
        let watchdog = pages.watchdog();
        let mut codec = Persistence::new(BlockStore::new(pages, watchdog));

        let mut buf = [0x42u8; 64];
        assert_eq!(
            codec.load(Page::Config, &mut buf),
            Err(PersistError::BufferTooSmall {
                stored: usize::MAX,
                capacity: 64
            })
        );
        assert_eq!(buf, [0x42u8; 64]);
    }

    #[test]
    fn test_padding_never_written_past_length() {
        let mut codec = codec::<8>();
        codec.save(Page::Config, &[1, 2, 3]).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(codec.load(Page::Config, &mut buf), Ok(3));
        assert_eq!(buf, [1, 2, 3, 0]);
    }

    #[test]
    fn test_empty_payload() {
        let mut codec = codec::<4>();
        codec.save(Page::Config, &[]).unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(codec.load(Page::Config, &mut buf), Ok(0));
    }

    #[test]
    fn test_oversized_payload_keeps_previous_block() {
        let mut codec = codec::<4>();
        codec.save(Page::Config, &[1, 2, 3, 4]).unwrap();

        let huge = [0u8; 256];
        assert_eq!(codec.save(Page::Config, &huge), Err(PersistError::TooLarge));

        let mut buf = [0u8; 8];
        assert_eq!(codec.load(Page::Config, &mut buf), Ok(4));
    }

    #[test]
    fn test_save_erases_after_feed() {
        let mut codec = codec::<8>();
        let log = codec.store().pages().log();
        codec.save(Page::FusionState, &[0; 8]).unwrap();

        let log = log.borrow();
        assert_eq!(log[..2], [Op::Feed, Op::Erase(Page::FusionState)]);
    }

    #[test]
    fn test_erase_failure_is_fatal() {
        let mut pages = MemPages::<8, 256>::new();
        pages.fail_erase = true;
        let watchdog = pages.watchdog();
        let mut codec = Persistence::new(BlockStore::new(pages, watchdog));

        let err = codec.save(Page::Config, &[0; 4]).unwrap_err();
        assert!(err.is_fatal());
        assert!(!PersistError::TooLarge.is_fatal());
    }

    proptest! {
        #[test]
        fn test_payload_survives_save_and_load(payload in proptest::collection::vec(any::<u8>(), 0..200)) {
            let mut codec = codec::<8>();
            codec.save(Page::FusionState, &payload).unwrap();

            let mut buf = [0u8; 201];
            let n = codec.load(Page::FusionState, &mut buf).unwrap();
            prop_assert_eq!(&buf[..n], &payload[..]);
        }
    }
}
