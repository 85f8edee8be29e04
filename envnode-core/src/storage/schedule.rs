//! Fusion state save schedule

/// Samples between fusion state saves (about 24 h at one sample every 3 s)
pub const STATE_SAVE_INTERVAL: u32 = 28_800;

/// Counts samples and reports when the fusion state is due for a save
///
/// Each save erases a whole page, so saves are spaced far apart.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SaveInterval {
    every: u32,
    count: u32,
}

impl Default for SaveInterval {
    fn default() -> Self {
        Self::new(STATE_SAVE_INTERVAL)
    }
}

impl SaveInterval {
    /// Save every `every` samples (0 disables saving)
    pub const fn new(every: u32) -> Self {
        Self { every, count: 0 }
    }

    /// Count one sample; returns `true` when a save is due
    pub fn on_sample(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.count += 1;
        if self.count >= self.every {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Samples counted since the last save
    pub fn count(&self) -> u32 {
        self.count
    }
}
