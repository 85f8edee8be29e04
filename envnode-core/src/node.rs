//! Run-loop context
//!
//! [`Node`] owns everything the run loop mutates: the configuration record,
//! the line buffer, the shell and the reporter. The firmware drains its
//! event queue into these entry points one event at a time, so no state is
//! shared with interrupt context.

use envnode_hal::ReplySink;
use envnode_protocol::{Feed, ShellLine};

use crate::config::{DeviceConfig, FusionSettings};
use crate::report::{FusionOutput, Reporter, TickOutcome};
use crate::shell::{Identity, Outcome, Shell};
use crate::storage::SaveInterval;

/// Sensor node state
pub struct Node {
    config: DeviceConfig,
    line: ShellLine,
    shell: Shell,
    reporter: Reporter,
    state_saves: SaveInterval,
}

impl Node {
    /// Create the node around a loaded (or default) configuration
    pub fn new(config: DeviceConfig, identity: Identity, state_saves: SaveInterval) -> Self {
        Self {
            config,
            line: ShellLine::new(),
            shell: Shell::new(identity),
            reporter: Reporter::new(),
            state_saves,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Settings for the fusion collaborator
    pub fn fusion_settings(&self) -> FusionSettings {
        self.config.fusion_settings()
    }

    /// Apply one received byte
    ///
    /// Returns the shell outcome when the byte completed a line. The line
    /// buffer is cleared afterwards however the line ended.
    pub fn on_byte<S: ReplySink>(&mut self, byte: u8, uptime_ms: u64, sink: &mut S) -> Option<Outcome> {
        if self.line.feed(byte) != Feed::Ready {
            return None;
        }

        let line = self.line.line().unwrap_or(&[]);
        let mut outcome = self.shell.execute(line, &mut self.config, uptime_ms, sink);
        outcome.line_overflowed = self.line.overflowed();
        self.line.clear();
        Some(outcome)
    }

    /// Apply one fusion output
    ///
    /// Returns `true` when the fusion state is due to be saved.
    pub fn on_fusion_output(&mut self, output: &FusionOutput) -> bool {
        self.reporter.on_fusion_output(output, self.config.format);
        self.state_saves.on_sample()
    }

    /// Advance one second
    pub fn on_tick<S: ReplySink>(&mut self, sink: &mut S) -> TickOutcome {
        self.reporter.on_tick(&self.config, sink)
    }
}
