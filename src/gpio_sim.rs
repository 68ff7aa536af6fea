use crate::gpio::GpioError;
use crate::gpio::GpioInterface;
use crate::relay_types::Level;
use crate::relay_types::NumberingMode;
use crate::relay_types::PinMode;

use log::debug;
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

// oldest operations are dropped beyond this
pub const JOURNAL_CAPACITY: usize = 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PinOperation {
    Setup {
        channel: u32,
        mode: PinMode,
        initial: Option<Level>,
    },
    Output {
        channel: u32,
        level: Level,
    },
    Cleanup,
}

impl PinOperation {
    pub fn channel(&self) -> Option<u32> {
        match self {
            PinOperation::Setup { channel, .. } => Some(*channel),
            PinOperation::Output { channel, .. } => Some(*channel),
            PinOperation::Cleanup => None,
        }
    }
}

#[derive(Default)]
struct Journal {
    operations: VecDeque<PinOperation>,
    levels: BTreeMap<u32, Level>,
}

impl Journal {
    fn record(&mut self, operation: PinOperation) {
        if self.operations.len() == JOURNAL_CAPACITY {
            self.operations.pop_front();
        }
        self.operations.push_back(operation);
    }
}

/// Stand-in for hosts without GPIO hardware.
///
/// Nothing physical happens, but every call is logged and the most recent
/// ones are journaled so the pin activity stays observable.
pub struct SimulatedGpio {
    mode: NumberingMode,
    journal: Mutex<Journal>,
}

impl SimulatedGpio {
    pub fn new(mode: NumberingMode) -> SimulatedGpio {
        SimulatedGpio {
            mode,
            journal: Mutex::new(Journal::default()),
        }
    }

    pub fn operations(&self) -> Vec<PinOperation> {
        self.journal().operations.iter().copied().collect()
    }

    pub fn operations_on(&self, channel: u32) -> Vec<PinOperation> {
        self.journal()
            .operations
            .iter()
            .filter(|op| op.channel() == Some(channel))
            .copied()
            .collect()
    }

    /// Levels written to `channel` by `output`, in order.
    pub fn outputs_on(&self, channel: u32) -> Vec<Level> {
        self.journal()
            .operations
            .iter()
            .filter_map(|op| match op {
                PinOperation::Output { channel: c, level } if *c == channel => Some(*level),
                _ => None,
            })
            .collect()
    }

    /// Last level the channel was driven to, if it is a configured output.
    pub fn level(&self, channel: u32) -> Option<Level> {
        self.journal().levels.get(&channel).copied()
    }

    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedGpio {
    fn default() -> Self {
        SimulatedGpio::new(NumberingMode::default())
    }
}

impl GpioInterface for SimulatedGpio {
    fn is_active(&self) -> bool {
        false
    }

    fn init_channel(
        &self,
        channel: u32,
        mode: PinMode,
        initial: Option<Level>,
    ) -> Result<(), GpioError> {
        debug!(
            "Simulated setup of {} channel {} as {} {}",
            self.mode,
            channel,
            mode,
            initial.map(|l| l.to_string()).unwrap_or_default()
        );
        let mut journal = self.journal();
        match (mode, initial) {
            (PinMode::Output, Some(level)) => {
                journal.levels.insert(channel, level);
            }
            (PinMode::Output, None) => {}
            (PinMode::Input, _) => {
                journal.levels.remove(&channel);
            }
        }
        journal.record(PinOperation::Setup {
            channel,
            mode,
            initial,
        });
        Ok(())
    }

    fn output(&self, channel: u32, level: Level) -> Result<(), GpioError> {
        debug!("Simulated output {} channel {} -> {}", self.mode, channel, level);
        let mut journal = self.journal();
        journal.levels.insert(channel, level);
        journal.record(PinOperation::Output { channel, level });
        Ok(())
    }

    fn cleanup(&self) {
        debug!("Simulated GPIO cleanup");
        let mut journal = self.journal();
        journal.levels.clear();
        journal.record(PinOperation::Cleanup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_never_active() {
        assert!(!SimulatedGpio::default().is_active());
    }

    #[test]
    fn tracks_levels_and_operations() {
        let gpio = SimulatedGpio::default();
        gpio.init_channel(5, PinMode::Output, Some(Level::High)).unwrap();
        gpio.output(5, Level::Low).unwrap();
        gpio.output(6, Level::High).unwrap();

        assert_eq!(gpio.level(5), Some(Level::Low));
        assert_eq!(gpio.outputs_on(5), vec![Level::Low]);
        assert_eq!(
            gpio.operations_on(5),
            vec![
                PinOperation::Setup {
                    channel: 5,
                    mode: PinMode::Output,
                    initial: Some(Level::High)
                },
                PinOperation::Output {
                    channel: 5,
                    level: Level::Low
                },
            ]
        );
    }

    #[test]
    fn journal_keeps_only_recent_operations() {
        let gpio = SimulatedGpio::default();
        gpio.init_channel(5, PinMode::Output, Some(Level::High)).unwrap();
        for _ in 0..10_000 {
            gpio.output(5, Level::Low).unwrap();
            gpio.output(5, Level::High).unwrap();
        }
        gpio.cleanup();

        let operations = gpio.operations();
        assert_eq!(operations.len(), JOURNAL_CAPACITY);
        assert_eq!(operations.last(), Some(&PinOperation::Cleanup));
        assert_eq!(
            operations[operations.len() - 2],
            PinOperation::Output {
                channel: 5,
                level: Level::High
            }
        );
    }

    #[test]
    fn cleanup_forgets_levels() {
        let gpio = SimulatedGpio::default();
        gpio.init_channel(5, PinMode::Output, Some(Level::Low)).unwrap();
        gpio.cleanup();
        gpio.cleanup();
        assert_eq!(gpio.level(5), None);
        assert_eq!(gpio.operations().last(), Some(&PinOperation::Cleanup));
    }
}
