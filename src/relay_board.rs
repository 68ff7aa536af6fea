use crate::gpio;
use crate::gpio::GpioError;
use crate::gpio::GpioInterface;
use crate::gpio::GpioOptions;
use crate::relay::Behavior;
use crate::relay::Relay;
use crate::relay_types::PinMode;

use log::debug;
use log::error;
use log::info;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::thread;
use std::time::Duration;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Unknown relay '{0}'")]
    UnknownRelay(String),

    #[error("Relay board has not been initialized")]
    NotInitialized,

    #[error(transparent)]
    Gpio(#[from] GpioError),
}

struct Slot {
    relay: Relay,
    // held for the whole actuation so pulses on one relay never overlap
    actuation: Mutex<()>,
}

/// Ordered registry of relays and the protocol used to actuate them.
///
/// Relays are added while the board is exclusively owned, then [`init`]
/// claims their pins. Once initialized the board is meant to be shared
/// (e.g. behind an `Arc`) and triggered from any number of threads.
///
/// [`init`]: RelayBoard::init
pub struct RelayBoard {
    options: GpioOptions,
    interface: Option<Arc<dyn GpioInterface>>,
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    initialized: bool,
}

impl RelayBoard {
    pub fn new() -> RelayBoard {
        RelayBoard::with_options(GpioOptions::default())
    }

    pub fn with_options(options: GpioOptions) -> RelayBoard {
        RelayBoard {
            options,
            interface: None,
            slots: Vec::new(),
            index: HashMap::new(),
            initialized: false,
        }
    }

    /// Uses `interface` instead of detecting the hardware on `init`.
    pub fn with_interface(interface: Arc<dyn GpioInterface>) -> RelayBoard {
        let mut board = RelayBoard::new();
        board.interface = Some(interface);
        board
    }

    /// Registers `relay`. A relay with the same id is replaced but keeps its position.
    pub fn add_relay(&mut self, relay: Relay) {
        if self.initialized {
            warn!(
                "Relay '{}' added after initialization, its channel is not set up",
                relay.id()
            );
        }
        match self.index.get(relay.id()) {
            Some(idx) => {
                debug!("Replacing relay '{}'", relay.id());
                self.slots[*idx].relay = relay;
            }
            None => {
                self.index.insert(relay.id().to_string(), self.slots.len());
                self.slots.push(Slot {
                    relay,
                    actuation: Mutex::new(()),
                });
            }
        }
    }

    pub fn options(&self) -> GpioOptions {
        self.options
    }

    pub fn relays(&self) -> impl ExactSizeIterator<Item = &Relay> {
        self.slots.iter().map(|slot| &slot.relay)
    }

    pub fn relay(&self, id: &str) -> Option<&Relay> {
        self.index.get(id).map(|idx| &self.slots[*idx].relay)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // false until init has run
    pub fn is_active(&self) -> bool {
        self.initialized
            && self
                .interface
                .as_ref()
                .map(|interface| interface.is_active())
                .unwrap_or(false)
    }

    pub fn init(&mut self) -> Result<(), BoardError> {
        if self.initialized {
            warn!("Relay board is already initialized");
            return Ok(());
        }

        let interface = self
            .interface
            .get_or_insert_with(|| gpio::init(&self.options))
            .clone();

        for slot in &self.slots {
            let relay = &slot.relay;
            debug!(
                "Setting up channel {} for relay '{}' resting {}",
                relay.pin(),
                relay.id(),
                relay.resting_level()
            );
            interface.init_channel(relay.pin(), PinMode::Output, Some(relay.resting_level()))?;
        }

        self.initialized = true;
        info!(
            "Relay board initialized with {} relay(s), hardware {}",
            self.slots.len(),
            match interface.is_active() {
                true => "active",
                false => "inactive",
            }
        );
        Ok(())
    }

    pub fn cleanup(&self) {
        if let Some(interface) = &self.interface {
            interface.cleanup();
        }
    }

    /// Actuates the relay registered under `id` and blocks until it is back
    /// at its resting level.
    pub fn trigger_relay(&self, id: &str) -> Result<(), BoardError> {
        let slot = match self.index.get(id) {
            Some(idx) => &self.slots[*idx],
            None => return Err(BoardError::UnknownRelay(id.to_string())),
        };
        let interface = match (&self.interface, self.initialized) {
            (Some(interface), true) => interface,
            _ => return Err(BoardError::NotInitialized),
        };

        let _guard = slot.actuation.lock().unwrap_or_else(PoisonError::into_inner);
        let relay = &slot.relay;

        info!("Triggering channel {} (relay '{}')", relay.pin(), relay.id());
        let started = Instant::now();
        match relay.behavior() {
            Behavior::Impulse { duration } => impulse(&**interface, relay, duration)?,
        }
        debug!(
            "Relay '{}' back at {} after {:?}",
            relay.id(),
            relay.resting_level(),
            started.elapsed()
        );
        Ok(())
    }
}

impl Default for RelayBoard {
    fn default() -> Self {
        RelayBoard::new()
    }
}

fn impulse(
    interface: &dyn GpioInterface,
    relay: &Relay,
    duration: Duration,
) -> Result<(), GpioError> {
    interface.output(relay.pin(), relay.actuated_level())?;
    thread::sleep(duration);
    interface
        .output(relay.pin(), relay.resting_level())
        .map_err(|e| {
            error!(
                "Failed to restore channel {} (relay '{}') to {}: {}",
                relay.pin(),
                relay.id(),
                relay.resting_level(),
                e
            );
            e
        })
}
