use crate::assert::assert;
use crate::relay_types::Level;

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_IMPULSE_TIME: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
#[error("Invalid relay: {message}")]
pub struct InvalidRelay {
    message: String,
}

impl InvalidRelay {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// How a relay is actuated when triggered.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Behavior {
    /// Drive the pin away from its resting level for `duration`, then restore it.
    Impulse { duration: Duration },
}

impl Behavior {
    pub fn impulse_secs(secs: f64) -> Result<Behavior, InvalidRelay> {
        assert(
            || secs.is_finite() && secs > 0.0,
            format!("Impulse time must be a positive number of seconds, got {}", secs),
        )?;
        let duration = Duration::try_from_secs_f64(secs)
            .map_err(|e| InvalidRelay::new(format!("Impulse time {} is out of range: {}", secs, e)))?;
        Ok(Behavior::Impulse { duration })
    }

    fn validate(&self) -> Result<(), InvalidRelay> {
        match self {
            Behavior::Impulse { duration } => assert(
                || !duration.is_zero(),
                "Impulse time must not be zero",
            ),
        }
    }
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior::Impulse {
            duration: DEFAULT_IMPULSE_TIME,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relay {
    id: String,
    name: String,
    pin: u32,
    resting_level: Level,
    behavior: Behavior,
}

impl Relay {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        id: S1,
        name: S2,
        pin: u32,
    ) -> Result<Relay, InvalidRelay> {
        let id = id.into();
        assert(|| !id.trim().is_empty(), "Relay id must not be empty")?;
        Ok(Relay {
            id,
            name: name.into(),
            pin,
            resting_level: Level::default(),
            behavior: Behavior::default(),
        })
    }

    pub fn with_resting_level(mut self, resting_level: Level) -> Relay {
        self.resting_level = resting_level;
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Result<Relay, InvalidRelay> {
        behavior.validate()?;
        self.behavior = behavior;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn resting_level(&self) -> Level {
        self.resting_level
    }

    /// Level the pin is driven to while the relay is actuated.
    pub fn actuated_level(&self) -> Level {
        self.resting_level.inverted()
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }
}
