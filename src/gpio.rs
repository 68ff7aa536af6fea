//! Hardware interface between logical pin operations and the GPIO driver.
//!
//! [`init`] is the only place that decides whether real hardware is used. It
//! tries the rppal driver first and falls back to [`SimulatedGpio`], so
//! callers never branch on hardware presence themselves.

#[cfg(target_os = "linux")]
use crate::gpio_rpi::RpiGpio;
use crate::gpio_sim::SimulatedGpio;
use crate::relay_types::Level;
use crate::relay_types::NumberingMode;
use crate::relay_types::PinMode;

#[cfg(target_os = "linux")]
use log::info;
use log::warn;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GpioOptions {
    /// Report channels that are already in use when they get configured.
    pub warnings: bool,
    pub mode: NumberingMode,
}

#[derive(Debug, Error)]
pub enum GpioError {
    #[error("Channel {channel} is not a valid GPIO channel in {mode} numbering")]
    InvalidChannel { channel: u32, mode: NumberingMode },

    #[error("Channel {0} has not been set up as an output")]
    ChannelNotConfigured(u32),

    #[cfg(target_os = "linux")]
    #[error(transparent)]
    Driver(#[from] rppal::gpio::Error),
}

pub trait GpioInterface: Send + Sync {
    fn is_active(&self) -> bool;

    /// For outputs with an `initial` level the pin is driven to that level
    /// as part of the configuration.
    fn init_channel(
        &self,
        channel: u32,
        mode: PinMode,
        initial: Option<Level>,
    ) -> Result<(), GpioError>;

    fn output(&self, channel: u32, level: Level) -> Result<(), GpioError>;

    /// Must be safe to call repeatedly.
    fn cleanup(&self);
}

/// Logs when a channel this process has not claimed is already driven as an
/// output by someone else. Returns whether it warned.
pub(crate) fn warn_if_in_use(
    options: &GpioOptions,
    channel: u32,
    claimed: bool,
    current: Option<PinMode>,
) -> bool {
    let in_use = options.warnings && !claimed && current == Some(PinMode::Output);
    if in_use {
        warn!("Channel {} is already in use, continuing anyway", channel);
    }
    in_use
}

#[cfg(target_os = "linux")]
pub fn init(options: &GpioOptions) -> Arc<dyn GpioInterface> {
    match RpiGpio::open(options) {
        Ok(gpio) => {
            info!(
                "GPIO hardware detected (numbering {}, warnings {})",
                options.mode, options.warnings
            );
            Arc::new(gpio)
        }
        Err(e) => {
            warn!("GPIO operations are not supported on this device: {}", e);
            Arc::new(SimulatedGpio::new(options.mode))
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn init(options: &GpioOptions) -> Arc<dyn GpioInterface> {
    warn!("GPIO operations are not supported on this platform");
    Arc::new(SimulatedGpio::new(options.mode))
}
