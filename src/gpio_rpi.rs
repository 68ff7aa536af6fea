use crate::gpio;
use crate::gpio::GpioError;
use crate::gpio::GpioInterface;
use crate::gpio::GpioOptions;
use crate::relay_types::Level;
use crate::relay_types::PinMode;

use log::debug;
use log::trace;
use rppal::gpio::Gpio;
use rppal::gpio::InputPin;
use rppal::gpio::Mode;
use rppal::gpio::OutputPin;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::PoisonError;

enum Claimed {
    Output(OutputPin),
    Input(InputPin),
}

pub struct RpiGpio {
    gpio: Gpio,
    options: GpioOptions,
    claimed: Mutex<BTreeMap<u8, Claimed>>,
}

impl RpiGpio {
    pub fn open(options: &GpioOptions) -> Result<RpiGpio, rppal::gpio::Error> {
        let gpio = Gpio::new()?;
        Ok(RpiGpio {
            gpio,
            options: *options,
            claimed: Mutex::new(BTreeMap::new()),
        })
    }

    fn line(&self, channel: u32) -> Result<u8, GpioError> {
        self.options
            .mode
            .to_bcm(channel)
            .and_then(|line| u8::try_from(line).ok())
            .ok_or(GpioError::InvalidChannel {
                channel,
                mode: self.options.mode,
            })
    }
}

fn pin_mode(mode: Mode) -> Option<PinMode> {
    match mode {
        Mode::Input => Some(PinMode::Input),
        Mode::Output => Some(PinMode::Output),
        _ => None,
    }
}

impl GpioInterface for RpiGpio {
    fn is_active(&self) -> bool {
        true
    }

    fn init_channel(
        &self,
        channel: u32,
        mode: PinMode,
        initial: Option<Level>,
    ) -> Result<(), GpioError> {
        let line = self.line(channel)?;
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);

        // hand the line back without resetting it, it is configured again right away
        let reclaimed = match claimed.remove(&line) {
            Some(Claimed::Output(mut pin)) => {
                pin.set_reset_on_drop(false);
                true
            }
            Some(Claimed::Input(mut pin)) => {
                pin.set_reset_on_drop(false);
                true
            }
            None => false,
        };

        let pin = self.gpio.get(line)?;
        gpio::warn_if_in_use(&self.options, channel, reclaimed, pin_mode(pin.mode()));

        let pin = match (mode, initial) {
            (PinMode::Output, Some(Level::High)) => Claimed::Output(pin.into_output_high()),
            (PinMode::Output, Some(Level::Low)) => Claimed::Output(pin.into_output_low()),
            (PinMode::Output, None) => Claimed::Output(pin.into_output()),
            (PinMode::Input, _) => Claimed::Input(pin.into_input()),
        };
        claimed.insert(line, pin);

        debug!(
            "Set up channel {} (BCM {}) as {} {}",
            channel,
            line,
            mode,
            initial.map(|l| l.to_string()).unwrap_or_default()
        );
        Ok(())
    }

    fn output(&self, channel: u32, level: Level) -> Result<(), GpioError> {
        let line = self.line(channel)?;
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        match claimed.get_mut(&line) {
            Some(Claimed::Output(pin)) => {
                trace!("Channel {} -> {}", channel, level);
                match level {
                    Level::High => pin.set_high(),
                    Level::Low => pin.set_low(),
                }
                Ok(())
            }
            _ => Err(GpioError::ChannelNotConfigured(channel)),
        }
    }

    fn cleanup(&self) {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Released {} GPIO channel(s)", claimed.len());
        // dropping the pins restores their previous mode
        claimed.clear();
    }
}
