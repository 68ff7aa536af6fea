//! Relays wired to GPIO pins, triggered by id.
//!
//! A [`RelayBoard`] is filled from a [`Config`], initialized once, and then
//! shared with whoever triggers relays. Hosts without GPIO hardware get a
//! simulated interface, so everything above the hardware layer runs anywhere.

mod assert;
pub mod config;
pub mod gpio;
#[cfg(target_os = "linux")]
mod gpio_rpi;
pub mod gpio_sim;
pub mod relay;
pub mod relay_board;
pub mod relay_types;

pub use config::Config;
pub use config::ConfigError;
pub use gpio::GpioError;
pub use gpio::GpioInterface;
pub use gpio::GpioOptions;
pub use gpio_sim::PinOperation;
pub use gpio_sim::SimulatedGpio;
pub use relay::Behavior;
pub use relay::InvalidRelay;
pub use relay::Relay;
pub use relay_board::BoardError;
pub use relay_board::RelayBoard;
pub use relay_types::Level;
pub use relay_types::NumberingMode;
pub use relay_types::PinMode;
