use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    #[default]
    High,
    Low,
}

impl Level {
    pub fn inverted(self) -> Level {
        match self {
            Level::High => Level::Low,
            Level::Low => Level::High,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Level::High => write!(f, "HIGH"),
            Level::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum PinMode {
    Input,
    Output,
}

impl Display for PinMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PinMode::Input => write!(f, "IN"),
            PinMode::Output => write!(f, "OUT"),
        }
    }
}

/// Pin numbering scheme used to interpret channel numbers.
///
/// `Bcm` addresses the SoC's GPIO lines directly, `Board` addresses the
/// physical pins of the 40-pin header.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NumberingMode {
    #[default]
    Bcm,
    Board,
}

// Header pin -> BCM line for the 40-pin header. `None` marks power and ground pins.
const BOARD_TO_BCM: [Option<u8>; 41] = [
    None,
    None,     // 1  3V3
    None,     // 2  5V
    Some(2),  // 3
    None,     // 4  5V
    Some(3),  // 5
    None,     // 6  GND
    Some(4),  // 7
    Some(14), // 8
    None,     // 9  GND
    Some(15), // 10
    Some(17), // 11
    Some(18), // 12
    Some(27), // 13
    None,     // 14 GND
    Some(22), // 15
    Some(23), // 16
    None,     // 17 3V3
    Some(24), // 18
    Some(10), // 19
    None,     // 20 GND
    Some(9),  // 21
    Some(25), // 22
    Some(11), // 23
    Some(8),  // 24
    None,     // 25 GND
    Some(7),  // 26
    Some(0),  // 27
    Some(1),  // 28
    Some(5),  // 29
    None,     // 30 GND
    Some(6),  // 31
    Some(12), // 32
    Some(13), // 33
    None,     // 34 GND
    Some(19), // 35
    Some(16), // 36
    Some(26), // 37
    Some(20), // 38
    None,     // 39 GND
    Some(21), // 40
];

impl NumberingMode {
    pub fn to_bcm(self, channel: u32) -> Option<u32> {
        match self {
            NumberingMode::Bcm => Some(channel),
            NumberingMode::Board => BOARD_TO_BCM
                .get(channel as usize)
                .copied()
                .flatten()
                .map(u32::from),
        }
    }
}

impl Display for NumberingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NumberingMode::Bcm => write!(f, "BCM"),
            NumberingMode::Board => write!(f, "BOARD"),
        }
    }
}
