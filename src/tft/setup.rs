//! Compile-time setup of the TFT panel
//!
//! Everything the display driver needs to know about the wiring lives here:
//! which controller is fitted, which GPIO carries which SPI signal, the panel
//! resolution and the bus clock. [`USER_SETUP`] is validated while compiling,
//! so a board with two roles on the same pin does not build.

use crate::tft::pins::{self, PinError, PinRole, Pins};
use crate::tft::{TFT_HEIGHT, TFT_WIDTH};

/// Display controllers the driver library can talk to on this board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// Sitronix ST7789, 240x320 frame memory
    St7789,
    /// Sitronix ST7735s, 132x162 frame memory
    St7735s,
    /// Ilitek ILI9341, 240x320 frame memory
    Ili9341,
    /// Galaxycore GC9A01, 240x240 round panels
    Gc9a01,
}

impl Driver {
    /// Frame memory size of the controller as (columns, rows)
    pub const fn frame_memory(self) -> (u16, u16) {
        match self {
            Driver::St7789 => (240, 320),
            Driver::St7735s => (132, 162),
            Driver::Ili9341 => (240, 320),
            Driver::Gc9a01 => (240, 240),
        }
    }

    /// Human readable controller name
    pub const fn name(self) -> &'static str {
        match self {
            Driver::St7789 => "ST7789",
            Driver::St7735s => "ST7735s",
            Driver::Ili9341 => "ILI9341",
            Driver::Gc9a01 => "GC9A01",
        }
    }
}

/// The controller fitted on this board
pub const DRIVER: Driver = Driver::St7789;

/// SPI bus clock in Hz. Reduce if the picture is unstable.
pub const SPI_FREQUENCY: u32 = 40_000_000;

/// Highest clock that is reliable over jumper wires
pub const MAX_SPI_FREQUENCY: u32 = 40_000_000;

/// Complete wiring and timing description of one TFT panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TftSetup {
    pub driver: Driver,
    pub mosi: u8,
    pub sclk: u8,
    pub cs: u8,
    pub dc: u8,
    pub rst: u8,
    pub width: u16,
    pub height: u16,
    pub spi_frequency: u32,
}

/// The setup this firmware is built for
pub const USER_SETUP: TftSetup = TftSetup {
    driver: DRIVER,
    mosi: Pins::MOSI,
    sclk: Pins::SCLK,
    cs: Pins::CS,
    dc: Pins::DC,
    rst: Pins::RST,
    width: TFT_WIDTH,
    height: TFT_HEIGHT,
    spi_frequency: SPI_FREQUENCY,
};

const _: () = assert!(
    USER_SETUP.validate().is_ok(),
    "invalid TFT setup: check pin assignments, panel size and SPI frequency"
);

impl TftSetup {
    /// Pin assignments paired with their roles, in wiring order
    pub const fn pins(&self) -> [(PinRole, u8); 5] {
        [
            (PinRole::Mosi, self.mosi),
            (PinRole::Sclk, self.sclk),
            (PinRole::Cs, self.cs),
            (PinRole::Dc, self.dc),
            (PinRole::Rst, self.rst),
        ]
    }

    /// Checks pins, panel size and bus clock
    pub const fn validate(&self) -> Result<(), SetupError> {
        if let Err(e) = pins::check_assignments(&self.pins()) {
            return Err(SetupError::Pin(e));
        }

        if self.width == 0 || self.height == 0 {
            return Err(SetupError::ZeroDimension);
        }
        // The panel may be mounted in landscape, so accept either orientation
        let (cols, rows) = self.driver.frame_memory();
        let fits = (self.width <= cols && self.height <= rows)
            || (self.width <= rows && self.height <= cols);
        if !fits {
            return Err(SetupError::PanelTooLarge {
                driver: self.driver,
                width: self.width,
                height: self.height,
            });
        }

        if self.spi_frequency == 0 {
            return Err(SetupError::ZeroFrequency);
        }
        if self.spi_frequency > MAX_SPI_FREQUENCY {
            return Err(SetupError::FrequencyTooHigh {
                hz: self.spi_frequency,
                max: MAX_SPI_FREQUENCY,
            });
        }
        Ok(())
    }

    /// Number of pixels on the panel
    pub const fn pixel_count(&self) -> u32 {
        self.width as u32 * self.height as u32
    }
}

/// Reasons a [`TftSetup`] is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    Pin(PinError),
    ZeroDimension,
    PanelTooLarge {
        driver: Driver,
        width: u16,
        height: u16,
    },
    ZeroFrequency,
    FrequencyTooHigh { hz: u32, max: u32 },
}

impl From<PinError> for SetupError {
    fn from(e: PinError) -> Self {
        SetupError::Pin(e)
    }
}

impl core::fmt::Display for SetupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SetupError::Pin(e) => write!(f, "{}", e),
            SetupError::ZeroDimension => write!(f, "panel width and height must be positive"),
            SetupError::PanelTooLarge {
                driver,
                width,
                height,
            } => {
                let (cols, rows) = driver.frame_memory();
                write!(
                    f,
                    "{}x{} panel does not fit {} frame memory ({}x{})",
                    width,
                    height,
                    driver.name(),
                    cols,
                    rows
                )
            }
            SetupError::ZeroFrequency => write!(f, "SPI frequency must be positive"),
            SetupError::FrequencyTooHigh { hz, max } => {
                write!(f, "SPI frequency {} Hz is above the {} Hz limit", hz, max)
            }
        }
    }
}

impl std::error::Error for SetupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_setup_matches_wiring() {
        let s = USER_SETUP;
        assert_eq!(s.driver, Driver::St7789);
        assert_eq!(
            (s.mosi, s.sclk, s.cs, s.dc, s.rst),
            (7, 6, 3, 2, 10)
        );
        assert_eq!((s.width, s.height), (240, 320));
        assert_eq!(s.spi_frequency, 40_000_000);
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn user_setup_pins_are_pairwise_distinct() {
        let pins = USER_SETUP.pins();
        for (i, (_, a)) in pins.iter().enumerate() {
            for (_, b) in &pins[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn every_pair_of_shared_pins_is_rejected() {
        let roles = [
            PinRole::Mosi,
            PinRole::Sclk,
            PinRole::Cs,
            PinRole::Dc,
            PinRole::Rst,
        ];
        for first in 0..roles.len() {
            for second in first + 1..roles.len() {
                let mut values = [7u8, 6, 3, 2, 10];
                values[second] = values[first];
                let setup = TftSetup {
                    mosi: values[0],
                    sclk: values[1],
                    cs: values[2],
                    dc: values[3],
                    rst: values[4],
                    ..USER_SETUP
                };
                assert_eq!(
                    setup.validate(),
                    Err(SetupError::Pin(PinError::Conflict {
                        first: roles[first],
                        second: roles[second],
                        pin: values[first],
                    }))
                );
            }
        }
    }

    #[test]
    fn flash_and_missing_pins_are_rejected() {
        let setup = TftSetup { rst: 14, ..USER_SETUP };
        assert_eq!(
            setup.validate(),
            Err(SetupError::Pin(PinError::Reserved {
                role: PinRole::Rst,
                pin: 14
            }))
        );

        let setup = TftSetup { cs: 40, ..USER_SETUP };
        assert_eq!(
            setup.validate(),
            Err(SetupError::Pin(PinError::OutOfRange {
                role: PinRole::Cs,
                pin: 40
            }))
        );
    }

    #[test]
    fn panel_size_is_checked_against_controller() {
        assert_eq!(
            TftSetup { width: 0, ..USER_SETUP }.validate(),
            Err(SetupError::ZeroDimension)
        );
        // Landscape mounting of the same panel
        assert_eq!(
            TftSetup {
                width: 320,
                height: 240,
                ..USER_SETUP
            }
            .validate(),
            Ok(())
        );
        let err = TftSetup {
            driver: Driver::Gc9a01,
            ..USER_SETUP
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "240x320 panel does not fit GC9A01 frame memory (240x240)"
        );
    }

    #[test]
    fn spi_frequency_limits() {
        assert_eq!(
            TftSetup {
                spi_frequency: 0,
                ..USER_SETUP
            }
            .validate(),
            Err(SetupError::ZeroFrequency)
        );
        assert_eq!(
            TftSetup {
                spi_frequency: 80_000_000,
                ..USER_SETUP
            }
            .validate(),
            Err(SetupError::FrequencyTooHigh {
                hz: 80_000_000,
                max: MAX_SPI_FREQUENCY
            })
        );
        assert_eq!(
            TftSetup {
                spi_frequency: 27_000_000,
                ..USER_SETUP
            }
            .validate(),
            Ok(())
        );
    }

    #[test]
    fn pixel_count() {
        assert_eq!(USER_SETUP.pixel_count(), 76_800);
    }
}
