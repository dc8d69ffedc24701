//! Pin definitions for the ST7789 TFT panel and the serial link
//!
//! This module contains all GPIO pin assignments used in the hardware configuration.

/// Pin configuration constants for the TFT panel and peripherals
pub struct Pins;

impl Pins {
    // SPI Display pins
    /// SPI Master Out Slave In
    pub const MOSI: u8 = 7;
    /// SPI Clock pin
    pub const SCLK: u8 = 6;
    /// Chip Select pin for SPI display
    pub const CS: u8 = 3;
    /// Data/Command control pin (High for data, Low for command)
    pub const DC: u8 = 2;
    /// Reset pin for display
    pub const RST: u8 = 10;

    // Serial link to the desktop companion, the on-chip USB Serial/JTAG port.
    // These are fixed in silicon and only listed so nothing else claims them.
    /// USB D-
    pub const USB_DM: u8 = 18;
    /// USB D+
    pub const USB_DP: u8 = 19;
}

/// The role a GPIO plays on the board, used when reporting pin problems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    Mosi,
    Sclk,
    Cs,
    Dc,
    Rst,
    UsbDm,
    UsbDp,
}

impl PinRole {
    /// Short name as printed on wiring diagrams
    pub const fn name(self) -> &'static str {
        match self {
            PinRole::Mosi => "MOSI",
            PinRole::Sclk => "SCLK",
            PinRole::Cs => "CS",
            PinRole::Dc => "DC",
            PinRole::Rst => "RST",
            PinRole::UsbDm => "USB_D-",
            PinRole::UsbDp => "USB_D+",
        }
    }
}

impl core::fmt::Display for PinRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Highest GPIO number on the ESP32-C3
pub const GPIO_MAX: u8 = 21;

/// GPIOs wired to the on-package SPI flash, unusable for anything else
pub const FLASH_PINS: (u8, u8) = (12, 17);

/// Whether `pin` can be driven by user code on this chip
pub const fn is_usable_gpio(pin: u8) -> bool {
    pin <= GPIO_MAX && !is_flash_pin(pin)
}

/// Whether `pin` belongs to the flash interface
pub const fn is_flash_pin(pin: u8) -> bool {
    pin >= FLASH_PINS.0 && pin <= FLASH_PINS.1
}

/// Checks that every assignment is a usable GPIO and no two roles share a pin
///
/// Written with `while` loops so it can run in const context.
pub const fn check_assignments(pins: &[(PinRole, u8)]) -> Result<(), PinError> {
    let mut i = 0;
    while i < pins.len() {
        let (role, pin) = pins[i];
        if pin > GPIO_MAX {
            return Err(PinError::OutOfRange { role, pin });
        }
        if is_flash_pin(pin) {
            return Err(PinError::Reserved { role, pin });
        }
        let mut j = i + 1;
        while j < pins.len() {
            if pins[j].1 == pin {
                return Err(PinError::Conflict {
                    first: role,
                    second: pins[j].0,
                    pin,
                });
            }
            j += 1;
        }
        i += 1;
    }
    Ok(())
}

/// A problem with a pin assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    /// The pin number does not exist on the chip
    OutOfRange { role: PinRole, pin: u8 },
    /// The pin exists but is taken by the flash interface
    Reserved { role: PinRole, pin: u8 },
    /// Two roles resolve to the same physical pin
    Conflict {
        first: PinRole,
        second: PinRole,
        pin: u8,
    },
}

impl core::fmt::Display for PinError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PinError::OutOfRange { role, pin } => {
                write!(f, "{} pin {} is not a GPIO (max {})", role, pin, GPIO_MAX)
            }
            PinError::Reserved { role, pin } => {
                write!(f, "{} pin {} is wired to the SPI flash", role, pin)
            }
            PinError::Conflict { first, second, pin } => {
                write!(f, "{} and {} both use GPIO{}", first, second, pin)
            }
        }
    }
}

impl std::error::Error for PinError {}
