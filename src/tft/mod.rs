//! ST7789 TFT panel setup
//!
//! Used with a bare 2.0" 240x320 ST7789 module wired to an ESP32-C3 SuperMini.
//!
//! This module does not drive the panel itself. The controller command set,
//! reset sequence and pixel addressing come from [`mipidsi`]; this module only
//! describes the board so the driver can be brought up with the right values:
//!
//! 1. [`setup::DRIVER`] selects the controller profile
//! 1. [`pins::Pins`] maps SPI and control signals to GPIOs
//! 1. [`TFT_WIDTH`], [`TFT_HEIGHT`] and [`setup::SPI_FREQUENCY`] size the panel and bus
//!
//! [`setup::USER_SETUP`] bundles all of it and is validated at compile time.

pub mod pins;
pub mod setup;

/// Display width, pixels horizontally
pub const TFT_WIDTH: u16 = 240;

/// Display height, pixels vertically
pub const TFT_HEIGHT: u16 = 320;
