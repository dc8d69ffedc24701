//! Desk display firmware for an ESP32-C3 with an ST7789 TFT
//!
//! A desktop companion streams CPU/GPU temperature, RAM usage, the current
//! media title, an audio spectrum and album art over the serial line. This
//! crate holds everything that does not touch ESP-IDF directly:
//!
//! - [`tft`]: the panel setup (driver selector, pins, size, SPI clock), validated at compile time
//! - [`config`]: serial link settings and limits
//! - [`protocol`]: decoding of the companion's byte stream
//! - [`dashboard`] and [`ui`]: state and drawing with [`embedded_graphics`]
//! - [`session`]: ties the above together for the firmware main loop
//!
//! The binary brings up SPI, the USB serial link and the [`mipidsi`] display driver from these values.
#![allow(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod dashboard;
pub mod protocol;
pub mod session;
pub mod tft;
pub mod ui;

pub use crate::tft::pins::Pins;
pub use crate::tft::setup::{Driver, SetupError, TftSetup, USER_SETUP};
