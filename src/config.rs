//! Serial link configuration
//!
//! Defaults mirror what the desktop companion uses out of the box.

use crate::tft::pins::{self, PinError, PinRole, Pins};
use crate::tft::setup::USER_SETUP;

/// Settings for the link to the desktop companion
///
/// The companion talks to the USB Serial/JTAG controller's CDC port. The
/// console stays on UART0 (see `sdkconfig.defaults`) so log output never
/// lands in the companion's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// The companion's `SerialBaudRate`. USB CDC ignores it, it is logged so
    /// a mismatched companion setup is easy to spot.
    pub baud_rate: u32,
    /// USB D- pin
    pub usb_dm: u8,
    /// USB D+ pin
    pub usb_dp: u8,
    /// Driver receive buffer, large enough to absorb an album art burst
    pub rx_buffer: usize,
    /// Bytes taken from the driver per read
    pub read_chunk: usize,
    /// Sleep between non-blocking reads that returned nothing, in milliseconds
    pub poll_interval_ms: u32,
}

pub const SERIAL: SerialConfig = SerialConfig {
    baud_rate: 921_600,
    usb_dm: Pins::USB_DM,
    usb_dp: Pins::USB_DP,
    rx_buffer: 4096,
    read_chunk: 256,
    poll_interval_ms: 10,
};

/// Bounds on what the companion may send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkLimits {
    /// Longest accepted text command, terminator excluded
    pub max_line: usize,
    /// Largest accepted album art payload
    pub max_image: usize,
    /// Titles are cut to this many characters
    pub max_title_chars: usize,
}

pub const LIMITS: LinkLimits = LinkLimits {
    max_line: 512,
    max_image: 64 * 1024,
    max_title_chars: 35,
};

/// Every GPIO the firmware claims, display and serial link together
pub const BOARD_PINS: [(PinRole, u8); 7] = {
    let display = USER_SETUP.pins();
    [
        display[0],
        display[1],
        display[2],
        display[3],
        display[4],
        (PinRole::UsbDm, SERIAL.usb_dm),
        (PinRole::UsbDp, SERIAL.usb_dp),
    ]
};

const _: () = assert!(
    pins::check_assignments(&BOARD_PINS).is_ok(),
    "serial link pins collide with the display wiring"
);

/// Checks the complete board pin map
pub fn validate_board() -> Result<(), PinError> {
    pins::check_assignments(&BOARD_PINS)
}
