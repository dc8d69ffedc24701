#[cfg(target_os = "espidf")]
use deskthing_display::{
    config::{self, LIMITS, SERIAL},
    session::Session,
    tft::setup::Driver,
};
use deskthing_display::USER_SETUP;

#[cfg(target_os = "espidf")]
mod board;

// Splash screen pre-converted to RGB565 at build time, empty without splash.png
#[cfg(target_os = "espidf")]
const SPLASH_IMAGE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/splash.bin"));

#[cfg(target_os = "espidf")]
const SPLASH_MS: u32 = 1500;

// https://docs.esp-rs.org/esp-idf-svc/esp_idf_svc/
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_svc::hal::delay::Delay;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use mipidsi::models::{GC9A01, ILI9341Rgb565, ST7735s, ST7789};

    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    // Both are checked at compile time already, this only reports them
    USER_SETUP.validate()?;
    config::validate_board()?;
    log::info!("TFT setup: {:?}", USER_SETUP);

    let peripherals = Peripherals::take()?;
    let mut delay = Delay::default();

    let spi = board::spi(peripherals.spi2, &USER_SETUP)?;
    let (interface, rst) = board::interface(spi, &USER_SETUP)?;
    let mut serial = board::serial(
        peripherals.usb_serial,
        peripherals.pins.gpio18,
        peripherals.pins.gpio19,
        &SERIAL,
    )?;

    match USER_SETUP.driver {
        Driver::St7789 => {
            let mut tft = board::display(ST7789, interface, rst, &USER_SETUP, &mut delay)?;
            run(&mut tft, &mut serial, &mut delay)
        }
        Driver::St7735s => {
            let mut tft = board::display(ST7735s, interface, rst, &USER_SETUP, &mut delay)?;
            run(&mut tft, &mut serial, &mut delay)
        }
        Driver::Ili9341 => {
            let mut tft = board::display(ILI9341Rgb565, interface, rst, &USER_SETUP, &mut delay)?;
            run(&mut tft, &mut serial, &mut delay)
        }
        Driver::Gc9a01 => {
            let mut tft = board::display(GC9A01, interface, rst, &USER_SETUP, &mut delay)?;
            run(&mut tft, &mut serial, &mut delay)
        }
    }
}

/// Reads the serial link forever and keeps the panel up to date
#[cfg(target_os = "espidf")]
fn run<D>(
    display: &mut D,
    serial: &mut esp_idf_svc::hal::usb_serial::UsbSerialDriver<'_>,
    delay: &mut impl embedded_hal::delay::DelayNs,
) -> anyhow::Result<()>
where
    D: embedded_graphics::draw_target::DrawTarget<
        Color = embedded_graphics::pixelcolor::Rgb565,
        Error = display_interface::DisplayError,
    >,
{
    use esp_idf_svc::hal::delay::{FreeRtos, BLOCK, NON_BLOCK};

    let mut session = Session::new(LIMITS);

    let shown = session
        .splash(SPLASH_IMAGE, display)
        .map_err(|e| anyhow::anyhow!("Failed to draw splash: {:?}", e))?;
    if shown {
        delay.delay_ms(SPLASH_MS);
    } else {
        log::warn!("Splash image not available (splash.png not found at build time)");
    }

    session
        .start(display)
        .map_err(|e| anyhow::anyhow!("Failed to draw dashboard: {:?}", e))?;
    log::info!("Waiting for the desktop companion");

    let mut buf = vec![0u8; SERIAL.read_chunk];
    loop {
        let n = match serial.read(&mut buf, NON_BLOCK) {
            Ok(n) => n,
            Err(e) => {
                log::error!("Serial read failed: {:?}", e);
                0
            }
        };
        if n == 0 {
            FreeRtos::delay_ms(SERIAL.poll_interval_ms);
            continue;
        }

        match session.handle(&buf[..n], display) {
            Ok(replies) => {
                for reply in replies {
                    let line = format!("{}\n", reply);
                    let mut rest = line.as_bytes();
                    while !rest.is_empty() {
                        match serial.write(rest, BLOCK) {
                            Ok(written) => rest = &rest[written..],
                            Err(e) => {
                                log::error!("Serial write failed: {:?}", e);
                                break;
                            }
                        }
                    }
                }
            }
            // Bands that failed stay pending and are retried with the next input
            Err(e) => log::error!("Display update failed: {:?}", e),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    // Host builds exist for the library tests only
    eprintln!(
        "deskthing-display is firmware for the ESP32-C3, build it for riscv32imc-esp-espidf ({:?})",
        USER_SETUP.driver
    );
}
