//! ESP-IDF bring-up of the SPI bus, TFT driver and USB serial link
//!
//! Pins are created from their numbers in `Pins` rather than from the typed
//! `peripherals.pins` fields, so the wiring is defined in exactly one place.
//! The USB pins are the exception: they are fixed in silicon and the driver
//! takes them typed.

use anyhow::{anyhow, Context, Result};
use display_interface_spi::SPIInterface;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::delay::DelayNs;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Gpio18, Gpio19, Output, PinDriver};
use esp_idf_svc::hal::spi::{self, SpiDeviceDriver, SpiDriver, SPI2};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::hal::usb_serial::{UsbSerialConfig, UsbSerialDriver, USB_SERIAL};
use mipidsi::models::Model;
use mipidsi::options::ColorInversion;
use mipidsi::{Builder, Display};

use deskthing_display::config::SerialConfig;
use deskthing_display::TftSetup;

pub type Spi = SpiDeviceDriver<'static, SpiDriver<'static>>;
pub type OutPin = PinDriver<'static, AnyOutputPin, Output>;
pub type Interface = SPIInterface<Spi, OutPin>;
pub type Tft<M> = Display<Interface, M, OutPin>;

/// Output pin from its GPIO number
fn output_pin(gpio: u8) -> Result<OutPin> {
    // SAFETY: the number comes from the validated board pin map and no other
    // driver is created on it
    let pin = unsafe { AnyOutputPin::new(i32::from(gpio)) };
    PinDriver::output(pin).with_context(|| format!("GPIO{} as output", gpio))
}

/// SPI device for the panel, clocked at the setup's frequency
pub fn spi(spi2: SPI2, setup: &TftSetup) -> Result<Spi> {
    log::info!(
        "Configuring SPI: SCLK=GPIO{} MOSI=GPIO{} CS=GPIO{} at {} Hz",
        setup.sclk,
        setup.mosi,
        setup.cs,
        setup.spi_frequency
    );
    // SAFETY: see output_pin
    let (sclk, mosi, cs) = unsafe {
        (
            AnyIOPin::new(i32::from(setup.sclk)),
            AnyIOPin::new(i32::from(setup.mosi)),
            AnyIOPin::new(i32::from(setup.cs)),
        )
    };
    let driver = SpiDeviceDriver::new_single(
        spi2,
        sclk,
        mosi,
        Option::<AnyIOPin>::None, // The panel is write only
        Some(cs),
        &spi::SpiDriverConfig::new(),
        &spi::SpiConfig::new().baudrate(Hertz(setup.spi_frequency)),
    )
    .context("Could not create SPI device driver")?;
    Ok(driver)
}

/// Display interface with the DC line, plus the reset line for the driver
pub fn interface(spi: Spi, setup: &TftSetup) -> Result<(Interface, OutPin)> {
    let dc = output_pin(setup.dc)?;
    let rst = output_pin(setup.rst)?;
    Ok((SPIInterface::new(spi, dc), rst))
}

/// Initialises the controller `model` with the setup's panel size
pub fn display<M>(
    model: M,
    interface: Interface,
    rst: OutPin,
    setup: &TftSetup,
    delay: &mut impl DelayNs,
) -> Result<Tft<M>>
where
    M: Model<ColorFormat = Rgb565>,
{
    log::info!(
        "Initializing {} panel {}x{}",
        setup.driver.name(),
        setup.width,
        setup.height
    );
    Builder::new(model, interface)
        .display_size(setup.width, setup.height)
        // Bare ST7789 modules ship with inverted colours
        .invert_colors(ColorInversion::Inverted)
        .reset_pin(rst)
        .init(delay)
        .map_err(|e| anyhow!("Display init failed: {:?}", e))
}

/// USB Serial/JTAG CDC port towards the desktop companion
pub fn serial(
    usb: USB_SERIAL,
    dm: Gpio18,
    dp: Gpio19,
    config: &SerialConfig,
) -> Result<UsbSerialDriver<'static>> {
    log::info!(
        "Opening USB serial: D-=GPIO{} D+=GPIO{} (companion set to {} baud)",
        config.usb_dm,
        config.usb_dp,
        config.baud_rate
    );
    UsbSerialDriver::new(
        usb,
        dm,
        dp,
        &UsbSerialConfig::new().rx_buffer_size(config.rx_buffer),
    )
    .context("Could not create USB serial driver")
}
