//! Screen layout and drawing
//!
//! The 240x320 portrait panel is split into fixed bands, top to bottom:
//! header (user and OS), stats (CPU, GPU, RAM), media title, album art and
//! the audio spectrum. Each band is redrawn on its own when it changes.

use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10, FONT_9X15};
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::dashboard::{Changes, Dashboard};
use crate::protocol::{RamUsage, SPECTRUM_BARS};
use crate::tft::{TFT_HEIGHT, TFT_WIDTH};

/// Album art is sent as a square of this many pixels
pub const ART_SIZE: u32 = 150;

pub const BACKGROUND: Rgb565 = Rgb565::BLACK;
pub const FOREGROUND: Rgb565 = Rgb565::WHITE;
pub const ACCENT: Rgb565 = Rgb565::new(0x1F, 0x10, 0x14);
pub const BAR: Rgb565 = Rgb565::new(0x06, 0x30, 0x1F);

const MARGIN: i32 = 8;
const WIDTH: u32 = TFT_WIDTH as u32;
const HEIGHT: u32 = TFT_HEIGHT as u32;

// Bands, top to bottom
const HEADER: Rectangle = Rectangle::new(Point::new(0, 0), Size::new(WIDTH, 40));
const STATS: Rectangle = Rectangle::new(Point::new(0, 42), Size::new(WIDTH, 50));
const TITLE: Rectangle = Rectangle::new(Point::new(0, 94), Size::new(WIDTH, 14));
const ART: Rectangle = Rectangle::new(
    Point::new((WIDTH - ART_SIZE) as i32 / 2, 112),
    Size::new(ART_SIZE, ART_SIZE),
);
const SPECTRUM: Rectangle = Rectangle::new(Point::new(0, 268), Size::new(WIDTH, HEIGHT - 268));

const BAR_PITCH: u32 = WIDTH / SPECTRUM_BARS as u32;

/// Album art converted for the panel, RGB565 big endian
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumArt {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Why album art could not be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtError {
    Decode(String),
    TooLarge { width: u32, height: u32 },
}

impl core::fmt::Display for ArtError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArtError::Decode(e) => write!(f, "JPEG decode failed: {}", e),
            ArtError::TooLarge { width, height } => write!(
                f,
                "{}x{} image exceeds {}x{}",
                width, height, ART_SIZE, ART_SIZE
            ),
        }
    }
}

impl std::error::Error for ArtError {}

/// Decodes baseline JPEG album art into panel pixels
pub fn decode_album_art(jpeg: &[u8]) -> Result<AlbumArt, ArtError> {
    let img = image::load_from_memory_with_format(jpeg, image::ImageFormat::Jpeg)
        .map_err(|e| ArtError::Decode(e.to_string()))?;
    let (width, height) = (img.width(), img.height());
    if width > ART_SIZE || height > ART_SIZE {
        return Err(ArtError::TooLarge { width, height });
    }

    let rgb = img.to_rgb8();
    let mut pixels = Vec::with_capacity((width * height * 2) as usize);
    for p in rgb.pixels() {
        let color = Rgb565::new(p[0] >> 3, p[1] >> 2, p[2] >> 3);
        pixels.extend_from_slice(&color.into_storage().to_be_bytes());
    }
    Ok(AlbumArt {
        width,
        height,
        pixels,
    })
}

/// Draws the dashboard onto the panel
pub struct Screen {
    title_style: MonoTextStyle<'static, Rgb565>,
    small_style: MonoTextStyle<'static, Rgb565>,
    stat_style: MonoTextStyle<'static, Rgb565>,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            title_style: MonoTextStyleBuilder::new()
                .font(&FONT_10X20)
                .text_color(FOREGROUND)
                .build(),
            small_style: MonoTextStyle::new(&FONT_6X10, FOREGROUND),
            stat_style: MonoTextStyle::new(&FONT_9X15, ACCENT),
        }
    }

    /// Clears the whole panel
    pub fn clear<D>(&self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(BACKGROUND)
    }

    /// Redraws the bands named in `changes`
    pub fn draw<D>(&self, dash: &Dashboard, changes: Changes, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if changes.contains(Changes::HEADER) {
            self.draw_header(dash, display)?;
        }
        if changes.contains(Changes::STATS) {
            self.draw_stats(dash, display)?;
        }
        if changes.contains(Changes::TITLE) {
            self.draw_title(dash, display)?;
        }
        if changes.contains(Changes::ALBUM_ART) && !dash.has_album_art {
            // Art pixels are not kept, only an empty box can be redrawn
            fill(ART, display)?;
        }
        if changes.contains(Changes::SPECTRUM) {
            self.draw_spectrum(dash, display)?;
        }
        Ok(())
    }

    fn draw_header<D>(&self, dash: &Dashboard, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill(HEADER, display)?;
        Text::with_baseline(
            &dash.user,
            Point::new(MARGIN, 4),
            self.title_style,
            Baseline::Top,
        )
        .draw(display)?;
        Text::with_baseline(
            &dash.os_version,
            Point::new(MARGIN, 26),
            self.small_style,
            Baseline::Top,
        )
        .draw(display)?;
        Ok(())
    }

    fn draw_stats<D>(&self, dash: &Dashboard, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill(STATS, display)?;
        let rows = [
            format!("CPU {}", format_temperature(dash.cpu_temperature)),
            format!("GPU {}", format_temperature(dash.gpu_temperature)),
            format!("RAM {}", format_ram(dash.ram.as_ref())),
        ];
        for (i, row) in rows.iter().enumerate() {
            Text::with_baseline(
                row,
                STATS.top_left + Point::new(MARGIN, 16 * i as i32),
                self.stat_style,
                Baseline::Top,
            )
            .draw(display)?;
        }
        Ok(())
    }

    fn draw_title<D>(&self, dash: &Dashboard, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill(TITLE, display)?;
        Text::with_baseline(
            &dash.title,
            TITLE.top_left + Point::new(MARGIN, 2),
            self.small_style,
            Baseline::Top,
        )
        .draw(display)?;
        Ok(())
    }

    fn draw_spectrum<D>(&self, dash: &Dashboard, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill(SPECTRUM, display)?;
        let max_height = SPECTRUM.size.height;
        let style = PrimitiveStyle::with_fill(BAR);
        for (i, value) in dash.spectrum.bars.iter().enumerate() {
            let height = u32::from(*value) * max_height / 255;
            if height == 0 {
                continue;
            }
            let x = (i as u32 * BAR_PITCH) as i32;
            let y = SPECTRUM.top_left.y + (max_height - height) as i32;
            Rectangle::new(Point::new(x, y), Size::new(BAR_PITCH - 1, height))
                .into_styled(style)
                .draw(display)?;
        }
        Ok(())
    }

    /// Draws album art centred in its box
    pub fn draw_album_art<D>(&self, art: &AlbumArt, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        fill(ART, display)?;
        let offset = Point::new(
            (ART_SIZE - art.width) as i32 / 2,
            (ART_SIZE - art.height) as i32 / 2,
        );
        let raw: ImageRaw<Rgb565> = ImageRaw::new(&art.pixels, art.width);
        Image::new(&raw, ART.top_left + offset).draw(display)
    }

    /// Draws a full-screen RGB565 splash image
    pub fn draw_splash<D>(&self, pixels: &[u8], display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let raw: ImageRaw<Rgb565> = ImageRaw::new(pixels, WIDTH);
        Image::new(&raw, Point::zero()).draw(display)
    }
}

fn fill<D>(area: Rectangle, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    display.fill_solid(&area, BACKGROUND)
}

fn format_temperature(t: Option<f32>) -> String {
    match t {
        Some(t) => format!("{:.1} C", t),
        None => "--".to_string(),
    }
}

fn format_ram(ram: Option<&RamUsage>) -> String {
    match ram {
        Some(RamUsage::Gigabytes { used, total }) => format!("{:.1} / {:.0} GB", used, total),
        Some(RamUsage::Text(text)) => text.clone(),
        None => "--".to_string(),
    }
}
