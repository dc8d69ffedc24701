//! Glue between the serial stream and the screen
//!
//! A [`Session`] owns the decoder and the dashboard state. The firmware hands
//! it whatever the serial link produced together with the panel; it decodes, updates
//! state, redraws the affected bands and returns the replies for the companion.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::config::LinkLimits;
use crate::dashboard::{Changes, Dashboard};
use crate::protocol::{FrameDecoder, Message, ProtocolError, IMAGE_ACK, IMAGE_NACK_PREFIX};
use crate::tft::setup::USER_SETUP;
use crate::ui::{self, Screen};

pub struct Session {
    decoder: FrameDecoder,
    dashboard: Dashboard,
    screen: Screen,
    /// Bands whose state changed but that are not on the panel yet
    pending: Changes,
}

impl Session {
    pub fn new(limits: LinkLimits) -> Self {
        Session {
            decoder: FrameDecoder::new(limits),
            dashboard: Dashboard::new(&limits),
            screen: Screen::new(),
            pending: Changes::NONE,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Clears the panel and draws every band with placeholders
    pub fn start<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.pending = Changes::ALL;
        self.screen.clear(display)?;
        self.flush(display)
    }

    /// Shows the boot splash if one was built in
    pub fn splash<D>(&self, pixels: &[u8], display: &mut D) -> Result<bool, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let expected = USER_SETUP.pixel_count() as usize * 2;
        if pixels.len() != expected {
            if !pixels.is_empty() {
                log::warn!(
                    "Splash is {} bytes, expected {} for {}x{} RGB565",
                    pixels.len(),
                    expected,
                    USER_SETUP.width,
                    USER_SETUP.height
                );
            }
            return Ok(false);
        }
        self.screen.draw_splash(pixels, display)?;
        Ok(true)
    }

    /// Processes received bytes, returns lines to send back to the companion
    ///
    /// A display error aborts the call, but state already received is kept
    /// and drawn by the next call.
    pub fn handle<D>(&mut self, bytes: &[u8], display: &mut D) -> Result<Vec<String>, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.decoder.push(bytes);

        let mut replies = Vec::new();
        loop {
            match self.decoder.next_frame() {
                Ok(Some(Message::AlbumArt(jpeg))) => {
                    replies.push(self.show_album_art(&jpeg, display)?);
                }
                Ok(Some(message)) => {
                    log::debug!("{} received", message.action());
                    self.pending.insert(self.dashboard.apply(message));
                }
                Ok(None) => break,
                // The companion resends album art until it gets an answer
                Err(e @ (ProtocolError::ImageTooLarge(_) | ProtocolError::EmptyImage)) => {
                    log::error!("Album art rejected: {}", e);
                    replies.push(format!("{}{}", IMAGE_NACK_PREFIX, e));
                }
                Err(e) => log::warn!("Dropped frame: {}", e),
            }
        }

        self.flush(display)?;
        Ok(replies)
    }

    /// Draws pending bands, keeping them pending if the panel fails
    fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.screen.draw(&self.dashboard, self.pending, display)?;
        self.pending = Changes::NONE;
        Ok(())
    }

    fn show_album_art<D>(&mut self, jpeg: &[u8], display: &mut D) -> Result<String, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match ui::decode_album_art(jpeg) {
            Ok(art) => {
                self.screen.draw_album_art(&art, display)?;
                self.pending.insert(self.dashboard.set_album_art(true));
                log::info!("Album art drawn ({}x{})", art.width, art.height);
                Ok(IMAGE_ACK.to_string())
            }
            Err(e) => {
                log::error!("Album art rejected: {}", e);
                self.pending.insert(self.dashboard.set_album_art(false));
                Ok(format!("{}{}", IMAGE_NACK_PREFIX, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LIMITS;
    use core::convert::Infallible;

    // Records which rows were touched, colour does not matter here
    struct DummyDisplay {
        touched_rows: Vec<bool>,
        pixels: usize,
    }

    impl DummyDisplay {
        fn new() -> Self {
            Self {
                touched_rows: vec![false; 320],
                pixels: 0,
            }
        }
    }

    impl OriginDimensions for DummyDisplay {
        fn size(&self) -> Size {
            Size::new(240, 320)
        }
    }

    impl DrawTarget for DummyDisplay {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(p, _) in pixels {
                if (0..320).contains(&p.y) {
                    self.touched_rows[p.y as usize] = true;
                }
                self.pixels += 1;
            }
            Ok(())
        }
    }

    fn jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(150, 150, image::Rgb([200, 10, 10]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    fn image_frame(payload: &[u8]) -> Vec<u8> {
        let mut frame = b"IMG:".to_vec();
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(payload);
        frame.push(b'\n');
        frame
    }

    #[test]
    fn text_commands_update_state_without_replies() {
        let mut session = Session::new(LIMITS);
        let mut display = DummyDisplay::new();
        let replies = session
            .handle(b"CPUT:55.5C\n\nUSER:juga\n\n", &mut display)
            .unwrap();
        assert!(replies.is_empty());
        assert_eq!(session.dashboard().cpu_temperature, Some(55.5));
        assert_eq!(session.dashboard().user, "juga");
        // Header and stats redrawn, spectrum band left alone
        assert!(display.touched_rows[0]);
        assert!(display.touched_rows[50]);
        assert!(!display.touched_rows[300]);
    }

    #[test]
    fn album_art_is_acknowledged() {
        let mut session = Session::new(LIMITS);
        let mut display = DummyDisplay::new();
        let replies = session.handle(&image_frame(&jpeg()), &mut display).unwrap();
        assert_eq!(replies, vec![IMAGE_ACK.to_string()]);
        assert!(session.dashboard().has_album_art);
        assert!(display.touched_rows[187]);
    }

    #[test]
    fn broken_album_art_is_refused() {
        let mut session = Session::new(LIMITS);
        let mut display = DummyDisplay::new();
        let replies = session
            .handle(&image_frame(&[0xFF, 0xD8, 0xFF]), &mut display)
            .unwrap();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with(IMAGE_NACK_PREFIX));
        assert!(!session.dashboard().has_album_art);
    }

    #[test]
    fn rejected_image_frames_are_answered() {
        let mut session = Session::new(LIMITS);
        let mut display = DummyDisplay::new();
        let oversized = vec![0u8; LIMITS.max_image + 1];
        let replies = session.handle(&image_frame(&oversized), &mut display).unwrap();
        assert_eq!(
            replies,
            vec![format!(
                "{}{}",
                IMAGE_NACK_PREFIX,
                ProtocolError::ImageTooLarge(LIMITS.max_image + 1)
            )]
        );

        let replies = session.handle(&image_frame(&[]), &mut display).unwrap();
        assert_eq!(
            replies,
            vec![format!("{}{}", IMAGE_NACK_PREFIX, ProtocolError::EmptyImage)]
        );
    }

    #[test]
    fn broken_art_after_good_art_blanks_the_box() {
        let mut session = Session::new(LIMITS);
        let mut display = DummyDisplay::new();
        session.handle(&image_frame(&jpeg()), &mut display).unwrap();

        let mut display = DummyDisplay::new();
        session
            .handle(&image_frame(&[0xFF, 0xD8, 0xFF]), &mut display)
            .unwrap();
        assert!(!session.dashboard().has_album_art);
        assert!(display.touched_rows[187]);
        assert!(!display.touched_rows[0]);
    }

    // Fails every draw while `broken` is set
    struct FlakyDisplay {
        broken: bool,
        touched_rows: Vec<bool>,
    }

    impl OriginDimensions for FlakyDisplay {
        fn size(&self) -> Size {
            Size::new(240, 320)
        }
    }

    impl DrawTarget for FlakyDisplay {
        type Color = Rgb565;
        type Error = ();

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            if self.broken {
                return Err(());
            }
            for Pixel(p, _) in pixels {
                if (0..320).contains(&p.y) {
                    self.touched_rows[p.y as usize] = true;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn state_received_during_display_failure_is_drawn_later() {
        let mut session = Session::new(LIMITS);
        let mut display = FlakyDisplay {
            broken: true,
            touched_rows: vec![false; 320],
        };
        let mut stream = b"CPUT:50C\n\n".to_vec();
        stream.extend(image_frame(&jpeg()));
        assert_eq!(session.handle(&stream, &mut display), Err(()));
        assert_eq!(session.dashboard().cpu_temperature, Some(50.0));

        // Same value again changes no state, the stats band still gets drawn
        display.broken = false;
        session.handle(b"CPUT:50C\n\n", &mut display).unwrap();
        assert!(display.touched_rows[50]);
        assert!(!display.touched_rows[300]);
    }

    #[test]
    fn garbage_is_dropped_and_stream_continues() {
        let mut session = Session::new(LIMITS);
        let mut display = DummyDisplay::new();
        session
            .handle(b"???\nRAM:4.0 / 8GB\n", &mut display)
            .unwrap();
        assert!(session.dashboard().ram.is_some());
    }

    #[test]
    fn splash_must_cover_the_panel() {
        let session = Session::new(LIMITS);
        let mut display = DummyDisplay::new();
        assert_eq!(session.splash(&[], &mut display), Ok(false));
        assert_eq!(session.splash(&[0; 10], &mut display), Ok(false));
        let full = vec![0u8; 240 * 320 * 2];
        assert_eq!(session.splash(&full, &mut display), Ok(true));
        assert_eq!(display.pixels, 240 * 320);
    }

    #[test]
    fn start_draws_every_band() {
        let mut session = Session::new(LIMITS);
        let mut display = DummyDisplay::new();
        session.start(&mut display).unwrap();
        assert!(display.touched_rows.iter().all(|t| *t));
    }
}
