//! Last known values received from the desktop companion

use crate::config::LinkLimits;
use crate::protocol::{Message, RamUsage, Spectrum, SPECTRUM_BARS};

/// Screen regions that need redrawing, as a small bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Changes(u8);

impl Changes {
    pub const NONE: Changes = Changes(0);
    /// User name and OS version
    pub const HEADER: Changes = Changes(0x01);
    /// CPU, GPU and RAM rows
    pub const STATS: Changes = Changes(0x02);
    pub const TITLE: Changes = Changes(0x04);
    pub const ALBUM_ART: Changes = Changes(0x08);
    pub const SPECTRUM: Changes = Changes(0x10);
    pub const ALL: Changes = Changes(0x1F);

    pub const fn contains(self, other: Changes) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Changes) {
        self.0 |= other.0;
    }
}

impl core::ops::BitOr for Changes {
    type Output = Changes;

    fn bitor(self, rhs: Changes) -> Changes {
        Changes(self.0 | rhs.0)
    }
}

/// Everything the screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub cpu_temperature: Option<f32>,
    pub gpu_temperature: Option<f32>,
    pub ram: Option<RamUsage>,
    pub title: String,
    pub os_version: String,
    pub user: String,
    pub spectrum: Spectrum,
    /// Set once album art for the current title has been drawn
    pub has_album_art: bool,
    max_title_chars: usize,
}

impl Dashboard {
    pub fn new(limits: &LinkLimits) -> Self {
        Dashboard {
            cpu_temperature: None,
            gpu_temperature: None,
            ram: None,
            title: String::new(),
            os_version: String::new(),
            user: String::new(),
            spectrum: Spectrum::default(),
            has_album_art: false,
            max_title_chars: limits.max_title_chars,
        }
    }

    /// Stores a message and reports what has to be redrawn
    ///
    /// Album art pixels are not kept here. The caller decodes and draws them,
    /// then reports the outcome with [`Dashboard::set_album_art`].
    pub fn apply(&mut self, message: Message) -> Changes {
        match message {
            Message::CpuTemperature(t) => {
                replace(&mut self.cpu_temperature, t, Changes::STATS)
            }
            Message::GpuTemperature(t) => {
                replace(&mut self.gpu_temperature, t, Changes::STATS)
            }
            Message::RamUsage(ram) => replace(&mut self.ram, Some(ram), Changes::STATS),
            Message::Spectrum(mut spectrum) => {
                // Short frames leave the remaining bars silent
                spectrum.bars[spectrum.len.min(SPECTRUM_BARS)..].fill(0);
                replace(&mut self.spectrum, spectrum, Changes::SPECTRUM)
            }
            Message::Title(title) => {
                let title = truncate_chars(&title, self.max_title_chars);
                if title == self.title {
                    return Changes::NONE;
                }
                self.title = title;
                Changes::TITLE
            }
            Message::OsVersion(os) => replace(&mut self.os_version, os, Changes::HEADER),
            Message::User(user) => replace(&mut self.user, user, Changes::HEADER),
            Message::AlbumArt(_) => Changes::NONE,
        }
    }

    /// Records whether album art is currently on screen
    ///
    /// Art that was drawn directly needs no redraw; art that went away leaves
    /// its box to be blanked.
    pub fn set_album_art(&mut self, shown: bool) -> Changes {
        let was_shown = core::mem::replace(&mut self.has_album_art, shown);
        if was_shown && !shown {
            Changes::ALBUM_ART
        } else {
            Changes::NONE
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T, region: Changes) -> Changes {
    if *slot == value {
        return Changes::NONE;
    }
    *slot = value;
    region
}

/// Cuts `text` to at most `max` characters without splitting one
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
