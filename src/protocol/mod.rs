//! Serial protocol spoken by the desktop companion
//!
//! Every command starts with an action prefix such as `CPUT:` followed by its
//! payload. Text commands end with a newline; the companion writes them with
//! `WriteLine`, so an extra empty line usually follows. Album art is binary:
//!
//! ```text
//! "IMG:" | length: u32 little endian | JPEG bytes | "\n"
//! ```

mod decoder;

pub use decoder::FrameDecoder;

/// Number of bars in a spectrum frame
pub const SPECTRUM_BARS: usize = 32;

/// Reply the companion waits for after sending album art
pub const IMAGE_ACK: &str = "[IMG] Image drawn successfully";

/// Prefix of the reply sent when album art could not be shown
pub const IMAGE_NACK_PREFIX: &str = "[IMG] Failed: ";

/// Command prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CpuTemperature,
    GpuTemperature,
    RamUsage,
    Sound,
    Title,
    OsVersion,
    User,
    Image,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::CpuTemperature,
        Action::GpuTemperature,
        Action::RamUsage,
        Action::Sound,
        Action::Title,
        Action::OsVersion,
        Action::User,
        Action::Image,
    ];

    /// The prefix as it appears on the wire
    pub const fn prefix(self) -> &'static str {
        match self {
            Action::CpuTemperature => "CPUT:",
            Action::GpuTemperature => "GPUT:",
            Action::RamUsage => "RAM:",
            Action::Sound => "SOUND:",
            Action::Title => "TITLE:",
            Action::OsVersion => "WIND:",
            Action::User => "USER:",
            Action::Image => "IMG:",
        }
    }

    /// Splits a line into its action and payload
    pub fn split(line: &str) -> Option<(Action, &str)> {
        Action::ALL
            .iter()
            .find_map(|a| line.strip_prefix(a.prefix()).map(|payload| (*a, payload)))
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// RAM usage as reported by the companion
#[derive(Debug, Clone, PartialEq)]
pub enum RamUsage {
    /// Used and total memory in GB
    Gigabytes { used: f32, total: f32 },
    /// Anything the companion sent that did not parse, shown as-is
    Text(String),
}

/// One frame of the audio spectrum, each bar 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spectrum {
    pub bars: [u8; SPECTRUM_BARS],
    /// How many bars the companion actually sent
    pub len: usize,
}

/// A decoded command
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// CPU temperature in °C, `None` when the companion has no sensor reading
    CpuTemperature(Option<f32>),
    /// GPU temperature in °C
    GpuTemperature(Option<f32>),
    RamUsage(RamUsage),
    Spectrum(Spectrum),
    /// "Title - Artist" of the current media session
    Title(String),
    OsVersion(String),
    User(String),
    /// Baseline JPEG bytes
    AlbumArt(Vec<u8>),
}

impl Message {
    pub fn action(&self) -> Action {
        match self {
            Message::CpuTemperature(_) => Action::CpuTemperature,
            Message::GpuTemperature(_) => Action::GpuTemperature,
            Message::RamUsage(_) => Action::RamUsage,
            Message::Spectrum(_) => Action::Sound,
            Message::Title(_) => Action::Title,
            Message::OsVersion(_) => Action::OsVersion,
            Message::User(_) => Action::User,
            Message::AlbumArt(_) => Action::Image,
        }
    }
}

/// Errors while decoding the serial stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Line did not start with a known action
    UnknownAction(String),
    /// A numeric payload did not parse
    InvalidNumber { action: Action, value: String },
    /// A spectrum frame with more than [`SPECTRUM_BARS`] values
    TooManyBars(usize),
    /// Text line longer than the configured limit
    LineTooLong(usize),
    /// Album art larger than the configured limit; the payload is skipped
    ImageTooLarge(usize),
    /// Album art header announcing zero bytes
    EmptyImage,
    /// `IMG:` seen inside a text line instead of as a binary frame
    ImageInTextLine,
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtocolError::UnknownAction(line) => write!(f, "unknown action in {:?}", line),
            ProtocolError::InvalidNumber { action, value } => {
                write!(f, "invalid number {:?} for {}", value, action)
            }
            ProtocolError::TooManyBars(n) => {
                write!(f, "spectrum has {} bars, at most {}", n, SPECTRUM_BARS)
            }
            ProtocolError::LineTooLong(n) => write!(f, "line of {} bytes is too long", n),
            ProtocolError::ImageTooLarge(n) => write!(f, "image of {} bytes is too large", n),
            ProtocolError::EmptyImage => write!(f, "image header announces 0 bytes"),
            ProtocolError::ImageInTextLine => write!(f, "image command inside a text line"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Decodes one text line, without its newline
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<Message>, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Ok(None);
    }

    let Some((action, payload)) = Action::split(line) else {
        // Keep the error small, lines can be up to the line limit
        let head: String = line.chars().take(16).collect();
        return Err(ProtocolError::UnknownAction(head));
    };

    let message = match action {
        Action::CpuTemperature => Message::CpuTemperature(parse_temperature(action, payload)?),
        Action::GpuTemperature => Message::GpuTemperature(parse_temperature(action, payload)?),
        Action::RamUsage => Message::RamUsage(parse_ram(payload)),
        Action::Sound => Message::Spectrum(parse_spectrum(payload)?),
        Action::Title => Message::Title(payload.to_string()),
        Action::OsVersion => Message::OsVersion(payload.trim().to_string()),
        Action::User => Message::User(payload.trim().to_string()),
        Action::Image => return Err(ProtocolError::ImageInTextLine),
    };
    Ok(Some(message))
}

/// Parses a decimal that may use a comma as separator, as Windows locales do
fn parse_decimal(value: &str) -> Option<f32> {
    value.trim().replace(',', ".").parse::<f32>().ok()
}

/// `"47.5C"` -> `Some(47.5)`, `"C"` -> `None`
fn parse_temperature(action: Action, payload: &str) -> Result<Option<f32>, ProtocolError> {
    let value = payload.trim();
    let value = value.strip_suffix('C').unwrap_or(value).trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_decimal(value)
        .map(Some)
        .ok_or_else(|| ProtocolError::InvalidNumber {
            action,
            value: value.to_string(),
        })
}

/// `"12.3 / 32GB"` -> used 12.3, total 32
fn parse_ram(payload: &str) -> RamUsage {
    let trimmed = payload.trim();
    let numbers = trimmed.strip_suffix("GB").unwrap_or(trimmed);
    if let Some((used, total)) = numbers.split_once('/') {
        if let (Some(used), Some(total)) = (parse_decimal(used), parse_decimal(total)) {
            return RamUsage::Gigabytes { used, total };
        }
    }
    RamUsage::Text(trimmed.to_string())
}

/// `"0,12,255"` -> three bars
fn parse_spectrum(payload: &str) -> Result<Spectrum, ProtocolError> {
    let mut spectrum = Spectrum::default();
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(spectrum);
    }
    for (i, value) in payload.split(',').enumerate() {
        if i >= SPECTRUM_BARS {
            return Err(ProtocolError::TooManyBars(payload.split(',').count()));
        }
        spectrum.bars[i] =
            value
                .trim()
                .parse::<u8>()
                .map_err(|_| ProtocolError::InvalidNumber {
                    action: Action::Sound,
                    value: value.to_string(),
                })?;
        spectrum.len = i + 1;
    }
    Ok(spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperatures() {
        assert_eq!(
            parse_line("CPUT:47.5C").unwrap(),
            Some(Message::CpuTemperature(Some(47.5)))
        );
        assert_eq!(
            parse_line("GPUT:61,25C\r").unwrap(),
            Some(Message::GpuTemperature(Some(61.25)))
        );
        // Companion had no sensor reading
        assert_eq!(
            parse_line("CPUT:C").unwrap(),
            Some(Message::CpuTemperature(None))
        );
        assert_eq!(
            parse_line("GPUT:hotC"),
            Err(ProtocolError::InvalidNumber {
                action: Action::GpuTemperature,
                value: "hot".to_string()
            })
        );
    }

    #[test]
    fn ram_usage() {
        assert_eq!(
            parse_line("RAM:12.3 / 32GB").unwrap(),
            Some(Message::RamUsage(RamUsage::Gigabytes {
                used: 12.3,
                total: 32.0
            }))
        );
        assert_eq!(
            parse_line("RAM:7,9 / 16GB").unwrap(),
            Some(Message::RamUsage(RamUsage::Gigabytes {
                used: 7.9,
                total: 16.0
            }))
        );
        assert_eq!(
            parse_line("RAM:unknown").unwrap(),
            Some(Message::RamUsage(RamUsage::Text("unknown".to_string())))
        );
    }

    #[test]
    fn spectrum() {
        let Some(Message::Spectrum(s)) = parse_line("SOUND:0,128,255").unwrap() else {
            panic!("expected a spectrum");
        };
        assert_eq!(s.len, 3);
        assert_eq!(&s.bars[..4], &[0, 128, 255, 0]);

        let full = vec!["9"; SPECTRUM_BARS].join(",");
        let Some(Message::Spectrum(s)) = parse_line(&format!("SOUND:{}", full)).unwrap() else {
            panic!("expected a spectrum");
        };
        assert_eq!(s.len, SPECTRUM_BARS);
        assert!(s.bars.iter().all(|b| *b == 9));

        let too_many = vec!["1"; SPECTRUM_BARS + 2].join(",");
        assert_eq!(
            parse_line(&format!("SOUND:{}", too_many)),
            Err(ProtocolError::TooManyBars(SPECTRUM_BARS + 2))
        );
        assert!(matches!(
            parse_line("SOUND:1,300"),
            Err(ProtocolError::InvalidNumber {
                action: Action::Sound,
                ..
            })
        ));
    }

    #[test]
    fn text_commands() {
        assert_eq!(
            parse_line("TITLE:Song - Artist").unwrap(),
            Some(Message::Title("Song - Artist".to_string()))
        );
        assert_eq!(
            parse_line("WIND:Windows 10").unwrap(),
            Some(Message::OsVersion("Windows 10".to_string()))
        );
        assert_eq!(
            parse_line("USER:juga\r\n").unwrap(),
            Some(Message::User("juga".to_string()))
        );
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("\r"), Ok(None));
        assert_eq!(
            parse_line("FAN:1200rpm"),
            Err(ProtocolError::UnknownAction("FAN:1200rpm".to_string()))
        );
        assert_eq!(parse_line("IMG:abc"), Err(ProtocolError::ImageInTextLine));
    }

    #[test]
    fn message_reports_its_action() {
        assert_eq!(Message::Title(String::new()).action().prefix(), "TITLE:");
        assert_eq!(Message::AlbumArt(vec![1]).action(), Action::Image);
    }
}
