//! Byte stream to [`Message`] decoder

use super::{parse_line, Action, Message, ProtocolError};
use crate::config::LinkLimits;

const IMAGE_PREFIX: &[u8] = Action::Image.prefix().as_bytes();
const IMAGE_HEADER_LEN: usize = 4 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for the next command
    Command,
    /// Dropping bytes until the next newline
    DiscardLine,
    /// Dropping the payload of a rejected image
    SkipImage(usize),
}

/// Incremental decoder for the serial stream
///
/// Feed whatever the serial link returned with [`FrameDecoder::push`], then call
/// [`FrameDecoder::next_frame`] until it returns `Ok(None)`. An error only
/// concerns a single frame; decoding can continue afterwards.
pub struct FrameDecoder {
    buf: Vec<u8>,
    state: State,
    limits: LinkLimits,
}

impl FrameDecoder {
    pub fn new(limits: LinkLimits) -> Self {
        FrameDecoder {
            buf: Vec::with_capacity(limits.max_line),
            state: State::Command,
            limits,
        }
    }

    /// Appends received bytes
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Decodes the next complete frame, if there is one
    pub fn next_frame(&mut self) -> Result<Option<Message>, ProtocolError> {
        loop {
            match self.state {
                State::SkipImage(remaining) => {
                    let n = remaining.min(self.buf.len());
                    self.buf.drain(..n);
                    if n < remaining {
                        self.state = State::SkipImage(remaining - n);
                        return Ok(None);
                    }
                    self.state = State::Command;
                }
                State::DiscardLine => match self.buf.iter().position(|b| *b == b'\n') {
                    Some(pos) => {
                        self.buf.drain(..=pos);
                        self.state = State::Command;
                    }
                    None => {
                        self.buf.clear();
                        return Ok(None);
                    }
                },
                State::Command => {
                    // Terminators of the previous frame and WriteLine's extra newline
                    let blank = self
                        .buf
                        .iter()
                        .take_while(|b| **b == b'\n' || **b == b'\r')
                        .count();
                    self.buf.drain(..blank);
                    if self.buf.is_empty() {
                        return Ok(None);
                    }

                    if self.buf.starts_with(IMAGE_PREFIX) {
                        return self.take_image();
                    }

                    let Some(pos) = self.buf.iter().position(|b| *b == b'\n') else {
                        if self.buf.len() > self.limits.max_line {
                            let len = self.buf.len();
                            self.buf.clear();
                            self.state = State::DiscardLine;
                            return Err(ProtocolError::LineTooLong(len));
                        }
                        return Ok(None);
                    };

                    let line: Vec<u8> = self.buf.drain(..=pos).collect();
                    if pos > self.limits.max_line {
                        return Err(ProtocolError::LineTooLong(pos));
                    }
                    // The companion's serial port encodes as ASCII; be lenient anyway
                    let text = String::from_utf8_lossy(&line[..pos]);
                    match parse_line(&text)? {
                        Some(message) => return Ok(Some(message)),
                        None => continue,
                    }
                }
            }
        }
    }

    /// Called with the buffer starting at an `IMG:` prefix
    fn take_image(&mut self) -> Result<Option<Message>, ProtocolError> {
        if self.buf.len() < IMAGE_HEADER_LEN {
            return Ok(None);
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&self.buf[IMAGE_PREFIX.len()..IMAGE_HEADER_LEN]);
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len == 0 {
            self.buf.drain(..IMAGE_HEADER_LEN);
            return Err(ProtocolError::EmptyImage);
        }
        if len > self.limits.max_image {
            log::warn!("Skipping {} byte image payload", len);
            self.buf.drain(..IMAGE_HEADER_LEN);
            self.state = State::SkipImage(len);
            return Err(ProtocolError::ImageTooLarge(len));
        }
        if self.buf.len() < IMAGE_HEADER_LEN + len {
            return Ok(None);
        }

        self.buf.drain(..IMAGE_HEADER_LEN);
        let data: Vec<u8> = self.buf.drain(..len).collect();
        log::debug!("Received {} byte image", data.len());
        Ok(Some(Message::AlbumArt(data)))
    }
}
