//! Text codecs over the rest of the window.
//!
//! Text has no length of its own: it takes every byte it can see. Pair it
//! with [`JarExt::null_terminated`](crate::JarExt::null_terminated) or
//! [`JarExt::size_prefixed`](crate::JarExt::size_prefixed) to bound it.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{Cursor, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window};

/// A character encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// UTF-8
    Utf8,
    /// 7-bit ASCII
    Ascii,
    /// ISO-8859-1: every byte is the code point of the same value
    Latin1,
}

impl Encoding {
    /// Display name used in errors and labels.
    pub const fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Ascii => "ASCII",
            Encoding::Latin1 => "Latin-1",
        }
    }

    fn decode(self, bytes: &[u8], offset: usize) -> Result<String, DecodeError> {
        let invalid = |at: usize| DecodeError::InvalidText {
            encoding: self.name(),
            offset: offset + at,
        };
        match self {
            Encoding::Utf8 => core::str::from_utf8(bytes)
                .map(String::from)
                .map_err(|err| invalid(err.valid_up_to())),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(at) => Err(invalid(at)),
                // ASCII is a subset of UTF-8
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    fn encode(self, text: &str, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            Encoding::Utf8 => out.extend_from_slice(text.as_bytes()),
            Encoding::Ascii => {
                if let Some(position) = text.chars().position(|c| !c.is_ascii()) {
                    return Err(EncodeError::InvalidText {
                        encoding: self.name(),
                        position,
                    });
                }
                out.extend_from_slice(text.as_bytes());
            }
            Encoding::Latin1 => {
                out.reserve(text.len());
                for (position, c) in text.chars().enumerate() {
                    let byte = u8::try_from(u32::from(c)).map_err(|_| EncodeError::InvalidText {
                        encoding: self.name(),
                        position,
                    })?;
                    out.push(byte);
                }
            }
        }
        Ok(())
    }

    fn measure(self, text: &str) -> Result<usize, EncodeError> {
        match self {
            Encoding::Utf8 | Encoding::Ascii => Ok(text.len()),
            Encoding::Latin1 => Ok(text.chars().count()),
        }
    }
}

/// Text in a fixed encoding, taking the rest of the window.
#[derive(Debug, Clone, Copy)]
pub struct Text {
    encoding: Encoding,
}

impl Text {
    /// Text in `encoding`.
    pub const fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    /// The text's encoding.
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn read(encoding: Encoding, cursor: &mut Cursor<'_>) -> Result<String, DecodeError> {
        let offset = cursor.position();
        let bytes = cursor.rest();
        let text = encoding.decode(bytes, offset)?;
        cursor.advance(bytes.len())?;
        Ok(text)
    }
}

impl Jar for Text {
    type Value = String;

    fn decode(&self, window: Window<'_>) -> Result<Parsed<String>, DecodeError> {
        let text = self.encoding.decode(window.as_bytes(), window.offset())?;
        Ok(Parsed::new(text, window.len()))
    }

    fn encode_into(&self, value: &String, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.encoding.encode(value, out)
    }

    fn encoded_len(&self, value: &String) -> Result<usize, EncodeError> {
        self.encoding.measure(value)
    }

    fn meta(&self) -> Meta {
        Meta::terminal()
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.encoding.name())
    }

    fn plan(&self) -> Option<Plan<String>> {
        let encoding = self.encoding;
        Some(Plan::new(
            self.label(),
            Meta::terminal(),
            move |cursor| Text::read(encoding, cursor),
            move |value: &String, out| encoding.encode(value, out),
            move |value: &String| encoding.measure(value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_whole_window() {
        let jar = Text::new(Encoding::Utf8);
        let parsed = jar.decode(Window::new("héllo".as_bytes())).unwrap();
        assert_eq!(parsed.value, "héllo");
        assert_eq!(parsed.consumed, 6);
        assert!(!jar.meta().can_be_followed());
    }

    #[test]
    fn invalid_bytes_report_their_position() {
        let bytes = [b'o', b'k', 0xff];
        let window = Window::slice(&bytes, 0, 3).unwrap();
        assert_eq!(
            Text::new(Encoding::Utf8).decode(window),
            Err(DecodeError::InvalidText {
                encoding: "UTF-8",
                offset: 2
            })
        );
        assert!(matches!(
            Text::new(Encoding::Ascii).decode(window),
            Err(DecodeError::InvalidText { offset: 2, .. })
        ));
    }

    #[test]
    fn latin1_maps_bytes_to_code_points() {
        let jar = Text::new(Encoding::Latin1);
        let text = String::from("caf\u{e9}");
        let bytes = jar.encode(&text).unwrap();
        assert_eq!(bytes, [b'c', b'a', b'f', 0xe9]);
        assert_eq!(jar.decode(Window::new(&bytes)).unwrap().value, text);
        assert!(matches!(
            jar.encode(&String::from("\u{20ac}")),
            Err(EncodeError::InvalidText { position: 0, .. })
        ));
    }

    #[test]
    fn ascii_refuses_non_ascii_text() {
        assert_eq!(
            Text::new(Encoding::Ascii).encode(&String::from("na\u{ef}ve")),
            Err(EncodeError::InvalidText {
                encoding: "ASCII",
                position: 2
            })
        );
    }
}
