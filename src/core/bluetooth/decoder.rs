//! Characteristic value decoding
//! Turns raw characteristic payloads into display strings, using the
//! Characteristic Presentation Format descriptor (0x2904) when one is available.

use crate::core::bluetooth::constants::PRESENTATION_FORMAT_LEN;
use crate::core::bluetooth::error::DecodeError;

/// Value formats understood by the decoder.
/// Codes follow the Bluetooth "Format Types" assigned numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Boolean (0x01)
    Boolean,
    /// Unsigned 16-bit integer (0x06)
    Uint16,
    /// Unsigned 32-bit integer (0x04)
    Uint32,
    /// Signed 16-bit integer (0x0A)
    Sint16,
    /// Signed 32-bit integer (0x08)
    Sint32,
    /// IEEE-754 32-bit float (0x0E)
    Float32,
    /// Any other format code
    Other(u8),
}

impl Format {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Boolean,
            0x04 => Self::Uint32,
            0x06 => Self::Uint16,
            0x08 => Self::Sint32,
            0x0A => Self::Sint16,
            0x0E => Self::Float32,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Boolean => 0x01,
            Self::Uint32 => 0x04,
            Self::Uint16 => 0x06,
            Self::Sint32 => 0x08,
            Self::Sint16 => 0x0A,
            Self::Float32 => 0x0E,
            Self::Other(code) => *code,
        }
    }
}

/// Parsed presentation format descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationFormat {
    pub format: Format,
    pub exponent: i8,
    pub unit: u16,
}

impl PresentationFormat {
    /// Parses a descriptor payload: format, exponent, unit (little-endian),
    /// then namespace and description which are ignored.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < PRESENTATION_FORMAT_LEN {
            return Err(DecodeError::DescriptorMalformed(data.len()));
        }
        Ok(Self {
            format: Format::from_code(data[0]),
            exponent: i8::from_le_bytes([data[1]]),
            unit: u16::from_le_bytes([data[2], data[3]]),
        })
    }
}

/// Unit suffix for a Bluetooth unit code. Unknown units render without suffix.
pub fn unit_suffix(unit: u16) -> &'static str {
    match unit {
        0x2700 => "",
        0x2763 => "km/h",
        0x27AD => "rpm",
        0x2701 => "m",
        0x27B1 => "°C",
        0x27B3 => "%",
        0x27AE => "V",
        0x27AC => "A",
        _ => "",
    }
}

/// Copies the first `N` bytes of `raw`, failing when the payload is shorter.
fn leading<const N: usize>(raw: &[u8]) -> Result<[u8; N], DecodeError> {
    raw.get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DecodeError::PayloadTooShort {
            needed: N,
            actual: raw.len(),
        })
}

/// Decodes `raw` according to its presentation format.
///
/// Numeric formats are scaled by `10^exponent` and always rendered with two
/// decimal places followed by the unit suffix.
pub fn decode(raw: &[u8], descriptor: &PresentationFormat) -> Result<String, DecodeError> {
    let value = match descriptor.format {
        Format::Boolean => {
            let set = raw.first().is_some_and(|byte| *byte != 0);
            return Ok(set.to_string());
        }
        Format::Uint32 => f64::from(u32::from_le_bytes(leading(raw)?)),
        Format::Uint16 => f64::from(u16::from_le_bytes(leading(raw)?)),
        Format::Sint32 => f64::from(i32::from_le_bytes(leading(raw)?)),
        Format::Sint16 => f64::from(i16::from_le_bytes(leading(raw)?)),
        Format::Float32 => f64::from(f32::from_le_bytes(leading(raw)?)),
        Format::Other(code) => return Err(DecodeError::UnsupportedFormat(code)),
    };

    let scaled = value * 10f64.powi(i32::from(descriptor.exponent));
    Ok(format!("{:.2}{}", scaled, unit_suffix(descriptor.unit)))
}

/// Renders a payload without format information: printable ASCII as text,
/// anything else as space separated decimal bytes.
pub fn fallback(raw: &[u8]) -> String {
    if raw.iter().all(|byte| (32..=126).contains(byte)) {
        return raw.iter().map(|byte| char::from(*byte)).collect();
    }

    raw.iter().map(|byte| format!("{} ", byte)).collect()
}

/// Decodes with the descriptor when present and usable, otherwise falls back.
pub fn render(raw: &[u8], descriptor: Option<&[u8]>) -> String {
    let decoded = descriptor
        .ok_or(DecodeError::DescriptorMissing)
        .and_then(PresentationFormat::parse)
        .and_then(|format| decode(raw, &format));

    match decoded {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => fallback(raw),
        Err(e) => {
            log::debug!("Falling back to raw rendering: {}", e);
            fallback(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(format: u8, exponent: i8, unit: u16) -> PresentationFormat {
        let unit = unit.to_le_bytes();
        PresentationFormat::parse(&[format, exponent as u8, unit[0], unit[1], 0x01, 0x00, 0x00]).unwrap()
    }

    #[test]
    fn parses_presentation_format() {
        let parsed = descriptor(0x06, -2, 0x27AD);
        assert_eq!(parsed.format, Format::Uint16);
        assert_eq!(parsed.exponent, -2);
        assert_eq!(parsed.unit, 0x27AD);
    }

    #[test]
    fn short_descriptor_is_malformed() {
        assert_eq!(
            PresentationFormat::parse(&[0x06, 0x00, 0xAD, 0x27]),
            Err(DecodeError::DescriptorMalformed(4))
        );
    }

    #[test]
    fn decodes_boolean() {
        let format = descriptor(0x01, 0, 0x2700);
        assert_eq!(decode(&[0x01], &format).unwrap(), "true");
        assert_eq!(decode(&[0x00], &format).unwrap(), "false");
        assert_eq!(decode(&[], &format).unwrap(), "false");
    }

    #[test]
    fn decodes_uint16_with_exponent_and_unit() {
        let format = descriptor(0x06, -2, 0x27AD);
        assert_eq!(decode(&1234u16.to_le_bytes(), &format).unwrap(), "12.34rpm");
    }

    #[test]
    fn decodes_uint32() {
        let format = descriptor(0x04, 1, 0x2701);
        assert_eq!(decode(&70_000u32.to_le_bytes(), &format).unwrap(), "700000.00m");
    }

    #[test]
    fn decodes_sint16() {
        let format = descriptor(0x0A, -1, 0x27B1);
        assert_eq!(decode(&(-500i16).to_le_bytes(), &format).unwrap(), "-50.00°C");
    }

    #[test]
    fn decodes_sint32() {
        let format = descriptor(0x08, 0, 0x27AC);
        assert_eq!(decode(&(-42i32).to_le_bytes(), &format).unwrap(), "-42.00A");
    }

    #[test]
    fn decodes_float32() {
        let format = descriptor(0x0E, 0, 0x27AE);
        assert_eq!(decode(&3.5f32.to_le_bytes(), &format).unwrap(), "3.50V");
    }

    #[test]
    fn unknown_unit_has_no_suffix() {
        let format = descriptor(0x06, 0, 0x1234);
        assert_eq!(decode(&7u16.to_le_bytes(), &format).unwrap(), "7.00");
    }

    #[test]
    fn short_payloads_are_rejected() {
        for (code, width) in [(0x04u8, 4usize), (0x06, 2), (0x08, 4), (0x0A, 2), (0x0E, 4)] {
            let format = descriptor(code, 0, 0x2700);
            let payload = vec![0x01; width - 1];
            assert_eq!(
                decode(&payload, &format),
                Err(DecodeError::PayloadTooShort { needed: width, actual: width - 1 })
            );
        }
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let format = descriptor(0x19, 0, 0x2700);
        assert_eq!(decode(b"abc", &format), Err(DecodeError::UnsupportedFormat(0x19)));
    }

    #[test]
    fn fallback_renders_ascii_as_text() {
        assert_eq!(fallback(b"OK"), "OK");
        assert_eq!(fallback(b"Skp-42 v1.0"), "Skp-42 v1.0");
    }

    #[test]
    fn fallback_renders_binary_as_decimal_bytes() {
        assert_eq!(fallback(&[0xFF]), "255 ");
        assert_eq!(fallback(&[0x4F, 0x00, 0x0A]), "79 0 10 ");
    }

    #[test]
    fn fallback_of_empty_is_empty() {
        assert_eq!(fallback(&[]), "");
    }

    #[test]
    fn render_uses_fallback_without_usable_descriptor() {
        assert_eq!(render(b"OK", None), "OK");
        assert_eq!(render(&[0xC8], Some(&[0x04, 0x00, 0x00, 0x27])), "200 ");
        // uint32 needs four bytes, a single byte falls back
        assert_eq!(render(&[0xC8], Some(&[0x04, 0x00, 0x00, 0x27, 0x01, 0x00, 0x00])), "200 ");
    }

    #[test]
    fn render_decodes_battery_level() {
        let cpf = [0x06, 0x00, 0xB3, 0x27, 0x01, 0x00, 0x00];
        assert_eq!(render(&[0x55, 0x00], Some(&cpf)), "85.00%");
    }
}
