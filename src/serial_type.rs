//! Serial types are how the file format stores values.
//!
//! Each column body in a record is tagged by a serial type code in the
//! record header; the code determines both the body's length and how its
//! bytes decode.  Serial types are per-value, not per-column: the same
//! column can use different codes on different rows.

use byteorder::{BigEndian, ReadBytesExt};

use crate::dbheader::TextEncoding;
use crate::sql_value::SqlValue;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Serial type {0} is reserved for internal use.")]
    ReservedSerialType(i64),
    #[error("Invalid serial type code: {0}")]
    InvalidSerialTypeCode(i64),
    #[error("Serial type {0} wants {1} bytes but only {2} are available.")]
    ShortValue(i64, usize, usize),
}

/// Returns the size in bytes of the body of a value with the given serial
/// type code.
///
/// From: https://www.sqlite.org/fileformat.html#record_format
/// Serial Type     Content Size    Meaning
/// 0               0               NULL.
/// 1               1               8-bit twos-complement integer.
/// 2               2               big-endian 16-bit twos-complement integer.
/// 3               3               big-endian 24-bit twos-complement integer.
/// 4               4               big-endian 32-bit twos-complement integer.
/// 5               6               big-endian 48-bit twos-complement integer.
/// 6               8               big-endian 64-bit twos-complement integer.
/// 7               8               big-endian IEEE 754-2008 64-bit float.
/// 8               0               the integer 0.
/// 9               0               the integer 1.
/// 10,11           variable        reserved; never appear in a well-formed file.
/// N>=12, even     (N-12)/2        BLOB of that many bytes.
/// N>=13, odd      (N-13)/2        string in the text encoding, no terminator.
pub fn size(serial_type: i64) -> Result<usize, Error> {
    match serial_type {
        0 | 8 | 9 => Ok(0),
        1 => Ok(1),
        2 => Ok(2),
        3 => Ok(3),
        4 => Ok(4),
        5 => Ok(6),
        6 | 7 => Ok(8),
        10 | 11 => Err(Error::ReservedSerialType(serial_type)),
        t if t >= 12 => Ok(((t - 12 - (t % 2)) / 2) as usize),
        t => Err(Error::InvalidSerialTypeCode(t)),
    }
}

// Sign-extends a 3- or 6-byte big-endian integer body.
fn read_signed_be(data: &[u8]) -> i64 {
    let fill = if data[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut bytes = [fill; 8];
    bytes[8 - data.len()..].copy_from_slice(data);
    i64::from_be_bytes(bytes)
}

fn text_value(data: &[u8], encoding: TextEncoding) -> SqlValue {
    // A body that does not decode under the declared encoding is surfaced
    // as its raw bytes rather than failing the row.
    match encoding {
        TextEncoding::Utf8 => match String::from_utf8(data.to_vec()) {
            Ok(s) => SqlValue::Text(s),
            Err(e) => SqlValue::Blob(e.into_bytes()),
        },
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
            if data.len() % 2 != 0 {
                return SqlValue::Blob(data.to_vec());
            }
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| match encoding {
                    TextEncoding::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                    _ => u16::from_be_bytes([pair[0], pair[1]]),
                })
                .collect();
            match String::from_utf16(&units) {
                Ok(s) => SqlValue::Text(s),
                Err(_) => SqlValue::Blob(data.to_vec()),
            }
        }
    }
}

/// Deserializes a value body into a `SqlValue`.
///
/// `data` must be exactly `size(serial_type)` bytes; callers slice the
/// record body accordingly.
///
/// Text and blob bodies are copied into owned buffers, so the returned
/// value does not borrow from the page.
pub fn to_sql_value(
    serial_type: i64,
    data: &[u8],
    encoding: TextEncoding,
) -> Result<SqlValue, Error> {
    use SqlValue::*;

    let want = size(serial_type)?;
    if data.len() < want {
        return Err(Error::ShortValue(serial_type, want, data.len()));
    }
    let mut c = std::io::Cursor::new(data);
    let short = |_| Error::ShortValue(serial_type, want, data.len());
    match serial_type {
        0 => Ok(Null()),
        1 => Ok(Int(c.read_i8().map_err(short)? as i64)),
        2 => Ok(Int(c.read_i16::<BigEndian>().map_err(short)? as i64)),
        3 => Ok(Int(read_signed_be(&data[..3]))),
        4 => Ok(Int(c.read_i32::<BigEndian>().map_err(short)? as i64)),
        5 => Ok(Int(read_signed_be(&data[..6]))),
        6 => Ok(Int(c.read_i64::<BigEndian>().map_err(short)?)),
        7 => Ok(Real(c.read_f64::<BigEndian>().map_err(short)?)),
        8 => Ok(Int(0)),
        9 => Ok(Int(1)),
        t if t >= 12 && t % 2 == 0 => Ok(Blob(data[..want].to_vec())),
        t if t >= 13 => Ok(text_value(&data[..want], encoding)),
        t => Err(Error::InvalidSerialTypeCode(t)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SqlValue::*;

    #[test]
    fn test_size_table() {
        let cases: Vec<(i64, usize)> = vec![
            (0, 0),
            (1, 1),
            (2, 2),
            (3, 3),
            (4, 4),
            (5, 6),
            (6, 8),
            (7, 8),
            (8, 0),
            (9, 0),
            (12, 0),
            (13, 0),
            (18, 3),
            (19, 3),
            (24, 6),
        ];
        for (t, expected) in cases {
            assert_eq!(size(t).unwrap(), expected, "serial type {}", t);
        }
        assert_eq!(size(10), Err(Error::ReservedSerialType(10)));
        assert_eq!(size(11), Err(Error::ReservedSerialType(11)));
        assert_eq!(size(-3), Err(Error::InvalidSerialTypeCode(-3)));
    }

    #[test]
    fn test_integers_sign_extend() {
        let enc = TextEncoding::Utf8;
        let cases: Vec<(i64, &[u8], i64)> = vec![
            (1, &[0x7f], 127),
            (1, &[0xff], -1),
            (2, &[0x01, 0x00], 256),
            (2, &[0xff, 0xff], -1),
            (3, &[0x01, 0x00, 0x00], 65536),
            (3, &[0xff, 0xff, 0xff], -1),
            (4, &[0x80, 0x00, 0x00, 0x00], i32::MIN as i64),
            (5, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xfe], -2),
            (5, &[0x00, 0x00, 0x01, 0x00, 0x00, 0x00], 1 << 24),
            (6, &[0xff; 8], -1),
        ];
        for (t, data, expected) in cases {
            assert_eq!(to_sql_value(t, data, enc).unwrap(), Int(expected));
        }
    }

    #[test]
    fn test_float_and_literals() {
        let enc = TextEncoding::Utf8;
        assert_eq!(
            to_sql_value(7, &3.1415_f64.to_be_bytes(), enc).unwrap(),
            Real(3.1415)
        );
        assert_eq!(to_sql_value(8, b"", enc).unwrap(), Int(0));
        assert_eq!(to_sql_value(9, b"", enc).unwrap(), Int(1));
    }

    #[test]
    fn test_text_and_blob() {
        let enc = TextEncoding::Utf8;
        assert_eq!(
            to_sql_value(19, b"Ten", enc).unwrap(),
            Text("Ten".to_string())
        );
        assert_eq!(to_sql_value(13, b"", enc).unwrap(), Text(String::new()));
        assert_eq!(
            to_sql_value(18, &[0x00, 0x01, 0xff], enc).unwrap(),
            Blob(vec![0, 1, 255])
        );
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_raw_bytes() {
        let bad = [0xff, 0xfe, 0x41];
        assert_eq!(
            to_sql_value(19, &bad, TextEncoding::Utf8).unwrap(),
            Blob(bad.to_vec())
        );
    }

    #[test]
    fn test_utf16_decoding() {
        // "Hi" in UTF-16LE and UTF-16BE; serial type for 4 bytes of text is 21.
        assert_eq!(
            to_sql_value(21, &[0x48, 0x00, 0x69, 0x00], TextEncoding::Utf16Le).unwrap(),
            Text("Hi".to_string())
        );
        assert_eq!(
            to_sql_value(21, &[0x00, 0x48, 0x00, 0x69], TextEncoding::Utf16Be).unwrap(),
            Text("Hi".to_string())
        );
        // An unpaired surrogate does not decode.
        assert_eq!(
            to_sql_value(17, &[0x00, 0xd8], TextEncoding::Utf16Le).unwrap(),
            Blob(vec![0x00, 0xd8])
        );
    }

    #[test]
    fn test_short_value_is_an_error() {
        assert!(matches!(
            to_sql_value(4, &[0x00, 0x01], TextEncoding::Utf8),
            Err(Error::ShortValue(4, 4, 2))
        ));
    }
}
