//! dbheader reads the 100-byte header at the start of a database file.
//!
//! Of the header, the engine consults the page size (offset 16), the
//! reserved-space byte (offset 20, must be zero) and the text encoding
//! (offset 56).  The magic string is checked so that a file that is not a
//! database at all fails fast.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("The magic bytes for this file are wrong.")]
    WrongMagic,
    #[error("The pagesize is not supported by this code, though it may be valid format.")]
    UnsupportedPagesize,
    #[error("The file uses reserved space at the end of each page, which is not supported.")]
    UnsupportedReservedSpace,
    #[error("The text encoding byte is not one of the defined encodings.")]
    InvalidTextEncoding,
    #[error("Error reading file.")]
    ReadFailed,
}

/// How TEXT column bodies are encoded, from header bytes [56..60).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

// The subset of the database file header the engine cares about.
#[derive(Debug, Clone)]
pub struct DbfileHeader {
    pub pagesize: u32,
    pub text_encoding: TextEncoding,
}

pub const DB_HEADER_BYTES: usize = 100;
const MAGIC_STRING: &[u8] = &[
    0x53, 0x51, 0x4c, 0x69, 0x74, 0x65, 0x20, 0x66, 0x6f, 0x72, 0x6d, 0x61, 0x74, 0x20, 0x33, 0x00,
];

pub fn get_header_clone(f: &mut std::fs::File) -> Result<DbfileHeader, Error> {
    let mut v = vec![0_u8; DB_HEADER_BYTES];
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;
    f.read_exact(&mut v[..]).map_err(|_| Error::ReadFailed)?;
    get_header(&mut Cursor::new(v))
}

pub fn get_header<R: Read + Seek>(f: &mut R) -> Result<DbfileHeader, Error> {
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;

    // Offset  Size  Description
    // 0       16    The header string: "SQLite format 3\000"
    let mut fileid_buffer = [0; 16];
    f.read_exact(&mut fileid_buffer)
        .map_err(|_| Error::ReadFailed)?;
    if fileid_buffer != MAGIC_STRING {
        return Err(Error::WrongMagic);
    }

    // Offset  Size  Description
    // 16      2     The database page size in bytes. A power of two between 512
    //               and 32768 inclusive, or the value 1 representing 65536.
    let pagesize: u32 = match f.read_u16::<BigEndian>().map_err(|_| Error::ReadFailed)? {
        1 => 65536,
        x if (512..=32768).contains(&x) && x.is_power_of_two() => x as u32,
        _ => return Err(Error::UnsupportedPagesize),
    };

    // Offset  Size  Description
    // 18      1     File format write version.
    // 19      1     File format read version.
    // 20      1     Bytes of unused "reserved" space at the end of each page. Usually 0.
    f.seek(SeekFrom::Start(20)).map_err(|_| Error::ReadFailed)?;
    if f.read_u8().map_err(|_| Error::ReadFailed)? != 0x00 {
        return Err(Error::UnsupportedReservedSpace);
    }

    // Offset  Size  Description
    // 56      4     The database text encoding. A value of 1 means UTF-8.
    //               A value of 2 means UTF-16le. A value of 3 means UTF-16be.
    f.seek(SeekFrom::Start(56)).map_err(|_| Error::ReadFailed)?;
    let text_encoding = match f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)? {
        1 => TextEncoding::Utf8,
        2 => TextEncoding::Utf16Le,
        3 => TextEncoding::Utf16Be,
        _ => return Err(Error::InvalidTextEncoding),
    };

    Ok(DbfileHeader {
        pagesize,
        text_encoding,
    })
}
