//! header reads the header of a btree page.
//! A btree page is divided into regions in the following order
//! 1. The 100-byte database file header (found on page 1 only)
//! 2. The 8 or 12 byte btree page header
//! 3. The cell pointer array
//! 4. Unallocated space
//! 5. The cell content area

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

use super::{Error, PageType};

#[derive(Debug, Clone)]
pub struct Header {
    pub page_type: PageType,
    pub freeblock_start: u32,
    pub num_cells: usize,
    pub cell_content_start: u32,
    pub fragmented_free_bytes: u8,
    pub rightmost_pointer: Option<u32>,
}

pub fn parse(page: &[u8], non_btree_header_bytes: usize) -> Result<Header, Error> {
    let mut c = Cursor::new(page);
    // The first page carries the file header, which is not btree content.
    c.seek(SeekFrom::Start(non_btree_header_bytes as u64))
        .map_err(|_| Error::TruncatedHeader)?;

    // Offset  Size  Description
    // 0       1     The one-byte flag indicating the btree page type.
    let type_byte = c.read_u8().map_err(|_| Error::TruncatedHeader)?;
    let page_type = PageType::from_byte(type_byte).ok_or(Error::InvalidPageType(type_byte))?;

    // 1       2     Start of the first freeblock on the page, or zero.
    let freeblock_start = c
        .read_u16::<BigEndian>()
        .map_err(|_| Error::TruncatedHeader)? as u32;
    // 3       2     The number of cells on the page.
    let num_cells = c
        .read_u16::<BigEndian>()
        .map_err(|_| Error::TruncatedHeader)? as usize;
    // 5       2     Start of the cell content area. Zero is interpreted as 65536.
    let cell_content_start = match c
        .read_u16::<BigEndian>()
        .map_err(|_| Error::TruncatedHeader)?
    {
        0 => 65536,
        x => x as u32,
    };
    // 7       1     The number of fragmented free bytes in the cell content area.
    let fragmented_free_bytes = c.read_u8().map_err(|_| Error::TruncatedHeader)?;
    // 8       4     The right-most pointer. Interior btree pages only.
    let rightmost_pointer = if page_type.is_interior() {
        Some(
            c.read_u32::<BigEndian>()
                .map_err(|_| Error::TruncatedHeader)?,
        )
    } else {
        None
    };

    Ok(Header {
        page_type,
        freeblock_start,
        num_cells,
        cell_content_start,
        fragmented_free_bytes,
        rightmost_pointer,
    })
}
