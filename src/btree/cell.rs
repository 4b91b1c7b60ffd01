//! cell::Array addresses the cells in a btree page.
//!
//! The cell pointer array immediately follows the btree page header: one
//! big-endian u16 offset per cell, arranged in key order with the
//! smallest key first.  Random access is needed because range lookups
//! binary-search this array.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

use super::{header, Error, PageType};

#[derive(Debug)]
pub struct Array<'a> {
    page: &'a [u8],
    page_type: PageType,
    offsets: Vec<usize>,
}

impl<'a> Array<'a> {
    /// Reads the cell pointer array of the page.
    ///
    /// `non_btree_header_bytes` is 100 on page 1 and 0 elsewhere.
    pub fn new(page: &'a [u8], non_btree_header_bytes: usize) -> Result<Array<'a>, Error> {
        let hdr = header::parse(page, non_btree_header_bytes)?;
        let mut c = Cursor::new(page);
        c.seek(SeekFrom::Start(
            (non_btree_header_bytes + hdr.page_type.header_size()) as u64,
        ))
        .map_err(|_| Error::TruncatedHeader)?;

        let mut offsets = Vec::with_capacity(hdr.num_cells);
        for _ in 0..hdr.num_cells {
            let off = c
                .read_u16::<BigEndian>()
                .map_err(|_| Error::TruncatedHeader)? as usize;
            if off >= page.len() {
                return Err(Error::CellPointerOutOfBounds);
            }
            offsets.push(off);
        }
        Ok(Array {
            page,
            page_type: hdr.page_type,
            offsets,
        })
    }

    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the bytes of cell `i`, from its start to the end of the page.
    /// Cell decoders read only the bytes their format declares.
    pub fn cell(&self, i: usize) -> &'a [u8] {
        &self.page[self.offsets[i]..]
    }
}

// From command: xxd resources/test/multipage-512B-page.db
#[cfg(test)]
const TEST_PAGE: &str = "0d00 0000 0a01 ce00 01fb 01f6 01f1 01ec\n\
    01e7 01e2 01dd 01d8 01d3 01ce 0000 0000";
