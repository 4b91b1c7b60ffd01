//! leaf iterates over the cells of a table btree leaf page.
//!
//! Table leaf cell format (page type 0x0d):
//! A varint which is the total number of bytes of payload.
//! A varint which is the integer key, a.k.a. "rowid".
//! The payload (a record).
//! Payloads that spill to overflow pages are not supported.

use super::{cell, Error, RowId};
use crate::varint;

#[derive(Debug)]
pub struct Iterator<'a> {
    cells: cell::Array<'a>,
    idx: usize,
    max_rowid: Option<RowId>,
    done: bool,
}

// Reads (payload_size, rowid, payload offset) from the front of a cell.
fn cell_key(cell: &[u8]) -> Result<(i64, RowId, usize), Error> {
    let (payload_size, n) = varint::read_varint(cell, 0)?;
    let (rowid, m) = varint::read_varint(cell, n)?;
    Ok((payload_size, rowid, n + m))
}

impl<'a> Iterator<'a> {
    pub fn new(cells: cell::Array<'a>) -> Iterator<'a> {
        Iterator {
            cells,
            idx: 0,
            max_rowid: None,
            done: false,
        }
    }

    /// Positions the iterator at the first cell with rowid >= `min` and
    /// arranges for it to stop after the last cell with rowid <= `max`.
    pub fn with_bounds(
        cells: cell::Array<'a>,
        min: RowId,
        max: RowId,
    ) -> Result<Iterator<'a>, Error> {
        let mut it = Iterator::new(cells);
        it.max_rowid = Some(max);
        // Rowids are strictly increasing in pointer-array order, so binary
        // search for the first cell at or above the lower bound.
        let (mut lo, mut hi) = (0, it.cells.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            let (_, rowid, _) = cell_key(it.cells.cell(mid))?;
            if rowid < min {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        it.idx = lo;
        Ok(it)
    }
}

impl<'a> core::iter::Iterator for Iterator<'a> {
    type Item = Result<(RowId, &'a [u8]), Error>;

    /// Returns the next (rowid, record payload) pair on the page.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.idx >= self.cells.len() {
            return None;
        }
        let cell = self.cells.cell(self.idx);
        self.idx += 1;
        let (payload_size, rowid, offset) = match cell_key(cell) {
            Ok(x) => x,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if let Some(max) = self.max_rowid {
            if rowid > max {
                self.done = true;
                return None;
            }
        }
        let payload_size = match usize::try_from(payload_size) {
            Ok(s) => s,
            Err(_) => {
                self.done = true;
                return Some(Err(Error::TruncatedCell));
            }
        };
        if offset + payload_size > cell.len() {
            // The declared payload does not fit between the cell start and
            // the end of the page, so it continues on an overflow page.
            self.done = true;
            return Some(Err(Error::PayloadOverflow));
        }
        Some(Ok((rowid, &cell[offset..offset + payload_size])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 512-byte table leaf page holding rowids 1..=10, each payload a
    // single one-character text column.
    fn leaf_page() -> Vec<u8> {
        let mut p = vec![0_u8; 512];
        p[..8].copy_from_slice(&[0x0d, 0x00, 0x00, 0x00, 0x0a, 0x01, 0xce, 0x00]);
        for i in 0..10_u8 {
            let off = 0x01fb - 5 * i as usize;
            p[8 + 2 * i as usize..10 + 2 * i as usize].copy_from_slice(&(off as u16).to_be_bytes());
            p[off..off + 5].copy_from_slice(&[0x03, i + 1, 0x02, 0x0f, 0x41 + i]);
        }
        p
    }

    #[test]
    fn test_leaf_iteration() {
        let p = leaf_page();
        let ca = cell::Array::new(&p, 0).unwrap();
        let items: Vec<(RowId, &[u8])> = Iterator::new(ca).map(|r| r.unwrap()).collect();
        assert_eq!(items.len(), 10);
        assert_eq!(items[0], (1, &[0x02, 0x0f, 0x41][..]));
        assert_eq!(items[9], (10, &[0x02, 0x0f, 0x4a][..]));
    }

    #[test]
    fn test_leaf_bounds() {
        let p = leaf_page();
        let ca = cell::Array::new(&p, 0).unwrap();
        let rowids: Vec<RowId> = Iterator::with_bounds(ca, 4, 7)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(rowids, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_leaf_bounds_outside_page() {
        let p = leaf_page();
        let ca = cell::Array::new(&p, 0).unwrap();
        assert_eq!(Iterator::with_bounds(ca, 11, 20).unwrap().count(), 0);
    }

    #[test]
    fn test_oversized_payload_is_overflow() {
        let mut p = leaf_page();
        // Declare a payload far larger than the rest of the page.
        p[0x01fb] = 0x7f;
        let ca = cell::Array::new(&p, 0).unwrap();
        let last = Iterator::new(ca).last().unwrap();
        assert!(matches!(last, Err(Error::PayloadOverflow)));
    }
}
