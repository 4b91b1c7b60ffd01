//! index walks index btrees for equality lookups.
//!
//! Index cell formats:
//! Index leaf cell (page type 0x0a): a varint payload size, then a record.
//! Index interior cell (page type 0x02): a 4-byte big-endian left child
//! page number, a varint payload size, then a record.
//!
//! The record is `(indexed column values..., rowid)`, and entries are
//! ordered by their column tuple with the rowid as the final tiebreaker.
//! Matching entries can therefore sit in interior cells as well as in
//! leaves, and both must be emitted.

use byteorder::{BigEndian, ReadBytesExt};
use std::cmp::Ordering;
use std::io::Cursor;

use super::{cell, header, Error, PageType, RowId};
use crate::dbheader::TextEncoding;
use crate::pager::{PageNum, Pager};
use crate::record;
use crate::sql_value::SqlValue;
use crate::varint;

// One decoded index cell: the left child (interior pages only), the first
// indexed column, and the trailing rowid.
struct Entry {
    left_child: Option<PageNum>,
    first_column: SqlValue,
    rowid: RowId,
}

fn decode_entry(cell: &[u8], page_type: PageType, encoding: TextEncoding) -> Result<Entry, Error> {
    let (left_child, mut offset) = match page_type {
        PageType::IndexInterior => {
            let mut c = Cursor::new(cell);
            let child = c
                .read_u32::<BigEndian>()
                .map_err(|_| Error::TruncatedCell)?;
            (Some(child as PageNum), 4)
        }
        PageType::IndexLeaf => (None, 0),
        other => return Err(Error::UnexpectedPageType(other, PageType::IndexLeaf)),
    };
    let (payload_size, n) = varint::read_varint(cell, offset)?;
    offset += n;
    let payload_size = usize::try_from(payload_size).map_err(|_| Error::TruncatedCell)?;
    if offset + payload_size > cell.len() {
        return Err(Error::PayloadOverflow);
    }
    let values = record::decode_values(&cell[offset..offset + payload_size], encoding)?;
    let rowid = match values.last() {
        Some(SqlValue::Int(r)) => *r,
        _ => return Err(Error::BadIndexEntry),
    };
    let first_column = values.into_iter().next().ok_or(Error::BadIndexEntry)?;
    Ok(Entry {
        left_child,
        first_column,
        rowid,
    })
}

// TODO: compare on later indexed columns as well, so multi-column indexes
// can serve predicates beyond their leading column.
fn compare(stored: &SqlValue, key: &SqlValue) -> Result<Ordering, Error> {
    stored.storage_cmp(key).ok_or_else(|| {
        Error::Record(record::Error::Incomparable {
            stored: stored.type_name(),
            literal: key.type_name(),
        })
    })
}

/// Collects the rowids of every index entry whose first indexed column
/// equals `key`, walking the btree rooted at `root`.
///
/// Rowids come back in index order, which for a single equal key is
/// already ascending rowid order; callers re-fetch the rows through the
/// table btree, so emission order there is ascending rowid regardless.
pub fn lookup_equal(
    pager: &Pager,
    root: PageNum,
    key: &SqlValue,
    encoding: TextEncoding,
) -> Result<Vec<RowId>, Error> {
    let mut rowids = vec![];
    walk(pager, root, key, encoding, &mut rowids)?;
    Ok(rowids)
}

fn walk(
    pager: &Pager,
    pgnum: PageNum,
    key: &SqlValue,
    encoding: TextEncoding,
    out: &mut Vec<RowId>,
) -> Result<(), Error> {
    let page = pager.get_page_ro(pgnum)?;
    let offset = super::btree_start_offset(pgnum);
    let hdr = header::parse(page, offset)?;
    let page_type = hdr.page_type;
    if !matches!(page_type, PageType::IndexLeaf | PageType::IndexInterior) {
        return Err(Error::UnexpectedPageType(page_type, PageType::IndexLeaf));
    }
    let cells = cell::Array::new(page, offset)?;

    // First cell whose first column is >= key; everything before it is
    // strictly smaller and cannot match.
    let (mut lo, mut hi) = (0, cells.len());
    while lo < hi {
        let mid = (lo + hi) / 2;
        let entry = decode_entry(cells.cell(mid), page_type, encoding)?;
        if compare(&entry.first_column, key)? == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    for i in lo..cells.len() {
        let entry = decode_entry(cells.cell(i), page_type, encoding)?;
        if let Some(child) = entry.left_child {
            // The left subtree can still hold entries equal to the key.
            walk(pager, child, key, encoding, out)?;
        }
        match compare(&entry.first_column, key)? {
            // Smaller entries sit before the binary-search position in a
            // well-formed index.
            Ordering::Less => {}
            Ordering::Equal => out.push(entry.rowid),
            Ordering::Greater => return Ok(()),
        }
    }
    // Never saw an entry above the key, so the rightmost subtree may
    // still contain matches.
    if let Some(rightmost) = hdr.rightmost_pointer {
        walk(pager, rightmost as PageNum, key, encoding, out)?;
    }
    Ok(())
}
