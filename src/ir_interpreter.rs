//! Executes SELECT intermediate representation (IR).
//!
//! Every block becomes either a single count or a lazy, forward-only row
//! stream.  Rows are owned (`Vec<SqlValue>`); the stream borrows only the
//! pager, so callers may hold rows across `next()` calls freely.

use std::collections::HashSet;

use crate::btree;
use crate::dbheader::TextEncoding;
use crate::ir;
use crate::pager::Pager;
use crate::record;
use crate::sql_value::SqlValue;
use crate::Error;

/// What a query produces: a count, or a stream of rows.
#[derive(Debug)]
pub enum QueryOutput<'p> {
    Count(u64),
    Rows(Rows<'p>),
}

/// A lazy row stream.  Rows come out in ascending rowid order for every
/// access path: scans and rowid lookups traverse in rowid order, and
/// index-driven fetches re-traverse the table btree over the collected
/// rowid set rather than following index order.
#[derive(Debug)]
pub struct Rows<'p> {
    cursor: Option<btree::table::Cursor<'p>>,
    encoding: TextEncoding,
    output: ir::Output,
    predicate: Option<ir::Predicate>,
    rowid_set: Option<HashSet<i64>>,
    failed: bool,
}

// Comparison failures are query-shape problems (the literal cannot be
// compared to what the column stores), not file corruption.
fn record_error(e: record::Error) -> Error {
    match e {
        record::Error::Incomparable { stored, literal } => Error::Unsupported(format!(
            "cannot compare a stored {} value to a {} literal",
            stored, literal
        )),
        other => Error::Record(other),
    }
}

fn btree_error(e: btree::Error) -> Error {
    match e {
        btree::Error::Record(inner) => record_error(inner),
        other => Error::Btree(other),
    }
}

impl<'p> Iterator for Rows<'p> {
    type Item = Result<Vec<SqlValue>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        loop {
            let (rowid, payload) = match cursor.next()? {
                Ok(item) => item,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(btree_error(e)));
                }
            };
            if let Some(set) = &self.rowid_set {
                if !set.contains(&rowid) {
                    continue;
                }
            }
            let predicate = self
                .predicate
                .as_ref()
                .map(|p| (p.column, &p.value));
            match record::decode_record(
                payload,
                self.encoding,
                &self.output.projection,
                predicate,
                self.output.pk_col,
                rowid,
            ) {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(record_error(e)));
                }
            }
        }
    }
}

/// Runs an IR block, returning the count or the row stream it denotes.
pub fn run_ir<'p>(pager: &'p Pager, block: &ir::Block) -> Result<QueryOutput<'p>, Error> {
    let encoding = pager.get_text_encoding();
    match block {
        ir::Block::Scan(scan) => Ok(QueryOutput::Rows(Rows {
            cursor: Some(btree::table::Cursor::scan(pager, scan.root)),
            encoding,
            output: scan.output.clone(),
            predicate: scan.predicate.clone(),
            rowid_set: None,
            failed: false,
        })),
        ir::Block::RowidEq(lookup) => Ok(QueryOutput::Rows(Rows {
            cursor: Some(btree::table::Cursor::rowid_range(
                pager,
                lookup.root,
                lookup.rowid,
                lookup.rowid,
            )),
            encoding,
            output: lookup.output.clone(),
            predicate: None,
            rowid_set: None,
            failed: false,
        })),
        ir::Block::IndexSeekEq(seek) => {
            let rowids = btree::index::lookup_equal(pager, seek.index_root, &seek.key, encoding)
                .map_err(btree_error)?;
            let cursor = match (rowids.iter().min(), rowids.iter().max()) {
                (Some(&min), Some(&max)) => Some(btree::table::Cursor::rowid_range(
                    pager,
                    seek.table_root,
                    min,
                    max,
                )),
                _ => None,
            };
            Ok(QueryOutput::Rows(Rows {
                cursor,
                encoding,
                output: seek.output.clone(),
                predicate: None,
                rowid_set: Some(rowids.into_iter().collect()),
                failed: false,
            }))
        }
        ir::Block::Count(count) => {
            let mut n = 0_u64;
            match run_ir(pager, &count.input)? {
                QueryOutput::Rows(rows) => {
                    for row in rows {
                        row?;
                        n += 1;
                    }
                }
                QueryOutput::Count(_) => {
                    return Err(Error::Unsupported(
                        "COUNT over a counting block".to_string(),
                    ))
                }
            }
            Ok(QueryOutput::Count(n))
        }
    }
}
