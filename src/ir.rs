//! `ir` defines an intermediate representation (IR) for SELECT statements.
//!
//! The AST and IR are separate: the IR represents the querying procedure
//! (scan vs key lookup), and depends on the availability of indexes.
//! As an example, `select * from t where a = 1` plans as a `Scan` with the
//! predicate pushed into the record decoder; but if an index on `a`
//! exists, it plans as an `IndexSeekEq` that looks up matching rowids in
//! the index btree and fetches only those rows from the table btree.

use crate::pager::PageNum;
use crate::record::ColumnRef;
use crate::sql_value::SqlValue;

/// `Block` is any of the IR blocks.  Each block emits rows (or, for
/// `Count`, a single number) to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Scan(Scan),
    RowidEq(RowidEq),
    IndexSeekEq(IndexSeekEq),
    Count(Count),
}

/// How emitted rows are shaped: the projected columns in output order,
/// and the `INTEGER PRIMARY KEY` column of the table, if any, whose NULL
/// storage reads back as the rowid.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub projection: Vec<ColumnRef>,
    pub pk_col: Option<usize>,
}

/// A one-pass scan over all the rows of a table, with an optional
/// equality predicate evaluated inside the record decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub root: PageNum,
    pub output: Output,
    pub predicate: Option<Predicate>,
}

/// `column = literal` on a declared column (never on the rowid).
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: usize,
    pub value: SqlValue,
}

/// A lookup of the single row with the given rowid, by binary-search
/// descent of the table btree.
#[derive(Debug, Clone, PartialEq)]
pub struct RowidEq {
    pub root: PageNum,
    pub output: Output,
    pub rowid: i64,
}

/// An index-driven lookup: collect the rowids of index entries whose
/// first indexed column equals `key`, then fetch those rows from the
/// table btree in ascending rowid order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSeekEq {
    pub table_root: PageNum,
    pub index_root: PageNum,
    pub key: SqlValue,
    pub output: Output,
}

/// COUNT(*): consume the input block's rows and emit how many there were.
#[derive(Debug, Clone, PartialEq)]
pub struct Count {
    pub input: Box<Block>,
}
