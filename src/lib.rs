//! rolite is a read-only query engine for the SQLite file format.
//!
//! It answers metadata queries (page size, table listing) and a
//! restricted form of SELECT (projection, optional `column = literal`
//! filter, COUNT(*)) against a database file.  It never writes and does
//! not honor transactions.

pub mod ast;
mod ast_to_ir;
pub mod btree;
pub mod dbheader;
pub mod formatting;
pub mod ir;
mod ir_interpreter;
pub mod pager;
pub mod parser;
pub mod pt_to_ast;
pub mod record;
pub mod schema;
pub mod serial_type;
pub mod sql_value;
pub mod varint;

extern crate pest;
#[macro_use]
extern crate pest_derive;

pub use ir_interpreter::{QueryOutput, Rows};

/// Everything that can go wrong answering a query.
///
/// The variants split into two classes: semantic errors about the query
/// itself (unknown table or column, unsupported statement shapes) and
/// failures of the underlying file (I/O, structural corruption, format
/// features outside the supported subset).  `exit_code` encodes the
/// split for the command line.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Pager(#[from] pager::Error),
    #[error(transparent)]
    Btree(#[from] btree::Error),
    #[error(transparent)]
    Record(#[from] record::Error),
    #[error("Database file is corrupt: {0}")]
    Corrupt(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Unknown table '{0}'")]
    UnknownTable(String),
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

impl Error {
    /// 1 for semantic errors about the query; 2 for I/O and corruption.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Parse(_)
            | Error::Unsupported(_)
            | Error::UnknownTable(_)
            | Error::UnknownColumn(_) => 1,
            _ => 2,
        }
    }
}

/// The `.dbinfo` numbers: the page size and the number of cells in the
/// schema table's root page (one per schema entry).
pub struct DbInfo {
    pub page_size: u32,
    pub num_tables: usize,
}

pub fn db_info(pager: &pager::Pager) -> Result<DbInfo, Error> {
    let page = pager.get_page_ro(schema::SCHEMA_BTREE_ROOT_PAGENUM)?;
    let hdr = btree::header::parse(page, btree::btree_start_offset(schema::SCHEMA_BTREE_ROOT_PAGENUM))
        .map_err(Error::Btree)?;
    Ok(DbInfo {
        page_size: pager.get_page_size(),
        num_tables: hdr.num_cells,
    })
}

/// The user tables to show in `.tables`, in schema order.
pub fn list_tables(pager: &pager::Pager) -> Result<Vec<String>, Error> {
    schema::user_table_names(pager)
}

/// Parses, plans and starts `query`, returning a count or a lazy row
/// stream that borrows the pager.
pub fn run_query<'p>(pager: &'p pager::Pager, query: &str) -> Result<QueryOutput<'p>, Error> {
    let stmt = pt_to_ast::parse_select_statement(query)?;
    let block = ast_to_ir::plan_select(pager, &stmt)?;
    ir_interpreter::run_ir(pager, &block)
}
