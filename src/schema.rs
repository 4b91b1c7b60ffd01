//! schema reads the schema table and resolves table names to root pages.
//!
//! Page 1 (the first page) is always a btree page, and it is the root page
//! of the schema table.  Its rows describe every table, index, view and
//! trigger in the database and point at their root pages.

use crate::btree;
use crate::pager::{PageNum, Pager};
use crate::record;
use crate::sql_value::SqlValue;
use crate::Error;

pub const SCHEMA_TABLE_NAME: &str = "sqlite_schema";
pub const SCHEMA_BTREE_ROOT_PAGENUM: PageNum = 1;
pub const SCHEMA_SCHEMA: &str =
    "CREATE TABLE sqlite_schema (type text, name text, tbl_name text, rootpage integer, sql text)";

// Names that always refer to the schema table itself.
const SCHEMA_TABLE_ALIASES: [&str; 4] = [
    "sqlite_schema",
    "sqlite_master",
    "sqlite_temp_schema",
    "sqlite_temp_master",
];

/// One row of the schema table.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub kind: String,
    pub name: String,
    pub tbl_name: String,
    pub rootpage: PageNum,
    /// The creation SQL.  NULL for automatic entries such as
    /// `sqlite_autoindex_*`.
    pub sql: Option<String>,
}

/// A table resolved by name, together with the indexes that cover it.
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    pub rootpage: PageNum,
    pub create_sql: String,
    pub indexes: Vec<IndexEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub rootpage: PageNum,
    pub sql: String,
}

pub fn is_schema_table_name(name: &str) -> bool {
    SCHEMA_TABLE_ALIASES
        .iter()
        .any(|a| a.eq_ignore_ascii_case(name))
}

fn text_column(values: &[SqlValue], idx: usize) -> Result<String, Error> {
    match values.get(idx) {
        Some(SqlValue::Text(s)) => Ok(s.clone()),
        _ => Err(Error::Corrupt(format!(
            "schema row column {} is not text",
            idx
        ))),
    }
}

/// Reads every row of the schema table, in rowid order.
pub fn read_schema(pager: &Pager) -> Result<Vec<SchemaEntry>, Error> {
    let encoding = pager.get_text_encoding();
    let mut entries = vec![];
    for item in btree::table::Cursor::scan(pager, SCHEMA_BTREE_ROOT_PAGENUM) {
        let (_rowid, payload) = item?;
        let values = record::decode_values(payload, encoding)?;
        if values.len() < 5 {
            return Err(Error::Corrupt(format!(
                "schema row has {} columns, expected 5",
                values.len()
            )));
        }
        let rootpage = match values[3] {
            SqlValue::Int(n) if n >= 0 => n as PageNum,
            _ => return Err(Error::Corrupt("schema rootpage is not an integer".into())),
        };
        let sql = match &values[4] {
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Null() => None,
            _ => return Err(Error::Corrupt("schema sql column is not text".into())),
        };
        entries.push(SchemaEntry {
            kind: text_column(&values, 0)?,
            name: text_column(&values, 1)?,
            tbl_name: text_column(&values, 2)?,
            rootpage,
            sql,
        });
    }
    Ok(entries)
}

/// Resolves `table_name` (ASCII case-insensitive) to its root page,
/// creation SQL and covering indexes.
///
/// The schema table's own names resolve to a synthesized entry rooted at
/// page 1 without touching the file.
pub fn resolve_table(pager: &Pager, table_name: &str) -> Result<ResolvedTable, Error> {
    if is_schema_table_name(table_name) {
        return Ok(ResolvedTable {
            rootpage: SCHEMA_BTREE_ROOT_PAGENUM,
            create_sql: SCHEMA_SCHEMA.to_string(),
            indexes: vec![],
        });
    }
    let entries = read_schema(pager)?;
    let table = entries
        .iter()
        .find(|e| e.kind == "table" && e.tbl_name.eq_ignore_ascii_case(table_name))
        .ok_or_else(|| Error::UnknownTable(table_name.to_string()))?;
    let create_sql = table
        .sql
        .clone()
        .ok_or_else(|| Error::Corrupt(format!("table {} has no creation sql", table_name)))?;
    let indexes = entries
        .iter()
        .filter(|e| e.kind == "index" && e.tbl_name.eq_ignore_ascii_case(table_name))
        .filter_map(|e| {
            e.sql.as_ref().map(|sql| IndexEntry {
                rootpage: e.rootpage,
                sql: sql.clone(),
            })
        })
        .collect();
    Ok(ResolvedTable {
        rootpage: table.rootpage,
        create_sql,
        indexes,
    })
}

/// The user tables to show in `.tables`: type `table`, name not starting
/// with `sqlite_`, in rowid order.
pub fn user_table_names(pager: &Pager) -> Result<Vec<String>, Error> {
    Ok(read_schema(pager)?
        .into_iter()
        .filter(|e| e.kind == "table" && !e.tbl_name.starts_with("sqlite_"))
        .map(|e| e.tbl_name)
        .collect())
}
