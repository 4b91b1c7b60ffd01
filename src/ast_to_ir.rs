//! `ast_to_ir` converts a SELECT AST into IR, choosing the access path.
//!
//! This is where names become positions: the target table is resolved
//! through the schema table, its CREATE TABLE statement supplies the
//! column order, and the projection and predicate are bound to column
//! indexes.  The access path is chosen in this order: a predicate on the
//! rowid uses `RowidEq`; a predicate on the leading column of some index
//! uses `IndexSeekEq`; anything else scans with the predicate pushed into
//! the record decoder.

use crate::ast;
use crate::ir;
use crate::pager::Pager;
use crate::pt_to_ast;
use crate::record::ColumnRef;
use crate::schema;
use crate::sql_value::SqlValue;
use crate::Error;

/// The name that always resolves to the implicit rowid column.
const ROWID_NAME: &str = "rowid";

fn constant_to_value(c: &ast::Constant) -> SqlValue {
    match c {
        ast::Constant::Int(i) => SqlValue::Int(*i),
        ast::Constant::String(s) => SqlValue::Text(s.clone()),
    }
}

// True for column types like "integer primary key" and
// "integer primary key autoincrement".
fn is_integer_primary_key(coltype: &str) -> bool {
    let words: Vec<String> = coltype
        .split_whitespace()
        .take(3)
        .map(|w| w.to_ascii_lowercase())
        .collect();
    words == ["integer", "primary", "key"]
}

fn lookup_column(colnames: &[String], name: &str) -> Result<ColumnRef, Error> {
    if name.eq_ignore_ascii_case(ROWID_NAME) {
        return Ok(ColumnRef::Rowid);
    }
    colnames
        .iter()
        .position(|c| c.eq_ignore_ascii_case(name))
        .map(ColumnRef::Col)
        .ok_or_else(|| Error::UnknownColumn(name.to_string()))
}

fn is_count_star(items: &[ast::SelItem]) -> bool {
    match items {
        [ast::SelItem::Function(f)] => {
            f.name.eq_ignore_ascii_case("count") && f.args == [ast::SelItem::Star]
        }
        _ => false,
    }
}

fn resolve_projection(
    items: &[ast::SelItem],
    colnames: &[String],
) -> Result<Vec<ColumnRef>, Error> {
    if items.len() == 1 && items[0].is_star() {
        return Ok((0..colnames.len()).map(ColumnRef::Col).collect());
    }
    let mut projection = vec![];
    for item in items {
        match item {
            ast::SelItem::ColName(c) => projection.push(lookup_column(colnames, &c.name)?),
            ast::SelItem::Star => {
                return Err(Error::Unsupported(
                    "'*' cannot be combined with other select items".to_string(),
                ))
            }
            ast::SelItem::Function(f) => {
                return Err(Error::Unsupported(format!(
                    "function {} is not supported here",
                    f.name
                )))
            }
        }
    }
    Ok(projection)
}

// Finds an index whose leading column is `colname`, if the table has one.
fn find_covering_index(
    indexes: &[schema::IndexEntry],
    colname: &str,
) -> Result<Option<crate::pager::PageNum>, Error> {
    for index in indexes {
        let (_name, _table, columns) = pt_to_ast::parse_create_index_statement(&index.sql)?;
        // Descent only binary-searches on the first indexed column, so
        // only a leading-column match qualifies.
        if let Some(first) = columns.first() {
            if first.eq_ignore_ascii_case(colname) {
                return Ok(Some(index.rootpage));
            }
        }
    }
    Ok(None)
}

/// Plans a SELECT statement against the database the pager is open on.
pub fn plan_select(pager: &Pager, stmt: &ast::SelectStatement) -> Result<ir::Block, Error> {
    let table = schema::resolve_table(pager, &stmt.tablename)?;
    let (_table_name, colnames, coltypes) = pt_to_ast::parse_create_statement(&table.create_sql)?;
    let pk_col = coltypes.iter().position(|t| is_integer_primary_key(t));

    let counting = is_count_star(&stmt.items);
    let projection = if counting {
        vec![]
    } else {
        resolve_projection(&stmt.items, &colnames)?
    };
    let output = ir::Output { projection, pk_col };

    let block = match &stmt.filter {
        None => ir::Block::Scan(ir::Scan {
            root: table.rootpage,
            output,
            predicate: None,
        }),
        Some(filter) => {
            let value = constant_to_value(&filter.value);
            match lookup_column(&colnames, &filter.column.name)? {
                ColumnRef::Rowid => {
                    let rowid = match value {
                        SqlValue::Int(r) => r,
                        other => {
                            return Err(Error::Unsupported(format!(
                                "cannot compare rowid to a {} literal",
                                other.type_name()
                            )))
                        }
                    };
                    ir::Block::RowidEq(ir::RowidEq {
                        root: table.rootpage,
                        output,
                        rowid,
                    })
                }
                ColumnRef::Col(column) => {
                    match find_covering_index(&table.indexes, &filter.column.name)? {
                        Some(index_root) => ir::Block::IndexSeekEq(ir::IndexSeekEq {
                            table_root: table.rootpage,
                            index_root,
                            key: value,
                            output,
                        }),
                        None => ir::Block::Scan(ir::Scan {
                            root: table.rootpage,
                            output,
                            predicate: Some(ir::Predicate { column, value }),
                        }),
                    }
                }
            }
        }
    };

    if counting {
        return Ok(ir::Block::Count(ir::Count {
            input: Box::new(block),
        }));
    }
    Ok(block)
}
