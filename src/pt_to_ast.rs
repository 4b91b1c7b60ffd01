//! `pt_to_ast` has routines for converting parse trees to ASTs for SQL.
//! A pest parse tree has one enum for all possible terminals and
//! non-terminals.  Our AST has enums for groups of terminals that are used
//! in the same production, and discards lexical detail like case and
//! position in the input.

use itertools::Itertools;

use crate::ast;
use crate::parser::Rule;
use crate::parser::SQLParser;
use crate::Error;
use pest::Parser;

fn remove_single_quoting(s: &str) -> String {
    // 'it''s' -> it's
    s[1..s.len() - 1].replace("''", "'")
}

fn parse_literal(pair: pest::iterators::Pair<'_, Rule>) -> Result<ast::Constant, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| Error::Parse("empty literal".to_string()))?;
    match inner.as_rule() {
        Rule::integer_literal => inner
            .as_str()
            .parse::<i64>()
            .map(ast::Constant::Int)
            .map_err(|e| Error::Parse(format!("bad integer literal: {}", e))),
        Rule::single_quoted_string => Ok(ast::Constant::String(remove_single_quoting(
            inner.as_str(),
        ))),
        r => Err(Error::Parse(format!("unexpected literal rule {:?}", r))),
    }
}

fn parse_select_item(pair: pest::iterators::Pair<'_, Rule>) -> Result<ast::SelItem, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| Error::Parse("empty select item".to_string()))?;
    match inner.as_rule() {
        Rule::star => Ok(ast::SelItem::Star),
        Rule::column_name => Ok(ast::SelItem::ColName(ast::ColName {
            name: inner.as_str().to_string(),
        })),
        Rule::function_expr => {
            let mut parts = inner.into_inner();
            let name = parts
                .next()
                .ok_or_else(|| Error::Parse("function without a name".to_string()))?
                .as_str()
                .to_string();
            let mut args = vec![];
            for arg in parts {
                let u = arg
                    .into_inner()
                    .next()
                    .ok_or_else(|| Error::Parse("empty function argument".to_string()))?;
                args.push(match u.as_rule() {
                    Rule::star => ast::SelItem::Star,
                    Rule::column_name => ast::SelItem::ColName(ast::ColName {
                        name: u.as_str().to_string(),
                    }),
                    r => return Err(Error::Parse(format!("unexpected argument rule {:?}", r))),
                });
            }
            Ok(ast::SelItem::Function(ast::FunctionCall { name, args }))
        }
        r => Err(Error::Parse(format!("unexpected select item rule {:?}", r))),
    }
}

/// Parses a SELECT statement into its AST.
///
/// Anything that does not parse as a SELECT, including other statement
/// kinds, is reported as unsupported; the engine executes nothing else.
pub fn parse_select_statement(query: &str) -> Result<ast::SelectStatement, Error> {
    let select_stmt = SQLParser::parse(Rule::select_stmt, query)
        .map_err(|e| Error::Unsupported(format!("not a supported SELECT statement: {}", e)))?
        .next()
        .ok_or_else(|| Error::Parse("empty parse".to_string()))?;

    let mut items = vec![];
    let mut tablename = String::new();
    let mut filter = None;
    for s in select_stmt.into_inner() {
        match s.as_rule() {
            Rule::select_items => {
                for item in s.into_inner() {
                    items.push(parse_select_item(item)?);
                }
            }
            Rule::table_identifier => {
                tablename = s.as_str().to_string();
            }
            Rule::where_clause => {
                let (col, lit) = s
                    .into_inner()
                    .collect_tuple()
                    .ok_or_else(|| Error::Parse("malformed WHERE clause".to_string()))?;
                filter = Some(ast::WhereEq {
                    column: ast::ColName {
                        name: col.as_str().to_string(),
                    },
                    value: parse_literal(lit)?,
                });
            }
            Rule::EOI => (),
            r => return Err(Error::Parse(format!("unexpected rule {:?}", r))),
        }
    }
    Ok(ast::SelectStatement {
        items,
        tablename,
        filter,
    })
}

/// Parses a CREATE TABLE statement from the schema table into
/// (table name, column names, column types).  Types keep their full text
/// ("integer primary key") with words joined by single spaces.
pub fn parse_create_statement(c: &str) -> Result<(String, Vec<String>, Vec<String>), Error> {
    let create_stmt = SQLParser::parse(Rule::create_stmt, c)
        .map_err(|e| Error::Parse(format!("bad CREATE TABLE statement: {}", e)))?
        .next()
        .ok_or_else(|| Error::Parse("empty parse".to_string()))?;

    let mut table_name = String::new();
    let mut colnames = vec![];
    let mut coltypes = vec![];
    for c in create_stmt.into_inner() {
        match c.as_rule() {
            Rule::table_identifier => {
                table_name = c.as_str().to_string();
            }
            Rule::column_defs => {
                for column_def in c.into_inner() {
                    let mut parts = column_def.into_inner();
                    let col_name = parts
                        .next()
                        .ok_or_else(|| Error::Parse("column def without a name".to_string()))?
                        .as_str()
                        .to_string();
                    let col_type = parts.map(|p| p.as_str()).join(" ");
                    colnames.push(col_name);
                    coltypes.push(col_type);
                }
            }
            Rule::EOI => (),
            r => return Err(Error::Parse(format!("unexpected rule {:?}", r))),
        }
    }
    Ok((table_name, colnames, coltypes))
}

/// Parses a CREATE INDEX statement from the schema table into
/// (index name, table name, indexed column names).
pub fn parse_create_index_statement(c: &str) -> Result<(String, String, Vec<String>), Error> {
    let create_stmt = SQLParser::parse(Rule::create_index_stmt, c)
        .map_err(|e| Error::Parse(format!("bad CREATE INDEX statement: {}", e)))?
        .next()
        .ok_or_else(|| Error::Parse("empty parse".to_string()))?;

    let mut names = vec![];
    let mut columns = vec![];
    for c in create_stmt.into_inner() {
        match c.as_rule() {
            Rule::table_identifier => names.push(c.as_str().to_string()),
            Rule::index_columns => {
                columns = c.into_inner().map(|p| p.as_str().to_string()).collect();
            }
            Rule::EOI => (),
            r => return Err(Error::Parse(format!("unexpected rule {:?}", r))),
        }
    }
    let (index_name, table_name) = names
        .into_iter()
        .collect_tuple()
        .ok_or_else(|| Error::Parse("CREATE INDEX needs an index and a table name".to_string()))?;
    Ok((index_name, table_name, columns))
}
