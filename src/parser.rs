//! The pest grammar binding.  `pt_to_ast` turns the parse trees produced
//! here into AST types.

#[derive(Parser)]
#[grammar = "sql.pest"]
pub struct SQLParser;
