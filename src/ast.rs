//! This module defines abstract syntax tree (AST) types for the SQL subset.

use enum_as_inner::EnumAsInner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColName {
    pub name: String,
}

impl std::fmt::Display for ColName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name.fmt(f)
    }
}

/// One item of a select list.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum SelItem {
    ColName(ColName),
    Star,
    Function(FunctionCall),
}

impl std::fmt::Display for SelItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelItem::ColName(x) => x.fmt(f),
            SelItem::Star => "*".fmt(f),
            SelItem::Function(x) => x.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<SelItem>,
}

impl std::fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, a) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            a.fmt(f)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    String(String),
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Int(x) => x.fmt(f),
            Constant::String(x) => x.fmt(f),
        }
    }
}

/// An equality filter: `WHERE column = literal`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereEq {
    pub column: ColName,
    pub value: Constant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub items: Vec<SelItem>,
    pub tablename: String,
    pub filter: Option<WhereEq>,
}
