//! formatting renders query rows for the command line.

use itertools::Itertools;

use crate::sql_value::SqlValue;

/// Renders one row with its columns joined by `|`.
pub fn format_row(values: &[SqlValue]) -> String {
    values.iter().map(|v| v.to_string()).join("|")
}
