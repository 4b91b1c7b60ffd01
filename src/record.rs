//! Btree cells hold records, which contain table rows.
//!
//! A record is a header followed by a body.  The header begins with a
//! varint giving the total header length in bytes, followed by one serial
//! type varint per column; the body is the tightly packed column values.
//!
//! Rows produced here are owned: text and blob bodies are copied out of
//! the page buffer at decode time, so a returned row never borrows from
//! the page it was read from.

use crate::dbheader::TextEncoding;
use crate::serial_type;
use crate::sql_value::SqlValue;
use crate::varint;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Record header length does not match its serial types.")]
    HeaderSizeMismatch,
    #[error("Record value extends past the end of the payload.")]
    TruncatedValue,
    #[error(transparent)]
    Varint(#[from] varint::Error),
    #[error(transparent)]
    SerialType(#[from] serial_type::Error),
    #[error("Cannot compare a stored {stored} value to a {literal} literal.")]
    Incomparable {
        stored: &'static str,
        literal: &'static str,
    },
}

/// A column position as seen by a query: either a declared column of the
/// record, or the implicit rowid, which is not stored in the record at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef {
    Rowid,
    Col(usize),
}

// Parses the record header at the start of `payload`, returning the serial
// type of every column and the offset where the body starts.  The header
// must be consumed exactly.
fn read_serial_types(payload: &[u8]) -> Result<(Vec<i64>, usize), Error> {
    let (header_size, n) = varint::read_varint(payload, 0)?;
    let header_size = usize::try_from(header_size).map_err(|_| Error::HeaderSizeMismatch)?;
    if header_size < n || header_size > payload.len() {
        return Err(Error::HeaderSizeMismatch);
    }
    let mut offset = n;
    let mut serial_types = vec![];
    while offset < header_size {
        let (serial_type, n) = varint::read_varint(payload, offset)?;
        offset += n;
        serial_types.push(serial_type);
    }
    if offset != header_size {
        return Err(Error::HeaderSizeMismatch);
    }
    Ok((serial_types, header_size))
}

/// Decodes every column of a record.  Used for schema rows and index
/// entries, where all columns are needed.
pub fn decode_values(payload: &[u8], encoding: TextEncoding) -> Result<Vec<SqlValue>, Error> {
    let (serial_types, mut offset) = read_serial_types(payload)?;
    let mut values = Vec::with_capacity(serial_types.len());
    for serial_type in serial_types {
        let size = serial_type::size(serial_type)?;
        if offset + size > payload.len() {
            return Err(Error::TruncatedValue);
        }
        values.push(serial_type::to_sql_value(
            serial_type,
            &payload[offset..offset + size],
            encoding,
        )?);
        offset += size;
    }
    Ok(values)
}

/// Decodes one record into a projected row.
///
/// * `projection` lists the output columns in output order; `Rowid` slots
///   are filled from `rowid` without touching the record.
/// * `predicate`, if present, is an equality test `(column index, literal)`.
///   When the predicate column decodes to a non-matching value, decoding
///   stops and `Ok(None)` is returned (the row is filtered out).
/// * `pk_col` is the `INTEGER PRIMARY KEY` column, if the table declares
///   one.  Its stored value is NULL; the row's rowid is substituted.
///
/// Column bodies that are neither projected nor tested are skipped, not
/// decoded.  A record may have fewer columns than the table declares
/// (rows written before a column was added); missing columns read as NULL.
pub fn decode_record(
    payload: &[u8],
    encoding: TextEncoding,
    projection: &[ColumnRef],
    predicate: Option<(usize, &SqlValue)>,
    pk_col: Option<usize>,
    rowid: i64,
) -> Result<Option<Vec<SqlValue>>, Error> {
    let (serial_types, body_start) = read_serial_types(payload)?;

    let mut out: Vec<SqlValue> = projection
        .iter()
        .map(|c| match c {
            ColumnRef::Rowid => SqlValue::Int(rowid),
            ColumnRef::Col(_) => SqlValue::Null(),
        })
        .collect();

    let mut offset = body_start;
    for (i, serial_type) in serial_types.iter().enumerate() {
        let size = serial_type::size(*serial_type)?;
        let projected = projection.contains(&ColumnRef::Col(i));
        let tested = matches!(predicate, Some((p, _)) if p == i);
        if !projected && !tested {
            offset += size;
            continue;
        }
        if offset + size > payload.len() {
            return Err(Error::TruncatedValue);
        }
        let value = if *serial_type == 0 && pk_col == Some(i) {
            SqlValue::Int(rowid)
        } else {
            serial_type::to_sql_value(*serial_type, &payload[offset..offset + size], encoding)?
        };
        offset += size;

        if let Some((p, literal)) = predicate {
            if p == i {
                match value.storage_eq(literal) {
                    Some(true) => {}
                    Some(false) => return Ok(None),
                    None => {
                        return Err(Error::Incomparable {
                            stored: value.type_name(),
                            literal: literal.type_name(),
                        })
                    }
                }
            }
        }
        for (slot, col) in projection.iter().enumerate() {
            if *col == ColumnRef::Col(i) {
                out[slot] = value.clone();
            }
        }
    }

    // A predicate on a column the record does not have compares NULL to the
    // literal, which never matches.
    if let Some((p, _)) = predicate {
        if p >= serial_types.len() {
            return Ok(None);
        }
    }

    Ok(Some(out))
}
