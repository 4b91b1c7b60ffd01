//! Builds small database files in the on-disk format for the integration
//! tests, so the tests do not depend on checked-in binaries.

use std::path::PathBuf;

pub const PAGE_SIZE: usize = 4096;

const PAGE_INTERIOR_INDEX: u8 = 0x02;
const PAGE_INTERIOR_TABLE: u8 = 0x05;
const PAGE_LEAF_INDEX: u8 = 0x0a;
const PAGE_LEAF_TABLE: u8 = 0x0d;

/// A value to store in a record.
#[derive(Clone)]
pub enum V {
    Null,
    Int(i64),
    Text(&'static str),
}

pub fn varint(v: u64) -> Vec<u8> {
    assert!(v >> 56 == 0, "test fixtures never need 9-byte varints");
    let mut groups = vec![(v & 0x7f) as u8];
    let mut rest = v >> 7;
    while rest != 0 {
        groups.push(0x80 | (rest & 0x7f) as u8);
        rest >>= 7;
    }
    groups.reverse();
    groups
}

// Smallest signed big-endian encoding of an integer value.
fn int_body(v: i64) -> (u64, Vec<u8>) {
    if i8::try_from(v).is_ok() {
        (1, vec![v as u8])
    } else if i16::try_from(v).is_ok() {
        (2, (v as i16).to_be_bytes().to_vec())
    } else if i32::try_from(v).is_ok() {
        (4, (v as i32).to_be_bytes().to_vec())
    } else {
        (6, v.to_be_bytes().to_vec())
    }
}

/// Serializes a record: header of serial types, then the column bodies.
pub fn record(values: &[V]) -> Vec<u8> {
    let mut serials = vec![];
    let mut body = vec![];
    for v in values {
        match v {
            V::Null => serials.extend(varint(0)),
            V::Int(i) => {
                let (serial, bytes) = int_body(*i);
                serials.extend(varint(serial));
                body.extend(bytes);
            }
            V::Text(s) => {
                serials.extend(varint(13 + 2 * s.len() as u64));
                body.extend(s.as_bytes());
            }
        }
    }
    // The header length varint counts itself.
    let mut header_len = serials.len() + 1;
    loop {
        let l = varint(header_len as u64).len();
        if l + serials.len() == header_len {
            break;
        }
        header_len = serials.len() + l;
    }
    let mut out = varint(header_len as u64);
    out.extend(serials);
    out.extend(body);
    out
}

pub fn table_leaf_cell(rowid: i64, values: &[V]) -> Vec<u8> {
    let payload = record(values);
    let mut cell = varint(payload.len() as u64);
    cell.extend(varint(rowid as u64));
    cell.extend(payload);
    cell
}

pub fn table_interior_cell(left_child: u32, key: i64) -> Vec<u8> {
    let mut cell = left_child.to_be_bytes().to_vec();
    cell.extend(varint(key as u64));
    cell
}

pub fn index_leaf_cell(values: &[V]) -> Vec<u8> {
    let payload = record(values);
    let mut cell = varint(payload.len() as u64);
    cell.extend(payload);
    cell
}

pub fn index_interior_cell(left_child: u32, values: &[V]) -> Vec<u8> {
    let payload = record(values);
    let mut cell = left_child.to_be_bytes().to_vec();
    cell.extend(varint(payload.len() as u64));
    cell.extend(payload);
    cell
}

/// Assembles one page: btree header, cell pointer array in cell order,
/// cell contents packed against the end of the page.  On page 1 the
/// first 100 bytes are left free for the file header.
pub fn page(page_type: u8, cells: &[Vec<u8>], rightmost: Option<u32>, is_first: bool) -> Vec<u8> {
    let hdr_offset = if is_first { 100 } else { 0 };
    let header_size = match page_type {
        PAGE_INTERIOR_INDEX | PAGE_INTERIOR_TABLE => 12,
        PAGE_LEAF_INDEX | PAGE_LEAF_TABLE => 8,
        _ => panic!("bad page type"),
    };
    let mut p = vec![0_u8; PAGE_SIZE];
    let mut content_off = PAGE_SIZE;
    let mut pointers = vec![];
    for cell in cells {
        content_off -= cell.len();
        p[content_off..content_off + cell.len()].copy_from_slice(cell);
        pointers.push(content_off as u16);
    }
    assert!(hdr_offset + header_size + 2 * cells.len() <= content_off);

    p[hdr_offset] = page_type;
    p[hdr_offset + 3..hdr_offset + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
    p[hdr_offset + 5..hdr_offset + 7].copy_from_slice(&(content_off as u16).to_be_bytes());
    if let Some(rm) = rightmost {
        p[hdr_offset + 8..hdr_offset + 12].copy_from_slice(&rm.to_be_bytes());
    }
    for (i, ptr) in pointers.iter().enumerate() {
        let off = hdr_offset + header_size + 2 * i;
        p[off..off + 2].copy_from_slice(&ptr.to_be_bytes());
    }
    p
}

/// Concatenates pages into a database image, stamping the 100-byte file
/// header into page 1.
pub fn db_image(pages: Vec<Vec<u8>>) -> Vec<u8> {
    let num_pages = pages.len() as u32;
    let mut image: Vec<u8> = pages.into_iter().flatten().collect();
    image[..16].copy_from_slice(b"SQLite format 3\0");
    image[16..18].copy_from_slice(&(PAGE_SIZE as u16).to_be_bytes());
    image[18] = 1; // write version
    image[19] = 1; // read version
    image[20] = 0; // reserved space
    image[21] = 0x40;
    image[22] = 0x20;
    image[23] = 0x20;
    image[24..28].copy_from_slice(&1_u32.to_be_bytes()); // change counter
    image[28..32].copy_from_slice(&num_pages.to_be_bytes());
    image[44..48].copy_from_slice(&4_u32.to_be_bytes()); // schema format
    image[56..60].copy_from_slice(&1_u32.to_be_bytes()); // UTF-8
    image[96..100].copy_from_slice(&3037000_u32.to_be_bytes());
    image
}

/// Writes a database image to a unique temp file and returns its path.
pub fn write_db(name: &str, image: &[u8]) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("rolite-test-{}-{}.db", std::process::id(), name));
    std::fs::write(&path, image).expect("should have written fixture db");
    path
}

/// The `apples` database: one table (rowid-aliased `id` primary key) and
/// an index on `color`, all single-level.
///
///   CREATE TABLE apples (id integer primary key, name text, color text)
///   CREATE INDEX idx_apples_color ON apples (color)
///
/// Rows: (1,"Granny Smith","Light Green"), (2,"Fuji","Red"),
/// (3,"Honeycrisp","Blush Red"), (4,"Golden Delicious","Yellow").
pub fn apples_db() -> Vec<u8> {
    let table_sql = "CREATE TABLE apples (id integer primary key, name text, color text)";
    let index_sql = "CREATE INDEX idx_apples_color ON apples (color)";
    let schema_page = page(
        PAGE_LEAF_TABLE,
        &[
            table_leaf_cell(
                1,
                &[
                    V::Text("table"),
                    V::Text("apples"),
                    V::Text("apples"),
                    V::Int(2),
                    V::Text(table_sql),
                ],
            ),
            table_leaf_cell(
                2,
                &[
                    V::Text("index"),
                    V::Text("idx_apples_color"),
                    V::Text("apples"),
                    V::Int(3),
                    V::Text(index_sql),
                ],
            ),
        ],
        None,
        true,
    );
    let rows: [(i64, &'static str, &'static str); 4] = [
        (1, "Granny Smith", "Light Green"),
        (2, "Fuji", "Red"),
        (3, "Honeycrisp", "Blush Red"),
        (4, "Golden Delicious", "Yellow"),
    ];
    let table_page = page(
        PAGE_LEAF_TABLE,
        &rows
            .iter()
            .map(|&(rowid, name, color)| {
                table_leaf_cell(rowid, &[V::Null, V::Text(name), V::Text(color)])
            })
            .collect::<Vec<_>>(),
        None,
        false,
    );
    // Index entries in (color, rowid) order.
    let index_page = page(
        PAGE_LEAF_INDEX,
        &[
            index_leaf_cell(&[V::Text("Blush Red"), V::Int(3)]),
            index_leaf_cell(&[V::Text("Light Green"), V::Int(1)]),
            index_leaf_cell(&[V::Text("Red"), V::Int(2)]),
            index_leaf_cell(&[V::Text("Yellow"), V::Int(4)]),
        ],
        None,
        false,
    );
    db_image(vec![schema_page, table_page, index_page])
}

/// The `points` database: a two-level table btree (interior root, three
/// leaves, rowids 1..=12) and a two-level index btree on `color` whose
/// duplicate keys span leaves and interior divider cells.
///
///   CREATE TABLE points (id integer primary key, color text)
///   CREATE INDEX idx_points_color ON points (color)
///
/// Odd rowids are "blue", even rowids are "red".  With `with_index`
/// false the index pages are still written but not mentioned in the
/// schema, so the planner cannot use them.
pub fn points_db(with_index: bool) -> Vec<u8> {
    let table_sql = "CREATE TABLE points (id integer primary key, color text)";
    let index_sql = "CREATE INDEX idx_points_color ON points (color)";
    let mut schema_cells = vec![table_leaf_cell(
        1,
        &[
            V::Text("table"),
            V::Text("points"),
            V::Text("points"),
            V::Int(2),
            V::Text(table_sql),
        ],
    )];
    if with_index {
        schema_cells.push(table_leaf_cell(
            2,
            &[
                V::Text("index"),
                V::Text("idx_points_color"),
                V::Text("points"),
                V::Int(6),
                V::Text(index_sql),
            ],
        ));
    }
    let schema_page = page(PAGE_LEAF_TABLE, &schema_cells, None, true);

    let color = |rowid: i64| if rowid % 2 == 1 { "blue" } else { "red" };
    let table_leaf = |rowids: std::ops::RangeInclusive<i64>| {
        page(
            PAGE_LEAF_TABLE,
            &rowids
                .map(|r| table_leaf_cell(r, &[V::Null, V::Text(color(r))]))
                .collect::<Vec<_>>(),
            None,
            false,
        )
    };
    // Page 2: interior root over leaves 3 (rowids 1..=4), 4 (5..=8) and
    // the rightmost pointer 5 (9..=12).
    let table_root = page(
        PAGE_INTERIOR_TABLE,
        &[table_interior_cell(3, 4), table_interior_cell(4, 8)],
        Some(5),
        false,
    );

    // Index entries ordered by (color, rowid); dividers live in the
    // interior cells.
    let index_root = page(
        PAGE_INTERIOR_INDEX,
        &[
            index_interior_cell(7, &[V::Text("blue"), V::Int(7)]),
            index_interior_cell(8, &[V::Text("red"), V::Int(4)]),
        ],
        Some(9),
        false,
    );
    let index_leaf_a = page(
        PAGE_LEAF_INDEX,
        &[
            index_leaf_cell(&[V::Text("blue"), V::Int(1)]),
            index_leaf_cell(&[V::Text("blue"), V::Int(3)]),
            index_leaf_cell(&[V::Text("blue"), V::Int(5)]),
        ],
        None,
        false,
    );
    let index_leaf_b = page(
        PAGE_LEAF_INDEX,
        &[
            index_leaf_cell(&[V::Text("blue"), V::Int(9)]),
            index_leaf_cell(&[V::Text("blue"), V::Int(11)]),
            index_leaf_cell(&[V::Text("red"), V::Int(2)]),
        ],
        None,
        false,
    );
    let index_leaf_c = page(
        PAGE_LEAF_INDEX,
        &[
            index_leaf_cell(&[V::Text("red"), V::Int(6)]),
            index_leaf_cell(&[V::Text("red"), V::Int(8)]),
            index_leaf_cell(&[V::Text("red"), V::Int(10)]),
            index_leaf_cell(&[V::Text("red"), V::Int(12)]),
        ],
        None,
        false,
    );

    db_image(vec![
        schema_page,
        table_root,
        table_leaf(1..=4),
        table_leaf(5..=8),
        table_leaf(9..=12),
        index_root,
        index_leaf_a,
        index_leaf_b,
        index_leaf_c,
    ])
}
