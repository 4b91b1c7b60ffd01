//! table provides a cursor over table btrees, hiding the fact that a
//! btree spans several pages.
//!
//! The cursor is a pull iterator with an explicit descent stack of
//! per-page iterators (never a suspended call frame); the stack depth is
//! the tree depth.  Cells are visited in order, so rowids come out
//! strictly ascending.

use super::{cell, header, interior, leaf, Error, PageType, RowId};
use crate::pager::{PageNum, Pager};

#[derive(Debug)]
enum Frame<'p> {
    Leaf(leaf::Iterator<'p>),
    Interior(interior::Iterator<'p>),
}

#[derive(Debug)]
pub struct Cursor<'p> {
    pager: &'p Pager,
    root: PageNum,
    // Inclusive rowid bounds for range lookups; None means full scan.
    bounds: Option<(RowId, RowId)>,
    stack: Vec<Frame<'p>>,
    started: bool,
    failed: bool,
}

impl<'p> Cursor<'p> {
    /// A cursor over every row of the btree rooted at `root`, in ascending
    /// rowid order.
    pub fn scan(pager: &'p Pager, root: PageNum) -> Cursor<'p> {
        Cursor {
            pager,
            root,
            bounds: None,
            stack: vec![],
            started: false,
            failed: false,
        }
    }

    /// A cursor over the rows with `min <= rowid <= max`, using
    /// binary-search descent instead of scanning from the left edge.
    pub fn rowid_range(pager: &'p Pager, root: PageNum, min: RowId, max: RowId) -> Cursor<'p> {
        Cursor {
            pager,
            root,
            bounds: Some((min, max)),
            stack: vec![],
            started: false,
            failed: false,
        }
    }

    // Pushes the page's iterator onto the stack, positioned per the bounds.
    fn push_page(&mut self, pgnum: PageNum) -> Result<(), Error> {
        let page = self.pager.get_page_ro(pgnum)?;
        let offset = super::btree_start_offset(pgnum);
        let hdr = header::parse(page, offset)?;
        let cells = cell::Array::new(page, offset)?;
        match hdr.page_type {
            PageType::TableLeaf => {
                let it = match self.bounds {
                    Some((min, max)) => leaf::Iterator::with_bounds(cells, min, max)?,
                    None => leaf::Iterator::new(cells),
                };
                self.stack.push(Frame::Leaf(it));
            }
            PageType::TableInterior => {
                let rightmost = hdr
                    .rightmost_pointer
                    .ok_or(Error::TruncatedHeader)? as PageNum;
                let it = match self.bounds {
                    Some((min, max)) => {
                        interior::Iterator::with_bounds(cells, rightmost, min, max)?
                    }
                    None => interior::Iterator::new(cells, rightmost),
                };
                self.stack.push(Frame::Interior(it));
            }
            other => {
                return Err(Error::UnexpectedPageType(other, PageType::TableLeaf));
            }
        }
        Ok(())
    }
}

impl<'p> core::iter::Iterator for Cursor<'p> {
    type Item = Result<(RowId, &'p [u8]), Error>;

    /// Returns the next (rowid, record payload) pair of the btree.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Err(e) = self.push_page(self.root) {
                self.failed = true;
                return Some(Err(e));
            }
        }
        loop {
            let frame = self.stack.last_mut()?;
            match frame {
                Frame::Leaf(l) => match l.next() {
                    Some(Ok(item)) => return Some(Ok(item)),
                    Some(Err(e)) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                    None => {
                        self.stack.pop();
                    }
                },
                Frame::Interior(i) => match i.next() {
                    Some(Ok(child)) => {
                        if let Err(e) = self.push_page(child.page) {
                            self.failed = true;
                            return Some(Err(e));
                        }
                    }
                    Some(Err(e)) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                    None => {
                        self.stack.pop();
                    }
                },
            }
        }
    }
}
