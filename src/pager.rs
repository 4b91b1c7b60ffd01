// Manages pages from a database file as defined at https://www.sqlite.org/fileformat.html
// Supports a simplified read-only subset of the file format.
//
// The pager owns the data in each page, and allows callers to access it for
// reading.  Pages are loaded on demand.  All pages have the same size.
// Whether a page is cached or re-read is invisible to callers.

use std::cell::{OnceCell, RefCell};
use std::io::{Read, Seek, SeekFrom};

use crate::dbheader::{self, TextEncoding};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The page number is beyond the end of the database file.")]
    PageNumberBeyondLimits,
    #[error("Error reading database file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error in database header: {0}")]
    DbHdr(#[from] dbheader::Error),
    #[error("Internal error.")]
    Internal,
}

// Page numbers are 1-based, to match how the format numbers pages.
pub type PageNum = usize;

/// A pager manages the memory use for one open database file.
///
/// The file handle is owned exclusively by the pager for the lifetime of the
/// queries running over it.  Distinct pages may be borrowed at the same time;
/// each page is read from the file at most once.
#[derive(Debug)]
pub struct Pager {
    f: RefCell<std::fs::File>,
    pages: Vec<OnceCell<Vec<u8>>>,
    pagesize: u32,
    text_encoding: TextEncoding,
}

impl Pager {
    // TODO: lock the file at the OS level so another process cannot
    // modify it while a query is streaming.
    pub fn open(path: &str) -> Result<Self, Error> {
        let mut f = std::fs::OpenOptions::new()
            .read(true)
            .write(false)
            .create(false)
            .open(path)?;
        let h = dbheader::get_header_clone(&mut f)?;
        let file_len = f.metadata()?.len();
        let num_pages = (file_len / h.pagesize as u64) as usize;
        Ok(Pager {
            f: RefCell::new(f),
            pages: (0..num_pages).map(|_| OnceCell::new()).collect(),
            pagesize: h.pagesize,
            text_encoding: h.text_encoding,
        })
    }

    pub fn get_page_size(&self) -> u32 {
        self.pagesize
    }

    pub fn get_text_encoding(&self) -> TextEncoding {
        self.text_encoding
    }

    fn read_page_from_file(&self, pn: PageNum) -> Result<Vec<u8>, Error> {
        let mut v = vec![0_u8; self.pagesize as usize];
        let mut f = self.f.borrow_mut();
        f.seek(SeekFrom::Start((pn - 1) as u64 * self.pagesize as u64))?;
        f.read_exact(&mut v[..])?;
        Ok(v)
    }

    /// Returns a read-only borrow of page `pn`, loading it on first access.
    pub fn get_page_ro(&self, pn: PageNum) -> Result<&[u8], Error> {
        if pn < 1 || pn > self.pages.len() {
            return Err(Error::PageNumberBeyondLimits);
        }
        let slot = &self.pages[pn - 1];
        if slot.get().is_none() {
            let v = self.read_page_from_file(pn)?;
            // A concurrent fill is impossible here (single-threaded), so a
            // lost set would be an internal logic error.
            let _ = slot.set(v);
        }
        slot.get().map(|v| v.as_slice()).ok_or(Error::Internal)
    }
}
