use serde::{Deserialize, Serialize};

/// Offset/page-size pagination over one report window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub offset: usize,
    pub page_size: usize,
}

impl PageCursor {
    /// Cursor at the start of a window.
    pub fn first(page_size: usize) -> Self {
        PageCursor {
            offset: 0,
            page_size,
        }
    }

    pub fn new(offset: usize, page_size: usize) -> Self {
        PageCursor { offset, page_size }
    }

    /// Cursor for the page after this one. Offsets only ever move forward.
    pub fn next(self) -> Self {
        PageCursor {
            offset: self.offset.saturating_add(self.page_size),
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_page_size() {
        let cursor = PageCursor::first(100).next().next();
        assert_eq!(cursor, PageCursor::new(200, 100));
    }
}
