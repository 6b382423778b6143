//! Page cache filled by the preload pipeline

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::loader::PageHandle;

/// Index-addressed slots for loaded pages.
///
/// Cloning yields another handle to the same slots: the pipeline writes
/// through one handle while the draw engine reads through another. A slot is
/// filled at most once and never emptied.
#[derive(Clone, Debug)]
pub struct PageCache {
    slots: Rc<RefCell<Vec<Option<PageHandle>>>>,
}

impl PageCache {
    /// Create a cache with one empty slot per page
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: Rc::new(RefCell::new(vec![None; page_count])),
        }
    }

    /// Get a loaded page
    #[must_use]
    pub fn get(&self, index: usize) -> Option<PageHandle> {
        self.slots.borrow().get(index).cloned().flatten()
    }

    /// Check if a page is loaded
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.slots
            .borrow()
            .get(index)
            .is_some_and(Option::is_some)
    }

    /// Store a loaded page; returns false if the slot is out of range or taken
    pub fn insert(&self, index: usize, page: PageHandle) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.get_mut(index) {
            Some(slot @ None) => {
                *slot = Some(page);
                true
            }
            Some(Some(_)) => {
                warn!("Page {index} is already cached, keeping the first copy");
                false
            }
            None => {
                warn!("Page {index} is outside the cache ({} slots)", slots.len());
                false
            }
        }
    }

    /// Number of slots (total page count)
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Number of filled slots
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.slots.borrow().iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::loader::{PageImage, PageSource};

    fn test_page(name: &str) -> PageHandle {
        Rc::new(PageImage::new(
            PageSource::from(name),
            RgbaImage::new(2, 3),
        ))
    }

    #[test]
    fn cache_starts_empty() {
        let cache = PageCache::new(3);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.loaded(), 0);
        assert!(!cache.contains(0));
        assert!(cache.get(0).is_none());
    }

    #[test]
    fn cache_insert_and_get() {
        let cache = PageCache::new(3);
        assert!(cache.insert(1, test_page("b")));

        assert!(cache.contains(1));
        assert_eq!(cache.get(1).unwrap().source().as_str(), "b");
        assert_eq!(cache.loaded(), 1);
    }

    #[test]
    fn filled_slot_is_never_replaced() {
        let cache = PageCache::new(2);
        assert!(cache.insert(0, test_page("first")));
        assert!(!cache.insert(0, test_page("second")));
        assert_eq!(cache.get(0).unwrap().source().as_str(), "first");
    }

    #[test]
    fn out_of_range_insert_is_rejected() {
        let cache = PageCache::new(1);
        assert!(!cache.insert(5, test_page("x")));
        assert!(!cache.contains(5));
    }

    #[test]
    fn clones_share_slots() {
        let writer = PageCache::new(2);
        let reader = writer.clone();
        writer.insert(0, test_page("a"));
        assert!(reader.contains(0));
    }
}
