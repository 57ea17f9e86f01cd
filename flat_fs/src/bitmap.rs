use alloc::vec;
use alloc::vec::Vec;

/// Word-based occupancy tracker for inode ids and data-block indices.
/// Derived state only: rebuilt from the directory at mount, never persisted.
pub struct Bitmap {
    words: Vec<u64>,
    len: usize,
}

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0u64; (len + 63) / 64],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// First free id at or after `start`, marked occupied on return.
    pub fn alloc_from(&mut self, start: usize) -> Option<usize> {
        if start >= self.len {
            return None;
        }
        for word_pos in start / 64..self.words.len() {
            let mut word = self.words[word_pos];
            if word_pos == start / 64 {
                // ids below start are not candidates
                word |= (1u64 << (start % 64)) - 1;
            }
            if word != u64::MAX {
                let inner = word.trailing_ones() as usize;
                let id = word_pos * 64 + inner;
                if id >= self.len {
                    return None;
                }
                self.words[word_pos] |= 1u64 << inner;
                return Some(id);
            }
        }
        None
    }

    pub fn alloc(&mut self) -> Option<usize> {
        self.alloc_from(0)
    }

    pub fn set(&mut self, id: usize) {
        assert!(id < self.len);
        self.words[id / 64] |= 1u64 << (id % 64);
    }

    pub fn clear(&mut self, id: usize) {
        assert!(id < self.len);
        self.words[id / 64] &= !(1u64 << (id % 64));
    }

    pub fn is_set(&self, id: usize) -> bool {
        assert!(id < self.len);
        self.words[id / 64] & (1u64 << (id % 64)) != 0
    }

    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn reset(&mut self) {
        for word in self.words.iter_mut() {
            *word = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_lowest_free_id() {
        let mut bitmap = Bitmap::new(130);
        assert_eq!(bitmap.alloc(), Some(0));
        assert_eq!(bitmap.alloc(), Some(1));
        bitmap.set(2);
        assert_eq!(bitmap.alloc(), Some(3));
        bitmap.clear(1);
        assert_eq!(bitmap.alloc(), Some(1));
    }

    #[test]
    fn alloc_from_skips_the_reserved_prefix() {
        let mut bitmap = Bitmap::new(16);
        assert_eq!(bitmap.alloc_from(1), Some(1));
        assert_eq!(bitmap.alloc_from(1), Some(2));
        assert!(!bitmap.is_set(0));
    }

    #[test]
    fn alloc_crosses_word_boundaries() {
        let mut bitmap = Bitmap::new(130);
        for id in 0..128 {
            bitmap.set(id);
        }
        assert_eq!(bitmap.alloc(), Some(128));
        assert_eq!(bitmap.alloc(), Some(129));
        assert_eq!(bitmap.alloc(), None);
    }

    #[test]
    fn exhaustion_respects_the_logical_length() {
        let mut bitmap = Bitmap::new(10);
        for expected in 0..10 {
            assert_eq!(bitmap.alloc(), Some(expected));
        }
        // ids 10..63 exist in the last word but are past the logical end
        assert_eq!(bitmap.alloc(), None);
        assert_eq!(bitmap.count_set(), 10);
    }

    #[test]
    fn reset_clears_everything() {
        let mut bitmap = Bitmap::new(70);
        bitmap.set(0);
        bitmap.set(69);
        bitmap.reset();
        assert_eq!(bitmap.count_set(), 0);
    }
}
