use crate::error::{FsError, FsResult};
use crate::BLOCK_SIZE;

/// Indexable view of the memory-resident volume image. All access goes
/// through a block index, so nothing can read or write past the image.
pub struct VolumeArena<'a> {
    data: &'a mut [u8],
}

impl<'a> VolumeArena<'a> {
    /// The image must hold whole blocks and be aligned for the layout
    /// records (they contain u32 fields).
    pub fn new(data: &'a mut [u8]) -> FsResult<Self> {
        if data.len() < BLOCK_SIZE
            || data.len() % BLOCK_SIZE != 0
            || data.as_ptr() as usize % core::mem::align_of::<u32>() != 0
        {
            return Err(FsError::BadImage);
        }
        Ok(Self { data })
    }

    pub fn total_blocks(&self) -> usize {
        self.data.len() / BLOCK_SIZE
    }

    /// View the block at `block_id` as a `T`.
    pub fn get<T>(&self, block_id: usize) -> FsResult<&T> {
        let offset = self.block_offset::<T>(block_id)?;
        Ok(unsafe { &*(self.data.as_ptr().add(offset) as *const T) })
    }

    pub fn get_mut<T>(&mut self, block_id: usize) -> FsResult<&mut T> {
        let offset = self.block_offset::<T>(block_id)?;
        Ok(unsafe { &mut *(self.data.as_mut_ptr().add(offset) as *mut T) })
    }

    fn block_offset<T>(&self, block_id: usize) -> FsResult<usize> {
        assert!(core::mem::size_of::<T>() <= BLOCK_SIZE);
        if block_id >= self.total_blocks() {
            return Err(FsError::OutOfRange);
        }
        Ok(block_id * BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DataBlock;
    use crate::test_util::TestImage;

    #[test]
    fn rejects_partial_and_misaligned_images() {
        let mut image = TestImage::new(2);
        let bytes = image.bytes();
        assert!(VolumeArena::new(&mut bytes[..BLOCK_SIZE - 1]).is_err());
        assert!(VolumeArena::new(&mut []).is_err());
        // offset by two keeps the length whole-block but breaks alignment
        let mut image = TestImage::new(2);
        let bytes = image.bytes();
        assert!(VolumeArena::new(&mut bytes[2..2 + BLOCK_SIZE]).is_err());
    }

    #[test]
    fn indexing_is_bounds_checked() {
        let mut image = TestImage::new(2);
        let mut arena = VolumeArena::new(image.bytes()).unwrap();
        assert_eq!(arena.total_blocks(), 2);
        assert!(arena.get::<DataBlock>(1).is_ok());
        assert_eq!(
            arena.get::<DataBlock>(2).err(),
            Some(FsError::OutOfRange)
        );
        arena.get_mut::<DataBlock>(1).unwrap().0[7] = 0xA5;
        assert_eq!(arena.get::<DataBlock>(1).unwrap().0[7], 0xA5);
    }
}
