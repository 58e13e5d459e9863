use crate::{
    disk::{types::zeroed_block, BlockDevice, BlockId},
    fs::{
        bitmap,
        config::{Geometry, BITS_PER_BLOCK, BLOCK_BITMAP_START_BLOCK_ID},
        error::{FileSystemError, Result},
    },
};

/// 数据块位图，直接在磁盘上的位图块中读改写，位图本身就是唯一的分配记录
#[derive(Debug, Clone, Copy)]
pub struct DataBlockBitmap {
    geometry: Geometry,
}

impl DataBlockBitmap {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    // 第 index 个位图块覆盖的位范围 [start, end)，已裁剪到数据区内
    fn data_range(&self, index: u32) -> (u32, u32) {
        let base = index * BITS_PER_BLOCK;
        let start = self.geometry.data_start().max(base) - base;
        let end = (self.geometry.block_count - base).min(BITS_PER_BLOCK);
        (start, end)
    }

    fn first_data_bitmap_index(&self) -> u32 {
        self.geometry.data_start() / BITS_PER_BLOCK
    }

    /// 从数据区第一个块开始按升序逐位查找空闲块（first-fit），置位后立即写回
    pub fn alloc<D: BlockDevice>(&self, disk: &D) -> Result<BlockId> {
        let mut buf = zeroed_block();
        for index in self.first_data_bitmap_index()..self.geometry.block_bitmap_blocks() {
            let (start, end) = self.data_range(index);
            disk.read_block(BLOCK_BITMAP_START_BLOCK_ID + index, &mut buf)?;

            if let Some(bit) = bitmap::find_free(&buf, start, end) {
                bitmap::set_bit(&mut buf, bit);
                disk.write_block(BLOCK_BITMAP_START_BLOCK_ID + index, &buf)?;

                let id = index * BITS_PER_BLOCK + bit;
                log::debug!("bm: alloc block {}", id);
                return Ok(id);
            }
        }

        log::warn!("bm: no free data block left");
        Err(FileSystemError::DiskFull)
    }

    /// 释放一个数据块。重复释放只会清除一个已经为 0 的位，不做检测。
    pub fn free<D: BlockDevice>(&self, disk: &D, id: BlockId) -> Result<()> {
        if !self.geometry.is_data_block(id) {
            log::warn!("bm: block id {} out of range", id);
            return Err(FileSystemError::InvalidBlock(id));
        }

        let bitmap_block = self.geometry.bitmap_block_of(id);
        let mut buf = zeroed_block();
        disk.read_block(bitmap_block, &mut buf)?;
        bitmap::clear_bit(&mut buf, id % BITS_PER_BLOCK);
        disk.write_block(bitmap_block, &buf)?;

        log::debug!("bm: free block {}", id);
        Ok(())
    }

    pub fn is_used<D: BlockDevice>(&self, disk: &D, id: BlockId) -> Result<bool> {
        if id >= self.geometry.block_count {
            return Err(FileSystemError::InvalidBlock(id));
        }
        let mut buf = zeroed_block();
        disk.read_block(self.geometry.bitmap_block_of(id), &mut buf)?;
        Ok(bitmap::get_bit(&buf, id % BITS_PER_BLOCK))
    }

    /// 数据区中空闲块的个数
    pub fn count_free<D: BlockDevice>(&self, disk: &D) -> Result<u32> {
        let mut buf = zeroed_block();
        let mut free = 0;
        for index in self.first_data_bitmap_index()..self.geometry.block_bitmap_blocks() {
            let (start, end) = self.data_range(index);
            disk.read_block(BLOCK_BITMAP_START_BLOCK_ID + index, &mut buf)?;
            free += bitmap::count_free(&buf, start, end);
        }
        Ok(free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    fn setup() -> (MemDisk, DataBlockBitmap, Geometry) {
        let geometry = Geometry::new(256, 16).unwrap();
        (
            MemDisk::new(geometry.block_count),
            DataBlockBitmap::new(geometry),
            geometry,
        )
    }

    #[test]
    fn allocates_from_data_start_in_order() {
        let (disk, bm, g) = setup();
        assert_eq!(bm.alloc(&disk).unwrap(), g.data_start());
        assert_eq!(bm.alloc(&disk).unwrap(), g.data_start() + 1);
        assert!(bm.is_used(&disk, g.data_start()).unwrap());
        assert!(!bm.is_used(&disk, g.data_start() + 2).unwrap());
    }

    #[test]
    fn freed_block_is_reused_first() {
        let (disk, bm, g) = setup();
        let a = bm.alloc(&disk).unwrap();
        let b = bm.alloc(&disk).unwrap();
        bm.free(&disk, a).unwrap();
        assert_eq!(bm.alloc(&disk).unwrap(), a);
        assert_eq!(bm.alloc(&disk).unwrap(), b + 1);
        assert_eq!(a, g.data_start());
    }

    #[test]
    fn exhaustion_reports_disk_full() {
        let (disk, bm, g) = setup();
        for _ in 0..g.data_blocks() {
            bm.alloc(&disk).unwrap();
        }
        assert_eq!(bm.count_free(&disk).unwrap(), 0);
        assert!(matches!(bm.alloc(&disk), Err(FileSystemError::DiskFull)));

        bm.free(&disk, g.block_count - 1).unwrap();
        assert_eq!(bm.alloc(&disk).unwrap(), g.block_count - 1);
    }

    #[test]
    fn rejects_freeing_metadata_blocks() {
        let (disk, bm, g) = setup();
        assert!(matches!(
            bm.free(&disk, g.data_start() - 1),
            Err(FileSystemError::InvalidBlock(_))
        ));
        assert!(matches!(
            bm.free(&disk, g.block_count),
            Err(FileSystemError::InvalidBlock(_))
        ));
        // 重复释放是无害的
        let id = bm.alloc(&disk).unwrap();
        bm.free(&disk, id).unwrap();
        bm.free(&disk, id).unwrap();
        assert_eq!(bm.count_free(&disk).unwrap(), g.data_blocks());
    }

    #[test]
    fn spans_multiple_bitmap_blocks() {
        let geometry = Geometry::new(BITS_PER_BLOCK + 64, 16).unwrap();
        let disk = MemDisk::new(geometry.block_count);
        let bm = DataBlockBitmap::new(geometry);
        assert_eq!(geometry.block_bitmap_blocks(), 2);

        for _ in 0..geometry.data_blocks() - 1 {
            bm.alloc(&disk).unwrap();
        }
        let last = bm.alloc(&disk).unwrap();
        assert_eq!(last, geometry.block_count - 1);
        assert_eq!(geometry.bitmap_block_of(last), BLOCK_BITMAP_START_BLOCK_ID + 1);
        assert!(bm.alloc(&disk).is_err());
    }
}
