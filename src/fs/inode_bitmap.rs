use crate::{
    disk::{types::zeroed_block, BlockDevice, BlockId},
    fs::{
        bitmap,
        config::{Geometry, InodeNum},
        error::{FileSystemError, Result},
    },
};

/// inode 位图：单独占用一个块，每一位对应一个 inode 号
#[derive(Debug, Clone, Copy)]
pub struct InodeBitmap {
    pub block_id: BlockId,  // 位图所在块号
    pub total_inodes: u32, // inode 总数
}

impl InodeBitmap {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            block_id: geometry.inode_bitmap_block(),
            total_inodes: geometry.inode_count,
        }
    }

    /// 分配一个空闲 inode 号（first-fit，升序），置位后立即写回
    pub fn alloc<D: BlockDevice>(&self, disk: &D) -> Result<InodeNum> {
        let mut buf = zeroed_block();
        disk.read_block(self.block_id, &mut buf)?;

        match bitmap::find_free(&buf, 0, self.total_inodes) {
            Some(inum) => {
                bitmap::set_bit(&mut buf, inum);
                disk.write_block(self.block_id, &buf)?;
                Ok(inum)
            }
            None => {
                log::warn!("im: no free inode left");
                Err(FileSystemError::InodeFull)
            }
        }
    }

    /// 把某个 inode 号标记为已占用（格式化时用于保留 0 号 inode）
    pub fn reserve<D: BlockDevice>(&self, disk: &D, inum: InodeNum) -> Result<()> {
        let mut buf = zeroed_block();
        disk.read_block(self.block_id, &mut buf)?;
        bitmap::set_bit(&mut buf, inum);
        disk.write_block(self.block_id, &buf)?;
        Ok(())
    }

    /// 释放 inode 号，返回该位原先是否被置位。已空闲的位不会触发写盘。
    pub fn free<D: BlockDevice>(&self, disk: &D, inum: InodeNum) -> Result<bool> {
        if inum >= self.total_inodes {
            return Ok(false);
        }

        let mut buf = zeroed_block();
        disk.read_block(self.block_id, &mut buf)?;
        if !bitmap::get_bit(&buf, inum) {
            return Ok(false);
        }
        bitmap::clear_bit(&mut buf, inum);
        disk.write_block(self.block_id, &buf)?;
        Ok(true)
    }

    pub fn is_used<D: BlockDevice>(&self, disk: &D, inum: InodeNum) -> Result<bool> {
        if inum >= self.total_inodes {
            return Ok(false);
        }
        let mut buf = zeroed_block();
        disk.read_block(self.block_id, &mut buf)?;
        Ok(bitmap::get_bit(&buf, inum))
    }

    pub fn count_free<D: BlockDevice>(&self, disk: &D) -> Result<u32> {
        let mut buf = zeroed_block();
        disk.read_block(self.block_id, &mut buf)?;
        Ok(bitmap::count_free(&buf, 0, self.total_inodes))
    }
}
