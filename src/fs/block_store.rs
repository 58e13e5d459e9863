use crate::{
    disk::{types::zeroed_block, Block, BlockDevice, BlockId},
    fs::{
        config::{Geometry, SUPER_BLOCK_BLOCK_ID},
        data_block_bitmap::DataBlockBitmap,
        error::{FileSystemError, Result},
        super_block::SuperBlock,
    },
};

/// 块层：对外提供整块读写和数据块的分配/释放，不理解 inode 语义
#[derive(Debug)]
pub struct BlockStore<D: BlockDevice> {
    disk: D,
    geometry: Geometry,
    super_block: SuperBlock,
    data_bitmap: DataBlockBitmap,
}

impl<D: BlockDevice> BlockStore<D> {
    /// 在新磁盘上写入超级块。位图、inode 表和数据区的内容保持不变。
    pub fn format(disk: D, geometry: Geometry) -> Result<Self> {
        check_capacity(&disk, &geometry)?;

        let super_block = SuperBlock::new(&geometry);
        disk.write_block(SUPER_BLOCK_BLOCK_ID, &super_block.to_block()?)?;
        log::info!(
            "bm: formatted {} blocks, {} inodes, data region starts at {}",
            geometry.block_count,
            geometry.inode_count,
            geometry.data_start()
        );

        Ok(Self {
            disk,
            geometry,
            super_block,
            data_bitmap: DataBlockBitmap::new(geometry),
        })
    }

    /// 读取已有磁盘上的超级块
    pub fn open(disk: D) -> Result<Self> {
        let mut buf = zeroed_block();
        disk.read_block(SUPER_BLOCK_BLOCK_ID, &mut buf)?;
        let super_block = SuperBlock::from_block(&buf)?;
        let geometry = super_block.geometry()?;
        check_capacity(&disk, &geometry)?;

        Ok(Self {
            disk,
            geometry,
            super_block,
            data_bitmap: DataBlockBitmap::new(geometry),
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    pub fn disk(&self) -> &D {
        &self.disk
    }

    pub fn into_disk(self) -> D {
        self.disk
    }

    pub fn read_block(&self, id: BlockId, buf: &mut Block) -> Result<()> {
        self.disk.read_block(id, buf)?;
        Ok(())
    }

    pub fn write_block(&self, id: BlockId, buf: &Block) -> Result<()> {
        self.disk.write_block(id, buf)?;
        Ok(())
    }

    pub fn alloc_block(&mut self) -> Result<BlockId> {
        self.data_bitmap.alloc(&self.disk)
    }

    pub fn free_block(&mut self, id: BlockId) -> Result<()> {
        self.data_bitmap.free(&self.disk, id)
    }

    pub fn is_block_used(&self, id: BlockId) -> Result<bool> {
        self.data_bitmap.is_used(&self.disk, id)
    }

    pub fn free_block_count(&self) -> Result<u32> {
        self.data_bitmap.count_free(&self.disk)
    }
}

fn check_capacity<D: BlockDevice>(disk: &D, geometry: &Geometry) -> Result<()> {
    if disk.block_count() < geometry.block_count {
        return Err(FileSystemError::InvalidGeometry(format!(
            "device holds {} blocks but the layout needs {}",
            disk.block_count(),
            geometry.block_count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn format_then_open_sees_same_geometry() {
        let geometry = Geometry::new(512, 32).unwrap();
        let disk = MemDisk::new(512);
        let mut store = BlockStore::format(disk, geometry).unwrap();
        let id = store.alloc_block().unwrap();
        assert_eq!(id, geometry.data_start());

        let reopened = BlockStore::open(store.into_disk()).unwrap();
        assert_eq!(*reopened.geometry(), geometry);
        assert!(reopened.is_block_used(id).unwrap());
        assert_eq!(reopened.free_block_count().unwrap(), geometry.data_blocks() - 1);
    }

    #[test]
    fn open_blank_disk_fails() {
        assert!(matches!(
            BlockStore::open(MemDisk::new(64)),
            Err(FileSystemError::Corrupted(_))
        ));
    }

    #[test]
    fn device_must_fit_layout() {
        let geometry = Geometry::new(512, 32).unwrap();
        assert!(matches!(
            BlockStore::format(MemDisk::new(256), geometry),
            Err(FileSystemError::InvalidGeometry(_))
        ));
    }
}
