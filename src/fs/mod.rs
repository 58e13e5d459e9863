use crate::{
    disk::BlockDevice,
    fs::{
        block_store::BlockStore,
        config::{Geometry, InodeNum, ROOT_INODE},
        error::{FileSystemError, Result},
        inode::{FileAttr, InodeType},
        inode_table::InodeTable,
    },
};

pub mod bitmap;
pub mod block_store;
pub mod config;
pub mod data_block_bitmap;
pub mod error;
pub mod file;
pub mod inode;
pub mod inode_bitmap;
pub mod inode_table;
pub mod super_block;

/// 空间使用统计，全部由位图现算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub total_blocks: u32,
    pub data_blocks: u32,
    pub free_blocks: u32,
    pub total_inodes: u32,
    pub free_inodes: u32,
}

/// 引擎对上层（命名空间 / RPC 层）暴露的接口。
///
/// 引擎内部没有锁：调用方需要保证同一时刻只有一个操作在修改磁盘，
/// 这里用 `&mut self` 表达这个约束。
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    inodes: InodeTable<D>,
}

impl<D: BlockDevice> FileSystem<D> {
    /// 在全新（全零）的磁盘上建立文件系统，并创建 1 号根目录 inode
    pub fn format(disk: D, geometry: Geometry) -> Result<Self> {
        let store = BlockStore::format(disk, geometry)?;
        let mut inodes = InodeTable::new(store);

        // 0 号 inode 永远不可用
        inodes.inode_bitmap().reserve(inodes.store().disk(), 0)?;
        let root = inodes.alloc_inode(InodeType::Directory)?;
        if root != ROOT_INODE {
            return Err(FileSystemError::Corrupted(format!(
                "root directory got inode {}, expected {}",
                root, ROOT_INODE
            )));
        }

        log::info!("fs: format complete");
        Ok(Self { inodes })
    }

    /// 挂载已有磁盘：读取超级块并检查根目录
    pub fn mount(disk: D) -> Result<Self> {
        let inodes = InodeTable::new(BlockStore::open(disk)?);

        match inodes.getattr(ROOT_INODE) {
            Ok(attr) if attr.inode_type == InodeType::Directory => {}
            Ok(attr) => {
                return Err(FileSystemError::Corrupted(format!(
                    "root inode is a {}",
                    attr.inode_type.name()
                )))
            }
            Err(FileSystemError::NotFound(_)) => {
                return Err(FileSystemError::Corrupted(
                    "root directory is missing".to_string(),
                ))
            }
            Err(e) => return Err(e),
        }

        let g = inodes.geometry();
        log::info!(
            "fs: mounted {} blocks, {} inodes",
            g.block_count,
            g.inode_count
        );
        Ok(Self { inodes })
    }

    pub fn geometry(&self) -> &Geometry {
        self.inodes.geometry()
    }

    pub fn inode_table(&self) -> &InodeTable<D> {
        &self.inodes
    }

    pub fn inode_table_mut(&mut self) -> &mut InodeTable<D> {
        &mut self.inodes
    }

    pub fn create(&mut self, inode_type: InodeType) -> Result<InodeNum> {
        self.inodes.alloc_inode(inode_type)
    }

    pub fn get(&mut self, inum: InodeNum) -> Result<Vec<u8>> {
        self.inodes.read_file(inum)
    }

    pub fn put(&mut self, inum: InodeNum, data: &[u8]) -> Result<()> {
        self.inodes.write_file(inum, data)
    }

    pub fn getattr(&self, inum: InodeNum) -> Result<FileAttr> {
        self.inodes.getattr(inum)
    }

    pub fn remove(&mut self, inum: InodeNum) -> Result<()> {
        self.inodes.remove_file(inum)
    }

    pub fn statfs(&self) -> Result<FsStats> {
        let g = self.geometry();
        Ok(FsStats {
            total_blocks: g.block_count,
            data_blocks: g.data_blocks(),
            free_blocks: self.inodes.store().free_block_count()?,
            total_inodes: g.inode_count,
            free_inodes: self
                .inodes
                .inode_bitmap()
                .count_free(self.inodes.store().disk())?,
        })
    }

    pub fn list_inodes(&self) -> Result<Vec<(InodeNum, FileAttr)>> {
        self.inodes.live_inodes()
    }

    /// 卸载，交还底层设备
    pub fn into_disk(self) -> D {
        self.inodes.into_store().into_disk()
    }
}
