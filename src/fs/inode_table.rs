use crate::{
    disk::{types::zeroed_block, BlockDevice},
    fs::{
        block_store::BlockStore,
        config::{Geometry, InodeNum},
        error::{FileSystemError, Result},
        inode::{FileAttr, Inode, InodeType},
        inode_bitmap::InodeBitmap,
    },
};

/// inode 层：管理 inode 号的分配，以及 inode 表中定长记录的读写。
/// 文件数据的读写见 `file.rs`。
#[derive(Debug)]
pub struct InodeTable<D: BlockDevice> {
    pub(crate) store: BlockStore<D>,
    pub(crate) inode_bitmap: InodeBitmap,
}

impl<D: BlockDevice> InodeTable<D> {
    pub fn new(store: BlockStore<D>) -> Self {
        let inode_bitmap = InodeBitmap::new(*store.geometry());
        Self {
            store,
            inode_bitmap,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        self.store.geometry()
    }

    pub fn store(&self) -> &BlockStore<D> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BlockStore<D> {
        &mut self.store
    }

    pub fn into_store(self) -> BlockStore<D> {
        self.store
    }

    pub fn inode_bitmap(&self) -> &InodeBitmap {
        &self.inode_bitmap
    }

    /// 分配一个 inode 号，并在对应槽位写入一条新记录（大小为 0，块指针清零）
    pub fn alloc_inode(&mut self, inode_type: InodeType) -> Result<InodeNum> {
        if inode_type == InodeType::Free {
            return Err(FileSystemError::InvalidArgument(
                "cannot allocate an inode of the free type".to_string(),
            ));
        }

        let inum = self.inode_bitmap.alloc(self.store.disk())?;
        self.put_inode(inum, &Inode::new(inode_type))?;
        log::debug!("im: alloc inode {} ({})", inum, inode_type.name());
        Ok(inum)
    }

    /// 释放 inode 号并把记录标记为空闲。不会释放它占用的数据块。
    pub fn free_inode(&mut self, inum: InodeNum) -> Result<()> {
        // 0 号 inode 是保留位，不能被释放
        self.check_range(inum)?;
        self.inode_bitmap.free(self.store.disk(), inum)?;

        match self.get_inode(inum) {
            Ok(mut inode) => {
                inode.inode_type = InodeType::Free;
                self.put_inode(inum, &inode)?;
            }
            Err(FileSystemError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        log::debug!("im: free inode {}", inum);
        Ok(())
    }

    fn check_range(&self, inum: InodeNum) -> Result<()> {
        if inum == 0 || inum >= self.geometry().inode_count {
            log::warn!("im: inum {} out of range", inum);
            return Err(FileSystemError::NotFound(inum));
        }
        Ok(())
    }

    /// 读取 inode 记录的副本；越界或空闲的 inode 返回 NotFound
    pub fn get_inode(&self, inum: InodeNum) -> Result<Inode> {
        self.check_range(inum)?;
        log::debug!("im: get_inode {}", inum);

        let (block_id, slot) = self.geometry().inode_location(inum);
        let mut buf = zeroed_block();
        self.store.read_block(block_id, &mut buf)?;

        let inode = Inode::decode_from(&buf, slot)?;
        if inode.is_free() {
            log::debug!("im: inode {} not exist", inum);
            return Err(FileSystemError::NotFound(inum));
        }
        Ok(inode)
    }

    /// 读改写 inode 所在的块，覆盖对应槽位
    pub fn put_inode(&mut self, inum: InodeNum, inode: &Inode) -> Result<()> {
        if inum >= self.geometry().inode_count {
            return Err(FileSystemError::NotFound(inum));
        }
        log::debug!("im: put_inode {}", inum);

        let (block_id, slot) = self.geometry().inode_location(inum);
        let mut buf = zeroed_block();
        self.store.read_block(block_id, &mut buf)?;
        inode.encode_into(&mut buf, slot);
        self.store.write_block(block_id, &buf)?;
        Ok(())
    }

    pub fn getattr(&self, inum: InodeNum) -> Result<FileAttr> {
        Ok(self.get_inode(inum)?.attr())
    }

    /// 位图中已分配且记录有效的 inode（不含保留的 0 号）
    pub fn live_inodes(&self) -> Result<Vec<(InodeNum, FileAttr)>> {
        let mut live = Vec::new();
        for inum in 1..self.geometry().inode_count {
            if !self.inode_bitmap.is_used(self.store.disk(), inum)? {
                continue;
            }
            match self.getattr(inum) {
                Ok(attr) => live.push((inum, attr)),
                Err(FileSystemError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(live)
    }
}
