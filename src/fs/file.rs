//! 整文件读写：把逻辑块下标翻译成直接块或间接块中的块号。
//!
//! 逻辑块 `i < NDIRECT` 存在 inode 的直接指针里，其余存在间接块的
//! 第 `i - NDIRECT` 项。写入总是整体替换文件内容。

use crate::{
    disk::{types::zeroed_block, BlockDevice, BlockId, BLOCK_SIZE},
    fs::{
        config::{InodeNum, MAXFILE, MAX_FILE_SIZE, NDIRECT},
        error::{FileSystemError, Result},
        inode::{IndirectBlock, Inode},
        inode_table::InodeTable,
    },
    utils::current_timestamp,
};

/// 存放 `size` 字节需要的块数
pub fn blocks_for(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE)
}

impl<D: BlockDevice> InodeTable<D> {
    fn load_indirect(&self, inode: &Inode) -> Result<IndirectBlock> {
        self.check_pointer(inode.indirect_block)?;
        let mut buf = zeroed_block();
        self.store.read_block(inode.indirect_block, &mut buf)?;
        Ok(IndirectBlock::decode(&buf))
    }

    // 记录中的 size 决定要遍历多少个块指针，不能超过 MAXFILE
    fn checked_blocks(&self, inum: InodeNum, inode: &Inode) -> Result<usize> {
        let nblocks = blocks_for(inode.size as usize);
        if nblocks > MAXFILE {
            return Err(FileSystemError::Corrupted(format!(
                "inode {} records size {} beyond the {} byte limit",
                inum, inode.size, MAX_FILE_SIZE
            )));
        }
        Ok(nblocks)
    }

    // 已使用的块指针必须落在数据区
    fn check_pointer(&self, id: BlockId) -> Result<BlockId> {
        if !self.geometry().is_data_block(id) {
            return Err(FileSystemError::Corrupted(format!(
                "block pointer {} is outside the data region",
                id
            )));
        }
        Ok(id)
    }

    fn pointer(&self, inode: &Inode, indirect: Option<&IndirectBlock>, index: usize) -> Result<BlockId> {
        let id = if index < NDIRECT {
            inode.direct_blocks[index]
        } else {
            let indirect = indirect.ok_or_else(|| {
                FileSystemError::Corrupted(format!("block {} needs an indirect block", index))
            })?;
            indirect.entries[index - NDIRECT]
        };
        self.check_pointer(id)
    }

    // 最后一块不足 BLOCK_SIZE 时，剩余部分补零
    fn write_chunk(&self, id: BlockId, chunk: &[u8]) -> Result<()> {
        let mut buf = zeroed_block();
        buf[..chunk.len()].copy_from_slice(chunk);
        self.store.write_block(id, &buf)
    }

    /// 读出文件的全部内容，并更新访问时间
    pub fn read_file(&mut self, inum: InodeNum) -> Result<Vec<u8>> {
        let mut inode = self.get_inode(inum)?;
        let nblocks = self.checked_blocks(inum, &inode)?;
        let size = inode.size as usize;

        let mut out = Vec::with_capacity(size);
        if nblocks > 0 {
            let indirect = if nblocks > NDIRECT {
                Some(self.load_indirect(&inode)?)
            } else {
                None
            };

            let mut buf = zeroed_block();
            for index in 0..nblocks {
                let id = self.pointer(&inode, indirect.as_ref(), index)?;
                self.store.read_block(id, &mut buf)?;
                let take = (size - index * BLOCK_SIZE).min(BLOCK_SIZE);
                out.extend_from_slice(&buf[..take]);
            }
        }

        inode.atime = current_timestamp();
        self.put_inode(inum, &inode)?;
        Ok(out)
    }

    /// 用 `data` 整体替换文件内容。
    ///
    /// 与旧内容重叠的块原地覆盖；新增的块按需分配（跨过 NDIRECT 时顺带分配间接块）；
    /// 多余的块逐个释放，间接块不再被引用时也一并释放。
    /// 大小越界或空间不足时在分配任何块之前就返回错误，旧内容保持不变。
    pub fn write_file(&mut self, inum: InodeNum, data: &[u8]) -> Result<()> {
        if data.len() > MAX_FILE_SIZE {
            log::warn!("im: file to write exceeds size limit");
            return Err(FileSystemError::TooLarge {
                size: data.len(),
                max: MAX_FILE_SIZE,
            });
        }
        let mut inode = self.get_inode(inum)?;

        let old_blocks = self.checked_blocks(inum, &inode)?;
        let new_blocks = blocks_for(data.len());
        let needs_new_indirect = new_blocks > NDIRECT && old_blocks <= NDIRECT;

        let wanted = new_blocks.saturating_sub(old_blocks) + usize::from(needs_new_indirect);
        if wanted > 0 && (self.store.free_block_count()? as usize) < wanted {
            log::warn!("im: inode {} needs {} more blocks, disk is full", inum, wanted);
            return Err(FileSystemError::DiskFull);
        }

        let mut indirect = if old_blocks > NDIRECT {
            Some(self.load_indirect(&inode)?)
        } else if needs_new_indirect {
            inode.indirect_block = self.store.alloc_block()?;
            Some(IndirectBlock::empty())
        } else {
            None
        };
        let mut indirect_dirty = needs_new_indirect;

        // 重叠部分原地覆盖，增长部分分配新块
        for (index, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
            let id = if index < old_blocks {
                self.pointer(&inode, indirect.as_ref(), index)?
            } else {
                let id = self.store.alloc_block()?;
                if index < NDIRECT {
                    inode.direct_blocks[index] = id;
                } else if let Some(indirect) = indirect.as_mut() {
                    indirect.entries[index - NDIRECT] = id;
                    indirect_dirty = true;
                }
                id
            };
            self.write_chunk(id, chunk)?;
        }

        // 收缩部分释放旧块
        for index in new_blocks..old_blocks {
            let id = self.pointer(&inode, indirect.as_ref(), index)?;
            self.store.free_block(id)?;
            if index < NDIRECT {
                inode.direct_blocks[index] = 0;
            } else if let Some(indirect) = indirect.as_mut() {
                indirect.entries[index - NDIRECT] = 0;
                indirect_dirty = true;
            }
        }

        if old_blocks > NDIRECT && new_blocks <= NDIRECT {
            self.store.free_block(inode.indirect_block)?;
            inode.indirect_block = 0;
        } else if let (true, Some(indirect)) = (indirect_dirty, indirect.as_ref()) {
            self.store.write_block(inode.indirect_block, &indirect.encode())?;
        }

        let now = current_timestamp();
        inode.size = data.len() as u32;
        inode.mtime = now;
        inode.atime = now;
        self.put_inode(inum, &inode)
    }

    /// 释放文件占用的全部数据块和间接块，然后释放 inode
    pub fn remove_file(&mut self, inum: InodeNum) -> Result<()> {
        let inode = self.get_inode(inum)?;
        let nblocks = self.checked_blocks(inum, &inode)?;

        for index in 0..nblocks.min(NDIRECT) {
            let id = self.pointer(&inode, None, index)?;
            self.store.free_block(id)?;
        }
        if nblocks > NDIRECT {
            let indirect = self.load_indirect(&inode)?;
            for index in NDIRECT..nblocks {
                let id = self.pointer(&inode, Some(&indirect), index)?;
                self.store.free_block(id)?;
            }
            self.store.free_block(inode.indirect_block)?;
        }

        self.free_inode(inum)
    }
}
