//! inode 记录与间接块的磁盘编码。
//!
//! 所有字段按固定偏移、小端序逐个读写，不依赖任何内存布局：
//!
//! ```text
//! 0      2      4      8       12      16      20                 420     424
//! | type | pad  | size | atime | mtime | ctime | blocks[NDIRECT]   | indirect |
//! ```

use crate::{
    disk::{types::zeroed_block, Block, BlockId},
    fs::{
        config::{INODE_SIZE, NDIRECT, NINDIRECT},
        error::{FileSystemError, Result},
    },
    utils::current_timestamp,
};

const TYPE_OFFSET: usize = 0;
const SIZE_OFFSET: usize = 4;
const ATIME_OFFSET: usize = 8;
const MTIME_OFFSET: usize = 12;
const CTIME_OFFSET: usize = 16;
const BLOCKS_OFFSET: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum InodeType {
    Free = 0,      // 空闲，块指针视为垃圾
    Directory = 1, // 目录
    File = 2,      // 普通文件
    Symlink = 3,   // 符号链接
}

impl InodeType {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::Free),
            1 => Some(Self::Directory),
            2 => Some(Self::File),
            3 => Some(Self::Symlink),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Directory => "directory",
            Self::File => "file",
            Self::Symlink => "symlink",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub inode_type: InodeType,
    pub size: u32,  // 文件大小（字节）
    pub atime: u32, // 最后访问时间
    pub mtime: u32, // 最后修改时间
    pub ctime: u32, // 创建时间

    pub direct_blocks: [BlockId; NDIRECT], // 直接块指针
    pub indirect_block: BlockId,           // 一级间接块，0 表示没有
}

impl Inode {
    pub fn new(inode_type: InodeType) -> Self {
        let now = current_timestamp();
        Self {
            inode_type,
            size: 0,
            atime: now,
            mtime: now,
            ctime: now,
            direct_blocks: [0; NDIRECT],
            indirect_block: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        self.inode_type == InodeType::Free
    }

    pub fn attr(&self) -> FileAttr {
        FileAttr {
            inode_type: self.inode_type,
            size: self.size,
            atime: self.atime,
            mtime: self.mtime,
            ctime: self.ctime,
        }
    }

    /// 把记录写入 inode 表块中的某个槽位
    pub fn encode_into(&self, block: &mut Block, slot: usize) {
        let rec = &mut block[slot * INODE_SIZE..(slot + 1) * INODE_SIZE];
        rec[TYPE_OFFSET..TYPE_OFFSET + 2].copy_from_slice(&(self.inode_type as u16).to_le_bytes());
        rec[TYPE_OFFSET + 2..SIZE_OFFSET].fill(0);
        put_u32(rec, SIZE_OFFSET, self.size);
        put_u32(rec, ATIME_OFFSET, self.atime);
        put_u32(rec, MTIME_OFFSET, self.mtime);
        put_u32(rec, CTIME_OFFSET, self.ctime);
        for (i, &id) in self.direct_blocks.iter().enumerate() {
            put_u32(rec, BLOCKS_OFFSET + i * 4, id);
        }
        put_u32(rec, BLOCKS_OFFSET + NDIRECT * 4, self.indirect_block);
    }

    /// 从 inode 表块的某个槽位解码记录
    pub fn decode_from(block: &Block, slot: usize) -> Result<Self> {
        let rec = &block[slot * INODE_SIZE..(slot + 1) * INODE_SIZE];
        let raw_type = u16::from_le_bytes([rec[TYPE_OFFSET], rec[TYPE_OFFSET + 1]]);
        let inode_type = InodeType::from_raw(raw_type)
            .ok_or_else(|| FileSystemError::Corrupted(format!("unknown inode type {}", raw_type)))?;

        let mut direct_blocks = [0; NDIRECT];
        for (i, id) in direct_blocks.iter_mut().enumerate() {
            *id = get_u32(rec, BLOCKS_OFFSET + i * 4);
        }

        Ok(Self {
            inode_type,
            size: get_u32(rec, SIZE_OFFSET),
            atime: get_u32(rec, ATIME_OFFSET),
            mtime: get_u32(rec, MTIME_OFFSET),
            ctime: get_u32(rec, CTIME_OFFSET),
            direct_blocks,
            indirect_block: get_u32(rec, BLOCKS_OFFSET + NDIRECT * 4),
        })
    }
}

/// getattr 的返回值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttr {
    pub inode_type: InodeType,
    pub size: u32,
    pub atime: u32,
    pub mtime: u32,
    pub ctime: u32,
}

/// 间接块：恰好 NINDIRECT 个块号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectBlock {
    pub entries: [BlockId; NINDIRECT],
}

impl IndirectBlock {
    pub fn empty() -> Self {
        Self {
            entries: [0; NINDIRECT],
        }
    }

    pub fn decode(block: &Block) -> Self {
        let mut entries = [0; NINDIRECT];
        for (i, id) in entries.iter_mut().enumerate() {
            *id = get_u32(block, i * 4);
        }
        Self { entries }
    }

    pub fn encode(&self) -> Block {
        let mut block = zeroed_block();
        for (i, &id) in self.entries.iter().enumerate() {
            put_u32(&mut block, i * 4, id);
        }
        block
    }
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
