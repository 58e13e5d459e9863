//! 单机块存储引擎：把定长块组成的磁盘组织成 inode 空间，
//! 每个 inode 保存一段通过直接/一级间接块指针寻址的字节流。

pub mod disk;
pub mod fs;
pub mod utils;

pub use disk::{BlockDevice, FileDisk, MemDisk};
pub use fs::{
    config::{Geometry, InodeNum},
    error::{FileSystemError, Result},
    inode::{FileAttr, InodeType},
    FileSystem, FsStats,
};
