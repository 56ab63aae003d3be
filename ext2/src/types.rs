//! Common types and constants for ext2 access

use alloc::vec::Vec;
use bitflags::bitflags;

/// Hardware sector size (always 512 bytes)
pub const SECTOR_SIZE: usize = 512;

/// Smallest legal ext2 block size, used until the library negotiates one
pub const MIN_BLOCK_SIZE: u32 = 1024;

/// Fixed inode number of the root directory
pub const ROOT_INO: Ino = 2;

/// Maximum directory entry name length
pub const NAME_LEN: usize = 255;

/// Inode number
pub type Ino = u32;

/// File type mask
pub const S_IFMT: u16 = 0o170000;
/// Directory
pub const S_IFDIR: u16 = 0o040000;
/// Regular file
pub const S_IFREG: u16 = 0o100000;

/// Mode hint handed to the allocator for new files
pub const DEFAULT_CREATE_MODE: u16 = 0o010755;

/// Inode uses extents instead of block pointers
pub const EXTENTS_FL: u32 = 0x0008_0000;

/// Check whether a mode describes a directory
pub fn is_dir_mode(mode: u16) -> bool {
    mode & S_IFMT == S_IFDIR
}

bitflags! {
    /// Filesystem handle state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FsFlags: u32 {
        /// Opened read/write
        const RW = 0x01;
        /// Inode bitmap modified in memory
        const IB_DIRTY = 0x02;
        /// Block bitmap modified in memory
        const BB_DIRTY = 0x04;
        /// Superblock modified in memory
        const DIRTY = 0x08;
    }
}

bitflags! {
    /// Flags passed when opening an I/O channel
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// Channel will be written
        const RW = 0x01;
    }
}

/// Access mode for library file handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Read only
    Read,
    /// Read and write
    Write,
}

/// Directory entry file type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FileType {
    /// Unknown
    Unknown = 0,
    /// Regular file
    RegFile = 1,
    /// Directory
    Dir = 2,
}

/// Inode record as exposed by the filesystem library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inode {
    /// File mode
    pub mode: u16,
    /// Owner uid (low 16 bits)
    pub uid: u16,
    /// Size in bytes (low 32 bits)
    pub size: u32,
    /// Access time
    pub atime: u32,
    /// Inode change time
    pub ctime: u32,
    /// Modification time
    pub mtime: u32,
    /// Deletion time
    pub dtime: u32,
    /// Group id (low 16 bits)
    pub gid: u16,
    /// Hard link count
    pub links_count: u16,
    /// 512-byte sectors held
    pub blocks: u32,
    /// Inode flags
    pub flags: u32,
    /// Block pointers (or extent tree root)
    pub block: [u32; 15],
    /// Size in bytes (high 32 bits)
    pub size_high: u32,
}

impl Inode {
    /// Full 64-bit file size
    pub fn size(&self) -> u64 {
        self.size as u64 | ((self.size_high as u64) << 32)
    }

    /// Set the full 64-bit file size
    pub fn set_size(&mut self, size: u64) {
        self.size = size as u32;
        self.size_high = (size >> 32) as u32;
    }

    /// Whether this inode is a directory
    pub fn is_dir(&self) -> bool {
        is_dir_mode(self.mode)
    }
}

/// Directory entry produced while iterating a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode number (0 for an unused slot)
    pub inode: Ino,
    /// Raw name length field; only the low byte is meaningful
    pub name_len: u16,
    /// Name bytes
    pub name: Vec<u8>,
}

impl DirEntry {
    /// Name bytes clamped to the name length field and `NAME_LEN`
    pub fn name_bytes(&self) -> &[u8] {
        let len = ((self.name_len & 0xFF) as usize).min(NAME_LEN).min(self.name.len());
        &self.name[..len]
    }
}
