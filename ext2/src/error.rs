//! Error types for ext2 access operations

use core::fmt;

/// Result type for ext2 access operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type returned by the filesystem library
pub type LibResult<T> = core::result::Result<T, LibError>;

/// Errors surfaced by the partition resolver, block channel, session and
/// mutation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Device identifier is not of the form `/dev/hd<letter><number>`
    InvalidDevice,

    /// Drive parameter query failed with the given firmware status
    Geometry(u16),

    /// No partition with the requested index in the partition table
    PartitionNotFound,

    /// Sector read or write failed
    Io,

    /// Scratch sector for a sub-sector read could not be allocated
    SectorBufferAlloc,

    /// Buffer allocation failed
    OutOfMemory,

    /// Caller buffer is smaller than the requested transfer
    BufferTooSmall,

    /// Error reported by the filesystem library
    Library(LibError),

    /// Filesystem opened but no superblock is available
    InvalidSuperblock,

    /// Inode block list is malformed
    InvalidBlocks,

    /// Path has no usable final component
    InvalidPath,

    /// Path names a directory where a file is required
    IsDirectory,

    /// Directory is still full after the allowed number of expansions
    DirectoryFull,

    /// File transfer made no progress while bytes remained
    ShortTransfer,

    /// Inode bitmap could not be read
    InodeBitmap(LibError),

    /// Block bitmap could not be read
    BlockBitmap(LibError),

    /// Allocation attempted before the bitmaps were loaded
    BitmapsNotLoaded,

    /// Mutation attempted on a read-only session
    ReadOnly,

    /// A filesystem session is already open
    SessionActive,

    /// No filesystem session is open
    NoSession,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDevice => write!(f, "Device must be of the form \"/dev/hda1\""),
            Self::Geometry(status) => write!(f, "Drive parameter query failed (status 0x{:X})", status),
            Self::PartitionNotFound => write!(f, "Partition not found"),
            Self::Io => write!(f, "Sector I/O failed"),
            Self::SectorBufferAlloc => write!(f, "Cannot allocate sector buffer"),
            Self::OutOfMemory => write!(f, "Out of memory"),
            Self::BufferTooSmall => write!(f, "Buffer smaller than transfer"),
            Self::Library(err) => write!(f, "{}", err),
            Self::InvalidSuperblock => write!(f, "Invalid superblock"),
            Self::InvalidBlocks => write!(f, "Inode has invalid blocks"),
            Self::InvalidPath => write!(f, "Invalid path"),
            Self::IsDirectory => write!(f, "Is a directory"),
            Self::DirectoryFull => write!(f, "Directory full after expansion"),
            Self::ShortTransfer => write!(f, "File transfer made no progress"),
            Self::InodeBitmap(err) => write!(f, "Cannot read inode bitmap: {}", err),
            Self::BlockBitmap(err) => write!(f, "Cannot read block bitmap: {}", err),
            Self::BitmapsNotLoaded => write!(f, "Bitmaps not loaded"),
            Self::ReadOnly => write!(f, "Filesystem is read-only"),
            Self::SessionActive => write!(f, "A filesystem session is already open"),
            Self::NoSession => write!(f, "No filesystem session is open"),
        }
    }
}

impl From<LibError> for Error {
    fn from(err: LibError) -> Self {
        Self::Library(err)
    }
}

/// Error codes reported by the filesystem library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibError {
    /// Name lookup found no entry
    NotFound,

    /// Inode is not a directory
    NotADirectory,

    /// Entry already exists
    FileExists,

    /// No free space in the directory block
    DirNoSpace,

    /// Superblock magic mismatch
    BadMagic,

    /// Inode number out of range
    BadInodeNum,

    /// No free inodes
    InodeAllocFail,

    /// No free blocks
    BlockAllocFail,

    /// Bitmaps were not read before use
    BitmapsNotLoaded,

    /// Block device read failed
    ShortRead,

    /// Block device write failed
    ShortWrite,

    /// Filesystem opened read-only
    ReadOnly,

    /// Any other library error code
    Other(u32),
}

impl fmt::Display for LibError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "File not found by ext2_lookup"),
            Self::NotADirectory => write!(f, "Ext2 inode is not a directory"),
            Self::FileExists => write!(f, "Ext2 file already exists"),
            Self::DirNoSpace => write!(f, "No free space in the directory"),
            Self::BadMagic => write!(f, "Bad magic number in super-block"),
            Self::BadInodeNum => write!(f, "Illegal inode number"),
            Self::InodeAllocFail => write!(f, "Could not allocate inode"),
            Self::BlockAllocFail => write!(f, "Could not allocate block"),
            Self::BitmapsNotLoaded => write!(f, "Bitmaps not loaded"),
            Self::ShortRead => write!(f, "Attempt to read block from filesystem resulted in short read"),
            Self::ShortWrite => write!(f, "Attempt to write block to filesystem resulted in short write"),
            Self::ReadOnly => write!(f, "Attempt to write to filesystem opened read-only"),
            Self::Other(code) => write!(f, "Filesystem library error {}", code),
        }
    }
}
