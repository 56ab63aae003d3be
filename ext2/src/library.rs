//! Filesystem library contract
//!
//! The ext2 library owns the on-disk format: superblock, group
//! descriptors, bitmaps, extent trees and name lookup. This crate only
//! drives it. `FsLibrary` lists the primitives the session and mutation
//! layers rely on; every implementation sits on top of an `IoChannel`.
//!
//! Directory and block walks are cursor based: `dir_open`/`block_open`
//! start a walk and `dir_next`/`block_next` produce one item at a time,
//! so the caller may call back into the library between items.

use crate::channel::IoChannel;
use crate::error::LibResult;
use crate::types::{DirEntry, FileMode, FileType, FsFlags, Ino, Inode};

/// Primitive operations provided by the ext2 library
pub trait FsLibrary: Sized {
    /// Storage backend the library opens
    type Channel: IoChannel;
    /// Open file handle
    type File;
    /// Directory walk state
    type DirCursor;
    /// Block walk state
    type BlockCursor;

    /// Open the filesystem stored behind `channel`
    fn open(channel: Self::Channel, flags: FsFlags) -> LibResult<Self>;

    /// Write back library state and release the channel
    fn close(self) -> LibResult<()>;

    /// Whether a superblock was loaded
    fn has_superblock(&self) -> bool;

    /// Handle state flags
    fn flags(&self) -> FsFlags;

    /// Filesystem clock, 0 when unset
    fn now(&self) -> u32;

    /// Whether the filesystem declares the extents feature
    fn has_extents(&self) -> bool;

    /// Filesystem block size
    fn block_size(&self) -> u32;

    /// Load the inode bitmap
    fn read_inode_bitmap(&mut self) -> LibResult<()>;

    /// Load the block bitmap
    fn read_block_bitmap(&mut self) -> LibResult<()>;

    /// Write back the inode bitmap
    fn write_inode_bitmap(&mut self) -> LibResult<()>;

    /// Write back the block bitmap
    fn write_block_bitmap(&mut self) -> LibResult<()>;

    /// Whether `ino` is marked in use
    fn test_inode_bitmap(&self, ino: Ino) -> bool;

    /// Resolve `path` relative to `cwd`, or to `root` when absolute
    fn namei(&mut self, root: Ino, cwd: Ino, path: &str) -> LibResult<Ino>;

    /// Succeeds when `ino` is a directory
    fn check_directory(&mut self, ino: Ino) -> LibResult<()>;

    /// Start walking the entries of directory `dir`
    fn dir_open(&mut self, dir: Ino) -> LibResult<Self::DirCursor>;

    /// Next directory entry, `None` once the walk is complete
    fn dir_next(&mut self, cursor: &mut Self::DirCursor) -> Option<LibResult<DirEntry>>;

    /// Read an inode record
    fn read_inode(&mut self, ino: Ino) -> LibResult<Inode>;

    /// Write an inode record
    fn write_inode(&mut self, ino: Ino, inode: &Inode) -> LibResult<()>;

    /// Write a freshly allocated inode record, initializing extra fields
    fn write_new_inode(&mut self, ino: Ino, inode: &Inode) -> LibResult<()>;

    /// Pick a free inode near `parent`
    fn new_inode(&mut self, parent: Ino, mode: u16) -> LibResult<Ino>;

    /// Add a directory entry `name -> ino` to `parent`
    fn link(&mut self, parent: Ino, name: &str, ino: Ino, file_type: FileType) -> LibResult<()>;

    /// Remove directory entry `name` from `parent`
    fn unlink(&mut self, parent: Ino, name: &str) -> LibResult<()>;

    /// Grow directory `dir` by one block
    fn expand_dir(&mut self, dir: Ino) -> LibResult<()>;

    /// Create directory `name` in `parent`
    fn mkdir(&mut self, parent: Ino, name: &str) -> LibResult<()>;

    /// Whether the inode's block list can be walked
    fn inode_has_valid_blocks(&self, inode: &Inode) -> bool;

    /// Start walking the blocks held by `ino`
    fn block_open(&mut self, ino: Ino) -> LibResult<Self::BlockCursor>;

    /// Next block number, `None` once the walk is complete
    fn block_next(&mut self, cursor: &mut Self::BlockCursor) -> Option<LibResult<u64>>;

    /// Update block allocation statistics by `delta`
    fn block_alloc_stats(&mut self, block: u64, delta: i32);

    /// Update inode allocation statistics by `delta`
    fn inode_alloc_stats(&mut self, ino: Ino, delta: i32, is_dir: bool);

    /// Open inode `ino` as a file
    fn file_open(&mut self, ino: Ino, mode: FileMode) -> LibResult<Self::File>;

    /// Size of an open file
    fn file_size(&self, file: &Self::File) -> u64;

    /// Read at the file position, returning the bytes transferred
    fn file_read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> LibResult<usize>;

    /// Write at the file position, returning the bytes transferred
    fn file_write(&mut self, file: &mut Self::File, buf: &[u8]) -> LibResult<usize>;

    /// Flush and close a file
    fn file_close(&mut self, file: Self::File) -> LibResult<()>;
}
