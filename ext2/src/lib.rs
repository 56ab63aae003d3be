//! ext2 Access Layer over BIOS Sector I/O
//!
//! A `no_std` layer that lets a boot-time program read and modify files on
//! an ext2 partition of a BIOS hard drive. The on-disk format itself is
//! handled by an ext2 library behind the [`FsLibrary`] trait; this crate
//! provides everything around it.
//!
//! # Architecture
//!
//! The implementation is layered:
//! 1. **Disk layer** - Parses `/dev/hd<letter><n>`, queries drive geometry
//!    and walks the MBR/EBR partition table
//! 2. **Channel layer** - Translates filesystem blocks to absolute sectors,
//!    bouncing sub-sector requests through a scratch sector
//! 3. **Session layer** - Opens the filesystem, loads bitmaps, writes them
//!    back on close
//! 4. **Operations layer** - Whole-file load/write, directory listing and
//!    creation, file deletion
//! 5. **Command layer** - `cat`, `cp`, `ls`, `mkdir` and `rm`
//!
//! # Usage
//!
//! ```ignore
//! use ext2io::{load_file, write_file, OpenFlags, Options, SectorChannel, Session};
//!
//! // Resolve the partition and open a channel on it
//! let channel = SectorChannel::open(bios, "/dev/hda1", OpenFlags::RW)?;
//!
//! // Open the filesystem and load the allocation bitmaps
//! let mut session = Session::<Ext2Fs>::open(channel, Options::default())?;
//! session.load_bitmaps()?;
//!
//! let config = load_file(&mut session, "/boot/extlinux.conf")?;
//! write_file(&mut session, "/boot/extlinux.bak", &config, 0o100644)?;
//!
//! // Write dirty bitmaps back and release the drive
//! session.close(true)?;
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod channel;
pub mod command;
pub mod config;
pub mod disk;
pub mod error;
pub mod library;
pub mod ops;
pub mod session;
pub mod types;
pub mod utils;

pub use error::{Error, LibError, LibResult, Result};
pub use types::{DirEntry, FileMode, FileType, FsFlags, Ino, Inode, OpenFlags};

pub use channel::{BlockRequest, IoChannel, SectorChannel};
pub use config::Options;
pub use disk::{resolve_partition, BiosDrive, DiskServices, PartitionDescriptor};
pub use library::FsLibrary;
pub use session::{Mount, Session};

// High-level API exports
pub use ops::{delete_file, exists, is_directory, list_directory, load_file, make_directory, write_file};
