//! Filesystem sessions
//!
//! A `Session` owns the library handle, and through it the channel and
//! the drive. Closing consumes the session, so nothing can reach the
//! handle afterwards. `Mount` is the slot an embedding program keeps its
//! one session in; it refuses to open a second.

use crate::config::Options;
use crate::error::{Error, Result};
use crate::library::FsLibrary;
use crate::types::{FsFlags, Ino, ROOT_INO};
use log::{error, info, warn};

/// An open filesystem
pub struct Session<L: FsLibrary> {
    fs: L,
    root: Ino,
    cwd: Ino,
    bitmaps_loaded: bool,
    options: Options,
}

impl<L: FsLibrary> Session<L> {
    /// Open the filesystem behind `channel`
    pub fn open(channel: L::Channel, options: Options) -> Result<Self> {
        let flags = if options.read_write { FsFlags::RW } else { FsFlags::empty() };

        let fs = L::open(channel, flags).map_err(|e| {
            error!("Can't open filesystem: {}", e);
            Error::Library(e)
        })?;

        if !fs.has_superblock() {
            error!("Filesystem has no valid superblock");
            return Err(Error::InvalidSuperblock);
        }

        info!(
            "Valid superblock, mounted {}",
            if fs.flags().contains(FsFlags::RW) { "Read/Write" } else { "Read Only" }
        );

        if fs.now() == 0 && (options.wall_clock)() == 0 {
            warn!("Filesystem has no clock and no wall clock is set; new inodes get time 0");
        }

        Ok(Self {
            fs,
            root: ROOT_INO,
            cwd: ROOT_INO,
            bitmaps_loaded: false,
            options,
        })
    }

    /// Read the inode and block bitmaps; required before any allocation
    pub fn load_bitmaps(&mut self) -> Result<()> {
        info!("Loading bitmaps...");

        self.fs.read_inode_bitmap().map_err(|e| {
            error!("can't read inode bitmap: {}", e);
            Error::InodeBitmap(e)
        })?;

        self.fs.read_block_bitmap().map_err(|e| {
            error!("can't read block bitmap: {}", e);
            Error::BlockBitmap(e)
        })?;

        self.bitmaps_loaded = true;
        Ok(())
    }

    /// Close the filesystem, writing back dirty bitmaps when `flush` is set
    ///
    /// The first failing step ends the close; later steps are skipped.
    pub fn close(mut self, flush: bool) -> Result<()> {
        info!(
            "Closing Filesystem...Changes will {} written to disk.",
            if flush { "be" } else { "NOT be" }
        );

        if flush {
            let flags = self.fs.flags();

            if flags.contains(FsFlags::IB_DIRTY) {
                info!("Syncing inode_bitmap...");
                self.fs.write_inode_bitmap().map_err(|e| {
                    error!("write_inode_bitmap: {}", e);
                    Error::Library(e)
                })?;
            }

            if flags.contains(FsFlags::BB_DIRTY) {
                info!("Syncing block_bitmap...");
                self.fs.write_block_bitmap().map_err(|e| {
                    error!("write_block_bitmap: {}", e);
                    Error::Library(e)
                })?;
            }
        }

        self.fs.close().map_err(|e| {
            error!("close: {}", e);
            Error::Library(e)
        })
    }

    /// Root directory inode
    pub fn root(&self) -> Ino {
        self.root
    }

    /// Current directory inode
    pub fn cwd(&self) -> Ino {
        self.cwd
    }

    /// Whether the filesystem was opened read/write
    pub fn is_read_write(&self) -> bool {
        self.fs.flags().contains(FsFlags::RW)
    }

    /// Whether `load_bitmaps` has succeeded
    pub fn bitmaps_loaded(&self) -> bool {
        self.bitmaps_loaded
    }

    /// Options the session was opened with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Library handle
    pub fn library(&self) -> &L {
        &self.fs
    }

    /// Mutable library handle
    pub fn library_mut(&mut self) -> &mut L {
        &mut self.fs
    }

    /// Timestamp for inode updates: the filesystem clock, else wall clock
    pub fn now(&self) -> u32 {
        match self.fs.now() {
            0 => (self.options.wall_clock)(),
            now => now,
        }
    }

    pub(crate) fn require_writable(&self) -> Result<()> {
        if !self.is_read_write() {
            return Err(Error::ReadOnly);
        }
        if !self.bitmaps_loaded {
            return Err(Error::BitmapsNotLoaded);
        }
        Ok(())
    }
}

/// Slot holding the one open session
pub struct Mount<L: FsLibrary> {
    session: Option<Session<L>>,
}

impl<L: FsLibrary> Mount<L> {
    /// Empty slot
    pub const fn new() -> Self {
        Self { session: None }
    }

    /// Open a session; fails if one is already open
    pub fn open(&mut self, channel: L::Channel, options: Options) -> Result<&mut Session<L>> {
        if self.session.is_some() {
            error!("A filesystem session is already open");
            return Err(Error::SessionActive);
        }
        Ok(self.session.insert(Session::open(channel, options)?))
    }

    /// Whether a session is open
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// The open session
    pub fn session(&mut self) -> Result<&mut Session<L>> {
        self.session.as_mut().ok_or(Error::NoSession)
    }

    /// Close the open session; the slot is empty afterwards either way
    pub fn close(&mut self, flush: bool) -> Result<()> {
        self.session.take().ok_or(Error::NoSession)?.close(flush)
    }
}

impl<L: FsLibrary> Default for Mount<L> {
    fn default() -> Self {
        Self::new()
    }
}
