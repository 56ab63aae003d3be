//! File creation transaction
//!
//! Creating a file touches the inode allocator, the parent directory and
//! the file's own blocks in separate library calls. `CreateTxn` records
//! which of those steps completed; dropping it without `commit` undoes
//! them in reverse order, best effort.

use super::delete::free_blocks;
use super::with_dir_expansion;
use crate::error::{Error, Result};
use crate::library::FsLibrary;
use crate::session::Session;
use crate::types::{FileType, Ino, Inode};
use log::{error, warn};

pub(super) struct CreateTxn<'a, L: FsLibrary> {
    session: &'a mut Session<L>,
    parent: Ino,
    name: &'a str,
    ino: Option<Ino>,
    linked: bool,
    accounted: bool,
    inode_written: bool,
    committed: bool,
}

impl<'a, L: FsLibrary> CreateTxn<'a, L> {
    pub(super) fn begin(session: &'a mut Session<L>, parent: Ino, name: &'a str) -> Self {
        Self {
            session,
            parent,
            name,
            ino: None,
            linked: false,
            accounted: false,
            inode_written: false,
            committed: false,
        }
    }

    pub(super) fn session(&mut self) -> &mut Session<L> {
        &mut *self.session
    }

    /// Pick a free inode under the parent
    pub(super) fn allocate(&mut self, mode: u16) -> Result<Ino> {
        let ino = self.session.library_mut().new_inode(self.parent, mode).map_err(|e| {
            error!("Can't allocate inode for \"{}\": {}", self.name, e);
            Error::Library(e)
        })?;
        self.ino = Some(ino);
        Ok(ino)
    }

    /// Link the allocated inode into the parent, expanding it if full
    pub(super) fn link(&mut self, ino: Ino) -> Result<u32> {
        let (parent, name) = (self.parent, self.name);
        let expansions = with_dir_expansion(&mut *self.session, parent, |fs| fs.link(parent, name, ino, FileType::RegFile))
            .map_err(|e| {
                error!("Can't link \"{}\" into dir {}: {}", name, parent, e);
                e
            })?;
        self.linked = true;
        Ok(expansions)
    }

    /// Mark the inode in use in the allocation statistics
    pub(super) fn account(&mut self, ino: Ino) {
        let fs = self.session.library_mut();
        if fs.test_inode_bitmap(ino) {
            warn!("Inode {} already set", ino);
        }
        fs.inode_alloc_stats(ino, 1, false);
        self.accounted = true;
    }

    /// Write the initial inode record
    pub(super) fn write_inode(&mut self, ino: Ino, inode: &Inode) -> Result<()> {
        self.session.library_mut().write_new_inode(ino, inode).map_err(|e| {
            error!("Can't write inode {}: {}", ino, e);
            Error::Library(e)
        })?;
        self.inode_written = true;
        Ok(())
    }

    pub(super) fn commit(mut self) {
        self.committed = true;
    }

    fn rollback(&mut self, ino: Ino) {
        warn!("Rolling back creation of \"{}\" (inode {})", self.name, ino);
        let now = self.session.now();
        let fs = self.session.library_mut();

        if self.inode_written {
            if let Err(e) = free_blocks(fs, ino) {
                warn!("rollback: can't free blocks of inode {}: {}", ino, e);
            }
            let released = fs.read_inode(ino).and_then(|mut inode| {
                inode.links_count = 0;
                inode.dtime = now;
                fs.write_inode(ino, &inode)
            });
            if let Err(e) = released {
                warn!("rollback: can't release inode {}: {}", ino, e);
            }
        }

        if self.linked {
            if let Err(e) = fs.unlink(self.parent, self.name) {
                warn!("rollback: can't unlink \"{}\": {}", self.name, e);
            }
        }

        if self.accounted {
            fs.inode_alloc_stats(ino, -1, false);
        }
    }
}

impl<L: FsLibrary> Drop for CreateTxn<'_, L> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(ino) = self.ino {
            self.rollback(ino);
        }
    }
}
