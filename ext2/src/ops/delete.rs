//! File removal

use super::{resolve_parent, split_path};
use crate::error::{Error, LibResult, Result};
use crate::library::FsLibrary;
use crate::session::Session;
use crate::types::Ino;
use log::{debug, error, warn};

/// Remove the file at `path`
///
/// Drops one link. When the last link goes, the inode is stamped with a
/// deletion time and its blocks and inode are returned to the allocator.
/// Directories are refused.
pub fn delete_file<L: FsLibrary>(session: &mut Session<L>, path: &str) -> Result<()> {
    session.require_writable()?;

    let (root, cwd) = (session.root(), session.cwd());
    let fs = session.library_mut();

    let ino = fs.namei(root, cwd, path).map_err(|e| {
        error!("\"{}\": {}", path, e);
        Error::Library(e)
    })?;

    let mut inode = fs.read_inode(ino).map_err(|e| {
        error!("Can't read inode {}: {}", ino, e);
        Error::Library(e)
    })?;
    if inode.is_dir() {
        error!("\"{}\" is a directory", path);
        return Err(Error::IsDirectory);
    }

    inode.links_count = inode.links_count.saturating_sub(1);
    fs.write_inode(ino, &inode).map_err(|e| {
        error!("Can't write inode {}: {}", ino, e);
        Error::Library(e)
    })?;

    if let Err(e) = unlink_path(session, path) {
        warn!("Can't unlink \"{}\": {}", path, e);
    }

    if inode.links_count == 0 {
        release_inode(session, ino)?;
    }

    Ok(())
}

fn unlink_path<L: FsLibrary>(session: &mut Session<L>, path: &str) -> Result<()> {
    let (parent, name) = split_path(path);
    let parent_ino = resolve_parent(session, parent)?;
    session.library_mut().unlink(parent_ino, name).map_err(Error::Library)
}

fn release_inode<L: FsLibrary>(session: &mut Session<L>, ino: Ino) -> Result<()> {
    let now = session.now();
    let fs = session.library_mut();

    let mut inode = fs.read_inode(ino).map_err(|e| {
        error!("Can't re-read inode {}: {}", ino, e);
        Error::Library(e)
    })?;
    inode.dtime = now;
    fs.write_inode(ino, &inode).map_err(|e| {
        error!("Can't stamp inode {}: {}", ino, e);
        Error::Library(e)
    })?;

    if !fs.inode_has_valid_blocks(&inode) {
        error!("Inode {} has invalid blocks", ino);
        return Err(Error::InvalidBlocks);
    }

    let freed = free_blocks(fs, ino).map_err(|e| {
        error!("Can't walk blocks of inode {}: {}", ino, e);
        Error::Library(e)
    })?;
    fs.inode_alloc_stats(ino, -1, inode.is_dir());

    debug!("Released inode {} ({} blocks)", ino, freed);
    Ok(())
}

/// Return every block held by `ino` to the allocator
pub(super) fn free_blocks<L: FsLibrary>(fs: &mut L, ino: Ino) -> LibResult<u32> {
    let mut cursor = fs.block_open(ino)?;
    let mut freed = 0;
    while let Some(block) = fs.block_next(&mut cursor) {
        fs.block_alloc_stats(block?, -1);
        freed += 1;
    }
    Ok(freed)
}
