//! Whole-file reads and writes

use super::txn::CreateTxn;
use super::{check_leaf, resolve_parent, split_path};
use crate::error::{Error, LibError, Result};
use crate::library::FsLibrary;
use crate::session::Session;
use crate::types::{FileMode, Ino, Inode, DEFAULT_CREATE_MODE, EXTENTS_FL};
use crate::utils::try_alloc_zeroed;
use alloc::vec::Vec;
use log::{debug, error, warn};

/// Read the whole file at `path` into memory
///
/// The buffer is sized from the file's declared size. The file handle is
/// closed on every path out of this function.
pub fn load_file<L: FsLibrary>(session: &mut Session<L>, path: &str) -> Result<Vec<u8>> {
    let (root, cwd) = (session.root(), session.cwd());
    let fs = session.library_mut();

    let ino = fs.namei(root, cwd, path).map_err(|e| {
        error!("\"{}\": {}", path, e);
        Error::Library(e)
    })?;

    let mut file = fs.file_open(ino, FileMode::Read).map_err(|e| {
        error!("Can't open \"{}\": {}", path, e);
        Error::Library(e)
    })?;

    match read_to_end(fs, &mut file) {
        Ok(data) => {
            fs.file_close(file).map_err(Error::Library)?;
            debug!("Loaded {} bytes from \"{}\"", data.len(), path);
            Ok(data)
        }
        Err(e) => {
            error!("Can't read \"{}\": {}", path, e);
            if let Err(close) = fs.file_close(file) {
                warn!("close after failed read: {}", close);
            }
            Err(e)
        }
    }
}

fn read_to_end<L: FsLibrary>(fs: &mut L, file: &mut L::File) -> Result<Vec<u8>> {
    let size = usize::try_from(fs.file_size(file)).map_err(|_| Error::OutOfMemory)?;
    let mut data = try_alloc_zeroed(size)?;

    let mut done = 0;
    while done < size {
        let got = fs.file_read(file, &mut data[done..]).map_err(Error::Library)?;
        if got == 0 {
            return Err(Error::ShortTransfer);
        }
        done += got;
    }

    Ok(data)
}

/// Create `path` holding `data`
///
/// Fails with `LibError::FileExists` before allocating anything when the
/// path already resolves. Any later failure undoes the steps already
/// taken.
pub fn write_file<L: FsLibrary>(session: &mut Session<L>, path: &str, data: &[u8], mode: u16) -> Result<()> {
    session.require_writable()?;

    if super::exists(session, path) {
        error!("\"{}\" already exists", path);
        return Err(Error::Library(LibError::FileExists));
    }

    let (parent, name) = split_path(path);
    check_leaf(name)?;
    let parent_ino = resolve_parent(session, parent)?;

    let mut txn = CreateTxn::begin(session, parent_ino, name);

    let ino = txn.allocate(DEFAULT_CREATE_MODE)?;
    txn.link(ino)?;
    txn.account(ino);

    let session = txn.session();
    let now = session.now();
    let mut inode = Inode {
        mode,
        atime: now,
        ctime: now,
        mtime: now,
        links_count: 1,
        ..Inode::default()
    };
    inode.set_size(data.len() as u64);
    if session.library().has_extents() {
        inode.flags |= EXTENTS_FL;
    }
    txn.write_inode(ino, &inode)?;

    write_contents(txn.session().library_mut(), ino, data).map_err(|e| {
        error!("Can't write \"{}\": {}", path, e);
        e
    })?;

    txn.commit();
    debug!("Wrote {} bytes to \"{}\" (inode {})", data.len(), path, ino);
    Ok(())
}

fn write_contents<L: FsLibrary>(fs: &mut L, ino: Ino, data: &[u8]) -> Result<()> {
    let mut file = fs.file_open(ino, FileMode::Write).map_err(Error::Library)?;

    let mut result = Ok(());
    let mut done = 0;
    while done < data.len() {
        match fs.file_write(&mut file, &data[done..]) {
            Ok(0) => {
                result = Err(Error::ShortTransfer);
                break;
            }
            Ok(put) => done += put,
            Err(e) => {
                result = Err(Error::Library(e));
                break;
            }
        }
    }

    let closed = fs.file_close(file).map_err(Error::Library);
    result.and(closed)
}
