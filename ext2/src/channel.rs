//! Block I/O channel
//!
//! The filesystem library addresses storage in filesystem blocks; the
//! firmware addresses it in absolute 512-byte sectors. A `SectorChannel`
//! owns the partition it was opened against and translates one into the
//! other:
//!
//! ```text
//! lba = (block * block_size) / SECTOR_SIZE + partition.start_lba
//! ```
//!
//! Requests smaller than a sector are bounced through a one-sector scratch
//! buffer, since the drive always transfers whole sectors.

use crate::disk::{resolve_partition, BiosDrive, DiskServices, PartitionDescriptor};
use crate::error::{Error, Result};
use crate::types::{OpenFlags, MIN_BLOCK_SIZE, SECTOR_SIZE};
use crate::utils::try_alloc_zeroed;
use alloc::string::String;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;
use log::{debug, error};

/// Name of the I/O manager backing these channels
pub const MANAGER_NAME: &str = "BIOS sector I/O manager";

/// Size of a block transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRequest {
    /// Whole filesystem blocks of the channel's block size
    Blocks(u32),
    /// A raw byte count, independent of block size (superblock access)
    RawBytes(usize),
}

impl BlockRequest {
    /// Decode the library's signed count: negative means raw bytes
    pub fn from_count(count: i32) -> Self {
        if count < 0 {
            Self::RawBytes(count.unsigned_abs() as usize)
        } else {
            Self::Blocks(count as u32)
        }
    }

    /// Transfer size in bytes for the given block size
    pub fn byte_len(&self, block_size: u32) -> usize {
        match *self {
            Self::Blocks(count) => count as usize * block_size as usize,
            Self::RawBytes(len) => len,
        }
    }
}

/// Storage contract the filesystem library is written against
pub trait IoChannel {
    /// Channel name (the device identifier)
    fn name(&self) -> &str;

    /// Current block size in bytes
    fn block_size(&self) -> u32;

    /// Change the block size used to address blocks
    fn set_block_size(&mut self, size: u32) -> Result<()>;

    /// Read `request` starting at filesystem block `block`
    fn read_block(&mut self, block: u64, request: BlockRequest, buf: &mut [u8]) -> Result<()>;

    /// Write `request` starting at filesystem block `block`
    fn write_block(&mut self, block: u64, request: BlockRequest, buf: &[u8]) -> Result<()>;

    /// Flush buffered writes
    fn flush(&mut self) -> Result<()>;

    /// Release the channel
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Translate a filesystem block to an absolute sector address
pub fn block_to_lba(block: u64, block_size: u32, partition_start: u64) -> u64 {
    (block * block_size as u64) / SECTOR_SIZE as u64 + partition_start
}

/// I/O channel over a sector device, bound to one partition
pub struct SectorChannel<B: BlockIo> {
    name: String,
    block_size: u32,
    read_errors: u32,
    write_errors: u32,
    partition: PartitionDescriptor,
    device: B,
}

impl<D: DiskServices> SectorChannel<BiosDrive<D>> {
    /// Resolve `device` and open a channel on the partition it names
    pub fn open(services: D, device: &str, flags: OpenFlags) -> Result<Self> {
        let (drive, partition) = resolve_partition(services, device).map_err(|_| Error::Io)?;
        debug!("Opening \"{}\" with {:?}", device, flags);
        Ok(Self::new(drive, partition))
    }
}

impl<B: BlockIo> SectorChannel<B> {
    /// Bind a channel to an already resolved partition
    pub fn new(device: B, partition: PartitionDescriptor) -> Self {
        Self {
            name: partition.device.clone(),
            block_size: MIN_BLOCK_SIZE,
            read_errors: 0,
            write_errors: 0,
            partition,
            device,
        }
    }

    /// Partition this channel addresses
    pub fn partition(&self) -> &PartitionDescriptor {
        &self.partition
    }

    /// Failed reads so far
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    /// Failed writes so far
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    /// Name of the manager that created this channel
    pub fn manager(&self) -> &'static str {
        MANAGER_NAME
    }

    /// Underlying sector device
    pub fn device(&self) -> &B {
        &self.device
    }

    /// Absolute sector address of a filesystem block
    pub fn lba_of(&self, block: u64) -> u64 {
        block_to_lba(block, self.block_size, self.partition.start_lba)
    }

    fn read_sectors(&mut self, lba: u64, dst: &mut [u8]) -> Result<()> {
        #[cfg(feature = "trace")]
        debug!("read lba={} sectors={}", lba, dst.len() / SECTOR_SIZE);

        self.device.read_blocks(Lba(lba), dst).map_err(|_| {
            self.read_errors += 1;
            error!("dev_read() failed at lba {}", lba);
            Error::Io
        })
    }

    fn write_sectors(&mut self, lba: u64, src: &[u8]) -> Result<()> {
        #[cfg(feature = "trace")]
        debug!("write lba={} sectors={}", lba, src.len() / SECTOR_SIZE);

        self.device.write_blocks(Lba(lba), src).map_err(|_| {
            self.write_errors += 1;
            error!("write failed at lba {}", lba);
            Error::Io
        })
    }
}

impl<B: BlockIo> IoChannel for SectorChannel<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn set_block_size(&mut self, size: u32) -> Result<()> {
        self.block_size = size;
        Ok(())
    }

    fn read_block(&mut self, block: u64, request: BlockRequest, buf: &mut [u8]) -> Result<()> {
        let size = request.byte_len(self.block_size);
        if buf.len() < size {
            return Err(Error::BufferTooSmall);
        }
        if size == 0 {
            return Ok(());
        }
        let lba = self.lba_of(block);

        if size < SECTOR_SIZE {
            // The drive fills a whole sector; never hand it a shorter buffer
            let mut sector = try_alloc_zeroed(SECTOR_SIZE).map_err(|_| {
                error!("can't allocate {} byte sector buffer", SECTOR_SIZE);
                Error::SectorBufferAlloc
            })?;
            self.read_sectors(lba, &mut sector)?;
            buf[..size].copy_from_slice(&sector[..size]);
            return Ok(());
        }

        let len = (size / SECTOR_SIZE) * SECTOR_SIZE;
        self.read_sectors(lba, &mut buf[..len])
    }

    fn write_block(&mut self, block: u64, request: BlockRequest, buf: &[u8]) -> Result<()> {
        let size = request.byte_len(self.block_size);
        if buf.len() < size {
            return Err(Error::BufferTooSmall);
        }
        if size == 0 {
            return Ok(());
        }
        if let BlockRequest::RawBytes(_) = request {
            debug!("Writing superblocks");
        }
        let lba = self.lba_of(block);

        if size < SECTOR_SIZE {
            if buf.len() >= SECTOR_SIZE {
                return self.write_sectors(lba, &buf[..SECTOR_SIZE]);
            }
            // Short caller buffer: merge into the sector already on disk
            let mut sector = try_alloc_zeroed(SECTOR_SIZE).map_err(|_| Error::SectorBufferAlloc)?;
            self.read_sectors(lba, &mut sector)?;
            sector[..size].copy_from_slice(&buf[..size]);
            return self.write_sectors(lba, &sector);
        }

        let len = (size / SECTOR_SIZE) * SECTOR_SIZE;
        self.write_sectors(lba, &buf[..len])
    }

    fn flush(&mut self) -> Result<()> {
        // No buffers, no flush
        Ok(())
    }

    fn close(self) -> Result<()> {
        debug!("Closing channel \"{}\"", self.name);
        Ok(())
    }
}
