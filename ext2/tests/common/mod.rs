//! Common test utilities: in-memory firmware disk, partition table
//! builder and a mock ext2 library
#![allow(dead_code)]

pub use mockfs::{format_ext2, MockFs, MockLayout};

use ext2io::disk::{BiosDrive, DiskServices, DriveParameters, EddParameters};
use ext2io::{OpenFlags, Options, SectorChannel, Session};
use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;

pub const SECTOR: usize = 512;

/// Start of the formatted test partition
pub const PART_START: u64 = 63;

/// Length of the formatted test partition in sectors (256 KiB)
pub const PART_SECTORS: u64 = 512;

pub type TestChannel = SectorChannel<BiosDrive<MemoryBios>>;
pub type TestFs = MockFs<TestChannel>;

/// One firmware sector transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read { drive: u8, lba: u64, count: usize },
    Write { drive: u8, lba: u64, count: usize },
}

#[derive(Debug)]
struct Drive {
    image: Vec<u8>,
    params: Result<DriveParameters, u16>,
}

#[derive(Debug, Default)]
struct DiskState {
    drives: BTreeMap<u8, Drive>,
    log: Vec<Access>,
    fail_read_lba: Option<u64>,
    fail_writes: bool,
}

/// Firmware disk services backed by memory
///
/// Clones share the same drives, so a test can keep a handle after the
/// services have been moved into a channel.
#[derive(Debug, Clone, Default)]
pub struct MemoryBios {
    state: Rc<RefCell<DiskState>>,
}

impl MemoryBios {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `image` as BIOS drive `number` with EDD geometry
    pub fn with_drive(self, number: u8, image: Vec<u8>) -> Self {
        let sectors = (image.len() / SECTOR) as u64;
        let params = DriveParameters {
            legacy_max_head: 15,
            legacy_max_cylinder: 1023,
            legacy_sectors_per_track: 63,
            legacy_max_drive: 1,
            edd: Some(EddParameters {
                version: 0x30,
                heads: 16,
                cylinders: ((sectors + 16 * 63 - 1) / (16 * 63)) as u32,
                sectors,
                bytes_per_sector: SECTOR as u16,
                sectors_per_track: 63,
            }),
        };
        self.state.borrow_mut().drives.insert(number, Drive { image, params: Ok(params) });
        self
    }

    /// Make the parameter query for `number` fail with `status`
    pub fn fail_geometry(&self, number: u8, status: u16) {
        if let Some(drive) = self.state.borrow_mut().drives.get_mut(&number) {
            drive.params = Err(status);
        }
    }

    /// Fail any read touching `lba`
    pub fn fail_reads_at(&self, lba: Option<u64>) {
        self.state.borrow_mut().fail_read_lba = lba;
    }

    /// Fail every write
    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn log(&self) -> Vec<Access> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    pub fn image(&self, number: u8) -> Vec<u8> {
        self.state.borrow().drives[&number].image.clone()
    }

    pub fn sector(&self, number: u8, lba: u64) -> Vec<u8> {
        let off = lba as usize * SECTOR;
        self.state.borrow().drives[&number].image[off..off + SECTOR].to_vec()
    }

    pub fn poke(&self, number: u8, offset: usize, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let image = &mut state.drives.get_mut(&number).expect("drive").image;
        image[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

fn out_of_range(lba: u64) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, format!("lba {} past end of disk", lba))
}

impl DiskServices for MemoryBios {
    type Error = io::Error;

    fn drive_parameters(&mut self, drive: u8) -> Result<DriveParameters, u16> {
        match self.state.borrow().drives.get(&drive) {
            Some(d) => d.params,
            None => Err(0x01),
        }
    }

    fn read_sectors(&mut self, drive: u8, lba: u64, dst: &mut [u8]) -> Result<(), io::Error> {
        let mut state = self.state.borrow_mut();
        let count = dst.len() / SECTOR;
        state.log.push(Access::Read { drive, lba, count });

        if let Some(bad) = state.fail_read_lba {
            if bad >= lba && bad < lba + count as u64 {
                return Err(io::Error::new(io::ErrorKind::Other, "injected read fault"));
            }
        }

        let image = &state.drives.get(&drive).ok_or_else(|| out_of_range(lba))?.image;
        let off = lba as usize * SECTOR;
        let end = off + count * SECTOR;
        if end > image.len() {
            return Err(out_of_range(lba));
        }
        dst[..count * SECTOR].copy_from_slice(&image[off..end]);
        Ok(())
    }

    fn write_sectors(&mut self, drive: u8, lba: u64, src: &[u8]) -> Result<(), io::Error> {
        let mut state = self.state.borrow_mut();
        let count = src.len() / SECTOR;
        state.log.push(Access::Write { drive, lba, count });

        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write fault"));
        }

        let image = &mut state.drives.get_mut(&drive).ok_or_else(|| out_of_range(lba))?.image;
        let off = lba as usize * SECTOR;
        let end = off + count * SECTOR;
        if end > image.len() {
            return Err(out_of_range(lba));
        }
        image[off..end].copy_from_slice(&src[..count * SECTOR]);
        Ok(())
    }
}

/// In-memory block device for testing
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
    pub reads: Vec<u64>,
}

impl MemoryBlockDevice {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, reads: Vec::new() }
    }
}

impl BlockIo for MemoryBlockDevice {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.len() / SECTOR) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        self.reads.push(start_lba.0);
        let off = start_lba.0 as usize * SECTOR;
        if off + dst.len() > self.data.len() {
            return Err(out_of_range(start_lba.0));
        }
        dst.copy_from_slice(&self.data[off..off + dst.len()]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let off = start_lba.0 as usize * SECTOR;
        if off + src.len() > self.data.len() {
            return Err(out_of_range(start_lba.0));
        }
        self.data[off..off + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Builder for MBR/EBR partition tables
pub struct DiskImage {
    data: Vec<u8>,
}

impl DiskImage {
    /// Blank disk of `sectors` sectors with a signed, empty MBR
    pub fn new(sectors: usize) -> Self {
        let mut image = Self { data: vec![0u8; sectors * SECTOR] };
        image.sign(0);
        image
    }

    /// Write a partition entry into table `slot` of the sector at `lba`
    pub fn entry(mut self, lba: u64, slot: usize, os_type: u8, start: u32, length: u32) -> Self {
        let off = lba as usize * SECTOR + 446 + slot * 16;
        let e = &mut self.data[off..off + 16];
        e[0] = 0;
        e[4] = os_type;
        e[8..12].copy_from_slice(&start.to_le_bytes());
        e[12..16].copy_from_slice(&length.to_le_bytes());
        self.sign(lba);
        self
    }

    /// Mark the entry in `slot` of the MBR active
    pub fn active(mut self, slot: usize) -> Self {
        self.data[446 + slot * 16] = 0x80;
        self
    }

    /// Remove the boot signature from the sector at `lba`
    pub fn unsigned(mut self, lba: u64) -> Self {
        let off = lba as usize * SECTOR + 510;
        self.data[off] = 0;
        self.data[off + 1] = 0;
        self
    }

    /// Format an ext2 filesystem into the partition at `start`
    pub fn ext2(mut self, start: u64, layout: MockLayout) -> Self {
        let off = start as usize * SECTOR;
        format_ext2(&mut self.data[off..], layout);
        self
    }

    pub fn fill(mut self, lba: u64, byte: u8) -> Self {
        let off = lba as usize * SECTOR;
        self.data[off..off + SECTOR].fill(byte);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    fn sign(&mut self, lba: u64) {
        let off = lba as usize * SECTOR + 510;
        self.data[off] = 0x55;
        self.data[off + 1] = 0xAA;
    }
}

/// Disk with one ext2 partition at `PART_START`, attached as drive 0x80
pub fn ext2_bios(layout: MockLayout) -> MemoryBios {
    let image = DiskImage::new((PART_START + PART_SECTORS + 1) as usize)
        .entry(0, 0, 0x83, PART_START as u32, PART_SECTORS as u32)
        .ext2(PART_START, layout)
        .build();
    MemoryBios::new().with_drive(0x80, image)
}

pub fn open_session(bios: &MemoryBios, options: Options) -> Session<TestFs> {
    let channel = SectorChannel::open(bios.clone(), "/dev/hda1", OpenFlags::RW).expect("channel");
    Session::open(channel, options).expect("session")
}

/// Read/write session with bitmaps loaded
pub fn writable_session(bios: &MemoryBios) -> Session<TestFs> {
    let mut session = open_session(bios, Options::default());
    session.load_bitmaps().expect("bitmaps");
    session
}

/// Deterministic test content
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
}
