//! Parsed IRD records.

/// An MD5 digest as stored in the container.
pub type Md5 = [u8; 16];

/// Size of the PIC (Permanent Information & Control) block.
pub const PIC_LENGTH: usize = 115;

/// A single file entry: its sector offset on the disc and content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrdFile {
    pub offset: u64,
    pub md5: Md5,
}

/// A parsed IRD record.
///
/// The header and footer are kept as the raw (gzip-compressed) ISO sectors
/// stored in the container; nothing in this crate needs them decompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ird {
    /// Container format version.
    pub version: u8,
    /// Product code, e.g. `BLES01234`.
    pub product_code: String,
    pub title: String,
    /// Firmware version required by the disc, e.g. `4.81`.
    pub system_version: String,
    /// Disc version, e.g. `01.00`.
    pub game_version: String,
    /// Application version, e.g. `01.00`.
    pub app_version: String,
    /// Only present in version 7 containers.
    pub id: Option<u32>,
    pub header: Vec<u8>,
    pub footer: Vec<u8>,
    pub region_hashes: Vec<Md5>,
    pub files: Vec<IrdFile>,
    pub reserved: u32,
    pub data1: [u8; 16],
    pub data2: [u8; 16],
    pub pic: Vec<u8>,
    pub uid: u32,
    pub crc32: u32,
}
