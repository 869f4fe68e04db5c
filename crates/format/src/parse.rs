//! Container parsing.

use std::io::Read;

use exn::{OptionExt, ResultExt};
use flate2::read::GzDecoder;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{Ird, IrdFile, Md5, PIC_LENGTH};

pub(crate) const MAGIC: &[u8; 4] = b"3IRD";
const GZIP_MAGIC: &[u8; 2] = b"\x1f\x8b";
/// Anything smaller than this cannot hold a complete container, compressed or not.
pub const MIN_CONTAINER_SIZE: usize = 200;

/// Parses an IRD container from raw bytes.
///
/// IRD files are usually distributed gzip-compressed; data starting with the
/// gzip magic instead of `3IRD` is decompressed first. The trailing CRC32
/// is always verified.
///
/// # Errors
///
/// Returns an error if:
/// - the data is smaller than [`MIN_CONTAINER_SIZE`],
/// - a gzip stream fails to decompress,
/// - the data (after decompression) doesn't start with the magic,
/// - any field runs past the end of the data, or
/// - the checksum doesn't match.
#[instrument(skip(data), fields(size = data.len(), product_code))]
pub fn parse(data: &[u8]) -> Result<Ird> {
    if data.len() < MIN_CONTAINER_SIZE {
        exn::bail!(ErrorKind::TooSmall(data.len()));
    }
    let decompressed;
    let content = if data.starts_with(MAGIC) {
        data
    } else if data.starts_with(GZIP_MAGIC) {
        let mut buffer = Vec::with_capacity(data.len() * 4);
        GzDecoder::new(data).read_to_end(&mut buffer).or_raise(|| ErrorKind::Decompress)?;
        decompressed = buffer;
        decompressed.as_slice()
    } else {
        exn::bail!(ErrorKind::InvalidMagic);
    };
    if !content.starts_with(MAGIC) {
        exn::bail!(ErrorKind::InvalidMagic);
    }
    let ird = read_container(content)?;
    tracing::Span::current().record("product_code", ird.product_code.as_str());
    Ok(ird)
}

fn read_container(content: &[u8]) -> Result<Ird> {
    let mut reader = Reader::new(content);
    reader.take(MAGIC.len(), "magic")?;
    let version = reader.u8("version")?;
    let product_code = reader.text(9, "product_code")?;
    let title_length = reader.u8("title_length")?;
    let title = reader.text(usize::from(title_length), "title")?;
    let system_version = reader.text(4, "system_version")?;
    let game_version = reader.text(5, "game_version")?;
    let app_version = reader.text(5, "app_version")?;
    let id = match version {
        7 => Some(reader.u32("id")?),
        _ => None,
    };
    let header_length = reader.length("header_length")?;
    let header = reader.take(header_length, "header")?.to_vec();
    let footer_length = reader.length("footer_length")?;
    let footer = reader.take(footer_length, "footer")?.to_vec();

    let region_count = reader.u8("region_count")?;
    let region_hashes = (0..region_count).map(|_| reader.md5("region_hash")).collect::<Result<Vec<_>>>()?;

    let file_count = reader.length("file_count")?;
    // Don't trust the count for the allocation; a corrupt count would
    // otherwise reserve gigabytes before the first read fails.
    let mut files = Vec::with_capacity(file_count.min(reader.remaining() / 24));
    for _ in 0..file_count {
        let offset = reader.u64("file_offset")?;
        let md5 = reader.md5("file_md5")?;
        files.push(IrdFile { offset, md5 });
    }

    let reserved = reader.u32("reserved")?;
    let mut pic = Vec::new();
    if version == 9 {
        pic = reader.take(PIC_LENGTH, "pic")?.to_vec();
    }
    let data1 = reader.md5("data1")?;
    let data2 = reader.md5("data2")?;
    if version < 9 {
        pic = reader.take(PIC_LENGTH, "pic")?.to_vec();
    }
    let uid = reader.u32("uid")?;

    let checksummed = reader.position();
    let crc32 = reader.u32("crc32")?;
    let actual = crc32fast::hash(&content[..checksummed]);
    if crc32 != actual {
        exn::bail!(ErrorKind::ChecksumMismatch { expected: crc32, actual });
    }

    Ok(Ird {
        version,
        product_code,
        title,
        system_version,
        game_version,
        app_version,
        id,
        header,
        footer,
        region_hashes,
        files,
        reserved,
        data1,
        data2,
        pic,
        uid,
        crc32,
    })
}

/// Little-endian cursor over the container bytes.
struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}
impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn take(&mut self, length: usize, field: &'static str) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .ok_or_raise(|| ErrorKind::Truncated { field })?;
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.take(N, field)?);
        Ok(array)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u32(&mut self, field: &'static str) -> Result<u32> {
        self.array(field).map(u32::from_le_bytes)
    }

    fn u64(&mut self, field: &'static str) -> Result<u64> {
        self.array(field).map(u64::from_le_bytes)
    }

    fn md5(&mut self, field: &'static str) -> Result<Md5> {
        self.array(field)
    }

    /// Lengths and counts are stored as signed 32-bit integers.
    fn length(&mut self, field: &'static str) -> Result<usize> {
        let raw = self.array(field).map(i32::from_le_bytes)?;
        usize::try_from(raw).ok().ok_or_raise(|| ErrorKind::Truncated { field })
    }

    fn text(&mut self, length: usize, field: &'static str) -> Result<String> {
        let bytes = self.take(length, field)?;
        Ok(String::from_utf8_lossy(bytes).trim_matches(|c: char| c.is_whitespace() || c == '\0').to_string())
    }
}
