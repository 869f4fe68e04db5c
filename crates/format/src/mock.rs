//! Container encoding for tests.
//!
//! Only the parser is needed in production; other crates enable the `mock`
//! feature in their dev dependencies to produce valid fixtures.

use crate::models::{Ird, IrdFile, PIC_LENGTH};
use crate::parse::MAGIC;

/// Build a small, valid record.
///
/// # Examples
///
/// ```
/// use ird_format::mock::{encode, sample};
///
/// let bytes = encode(&sample("BLES01234", "Example"));
/// let parsed = ird_format::parse(&bytes).unwrap();
/// assert_eq!(parsed.title, "Example");
/// ```
pub fn sample(product_code: &str, title: &str) -> Ird {
    Ird {
        version: 9,
        product_code: product_code.to_string(),
        title: title.to_string(),
        system_version: "4.81".to_string(),
        game_version: "01.00".to_string(),
        app_version: "01.00".to_string(),
        id: None,
        header: Vec::new(),
        footer: Vec::new(),
        region_hashes: vec![[0x11; 16]],
        files: vec![IrdFile { offset: 0x0400, md5: [0x22; 16] }],
        reserved: 0,
        data1: [0x33; 16],
        data2: [0x44; 16],
        pic: vec![0x55; PIC_LENGTH],
        uid: 0x1234_5678,
        crc32: 0,
    }
}

/// Encode a record as an uncompressed container with a correct checksum.
///
/// Text fields are padded (or cut) to their fixed widths; the stored `crc32`
/// is ignored and recalculated.
pub fn encode(ird: &Ird) -> Vec<u8> {
    let mut out = Vec::with_capacity(256 + ird.header.len() + ird.footer.len());
    out.extend_from_slice(MAGIC);
    out.push(ird.version);
    fixed(&mut out, &ird.product_code, 9);
    let title = truncate(&ird.title, usize::from(u8::MAX));
    out.push(title.len() as u8);
    out.extend_from_slice(title.as_bytes());
    fixed(&mut out, &ird.system_version, 4);
    fixed(&mut out, &ird.game_version, 5);
    fixed(&mut out, &ird.app_version, 5);
    if ird.version == 7 {
        out.extend_from_slice(&ird.id.unwrap_or_default().to_le_bytes());
    }
    out.extend_from_slice(&(ird.header.len() as i32).to_le_bytes());
    out.extend_from_slice(&ird.header);
    out.extend_from_slice(&(ird.footer.len() as i32).to_le_bytes());
    out.extend_from_slice(&ird.footer);
    out.push(ird.region_hashes.len() as u8);
    for hash in &ird.region_hashes {
        out.extend_from_slice(hash);
    }
    out.extend_from_slice(&(ird.files.len() as i32).to_le_bytes());
    for file in &ird.files {
        out.extend_from_slice(&file.offset.to_le_bytes());
        out.extend_from_slice(&file.md5);
    }
    out.extend_from_slice(&ird.reserved.to_le_bytes());
    let mut pic = ird.pic.clone();
    pic.resize(PIC_LENGTH, 0);
    if ird.version == 9 {
        out.extend_from_slice(&pic);
    }
    out.extend_from_slice(&ird.data1);
    out.extend_from_slice(&ird.data2);
    if ird.version < 9 {
        out.extend_from_slice(&pic);
    }
    out.extend_from_slice(&ird.uid.to_le_bytes());
    let crc32 = crc32fast::hash(&out);
    out.extend_from_slice(&crc32.to_le_bytes());
    out
}

fn fixed(out: &mut Vec<u8>, value: &str, width: usize) {
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(width, b' ');
    out.extend_from_slice(&bytes);
}

fn truncate(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
