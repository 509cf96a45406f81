//! Spherical Video V1 tagging of finished MP4 files.
//!
//! Players recognise 360° footage through a `uuid` box carrying GSpherical XML inside the video
//! `trak`. The box is appended after encoding; every chunk offset that points past the grown
//! `moov` box is shifted by the inserted length.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{CampathError, CampathResult};

const SPHERICAL_UUID: [u8; 16] = [
    0xff, 0xcc, 0x82, 0x63, 0xf8, 0x55, 0x4a, 0x93, 0x88, 0x14, 0x58, 0x7a, 0x02, 0x52, 0x1f, 0xdd,
];

/// Stereo layout advertised in the spherical metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoMode {
    /// Single equirectangular image.
    Mono,
    /// Left eye on top, right eye below.
    TopBottom,
}

/// Tag the MP4 at `path` as equirectangular 360° video, in place.
///
/// Files already carrying the spherical box are left untouched.
#[tracing::instrument(skip_all, fields(path = %path.display(), ?stereo))]
pub fn inject_spherical_metadata(path: &Path, stereo: StereoMode) -> CampathResult<()> {
    let file_len = std::fs::metadata(path)
        .with_context(|| format!("stat '{}'", path.display()))?
        .len();
    let mut file = File::open(path).with_context(|| format!("open '{}'", path.display()))?;

    let moov = find_top_level(&mut file, file_len, b"moov")?
        .ok_or_else(|| CampathError::malformed("mp4 has no moov box"))?;
    let moov_len = usize::try_from(moov.size)
        .map_err(|_| CampathError::malformed("moov box is too large"))?;
    let mut moov_bytes = vec![0u8; moov_len];
    file.seek(SeekFrom::Start(moov.offset))
        .context("seek to moov")?;
    file.read_exact(&mut moov_bytes).context("read moov")?;

    let root = parse_header(&moov_bytes, 0, moov.size)?;
    let trak = find_video_trak(&moov_bytes, root)?
        .ok_or_else(|| CampathError::malformed("mp4 has no video track"))?;
    if has_spherical_uuid(&moov_bytes, trak)? {
        tracing::debug!("spherical metadata already present");
        return Ok(());
    }

    let uuid_box = spherical_uuid_box(stereo);
    let delta = uuid_box.len() as u64;
    let patched = patch_chunk_offsets(&mut moov_bytes, root, moov.offset, delta)?;
    tracing::debug!(patched, delta, "chunk offsets shifted");

    let trak_end = (trak.offset + trak.size) as usize;
    let mut new_moov = Vec::with_capacity(moov_bytes.len() + uuid_box.len());
    new_moov.extend_from_slice(&moov_bytes[..trak_end]);
    new_moov.extend_from_slice(&uuid_box);
    new_moov.extend_from_slice(&moov_bytes[trak_end..]);
    grow_box(&mut new_moov, trak, delta)?;
    grow_box(&mut new_moov, root, delta)?;

    let tmp = temp_sibling(path);
    let written = rewrite(&mut file, &tmp, moov, &new_moov);
    drop(file);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    std::fs::rename(&tmp, path)
        .with_context(|| format!("replace '{}' with tagged copy", path.display()))?;
    Ok(())
}

fn rewrite(file: &mut File, tmp: &Path, moov: BoxHeader, new_moov: &[u8]) -> CampathResult<()> {
    let out = File::create(tmp).with_context(|| format!("create '{}'", tmp.display()))?;
    let mut out = BufWriter::new(out);

    file.seek(SeekFrom::Start(0)).context("seek to start")?;
    std::io::copy(&mut Read::by_ref(file).take(moov.offset), &mut out)
        .context("copy leading boxes")?;
    out.write_all(new_moov).context("write moov")?;
    file.seek(SeekFrom::Start(moov.offset + moov.size))
        .context("seek past moov")?;
    std::io::copy(file, &mut out).context("copy trailing boxes")?;
    out.flush().context("flush tagged copy")?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out.mp4".to_owned());
    path.with_file_name(format!(".{name}.spherical-tmp"))
}

fn spherical_xml(stereo: StereoMode) -> String {
    let stereo_tag = match stereo {
        StereoMode::Mono => String::new(),
        StereoMode::TopBottom => "<GSpherical:StereoMode>top-bottom</GSpherical:StereoMode>".to_owned(),
    };
    format!(
        "<?xml version=\"1.0\"?>\
<rdf:SphericalVideo xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" \
xmlns:GSpherical=\"http://ns.google.com/videos/1.0/spherical/\">\
<GSpherical:Spherical>true</GSpherical:Spherical>\
<GSpherical:Stitched>true</GSpherical:Stitched>\
<GSpherical:StitchingSoftware>campath</GSpherical:StitchingSoftware>\
<GSpherical:ProjectionType>equirectangular</GSpherical:ProjectionType>\
{stereo_tag}\
</rdf:SphericalVideo>"
    )
}

fn spherical_uuid_box(stereo: StereoMode) -> Vec<u8> {
    let xml = spherical_xml(stereo);
    let size = (8 + SPHERICAL_UUID.len() + xml.len()) as u32;
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(b"uuid");
    out.extend_from_slice(&SPHERICAL_UUID);
    out.extend_from_slice(xml.as_bytes());
    out
}

/// Box position, relative to whatever buffer or file it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoxHeader {
    offset: u64,
    size: u64,
    header_len: u64,
    kind: [u8; 4],
}

impl BoxHeader {
    fn payload(&self) -> u64 {
        self.offset + self.header_len
    }

    fn end(&self) -> u64 {
        self.offset + self.size
    }
}

fn be_u32(b: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn be_u64(b: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&b[at..at + 8]);
    u64::from_be_bytes(raw)
}

/// Parse the header at the start of `head`, for a box located at `offset` inside a parent ending
/// at `end`.
fn parse_header(head: &[u8], offset: u64, end: u64) -> CampathResult<BoxHeader> {
    if head.len() < 8 || offset + 8 > end {
        return Err(CampathError::malformed(format!(
            "truncated box header at offset {offset}"
        )));
    }
    let size32 = be_u32(head, 0);
    let kind = [head[4], head[5], head[6], head[7]];
    let (size, header_len) = match size32 {
        0 => (end - offset, 8),
        1 => {
            if head.len() < 16 {
                return Err(CampathError::malformed(format!(
                    "truncated 64-bit box header at offset {offset}"
                )));
            }
            (be_u64(head, 8), 16)
        }
        n => (u64::from(n), 8),
    };
    if size < header_len || offset + size > end {
        return Err(CampathError::malformed(format!(
            "box '{}' at offset {offset} has invalid size {size}",
            String::from_utf8_lossy(&kind)
        )));
    }
    Ok(BoxHeader {
        offset,
        size,
        header_len,
        kind,
    })
}

fn find_top_level(
    file: &mut File,
    file_len: u64,
    kind: &[u8; 4],
) -> CampathResult<Option<BoxHeader>> {
    let mut pos = 0u64;
    let mut head = [0u8; 16];
    while pos + 8 <= file_len {
        let n = (file_len - pos).min(16) as usize;
        file.seek(SeekFrom::Start(pos)).context("seek box header")?;
        file.read_exact(&mut head[..n]).context("read box header")?;
        let header = parse_header(&head[..n], pos, file_len)?;
        if &header.kind == kind {
            return Ok(Some(header));
        }
        pos = header.end();
    }
    Ok(None)
}

fn children(bytes: &[u8], parent: BoxHeader) -> CampathResult<Vec<BoxHeader>> {
    let mut out = Vec::new();
    let mut pos = parent.payload();
    let end = parent.end();
    while pos < end {
        let header = parse_header(&bytes[pos as usize..end as usize], pos, end)?;
        pos = header.end();
        out.push(header);
    }
    Ok(out)
}

fn child(bytes: &[u8], parent: BoxHeader, kind: &[u8; 4]) -> CampathResult<Option<BoxHeader>> {
    Ok(children(bytes, parent)?
        .into_iter()
        .find(|b| &b.kind == kind))
}

fn find_video_trak(bytes: &[u8], moov: BoxHeader) -> CampathResult<Option<BoxHeader>> {
    for trak in children(bytes, moov)?.into_iter().filter(|b| &b.kind == b"trak") {
        let Some(mdia) = child(bytes, trak, b"mdia")? else {
            continue;
        };
        let Some(hdlr) = child(bytes, mdia, b"hdlr")? else {
            continue;
        };
        // version/flags (4) + pre_defined (4), then the handler type.
        let at = (hdlr.payload() + 8) as usize;
        if at as u64 + 4 <= hdlr.end() && &bytes[at..at + 4] == b"vide" {
            return Ok(Some(trak));
        }
    }
    Ok(None)
}

fn has_spherical_uuid(bytes: &[u8], trak: BoxHeader) -> CampathResult<bool> {
    Ok(children(bytes, trak)?.into_iter().any(|b| {
        let at = b.payload() as usize;
        &b.kind == b"uuid" && b.payload() + 16 <= b.end() && bytes[at..at + 16] == SPHERICAL_UUID
    }))
}

/// Shift every `stco`/`co64` entry at or past `moov_offset` by `delta`. Returns the number of
/// entries changed.
fn patch_chunk_offsets(
    bytes: &mut [u8],
    parent: BoxHeader,
    moov_offset: u64,
    delta: u64,
) -> CampathResult<usize> {
    let mut patched = 0;
    for b in children(bytes, parent)? {
        match &b.kind {
            b"trak" | b"mdia" | b"minf" | b"stbl" => {
                patched += patch_chunk_offsets(bytes, b, moov_offset, delta)?;
            }
            b"stco" | b"co64" => {
                patched += patch_offset_table(bytes, b, moov_offset, delta)?;
            }
            _ => {}
        }
    }
    Ok(patched)
}

fn patch_offset_table(
    bytes: &mut [u8],
    table: BoxHeader,
    moov_offset: u64,
    delta: u64,
) -> CampathResult<usize> {
    let wide = &table.kind == b"co64";
    let entry_len: u64 = if wide { 8 } else { 4 };
    let count_at = table.payload() + 4;
    if count_at + 4 > table.end() {
        return Err(CampathError::malformed("truncated chunk offset table"));
    }
    let count = u64::from(be_u32(bytes, count_at as usize));
    let first = count_at + 4;
    if first + count * entry_len > table.end() {
        return Err(CampathError::malformed(
            "chunk offset table is larger than its box",
        ));
    }

    let mut patched = 0;
    for i in 0..count {
        let at = (first + i * entry_len) as usize;
        let value = if wide {
            be_u64(bytes, at)
        } else {
            u64::from(be_u32(bytes, at))
        };
        if value < moov_offset {
            continue;
        }
        let shifted = value + delta;
        if wide {
            bytes[at..at + 8].copy_from_slice(&shifted.to_be_bytes());
        } else {
            let shifted = u32::try_from(shifted).map_err(|_| {
                CampathError::malformed("chunk offset overflows 32-bit stco table")
            })?;
            bytes[at..at + 4].copy_from_slice(&shifted.to_be_bytes());
        }
        patched += 1;
    }
    Ok(patched)
}

fn grow_box(bytes: &mut [u8], header: BoxHeader, delta: u64) -> CampathResult<()> {
    let at = header.offset as usize;
    match be_u32(bytes, at) {
        // Extends to end of file; nothing to rewrite.
        0 => Ok(()),
        1 => {
            let size = header.size + delta;
            bytes[at + 8..at + 16].copy_from_slice(&size.to_be_bytes());
            Ok(())
        }
        _ => {
            let size = u32::try_from(header.size + delta).map_err(|_| {
                CampathError::malformed(format!(
                    "box '{}' grows past 32-bit size",
                    String::from_utf8_lossy(&header.kind)
                ))
            })?;
            bytes[at..at + 4].copy_from_slice(&size.to_be_bytes());
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/spherical.rs"]
mod tests;
