// ICF text container: the interchange format the vendor cloning software
// reads and writes.
//
// Layout: a model-id header line, a few `#Key=value` metadata lines, then
// hex rows of `AAAALLDD..` (16-bit address, 8-bit row length, row bytes),
// CRLF line endings, uppercase hex. This module only frames raw image
// bytes; all field semantics live in the image codec.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum IcfError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Missing or malformed model-id header: {line:?}")]
    BadHeader { line: String },

    #[error("Malformed hex row at line {line_no}")]
    MalformedRow { line_no: usize },
}

pub type Result<T> = std::result::Result<T, IcfError>;

/// Bytes per hex row on save
const ROW_LEN: usize = 32;

/// Metadata lines carried alongside the image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcfMetadata {
    pub model_id: String,
    pub map_rev: String,
    pub etc_data: String,
    pub comment: String,
}

impl Default for IcfMetadata {
    fn default() -> Self {
        Self {
            model_id: "32500001".to_string(),
            map_rev: "1".to_string(),
            etc_data: "001A".to_string(),
            comment: String::new(),
        }
    }
}

fn parse_row(line: &str, buf: &mut Vec<u8>) -> Option<()> {
    if line.len() < 6 || line.len() % 2 != 0 {
        return None;
    }
    let addr = usize::from_str_radix(&line[0..4], 16).ok()?;
    let size = usize::from_str_radix(&line[4..6], 16).ok()?;
    let data = &line[6..];
    if data.len() != size * 2 {
        return None;
    }
    if buf.len() < addr + size {
        buf.resize(addr + size, 0);
    }
    for i in 0..size {
        buf[addr + i] = u8::from_str_radix(&data[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(())
}

/// Load an ICF file into a raw image buffer plus its metadata.
///
/// The buffer is exactly as the rows describe it; resolving it against the
/// known layouts is the caller's job.
pub fn load_icf(path: &Path) -> Result<(Vec<u8>, IcfMetadata)> {
    let reader = BufReader::new(File::open(path)?);
    let mut meta = IcfMetadata { model_id: String::new(), ..IcfMetadata::default() };
    let mut buf = Vec::new();
    let mut saw_header = false;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !saw_header {
            if line.len() != 8 || !line.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(IcfError::BadHeader { line: line.to_string() });
            }
            meta.model_id = line.to_string();
            saw_header = true;
            continue;
        }

        if let Some(rest) = line.strip_prefix('#') {
            let (key, value) = rest.split_once('=').unwrap_or((rest, ""));
            match key {
                "Comment" => meta.comment = value.to_string(),
                "MapRev" => meta.map_rev = value.to_string(),
                "EtcData" => meta.etc_data = value.to_string(),
                _ => warn!(line, "unknown metadata line"),
            }
            continue;
        }

        parse_row(line, &mut buf).ok_or(IcfError::MalformedRow { line_no: idx + 1 })?;
    }

    if !saw_header {
        return Err(IcfError::BadHeader { line: String::new() });
    }
    Ok((buf, meta))
}

/// Write a raw image buffer as an ICF file
pub fn save_icf(path: &Path, data: &[u8], meta: &IcfMetadata) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "{}\r\n", meta.model_id)?;
    write!(out, "#Comment={}\r\n", meta.comment)?;
    write!(out, "#MapRev={}\r\n", meta.map_rev)?;
    write!(out, "#EtcData={}\r\n", meta.etc_data)?;

    for (idx, row) in data.chunks(ROW_LEN).enumerate() {
        write!(out, "{:04X}{:02X}", idx * ROW_LEN, row.len())?;
        for byte in row {
            write!(out, "{byte:02X}")?;
        }
        write!(out, "\r\n")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.icf");

        let data: Vec<u8> = (0..0x100u32).map(|i| (i % 251) as u8).collect();
        let meta = IcfMetadata {
            comment: "test dump".to_string(),
            ..IcfMetadata::default()
        };
        save_icf(&path, &data, &meta).unwrap();

        let (loaded, loaded_meta) = load_icf(&path).unwrap();
        assert_eq!(loaded, data);
        assert_eq!(loaded_meta, meta);
    }

    #[test]
    fn test_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.icf");
        save_icf(&path, &[0xAB; 64], &IcfMetadata::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], "32500001");
        assert_eq!(lines[1], "#Comment=");
        assert_eq!(lines[2], "#MapRev=1");
        assert_eq!(lines[3], "#EtcData=001A");
        assert!(lines[4].starts_with("000020ABAB"));
        assert!(lines[5].starts_with("002020"));
    }

    #[test]
    fn test_bad_header_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.icf");
        std::fs::write(&path, "hello\r\n000001AB\r\n").unwrap();
        assert!(matches!(load_icf(&path), Err(IcfError::BadHeader { .. })));

        std::fs::write(&path, "").unwrap();
        assert!(matches!(load_icf(&path), Err(IcfError::BadHeader { .. })));
    }

    #[test]
    fn test_malformed_row_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.icf");
        // declared length 4, only 2 bytes of data
        std::fs::write(&path, "32500001\r\n000004ABCD\r\n").unwrap();
        assert!(matches!(
            load_icf(&path),
            Err(IcfError::MalformedRow { line_no: 2 })
        ));
    }

    #[test]
    fn test_rows_may_arrive_out_of_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.icf");
        std::fs::write(&path, "32500001\r\n000202CCDD\r\n000002AABB\r\n").unwrap();
        let (data, _) = load_icf(&path).unwrap();
        assert_eq!(data, vec![0xAA, 0xBB, 0xCC, 0xDD]);
    }
}
