//! Human readable rendering of a whole image for debugging purposes

use crate::fit::image::FitImage;
use crate::fit::structure::walker::{ScanError, Token};
use core::ffi::CStr;
use core::fmt::{self, Write};
use thiserror_no_std::Error;

/// How many bytes of opaque values are shown
const PREVIEW_LEN: usize = 16;

#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum DumpError {
    #[error("Could not walk the structure block: {0}")]
    Scan(#[from] ScanError),
    #[error("Could not write to the output")]
    Write,
}

impl From<fmt::Error> for DumpError {
    fn from(_: fmt::Error) -> Self {
        DumpError::Write
    }
}

/// Write the header fields and every record of the structure block to `out`.
///
/// Records are prefixed with their offset in the image and indented by nesting depth.
/// A malformed structure block aborts the dump after the last record that could be read.
pub fn dump<W: Write>(image: &FitImage<'_>, out: &mut W) -> Result<(), DumpError> {
    let header = &image.header;
    writeln!(out, "header:")?;
    writeln!(out, "  magic = {:#010x}", header.magic)?;
    writeln!(out, "  total_size = {}", header.total_size)?;
    writeln!(out, "  version = {:#x}", header.version)?;
    writeln!(out, "  last_comp_version = {:#x}", header.last_comp_version)?;
    writeln!(out, "  off_dt_struct = {:#x}", header.off_dt_struct)?;
    writeln!(out, "  off_dt_strings = {:#x}", header.off_dt_strings)?;
    writeln!(out, "  off_mem_rsvmap = {:#x}", header.off_mem_rsvmap)?;
    writeln!(out, "  size_dt_struct = {}", header.size_dt_struct)?;
    writeln!(out, "  size_dt_strings = {}", header.size_dt_strings)?;
    writeln!(out, "structure:")?;

    let strings = image.strings();
    let mut depth = 0usize;
    for record in image.records() {
        let record = record?;
        if matches!(record.token, Token::EndNode) {
            depth = depth.saturating_sub(1);
        }

        write!(out, "{:#010x} ", record.offset)?;
        for _ in 0..depth {
            out.write_str("  ")?;
        }

        match record.token {
            Token::BeginNode { name } => {
                let name = name.to_str().unwrap_or("<invalid utf-8>");
                if name.is_empty() {
                    writeln!(out, "/ {{")?;
                } else {
                    writeln!(out, "{} {{", name)?;
                }
                depth += 1;
            }
            Token::Prop(prop) => {
                let name = strings
                    .get_string(prop.name_offset)
                    .map_err(ScanError::from)?;
                write!(
                    out,
                    "{} ({} bytes)",
                    name.to_str().unwrap_or("<invalid utf-8>"),
                    prop.value.len()
                )?;
                write_value(out, prop.value)?;
                writeln!(out)?;
            }
            Token::EndNode => writeln!(out, "}}")?,
            Token::Nop => writeln!(out, "nop")?,
            Token::End => writeln!(out, "end")?,
        }
    }

    Ok(())
}

/// Render a property value in the most plausible of its possible encodings
fn write_value<W: Write>(out: &mut W, value: &[u8]) -> fmt::Result {
    if let Some(s) = printable_str(value) {
        return write!(out, " = \"{}\"", s);
    }

    match value.len() {
        0 => Ok(()),
        4 => write!(
            out,
            " = <{:#010x}>",
            u32::from_be_bytes([value[0], value[1], value[2], value[3]])
        ),
        len => {
            out.write_str(" = [")?;
            for (i, byte) in value.iter().take(PREVIEW_LEN).enumerate() {
                if i > 0 {
                    out.write_char(' ')?;
                }
                write!(out, "{:02x}", byte)?;
            }
            if len > PREVIEW_LEN {
                out.write_str(" ...")?;
            }
            out.write_char(']')
        }
    }
}

fn printable_str(value: &[u8]) -> Option<&str> {
    let s = CStr::from_bytes_with_nul(value).ok()?.to_str().ok()?;
    if !s.is_empty() && s.chars().all(|c| !c.is_control()) {
        Some(s)
    } else {
        None
    }
}
