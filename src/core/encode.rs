//! PNG serialization of the rendered canvas
//!
//! The draw target stores premultiplied ARGB words; encoding unpacks them to
//! straight RGBA8 and writes a lossless PNG. Also owns the overwrite check
//! applied before the binary writes the output file.

use std::path::Path;

use raqote::DrawTarget;

use crate::core::error::{Error, Result};

/// Behavior when the output file already exists
#[derive(Debug, Clone, PartialEq)]
pub enum OverwriteBehavior {
    /// Ask on stderr/stdin before overwriting (default)
    Prompt,
    /// Overwrite without asking
    Force,
    /// Never overwrite, fail if the file exists
    NeverOverwrite,
}

impl Default for OverwriteBehavior {
    fn default() -> Self {
        Self::Prompt
    }
}

/// Serialize the canvas to PNG bytes (RGBA8, lossless).
pub fn encode_png(target: &DrawTarget) -> Result<Vec<u8>> {
    let width = target.width() as u32;
    let height = target.height() as u32;
    let data = target.get_data();

    let mut rgba = Vec::with_capacity(data.len() * 4);
    for &pixel in data {
        let a = ((pixel >> 24) & 0xff) as u8;
        let r = ((pixel >> 16) & 0xff) as u8;
        let g = ((pixel >> 8) & 0xff) as u8;
        let b = (pixel & 0xff) as u8;
        let (r, g, b) = unpremultiply(r, g, b, a);
        rgba.extend_from_slice(&[r, g, b, a]);
    }

    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba)?;
    writer.finish()?;

    Ok(bytes)
}

fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8) {
    match a {
        0 | 0xff => (r, g, b),
        alpha => {
            let alpha = u16::from(alpha);
            let channel = |value: u8| ((u16::from(value) * 255 + alpha / 2) / alpha).min(255) as u8;
            (channel(r), channel(g), channel(b))
        }
    }
}

/// Check whether writing to `file_path` is allowed under `behavior`.
///
/// A missing file always passes. An existing one passes under `Force`,
/// fails under `NeverOverwrite`, and asks the user under `Prompt`.
pub fn check_overwrite_permission(file_path: &str, behavior: &OverwriteBehavior) -> Result<()> {
    if !Path::new(file_path).exists() {
        return Ok(());
    }

    match behavior {
        OverwriteBehavior::Force => {
            eprintln!("⚠️  Overwriting existing file: {file_path}");
            Ok(())
        }
        OverwriteBehavior::NeverOverwrite => Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("File already exists: {file_path} (use --force to overwrite)"),
        ))),
        OverwriteBehavior::Prompt => {
            eprintln!("⚠️  File already exists: {file_path}");
            eprint!("Overwrite? [y/N]: ");

            use std::io::Write;
            std::io::stderr().flush()?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            match input.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(Error::IoError(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "Cancelled by user",
                ))),
            }
        }
    }
}
