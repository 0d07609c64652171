// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns rendered pixel buffers into image files.

use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::errors::FractalError;
use crate::gradient::Rgb;

/// Flattens a row-major buffer into an image.  The buffer must hold
/// exactly `width * height` pixels.
pub fn to_image(width: usize, height: usize, pixels: &[Rgb]) -> Result<RgbImage, FractalError> {
    if width.checked_mul(height) != Some(pixels.len()) {
        return Err(FractalError::InvalidViewport(format!(
            "{} pixels cannot fill a {}x{} image",
            pixels.len(),
            width,
            height
        )));
    }
    let mut raw = Vec::with_capacity(pixels.len() * 3);
    for p in pixels {
        raw.extend_from_slice(&[p.r, p.g, p.b]);
    }
    RgbImage::from_raw(width as u32, height as u32, raw)
        .ok_or_else(|| FractalError::Image(format!("could not build a {}x{} image", width, height)))
}

/// Writes the buffer to `path`.  The file format follows the
/// extension: `.png`, `.ppm`, and the other formats the image crate
/// can encode.
pub fn write_image<P: AsRef<Path>>(
    path: P,
    width: usize,
    height: usize,
    pixels: &[Rgb],
) -> Result<(), FractalError> {
    let img = to_image(width, height, pixels)?;
    img.save(path.as_ref())?;
    Ok(())
}

/// The name of frame `n` of a numbered sequence: `img000000042.png`.
pub fn frame_name<P: AsRef<Path>>(dir: P, n: usize) -> PathBuf {
    dir.as_ref().join(format!("img{:09}.png", n))
}
