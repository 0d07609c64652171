// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one error type every fallible operation in the crate returns.

use failure::Fail;

/// Everything that can stop a render before (or after) the pixel
/// loop.  None of these are retried; the caller gets them as-is.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum FractalError {
    /// The gradient profile breaks one of its ordering or shape rules.
    #[fail(display = "Invalid gradient profile: {}", _0)]
    InvalidProfile(String),

    /// The viewport (or the buffer it is rendered into) is degenerate.
    #[fail(display = "Invalid viewport: {}", _0)]
    InvalidViewport(String),

    /// Iteration count, density, or thread count is out of range.
    #[fail(display = "Invalid render settings: {}", _0)]
    InvalidSettings(String),

    /// A render thread died before finishing its band of rows.
    #[fail(display = "A render thread panicked")]
    WorkerPanic,

    /// The image encoder refused the pixels or the file.
    #[fail(display = "Could not write image: {}", _0)]
    Image(String),

    /// Filesystem trouble outside the encoder, e.g. creating the
    /// output directory for a sequence.
    #[fail(display = "I/O failure: {}", _0)]
    Io(String),
}

impl From<image::ImageError> for FractalError {
    fn from(err: image::ImageError) -> Self {
        FractalError::Image(err.to_string())
    }
}

impl From<std::io::Error> for FractalError {
    fn from(err: std::io::Error) -> Self {
        FractalError::Io(err.to_string())
    }
}
