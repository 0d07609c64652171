// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport and PlaneMapper structs, which describe a
//! relationship between a rectangle on the integral plane with an
//! origin at 0,0 (the image), and a rectangle on the complex plane
//! described by its center and its real-axis width.  The height of
//! the complex rectangle is never given; it follows from the aspect
//! ratio of the image.
use num::Complex;

use crate::errors::FractalError;

/// Describes the x, y of a pixel in the image: column first, then
/// row, with row 0 at the top.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// What part of the complex plane the image looks at, and how many
/// pixels it has to do it with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// The complex number under the center pixel.
    pub center: Complex<f64>,
    /// Distance along the real axis from the left edge to the right edge.
    pub width_span: f64,
    /// Image width in pixels.
    pub image_width: usize,
    /// Image height in pixels.
    pub image_height: usize,
}

impl Viewport {
    /// Constructor.  Rejects the shapes that would otherwise divide by
    /// zero (or by something meaningless) inside the pixel loop.
    pub fn new(
        center: Complex<f64>,
        width_span: f64,
        image_width: usize,
        image_height: usize,
    ) -> Result<Viewport, FractalError> {
        let viewport = Viewport {
            center,
            width_span,
            image_width,
            image_height,
        };
        viewport.validate()?;
        Ok(viewport)
    }

    /// Checks the invariants `new` enforces, for viewports built with
    /// struct literal syntax.
    pub fn validate(&self) -> Result<(), FractalError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(FractalError::InvalidViewport(format!(
                "image must have a positive size, got {}x{}",
                self.image_width, self.image_height
            )));
        }
        // Encoders take u32 sides, and the RGB byte buffer must be
        // addressable.
        let too_large = self.image_width > std::u32::MAX as usize
            || self.image_height > std::u32::MAX as usize
            || self
                .image_width
                .checked_mul(self.image_height)
                .and_then(|n| n.checked_mul(3))
                .is_none();
        if too_large {
            return Err(FractalError::InvalidViewport(format!(
                "image of {}x{} pixels is too large",
                self.image_width, self.image_height
            )));
        }
        if !self.width_span.is_finite() || self.width_span <= 0.0 {
            return Err(FractalError::InvalidViewport(format!(
                "view width must be a positive number, got {}",
                self.width_span
            )));
        }
        if !self.center.re.is_finite() || !self.center.im.is_finite() {
            return Err(FractalError::InvalidViewport(
                "center must be a finite complex number".to_string(),
            ));
        }
        Ok(())
    }

    /// The span of the imaginary axis, locked to the image's aspect ratio.
    pub fn height_span(&self) -> f64 {
        self.width_span / (self.image_width as f64) * (self.image_height as f64)
    }

    /// The total number of pixels in the image.  Used to size buffers.
    pub fn len(&self) -> usize {
        self.image_width * self.image_height
    }

    /// A validated viewport is never empty, but struct literals can be.
    pub fn is_empty(&self) -> bool {
        self.image_width == 0 || self.image_height == 0
    }
}

/// Maps pixels on the integral plane to points on the complex plane.
/// Everything that can be computed once per image is computed in the
/// constructor.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    viewport: Viewport,
    // The pixel the center of the viewport falls on.  Integer halves,
    // so the center always lands on a whole pixel.
    half: (usize, usize),
    height_span: f64,
}

impl PlaneMapper {
    /// Takes a viewport, validates it, and prepares the per-pixel scale.
    pub fn new(viewport: Viewport) -> Result<PlaneMapper, FractalError> {
        viewport.validate()?;
        Ok(PlaneMapper {
            viewport,
            half: (viewport.image_width / 2, viewport.image_height / 2),
            height_span: viewport.height_span(),
        })
    }

    /// The viewport this mapper was built from.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Given a pixel on the integral cartesian plane, return the
    /// complex number at the equivalent location.  Rows grow downward
    /// while the imaginary axis grows upward, hence the subtraction.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let Pixel(column, row) = *pixel;
        let dx = (column as f64) - (self.half.0 as f64);
        let dy = (row as f64) - (self.half.1 as f64);
        Complex::new(
            self.viewport.center.re + dx / (self.viewport.image_width as f64) * self.viewport.width_span,
            self.viewport.center.im - dy / (self.viewport.image_height as f64) * self.height_span,
        )
    }
}

/// Free-function form of `PlaneMapper::pixel_to_point`, for callers
/// that only need a single point and have a viewport in hand.
pub fn to_complex(column: usize, row: usize, viewport: &Viewport) -> Result<Complex<f64>, FractalError> {
    Ok(PlaneMapper::new(*viewport)?.pixel_to_point(&Pixel(column, row)))
}
