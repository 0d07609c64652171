#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time renderer
//!
//! The Mandelbrot and Julia sets are drawn by the same trick.  Take a
//! point on the complex plane, feed it through a recurrence (usually
//! `z*z + c`) over and over, and count how many steps it takes for the
//! orbit to leave the disc of radius 2.  Points that never leave are
//! in the set and are painted black.  Points that do leave are painted
//! by their escape count, looked up in a cyclic color table.
//!
//! The color table is built from a gradient profile: a handful of
//! color stops at integer positions, joined by Bézier curves.  The
//! last stop's position is the table's period, and escape counts are
//! wrapped onto it by a linear or logarithmic mapping.
//!
//! The Mandelbrot set starts every orbit at zero and uses the pixel
//! as the parameter `c`.  A Julia set fixes `c` and starts each orbit
//! at the pixel.

pub mod errors;
pub mod escape;
pub mod gradient;
pub mod mapping;
pub mod output;
pub mod palette;
pub mod planes;
pub mod render;
pub mod sequence;

pub use errors::FractalError;
pub use escape::{evaluate, quadratic, Family, IterationResult};
pub use gradient::{ColorStop, ColorTable, GradientProfile, Rgb};
pub use mapping::IndexMapper;
pub use palette::{FixedPalette, PaletteSource, RandomPalette};
pub use planes::{Pixel, PlaneMapper, Viewport};
pub use render::{render_profile, Kind, RenderSettings, Renderer};
pub use sequence::{Sequence, Shot};
