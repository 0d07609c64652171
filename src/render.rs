// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time renderer
//!
//! Every pixel of the image is mapped to a point on the complex
//! plane, that point is run through the escape-time evaluator, and
//! the escape count picks a color out of the color table.  Points
//! that never escape are painted black.
//!
//! No pixel depends on any other, so the image can be cut into bands
//! of whole rows and each band handed to its own thread.  The
//! threaded and single-threaded renders produce the same pixels.

use itertools::iproduct;
use num::Complex;
use tracing::debug_span;

use crate::errors::FractalError;
use crate::escape::{self, IterationResult};
use crate::gradient::{ColorTable, GradientProfile, Rgb};
use crate::mapping::IndexMapper;
use crate::planes::{Pixel, PlaneMapper, Viewport};

/// Which set is being drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Kind {
    /// Orbits start at zero, each pixel is the parameter.
    Mandelbrot,
    /// Each pixel is where its orbit starts; the parameter is fixed.
    Julia(Complex<f64>),
}

/// Everything about a render except the recurrence and the palette.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// The region of the complex plane, and the image size.
    pub viewport: Viewport,
    /// Iteration budget per pixel.
    pub max_iterations: usize,
    /// Scales escape counts before they are mapped to the table.
    /// Below 1 a color band covers more than one iteration.
    pub density: f64,
    /// Added to every table index, shifting the palette cycle.
    pub rotation: i64,
    /// Linear or logarithmic count-to-index mapping.
    pub mapper: IndexMapper,
    /// Skip iteration for points in the main cardioid and the
    /// period-2 bulb.  Off by default: the renderer cannot see which
    /// recurrence it was handed, and the shortcut only holds for
    /// `z * z + c`.  Ignored for Julia renders.
    pub interior_check: bool,
}

impl Default for RenderSettings {
    /// The full Mandelbrot set in a 960x720 frame.
    fn default() -> Self {
        RenderSettings {
            viewport: Viewport {
                center: Complex::new(-0.7, 0.0),
                width_span: 3.0769,
                image_width: 960,
                image_height: 720,
            },
            max_iterations: 100,
            density: 1.0,
            rotation: 0,
            mapper: IndexMapper::Linear,
            interior_check: false,
        }
    }
}

impl RenderSettings {
    /// An 800x800 frame around the origin, four units wide, with the
    /// deep iteration budget Julia sets need.
    pub fn julia_default() -> Self {
        RenderSettings {
            viewport: Viewport {
                center: Complex::new(0.0, 0.0),
                width_span: 4.0,
                image_width: 800,
                image_height: 800,
            },
            max_iterations: 50_000,
            ..RenderSettings::default()
        }
    }

    /// Rejects settings that would make the pixel loop meaningless.
    pub fn validate(&self) -> Result<(), FractalError> {
        self.viewport.validate()?;
        if self.max_iterations == 0 {
            return Err(FractalError::InvalidSettings(
                "the iteration limit must be at least 1".to_string(),
            ));
        }
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(FractalError::InvalidSettings(format!(
                "density must be a positive number, got {}",
                self.density
            )));
        }
        Ok(())
    }
}

/// The Julia parameter drawn when none is given.
pub fn default_julia_parameter() -> Complex<f64> {
    Complex::new(-0.4, 0.6)
}

/// Holds one render's worth of read-only state.  Once built, nothing
/// in here changes; all rendering methods take `&self`.
pub struct Renderer<'a, F> {
    plane: PlaneMapper,
    settings: RenderSettings,
    kind: Kind,
    table: &'a ColorTable,
    recurrence: F,
}

impl<'a, F> Renderer<'a, F>
where
    F: Fn(Complex<f64>, Complex<f64>) -> Complex<f64> + Sync,
{
    /// Validates the settings and binds them to a table and a recurrence.
    pub fn new(
        settings: RenderSettings,
        kind: Kind,
        table: &'a ColorTable,
        recurrence: F,
    ) -> Result<Self, FractalError> {
        settings.validate()?;
        if table.is_empty() {
            return Err(FractalError::InvalidProfile("the color table is empty".to_string()));
        }
        Ok(Renderer {
            plane: PlaneMapper::new(settings.viewport)?,
            settings,
            kind,
            table,
            recurrence,
        })
    }

    /// The settings this renderer was built with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Runs the evaluator for one pixel, with the seed/parameter
    /// convention of the set being drawn.
    pub fn classify(&self, pixel: &Pixel) -> IterationResult {
        let point = self.plane.pixel_to_point(pixel);
        let max = self.settings.max_iterations;
        match self.kind {
            Kind::Mandelbrot => escape::mandelbrot(point, &self.recurrence, max, self.settings.interior_check),
            Kind::Julia(c) => escape::julia(point, c, &self.recurrence, max),
        }
    }

    /// Where an escape count lands in the color table, after density,
    /// mapping, and rotation.
    pub fn table_index(&self, iterations: usize) -> usize {
        let size = self.table.len();
        let quantized = ((iterations as f64) * self.settings.density) as usize;
        let mapped = self.settings.mapper.map(quantized, size);
        let shift = self.settings.rotation.rem_euclid(size as i64) as usize;
        (mapped + shift) % size
    }

    /// The color an evaluator result is painted with.
    pub fn color_for(&self, result: IterationResult) -> Rgb {
        match result {
            IterationResult::Bounded => Rgb::BLACK,
            IterationResult::Escaped(i) => self.table.get(self.table_index(i)),
        }
    }

    /// Paints a band of whole rows that starts at `first_row`.
    fn render_rows(&self, first_row: usize, band: &mut [Rgb]) {
        let width = self.settings.viewport.image_width;
        let rows = band.len() / width;
        for ((row, column), pixel) in iproduct!(first_row..first_row + rows, 0..width).zip(band.iter_mut()) {
            *pixel = self.color_for(self.classify(&Pixel(column, row)));
        }
    }

    fn check_buffer(&self, buffer: &[Rgb]) -> Result<(), FractalError> {
        if buffer.len() != self.settings.viewport.len() {
            return Err(FractalError::InvalidViewport(format!(
                "buffer holds {} pixels but the image has {}",
                buffer.len(),
                self.settings.viewport.len()
            )));
        }
        Ok(())
    }

    /// The single-threaded render, into a caller-owned row-major
    /// buffer of exactly `width * height` pixels.
    pub fn render_into(&self, buffer: &mut [Rgb]) -> Result<(), FractalError> {
        self.check_buffer(buffer)?;
        let vp = &self.settings.viewport;
        let span = debug_span!("render", kind = ?self.kind, width = vp.image_width, height = vp.image_height, threads = 1);
        let _guard = span.enter();
        self.render_rows(0, buffer);
        Ok(())
    }

    /// Allocates a buffer and renders into it on this thread.
    pub fn render(&self) -> Result<Vec<Rgb>, FractalError> {
        let mut buffer = vec![Rgb::BLACK; self.settings.viewport.len()];
        self.render_into(&mut buffer)?;
        Ok(buffer)
    }

    /// A multi-threaded version of `render_into` that takes a thread
    /// count.  The buffer is cut into bands of whole rows, one per
    /// thread, so no two threads ever touch the same pixel.
    pub fn render_into_threaded(&self, buffer: &mut [Rgb], threads: usize) -> Result<(), FractalError> {
        if threads == 0 {
            return Err(FractalError::InvalidSettings(
                "the thread count must be at least 1".to_string(),
            ));
        }
        self.check_buffer(buffer)?;
        let vp = &self.settings.viewport;
        let span = debug_span!("render", kind = ?self.kind, width = vp.image_width, height = vp.image_height, threads);
        let _guard = span.enter();

        let band_rows = (vp.image_height + threads - 1) / threads;
        let band_size = band_rows * vp.image_width;
        crossbeam::scope(|spawner| {
            for (i, band) in buffer.chunks_mut(band_size).enumerate() {
                spawner.spawn(move |_| self.render_rows(i * band_rows, band));
            }
        })
        .map_err(|_| FractalError::WorkerPanic)
    }

    /// Allocates a buffer and renders into it with `threads` threads.
    pub fn render_threaded(&self, threads: usize) -> Result<Vec<Rgb>, FractalError> {
        let mut buffer = vec![Rgb::BLACK; self.settings.viewport.len()];
        self.render_into_threaded(&mut buffer, threads)?;
        Ok(buffer)
    }
}

/// The one-shot entry point: builds a fresh table from `profile` and
/// renders with it.  Callers rendering many frames with one palette
/// should build the table once and use `Renderer` directly.
pub fn render_profile<F>(
    settings: RenderSettings,
    kind: Kind,
    profile: &GradientProfile,
    recurrence: F,
    threads: usize,
) -> Result<Vec<Rgb>, FractalError>
where
    F: Fn(Complex<f64>, Complex<f64>) -> Complex<f64> + Sync,
{
    let table = ColorTable::build(profile)?;
    let renderer = Renderer::new(settings, kind, &table, recurrence)?;
    if threads == 1 {
        renderer.render()
    } else {
        renderer.render_threaded(threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::quadratic;
    use crate::gradient::ColorStop;

    fn ramp(n: usize) -> ColorTable {
        let profile = GradientProfile::new(vec![
            ColorStop::new(0, Rgb::new(0, 0, 0)),
            ColorStop::new(n, Rgb::new(255, 255, 255)),
        ])
        .unwrap();
        ColorTable::build(&profile).unwrap()
    }

    fn small(kind: Kind) -> RenderSettings {
        let mut settings = match kind {
            Kind::Mandelbrot => RenderSettings::default(),
            Kind::Julia(_) => RenderSettings::julia_default(),
        };
        settings.viewport.image_width = 48;
        settings.viewport.image_height = 36;
        settings.max_iterations = 200;
        settings
    }

    #[test]
    fn mandelbrot_center_is_inside() {
        let table = ramp(400);
        for &check in &[true, false] {
            let settings = RenderSettings {
                interior_check: check,
                ..RenderSettings::default()
            };
            let renderer = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap();
            assert_eq!(renderer.classify(&Pixel(480, 360)), IterationResult::Bounded);
            assert_eq!(renderer.color_for(renderer.classify(&Pixel(480, 360))), Rgb::BLACK);
        }
    }

    #[test]
    fn mandelbrot_corner_escapes() {
        let table = ramp(400);
        let renderer = Renderer::new(RenderSettings::default(), Kind::Mandelbrot, &table, quadratic).unwrap();
        match renderer.classify(&Pixel(0, 0)) {
            IterationResult::Escaped(_) => {}
            IterationResult::Bounded => panic!("the top-left corner is outside the set"),
        }
    }

    #[test]
    fn julia_center_is_reproducible() {
        let table = ramp(400);
        let settings = RenderSettings::julia_default();
        let kind = Kind::Julia(default_julia_parameter());
        let first = Renderer::new(settings, kind, &table, quadratic).unwrap();
        let second = Renderer::new(settings, kind, &table, quadratic).unwrap();
        let center = Pixel(400, 400);
        assert_eq!(first.plane.pixel_to_point(&center), Complex::new(0.0, 0.0));
        assert_eq!(first.classify(&center), second.classify(&center));
        assert_eq!(
            first.classify(&center),
            escape::julia(Complex::new(0.0, 0.0), default_julia_parameter(), quadratic, 50_000)
        );
    }

    #[test]
    fn threaded_matches_single() {
        let table = ramp(64);
        for &kind in &[Kind::Mandelbrot, Kind::Julia(default_julia_parameter())] {
            let renderer = Renderer::new(small(kind), kind, &table, quadratic).unwrap();
            let single = renderer.render().unwrap();
            for &threads in &[1, 2, 3, 7, 36, 100] {
                assert_eq!(renderer.render_threaded(threads).unwrap(), single);
            }
        }
    }

    #[test]
    fn interior_check_does_not_change_the_image() {
        let table = ramp(64);
        let mut settings = small(Kind::Mandelbrot);
        settings.interior_check = true;
        let with = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap().render().unwrap();
        settings.interior_check = false;
        let without = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap().render().unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn density_and_rotation_move_the_index() {
        let table = ramp(100);
        let mut settings = small(Kind::Mandelbrot);
        let plain = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap();
        assert_eq!(plain.table_index(42), 42);
        assert_eq!(plain.table_index(142), 42);

        settings.density = 0.5;
        settings.rotation = 3;
        let shifted = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap();
        assert_eq!(shifted.table_index(42), 24);
        assert_eq!(shifted.table_index(43), 24);
        assert_eq!(shifted.color_for(IterationResult::Escaped(42)), table.get(24));

        settings.density = 1.0;
        settings.rotation = -5;
        let backwards = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap();
        assert_eq!(backwards.table_index(2), 97);
    }

    #[test]
    fn extreme_rotations_wrap() {
        let table = ramp(100);
        let mut settings = small(Kind::Mandelbrot);
        // i64::MAX = 9223372036854775807, which is 7 mod 100.
        settings.rotation = std::i64::MAX;
        let forward = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap();
        assert_eq!(forward.table_index(5), 12);
        assert_eq!(forward.table_index(99), 6);

        // i64::MIN is 92 mod 100 under Euclidean remainder.
        settings.rotation = std::i64::MIN;
        let backward = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap();
        assert_eq!(backward.table_index(5), 97);
        assert_eq!(backward.table_index(8), 0);
    }

    #[test]
    fn default_settings_trust_the_recurrence() {
        let table = ramp(64);
        let cubic = |z: Complex<f64>, c: Complex<f64>| z * z * z + c;
        let settings = RenderSettings::default();
        assert!(!settings.interior_check);
        let renderer = Renderer::new(settings, Kind::Mandelbrot, &table, cubic).unwrap();
        // The default center, -0.7, is in the quadratic cardioid but
        // escapes under the cubic recurrence.
        let center = Pixel(480, 360);
        assert_eq!(renderer.plane.pixel_to_point(&center), Complex::new(-0.7, 0.0));
        assert_eq!(
            renderer.classify(&center),
            escape::evaluate(Complex::new(0.0, 0.0), Complex::new(-0.7, 0.0), cubic, 100)
        );
        assert_ne!(renderer.classify(&center), IterationResult::Bounded);
    }

    #[test]
    fn logarithmic_mapping_is_used() {
        let table = ramp(400);
        let settings = RenderSettings {
            mapper: IndexMapper::Logarithmic,
            ..RenderSettings::default()
        };
        let renderer = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap();
        assert_eq!(renderer.table_index(0), 0);
        assert_eq!(renderer.table_index(1), 46);
    }

    #[test]
    fn custom_recurrences_are_honoured() {
        let table = ramp(64);
        let settings = RenderSettings {
            interior_check: false,
            ..small(Kind::Mandelbrot)
        };
        let cubic = Renderer::new(settings, Kind::Mandelbrot, &table, |z: Complex<f64>, c: Complex<f64>| z * z * z + c)
            .unwrap()
            .render()
            .unwrap();
        let square = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap().render().unwrap();
        assert_ne!(cubic, square);
    }

    #[test]
    fn rejects_bad_settings() {
        let table = ramp(10);
        let zero_iterations = RenderSettings {
            max_iterations: 0,
            ..RenderSettings::default()
        };
        assert!(Renderer::new(zero_iterations, Kind::Mandelbrot, &table, quadratic).is_err());

        let zero_density = RenderSettings {
            density: 0.0,
            ..RenderSettings::default()
        };
        assert!(Renderer::new(zero_density, Kind::Mandelbrot, &table, quadratic).is_err());

        let mut flat = RenderSettings::default();
        flat.viewport.image_height = 0;
        match Renderer::new(flat, Kind::Mandelbrot, &table, quadratic) {
            Err(FractalError::InvalidViewport(_)) => {}
            Err(e) => panic!("expected InvalidViewport, got {}", e),
            Ok(_) => panic!("a zero-height image was accepted"),
        }
    }

    #[test]
    fn rejects_wrong_buffers_and_thread_counts() {
        let table = ramp(10);
        let renderer = Renderer::new(small(Kind::Mandelbrot), Kind::Mandelbrot, &table, quadratic).unwrap();
        let mut short = vec![Rgb::BLACK; 10];
        assert_eq!(
            renderer.render_into(&mut short).unwrap_err(),
            FractalError::InvalidViewport("buffer holds 10 pixels but the image has 1728".to_string())
        );
        match renderer.render_threaded(0) {
            Err(FractalError::InvalidSettings(_)) => {}
            other => panic!("expected InvalidSettings, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn render_profile_builds_its_own_table() {
        let profile = GradientProfile::new(vec![
            ColorStop::new(0, Rgb::new(0, 0, 0)),
            ColorStop::new(64, Rgb::new(255, 255, 255)),
        ])
        .unwrap();
        let settings = small(Kind::Mandelbrot);
        let table = ColorTable::build(&profile).unwrap();
        let direct = Renderer::new(settings, Kind::Mandelbrot, &table, quadratic).unwrap().render().unwrap();
        assert_eq!(render_profile(settings, Kind::Mandelbrot, &profile, quadratic, 1).unwrap(), direct);
        assert_eq!(render_profile(settings, Kind::Mandelbrot, &profile, quadratic, 4).unwrap(), direct);
    }
}
