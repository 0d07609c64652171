// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The batch driver: renders a list of shots, each held for some
//! number of frames, into a directory of numbered images.  Every
//! frame asks the palette source for a fresh profile, so with a
//! random source a held shot flickers through palettes while the
//! geometry stays put.

use num::Complex;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::errors::FractalError;
use crate::gradient::ColorTable;
use crate::output::{frame_name, write_image};
use crate::palette::PaletteSource;
use crate::render::{Kind, RenderSettings, Renderer};

/// One view of the Mandelbrot set, held for `frames` frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shot {
    /// Center of the view.
    pub center: Complex<f64>,
    /// Real-axis width of the view.
    pub width_span: f64,
    /// How many frames to render of it.
    pub frames: usize,
}

impl Shot {
    /// Constructor.
    pub fn new(re: f64, im: f64, width_span: f64, frames: usize) -> Shot {
        Shot {
            center: Complex::new(re, im),
            width_span,
            frames,
        }
    }
}

/// A list of shots plus the settings they share.  The viewport in
/// `settings` supplies the image size; each shot supplies center and
/// width.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    /// The shots, rendered in order.
    pub shots: Vec<Shot>,
    /// Size, iteration limit, density, rotation, mapping.
    pub settings: RenderSettings,
}

impl Sequence {
    /// A dive from the whole set down toward -0.74364085+0.13182733i,
    /// a thousand frames per stop except the last.
    pub fn classic(settings: RenderSettings) -> Sequence {
        Sequence {
            shots: vec![
                Shot::new(-0.7, 0.0, 3.0769, 1000),
                Shot::new(-0.87591, 0.20464, 0.53184, 1000),
                Shot::new(-0.759856, 0.125547, 0.051579, 1000),
                Shot::new(-0.743030, 0.126433, 0.016110, 1000),
                Shot::new(-0.7435669, 0.1314023, 0.0022878, 1000),
                Shot::new(-0.74364990, 0.13188204, 0.00073801, 1000),
                Shot::new(-0.74364085, 0.13182733, 0.00012068, 700),
            ],
            settings,
        }
    }

    /// Holds every shot for `frames` frames instead.
    pub fn with_frames(mut self, frames: usize) -> Sequence {
        for shot in &mut self.shots {
            shot.frames = frames;
        }
        self
    }

    /// Total number of frames across all shots.
    pub fn len(&self) -> usize {
        self.shots.iter().map(|s| s.frames).sum()
    }

    /// True when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders every frame into `dir` (created if missing), numbering
    /// files from `first_index`.  Returns the number of frames written.
    pub fn run<F>(
        &self,
        dir: &Path,
        first_index: usize,
        palette: &mut dyn PaletteSource,
        recurrence: F,
        threads: usize,
    ) -> Result<usize, FractalError>
    where
        F: Fn(Complex<f64>, Complex<f64>) -> Complex<f64> + Sync + Copy,
    {
        fs::create_dir_all(dir)?;
        let mut index = first_index;
        for shot in &self.shots {
            let mut settings = self.settings;
            settings.viewport.center = shot.center;
            settings.viewport.width_span = shot.width_span;
            for _ in 0..shot.frames {
                let table = ColorTable::build(&palette.profile()?)?;
                let renderer = Renderer::new(settings, Kind::Mandelbrot, &table, recurrence)?;
                let pixels = renderer.render_threaded(threads)?;
                let path = frame_name(dir, index);
                write_image(&path, settings.viewport.image_width, settings.viewport.image_height, &pixels)?;
                info!(path = %path.display(), "saved");
                index += 1;
            }
        }
        Ok(index - first_index)
    }
}
