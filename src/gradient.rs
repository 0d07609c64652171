// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gradient profiles and the color tables built from them.
//!
//! A profile is a short list of color stops, each pinned to an
//! integer position.  The last stop's position is the *period* of
//! the palette: the table built from a profile has exactly that many
//! entries, and the entry at the period would be the same as the
//! entry at zero, so it is never stored.  Between two stops the color
//! follows a Bézier curve whose end points are the two stop colors
//! and whose inner control points belong to the later stop.  With no
//! control points the curve is a straight line.

use serde::Deserialize;
use std::io::Read;
use tracing::debug;

use crate::errors::FractalError;

/// An 8-bit-per-channel color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// Black, the color of points inside the set.
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Constructor.
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    fn channels(self) -> [f64; 3] {
        [f64::from(self.r), f64::from(self.g), f64::from(self.b)]
    }
}

/// One anchor of a gradient profile.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorStop {
    /// Where in the palette cycle this color sits.
    pub position: usize,
    /// The color at `position`.
    pub color: Rgb,
    /// Inner control points of the curve arriving at this stop from
    /// the previous one, in order.  Empty means a straight blend.
    pub controls: Vec<Rgb>,
}

impl ColorStop {
    /// A stop reached by a straight blend from its predecessor.
    pub fn new(position: usize, color: Rgb) -> ColorStop {
        ColorStop {
            position,
            color,
            controls: vec![],
        }
    }

    /// Adds curve control points to this stop.
    pub fn with_controls(mut self, controls: Vec<Rgb>) -> ColorStop {
        self.controls = controls;
        self
    }
}

/// An ordered list of color stops that starts at position zero.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientProfile {
    stops: Vec<ColorStop>,
}

impl GradientProfile {
    /// Takes ownership of the stops and checks their ordering.
    pub fn new(stops: Vec<ColorStop>) -> Result<GradientProfile, FractalError> {
        let profile = GradientProfile { stops };
        profile.validate()?;
        Ok(profile)
    }

    /// The rules every profile must follow before a table is built
    /// from it.
    pub fn validate(&self) -> Result<(), FractalError> {
        if self.stops.len() < 2 {
            return Err(FractalError::InvalidProfile(format!(
                "need at least two color stops, got {}",
                self.stops.len()
            )));
        }
        if self.stops[0].position != 0 {
            return Err(FractalError::InvalidProfile(format!(
                "the first stop must be at position 0, not {}",
                self.stops[0].position
            )));
        }
        for pair in self.stops.windows(2) {
            if pair[1].position < pair[0].position {
                return Err(FractalError::InvalidProfile(format!(
                    "positions must not decrease: {} follows {}",
                    pair[1].position, pair[0].position
                )));
            }
        }
        if self.period() == 0 {
            return Err(FractalError::InvalidProfile(
                "the last stop must be past position 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The palette period: the position of the last stop.
    pub fn period(&self) -> usize {
        self.stops.last().map_or(0, |s| s.position)
    }

    /// The stops, in order.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Reads a profile from its JSON form:
    ///
    /// ```json
    /// [{"position": 0, "color": {"r": 0, "g": 0, "b": 0}},
    ///  {"position": 64, "color": {"r": 255, "g": 128, "b": 0},
    ///   "controls": [{"r": 255, "g": 0, "b": 0}]}]
    /// ```
    pub fn from_json(text: &str) -> Result<GradientProfile, FractalError> {
        let raw: Vec<RawStop> =
            serde_json::from_str(text).map_err(|e| FractalError::InvalidProfile(e.to_string()))?;
        GradientProfile::from_raw(raw)
    }

    /// Same as `from_json`, for files and other readers.
    pub fn from_reader<R: Read>(reader: R) -> Result<GradientProfile, FractalError> {
        let raw: Vec<RawStop> =
            serde_json::from_reader(reader).map_err(|e| FractalError::InvalidProfile(e.to_string()))?;
        GradientProfile::from_raw(raw)
    }

    fn from_raw(raw: Vec<RawStop>) -> Result<GradientProfile, FractalError> {
        let stops = raw
            .into_iter()
            .enumerate()
            .map(|(i, stop)| stop.into_stop(i))
            .collect::<Result<Vec<_>, _>>()?;
        GradientProfile::new(stops)
    }
}

// Everything in the JSON form is optional so that a missing field is
// reported as a bad profile with the stop it belongs to, rather than
// as a parse error.
#[derive(Deserialize)]
struct RawStop {
    position: Option<i64>,
    color: Option<RawColor>,
    #[serde(default)]
    controls: Vec<RawColor>,
}

#[derive(Deserialize)]
struct RawColor {
    r: Option<i64>,
    g: Option<i64>,
    b: Option<i64>,
}

impl RawStop {
    fn into_stop(self, index: usize) -> Result<ColorStop, FractalError> {
        let position = match self.position {
            Some(p) if p >= 0 => p as usize,
            Some(p) => {
                return Err(FractalError::InvalidProfile(format!(
                    "stop {} has negative position {}",
                    index, p
                )))
            }
            None => {
                return Err(FractalError::InvalidProfile(format!(
                    "stop {} has no position",
                    index
                )))
            }
        };
        let color = match self.color {
            Some(color) => color.into_rgb(index)?,
            None => {
                return Err(FractalError::InvalidProfile(format!(
                    "stop {} has no color",
                    index
                )))
            }
        };
        let controls = self
            .controls
            .into_iter()
            .map(|c| c.into_rgb(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ColorStop {
            position,
            color,
            controls,
        })
    }
}

impl RawColor {
    fn into_rgb(self, index: usize) -> Result<Rgb, FractalError> {
        let channel = |value: Option<i64>, name: &str| match value {
            Some(v) if v >= 0 && v <= 255 => Ok(v as u8),
            Some(v) => Err(FractalError::InvalidProfile(format!(
                "stop {}: channel {} = {} is outside 0..=255",
                index, name, v
            ))),
            None => Err(FractalError::InvalidProfile(format!(
                "stop {}: color needs R, G and B, {} is missing",
                index, name
            ))),
        };
        Ok(Rgb {
            r: channel(self.r, "R")?,
            g: channel(self.g, "G")?,
            b: channel(self.b, "B")?,
        })
    }
}

/// Evaluates the Bézier curve through `points` at `t`, all three
/// channels at once, by repeated linear blending (de Casteljau).
fn bezier(t: f64, points: &[[f64; 3]]) -> [f64; 3] {
    let mut work = points.to_vec();
    for level in (1..work.len()).rev() {
        for k in 0..level {
            for ch in 0..3 {
                work[k][ch] = (1.0 - t) * work[k][ch] + t * work[k + 1][ch];
            }
        }
    }
    work[0]
}

fn to_channel(v: f64) -> u8 {
    num::clamp(v, 0.0, 255.0) as u8
}

/// The dense, cyclic palette: one color per position in `[0, period)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorTable {
    colors: Vec<Rgb>,
}

impl ColorTable {
    /// Expands a profile into its table.
    pub fn build(profile: &GradientProfile) -> Result<ColorTable, FractalError> {
        profile.validate()?;
        let period = profile.period();
        let stops = profile.stops();

        let mut colors = Vec::with_capacity(period);
        let mut points: Vec<[f64; 3]> = vec![];
        for pos in 0..period {
            // The first stop is at 0 and the last at `period`, so some
            // stop past the first is always strictly greater than `pos`.
            let next = match stops.iter().position(|s| s.position > pos) {
                Some(next) => next,
                None => return Err(FractalError::InvalidProfile(format!("no stop after position {}", pos))),
            };
            let (prev, next) = (&stops[next - 1], &stops[next]);
            let t = ((pos - prev.position) as f64) / ((next.position - prev.position) as f64);

            points.clear();
            points.push(prev.color.channels());
            points.extend(next.controls.iter().map(|c| c.channels()));
            points.push(next.color.channels());

            let [r, g, b] = bezier(t, &points);
            colors.push(Rgb {
                r: to_channel(r),
                g: to_channel(g),
                b: to_channel(b),
            });
        }

        debug!(period, stops = stops.len(), "built color table");
        Ok(ColorTable { colors })
    }

    /// The number of entries, which is the profile's period.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// A table built from a valid profile is never empty.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The color at `index`, wrapping around the cycle.
    pub fn get(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }

    /// All entries in order.
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}
