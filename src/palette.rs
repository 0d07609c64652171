// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Where gradient profiles come from when the caller doesn't hand one
//! in.  The random source is the only nondeterministic input to a
//! render, so it is always an explicit object with its own seed.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::errors::FractalError;
use crate::gradient::{ColorStop, GradientProfile, Rgb};

/// Anything that can produce a gradient profile on demand.  The
/// sequence driver asks for a new one for every frame.
pub trait PaletteSource {
    /// The next profile.
    fn profile(&mut self) -> Result<GradientProfile, FractalError>;
}

/// The number of stops in a random palette unless told otherwise.
pub const DEFAULT_RANDOM_STOPS: usize = 400;

/// Scatters uniformly random colors over consecutive positions, one
/// stop per position, so the palette period is `stops - 1`.
pub struct RandomPalette {
    stops: usize,
    channel: Uniform<u8>,
    rng: StdRng,
}

impl RandomPalette {
    /// A reproducible source.  The same seed always yields the same
    /// sequence of profiles.  `stops` below 2 is raised to 2.
    pub fn seeded(seed: u64, stops: usize) -> Self {
        RandomPalette::with_rng(StdRng::seed_from_u64(seed), stops)
    }

    /// A source seeded from the operating system.
    pub fn from_entropy(stops: usize) -> Self {
        RandomPalette::with_rng(StdRng::from_entropy(), stops)
    }

    fn with_rng(rng: StdRng, stops: usize) -> Self {
        RandomPalette {
            stops: stops.max(2),
            channel: Uniform::new_inclusive(0, 255),
            rng,
        }
    }

    fn color(&mut self) -> Rgb {
        Rgb::new(
            self.channel.sample(&mut self.rng),
            self.channel.sample(&mut self.rng),
            self.channel.sample(&mut self.rng),
        )
    }
}

impl PaletteSource for RandomPalette {
    fn profile(&mut self) -> Result<GradientProfile, FractalError> {
        let stops = (0..self.stops).map(|i| ColorStop::new(i, self.color())).collect();
        GradientProfile::new(stops)
    }
}

/// Hands out the same profile every time.
pub struct FixedPalette(pub GradientProfile);

impl PaletteSource for FixedPalette {
    fn profile(&mut self) -> Result<GradientProfile, FractalError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::ColorTable;

    #[test]
    fn seeded_sources_repeat() {
        let mut a = RandomPalette::seeded(7, 32);
        let mut b = RandomPalette::seeded(7, 32);
        for _ in 0..3 {
            assert_eq!(a.profile().unwrap(), b.profile().unwrap());
        }
    }

    #[test]
    fn successive_profiles_differ() {
        let mut source = RandomPalette::seeded(7, DEFAULT_RANDOM_STOPS);
        assert_ne!(source.profile().unwrap(), source.profile().unwrap());
    }

    #[test]
    fn random_profiles_are_valid() {
        let mut source = RandomPalette::seeded(99, DEFAULT_RANDOM_STOPS);
        let profile = source.profile().unwrap();
        assert_eq!(profile.stops().len(), 400);
        assert_eq!(profile.period(), 399);
        assert_eq!(ColorTable::build(&profile).unwrap().len(), 399);
    }

    #[test]
    fn tiny_requests_are_raised_to_two_stops() {
        let mut source = RandomPalette::seeded(1, 0);
        assert_eq!(source.profile().unwrap().period(), 1);
    }

    #[test]
    fn fixed_palette_is_fixed() {
        let profile = GradientProfile::new(vec![
            ColorStop::new(0, Rgb::BLACK),
            ColorStop::new(3, Rgb::new(1, 2, 3)),
        ])
        .unwrap();
        let mut source = FixedPalette(profile.clone());
        assert_eq!(source.profile().unwrap(), profile);
        assert_eq!(source.profile().unwrap(), profile);
    }
}
