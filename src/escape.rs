// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time evaluator.  Takes a starting point, a parameter,
//! and a recurrence, and iterates until the orbit leaves the disc of
//! radius 2 or the iteration budget runs out.
//!
//! Mandelbrot and Julia sets use the same loop with the roles of the
//! two complex numbers swapped: the Mandelbrot starts every orbit at
//! zero and varies the parameter, the Julia fixes the parameter and
//! varies the start.

use num::Complex;
use std::str::FromStr;

/// How an orbit ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IterationResult {
    /// The orbit left the radius-2 disc on the given (zero-based)
    /// iteration.
    Escaped(usize),
    /// The orbit was still inside the disc when the budget ran out.
    Bounded,
}

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

// |z| > 2, without the square root.
const ESCAPE_NORM_SQR: f64 = 4.0;

/// The classic recurrence, `z*z + c`.
#[inline]
pub fn quadratic(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    z * z + c
}

/// The two halves of the `or` expression are the closed-form tests
/// for the main cardioid and the period-2 bulb of the quadratic
/// Mandelbrot set.  A point for which this returns true never
/// escapes, so there is no need to iterate it.  A point for which it
/// returns false may still be inside; those have to be iterated.
pub fn in_known_interior(point: Complex<f64>) -> bool {
    let y = point.im.powf(2.0);
    let q = y + (point.re - D4).powf(2.0);
    q * (q + point.re - D4) < (y * D4) || (point.re + 1.0_f64).powf(2.0) + y < D16
}

/// Iterates `recurrence` from `seed` with the fixed `param`, checking
/// the escape radius after every step.
pub fn evaluate<F>(seed: Complex<f64>, param: Complex<f64>, recurrence: F, max_iterations: usize) -> IterationResult
where
    F: Fn(Complex<f64>, Complex<f64>) -> Complex<f64>,
{
    let mut z = seed;
    for i in 0..max_iterations {
        z = recurrence(z, param);
        // A NaN norm means the orbit overflowed; that is an escape too.
        let norm = z.norm_sqr();
        if norm > ESCAPE_NORM_SQR || norm.is_nan() {
            return IterationResult::Escaped(i);
        }
    }
    IterationResult::Bounded
}

/// Mandelbrot convention: the orbit starts at zero, the point is
/// the parameter.  With `interior_check` set, points inside the
/// cardioid or the period-2 bulb return `Bounded` without iterating;
/// only set it for the quadratic recurrence.
pub fn mandelbrot<F>(point: Complex<f64>, recurrence: F, max_iterations: usize, interior_check: bool) -> IterationResult
where
    F: Fn(Complex<f64>, Complex<f64>) -> Complex<f64>,
{
    if interior_check && in_known_interior(point) {
        return IterationResult::Bounded;
    }
    evaluate(Complex::new(0.0, 0.0), point, recurrence, max_iterations)
}

/// Julia convention: the point is where the orbit starts, the
/// parameter is fixed for the whole image.
pub fn julia<F>(point: Complex<f64>, c: Complex<f64>, recurrence: F, max_iterations: usize) -> IterationResult
where
    F: Fn(Complex<f64>, Complex<f64>) -> Complex<f64>,
{
    evaluate(point, c, recurrence, max_iterations)
}

/// The named recurrences the command line knows about.  Library users
/// can pass any closure instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Family {
    /// `z*z + c`
    Quadratic,
    /// `z*z*z + c`
    Cubic,
    /// `conj(z)^2 + c`, the Mandelbar.
    Tricorn,
    /// `(|re z| + i|im z|)^2 + c`
    BurningShip,
}

impl Family {
    /// One step of the recurrence.
    #[inline]
    pub fn apply(self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        match self {
            Family::Quadratic => quadratic(z, c),
            Family::Cubic => z * z * z + c,
            Family::Tricorn => {
                let z = z.conj();
                z * z + c
            }
            Family::BurningShip => {
                let z = Complex::new(z.re.abs(), z.im.abs());
                z * z + c
            }
        }
    }

    /// Whether the cardioid/bulb shortcut gives the same answer as
    /// iterating.  It only does for the quadratic family.
    pub fn has_known_interior(self) -> bool {
        self == Family::Quadratic
    }
}

impl Default for Family {
    fn default() -> Self {
        Family::Quadratic
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quadratic" => Ok(Family::Quadratic),
            "cubic" => Ok(Family::Cubic),
            "tricorn" => Ok(Family::Tricorn),
            "burning-ship" => Ok(Family::BurningShip),
            _ => Err(format!("Unknown fractal family '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero() -> Complex<f64> {
        Complex::new(0.0, 0.0)
    }

    #[test]
    fn origin_never_escapes() {
        for &max in &[0, 1, 2, 100, 10_000] {
            assert_eq!(evaluate(zero(), zero(), quadratic, max), IterationResult::Bounded);
        }
    }

    #[test]
    fn two_escapes_on_the_second_step() {
        // 0 -> 2 (|2| is not > 2) -> 6.
        let c = Complex::new(2.0, 0.0);
        assert_eq!(evaluate(zero(), c, quadratic, 1), IterationResult::Bounded);
        for &max in &[2, 3, 50, 1000] {
            assert_eq!(evaluate(zero(), c, quadratic, max), IterationResult::Escaped(1));
        }
    }

    #[test]
    fn far_points_escape_immediately() {
        let c = Complex::new(3.0, 3.0);
        assert_eq!(evaluate(zero(), c, quadratic, 10), IterationResult::Escaped(0));
    }

    #[test]
    fn overflowing_orbits_count_as_escaped() {
        let huge = Complex::new(std::f64::MAX, std::f64::MAX);
        assert_eq!(evaluate(huge, zero(), |z, _| z * z, 5), IterationResult::Escaped(0));
    }

    #[test]
    fn interior_check_agrees_with_iteration() {
        let points = [
            Complex::new(-0.7, 0.0),
            Complex::new(0.0, 0.0),
            Complex::new(-1.0, 0.0),
            Complex::new(0.2, 0.3),
            Complex::new(-1.1, 0.1),
        ];
        for p in points.iter() {
            assert!(in_known_interior(*p), "{} should be in the known interior", p);
            assert_eq!(mandelbrot(*p, quadratic, 2000, false), IterationResult::Bounded);
            assert_eq!(mandelbrot(*p, quadratic, 2000, true), IterationResult::Bounded);
        }
    }

    #[test]
    fn interior_check_leaves_outside_points_alone() {
        let points = [Complex::new(2.0, 0.0), Complex::new(0.5, 0.5), Complex::new(-2.1, 0.0)];
        for p in points.iter() {
            assert!(!in_known_interior(*p));
            assert_eq!(
                mandelbrot(*p, quadratic, 100, true),
                mandelbrot(*p, quadratic, 100, false)
            );
        }
    }

    #[test]
    fn julia_starts_from_the_point() {
        let c = Complex::new(-0.4, 0.6);
        let first = julia(zero(), c, quadratic, 50_000);
        let second = julia(zero(), c, quadratic, 50_000);
        assert_eq!(first, second);
        assert_eq!(julia(Complex::new(2.5, 0.0), c, quadratic, 10), IterationResult::Escaped(0));
    }

    #[test]
    fn families_reduce_to_known_values() {
        let z = Complex::new(1.0, -1.0);
        let c = Complex::new(0.5, 0.0);
        assert_eq!(Family::Quadratic.apply(z, c), Complex::new(0.5, -2.0));
        assert_eq!(Family::Tricorn.apply(z, c), Complex::new(0.5, 2.0));
        assert_eq!(Family::BurningShip.apply(z, c), Complex::new(0.5, 2.0));
        assert_eq!(Family::Cubic.apply(z, c), Complex::new(-1.5, -2.0));
    }

    #[test]
    fn families_parse_from_names() {
        assert_eq!("cubic".parse::<Family>(), Ok(Family::Cubic));
        assert_eq!("burning-ship".parse::<Family>(), Ok(Family::BurningShip));
        assert!("quartic".parse::<Family>().is_err());
        assert!(Family::Quadratic.has_known_interior());
        assert!(!Family::Tricorn.has_known_interior());
    }
}
