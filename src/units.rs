//! Absolute physical lengths used by the layout engine.
//!
//! Every geometric value is stored as an integral number of English Metric Units (EMU), the
//! unit office document formats use for drawing sizes.  One inch is exactly 914 400 EMU, which
//! makes millimetres, centimetres and points all whole multiples and keeps the grid arithmetic
//! free of floating point drift.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// EMU in one inch.
pub const EMU_PER_INCH: i64 = 914_400;
/// EMU in one millimetre.
pub const EMU_PER_MM: i64 = 36_000;
/// EMU in one centimetre.
pub const EMU_PER_CM: i64 = 360_000;
/// EMU in one typographic point (1/72 inch).
pub const EMU_PER_POINT: i64 = 12_700;

/// An absolute length in English Metric Units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Emu(pub i64);

impl Emu {
    /// The zero length.
    pub const ZERO: Emu = Emu(0);

    fn from_scaled(value: f64, per_unit: i64) -> Self {
        Emu((value * per_unit as f64).round() as i64)
    }

    /// Converts millimetres, rounding to the nearest EMU.
    pub fn from_mm(mm: f64) -> Self {
        Self::from_scaled(mm, EMU_PER_MM)
    }

    /// Converts centimetres, rounding to the nearest EMU.
    pub fn from_cm(cm: f64) -> Self {
        Self::from_scaled(cm, EMU_PER_CM)
    }

    /// Converts inches, rounding to the nearest EMU.
    pub fn from_inches(inches: f64) -> Self {
        Self::from_scaled(inches, EMU_PER_INCH)
    }

    /// Converts whole typographic points.
    pub const fn from_points(points: i64) -> Self {
        Emu(points * EMU_PER_POINT)
    }

    /// Returns the raw EMU count.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns the length in millimetres.
    pub fn to_mm(self) -> f64 {
        self.0 as f64 / EMU_PER_MM as f64
    }

    /// Returns the length in inches.
    pub fn to_inches(self) -> f64 {
        self.0 as f64 / EMU_PER_INCH as f64
    }

    /// Returns `true` for lengths strictly greater than zero.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Multiplies by `factor`, returning `None` on overflow.
    pub fn checked_mul(self, factor: i64) -> Option<Emu> {
        self.0.checked_mul(factor).map(Emu)
    }

    /// Adds `rhs`, returning `None` on overflow.
    pub fn checked_add(self, rhs: Emu) -> Option<Emu> {
        self.0.checked_add(rhs.0).map(Emu)
    }

    /// Floor division into `parts` equal pieces, returning the piece and the leftover EMUs.
    ///
    /// `parts` must be non-zero; callers validate grid counts before dividing.
    pub fn split(self, parts: u32) -> (Emu, Emu) {
        let parts = i64::from(parts);
        (Emu(self.0.div_euclid(parts)), Emu(self.0.rem_euclid(parts)))
    }
}

impl Add for Emu {
    type Output = Emu;

    fn add(self, rhs: Emu) -> Emu {
        Emu(self.0 + rhs.0)
    }
}

impl Sub for Emu {
    type Output = Emu;

    fn sub(self, rhs: Emu) -> Emu {
        Emu(self.0 - rhs.0)
    }
}

impl Mul<i64> for Emu {
    type Output = Emu;

    fn mul(self, rhs: i64) -> Emu {
        Emu(self.0 * rhs)
    }
}

impl Div<i64> for Emu {
    type Output = Emu;

    fn div(self, rhs: i64) -> Emu {
        Emu(self.0.div_euclid(rhs))
    }
}

impl fmt::Display for Emu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}mm", self.to_mm())
    }
}
