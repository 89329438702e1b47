//! Asymmetric double cantilever beam (also used for DCB with `hl = hu`).
//!
//! Beam-theory compliance with a shear correction:
//!
//! ```text
//! C(a) = a^3 (1/Du + 1/Dl) / 3 + 6 a (1/hu + 1/hl) / (5 B G13)
//! P(a) = sqrt(2 B Gc / (a^2 (1/Du + 1/Dl) + 6 (1/hu + 1/hl) / (5 B G13)))
//! ```

use super::{flexural_rigidity, positive_sqrt};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct DoubleCantilever {
    pub width: f64,
    pub thickness_upper: f64,
    pub thickness_lower: f64,
    pub e1: f64,
    pub g13: f64,
    pub toughness: f64,
}

impl DoubleCantilever {
    fn flexibility(&self) -> f64 {
        let du = flexural_rigidity(self.e1, self.width, self.thickness_upper);
        let dl = flexural_rigidity(self.e1, self.width, self.thickness_lower);
        1.0 / du + 1.0 / dl
    }

    fn shear(&self) -> f64 {
        6.0 * (1.0 / self.thickness_upper + 1.0 / self.thickness_lower) / (5.0 * self.width * self.g13)
    }

    pub fn compliance(&self, a: f64) -> f64 {
        a.powi(3) * self.flexibility() / 3.0 + a * self.shear()
    }

    pub fn critical_load(&self, a: f64) -> Result<f64> {
        let r = a * a * self.flexibility() + self.shear();
        positive_sqrt(2.0 * self.width * self.toughness / r, "ADCB critical load")
    }
}
