//! Asymmetric single-leg bending (also used for SLB with `hl = hu`).
//!
//! The uncracked region is treated as a composite beam about its neutral
//! axis (rigidity `Dm`); `C1` collects the shear-deformation term of the
//! bonded section.

use super::{flexural_rigidity, positive_sqrt};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct SingleLegBending {
    pub half_length: f64,
    pub width: f64,
    pub thickness_upper: f64,
    pub thickness_lower: f64,
    pub e1: f64,
    pub g13: f64,
    pub toughness: f64,
}

/// Rigidities derived once per specimen.
#[derive(Debug, Clone, Copy)]
struct Section {
    /// Upper (cracked) arm rigidity.
    du: f64,
    /// Bonded section rigidity.
    dm: f64,
    c1: f64,
}

impl SingleLegBending {
    fn section(&self) -> Section {
        let (b, hu, hl) = (self.width, self.thickness_upper, self.thickness_lower);
        let du_offset = hl / 2.0;
        let dl_offset = (hu + hl) / 2.0 - du_offset;

        let du = flexural_rigidity(self.e1, b, hu);
        let dm = self.e1 * b * ((hu.powi(3) + hl.powi(3)) / 12.0 + hu * du_offset.powi(2) + hl * dl_offset.powi(2));

        Section {
            du,
            dm,
            c1: shear_constant(self.e1, self.g13, hl, dl_offset),
        }
    }

    pub fn compliance(&self, a: f64) -> f64 {
        let s = self.section();
        let (l, b, hu) = (self.half_length, self.width, self.thickness_upper);

        let bending = (a.powi(3) * (1.0 / s.du - 1.0 / s.dm) + 2.0 * l.powi(3) / s.dm) / 12.0;
        let shear = 3.0 * a / (10.0 * b * hu * self.g13);
        let bonded = b * s.c1 * (2.0 * l - a) / (16.0 * s.dm * s.dm);
        bending + shear + bonded
    }

    pub fn critical_load(&self, a: f64) -> Result<f64> {
        let s = self.section();
        let (b, hu) = (self.width, self.thickness_upper);

        let r = a * a * (1.0 / s.du - 1.0 / s.dm) / 4.0 + 3.0 / (10.0 * b * hu * self.g13)
            - b * s.c1 / (16.0 * s.dm * s.dm);
        positive_sqrt(2.0 * b * self.toughness / r, "ASLB critical load")
    }
}

fn shear_constant(e1: f64, g13: f64, hl: f64, dl: f64) -> f64 {
    let plus = dl + hl / 2.0;
    let minus = hl / 2.0 - dl;

    let mut c1 = hl * plus.powi(4) - 7.0 * plus.powi(5) / 15.0;
    c1 += minus.powi(3) * (minus.powi(2) / 5.0 - 2.0 * plus.powi(2) / 3.0);
    c1 += 8.0 * (plus.powi(5) - minus.powi(5)) / 15.0;
    c1 -= 8.0 * hl * dl * minus.powi(3) / 3.0;
    c1 -= 4.0 * hl * hl * dl * dl * minus;
    c1 * e1 * e1 / g13
}
