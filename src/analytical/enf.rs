//! End-notched flexure.
//!
//! The critical load is evaluated through the equivalent crack length
//! recovered from the compliance, so the same expression applies when `C`
//! comes from a measurement instead of the closed form.

use super::positive_sqrt;
use crate::error::{CzmError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct EndNotchedFlexure {
    pub half_length: f64,
    pub width: f64,
    pub thickness: f64,
    pub e1: f64,
    pub g13: f64,
    pub toughness: f64,
}

impl EndNotchedFlexure {
    fn shear(&self) -> f64 {
        3.0 * self.half_length / (10.0 * self.width * self.thickness * self.g13)
    }

    fn bending_denominator(&self) -> f64 {
        8.0 * self.e1 * self.width * self.thickness.powi(3)
    }

    pub fn compliance(&self, a: f64) -> f64 {
        let l3 = self.half_length.powi(3);
        (3.0 * a.powi(3) + 2.0 * l3) / self.bending_denominator() + self.shear()
    }

    /// Equivalent crack length for a given compliance.
    pub fn equivalent_crack(&self, compliance: f64) -> f64 {
        let l3 = self.half_length.powi(3);
        (((compliance - self.shear()) * self.bending_denominator() - 2.0 * l3) / 3.0).cbrt()
    }

    pub fn critical_load(&self, a: f64) -> Result<f64> {
        let ae = self.equivalent_crack(self.compliance(a));
        if !(ae.is_finite() && ae > 0.0) {
            return Err(CzmError::Domain(format!(
                "ENF equivalent crack length must be > 0, got {ae}"
            )));
        }
        let h3 = self.thickness.powi(3);
        let numer = positive_sqrt(16.0 * self.width * self.width * h3 * self.e1 * self.toughness, "ENF critical load")?;
        Ok(numer / (3.0 * ae))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_crack_recovers_crack_length() {
        let enf = EndNotchedFlexure {
            half_length: 120.0,
            width: 3.0,
            thickness: 2.24,
            e1: 109000.0,
            g13: 4315.0,
            toughness: 4.6,
        };
        for a in [70.0, 80.0, 200.0] {
            let ae = enf.equivalent_crack(enf.compliance(a));
            assert!((ae - a).abs() < 1e-9 * a);
        }
        let p = enf.critical_load(80.0).unwrap();
        assert!((p - 118.695_484_261).abs() < 1e-6);
    }
}
