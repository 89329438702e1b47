//! Closed-form beam-theory models for standard fracture tests.
//!
//! Each model defines two pure functions of crack length `a`:
//! - `compliance(a)`: displacement per unit load
//! - `critical_load(a)`: load at which the energy release rate reaches the
//!   fracture toughness
//!
//! `solve` samples both into an elastic branch (load sweep at the initial
//! crack) and a fracture branch (crack-length sweep).

use log::debug;

use crate::domain::{CurvePoint, LoadDisplacementCurve, SpecimenGeometry, TestType};
use crate::error::{CzmError, Result};

pub mod adcb;
pub mod aslb;
pub mod enf;

pub use adcb::DoubleCantilever;
pub use aslb::SingleLegBending;
pub use enf::EndNotchedFlexure;

/// Points per branch.
pub const SAMPLE_POINTS: usize = 20;

/// Model selected for a test type; each variant keeps only what its
/// formulas use.
#[derive(Debug, Clone, PartialEq)]
pub enum Specimen {
    Dcb(DoubleCantilever),
    Adcb(DoubleCantilever),
    Enf(EndNotchedFlexure),
    Slb(SingleLegBending),
    Aslb(SingleLegBending),
}

/// Sweep settings shared by every model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSweep {
    pub initial_crack: f64,
    pub max_load_elastic: f64,
    pub crack_len_start: f64,
    pub crack_len_stop: f64,
}

impl LoadSweep {
    pub fn from_geometry(geom: &SpecimenGeometry) -> Self {
        Self {
            initial_crack: geom.initial_crack,
            max_load_elastic: geom.max_load_elastic,
            crack_len_start: geom.crack_len_start,
            crack_len_stop: geom.crack_len_stop,
        }
    }
}

impl Specimen {
    /// Build the model for `geom.test_type`.
    pub fn from_geometry(geom: &SpecimenGeometry) -> Result<Self> {
        let hu = geom.thickness_upper;
        let hl = geom.lower_thickness()?;
        let mat = &geom.material_prop;

        let cantilever = || DoubleCantilever {
            width: geom.width,
            thickness_upper: hu,
            thickness_lower: hl,
            e1: mat.e1,
            g13: mat.g13,
            toughness: geom.fracture_toughness,
        };
        let leg_bending = || SingleLegBending {
            half_length: geom.half_length,
            width: geom.width,
            thickness_upper: hu,
            thickness_lower: hl,
            e1: mat.e1,
            g13: mat.g13,
            toughness: geom.fracture_toughness,
        };

        Ok(match geom.test_type {
            TestType::Dcb => Specimen::Dcb(cantilever()),
            TestType::Adcb => Specimen::Adcb(cantilever()),
            TestType::Enf => Specimen::Enf(EndNotchedFlexure {
                half_length: geom.half_length,
                width: geom.width,
                thickness: hu,
                e1: mat.e1,
                g13: mat.g13,
                toughness: geom.fracture_toughness,
            }),
            TestType::Slb => Specimen::Slb(leg_bending()),
            TestType::Aslb => Specimen::Aslb(leg_bending()),
        })
    }

    pub fn test_type(&self) -> TestType {
        match self {
            Specimen::Dcb(_) => TestType::Dcb,
            Specimen::Adcb(_) => TestType::Adcb,
            Specimen::Enf(_) => TestType::Enf,
            Specimen::Slb(_) => TestType::Slb,
            Specimen::Aslb(_) => TestType::Aslb,
        }
    }

    pub fn compliance(&self, a: f64) -> Result<f64> {
        let c = match self {
            Specimen::Dcb(m) | Specimen::Adcb(m) => m.compliance(a),
            Specimen::Enf(m) => m.compliance(a),
            Specimen::Slb(m) | Specimen::Aslb(m) => m.compliance(a),
        };
        finite(c, "compliance")
    }

    pub fn critical_load(&self, a: f64) -> Result<f64> {
        let p = match self {
            Specimen::Dcb(m) | Specimen::Adcb(m) => m.critical_load(a)?,
            Specimen::Enf(m) => m.critical_load(a)?,
            Specimen::Slb(m) | Specimen::Aslb(m) => m.critical_load(a)?,
        };
        finite(p, "critical load")
    }

    /// Sample the elastic and fracture branches.
    pub fn load_displacement(&self, sweep: &LoadSweep) -> Result<LoadDisplacementCurve> {
        let c0 = self.compliance(sweep.initial_crack)?;
        if c0 <= 0.0 {
            return Err(CzmError::Domain(format!(
                "compliance at the initial crack must be > 0, got {c0}"
            )));
        }

        let elastic = lin_space(0.0, sweep.max_load_elastic, SAMPLE_POINTS)
            .into_iter()
            .map(|load| CurvePoint {
                displacement: c0 * load,
                load,
            })
            .collect();

        let mut fracture = Vec::with_capacity(SAMPLE_POINTS);
        for a in lin_space(sweep.crack_len_start, sweep.crack_len_stop, SAMPLE_POINTS) {
            let load = self.critical_load(a)?;
            let displacement = finite(self.compliance(a)? * load, "displacement")?;
            fracture.push(CurvePoint { displacement, load });
        }

        debug!(
            "{} curve: C(a0)={c0:.6e}, fracture load {:.3} -> {:.3}",
            self.test_type().display_name(),
            fracture.first().map_or(f64::NAN, |p: &CurvePoint| p.load),
            fracture.last().map_or(f64::NAN, |p: &CurvePoint| p.load),
        );

        Ok(LoadDisplacementCurve { elastic, fracture })
    }
}

/// Generate the analytical load–displacement curve for a specimen.
pub fn solve(geom: &SpecimenGeometry) -> Result<LoadDisplacementCurve> {
    geom.validate()?;
    let specimen = Specimen::from_geometry(geom)?;
    specimen.load_displacement(&LoadSweep::from_geometry(geom))
}

/// `n` evenly spaced values over `[start, stop]`, both ends included exactly.
pub fn lin_space(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as f64 - 1.0);
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}

/// Second moment of area times modulus, `E b h^3 / 12`.
pub(crate) fn flexural_rigidity(e: f64, b: f64, h: f64) -> f64 {
    e * b * h.powi(3) / 12.0
}

pub(crate) fn positive_sqrt(value: f64, what: &str) -> Result<f64> {
    if !(value.is_finite() && value > 0.0) {
        return Err(CzmError::Domain(format!(
            "{what}: square root of non-positive or non-finite value {value}"
        )));
    }
    Ok(value.sqrt())
}

fn finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CzmError::Domain(format!("{what} is not finite ({value})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::specimen::tests::{adcb_geometry, CFRP};

    fn dcb_geometry() -> SpecimenGeometry {
        SpecimenGeometry {
            name: "dcb".to_string(),
            test_type: TestType::Dcb,
            half_length: 50.0,
            width: 25.0,
            thickness_upper: 2.4,
            thickness_lower: None,
            thickness_cz: 0.2,
            initial_crack: 60.0,
            material_prop: CFRP.into(),
            fracture_toughness: 0.42,
            max_load_elastic: 100.0,
            crack_len_start: 50.0,
            crack_len_stop: 100.0,
        }
    }

    #[test]
    fn lin_space_includes_both_ends() {
        let v = lin_space(50.0, 90.0, 20);
        assert_eq!(v.len(), 20);
        assert_eq!(v[0], 50.0);
        assert_eq!(v[19], 90.0);
        assert!(lin_space(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn dcb_compliance_increases_and_load_decreases_with_crack() {
        let specimen = Specimen::from_geometry(&dcb_geometry()).unwrap();
        let cracks = lin_space(10.0, 150.0, 50);
        for w in cracks.windows(2) {
            assert!(specimen.compliance(w[1]).unwrap() > specimen.compliance(w[0]).unwrap());
            assert!(specimen.critical_load(w[1]).unwrap() < specimen.critical_load(w[0]).unwrap());
        }
    }

    #[test]
    fn adcb_elastic_end_matches_closed_form() {
        let geom = adcb_geometry();
        let curve = solve(&geom).unwrap();
        assert_eq!(curve.elastic.len(), SAMPLE_POINTS);
        assert_eq!(curve.fracture.len(), SAMPLE_POINTS);

        // C = a^3 (1/Du + 1/Dl) / 3 + 6 a (1/hu + 1/hl) / (5 B G13)
        let (b, hu, hl, a) = (25.0_f64, 1.5_f64, 5.1_f64, 60.0_f64);
        let du = 109000.0 * b * hu.powi(3) / 12.0;
        let dl = 109000.0 * b * hl.powi(3) / 12.0;
        let c = a.powi(3) * (1.0 / du + 1.0 / dl) / 3.0 + 6.0 * a * (1.0 / hu + 1.0 / hl) / (5.0 * b * 4315.0);

        let last = curve.elastic.last().unwrap();
        assert_eq!(last.load, geom.max_load_elastic);
        let expected = c * geom.max_load_elastic;
        assert!(((last.displacement - expected) / expected).abs() < 1e-9);
        assert!((expected - 7.752_879_805_296).abs() < 1e-9);
    }

    #[test]
    fn aslb_elastic_end_uses_initial_crack_compliance() {
        let mut geom = adcb_geometry();
        geom.test_type = TestType::Aslb;
        let curve = solve(&geom).unwrap();

        // C(60) for hu = 1.5, hl = 5.1, L = 50, B = 25 times maxLoadElastic = 80
        let last = curve.elastic.last().unwrap();
        assert!((last.displacement / 1.892_618_560_440_333_6 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn dcb_forces_symmetric_arms() {
        let mut geom = dcb_geometry();
        geom.thickness_lower = Some(10.0);
        match Specimen::from_geometry(&geom).unwrap() {
            Specimen::Dcb(m) => assert_eq!(m.thickness_lower, m.thickness_upper),
            other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn every_test_type_produces_finite_branches() {
        for test_type in [TestType::Dcb, TestType::Adcb, TestType::Enf, TestType::Slb, TestType::Aslb] {
            let mut geom = adcb_geometry();
            geom.test_type = test_type;
            let curve = solve(&geom).unwrap();
            assert!(curve.trace().iter().all(|p| p.displacement.is_finite() && p.load.is_finite()));
            assert_eq!(Specimen::from_geometry(&geom).unwrap().test_type(), test_type);
        }
    }

    #[test]
    fn non_positive_geometry_is_a_domain_error() {
        let mut geom = adcb_geometry();
        geom.material_prop.g13 = 0.0;
        assert!(matches!(solve(&geom), Err(CzmError::Domain(_))));

        geom = adcb_geometry();
        geom.width = f64::NAN;
        assert!(matches!(solve(&geom), Err(CzmError::Domain(_))));
    }

    #[test]
    fn negative_energy_balance_is_a_domain_error() {
        let model = DoubleCantilever {
            width: 25.0,
            thickness_upper: 1.5,
            thickness_lower: 1.5,
            e1: 109000.0,
            g13: 4315.0,
            toughness: -1.0,
        };
        assert!(matches!(Specimen::Adcb(model).critical_load(60.0), Err(CzmError::Domain(_))));
    }
}
