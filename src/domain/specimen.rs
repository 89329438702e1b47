//! Specimen descriptions.
//!
//! - `SpecimenGeometry`: the flat, serializable description of one test case
//!   consumed by the analytical solver.
//! - `TestModel`: the FE test-model description (substrate lengths, loading
//!   edges, peak load) from which a geometry can be derived.

use serde::{Deserialize, Serialize};

use crate::domain::TestType;
use crate::error::{CzmError, Result};

/// Crack extension below / above the initial crack used for the derived
/// fracture sweep of a `TestModel`.
const SWEEP_BEFORE: f64 = 10.0;
const SWEEP_AFTER: f64 = 40.0;

/// Orthotropic engineering constants of a substrate.
///
/// Serialized as the 9-element list `[E1, E2, E3, v12, v13, v23, G12, G13, G23]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 9]", into = "[f64; 9]")]
pub struct EngineeringConstants {
    pub e1: f64,
    pub e2: f64,
    pub e3: f64,
    pub nu12: f64,
    pub nu13: f64,
    pub nu23: f64,
    pub g12: f64,
    pub g13: f64,
    pub g23: f64,
}

impl From<[f64; 9]> for EngineeringConstants {
    fn from(v: [f64; 9]) -> Self {
        Self {
            e1: v[0],
            e2: v[1],
            e3: v[2],
            nu12: v[3],
            nu13: v[4],
            nu23: v[5],
            g12: v[6],
            g13: v[7],
            g23: v[8],
        }
    }
}

impl From<EngineeringConstants> for [f64; 9] {
    fn from(c: EngineeringConstants) -> Self {
        [
            c.e1, c.e2, c.e3, c.nu12, c.nu13, c.nu23, c.g12, c.g13, c.g23,
        ]
    }
}

/// Geometry, substrate and sweep settings of one analytical test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecimenGeometry {
    /// Base name for generated files.
    #[serde(default)]
    pub name: String,
    pub test_type: TestType,
    /// Specimen half length `L`.
    pub half_length: f64,
    /// Specimen width `B`.
    pub width: f64,
    pub thickness_upper: f64,
    /// Ignored (forced to `thickness_upper`) for symmetric test types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness_lower: Option<f64>,
    #[serde(rename = "thicknessCZ")]
    pub thickness_cz: f64,
    pub initial_crack: f64,
    pub material_prop: EngineeringConstants,
    pub fracture_toughness: f64,
    pub max_load_elastic: f64,
    pub crack_len_start: f64,
    pub crack_len_stop: f64,
}

impl SpecimenGeometry {
    /// Lower substrate thickness as used by the formulas.
    pub fn lower_thickness(&self) -> Result<f64> {
        if self.test_type.is_symmetric() {
            return Ok(self.thickness_upper);
        }
        self.thickness_lower.ok_or_else(|| {
            CzmError::InvalidArgument(format!(
                "{} requires thicknessLower",
                self.test_type.display_name()
            ))
        })
    }

    /// Check that every quantity is finite and positive and that the crack
    /// sweep brackets the initial crack.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("halfLength", self.half_length),
            ("width", self.width),
            ("thicknessUpper", self.thickness_upper),
            ("thicknessLower", self.lower_thickness()?),
            ("thicknessCZ", self.thickness_cz),
            ("initialCrack", self.initial_crack),
            ("E1", self.material_prop.e1),
            ("G13", self.material_prop.g13),
            ("fractureToughness", self.fracture_toughness),
            ("maxLoadElastic", self.max_load_elastic),
            ("crackLenStart", self.crack_len_start),
            ("crackLenStop", self.crack_len_stop),
        ];
        for (field, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(CzmError::Domain(format!(
                    "{field} must be finite and > 0, got {value}"
                )));
            }
        }

        if !(self.crack_len_start < self.initial_crack && self.initial_crack < self.crack_len_stop) {
            return Err(CzmError::Domain(format!(
                "crack sweep must satisfy crackLenStart < initialCrack < crackLenStop, got {} / {} / {}",
                self.crack_len_start, self.initial_crack, self.crack_len_stop
            )));
        }

        Ok(())
    }
}

/// FE test-model description.
///
/// Lengths are measured along the substrate; the loading edges shorten the
/// free span and the crack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestModel {
    pub name: String,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub len_top: f64,
    pub width: f64,
    pub thick_top: f64,
    pub thick_bot: f64,
    pub thick_cz: f64,
    pub crack: f64,
    #[serde(default)]
    pub load_e1: f64,
    #[serde(default)]
    pub load_e2: f64,
    pub peak_load: f64,
    pub f_tough: f64,
    pub mat_prop_top: EngineeringConstants,
}

impl TestModel {
    /// Derive the analytical geometry for this model.
    pub fn to_geometry(&self) -> SpecimenGeometry {
        let initial_crack = self.crack - self.load_e2;
        SpecimenGeometry {
            name: format!("{}_Analytical", self.name),
            test_type: self.test_type,
            half_length: (self.len_top - self.load_e1 - self.load_e2) * 0.5,
            width: self.width,
            thickness_upper: self.thick_top,
            thickness_lower: Some(self.thick_bot),
            thickness_cz: self.thick_cz,
            initial_crack,
            material_prop: self.mat_prop_top,
            fracture_toughness: self.f_tough,
            max_load_elastic: self.peak_load,
            crack_len_start: initial_crack - SWEEP_BEFORE,
            crack_len_stop: initial_crack + SWEEP_AFTER,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const CFRP: [f64; 9] = [109000.0, 8819.0, 8819.0, 0.34, 0.34, 0.38, 4315.0, 4315.0, 3200.0];

    pub(crate) fn adcb_geometry() -> SpecimenGeometry {
        SpecimenGeometry {
            name: "adcb".to_string(),
            test_type: TestType::Adcb,
            half_length: 50.0,
            width: 25.0,
            thickness_upper: 1.5,
            thickness_lower: Some(5.1),
            thickness_cz: 0.2,
            initial_crack: 60.0,
            material_prop: CFRP.into(),
            fracture_toughness: 0.53,
            max_load_elastic: 80.0,
            crack_len_start: 50.0,
            crack_len_stop: 90.0,
        }
    }

    #[test]
    fn geometry_round_trips_through_json_with_material_list() {
        let geom = adcb_geometry();
        let json = serde_json::to_value(&geom).unwrap();
        assert_eq!(json["testType"], "ADCB");
        assert_eq!(json["materialProp"][7], 4315.0);
        assert_eq!(json["thicknessCZ"], 0.2);

        let back: SpecimenGeometry = serde_json::from_value(json).unwrap();
        assert_eq!(back, geom);
    }

    #[test]
    fn symmetric_types_ignore_lower_thickness() {
        let mut geom = adcb_geometry();
        geom.test_type = TestType::Dcb;
        geom.thickness_lower = None;
        assert_eq!(geom.lower_thickness().unwrap(), 1.5);

        geom.test_type = TestType::Aslb;
        assert!(matches!(geom.lower_thickness(), Err(CzmError::InvalidArgument(_))));
    }

    #[test]
    fn validate_rejects_sweep_not_bracketing_crack() {
        let mut geom = adcb_geometry();
        geom.crack_len_start = 70.0;
        assert!(matches!(geom.validate(), Err(CzmError::Domain(_))));
    }

    #[test]
    fn validate_rejects_zero_thickness() {
        let mut geom = adcb_geometry();
        geom.thickness_upper = 0.0;
        let err = geom.validate().unwrap_err();
        assert!(err.to_string().contains("thicknessUpper"));
    }

    #[test]
    fn test_model_derives_geometry() {
        let model = TestModel {
            name: "1022_001".to_string(),
            test_type: TestType::Dcb,
            len_top: 100.0,
            width: 25.0,
            thick_top: 2.4,
            thick_bot: 2.4,
            thick_cz: 0.2,
            crack: 60.0,
            load_e1: 0.0,
            load_e2: 0.0,
            peak_load: 100.0,
            f_tough: 0.42,
            mat_prop_top: CFRP.into(),
        };
        let geom = model.to_geometry();
        assert_eq!(geom.name, "1022_001_Analytical");
        assert_eq!(geom.half_length, 50.0);
        assert_eq!(geom.initial_crack, 60.0);
        assert_eq!(geom.crack_len_start, 50.0);
        assert_eq!(geom.crack_len_stop, 100.0);
        assert_eq!(geom.max_load_elastic, 100.0);
        geom.validate().unwrap();
    }
}
