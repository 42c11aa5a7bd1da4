//! Request validation for building records.
//!
//! The schema is a static table of field name → kind + bound; the validator
//! walks the whole table and reports every failing field, not just the first.
use serde_json::{Map, Value};

use crate::domain::{BuildingFeatures, FeatureName};
use crate::error::{FieldError, FieldErrorKind, ValidationErrors};

/// JSON number shape a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole numbers; `3.0` is accepted, `3.5` is not.
    Integer,
    Float,
}

/// Numeric bound applied after the type check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `min <= x <= max`
    Between { min: f64, max: f64 },
    /// `x >= min`
    AtLeast(f64),
    /// `x > min`
    GreaterThan(f64),
}

impl Bound {
    pub fn check(&self, x: f64) -> Result<(), String> {
        match *self {
            Bound::Between { min, max } if x < min || x > max => {
                Err(format!("must be between {min} and {max}, got {x}"))
            }
            Bound::AtLeast(min) if x < min => {
                Err(format!("must be greater than or equal to {min}, got {x}"))
            }
            Bound::GreaterThan(min) if x <= min => {
                Err(format!("must be greater than {min}, got {x}"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: FeatureName,
    pub kind: FieldKind,
    pub bound: Bound,
    pub description: &'static str,
}

/// Largest integer an f64 holds exactly (2^53). Integer fields are packed
/// into the model input as f64, so anything above it would be altered.
pub const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

const BINARY: Bound = Bound::Between { min: 0.0, max: 1.0 };

/// Every field is mandatory. ENERGYSTARScore is 0-100 by definition but only
/// the lower bound is enforced.
pub const BUILDING_SCHEMA: [FieldSpec; 8] = [
    FieldSpec {
        name: FeatureName::NaturalGasBinary,
        kind: FieldKind::Integer,
        bound: BINARY,
        description: "0 = low gas use, 1 = high gas use",
    },
    FieldSpec {
        name: FeatureName::LargestPropertyUseTypeGfa,
        kind: FieldKind::Float,
        bound: Bound::GreaterThan(0.0),
        description: "gross floor area of the largest property use type",
    },
    FieldSpec {
        name: FeatureName::PropertyGfaTotal,
        kind: FieldKind::Integer,
        bound: Bound::AtLeast(0.0),
        description: "total property surface",
    },
    FieldSpec {
        name: FeatureName::ElectricityBinary,
        kind: FieldKind::Integer,
        bound: BINARY,
        description: "0 = low electricity use, 1 = high electricity use",
    },
    FieldSpec {
        name: FeatureName::PropertyGfaBuilding,
        kind: FieldKind::Integer,
        bound: Bound::AtLeast(0.0),
        description: "property building surface",
    },
    FieldSpec {
        name: FeatureName::EnergyStarScore,
        kind: FieldKind::Integer,
        bound: Bound::AtLeast(0.0),
        description: "energy score from 0 - 100",
    },
    FieldSpec {
        name: FeatureName::BuildingAge,
        kind: FieldKind::Integer,
        bound: Bound::AtLeast(0.0),
        description: "building age",
    },
    FieldSpec {
        name: FeatureName::NumberOfFloors,
        kind: FieldKind::Integer,
        bound: Bound::AtLeast(0.0),
        description: "number of floors",
    },
];

fn field_error(spec: &FieldSpec, kind: FieldErrorKind, message: impl Into<String>) -> FieldError {
    FieldError {
        field: spec.name.as_str().to_string(),
        kind,
        message: message.into(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Type-check and bound-check one raw value.
pub fn check_field(spec: &FieldSpec, raw: Option<&Value>) -> Result<f64, FieldError> {
    let Some(raw) = raw else {
        return Err(field_error(spec, FieldErrorKind::Missing, "field required"));
    };

    let x = match (spec.kind, raw) {
        (FieldKind::Integer, Value::Number(n)) => {
            let x = match n.as_f64() {
                Some(f) if f.fract() == 0.0 => f,
                _ => {
                    return Err(field_error(
                        spec,
                        FieldErrorKind::WrongType,
                        format!("expected an integer, got {n}"),
                    ))
                }
            };
            if x.abs() > MAX_EXACT_INTEGER {
                return Err(field_error(
                    spec,
                    FieldErrorKind::OutOfRange,
                    format!("must be at most {MAX_EXACT_INTEGER}, got {n}"),
                ));
            }
            x
        }
        (FieldKind::Float, Value::Number(n)) => n.as_f64().ok_or_else(|| {
            field_error(
                spec,
                FieldErrorKind::WrongType,
                format!("expected a number, got {n}"),
            )
        })?,
        (kind, other) => {
            let expected = match kind {
                FieldKind::Integer => "an integer",
                FieldKind::Float => "a number",
            };
            return Err(field_error(
                spec,
                FieldErrorKind::WrongType,
                format!("expected {expected}, got {}", json_type(other)),
            ));
        }
    };

    spec.bound
        .check(x)
        .map_err(|msg| field_error(spec, FieldErrorKind::OutOfRange, msg))?;

    Ok(x)
}

/// Build a [`BuildingFeatures`] from a JSON object.
///
/// Unknown keys are ignored. Key order in the input is irrelevant.
pub fn validate_record(input: &Map<String, Value>) -> Result<BuildingFeatures, ValidationErrors> {
    let mut values = [0.0_f64; 8];
    let mut errors = Vec::new();

    for (slot, spec) in values.iter_mut().zip(BUILDING_SCHEMA.iter()) {
        match check_field(spec, input.get(spec.name.as_str())) {
            Ok(x) => *slot = x,
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        return Err(ValidationErrors::new(errors));
    }

    // Integer fields are whole, non-negative and at most 2^53 here, so the
    // casts below are exact.
    let [gas, largest_gfa, gfa_total, elec, gfa_building, score, age, floors] = values;
    Ok(BuildingFeatures {
        natural_gas_binary: gas as u8,
        largest_property_use_type_gfa: largest_gfa,
        property_gfa_total: gfa_total as u64,
        electricity_binary: elec as u8,
        property_gfa_building: gfa_building as u64,
        energy_star_score: score as u64,
        building_age: age as u64,
        number_of_floors: floors as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Map<String, Value> {
        match json!({
            "natural_gas_binary": 1,
            "LargestPropertyUseTypeGFA": 12000,
            "PropertyGFATotal": 50000,
            "electricity_binary": 1,
            "PropertyGFABuilding": 48000,
            "ENERGYSTARScore": 75,
            "building_age": 45,
            "NumberofFloors": 10
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn with(field: &str, value: Value) -> Map<String, Value> {
        let mut map = sample();
        map.insert(field.to_string(), value);
        map
    }

    #[test]
    fn schema_follows_training_order() {
        let names: Vec<_> = BUILDING_SCHEMA.iter().map(|s| s.name).collect();
        assert_eq!(names, FeatureName::TRAINING_ORDER.to_vec());
    }

    #[test]
    fn accepts_sample_record() {
        let record = validate_record(&sample()).unwrap();
        assert_eq!(record.natural_gas_binary, 1);
        assert_eq!(record.largest_property_use_type_gfa, 12000.0);
        assert_eq!(record.property_gfa_building, 48000);
        assert_eq!(record.number_of_floors, 10);
    }

    #[test]
    fn single_field_violations_name_the_field() {
        let cases = [
            ("natural_gas_binary", json!(2)),
            ("electricity_binary", json!(-1)),
            ("PropertyGFATotal", json!(-1)),
            ("LargestPropertyUseTypeGFA", json!(0)),
            ("building_age", json!(-3)),
            ("NumberofFloors", json!(2.5)),
            ("ENERGYSTARScore", json!("75")),
            ("PropertyGFABuilding", json!(null)),
        ];

        for (field, value) in cases {
            let err = validate_record(&with(field, value)).unwrap_err();
            assert_eq!(err.field_names(), vec![field], "case {field}");
        }
    }

    #[test]
    fn missing_field_is_reported_alone() {
        let mut map = sample();
        map.remove("building_age");

        let err = validate_record(&map).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field, "building_age");
        assert_eq!(err.errors[0].kind, FieldErrorKind::Missing);
    }

    #[test]
    fn reports_every_failing_field() {
        let err = validate_record(&Map::new()).unwrap_err();
        assert_eq!(err.errors.len(), 8);
        assert!(err.errors.iter().all(|e| e.kind == FieldErrorKind::Missing));
    }

    #[test]
    fn energy_star_score_boundaries() {
        assert!(validate_record(&with("ENERGYSTARScore", json!(0))).is_ok());
        assert!(validate_record(&with("ENERGYSTARScore", json!(100))).is_ok());
        // Upper bound is not enforced.
        assert!(validate_record(&with("ENERGYSTARScore", json!(120))).is_ok());
    }

    #[test]
    fn binary_fields_accept_only_zero_and_one() {
        for field in ["natural_gas_binary", "electricity_binary"] {
            assert!(validate_record(&with(field, json!(0))).is_ok());
            assert!(validate_record(&with(field, json!(1))).is_ok());
            assert!(validate_record(&with(field, json!(2))).is_err());
            assert!(validate_record(&with(field, json!(true))).is_err());
        }
    }

    #[test]
    fn whole_floats_count_as_integers() {
        let record = validate_record(&with("NumberofFloors", json!(12.0))).unwrap();
        assert_eq!(record.number_of_floors, 12);
    }

    #[test]
    fn integers_beyond_f64_precision_are_out_of_range() {
        let err = validate_record(&with("PropertyGFATotal", json!(1e20))).unwrap_err();
        assert_eq!(err.field_names(), vec!["PropertyGFATotal"]);
        assert_eq!(err.errors[0].kind, FieldErrorKind::OutOfRange);

        let err = validate_record(&with("building_age", json!(u64::MAX))).unwrap_err();
        assert_eq!(err.errors[0].kind, FieldErrorKind::OutOfRange);
    }

    #[test]
    fn largest_exact_integer_is_packed_unchanged() {
        let record =
            validate_record(&with("PropertyGFATotal", json!(9_007_199_254_740_992_u64))).unwrap();
        let packed = crate::domain::FeatureOrder::training().vectorize(&record);
        assert_eq!(packed[2], MAX_EXACT_INTEGER);
    }

    #[test]
    fn float_field_accepts_fractional_values() {
        let record = validate_record(&with("LargestPropertyUseTypeGFA", json!(0.5))).unwrap();
        assert_eq!(record.largest_property_use_type_gfa, 0.5);
    }

    #[test]
    fn bound_messages() {
        assert!(Bound::GreaterThan(0.0).check(0.0).is_err());
        assert!(Bound::AtLeast(0.0).check(0.0).is_ok());
        assert!(Bound::Between { min: 0.0, max: 1.0 }.check(1.0).is_ok());
    }
}
