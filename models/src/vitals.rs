use std::fmt;

use serde::{Deserialize, Serialize};
use bincode::{Encode, Decode};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ValidationError, ValidationReport};

// Accepted shapes, one regex per field. Every pattern is anchored on both
// ends so a valid prefix with trailing characters never slips through.
static WEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([4-9][0-9]|1[0-9]{2})(\.[0-9])?$").unwrap());
static HEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(1\.[0-9]{1,2}|2\.[0-2][0-9]?)$").unwrap());
static TEMPERATURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(3[5-9]|4[0-3])(\.[0-9])?$").unwrap());
static HEART_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(5[0-9]|[6-9][0-9]|100)$").unwrap());
static RESPIRATORY_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(12|1[3-9]|2[0-9]|3[0-9]|40)$").unwrap());
static BLOOD_PRESSURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(1[0-3][0-9]|140)/([6-8][0-9]|90)$").unwrap());

const WEIGHT_SHAPE: &str = "40.0-199.9 kg, at most one decimal";
const HEIGHT_SHAPE: &str = "1.00-2.29 m";
const TEMPERATURE_SHAPE: &str = "35.0-43.9 °C, at most one decimal";
const HEART_RATE_SHAPE: &str = "50-100 whole beats per minute";
const RESPIRATORY_RATE_SHAPE: &str = "12-40 whole breaths per minute";
const BLOOD_PRESSURE_SHAPE: &str = "systolic/diastolic, systolic 100-140 and diastolic 60-90";

/// Arterial pressure reading, stored as the two component values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct BloodPressure {
    pub systolic: u16,
    pub diastolic: u16,
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

/// The vitals record attached one-to-one to a consultation. Every field is
/// optional; a consultation saved without measurements still owns an empty
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct VitalSigns {
    #[serde(rename = "id_signos")]
    pub id: u64,
    #[serde(rename = "consulta")]
    pub consultation_id: u64,
    #[serde(rename = "peso")]
    pub weight_kg: Option<f64>,
    #[serde(rename = "talla")]
    pub height_m: Option<f64>,
    #[serde(rename = "temperatura")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "frecuencia_cardiaca")]
    pub heart_rate_bpm: Option<u16>,
    #[serde(rename = "frecuencia_respiratoria")]
    pub respiratory_rate_rpm: Option<u16>,
    #[serde(rename = "presion_arterial")]
    pub blood_pressure: Option<BloodPressure>,
    #[serde(rename = "imc")]
    pub bmi: Option<f64>,
}

/// Raw vitals as captured at the point of care, before validation. Blank
/// strings count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VitalSignsInput {
    pub weight: Option<String>,
    pub height: Option<String>,
    pub temperature: Option<String>,
    pub heart_rate: Option<String>,
    pub respiratory_rate: Option<String>,
    pub blood_pressure: Option<String>,
}

impl VitalSignsInput {
    pub fn is_empty(&self) -> bool {
        cleaned(&self.weight).is_none()
            && cleaned(&self.height).is_none()
            && cleaned(&self.temperature).is_none()
            && cleaned(&self.heart_rate).is_none()
            && cleaned(&self.respiratory_rate).is_none()
            && cleaned(&self.blood_pressure).is_none()
    }

    /// Checks every present field against its accepted shape, collecting one
    /// error per failing field rather than stopping at the first.
    pub fn validate(&self) -> Result<ValidatedVitals, ValidationReport> {
        let mut report = ValidationReport::new();
        let vitals = ValidatedVitals {
            weight_kg: parse_decimal("peso", &self.weight, &WEIGHT_RE, WEIGHT_SHAPE, &mut report),
            height_m: parse_decimal("talla", &self.height, &HEIGHT_RE, HEIGHT_SHAPE, &mut report),
            temperature_c: parse_decimal(
                "temperatura",
                &self.temperature,
                &TEMPERATURE_RE,
                TEMPERATURE_SHAPE,
                &mut report,
            ),
            heart_rate_bpm: parse_integer(
                "frecuencia_cardiaca",
                &self.heart_rate,
                &HEART_RATE_RE,
                HEART_RATE_SHAPE,
                &mut report,
            ),
            respiratory_rate_rpm: parse_integer(
                "frecuencia_respiratoria",
                &self.respiratory_rate,
                &RESPIRATORY_RATE_RE,
                RESPIRATORY_RATE_SHAPE,
                &mut report,
            ),
            blood_pressure: parse_blood_pressure(&self.blood_pressure, &mut report),
        };
        if report.is_empty() {
            Ok(vitals)
        } else {
            Err(report)
        }
    }
}

/// Vitals that passed validation, still detached from any consultation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedVitals {
    pub weight_kg: Option<f64>,
    pub height_m: Option<f64>,
    pub temperature_c: Option<f64>,
    pub heart_rate_bpm: Option<u16>,
    pub respiratory_rate_rpm: Option<u16>,
    pub blood_pressure: Option<BloodPressure>,
}

impl ValidatedVitals {
    pub fn bmi(&self) -> Option<f64> {
        match (self.weight_kg, self.height_m) {
            (Some(weight), Some(height)) => bmi(weight, height),
            _ => None,
        }
    }

    /// Attaches the measurements to a consultation, deriving the BMI once
    /// both weight and height are present.
    pub fn into_vital_signs(self, id: u64, consultation_id: u64) -> VitalSigns {
        let bmi = self.bmi();
        VitalSigns {
            id,
            consultation_id,
            weight_kg: self.weight_kg,
            height_m: self.height_m,
            temperature_c: self.temperature_c,
            heart_rate_bpm: self.heart_rate_bpm,
            respiratory_rate_rpm: self.respiratory_rate_rpm,
            blood_pressure: self.blood_pressure,
            bmi,
        }
    }
}

/// Body mass index rounded to two decimals, or `None` for a non-positive
/// height.
pub fn bmi(weight_kg: f64, height_m: f64) -> Option<f64> {
    if height_m <= 0.0 {
        return None;
    }
    Some(((weight_kg / (height_m * height_m)) * 100.0).round() / 100.0)
}

fn cleaned(value: &Option<String>) -> Option<&str> {
    match value {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        None => None,
    }
}

fn parse_decimal(
    field: &str,
    value: &Option<String>,
    pattern: &Regex,
    shape: &str,
    report: &mut ValidationReport,
) -> Option<f64> {
    let raw = cleaned(value)?;
    if !pattern.is_match(raw) {
        report.push(field, ValidationError::InvalidFieldFormat(field.to_string(), shape.to_string()));
        return None;
    }
    match raw.parse::<f64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            report.push(field, ValidationError::InvalidFieldFormat(field.to_string(), shape.to_string()));
            None
        }
    }
}

fn parse_integer(
    field: &str,
    value: &Option<String>,
    pattern: &Regex,
    shape: &str,
    report: &mut ValidationReport,
) -> Option<u16> {
    let raw = cleaned(value)?;
    if !pattern.is_match(raw) {
        report.push(field, ValidationError::InvalidFieldFormat(field.to_string(), shape.to_string()));
        return None;
    }
    match raw.parse::<u16>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            report.push(field, ValidationError::InvalidFieldFormat(field.to_string(), shape.to_string()));
            None
        }
    }
}

fn parse_blood_pressure(
    value: &Option<String>,
    report: &mut ValidationReport,
) -> Option<BloodPressure> {
    let field = "presion_arterial";
    let raw = cleaned(value)?;
    let invalid = || {
        ValidationError::InvalidFieldFormat(field.to_string(), BLOOD_PRESSURE_SHAPE.to_string())
    };
    match BLOOD_PRESSURE_RE.captures(raw) {
        Some(caps) => {
            let systolic = caps.get(1).and_then(|m| m.as_str().parse::<u16>().ok());
            let diastolic = caps.get(2).and_then(|m| m.as_str().parse::<u16>().ok());
            match (systolic, diastolic) {
                (Some(systolic), Some(diastolic)) => Some(BloodPressure { systolic, diastolic }),
                _ => {
                    report.push(field, invalid());
                    None
                }
            }
        }
        None => {
            report.push(field, invalid());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with(field: &str, value: &str) -> VitalSignsInput {
        let mut input = VitalSignsInput::default();
        let slot = match field {
            "weight" => &mut input.weight,
            "height" => &mut input.height,
            "temperature" => &mut input.temperature,
            "heart_rate" => &mut input.heart_rate,
            "respiratory_rate" => &mut input.respiratory_rate,
            "blood_pressure" => &mut input.blood_pressure,
            other => panic!("unknown field {other}"),
        };
        *slot = Some(value.to_string());
        input
    }

    fn accepts(field: &str, value: &str) -> bool {
        input_with(field, value).validate().is_ok()
    }

    #[test]
    fn should_bound_weight_to_physiologic_range() {
        assert!(accepts("weight", "40"));
        assert!(accepts("weight", "199.9"));
        assert!(accepts("weight", "70.5"));
        assert!(!accepts("weight", "39.9"));
        assert!(!accepts("weight", "200"));
        assert!(!accepts("weight", "70.55"));
    }

    #[test]
    fn should_bound_height_to_physiologic_range() {
        assert!(accepts("height", "1.0"));
        assert!(accepts("height", "1.75"));
        assert!(accepts("height", "2.29"));
        assert!(!accepts("height", "2.3"));
        assert!(!accepts("height", "0.99"));
        assert!(!accepts("height", "1.755"));
    }

    #[test]
    fn should_bound_temperature_to_clinical_range() {
        assert!(accepts("temperature", "35"));
        assert!(accepts("temperature", "37.2"));
        assert!(accepts("temperature", "43.9"));
        assert!(!accepts("temperature", "34.9"));
        assert!(!accepts("temperature", "44"));
        assert!(!accepts("temperature", "59"));
    }

    #[test]
    fn should_bound_heart_rate_to_clinical_range() {
        assert!(accepts("heart_rate", "50"));
        assert!(accepts("heart_rate", "72"));
        assert!(accepts("heart_rate", "100"));
        assert!(!accepts("heart_rate", "49"));
        assert!(!accepts("heart_rate", "101"));
        assert!(!accepts("heart_rate", "200"));
    }

    #[test]
    fn should_bound_respiratory_rate() {
        assert!(accepts("respiratory_rate", "12"));
        assert!(accepts("respiratory_rate", "40"));
        assert!(!accepts("respiratory_rate", "11"));
        assert!(!accepts("respiratory_rate", "41"));
    }

    #[test]
    fn should_parse_blood_pressure_components() {
        let vitals = input_with("blood_pressure", "120/80").validate().unwrap();
        assert_eq!(
            vitals.blood_pressure,
            Some(BloodPressure { systolic: 120, diastolic: 80 })
        );
        assert!(!accepts("blood_pressure", "150/80"));
        assert!(!accepts("blood_pressure", "120/50"));
        assert!(!accepts("blood_pressure", "120-80"));
    }

    #[test]
    fn should_collect_every_failing_field() {
        let input = VitalSignsInput {
            weight: Some("20".to_string()),
            height: Some("3.0".to_string()),
            temperature: None,
            heart_rate: Some("200".to_string()),
            respiratory_rate: None,
            blood_pressure: None,
        };
        let report = input.validate().unwrap_err();
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn should_treat_blank_strings_as_absent() {
        let input = VitalSignsInput {
            weight: Some("  ".to_string()),
            ..VitalSignsInput::default()
        };
        assert!(input.is_empty());
        let vitals = input.validate().unwrap();
        assert_eq!(vitals, ValidatedVitals::default());
    }

    #[test]
    fn should_derive_bmi_from_weight_and_height() {
        let input = VitalSignsInput {
            weight: Some("70.5".to_string()),
            height: Some("1.75".to_string()),
            ..VitalSignsInput::default()
        };
        let validated = input.validate().unwrap();
        assert_eq!(validated.bmi(), Some(23.02));
        let record = validated.into_vital_signs(1, 1);
        assert_eq!(record.bmi, Some(23.02));
    }

    #[test]
    fn should_leave_bmi_empty_without_both_measurements() {
        let input = VitalSignsInput {
            weight: Some("70.5".to_string()),
            ..VitalSignsInput::default()
        };
        let validated = input.validate().unwrap();
        assert_eq!(validated.bmi(), None);
        assert_eq!(bmi(70.0, 0.0), None);
    }

    #[test]
    fn should_format_blood_pressure_as_pair() {
        let bp = BloodPressure { systolic: 110, diastolic: 70 };
        assert_eq!(bp.to_string(), "110/70");
    }
}
