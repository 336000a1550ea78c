use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use bincode::{Encode, Decode};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::UserKey;
use crate::timestamp::{BincodeDate, BincodeDateTime};

/// External date format for birth dates (import files and CLI arguments).
pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";
pub const MIN_PATIENT_AGE_YEARS: u32 = 15;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 15;
pub const PASSWORD_SPECIALS: &str = "@$!%#?&ñ_";

/// Name of the area every medical-staff user belongs to.
pub const MEDICAL_AREA: &str = "Médico";
/// Name of the back-office area administrator accounts belong to.
pub const ADMINISTRATIVE_AREA: &str = "ADMINISTRATIVO";

// Accepted addresses: prefixed student keys with six digits, worker numbers,
// or firstname.lastname, all at the institutional domain, plus admin accounts.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:(?:am|bie|bis|blg|cie|cii|ib|ie|ii|im|isc|lg|mi|mxi|mxm|mxs)\d{6}|\d{4,6}|[A-Za-z]+(?:\.[A-Za-z]+))@itsatlixco\.edu\.mx|admin\d@admin\.com)$")
        .unwrap()
});

// One or two uppercase words, accented vowels and enye allowed.
static GIVEN_NAMES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-ZÑÁÉÍÓÚ][A-ZÑÁÉÍÓÚ]+)( [A-ZÑÁÉÍÓÚ][A-ZÑÁÉÍÓÚ]+)?$").unwrap()
});

static SURNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-ZÑÁÉÍÓÚ][A-ZÑÁÉÍÓÚ]+$").unwrap()
});

/// Access level of an account. The set is closed, so a record can never
/// reference a role that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum Role {
    #[serde(rename = "paciente")]
    Patient,
    #[serde(rename = "medico")]
    Doctor,
    #[serde(rename = "administrador")]
    Administrator,
}

impl Role {
    pub fn description(&self) -> &'static str {
        match self {
            Role::Patient => "Paciente de la clínica",
            Role::Doctor => "Personal médico",
            Role::Administrator => "Administrador del sistema",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Patient => "paciente",
            Role::Doctor => "medico",
            Role::Administrator => "administrador",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Role {
    type Err = ValidationError;
    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "paciente" | "patient" => Ok(Role::Patient),
            "medico" | "médico" | "doctor" => Ok(Role::Doctor),
            "administrador" | "admin" | "administrator" => Ok(Role::Administrator),
            _ => Err(ValidationError::InvalidRole(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "M"),
            Sex::Female => write!(f, "F"),
        }
    }
}

impl FromStr for Sex {
    type Err = ValidationError;
    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" => Ok(Sex::Male),
            "f" => Ok(Sex::Female),
            _ => Err(ValidationError::InvalidSex(s.to_string())),
        }
    }
}

/// Institutional career or job title. Areas are reference data: seeded once
/// at bootstrap and resolved by exact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Area {
    #[serde(rename = "carrera_o_puesto")]
    pub name: String,
}

impl Area {
    pub fn new(name: &str) -> Self {
        Area { name: name.to_string() }
    }

    pub fn is_medical(&self) -> bool {
        self.name == MEDICAL_AREA
    }

    pub fn is_administrative(&self) -> bool {
        self.name == ADMINISTRATIVE_AREA
    }

    /// The fixed institutional catalog written at storage bootstrap.
    pub fn default_catalog() -> Vec<Area> {
        [
            "Ingeniería Industrial",
            "Ingeniería en Sistemas Computacionales",
            "Ingeniería Mecatrónica",
            "Ingeniería Bioquímica",
            "Ingeniería Electromecánica",
            "Licenciatura en Gastronomía",
            "M. en Ingeniería",
            "Maestría en IA",
            MEDICAL_AREA,
            ADMINISTRATIVE_AREA,
        ]
        .iter()
        .map(|name| Area::new(name))
        .collect()
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A clinic account. Deactivation flips `is_active`; records are never
/// deleted so consultation history keeps its author and patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct User {
    #[serde(rename = "clave")]
    pub key: UserKey,
    pub email: String,
    #[serde(rename = "nombres")]
    pub first_names: String,
    #[serde(rename = "apellido_paterno")]
    pub paternal_surname: String,
    #[serde(rename = "apellido_materno")]
    pub maternal_surname: Option<String>,
    #[serde(rename = "fecha_nacimiento")]
    pub birth_date: Option<BincodeDate>,
    #[serde(rename = "sexo")]
    pub sex: Option<Sex>,
    pub role: Role,
    #[serde(rename = "carrera_o_puesto")]
    pub area: Area,
    pub is_active: bool,
    pub is_staff: bool,
    pub password_hash: String,
    pub created_at: BincodeDateTime,
    pub updated_at: BincodeDateTime,
}

impl User {
    /// "KEY - GIVEN PATERNAL MATERNAL", the form shown in consultation and
    /// history listings. The key part before the first dash is what
    /// patient pickers hand back.
    pub fn display_name(&self) -> String {
        let mut name = format!("{} - {} {}", self.key, self.first_names, self.paternal_surname);
        if let Some(maternal) = &self.maternal_surname {
            name.push(' ');
            name.push_str(maternal);
        }
        name
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?.0;
        u32::try_from(age_in_years(birth, today)).ok()
    }
}

/// Input for user creation, carrying raw external strings before any
/// validation or normalization has happened.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub key: String,
    pub email: String,
    pub first_names: String,
    pub paternal_surname: String,
    pub maternal_surname: Option<String>,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
    pub role: Option<String>,
    pub area: String,
    pub is_staff: bool,
    pub password: Option<String>,
}

pub fn validate_email(email: &str) -> ValidationResult<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

pub fn validate_given_names(value: &str) -> ValidationResult<()> {
    if GIVEN_NAMES_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFieldFormat(
            "nombres".to_string(),
            "one or two uppercase words".to_string(),
        ))
    }
}

pub fn validate_surname(field: &str, value: &str) -> ValidationResult<()> {
    if SURNAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFieldFormat(
            field.to_string(),
            "an uppercase word of at least two letters".to_string(),
        ))
    }
}

/// Password policy: 8 to 15 characters, at least one uppercase letter, one
/// lowercase letter, one digit and one special character, drawn only from
/// the allowed set.
pub fn validate_password_policy(password: &str) -> ValidationResult<()> {
    let length = password.chars().count();
    if length < PASSWORD_MIN_LEN || length > PASSWORD_MAX_LEN {
        return Err(ValidationError::InvalidPassword(format!(
            "must be {} to {} characters long",
            PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
        )));
    }
    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;
    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if PASSWORD_SPECIALS.contains(c) {
            has_special = true;
        } else {
            return Err(ValidationError::InvalidPassword(format!(
                "character '{}' is not allowed",
                c
            )));
        }
    }
    if !has_upper {
        return Err(ValidationError::InvalidPassword("must contain an uppercase letter".to_string()));
    }
    if !has_lower {
        return Err(ValidationError::InvalidPassword("must contain a lowercase letter".to_string()));
    }
    if !has_digit {
        return Err(ValidationError::InvalidPassword("must contain a digit".to_string()));
    }
    if !has_special {
        return Err(ValidationError::InvalidPassword(format!(
            "must contain one of {}",
            PASSWORD_SPECIALS
        )));
    }
    Ok(())
}

pub fn parse_birth_date(raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), BIRTH_DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDateFormat(raw.to_string()))
}

/// Whole years between `birth` and `today`, counting a year only once the
/// birthday has passed.
pub fn age_in_years(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub fn validate_birth_date(birth: NaiveDate, role: Role, today: NaiveDate) -> ValidationResult<()> {
    if birth > today {
        return Err(ValidationError::BirthDateInFuture);
    }
    if role == Role::Patient && age_in_years(birth, today) < MIN_PATIENT_AGE_YEARS as i32 {
        return Err(ValidationError::PatientTooYoung(MIN_PATIENT_AGE_YEARS));
    }
    Ok(())
}

/// Doctors must sit in the medical area and administrators in the
/// administrative one. Other combinations are left alone.
pub fn validate_role_area(role: Role, area: &Area) -> ValidationResult<()> {
    match role {
        Role::Doctor if !area.is_medical() => Err(ValidationError::RoleAreaMismatch(
            role.to_string(),
            area.name.clone(),
        )),
        Role::Administrator if !area.is_administrative() => Err(ValidationError::RoleAreaMismatch(
            role.to_string(),
            area.name.clone(),
        )),
        _ => Ok(()),
    }
}

// Academic key prefixes and the fragment the area name must contain,
// longest prefix first so MIA is not swallowed by MI.
const KEY_PREFIX_AREAS: [(&str, &str); 8] = [
    ("MIA", "MAESTRÍA EN IA"),
    ("ISC", "SISTEMAS"),
    ("II", "INDUSTRIAL"),
    ("IM", "MECATRÓNICA"),
    ("IB", "BIOQUÍMICA"),
    ("IE", "ELECTROMECÁNICA"),
    ("LG", "GASTRONOMÍA"),
    ("MI", "M. EN INGENIERÍA"),
];

pub fn validate_key_prefix_area(key: &UserKey, area: &Area) -> ValidationResult<()> {
    let area_upper = area.name.to_uppercase();
    for (prefix, fragment) in KEY_PREFIX_AREAS {
        if key.starts_with(prefix) {
            if area_upper.contains(fragment) {
                return Ok(());
            }
            return Err(ValidationError::KeyAreaMismatch(
                prefix.to_string(),
                area.name.clone(),
            ));
        }
    }
    Ok(())
}
