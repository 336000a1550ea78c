// models/src/lib.rs

// Declare all top-level modules within the 'models' crate
pub mod consultations;
pub mod errors;
pub mod history;
pub mod identifiers;
pub mod pagination;
pub mod publications;
pub mod timestamp;
pub mod users;
pub mod vitals;

// Re-export the core types so other crates can use `models::User` etc.
pub use consultations::{
    ComplaintCategory, Consultation, ConsultationFilter, ConsultationView, NewConsultation,
};
pub use errors::{ClinicError, ClinicResult, FieldError, ValidationError, ValidationReport, ValidationResult};
pub use history::{HistoryUpdate, MedicalHistory};
pub use identifiers::UserKey;
pub use pagination::{Page, Paginator};
pub use publications::{NewPublication, Publication};
pub use timestamp::{BincodeDate, BincodeDateTime};
pub use users::{Area, NewUser, Role, Sex, User};
pub use vitals::{BloodPressure, ValidatedVitals, VitalSigns, VitalSignsInput};
