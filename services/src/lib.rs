// services/src/lib.rs

pub mod consultation_service;
pub mod history_service;
pub mod identity_service;
pub mod import_service;
pub mod publication_service;

pub use consultation_service::{
    export_file_name, ConsultationService, ExportRow, PatientProbe, EXPORT_HEADERS,
};
pub use history_service::HistoryService;
pub use identity_service::IdentityService;
pub use import_service::{ImportRowError, ImportService, ImportSummary, IMPORT_HEADERS};
pub use publication_service::PublicationService;
