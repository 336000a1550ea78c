// services/src/consultation_service.rs

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use caching::ReadingsCache;
use models::consultations::{
    patient_key_from_display, Consultation, ConsultationFilter, ConsultationView, NewConsultation,
};
use models::errors::{ClinicError, ClinicResult};
use models::pagination::{Page, Paginator};
use models::timestamp::BincodeDateTime;
use models::users::{Role, User};
use models::vitals::{ValidatedVitals, VitalSigns};
use models::UserKey;
use storage::config::PaginationConfig;
use storage::ClinicStorageEngine;

/// Column order of the consultation export.
pub const EXPORT_HEADERS: [&str; 15] = [
    "ID Consulta",
    "Fecha",
    "Paciente",
    "Médico",
    "Categoría de padecimiento",
    "Padecimiento actual",
    "Tratamiento no farmacológico",
    "Tratamiento farmacológico recetado",
    "Peso",
    "Talla",
    "Temperatura",
    "Frecuencia cardíaca",
    "Frecuencia respiratoria",
    "Presión arterial",
    "IMC",
];

/// Outcome of the doctor-side patient probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientProbe {
    #[serde(rename = "clave")]
    pub key: UserKey,
    #[serde(rename = "nombres")]
    pub first_names: String,
}

/// One flattened export line. Field order matches [`EXPORT_HEADERS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub consultation_id: u64,
    pub date: String,
    pub patient: String,
    pub doctor: String,
    pub category: String,
    pub complaint: String,
    pub non_drug_treatment: String,
    pub prescribed_treatment: String,
    pub weight: String,
    pub height: String,
    pub temperature: String,
    pub heart_rate: String,
    pub respiratory_rate: String,
    pub blood_pressure: String,
    pub bmi: String,
}

/// Consultation registration and the role-scoped queries over it.
#[derive(Clone)]
pub struct ConsultationService {
    storage: Arc<dyn ClinicStorageEngine>,
    readings: ReadingsCache,
    pagination: PaginationConfig,
}

impl ConsultationService {
    pub fn new(
        storage: Arc<dyn ClinicStorageEngine>,
        readings: ReadingsCache,
        pagination: PaginationConfig,
    ) -> Self {
        ConsultationService {
            storage,
            readings,
            pagination,
        }
    }

    /// Registers a consultation together with its vitals record. Nothing is
    /// persisted unless every field checks out.
    pub async fn create_consultation(
        &self,
        caller: &User,
        request: NewConsultation,
    ) -> ClinicResult<Consultation> {
        if caller.role != Role::Doctor {
            return Err(ClinicError::PermissionDenied(
                "Only doctors can register consultations".to_string(),
            ));
        }
        let patient = self.resolve_patient(&request.patient_display).await?;

        let mut report = request.validate_texts();
        let validated = match request.vitals.validate() {
            Ok(validated) => validated,
            Err(vitals_report) => {
                report.extend(vitals_report);
                ValidatedVitals::default()
            }
        };
        if let Some(category_id) = request.category_id {
            if self.storage.get_category(category_id).await?.is_none() {
                return Err(ClinicError::ReferenceDataError(format!(
                    "Unknown complaint category: {}",
                    category_id
                )));
            }
        }
        report.into_result()?;

        let consultation = Consultation {
            id: 0,
            created_at: BincodeDateTime::now(),
            complaint: request.complaint.trim().to_string(),
            non_drug_treatment: cleaned_text(request.non_drug_treatment.as_deref()),
            prescribed_treatment: cleaned_text(request.prescribed_treatment.as_deref()),
            category_id: request.category_id,
            patient_key: patient.key.clone(),
            doctor_key: caller.key.clone(),
        };
        let vitals = validated.into_vital_signs(0, 0);
        let (stored, _) = self
            .storage
            .create_consultation_with_vitals(consultation, vitals)
            .await?;
        info!(
            "Doctor {} registered consultation {} for patient {}",
            caller.key, stored.id, stored.patient_key
        );
        Ok(stored)
    }

    /// Lists consultations the caller may see, filtered, newest first and
    /// paginated. Patients only ever see their own; doctors see their own
    /// unless `show_all` widens the listing system-wide.
    pub async fn list_consultations(
        &self,
        caller: &User,
        filter: ConsultationFilter,
    ) -> ClinicResult<Page<ConsultationView>> {
        let mut consultations = self.storage.get_all_consultations().await?;
        match caller.role {
            Role::Patient => consultations.retain(|c| c.patient_key == caller.key),
            Role::Doctor => {
                if filter.show_all {
                    warn!("Doctor {} listed consultations system-wide", caller.key);
                } else {
                    consultations.retain(|c| c.doctor_key == caller.key);
                }
            }
            Role::Administrator => {
                return Err(ClinicError::PermissionDenied(
                    "Only patients and doctors can list consultations".to_string(),
                ))
            }
        }

        if let Some(needle) = cleaned_text(filter.patient_contains.as_deref()) {
            let needle = needle.to_uppercase();
            consultations.retain(|c| c.patient_key.as_str().to_uppercase().contains(&needle));
        }
        if let Some(from) = filter.from {
            consultations.retain(|c| c.created_at.0.date_naive() >= from);
        }
        if let Some(to) = filter.to {
            // The end date runs through the end of that day.
            consultations.retain(|c| c.created_at.0.date_naive() <= to);
        }
        consultations.sort_by(|a, b| b.created_at.0.cmp(&a.created_at.0).then(b.id.cmp(&a.id)));

        let paginator = Paginator::new(self.pagination.consultations_per_page);
        let page = paginator.page(consultations, filter.page.as_deref());

        let users = self.user_index().await?;
        let categories = self.category_index().await?;
        let mut views = Vec::with_capacity(page.items.len());
        for consultation in page.items {
            let vitals = self.storage.get_vitals_for_consultation(consultation.id).await?;
            views.push(build_view(consultation, vitals, &users, &categories));
        }
        Ok(Page {
            items: views,
            number: page.number,
            total_pages: page.total_pages,
            total_items: page.total_items,
            per_page: page.per_page,
        })
    }

    /// Case-insensitive probe for an active patient, used by the intake
    /// form to confirm a key before submission.
    pub async fn find_patient(
        &self,
        caller: &User,
        raw_key: &str,
    ) -> ClinicResult<Option<PatientProbe>> {
        if caller.role != Role::Doctor {
            return Err(ClinicError::PermissionDenied(
                "Only doctors can look up patients".to_string(),
            ));
        }
        let user = self.storage.find_user_by_key_ci(raw_key).await?;
        Ok(user
            .filter(|u| u.is_active && u.role == Role::Patient)
            .map(|u| PatientProbe {
                key: u.key.clone(),
                first_names: u.first_names,
            }))
    }

    /// Flattens every consultation with its vitals and resolved names for
    /// export, newest first.
    pub async fn export_rows(&self, caller: &User) -> ClinicResult<Vec<ExportRow>> {
        if caller.role != Role::Doctor {
            return Err(ClinicError::PermissionDenied(
                "Only doctors can export consultations".to_string(),
            ));
        }
        let users = self.user_index().await?;
        let categories = self.category_index().await?;
        let mut consultations = self.storage.get_all_consultations().await?;
        consultations.sort_by(|a, b| b.created_at.0.cmp(&a.created_at.0).then(b.id.cmp(&a.id)));

        let mut rows = Vec::with_capacity(consultations.len());
        for consultation in consultations {
            let vitals = self.storage.get_vitals_for_consultation(consultation.id).await?;
            rows.push(build_export_row(consultation, vitals, &users, &categories));
        }
        Ok(rows)
    }

    /// Writes the export as CSV, headers included even when there are no
    /// rows. Returns the number of data rows written.
    pub async fn export_csv<W: io::Write>(&self, caller: &User, writer: W) -> ClinicResult<usize> {
        let rows = self.export_rows(caller).await?;
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer
            .write_record(EXPORT_HEADERS)
            .map_err(|e| ClinicError::SerializationError(e.to_string()))?;
        let count = rows.len();
        for row in rows {
            csv_writer
                .serialize(row)
                .map_err(|e| ClinicError::SerializationError(e.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(count)
    }

    /// Stores a device-pushed heart-rate reading for later form prefill.
    pub async fn record_reading(&self, device_id: &str, bpm: u16) {
        self.readings.record_reading(device_id.to_string(), bpm).await;
    }

    /// The freshest reading for a device, if one is still within its TTL.
    pub async fn latest_reading(&self, device_id: &str) -> Option<u16> {
        self.readings.latest_reading(device_id).await
    }

    async fn resolve_patient(&self, display: &str) -> ClinicResult<User> {
        let raw_key = patient_key_from_display(display);
        match self.storage.find_user_by_key_ci(raw_key).await? {
            Some(user) if user.is_active && user.role == Role::Patient => Ok(user),
            _ => Err(ClinicError::NotFound(format!("Active patient {}", raw_key))),
        }
    }

    async fn user_index(&self) -> ClinicResult<HashMap<String, User>> {
        Ok(self
            .storage
            .get_all_users()
            .await?
            .into_iter()
            .map(|u| (u.key.as_str().to_string(), u))
            .collect())
    }

    async fn category_index(&self) -> ClinicResult<HashMap<u64, String>> {
        Ok(self
            .storage
            .get_all_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect())
    }
}

/// Export file name carrying the generation instant.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("consultas_medicas_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

fn cleaned_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn full_name(user: &User) -> String {
    let mut name = format!("{} {}", user.first_names, user.paternal_surname);
    if let Some(maternal) = &user.maternal_surname {
        name.push(' ');
        name.push_str(maternal);
    }
    name
}

fn build_view(
    consultation: Consultation,
    vitals: Option<VitalSigns>,
    users: &HashMap<String, User>,
    categories: &HashMap<u64, String>,
) -> ConsultationView {
    let patient = users
        .get(consultation.patient_key.as_str())
        .map(|u| u.display_name())
        .unwrap_or_else(|| consultation.patient_key.as_str().to_string());
    let doctor = users
        .get(consultation.doctor_key.as_str())
        .map(|u| u.display_name())
        .unwrap_or_else(|| consultation.doctor_key.as_str().to_string());
    let category = consultation
        .category_id
        .and_then(|id| categories.get(&id).cloned());
    ConsultationView {
        id: consultation.id,
        created_at: consultation.created_at,
        patient,
        doctor,
        category,
        complaint: consultation.complaint,
        non_drug_treatment: consultation.non_drug_treatment,
        prescribed_treatment: consultation.prescribed_treatment,
        vitals,
    }
}

fn build_export_row(
    consultation: Consultation,
    vitals: Option<VitalSigns>,
    users: &HashMap<String, User>,
    categories: &HashMap<u64, String>,
) -> ExportRow {
    let patient = users
        .get(consultation.patient_key.as_str())
        .map(full_name)
        .unwrap_or_else(|| "—".to_string());
    let doctor = users
        .get(consultation.doctor_key.as_str())
        .map(full_name)
        .unwrap_or_else(|| "—".to_string());
    let category = consultation
        .category_id
        .and_then(|id| categories.get(&id).cloned())
        .unwrap_or_else(|| "—".to_string());
    let vitals = vitals.unwrap_or(VitalSigns {
        id: 0,
        consultation_id: consultation.id,
        weight_kg: None,
        height_m: None,
        temperature_c: None,
        heart_rate_bpm: None,
        respiratory_rate_rpm: None,
        blood_pressure: None,
        bmi: None,
    });
    ExportRow {
        consultation_id: consultation.id,
        date: consultation.created_at.0.format("%Y-%m-%d %H:%M").to_string(),
        patient,
        doctor,
        category,
        complaint: consultation.complaint,
        non_drug_treatment: consultation.non_drug_treatment.unwrap_or_default(),
        prescribed_treatment: consultation.prescribed_treatment.unwrap_or_default(),
        weight: format_opt(vitals.weight_kg),
        height: format_opt(vitals.height_m),
        temperature: format_opt(vitals.temperature_c),
        heart_rate: format_opt(vitals.heart_rate_bpm),
        respiratory_rate: format_opt(vitals.respiratory_rate_rpm),
        blood_pressure: vitals
            .blood_pressure
            .map(|bp| bp.to_string())
            .unwrap_or_default(),
        bmi: format_opt(vitals.bmi),
    }
}

fn format_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use models::timestamp::BincodeDate;
    use models::users::{Area, Sex};
    use models::vitals::VitalSignsInput;
    use std::time::Duration;
    use storage::InMemoryStorage;

    fn make_user(key: &str, role: Role, area: &str) -> User {
        let now = BincodeDateTime::now();
        User {
            key: UserKey::new(key).expect("valid key"),
            email: format!("{}@itsatlixco.edu.mx", key.to_lowercase()),
            first_names: "MARIA".to_string(),
            paternal_surname: "LOPEZ".to_string(),
            maternal_surname: Some("RIVERA".to_string()),
            birth_date: NaiveDate::from_ymd_opt(2000, 5, 1).map(BincodeDate),
            sex: Some(Sex::Female),
            role,
            area: Area::new(area),
            is_active: true,
            is_staff: false,
            password_hash: "hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    async fn setup() -> (ConsultationService, Arc<InMemoryStorage>) {
        let storage = Arc::new(InMemoryStorage::new());
        storage.bootstrap().await.expect("bootstrap");
        let doctor = make_user("1001", Role::Doctor, "Médico");
        let patient = make_user("ISC210345", Role::Patient, "Ingeniería en Sistemas Computacionales");
        let other = make_user("II210001", Role::Patient, "Ingeniería Industrial");
        storage.create_user(doctor).await.expect("doctor");
        storage.create_user(patient).await.expect("patient");
        storage.create_user(other).await.expect("other patient");
        let service = ConsultationService::new(
            storage.clone(),
            ReadingsCache::new(16, Duration::from_secs(60)),
            PaginationConfig::default(),
        );
        (service, storage)
    }

    fn request_for(display: &str) -> NewConsultation {
        NewConsultation {
            patient_display: display.to_string(),
            complaint: "Dolor de garganta".to_string(),
            non_drug_treatment: Some("Reposo e hidratación".to_string()),
            prescribed_treatment: None,
            category_id: Some(1),
            vitals: VitalSignsInput {
                weight: Some("70.5".to_string()),
                height: Some("1.75".to_string()),
                ..VitalSignsInput::default()
            },
        }
    }

    #[tokio::test]
    async fn should_reject_non_doctor_callers() {
        let (service, storage) = setup().await;
        let patient = storage
            .get_user(&UserKey::new("ISC210345").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        let result = service
            .create_consultation(&patient, request_for("II210001"))
            .await;
        assert!(matches!(result, Err(ClinicError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn should_resolve_patient_from_display_string() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        let stored = service
            .create_consultation(&doctor, request_for(" isc210345 - MARIA LOPEZ RIVERA"))
            .await
            .expect("create");
        assert_eq!(stored.patient_key.as_str(), "ISC210345");
        assert_eq!(stored.doctor_key.as_str(), "1001");
        let vitals = storage
            .get_vitals_for_consultation(stored.id)
            .await
            .expect("vitals lookup")
            .expect("vitals present");
        assert_eq!(vitals.bmi, Some(23.02));
    }

    #[tokio::test]
    async fn should_persist_nothing_when_vitals_fail() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        let mut request = request_for("ISC210345");
        request.vitals.heart_rate = Some("200".to_string());
        let result = service.create_consultation(&doctor, request).await;
        assert!(matches!(result, Err(ClinicError::ValidationFailed(_))));
        assert!(storage
            .get_all_consultations()
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn should_reject_unknown_patient_or_category() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");

        let missing_patient = service
            .create_consultation(&doctor, request_for("MI9999"))
            .await;
        assert!(matches!(missing_patient, Err(ClinicError::NotFound(_))));

        let mut request = request_for("ISC210345");
        request.category_id = Some(99);
        let missing_category = service.create_consultation(&doctor, request).await;
        assert!(matches!(missing_category, Err(ClinicError::ReferenceDataError(_))));
    }

    #[tokio::test]
    async fn should_scope_patient_listings_to_their_own_records() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        service
            .create_consultation(&doctor, request_for("ISC210345"))
            .await
            .expect("first");
        service
            .create_consultation(&doctor, request_for("II210001"))
            .await
            .expect("second");

        let patient = storage
            .get_user(&UserKey::new("ISC210345").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        let filter = ConsultationFilter {
            show_all: true,
            ..ConsultationFilter::default()
        };
        let page = service
            .list_consultations(&patient, filter)
            .await
            .expect("list");
        assert_eq!(page.total_items, 1);
        assert!(page.items[0].patient.starts_with("ISC210345"));
    }

    #[tokio::test]
    async fn should_let_doctors_widen_listing_with_show_all() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        let second_doctor = make_user("1002", Role::Doctor, "Médico");
        storage.create_user(second_doctor.clone()).await.expect("second doctor");
        service
            .create_consultation(&doctor, request_for("ISC210345"))
            .await
            .expect("create");

        let own = service
            .list_consultations(&second_doctor, ConsultationFilter::default())
            .await
            .expect("own listing");
        assert_eq!(own.total_items, 0);

        let widened = service
            .list_consultations(
                &second_doctor,
                ConsultationFilter {
                    show_all: true,
                    ..ConsultationFilter::default()
                },
            )
            .await
            .expect("widened listing");
        assert_eq!(widened.total_items, 1);

        let admin = make_user("admin1", Role::Administrator, "ADMINISTRATIVO");
        storage.create_user(admin.clone()).await.expect("admin");
        let denied = service
            .list_consultations(&admin, ConsultationFilter::default())
            .await;
        assert!(matches!(denied, Err(ClinicError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn should_filter_dates_at_day_granularity() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        let days = [
            Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 0).single().expect("date"),
            Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 1).single().expect("date"),
            Utc.with_ymd_and_hms(2026, 3, 10, 23, 59, 59).single().expect("date"),
            Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).single().expect("date"),
        ];
        for at in days {
            let consultation = Consultation {
                id: 0,
                created_at: BincodeDateTime(at),
                complaint: "Revisión".to_string(),
                non_drug_treatment: None,
                prescribed_treatment: None,
                category_id: None,
                patient_key: UserKey::new("ISC210345").expect("key"),
                doctor_key: doctor.key.clone(),
            };
            let vitals = VitalSignsInput::default()
                .validate()
                .expect("empty vitals")
                .into_vital_signs(0, 0);
            storage
                .create_consultation_with_vitals(consultation, vitals)
                .await
                .expect("create");
        }

        let filter = ConsultationFilter {
            from: NaiveDate::from_ymd_opt(2026, 3, 10),
            to: NaiveDate::from_ymd_opt(2026, 3, 10),
            ..ConsultationFilter::default()
        };
        let page = service
            .list_consultations(&doctor, filter)
            .await
            .expect("list");
        assert_eq!(page.total_items, 2);
        assert!(page
            .items
            .iter()
            .all(|v| v.created_at.0.date_naive() == NaiveDate::from_ymd_opt(2026, 3, 10).expect("date")));
    }

    #[tokio::test]
    async fn should_clamp_listing_pages() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        for _ in 0..45 {
            service
                .create_consultation(&doctor, request_for("ISC210345"))
                .await
                .expect("create");
        }
        let overflowing = service
            .list_consultations(
                &doctor,
                ConsultationFilter {
                    page: Some("99".to_string()),
                    ..ConsultationFilter::default()
                },
            )
            .await
            .expect("list");
        assert_eq!(overflowing.total_pages, 3);
        assert_eq!(overflowing.number, 3);
        assert_eq!(overflowing.items.len(), 5);

        let junk = service
            .list_consultations(
                &doctor,
                ConsultationFilter {
                    page: Some("abc".to_string()),
                    ..ConsultationFilter::default()
                },
            )
            .await
            .expect("list");
        assert_eq!(junk.number, 1);
    }

    #[tokio::test]
    async fn should_probe_only_active_patients() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");

        let found = service
            .find_patient(&doctor, "isc210345")
            .await
            .expect("probe");
        assert_eq!(
            found,
            Some(PatientProbe {
                key: UserKey::new("ISC210345").expect("key"),
                first_names: "MARIA".to_string(),
            })
        );

        let mut inactive = make_user("MI210009", Role::Patient, "M. en Ingeniería");
        inactive.is_active = false;
        storage.create_user(inactive).await.expect("inactive patient");
        let hidden = service
            .find_patient(&doctor, "MI210009")
            .await
            .expect("probe");
        assert_eq!(hidden, None);

        let missing = service.find_patient(&doctor, "LG9999").await.expect("probe");
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn should_export_with_placeholders_for_missing_references() {
        let (service, storage) = setup().await;
        let doctor = storage
            .get_user(&UserKey::new("1001").expect("key"))
            .await
            .expect("lookup")
            .expect("present");
        service
            .create_consultation(&doctor, request_for("ISC210345"))
            .await
            .expect("create");
        storage.delete_category(1).await.expect("delete category");

        let rows = service.export_rows(&doctor).await.expect("rows");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.category, "—");
        assert_eq!(row.patient, "MARIA LOPEZ RIVERA");
        assert_eq!(row.prescribed_treatment, "");
        assert_eq!(row.weight, "70.5");
        assert_eq!(row.bmi, "23.02");

        let mut buffer = Vec::new();
        let written = service.export_csv(&doctor, &mut buffer).await.expect("csv");
        assert_eq!(written, 1);
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.starts_with("ID Consulta,Fecha,Paciente"));
        assert!(text.contains("MARIA LOPEZ RIVERA"));
    }

    #[test]
    fn should_stamp_export_file_name() {
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 14, 5, 9).single().expect("date");
        assert_eq!(export_file_name(at), "consultas_medicas_20260310_140509.csv");
    }
}
