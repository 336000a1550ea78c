// services/src/import_service.rs

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;

use bcrypt::{hash, DEFAULT_COST};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use models::errors::{ClinicError, ClinicResult, ValidationError};
use models::history::MedicalHistory;
use models::timestamp::{BincodeDate, BincodeDateTime};
use models::users::{parse_birth_date, validate_password_policy, Area, Role, Sex, User};
use models::UserKey;
use storage::config::{IdentityConfig, ImportConfig};
use storage::ClinicStorageEngine;

/// Required CSV columns, also the positional order for [`ImportService::import_rows`].
pub const IMPORT_HEADERS: [&str; 12] = [
    "clave",
    "email",
    "nombres",
    "apellido_paterno",
    "apellido_materno",
    "fecha_nacimiento",
    "sexo",
    "is_active",
    "is_staff",
    "carrera_o_puesto",
    "role",
    "password",
];

/// One rejected row. Rows are numbered from 1, header excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRowError {
    pub row: usize,
    pub message: String,
}

/// Outcome of a bulk import. Counts are always exact; the error list is
/// capped by configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}

// Raw column values of one row, before any typing.
#[derive(Debug, Clone, Default)]
struct RawRow {
    key: String,
    email: String,
    first_names: String,
    paternal_surname: String,
    maternal_surname: String,
    birth_date: String,
    sex: String,
    is_staff: String,
    area_name: String,
    password: String,
}

// A row that parsed cleanly, still unresolved against reference data.
struct ImportRow {
    key: UserKey,
    email: String,
    first_names: String,
    paternal_surname: String,
    maternal_surname: Option<String>,
    birth_date: Option<NaiveDate>,
    sex: Option<Sex>,
    is_staff: bool,
    area_name: String,
    password: Option<String>,
}

enum Prepared {
    Create(User),
    Update(User),
}

/// Create-or-update reconciliation of user rows. Rows fail independently;
/// surviving rows are written in atomic batches.
#[derive(Clone)]
pub struct ImportService {
    storage: Arc<dyn ClinicStorageEngine>,
    identity: IdentityConfig,
    import: ImportConfig,
}

impl ImportService {
    pub fn new(
        storage: Arc<dyn ClinicStorageEngine>,
        identity: IdentityConfig,
        import: ImportConfig,
    ) -> Self {
        ImportService {
            storage,
            identity,
            import,
        }
    }

    /// Imports users from CSV text. The header row must carry every column
    /// of [`IMPORT_HEADERS`]; extra columns are ignored.
    pub async fn import_users<R: io::Read>(&self, reader: R) -> ClinicResult<ImportSummary> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| ClinicError::SerializationError(e.to_string()))?
            .clone();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (index, name) in headers.iter().enumerate() {
            positions.insert(name.to_string(), index);
        }
        for required in IMPORT_HEADERS {
            if !positions.contains_key(required) {
                return Err(ValidationError::MissingField(required.to_string()).into());
            }
        }

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let row_no = index + 1;
            match record {
                Ok(record) => rows.push((row_no, Ok(raw_row_from_record(&record, &positions)))),
                Err(e) => rows.push((row_no, Err(format!("unreadable row: {}", e)))),
            }
        }
        self.reconcile(rows).await
    }

    /// Imports pre-extracted rows whose fields follow the
    /// [`IMPORT_HEADERS`] order, for front-ends that decode spreadsheets
    /// themselves.
    pub async fn import_rows(&self, rows: Vec<Vec<String>>) -> ClinicResult<ImportSummary> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, fields)| (index + 1, Ok(raw_row_from_fields(&fields))))
            .collect();
        self.reconcile(rows).await
    }

    async fn reconcile(
        &self,
        rows: Vec<(usize, Result<RawRow, String>)>,
    ) -> ClinicResult<ImportSummary> {
        let existing: HashMap<String, User> = self
            .storage
            .get_all_users()
            .await?
            .into_iter()
            .map(|u| (u.key.as_str().to_string(), u))
            .collect();
        let areas: HashMap<String, Area> = self
            .storage
            .get_all_areas()
            .await?
            .into_iter()
            .map(|a| (a.name.clone(), a))
            .collect();

        let now = BincodeDateTime::now();
        let mut seen: HashSet<String> = HashSet::new();
        let mut creates: Vec<User> = Vec::new();
        let mut updates: Vec<User> = Vec::new();
        let mut summary = ImportSummary::default();

        for (row_no, raw) in rows {
            let outcome = raw.and_then(|raw| {
                self.prepare(&raw, &areas, &existing, &mut seen, now)
            });
            match outcome {
                Ok(Prepared::Create(user)) => creates.push(user),
                Ok(Prepared::Update(user)) => updates.push(user),
                Err(message) => {
                    summary.failed += 1;
                    if summary.errors.len() < self.import.max_errors {
                        summary.errors.push(ImportRowError { row: row_no, message });
                    }
                }
            }
        }

        summary.created = creates.len();
        summary.updated = updates.len();

        let batch_size = self.import.batch_size.max(1);
        for chunk in creates.chunks(batch_size) {
            self.storage.create_users(chunk.to_vec()).await?;
        }
        for chunk in updates.chunks(batch_size) {
            self.storage.update_users(chunk.to_vec()).await?;
        }

        for user in &creates {
            if user.role == Role::Patient && !user.area.is_medical() {
                let id = MedicalHistory::id_for(&user.key);
                if self.storage.get_history(&id).await?.is_none() {
                    self.storage
                        .upsert_history(MedicalHistory::empty_for(&user.key))
                        .await?;
                }
            }
        }

        info!(
            "Imported users: {} created, {} updated, {} failed",
            summary.created, summary.updated, summary.failed
        );
        Ok(summary)
    }

    fn prepare(
        &self,
        raw: &RawRow,
        areas: &HashMap<String, Area>,
        existing: &HashMap<String, User>,
        seen: &mut HashSet<String>,
        now: BincodeDateTime,
    ) -> Result<Prepared, String> {
        let row = parse_row(raw)?;
        if !seen.insert(row.key.as_str().to_string()) {
            return Err(format!("duplicate key {} in file", row.key));
        }
        let area = areas
            .get(&row.area_name)
            .cloned()
            .ok_or_else(|| format!("unknown area: {}", row.area_name))?;
        // Bulk import never creates administrators; the area decides.
        let role = if area.is_medical() {
            Role::Doctor
        } else {
            Role::Patient
        };

        match existing.get(row.key.as_str()) {
            Some(current) => {
                let mut user = current.clone();
                user.email = row.email;
                user.first_names = row.first_names;
                user.paternal_surname = row.paternal_surname;
                user.maternal_surname = row.maternal_surname;
                user.birth_date = row.birth_date.map(BincodeDate);
                user.sex = row.sex;
                user.is_active = true;
                user.is_staff = row.is_staff;
                user.area = area;
                user.role = role;
                if let Some(password) = row.password {
                    if password != self.identity.default_password {
                        user.password_hash = hash(&password, DEFAULT_COST)
                            .map_err(|_| "could not hash password".to_string())?;
                    }
                }
                user.updated_at = now;
                Ok(Prepared::Update(user))
            }
            None => {
                let password = row
                    .password
                    .unwrap_or_else(|| self.identity.default_password.clone());
                let password_hash = hash(&password, DEFAULT_COST)
                    .map_err(|_| "could not hash password".to_string())?;
                Ok(Prepared::Create(User {
                    key: row.key,
                    email: row.email,
                    first_names: row.first_names,
                    paternal_surname: row.paternal_surname,
                    maternal_surname: row.maternal_surname,
                    birth_date: row.birth_date.map(BincodeDate),
                    sex: row.sex,
                    role,
                    area,
                    is_active: true,
                    is_staff: row.is_staff,
                    password_hash,
                    created_at: now,
                    updated_at: now,
                }))
            }
        }
    }
}

fn raw_row_from_record(record: &csv::StringRecord, positions: &HashMap<String, usize>) -> RawRow {
    let field = |name: &str| -> String {
        positions
            .get(name)
            .and_then(|&index| record.get(index))
            .unwrap_or("")
            .to_string()
    };
    RawRow {
        key: field("clave"),
        email: field("email"),
        first_names: field("nombres"),
        paternal_surname: field("apellido_paterno"),
        maternal_surname: field("apellido_materno"),
        birth_date: field("fecha_nacimiento"),
        sex: field("sexo"),
        is_staff: field("is_staff"),
        area_name: field("carrera_o_puesto"),
        password: field("password"),
    }
}

fn raw_row_from_fields(fields: &[String]) -> RawRow {
    let field = |index: usize| -> String { fields.get(index).cloned().unwrap_or_default() };
    RawRow {
        key: field(0),
        email: field(1),
        first_names: field(2),
        paternal_surname: field(3),
        maternal_surname: field(4),
        birth_date: field(5),
        sex: field(6),
        is_staff: field(8),
        area_name: field(9),
        password: field(11),
    }
}

fn parse_row(raw: &RawRow) -> Result<ImportRow, String> {
    let key = required("clave", &raw.key)?;
    let key = UserKey::new(&key).map_err(|e| e.to_string())?;
    let email = required("email", &raw.email)?;
    let first_names = required("nombres", &raw.first_names)?;
    let paternal_surname = required("apellido_paterno", &raw.paternal_surname)?;
    let area_name = required("carrera_o_puesto", &raw.area_name)?;

    let maternal_surname = blank_to_none(&raw.maternal_surname);
    let birth_date = match blank_to_none(&raw.birth_date) {
        Some(text) => Some(parse_birth_date(&text).map_err(|e| e.to_string())?),
        None => None,
    };
    let sex = match blank_to_none(&raw.sex) {
        Some(text) => Some(text.parse::<Sex>().map_err(|e| e.to_string())?),
        None => None,
    };
    let password = match blank_to_none(&raw.password) {
        Some(explicit) => {
            validate_password_policy(&explicit).map_err(|e| e.to_string())?;
            Some(explicit)
        }
        None => None,
    };

    Ok(ImportRow {
        key,
        email,
        first_names,
        paternal_surname,
        maternal_surname,
        birth_date,
        sex,
        is_staff: raw.is_staff.trim() == "True",
        area_name,
        password,
    })
}

fn required(name: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("missing {}", name))
    } else {
        Ok(trimmed.to_string())
    }
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
