// services/src/identity_service.rs

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use log::{debug, info};

use models::errors::{ClinicError, ClinicResult, ValidationError, ValidationReport};
use models::history::MedicalHistory;
use models::timestamp::{BincodeDate, BincodeDateTime};
use models::users::{
    parse_birth_date, validate_birth_date, validate_email, validate_given_names,
    validate_key_prefix_area, validate_password_policy, validate_role_area, validate_surname,
    NewUser, Role, Sex, User,
};
use models::UserKey;
use storage::config::{IdentityConfig, LoginField};
use storage::ClinicStorageEngine;

/// Account management: creation, login verification, password changes and
/// the medical-history bookkeeping that follows patient accounts around.
#[derive(Clone)]
pub struct IdentityService {
    storage: Arc<dyn ClinicStorageEngine>,
    config: IdentityConfig,
}

impl IdentityService {
    pub fn new(storage: Arc<dyn ClinicStorageEngine>, config: IdentityConfig) -> Self {
        IdentityService { storage, config }
    }

    /// Validates and persists a new account. Field problems are collected
    /// into one report so a form round-trip shows everything at once. The
    /// caller decides when to follow up with [`ensure_history_for`].
    ///
    /// [`ensure_history_for`]: IdentityService::ensure_history_for
    pub async fn create_user(&self, input: NewUser) -> ClinicResult<User> {
        let area = self.storage.get_area(&input.area).await?.ok_or_else(|| {
            ClinicError::ReferenceDataError(format!("Unknown area: {}", input.area))
        })?;

        let mut report = ValidationReport::new();

        let key = match UserKey::new(&input.key) {
            Ok(key) => Some(key),
            Err(error) => {
                report.push("clave", error);
                None
            }
        };

        let email = input.email.trim().to_string();
        if let Err(error) = validate_email(&email) {
            report.push("email", error);
        }
        if let Err(error) = validate_given_names(&input.first_names) {
            report.push("nombres", error);
        }
        if let Err(error) = validate_surname("apellido_paterno", &input.paternal_surname) {
            report.push("apellido_paterno", error);
        }
        let maternal_surname = trimmed_opt(input.maternal_surname.as_deref());
        if let Some(maternal) = &maternal_surname {
            if let Err(error) = validate_surname("apellido_materno", maternal) {
                report.push("apellido_materno", error);
            }
        }

        let role = match &input.role {
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(error) => {
                    report.push("role", error);
                    None
                }
            },
            None if area.is_medical() => Some(Role::Doctor),
            None => Some(Role::Patient),
        };

        let sex = match trimmed_opt(input.sex.as_deref()) {
            Some(raw) => match raw.parse::<Sex>() {
                Ok(sex) => Some(sex),
                Err(error) => {
                    report.push("sexo", error);
                    None
                }
            },
            None => None,
        };

        let birth_date = match trimmed_opt(input.birth_date.as_deref()) {
            Some(raw) => match parse_birth_date(&raw) {
                Ok(date) => {
                    if let Some(role) = role {
                        if let Err(error) = validate_birth_date(date, role, Utc::now().date_naive())
                        {
                            report.push("fecha_nacimiento", error);
                        }
                    }
                    Some(date)
                }
                Err(error) => {
                    report.push("fecha_nacimiento", error);
                    None
                }
            },
            None => None,
        };

        if let (Some(key), Some(role)) = (&key, role) {
            if let Err(error) = validate_role_area(role, &area) {
                report.push("role", error);
            }
            if let Err(error) = validate_key_prefix_area(key, &area) {
                report.push("clave", error);
            }
        }

        let password = match trimmed_opt(input.password.as_deref()) {
            Some(explicit) => {
                if let Err(error) = validate_password_policy(&explicit) {
                    report.push("password", error);
                }
                explicit
            }
            None => self.config.default_password.clone(),
        };

        report.into_result()?;
        let key = key.ok_or_else(|| {
            ClinicError::InternalError("key missing after validation".to_string())
        })?;
        let role = role.ok_or_else(|| {
            ClinicError::InternalError("role missing after validation".to_string())
        })?;

        if self.storage.get_user(&key).await?.is_some() {
            return Err(ClinicError::AlreadyExists(format!(
                "User with key {} already exists",
                key
            )));
        }
        if self.storage.find_user_by_email(&email).await?.is_some() {
            return Err(ClinicError::AlreadyExists(format!(
                "Email {} is already registered",
                email
            )));
        }

        let password_hash = hash(&password, DEFAULT_COST)
            .map_err(|_| ClinicError::from(ValidationError::PasswordHashingFailed))?;
        let now = BincodeDateTime::now();
        let user = User {
            key,
            email,
            first_names: input.first_names.trim().to_string(),
            paternal_surname: input.paternal_surname.trim().to_string(),
            maternal_surname,
            birth_date: birth_date.map(BincodeDate),
            sex,
            role,
            area,
            is_active: true,
            is_staff: input.is_staff,
            password_hash,
            created_at: now,
            updated_at: now,
        };
        self.storage.create_user(user.clone()).await?;
        info!("Created user {} with role {}", user.key, user.role);
        Ok(user)
    }

    /// Creates the empty medical history a qualifying patient account owns.
    /// Qualifying means role patient outside the medical-staff area. Returns
    /// whether a history was created.
    pub async fn ensure_history_for(&self, user: &User) -> ClinicResult<bool> {
        if user.role != Role::Patient || user.area.is_medical() {
            return Ok(false);
        }
        let id = MedicalHistory::id_for(&user.key);
        if self.storage.get_history(&id).await?.is_some() {
            return Ok(false);
        }
        self.storage
            .upsert_history(MedicalHistory::empty_for(&user.key))
            .await?;
        debug!("Created empty medical history {}", id);
        Ok(true)
    }

    /// Looks an account up by its key, tolerating case and stray spaces.
    pub async fn find_user(&self, raw_key: &str) -> ClinicResult<Option<User>> {
        self.storage.find_user_by_key_ci(raw_key).await
    }

    /// Verifies a login against the configured field first, then the other
    /// one. Inactive accounts and wrong passwords both come back as `None`.
    pub async fn authenticate(&self, login: &str, password: &str) -> ClinicResult<Option<User>> {
        let login = login.trim();
        let user = match self.config.login_field {
            LoginField::Key => match self.storage.find_user_by_key_ci(login).await? {
                Some(user) => Some(user),
                None => self.storage.find_user_by_email(login).await?,
            },
            LoginField::Email => match self.storage.find_user_by_email(login).await? {
                Some(user) => Some(user),
                None => self.storage.find_user_by_key_ci(login).await?,
            },
        };
        let user = match user {
            Some(user) => user,
            None => return Ok(None),
        };
        if !user.is_active {
            debug!("Rejected login for inactive user {}", user.key);
            return Ok(None);
        }
        let verified = verify(password, &user.password_hash)
            .map_err(|_| ClinicError::from(ValidationError::PasswordVerificationFailed))?;
        if verified {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn change_password(
        &self,
        key: &UserKey,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> ClinicResult<()> {
        let mut user = self
            .storage
            .get_user(key)
            .await?
            .ok_or_else(|| ClinicError::NotFound(format!("User {}", key)))?;

        let mut report = ValidationReport::new();
        let current_ok = verify(current, &user.password_hash)
            .map_err(|_| ClinicError::from(ValidationError::PasswordVerificationFailed))?;
        if !current_ok {
            report.push("contrasena_actual", ValidationError::PasswordVerificationFailed);
        }
        if let Err(error) = validate_password_policy(new_password) {
            report.push("nueva_contrasena", error);
        }
        if new_password != confirm {
            report.push(
                "confirmar_contrasena",
                ValidationError::PasswordConfirmationMismatch,
            );
        }
        report.into_result()?;

        user.password_hash = hash(new_password, DEFAULT_COST)
            .map_err(|_| ClinicError::from(ValidationError::PasswordHashingFailed))?;
        user.updated_at = BincodeDateTime::now();
        self.storage.update_user(user).await?;
        info!("Password changed for {}", key);
        Ok(())
    }

    /// Creates histories for qualifying patients that lack one and returns
    /// how many were created.
    pub async fn backfill_histories(&self) -> ClinicResult<usize> {
        let mut created = 0;
        for user in self.storage.get_all_users().await? {
            if self.ensure_history_for(&user).await? {
                created += 1;
            }
        }
        info!("Backfilled {} missing medical histories", created);
        Ok(created)
    }
}

fn trimmed_opt(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use storage::InMemoryStorage;

    async fn service() -> IdentityService {
        let storage = Arc::new(InMemoryStorage::new());
        storage.bootstrap().await.expect("bootstrap");
        IdentityService::new(storage, IdentityConfig::default())
    }

    fn patient_input(key: &str) -> NewUser {
        NewUser {
            key: key.to_string(),
            email: format!("{}@itsatlixco.edu.mx", key.to_lowercase()),
            first_names: "MARÍA JOSÉ".to_string(),
            paternal_surname: "LÓPEZ".to_string(),
            maternal_surname: Some("RIVERA".to_string()),
            birth_date: Some("15/03/2000".to_string()),
            sex: Some("F".to_string()),
            role: None,
            area: "Ingeniería en Sistemas Computacionales".to_string(),
            is_staff: false,
            password: None,
        }
    }

    #[tokio::test]
    async fn should_create_patient_with_default_password() {
        let service = service().await;
        let user = service
            .create_user(patient_input("isc210345"))
            .await
            .expect("create");
        assert_eq!(user.key.as_str(), "ISC210345");
        assert_eq!(user.role, Role::Patient);
        assert!(user.is_active);
        assert!(verify("P@ssword123", &user.password_hash).expect("verify"));
    }

    #[tokio::test]
    async fn should_collect_all_field_errors_at_once() {
        let service = service().await;
        let mut input = patient_input("isc210345");
        input.key = "XX99".to_string();
        input.email = "nobody@gmail.com".to_string();
        let recent_year = Utc::now().year() - 10;
        input.birth_date = Some(format!("01/01/{}", recent_year));
        let result = service.create_user(input).await;
        match result {
            Err(ClinicError::ValidationFailed(report)) => assert_eq!(report.len(), 3),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn should_derive_doctor_role_from_medical_area() {
        let service = service().await;
        let mut input = patient_input("admin2");
        input.key = "1001".to_string();
        input.email = "1001@itsatlixco.edu.mx".to_string();
        input.area = "Médico".to_string();
        input.birth_date = Some("20/07/1985".to_string());
        let user = service.create_user(input).await.expect("create doctor");
        assert_eq!(user.role, Role::Doctor);
        assert!(!service.ensure_history_for(&user).await.expect("history check"));
    }

    #[tokio::test]
    async fn should_reject_unknown_area() {
        let service = service().await;
        let mut input = patient_input("isc210345");
        input.area = "Astronomía".to_string();
        let result = service.create_user(input).await;
        assert!(matches!(result, Err(ClinicError::ReferenceDataError(_))));
    }

    #[tokio::test]
    async fn should_create_history_once_for_patient() {
        let service = service().await;
        let user = service
            .create_user(patient_input("isc210345"))
            .await
            .expect("create");
        assert!(service.ensure_history_for(&user).await.expect("first"));
        assert!(!service.ensure_history_for(&user).await.expect("second"));
    }

    #[tokio::test]
    async fn should_authenticate_with_fallback_lookup() {
        let service = service().await;
        let mut input = patient_input("isc210345");
        input.password = Some("Str0ng@Pass".to_string());
        service.create_user(input).await.expect("create");

        let by_key = service
            .authenticate(" isc210345 ", "Str0ng@Pass")
            .await
            .expect("key login");
        assert!(by_key.is_some());

        let by_email = service
            .authenticate("isc210345@itsatlixco.edu.mx", "Str0ng@Pass")
            .await
            .expect("email login");
        assert!(by_email.is_some());

        let wrong = service
            .authenticate("isc210345", "Wr0ng@Pass1")
            .await
            .expect("wrong password");
        assert!(wrong.is_none());
    }

    #[tokio::test]
    async fn should_never_authenticate_inactive_users() {
        let service = service().await;
        let mut user = service
            .create_user(patient_input("isc210345"))
            .await
            .expect("create");
        user.is_active = false;
        service.storage.update_user(user).await.expect("deactivate");

        let result = service
            .authenticate("isc210345", "P@ssword123")
            .await
            .expect("login attempt");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_change_password_after_verifying_current() {
        let service = service().await;
        let user = service
            .create_user(patient_input("isc210345"))
            .await
            .expect("create");

        let wrong_current = service
            .change_password(&user.key, "Wr0ng@Pass1", "N3w@Passw0rd", "N3w@Passw0rd")
            .await;
        assert!(matches!(wrong_current, Err(ClinicError::ValidationFailed(_))));

        let mismatch = service
            .change_password(&user.key, "P@ssword123", "N3w@Passw0rd", "Other@Pass1")
            .await;
        assert!(matches!(mismatch, Err(ClinicError::ValidationFailed(_))));

        service
            .change_password(&user.key, "P@ssword123", "N3w@Passw0rd", "N3w@Passw0rd")
            .await
            .expect("change password");
        let login = service
            .authenticate("isc210345", "N3w@Passw0rd")
            .await
            .expect("login");
        assert!(login.is_some());
    }

    #[tokio::test]
    async fn should_backfill_only_missing_patient_histories() {
        let service = service().await;
        let first = service
            .create_user(patient_input("isc210345"))
            .await
            .expect("first patient");
        service.ensure_history_for(&first).await.expect("existing history");

        let mut second = patient_input("ii210001");
        second.email = "ii210001@itsatlixco.edu.mx".to_string();
        second.area = "Ingeniería Industrial".to_string();
        service.create_user(second).await.expect("second patient");

        let mut doctor = patient_input("admin9");
        doctor.key = "1001".to_string();
        doctor.email = "1001@itsatlixco.edu.mx".to_string();
        doctor.area = "Médico".to_string();
        doctor.birth_date = Some("20/07/1985".to_string());
        service.create_user(doctor).await.expect("doctor");

        let created = service.backfill_histories().await.expect("backfill");
        assert_eq!(created, 1);
    }
}
