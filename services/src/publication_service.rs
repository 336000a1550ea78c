// services/src/publication_service.rs

use std::sync::Arc;

use log::info;

use models::errors::{ClinicError, ClinicResult};
use models::publications::{NewPublication, Publication, DEFAULT_FEED_LIMIT};
use models::timestamp::BincodeDateTime;
use models::users::{Role, User};
use storage::ClinicStorageEngine;

/// Dashboard announcements. Doctors and administrators write them; the
/// feed shows published items only, newest first.
#[derive(Clone)]
pub struct PublicationService {
    storage: Arc<dyn ClinicStorageEngine>,
}

impl PublicationService {
    pub fn new(storage: Arc<dyn ClinicStorageEngine>) -> Self {
        PublicationService { storage }
    }

    pub async fn publish(&self, caller: &User, input: NewPublication) -> ClinicResult<Publication> {
        if caller.role == Role::Patient {
            return Err(ClinicError::PermissionDenied(
                "Only doctors and administrators can publish announcements".to_string(),
            ));
        }
        input.validate().into_result()?;
        let publication = Publication {
            id: 0,
            title: input.title.trim().to_string(),
            image_path: input.image_path,
            published_at: BincodeDateTime::now(),
            author_key: Some(caller.key.clone()),
            published: input.published,
        };
        let stored = self.storage.create_publication(publication).await?;
        info!("Stored publication {} by {}", stored.id, caller.key);
        Ok(stored)
    }

    /// The visible feed: published items only, newest first, at most
    /// `limit` entries ([`DEFAULT_FEED_LIMIT`] when unset).
    pub async fn latest(&self, limit: Option<usize>) -> ClinicResult<Vec<Publication>> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT);
        let mut publications: Vec<Publication> = self
            .storage
            .get_all_publications()
            .await?
            .into_iter()
            .filter(|p| p.published)
            .collect();
        publications.sort_by(|a, b| {
            b.published_at
                .0
                .cmp(&a.published_at.0)
                .then(b.id.cmp(&a.id))
        });
        publications.truncate(limit);
        Ok(publications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::users::Area;
    use models::UserKey;
    use storage::InMemoryStorage;

    fn make_user(key: &str, role: Role, area: &str) -> User {
        let now = BincodeDateTime::now();
        User {
            key: UserKey::new(key).expect("valid key"),
            email: format!("{}@itsatlixco.edu.mx", key.to_lowercase()),
            first_names: "ANA".to_string(),
            paternal_surname: "LOPEZ".to_string(),
            maternal_surname: None,
            birth_date: None,
            sex: None,
            role,
            area: Area::new(area),
            is_active: true,
            is_staff: false,
            password_hash: "hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn setup() -> (PublicationService, User, User) {
        let storage = Arc::new(InMemoryStorage::new());
        let service = PublicationService::new(storage);
        let doctor = make_user("1001", Role::Doctor, "Médico");
        let patient = make_user(
            "ISC210345",
            Role::Patient,
            "Ingeniería en Sistemas Computacionales",
        );
        (service, doctor, patient)
    }

    fn announcement(title: &str, published: bool) -> NewPublication {
        NewPublication {
            title: title.to_string(),
            image_path: None,
            published,
        }
    }

    #[tokio::test]
    async fn should_reject_patient_publishers() {
        let (service, _doctor, patient) = setup();
        let result = service
            .publish(&patient, announcement("Campaña de vacunación", true))
            .await;
        assert!(matches!(result, Err(ClinicError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn should_let_administrators_publish() {
        let (service, _doctor, _patient) = setup();
        let admin = make_user("admin1", Role::Administrator, "ADMINISTRATIVO");
        let stored = service
            .publish(&admin, announcement("Horario de verano", true))
            .await
            .expect("publish");
        assert_eq!(stored.author_key, Some(admin.key));
        assert!(stored.id > 0);
    }

    #[tokio::test]
    async fn should_require_a_title() {
        let (service, doctor, _patient) = setup();
        let result = service.publish(&doctor, announcement("   ", true)).await;
        assert!(matches!(result, Err(ClinicError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn should_keep_unpublished_items_out_of_the_feed() {
        let (service, doctor, _patient) = setup();
        service
            .publish(&doctor, announcement("Visible", true))
            .await
            .expect("publish");
        service
            .publish(&doctor, announcement("Borrador", false))
            .await
            .expect("publish");
        let feed = service.latest(None).await.expect("feed");
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "Visible");
    }

    #[tokio::test]
    async fn should_cap_the_feed_and_show_newest_first() {
        let (service, doctor, _patient) = setup();
        let mut last_id = 0;
        for n in 1..=12 {
            let stored = service
                .publish(&doctor, announcement(&format!("Aviso {}", n), true))
                .await
                .expect("publish");
            last_id = stored.id;
        }
        let feed = service.latest(None).await.expect("feed");
        assert_eq!(feed.len(), DEFAULT_FEED_LIMIT);
        assert_eq!(feed[0].id, last_id);
        let capped = service.latest(Some(3)).await.expect("feed");
        assert_eq!(capped.len(), 3);
    }
}
