//! End-to-end wizard runs against the in-process registration service.
//!
//! Each scenario drives a `WizardSession` through the public API only, the
//! way a front end would: edit, wait for lookups, advance, submit.

mod common {
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use signup_wizard::accounts::{
        photo_key, LocationCatalog, PhotoStore, PhotoStoreError, RegistrationService,
        RepositoryError, UserRecord, UserRepository,
    };
    use signup_wizard::clients::InProcessClient;
    use signup_wizard::config::WizardConfig;
    use signup_wizard::wizard::{
        DraftChange, EventOutcome, Gender, Profession, ProfilePhoto, SubscriptionPlan,
        WizardSession, WizardStep,
    };

    #[derive(Default)]
    pub struct MemoryUsers {
        records: Mutex<Vec<UserRecord>>,
    }

    impl MemoryUsers {
        pub fn usernames(&self) -> Vec<String> {
            self.records
                .lock()
                .expect("repository mutex poisoned")
                .iter()
                .map(|record| record.username.clone())
                .collect()
        }
    }

    impl UserRepository for MemoryUsers {
        fn insert(&self, record: UserRecord) -> Result<UserRecord, RepositoryError> {
            let mut guard = self.records.lock().expect("repository mutex poisoned");
            if guard.iter().any(|stored| stored.username == record.username) {
                return Err(RepositoryError::Conflict);
            }
            guard.push(record.clone());
            Ok(record)
        }

        fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
            let guard = self.records.lock().expect("repository mutex poisoned");
            Ok(guard.iter().any(|stored| stored.username == username))
        }

        fn all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
            Ok(self.records.lock().expect("repository mutex poisoned").clone())
        }
    }

    #[derive(Default)]
    pub struct MemoryPhotos {
        keys: Mutex<Vec<String>>,
    }

    impl MemoryPhotos {
        pub fn count(&self) -> usize {
            self.keys.lock().expect("photo mutex poisoned").len()
        }
    }

    impl PhotoStore for MemoryPhotos {
        fn put(
            &self,
            file_name: &str,
            _content_type: &str,
            _bytes: &[u8],
        ) -> Result<String, PhotoStoreError> {
            let key = photo_key(chrono::Utc::now().timestamp_millis(), file_name);
            self.keys
                .lock()
                .expect("photo mutex poisoned")
                .push(key.clone());
            Ok(key)
        }

        fn remove(&self, key: &str) -> Result<(), PhotoStoreError> {
            let mut guard = self.keys.lock().expect("photo mutex poisoned");
            let before = guard.len();
            guard.retain(|stored| stored != key);
            if guard.len() == before {
                return Err(PhotoStoreError::NotFound(key.to_string()));
            }
            Ok(())
        }
    }

    pub type Client = InProcessClient<MemoryUsers, MemoryPhotos>;
    pub type Session = WizardSession<Client, Client>;

    pub struct Backend {
        pub users: Arc<MemoryUsers>,
        pub photos: Arc<MemoryPhotos>,
        pub client: Arc<Client>,
    }

    pub fn backend() -> Backend {
        let users = Arc::new(MemoryUsers::default());
        let photos = Arc::new(MemoryPhotos::default());
        let service = Arc::new(RegistrationService::new(users.clone(), photos.clone()));
        let client = Arc::new(InProcessClient::new(
            service,
            Arc::new(LocationCatalog::standard()),
        ));
        Backend {
            users,
            photos,
            client,
        }
    }

    pub fn session(backend: &Backend) -> Session {
        WizardSession::new(
            backend.client.clone(),
            backend.client.clone(),
            &WizardConfig::default(),
        )
    }

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
    }

    pub fn identity(username: &str) -> Vec<DraftChange> {
        vec![
            DraftChange::ProfilePhoto(Some(ProfilePhoto::new(
                "selfie.png",
                "image/png",
                vec![0x89, 0x50, 0x4e, 0x47],
            ))),
            DraftChange::Username(username.to_string()),
            DraftChange::Gender(Some(Gender::Other)),
            DraftChange::CustomGender("Agender".to_string()),
            DraftChange::Dob(NaiveDate::from_ymd_opt(1988, 11, 23)),
        ]
    }

    /// Fills every step after identity and stops on the summary.
    pub async fn complete_remaining_steps(session: &mut Session) {
        session
            .edit([
                DraftChange::Profession(Some(Profession::Entrepreneur)),
                DraftChange::CompanyName("Tiny Robots".to_string()),
                DraftChange::Address1("7 Canal Street".to_string()),
            ])
            .expect("professional fields");
        session.advance_as_of(today()).expect("advance professional");
        assert_eq!(session.next_event().await, Some(EventOutcome::Countries(2)));

        session
            .edit([DraftChange::Country("USA".to_string())])
            .expect("country");
        assert_eq!(session.next_event().await, Some(EventOutcome::States(2)));
        session
            .edit([DraftChange::State("California".to_string())])
            .expect("state");
        assert_eq!(session.next_event().await, Some(EventOutcome::Cities(2)));
        session
            .edit([
                DraftChange::City("San Francisco".to_string()),
                DraftChange::Subscription(Some(SubscriptionPlan::Enterprise)),
                DraftChange::Newsletter(false),
            ])
            .expect("preferences fields");
        session.advance_as_of(today()).expect("advance preferences");
        assert_eq!(session.wizard().step(), WizardStep::Review);
    }
}

use common::*;
use signup_wizard::clients::SubmissionError;
use signup_wizard::wizard::{
    DraftChange, EventOutcome, Field, SubmissionState, Transition, UsernameAvailability,
    WizardError, WizardStep,
};

#[tokio::test(start_paused = true)]
async fn wizard_registers_a_new_account() {
    let backend = backend();
    let mut session = session(&backend);

    session.edit(identity("river_song")).expect("identity fields");
    assert_eq!(
        session.next_event().await,
        Some(EventOutcome::Availability(UsernameAvailability::Available))
    );
    assert!(matches!(
        session.advance_as_of(today()).expect("advance identity"),
        Transition::Moved {
            to: WizardStep::Professional,
            ..
        }
    ));
    complete_remaining_steps(&mut session).await;

    let receipt = session.submit_as_of(today()).await.expect("registered");
    assert_eq!(receipt.username, "river_song");
    assert_eq!(backend.users.usernames(), ["river_song"]);
    assert_eq!(backend.photos.count(), 1);
    assert!(matches!(
        session.wizard().submission(),
        SubmissionState::Completed(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn taken_username_must_be_changed_before_advancing() {
    let backend = backend();
    let mut first = session(&backend);
    first.edit(identity("the_doctor")).expect("identity fields");
    first.next_event().await;
    first.advance_as_of(today()).expect("advance identity");
    complete_remaining_steps(&mut first).await;
    first.submit_as_of(today()).await.expect("registered");

    let mut second = session(&backend);
    second.edit(identity("the_doctor")).expect("identity fields");
    assert_eq!(
        second.next_event().await,
        Some(EventOutcome::Availability(UsernameAvailability::Taken))
    );
    assert_eq!(
        second.advance_as_of(today()).expect("advance"),
        Transition::Blocked
    );

    second
        .edit([DraftChange::Username("the_master".to_string())])
        .expect("username field");
    assert!(!second.wizard().errors().contains(Field::Username));
    assert_eq!(
        second.next_event().await,
        Some(EventOutcome::Availability(UsernameAvailability::Available))
    );
    assert!(matches!(
        second.advance_as_of(today()).expect("advance"),
        Transition::Moved { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn losing_a_username_race_keeps_the_draft_for_retry() {
    let backend = backend();
    let mut winner = session(&backend);
    let mut loser = session(&backend);

    for session in [&mut winner, &mut loser] {
        session.edit(identity("clara_oswald")).expect("identity fields");
        assert_eq!(
            session.next_event().await,
            Some(EventOutcome::Availability(UsernameAvailability::Available))
        );
        session.advance_as_of(today()).expect("advance identity");
        complete_remaining_steps(session).await;
    }

    winner.submit_as_of(today()).await.expect("winner registered");
    let err = loser.submit_as_of(today()).await.expect_err("race lost");
    assert_eq!(err, WizardError::Submission(SubmissionError::UsernameTaken));
    assert_eq!(
        loser.wizard().submission(),
        &SubmissionState::Failed("Username already taken".to_string())
    );
    assert_eq!(loser.wizard().draft().city, "San Francisco");
    assert_eq!(backend.photos.count(), 1);

    let retry = loser.submit_as_of(today()).await.expect_err("still taken");
    assert_eq!(retry, WizardError::Incomplete(WizardStep::Identity));
    assert_eq!(loser.wizard().step(), WizardStep::Identity);

    loser
        .edit([DraftChange::Username("clara_who".to_string())])
        .expect("username field");
    loser.next_event().await;
    for _ in 0..3 {
        loser.advance_as_of(today()).expect("advance");
    }
    let receipt = loser.submit_as_of(today()).await.expect("registered");
    assert_eq!(receipt.username, "clara_who");
    assert_eq!(backend.users.usernames(), ["clara_oswald", "clara_who"]);
}
