use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::accounts::LocationCatalog;
use crate::clients::{
    LookupClient, LookupError, SubmissionClient, SubmissionError, SubmissionPayload,
    SubmissionReceipt,
};
use crate::config::WizardConfig;
use crate::wizard::domain::{
    DraftChange, Gender, Profession, ProfilePhoto, SubscriptionPlan,
};
use crate::wizard::machine::{RegistrationWizard, Transition};
use crate::wizard::session::{EventOutcome, WizardSession};
use crate::wizard::WizardStep;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn jpeg_photo() -> ProfilePhoto {
    ProfilePhoto::new("avatar.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0])
}

pub(super) fn identity_changes(username: &str) -> Vec<DraftChange> {
    vec![
        DraftChange::ProfilePhoto(Some(jpeg_photo())),
        DraftChange::Username(username.to_string()),
        DraftChange::Gender(Some(Gender::Female)),
        DraftChange::Dob(NaiveDate::from_ymd_opt(1994, 3, 14)),
    ]
}

pub(super) fn professional_changes() -> Vec<DraftChange> {
    vec![
        DraftChange::Profession(Some(Profession::Developer)),
        DraftChange::Address1("221B Baker Street".to_string()),
    ]
}

pub(super) fn preferences_changes() -> Vec<DraftChange> {
    vec![
        DraftChange::Country("India".to_string()),
        DraftChange::State("UP".to_string()),
        DraftChange::City("Noida".to_string()),
        DraftChange::Subscription(Some(SubscriptionPlan::Pro)),
    ]
}

/// A wizard walked forward to `target` with valid data on every step.
pub(super) fn wizard_at(target: WizardStep) -> RegistrationWizard {
    let mut wizard = RegistrationWizard::new();
    let steps = [
        (WizardStep::Identity, identity_changes("user_1")),
        (WizardStep::Professional, professional_changes()),
        (WizardStep::Preferences, preferences_changes()),
    ];
    for (step, changes) in steps {
        if wizard.step() == target {
            break;
        }
        assert_eq!(wizard.step(), step);
        wizard.update_draft(changes).expect("fields belong to step");
        let transition = wizard.advance_as_of(today()).expect("advance");
        assert!(matches!(transition, Transition::Moved { .. }), "{step:?} blocked");
    }
    assert_eq!(wizard.step(), target);
    wizard
}

pub(super) fn wizard_config() -> WizardConfig {
    WizardConfig {
        username_check_delay: Duration::from_millis(500),
        ..WizardConfig::default()
    }
}

/// Lookup double backed by the standard catalog. Records every username it is
/// asked about and can be told to fail or to answer slowly.
#[derive(Default)]
pub(super) struct StubLookup {
    catalog: LocationCatalog,
    taken: BTreeSet<String>,
    failing: bool,
    delays: BTreeMap<String, Duration>,
    checked: Mutex<Vec<String>>,
}

impl StubLookup {
    pub(super) fn standard() -> Self {
        Self {
            catalog: LocationCatalog::standard(),
            ..Self::default()
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::standard()
        }
    }

    pub(super) fn with_taken(mut self, username: &str) -> Self {
        self.taken.insert(username.to_string());
        self
    }

    pub(super) fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    pub(super) fn checked(&self) -> Vec<String> {
        self.checked.lock().expect("lookup mutex poisoned").clone()
    }

    async fn pause_for(&self, key: &str) -> Result<(), LookupError> {
        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing {
            return Err(LookupError::Unavailable("lookup offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LookupClient for StubLookup {
    async fn countries(&self) -> Result<Vec<String>, LookupError> {
        self.pause_for("countries").await?;
        Ok(self.catalog.countries())
    }

    async fn states(&self, country: &str) -> Result<Vec<String>, LookupError> {
        self.pause_for(country).await?;
        Ok(self.catalog.states(country))
    }

    async fn cities(&self, state: &str) -> Result<Vec<String>, LookupError> {
        self.pause_for(state).await?;
        Ok(self.catalog.cities(state))
    }

    async fn username_available(&self, username: &str) -> Result<bool, LookupError> {
        self.checked
            .lock()
            .expect("lookup mutex poisoned")
            .push(username.to_string());
        self.pause_for(username).await?;
        Ok(!self.taken.contains(username))
    }
}

/// Submission double answering from a queue of scripted outcomes.
#[derive(Default)]
pub(super) struct StubSubmitter {
    outcomes: Mutex<VecDeque<Result<SubmissionReceipt, SubmissionError>>>,
    payloads: Mutex<Vec<SubmissionPayload>>,
}

impl StubSubmitter {
    pub(super) fn answering(
        outcomes: impl IntoIterator<Item = Result<SubmissionReceipt, SubmissionError>>,
    ) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            payloads: Mutex::default(),
        }
    }

    pub(super) fn payloads(&self) -> Vec<SubmissionPayload> {
        self.payloads.lock().expect("submitter mutex poisoned").clone()
    }
}

#[async_trait]
impl SubmissionClient for StubSubmitter {
    async fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let receipt = SubmissionReceipt {
            id: "usr-000042".to_string(),
            username: payload.username.clone(),
        };
        self.payloads
            .lock()
            .expect("submitter mutex poisoned")
            .push(payload);
        self.outcomes
            .lock()
            .expect("submitter mutex poisoned")
            .pop_front()
            .unwrap_or(Ok(receipt))
    }
}

pub(super) type TestSession = WizardSession<StubLookup, StubSubmitter>;

pub(super) fn session(lookup: StubLookup, submitter: StubSubmitter) -> TestSession {
    WizardSession::new(Arc::new(lookup), Arc::new(submitter), &wizard_config())
}

/// Walks a session through the first two steps and waits for the country list.
pub(super) async fn session_at_preferences(session: &mut TestSession) {
    session
        .edit(identity_changes("user_1"))
        .expect("identity fields");
    session.advance_as_of(today()).expect("advance identity");
    session
        .edit(professional_changes())
        .expect("professional fields");
    session.advance_as_of(today()).expect("advance professional");
    assert_eq!(session.wizard().step(), WizardStep::Preferences);
    assert_eq!(session.next_event().await, Some(EventOutcome::Countries(2)));
}
