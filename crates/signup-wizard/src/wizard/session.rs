use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::debounce::{Debouncer, RequestGate, Ticket};
use super::domain::{DraftChange, Field, WizardStep};
use super::machine::{RegistrationWizard, Transition};
use super::validation::rules::username_violations;
use super::validation::UsernameAvailability;
use super::WizardError;
use crate::clients::{LookupClient, LookupError, SubmissionClient, SubmissionReceipt};
use crate::config::WizardConfig;

/// Option lists currently offered by the preferences step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationOptions {
    pub countries: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
}

/// Completed background work, delivered back to the session.
#[derive(Debug)]
pub enum SessionEvent {
    UsernameChecked {
        ticket: Ticket,
        username: String,
        outcome: Result<bool, LookupError>,
    },
    CountriesLoaded(Result<Vec<String>, LookupError>),
    StatesLoaded {
        ticket: Ticket,
        country: String,
        outcome: Result<Vec<String>, LookupError>,
    },
    CitiesLoaded {
        ticket: Ticket,
        state: String,
        outcome: Result<Vec<String>, LookupError>,
    },
}

/// What applying one event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Availability(UsernameAvailability),
    Countries(usize),
    States(usize),
    Cities(usize),
    /// Superseded by a newer request or no longer relevant.
    Discarded,
}

/// Drives one wizard: owns the step machine, debounces username checks and
/// keeps the location option lists in step with the draft.
pub struct WizardSession<L, S> {
    wizard: RegistrationWizard,
    lookup: Arc<L>,
    submitter: Arc<S>,
    username_checks: Debouncer,
    states_gate: RequestGate,
    cities_gate: RequestGate,
    options: LocationOptions,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl<L, S> WizardSession<L, S>
where
    L: LookupClient + 'static,
    S: SubmissionClient + 'static,
{
    pub fn new(lookup: Arc<L>, submitter: Arc<S>, config: &WizardConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            wizard: RegistrationWizard::new(),
            lookup,
            submitter,
            username_checks: Debouncer::new(config.username_check_delay),
            states_gate: RequestGate::default(),
            cities_gate: RequestGate::default(),
            options: LocationOptions::default(),
            events_tx,
            events_rx,
        }
    }

    pub fn wizard(&self) -> &RegistrationWizard {
        &self.wizard
    }

    pub fn options(&self) -> &LocationOptions {
        &self.options
    }

    pub fn load_countries(&self) {
        let lookup = Arc::clone(&self.lookup);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = lookup.countries().await;
            deliver(&events, SessionEvent::CountriesLoaded(outcome));
        });
    }

    /// Apply edits to the active step and start whatever lookups they imply.
    pub fn edit<I>(&mut self, changes: I) -> Result<(), WizardError>
    where
        I: IntoIterator<Item = DraftChange>,
    {
        let (username, country, state) = location_keys(&self.wizard);
        self.wizard.update_draft(changes)?;
        let draft = self.wizard.draft();

        if draft.username != username {
            let username = draft.username.clone();
            self.schedule_username_check(&username);
        }
        let draft = self.wizard.draft();
        if draft.country != country {
            let country = draft.country.clone();
            self.options.states.clear();
            self.options.cities.clear();
            self.cities_gate.invalidate();
            self.request_states(&country);
        } else if draft.state != state {
            let state = draft.state.clone();
            self.options.cities.clear();
            self.request_cities(&state);
        }
        Ok(())
    }

    /// Wait for the next background result and fold it into the wizard.
    pub async fn next_event(&mut self) -> Option<EventOutcome> {
        let event = self.events_rx.recv().await?;
        Some(self.apply_event(event))
    }

    pub fn apply_event(&mut self, event: SessionEvent) -> EventOutcome {
        match event {
            SessionEvent::UsernameChecked {
                ticket,
                username,
                outcome,
            } => {
                if !self.username_checks.is_current(ticket) {
                    return EventOutcome::Discarded;
                }
                let availability = match outcome {
                    Ok(true) => UsernameAvailability::Available,
                    Ok(false) => UsernameAvailability::Taken,
                    Err(err) => {
                        warn!(%username, error = %err, "username check failed");
                        UsernameAvailability::Unknown
                    }
                };
                if self.wizard.record_availability(&username, availability) {
                    EventOutcome::Availability(availability)
                } else {
                    EventOutcome::Discarded
                }
            }
            SessionEvent::CountriesLoaded(outcome) => {
                self.options.countries = degrade(outcome, "countries");
                EventOutcome::Countries(self.options.countries.len())
            }
            SessionEvent::StatesLoaded {
                ticket,
                country,
                outcome,
            } => {
                if !self.states_gate.is_current(ticket)
                    || self.wizard.step() != WizardStep::Preferences
                    || self.wizard.draft().country != country
                {
                    return EventOutcome::Discarded;
                }
                let fetched = outcome.is_ok();
                self.options.states = degrade(outcome, "states");
                if fetched && !offers(&self.options.states, &self.wizard.draft().state) {
                    self.options.cities.clear();
                    self.wizard.clear_location_below(Field::Country);
                }
                EventOutcome::States(self.options.states.len())
            }
            SessionEvent::CitiesLoaded {
                ticket,
                state,
                outcome,
            } => {
                if !self.cities_gate.is_current(ticket)
                    || self.wizard.step() != WizardStep::Preferences
                    || self.wizard.draft().state != state
                {
                    return EventOutcome::Discarded;
                }
                let fetched = outcome.is_ok();
                self.options.cities = degrade(outcome, "cities");
                if fetched && !offers(&self.options.cities, &self.wizard.draft().city) {
                    self.wizard.clear_location_below(Field::State);
                }
                EventOutcome::Cities(self.options.cities.len())
            }
        }
    }

    pub fn advance(&mut self) -> Result<Transition, WizardError> {
        self.advance_as_of(Local::now().date_naive())
    }

    pub fn advance_as_of(&mut self, today: NaiveDate) -> Result<Transition, WizardError> {
        let transition = self.wizard.advance_as_of(today)?;
        if let Transition::Moved { from, to } = transition {
            self.entered(from, to);
        }
        Ok(transition)
    }

    pub fn retreat(&mut self) -> Result<Transition, WizardError> {
        let transition = self.wizard.retreat()?;
        if let Transition::Moved { from, to } = transition {
            self.entered(from, to);
        }
        Ok(transition)
    }

    pub async fn submit(&mut self) -> Result<SubmissionReceipt, WizardError> {
        self.submit_as_of(Local::now().date_naive()).await
    }

    /// Lock the wizard, hand the payload to the submission client and settle
    /// the outcome. A failure keeps the draft for another attempt.
    pub async fn submit_as_of(&mut self, today: NaiveDate) -> Result<SubmissionReceipt, WizardError> {
        let payload = match self.wizard.begin_submission(today) {
            Ok(payload) => payload,
            Err(WizardError::Incomplete(step)) => {
                self.entered(WizardStep::Review, step);
                return Err(WizardError::Incomplete(step));
            }
            Err(err) => return Err(err),
        };
        let outcome = self.submitter.submit(payload).await;
        self.wizard.finish_submission(outcome.clone());
        outcome.map_err(WizardError::from)
    }

    fn entered(&mut self, from: WizardStep, to: WizardStep) {
        match from {
            WizardStep::Identity => self.username_checks.cancel(),
            WizardStep::Preferences => {
                self.states_gate.invalidate();
                self.cities_gate.invalidate();
            }
            _ => {}
        }

        let (username, country, state) = location_keys(&self.wizard);
        match to {
            WizardStep::Identity
                if matches!(
                    self.wizard.availability(),
                    UsernameAvailability::Unknown | UsernameAvailability::Checking
                ) =>
            {
                self.schedule_username_check(&username);
            }
            WizardStep::Preferences => {
                if self.options.countries.is_empty() {
                    self.load_countries();
                }
                if !country.is_empty() && self.options.states.is_empty() {
                    self.request_states(&country);
                }
                if !state.is_empty() && self.options.cities.is_empty() {
                    self.request_cities(&state);
                }
            }
            _ => {}
        }
    }

    fn schedule_username_check(&mut self, username: &str) {
        if !username_violations(username).is_empty() {
            self.username_checks.cancel();
            return;
        }

        self.wizard
            .record_availability(username, UsernameAvailability::Checking);
        let lookup = Arc::clone(&self.lookup);
        let events = self.events_tx.clone();
        let username = username.to_string();
        self.username_checks.schedule(move |ticket| async move {
            let outcome = lookup.username_available(&username).await;
            deliver(
                &events,
                SessionEvent::UsernameChecked {
                    ticket,
                    username,
                    outcome,
                },
            );
        });
    }

    fn request_states(&mut self, country: &str) {
        let ticket = self.states_gate.issue();
        if country.is_empty() {
            return;
        }
        let lookup = Arc::clone(&self.lookup);
        let events = self.events_tx.clone();
        let country = country.to_string();
        debug!(%country, "loading states");
        tokio::spawn(async move {
            let outcome = lookup.states(&country).await;
            deliver(
                &events,
                SessionEvent::StatesLoaded {
                    ticket,
                    country,
                    outcome,
                },
            );
        });
    }

    fn request_cities(&mut self, state: &str) {
        let ticket = self.cities_gate.issue();
        if state.is_empty() {
            return;
        }
        let lookup = Arc::clone(&self.lookup);
        let events = self.events_tx.clone();
        let state = state.to_string();
        debug!(%state, "loading cities");
        tokio::spawn(async move {
            let outcome = lookup.cities(&state).await;
            deliver(
                &events,
                SessionEvent::CitiesLoaded {
                    ticket,
                    state,
                    outcome,
                },
            );
        });
    }
}

fn location_keys(wizard: &RegistrationWizard) -> (String, String, String) {
    let draft = wizard.draft();
    (
        draft.username.clone(),
        draft.country.clone(),
        draft.state.clone(),
    )
}

/// Whether `selected` is still among `options`. Nothing selected always fits.
fn offers(options: &[String], selected: &str) -> bool {
    selected.is_empty() || options.iter().any(|option| option == selected)
}

fn degrade(outcome: Result<Vec<String>, LookupError>, what: &str) -> Vec<String> {
    outcome.unwrap_or_else(|err| {
        warn!(lookup = what, error = %err, "lookup failed; offering no options");
        Vec::new()
    })
}

fn deliver(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    if events.send(event).is_err() {
        debug!("session dropped before background result arrived");
    }
}
