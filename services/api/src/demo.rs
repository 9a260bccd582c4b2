use crate::infra::{parse_date, InMemoryPhotoStore, InMemoryUserRepository, StoredPhoto};
use chrono::{Local, NaiveDate};
use clap::Args;
use signup_wizard::accounts::{LocationCatalog, RegistrationService, UserRecord};
use signup_wizard::clients::{
    HttpRegistrationClient, InProcessClient, LookupClient, SubmissionClient, SubmissionReceipt,
};
use signup_wizard::config::{AppConfig, WizardConfig};
use signup_wizard::error::AppError;
use signup_wizard::wizard::{
    DraftChange, EventOutcome, Gender, Profession, ProfilePhoto, SubscriptionPlan, Transition,
    WizardError, WizardSession, WizardStep,
};
use std::sync::Arc;

type DemoClient = InProcessClient<InMemoryUserRepository, InMemoryPhotoStore>;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Username the demo visitor registers with
    #[arg(long, default_value = "demo_user")]
    pub(crate) username: String,
    /// Let a second visitor claim the same username first, forcing a retry
    #[arg(long)]
    pub(crate) taken: bool,
    /// Override the date used for age checks (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Register against the running API at APP_API_BASE instead of in process
    #[arg(long)]
    pub(crate) remote: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    println!("Registration wizard demo");
    if args.remote {
        println!("Using registration API at {}", config.wizard.api_base);
        let receipt = walk_through_remote(&args, &config.wizard, today).await?;
        println!("\nWelcome aboard, {}", receipt.username);
        return Ok(());
    }
    let outcome = walk_through(&args, &config.wizard, today).await?;

    println!("\nWelcome aboard, {}", outcome.receipt.username);
    println!("\nRegistered accounts");
    for record in &outcome.accounts {
        println!(
            "  {} {} ({}, {})",
            record.id,
            record.username,
            record.city.as_deref().unwrap_or("no city"),
            record.profile_photo.as_deref().unwrap_or("no photo"),
        );
    }
    if let Some(photo) = &outcome.photo {
        println!(
            "  Stored photo: {}, {} bytes",
            photo.content_type,
            photo.bytes.len()
        );
    }
    Ok(())
}

struct DemoOutcome {
    receipt: SubmissionReceipt,
    accounts: Vec<UserRecord>,
    photo: Option<StoredPhoto>,
}

struct Backend {
    users: Arc<InMemoryUserRepository>,
    photos: Arc<InMemoryPhotoStore>,
    client: Arc<DemoClient>,
}

impl Backend {
    fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let photos = Arc::new(InMemoryPhotoStore::default());
        let service = Arc::new(RegistrationService::new(users.clone(), photos.clone()));
        let client = Arc::new(InProcessClient::new(
            service,
            Arc::new(LocationCatalog::standard()),
        ));
        Self {
            users,
            photos,
            client,
        }
    }

    fn session(&self, config: &WizardConfig) -> WizardSession<DemoClient, DemoClient> {
        WizardSession::new(self.client.clone(), self.client.clone(), config)
    }
}

async fn walk_through(
    args: &DemoArgs,
    config: &WizardConfig,
    today: NaiveDate,
) -> Result<DemoOutcome, AppError> {
    let backend = Backend::new();
    let receipt = register(|| backend.session(config), args, today).await?;

    let accounts = backend.users.records();
    let photo = accounts
        .iter()
        .find(|record| record.username == receipt.username)
        .and_then(|record| record.profile_photo.as_deref())
        .and_then(|key| backend.photos.get(key));

    Ok(DemoOutcome {
        receipt,
        accounts,
        photo,
    })
}

async fn walk_through_remote(
    args: &DemoArgs,
    config: &WizardConfig,
    today: NaiveDate,
) -> Result<SubmissionReceipt, AppError> {
    let client = Arc::new(HttpRegistrationClient::new(config.api_base.as_str()));
    register(
        || WizardSession::new(client.clone(), client.clone(), config),
        args,
        today,
    )
    .await
}

/// Runs one visitor through the wizard. With `--taken`, a rival visitor from
/// `new_session` registers the same username first and the visitor retries.
async fn register<L, S>(
    new_session: impl Fn() -> WizardSession<L, S>,
    args: &DemoArgs,
    today: NaiveDate,
) -> Result<SubmissionReceipt, AppError>
where
    L: LookupClient + 'static,
    S: SubmissionClient + 'static,
{
    let mut session = new_session();

    println!("\nVisitor fills the wizard as '{}'", args.username);
    fill_to_review(&mut session, &args.username, today).await?;

    if args.taken {
        println!("\nA second visitor claims '{}' first", args.username);
        let mut rival = new_session();
        fill_to_review(&mut rival, &args.username, today).await?;
        let receipt = rival.submit_as_of(today).await?;
        println!("  Rival registered as {}", receipt.id);
    }

    let receipt = match session.submit_as_of(today).await {
        Ok(receipt) => receipt,
        Err(WizardError::Submission(err)) => {
            println!("  Submission failed: {err}");
            println!(
                "  Draft kept: {} / {}",
                session.wizard().draft().country,
                session.wizard().draft().city
            );
            let retry_name = format!("{}_2", args.username);
            retry_with(&mut session, &retry_name, today).await?;
            session.submit_as_of(today).await?
        }
        Err(err) => return Err(err.into()),
    };
    println!("  Registered {} as {}", receipt.username, receipt.id);
    Ok(receipt)
}

async fn fill_to_review<L, S>(
    session: &mut WizardSession<L, S>,
    username: &str,
    today: NaiveDate,
) -> Result<(), AppError>
where
    L: LookupClient + 'static,
    S: SubmissionClient + 'static,
{
    session.edit([
        DraftChange::ProfilePhoto(Some(ProfilePhoto::new(
            "avatar.png",
            "image/png",
            PNG_SIGNATURE.to_vec(),
        ))),
        DraftChange::Username(username.to_string()),
        DraftChange::CurrentPassword(Some("old-secret".to_string())),
        DraftChange::NewPassword(Some("n3w!secret".to_string())),
        DraftChange::Gender(Some(Gender::Female)),
        DraftChange::Dob(NaiveDate::from_ymd_opt(1990, 4, 12)),
    ])?;
    print_event(session.next_event().await);
    println!(
        "  Password strength: {}",
        session.wizard().password_strength().label()
    );
    step_forward(session, today)?;

    session.edit([
        DraftChange::Profession(Some(Profession::Developer)),
        DraftChange::Address1("221B Baker Street".to_string()),
    ])?;
    step_forward(session, today)?;
    print_event(session.next_event().await);

    session.edit([DraftChange::Country("India".to_string())])?;
    print_event(session.next_event().await);
    session.edit([DraftChange::State("UP".to_string())])?;
    print_event(session.next_event().await);
    session.edit([
        DraftChange::City("Noida".to_string()),
        DraftChange::Subscription(Some(SubscriptionPlan::Pro)),
    ])?;
    step_forward(session, today)
}

async fn retry_with<L, S>(
    session: &mut WizardSession<L, S>,
    username: &str,
    today: NaiveDate,
) -> Result<(), AppError>
where
    L: LookupClient + 'static,
    S: SubmissionClient + 'static,
{
    while session.wizard().step() != WizardStep::Identity {
        session.retreat()?;
    }
    println!("  Retrying as '{username}'");
    session.edit([DraftChange::Username(username.to_string())])?;
    print_event(session.next_event().await);
    while session.wizard().step() != WizardStep::Review {
        step_forward(session, today)?;
    }
    Ok(())
}

fn step_forward<L, S>(session: &mut WizardSession<L, S>, today: NaiveDate) -> Result<(), AppError>
where
    L: LookupClient + 'static,
    S: SubmissionClient + 'static,
{
    match session.advance_as_of(today)? {
        Transition::Moved { from, to } => {
            println!(
                "  Step {} {} -> step {} {}",
                from.number(),
                from.label(),
                to.number(),
                to.label()
            );
            Ok(())
        }
        Transition::Blocked | Transition::Stayed => {
            let step = session.wizard().step();
            for (field, message) in session.wizard().errors().iter() {
                println!("  {field}: {message}");
            }
            Err(WizardError::Incomplete(step).into())
        }
    }
}

fn print_event(event: Option<EventOutcome>) {
    match event {
        Some(EventOutcome::Availability(availability)) => {
            println!("  Username check: {availability:?}")
        }
        Some(EventOutcome::Countries(count)) => println!("  Loaded {count} countries"),
        Some(EventOutcome::States(count)) => println!("  Loaded {count} states"),
        Some(EventOutcome::Cities(count)) => println!("  Loaded {count} cities"),
        Some(EventOutcome::Discarded) | None => println!("  Lookup discarded"),
    }
}
