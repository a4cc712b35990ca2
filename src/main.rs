use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use skillmentor::{
    admin::{
        bookings::{BookingQueue, QueueError},
        classes::{ClassCreation, ClassForm},
        dashboard::AdminDashboard,
        mentors::{MentorCreation, MentorForm},
        FormError,
    },
    auth::{AuthError, IdentityState, IdentityVerifier, StaticTokenProvider, TokenFileProvider, TokenProvider},
    booking::{BookingController, BookingError, BookingForm},
    catalog::{ClassesPage, MentorDirectory, MentorProfilePage, StudentDashboardPage, ViewState, NO_MENTORS_ASSIGNED},
    clock::SystemClock,
    config::{AppConfig, ConfigError},
    logging::init_tracing,
    models::{BadgeVariant, FileUpload},
    notify::{ToastVariant, Toaster},
    router::{resolve, AdminRoute, Navigation, Route},
    services::{HttpService, ServiceError},
};

#[derive(Parser, Debug)]
#[command(name = "skillmentor", version, about = "Terminal client for the SkillMentor marketplace")]
struct Cli {
    /// File holding the current session token; re-read before every request.
    #[arg(long, env = "SKILLMENTOR_TOKEN_FILE", global = true)]
    token_file: Option<PathBuf>,
    #[arg(long, env = "SKILLMENTOR_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List classes with their mentors.
    Classes,
    /// List all mentors.
    Mentors,
    /// Show one mentor's profile.
    Mentor { id: i64 },
    /// Show your booked sessions.
    Dashboard,
    /// Book a session with a mentor.
    Book(BookArgs),
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct BookArgs {
    #[arg(long)]
    classroom: i64,
    #[arg(long)]
    mentor: i64,
    /// Local date and time, e.g. 2030-01-01T10:00.
    #[arg(long)]
    at: String,
    /// Payment slip image.
    #[arg(long)]
    slip: PathBuf,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Bookings {
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    Approve { id: i64 },
    Complete { id: i64 },
    Stats,
    CreateClass {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    CreateMentor(CreateMentorArgs),
}

#[derive(Args, Debug)]
struct CreateMentorArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    profession: String,
    #[arg(long, default_value = "")]
    qualification: String,
    #[arg(long)]
    fee: String,
    #[arg(long, default_value = "")]
    bio: String,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    image: Option<PathBuf>,
    /// Classroom id; repeat for several.
    #[arg(long = "classroom", required = true)]
    classrooms: Vec<i64>,
}

impl Command {
    fn route(&self) -> Route {
        match self {
            Command::Classes | Command::Book(_) => Route::Classes,
            Command::Mentors => Route::Home,
            Command::Mentor { id } => Route::MentorProfile(*id),
            Command::Dashboard => Route::Dashboard,
            Command::Admin(admin) => Route::Admin(match admin {
                AdminCommand::Bookings { .. }
                | AdminCommand::Approve { .. }
                | AdminCommand::Complete { .. } => AdminRoute::Bookings,
                AdminCommand::Stats => AdminRoute::Dashboard,
                AdminCommand::CreateClass { .. } => AdminRoute::CreateClass,
                AdminCommand::CreateMentor(_) => AdminRoute::CreateMentor,
            }),
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("cannot read {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("sign in first: provide --token-file or --token")]
    SignInRequired,
    #[error("{0}")]
    Denied(String),
    #[error("{0}")]
    View(String),
}

/// Token source picked from the command line.
enum CliTokens {
    File(TokenFileProvider),
    Static(StaticTokenProvider),
}

#[async_trait]
impl TokenProvider for CliTokens {
    async fn token(&self) -> Option<String> {
        match self {
            CliTokens::File(provider) => provider.token().await,
            CliTokens::Static(provider) => provider.token().await,
        }
    }
}

type Client = HttpService<CliTokens>;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let toaster = Toaster::new();

    let result = run(cli, toaster.clone()).await;
    for toast in toaster.drain() {
        let marker = match toast.variant {
            ToastVariant::Default => "+",
            ToastVariant::Destructive => "!",
        };
        eprintln!("[{marker}] {}: {}", toast.title, toast.description);
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, toaster: Toaster) -> Result<(), CliError> {
    let config = AppConfig::from_env()?;
    let verifier = IdentityVerifier::from_pem(&config.identity_public_key)?;
    let tokens = match (cli.token_file, cli.token) {
        (Some(path), _) => CliTokens::File(TokenFileProvider::new(path)),
        (None, Some(token)) => CliTokens::Static(StaticTokenProvider::new(token)),
        (None, None) => CliTokens::Static(StaticTokenProvider::anonymous()),
    };

    let identity = verifier.resolve(&tokens).await;
    match resolve(cli.command.route(), &identity) {
        Navigation::Render(route) => info!(path = %route.path(), "route allowed"),
        Navigation::SignIn | Navigation::Waiting => return Err(CliError::SignInRequired),
        Navigation::Redirect(to) => {
            return Err(CliError::Denied(format!(
                "admin access required; try `{}` instead",
                cli_hint(&to)
            )))
        }
    }
    if let IdentityState::SignedIn(user) = &identity {
        info!(subject = %user.subject, role = ?user.role, "signed in");
    }

    let client = HttpService::new(&config.api_base_url, tokens, config.request_timeout)?;
    match cli.command {
        Command::Classes => list_classes(client).await,
        Command::Mentors => list_mentors(client).await,
        Command::Mentor { id } => show_mentor(client, id).await,
        Command::Dashboard => student_dashboard(client).await,
        Command::Book(args) => book(client, &config, toaster, args).await,
        Command::Admin(admin) => run_admin(client, &config, toaster, admin).await,
    }
}

fn cli_hint(route: &Route) -> &'static str {
    match route {
        Route::Dashboard => "skillmentor dashboard",
        _ => "skillmentor classes",
    }
}

fn status_badge(status: &str, badge: BadgeVariant) -> String {
    format!("{status} [{}]", badge.as_str())
}

fn view_error<T>(state: &ViewState<T>) -> Option<CliError> {
    match state {
        ViewState::Failed(message) => Some(CliError::View(message.clone())),
        _ => None,
    }
}

async fn read_upload(path: &Path) -> Result<FileUpload, CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());
    let content_type = FileUpload::guess_content_type(&file_name);
    Ok(FileUpload::new(file_name, content_type, bytes))
}

async fn list_classes(client: Client) -> Result<(), CliError> {
    let mut page = ClassesPage::new(client);
    let state = page.load().await;
    if let Some(err) = view_error(state) {
        return Err(err);
    }
    let Some(classes) = state.ready() else {
        println!("No classes available.");
        return Ok(());
    };
    for class in classes {
        println!("#{} {}", class.id, class.name);
        let mentors = class.assigned_mentors();
        if mentors.is_empty() {
            println!("    {NO_MENTORS_ASSIGNED}");
        }
        for mentor in mentors {
            println!(
                "    [{}] #{} {} ({:.2} per session)",
                mentor.initials(),
                mentor.id,
                mentor.full_name(),
                mentor.session_fee
            );
        }
    }
    Ok(())
}

async fn list_mentors(client: Client) -> Result<(), CliError> {
    let mut page = MentorDirectory::new(client);
    let state = page.load().await;
    if let Some(err) = view_error(state) {
        return Err(err);
    }
    for mentor in state.ready().map(Vec::as_slice).unwrap_or_default() {
        println!("#{} {} - {}", mentor.id, mentor.full_name(), mentor.title);
    }
    Ok(())
}

async fn show_mentor(client: Client, id: i64) -> Result<(), CliError> {
    let mut page = MentorProfilePage::new(client, id);
    let state = page.load().await;
    if let Some(err) = view_error(state) {
        return Err(err);
    }
    if let Some(profile) = state.ready() {
        let mentor = &profile.mentor;
        println!("{} ({})", mentor.full_name(), mentor.title);
        println!("{} | {}", mentor.profession, mentor.qualification);
        println!("Fee: {:.2}", mentor.session_fee);
        if !mentor.bio.is_empty() {
            println!("\n{}\n", mentor.bio);
        }
        for class in &profile.classes {
            println!("  {}: {} students", class.name, class.student_count);
        }
    }
    Ok(())
}

async fn student_dashboard(client: Client) -> Result<(), CliError> {
    let mut page = StudentDashboardPage::new(client);
    let state = page.load().await;
    if let Some(err) = view_error(state) {
        return Err(err);
    }
    match state.ready() {
        None => println!("You have no booked sessions yet."),
        Some(sessions) => {
            for session in sessions {
                println!(
                    "{:<24} {} with {} on {}",
                    status_badge(session.status.as_str(), session.status.badge()),
                    session.class_name,
                    session.mentor_name,
                    session.session_day()
                );
            }
        }
    }
    Ok(())
}

async fn book(
    client: Client,
    config: &AppConfig,
    toaster: Toaster,
    args: BookArgs,
) -> Result<(), CliError> {
    let mut classes = ClassesPage::new(client.clone());
    if let Some(err) = view_error(classes.load().await) {
        return Err(err);
    }
    let Some(mut dialog) = classes.schedule(args.classroom, args.mentor) else {
        return Err(CliError::View(format!(
            "mentor {} does not teach classroom {}",
            args.mentor, args.classroom
        )));
    };
    println!("{}", dialog.description());

    let form = BookingForm {
        session_date_time: args.at,
        payment_proof: vec![read_upload(&args.slip).await?],
    };
    let controller = BookingController::new(client, Arc::new(SystemClock), toaster)
        .with_local_offset(config.local_offset);
    let request = controller.submit(&mut dialog, &form).await?;
    println!("Booked for {} ({} minutes).", request.session_date_time, request.duration);
    Ok(())
}

async fn run_admin(
    client: Client,
    config: &AppConfig,
    toaster: Toaster,
    command: AdminCommand,
) -> Result<(), CliError> {
    match command {
        AdminCommand::Bookings { page, search } => {
            let queue = BookingQueue::new(
                client,
                config.bookings_page_size,
                config.search_debounce,
                toaster,
            );
            match search {
                Some(term) => {
                    queue.search(&term).await;
                }
                None => {
                    queue.refresh().await;
                }
            }
            for _ in 1..page {
                if !queue.next_page().await {
                    break;
                }
            }
            let snap = queue.snapshot();
            for row in &snap.rows {
                let b = &row.booking;
                let action = row.action.map(|a| a.label()).unwrap_or("-");
                println!(
                    "#{:<5} {:<24} {:<20} {:<20} {:<20} {:<12} {action}",
                    b.booking_id,
                    status_badge(b.status.as_str(), row.badge),
                    b.student_name,
                    b.class_name,
                    b.mentor_name,
                    b.session_day()
                );
            }
            println!("Page {} of {}", snap.page + 1, snap.total_pages.max(1));
            Ok(())
        }
        AdminCommand::Approve { id } => {
            let queue = locate_booking(client, config, toaster, id).await?;
            queue.approve(id).await?;
            Ok(())
        }
        AdminCommand::Complete { id } => {
            let queue = locate_booking(client, config, toaster, id).await?;
            queue.complete(id).await?;
            Ok(())
        }
        AdminCommand::Stats => {
            let mut page = AdminDashboard::new(client);
            let state = page.load().await;
            if let Some(err) = view_error(state) {
                return Err(err);
            }
            if let Some(view) = state.ready() {
                let s = &view.stats;
                println!(
                    "Mentors {}  Students {}  Classes {}",
                    s.total_mentors, s.total_students, s.total_classrooms
                );
                for slice in &view.status_breakdown {
                    println!("  {:<10} {}", slice.label, slice.value);
                }
                for day in &view.daily {
                    println!("  {} {}", day.date, day.booking_count);
                }
            }
            Ok(())
        }
        AdminCommand::CreateClass {
            name,
            image_url,
            image,
        } => {
            let mut form = ClassForm {
                name,
                image_url: image_url.unwrap_or_default(),
                image: Vec::new(),
            };
            if let Some(path) = image {
                form.image.push(read_upload(&path).await?);
            }
            ClassCreation::new(client, toaster).submit(&mut form).await?;
            Ok(())
        }
        AdminCommand::CreateMentor(args) => {
            let mut page = MentorCreation::new(client, toaster);
            page.load_classrooms().await?;
            let mut form = MentorForm {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                phone_number: args.phone,
                address: args.address,
                title: args.title,
                profession: args.profession,
                qualification: args.qualification,
                session_fee: args.fee,
                image_url: args.image_url.unwrap_or_default(),
                bio: args.bio,
                image: Vec::new(),
                classroom_ids: Vec::new(),
            };
            for id in args.classrooms {
                form.select_classroom(id);
            }
            if let Some(path) = args.image {
                form.image.push(read_upload(&path).await?);
            }
            page.submit(&mut form).await?;
            Ok(())
        }
    }
}

/// Pages through the queue until the booking is on the current page.
async fn locate_booking(
    client: Client,
    config: &AppConfig,
    toaster: Toaster,
    id: i64,
) -> Result<BookingQueue<Client>, CliError> {
    let queue = BookingQueue::new(
        client,
        config.bookings_page_size,
        config.search_debounce,
        toaster,
    );
    queue.refresh().await;
    loop {
        if queue.snapshot().rows.iter().any(|r| r.booking.booking_id == id) {
            return Ok(queue);
        }
        if !queue.next_page().await {
            return Err(QueueError::UnknownBooking(id).into());
        }
    }
}
