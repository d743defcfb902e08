mod args;
mod progress;

use anyhow::Result;
use dialoguer::{Input, Password};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use udemy_dl::downloader::{ConsoleProgressReporter, IntoProgressCallback, ProgressCallback};
use udemy_dl::{
    Credentials, CurriculumWalker, DownloadError, DownloadPipeline, EmbedPlayerResolver,
    HttpTransport, LectureRange, RunSummary, Session,
};

use args::Cli;
use progress::BarReporter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(outcome) if outcome.interrupted => {
            let interrupted = DownloadError::Cancelled {
                reason: "interrupted by user".to_string(),
                url: None,
            };
            eprintln!("{}", interrupted);
            if let Some(suggestion) = interrupted.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(suggestion) = e.downcast_ref::<DownloadError>().and_then(|e| e.suggestion()) {
                eprintln!("Suggestion: {}", suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Flag, then environment, then an interactive prompt
fn resolve_credentials(cli: &Cli) -> Result<Credentials> {
    let username = match cli
        .username
        .clone()
        .or_else(|| std::env::var("UDEMY_USERNAME").ok())
    {
        Some(username) => username,
        None => Input::<String>::new()
            .with_prompt("Username/Email")
            .interact_text()?,
    };

    let password = match cli
        .password
        .clone()
        .or_else(|| std::env::var("UDEMY_PASSWORD").ok())
    {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let credentials = Credentials::new(username, password);
    credentials.validate()?;
    Ok(credentials)
}

struct Outcome {
    interrupted: bool,
}

async fn run(cli: Cli) -> Result<Outcome> {
    // Everything that can be rejected locally is checked before login
    let range = cli.range()?;
    let link = cli.course_link()?;
    let output_dir = cli.output_dir(&link)?;
    let credentials = resolve_credentials(&cli)?;
    let config = cli.download_config();

    let absolute = std::path::absolute(&output_dir).unwrap_or_else(|_| output_dir.clone());
    println!("Downloading to: {}\n", absolute.display());

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling download");
            signal_token.cancel();
        }
    });

    let session = Session::login(config, &credentials).await?;
    let result = download_course(&session, &cli, link.as_str(), range, &output_dir, cancel).await;
    session.logout().await;
    result
}

async fn download_course(
    session: &Session,
    cli: &Cli,
    link: &str,
    range: LectureRange,
    output_dir: &Path,
    cancel: CancellationToken,
) -> Result<Outcome> {
    let course_id = session.course_id(link).await?;
    let items = session.fetch_curriculum(&course_id).await?;

    let config = session.config().clone();
    let progress: ProgressCallback = if std::io::stderr().is_terminal() {
        BarReporter::new(cli.verbose > 0).into_callback()
    } else {
        ConsoleProgressReporter::new(cli.verbose > 0).into_callback()
    };

    let pipeline = DownloadPipeline::new(
        Arc::new(EmbedPlayerResolver::new(session.clone())),
        Arc::new(HttpTransport::from_config(&config)?),
        config,
    )
    .with_progress(progress)
    .with_cancellation_token(cancel.clone());

    let reports = pipeline
        .run(CurriculumWalker::new(&items, range), Some(output_dir))
        .await;

    println!();
    for report in &reports {
        println!("{}: {}", report.lecture.label(), report.outcome);
    }
    let summary = RunSummary::from_reports(&reports);
    println!("{}", summary);
    info!("Finished course {}", course_id);

    Ok(Outcome {
        interrupted: cancel.is_cancelled(),
    })
}
