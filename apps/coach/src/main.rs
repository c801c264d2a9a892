mod commands;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use coach_core::{
    config::{apply_env, apply_required_file},
    load_settings, CancelDialog, CancelOutcome, CoachingController, CoachingEvent, Guidance,
    HttpCoachingApi, NextTransition, Settings, TimeSelector,
};
use commands::Command;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Pick a workout length, choose a routine and get coached through it")]
struct Args {
    /// Backend base URL; overrides coach.toml and COACH_API_URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    /// Settings file read instead of ./coach.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Choose this duration right away.
    #[arg(long)]
    minutes: Option<u32>,
    /// Directory that receives the guidance clip of every step.
    #[arg(long)]
    audio_dir: Option<PathBuf>,
}

fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => {
            let mut settings = Settings::default();
            apply_required_file(&mut settings, path)
                .with_context(|| format!("loading settings from {}", path.display()))?;
            apply_env(&mut settings, |key| std::env::var(key).ok());
            settings
        }
        None => load_settings(),
    };
    if let Some(url) = &args.server_url {
        settings.api_url = url.clone();
    }
    if let Some(token) = &args.token {
        settings.auth_token = Some(token.clone());
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,coach=info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args)?;
    let api = HttpCoachingApi::from_settings(&settings)
        .with_context(|| format!("invalid backend settings for {}", settings.api_url))?;
    info!(server_url = api.server_url(), "using coaching backend");
    let controller = Arc::new(CoachingController::new(Arc::new(api)));

    if let Some(dir) = &args.audio_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    tokio::spawn(print_events(controller.clone(), args.audio_dir.clone()));

    println!("{}", commands::HELP);
    print_time_options();
    if let Some(minutes) = args.minutes {
        run(&controller, Command::Time(minutes)).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => run(&controller, command).await,
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}

async fn run(controller: &CoachingController, command: Command) {
    match command {
        Command::Time(minutes) => match controller.choose_duration(minutes).await {
            Ok(0) => println!("No routines for {minutes} minutes. Try another length with 'back'."),
            Ok(_) => print_cards(controller).await,
            Err(err) => println!("{err}"),
        },
        Command::Select(routine_id) => match controller.select_candidate(routine_id).await {
            Ok(Some(_)) => print_cards(controller).await,
            Ok(None) => println!("A routine is already selected. Use 'reset' first."),
            Err(err) => println!("{err}"),
        },
        Command::Next => match controller.next().await {
            Ok(NextTransition::Advanced { .. }) => print_cards(controller).await,
            Ok(NextTransition::Finished) => {}
            Err(err) => println!("{err}"),
        },
        Command::Cancel {
            reason,
            injury_area,
        } => {
            let mut dialog = CancelDialog::default();
            dialog.open();
            dialog.set_reason(reason);
            if let Some(area) = injury_area {
                dialog.set_injury_area(area);
            }
            match dialog.confirm(controller).await {
                Ok(CancelOutcome::Acknowledged) => println!("Workout cancelled."),
                Ok(CancelOutcome::NotAcknowledged(_)) => {}
                Err(err) => println!("{err}"),
            }
        }
        Command::Reset => {
            controller.reset().await;
            print_cards(controller).await;
        }
        Command::Back => {
            controller.return_to_time_selection().await;
            print_time_options();
        }
        Command::Show => print_state(controller).await,
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => {}
    }
}

fn print_time_options() {
    let options: Vec<String> = TimeSelector::options()
        .iter()
        .map(|d| d.minutes().to_string())
        .collect();
    println!("Workout length in minutes: {}", options.join(" / "));
}

async fn print_cards(controller: &CoachingController) {
    for card in controller.snapshot().await.cards {
        print!("{card}");
    }
}

async fn print_state(controller: &CoachingController) {
    let snapshot = controller.snapshot().await;
    match snapshot.duration {
        Some(duration) => println!("duration: {} min", duration.minutes()),
        None => println!("duration: not chosen"),
    }
    println!("phase: {}", snapshot.phase_name());
    if let Some(session_id) = snapshot.session_id() {
        println!("session: {session_id}");
    }
    if let Some(guidance) = snapshot.guidance().or_else(|| snapshot.closing()) {
        println!("coach: {}", guidance.text);
    }
    if let Some(error) = &snapshot.last_error {
        println!("last error: {}", error.user_message());
    }
    for card in &snapshot.cards {
        print!("{card}");
    }
}

async fn print_events(controller: Arc<CoachingController>, audio_dir: Option<PathBuf>) {
    let mut events = controller.subscribe_events();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event printer fell behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        match event {
            CoachingEvent::CandidatesLoaded { duration, count } => {
                println!("{count} routines for {} minutes:", duration.minutes());
            }
            CoachingEvent::SessionStarted {
                current_index,
                guidance,
                ..
            }
            | CoachingEvent::StepAdvanced {
                current_index,
                guidance,
                ..
            } => {
                println!("coach: {}", guidance.text);
                save_audio(audio_dir.as_deref(), &format!("step-{current_index}.mp3"), &guidance).await;
            }
            CoachingEvent::SessionFinished {
                total_calories,
                closing,
                ..
            } => {
                if let Some(guidance) = closing {
                    println!("coach: {}", guidance.text);
                    save_audio(audio_dir.as_deref(), "finish.mp3", &guidance).await;
                }
                println!("Workout complete! About {total_calories:.0} kcal burned.");
            }
            CoachingEvent::SessionCancelled { reason, .. } => {
                println!("Stopping: {}", reason.label());
            }
            CoachingEvent::CancelNotAcknowledged { error, .. } => {
                println!(
                    "The workout was stopped here, but the server did not confirm: {}",
                    error.user_message()
                );
            }
            CoachingEvent::SelectionReset => {}
            CoachingEvent::Error(error) => println!("{}", error.user_message()),
        }
    }
}

async fn save_audio(dir: Option<&Path>, file_name: &str, guidance: &Guidance) {
    let Some(dir) = dir else {
        return;
    };
    if guidance.audio.is_empty() {
        return;
    }
    let path = dir.join(file_name);
    match tokio::fs::write(&path, &guidance.audio).await {
        Ok(()) => println!("  audio: {}", path.display()),
        Err(err) => warn!(path = %path.display(), "could not save guidance audio: {err}"),
    }
}
