// moodlog - Mood journal with optional video and location
// Entry point and command dispatch

use anyhow::Context;
use clap::Parser;
use moodlog::app::AppState;
use moodlog::cli::{parse_time, Cli, Commands, RemoteCommands, SettingsCommands};
use moodlog::commands;
use moodlog::config::AppConfig;
use moodlog::database::NotificationSchedule;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| AppConfig::default().data_dir);
    let config = AppConfig::load_or_default(&data_dir).context("failed to load config")?;
    let state = AppState::initialize(config)
        .await
        .context("failed to initialize application")?;

    run(&state, cli.command).await
}

async fn run(state: &AppState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Record {
            mood,
            latitude,
            longitude,
            video,
        } => {
            let record =
                commands::record_mood(state, mood, latitude, longitude, video).await?;
            println!("Recorded mood {} as {}", record.mood, record.id);
            if let Some(uri) = &record.video_uri {
                println!("Video saved to {}", uri.display());
            }
        }
        Commands::List { newest_first, json } => {
            let records = commands::list_records(state, newest_first).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No records yet");
            } else {
                for record in &records {
                    let location = record
                        .location
                        .as_ref()
                        .map(|l| format!(" @ {:.5},{:.5}", l.latitude, l.longitude))
                        .unwrap_or_default();
                    let video = if record.has_video { " [video]" } else { "" };
                    println!(
                        "{}  {}  mood {}{}{}",
                        record.id,
                        record.timestamp.format("%Y-%m-%d %H:%M"),
                        record.mood,
                        location,
                        video
                    );
                }
            }
        }
        Commands::Delete { id } => {
            if commands::delete_record(state, &id).await? {
                println!("Deleted {}", id);
            } else {
                println!("No record with id {}", id);
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete all records without --yes");
            }
            let removed = commands::clear_records(state).await?;
            println!("Deleted {} records", removed);
        }
        Commands::Videos => {
            let videos = commands::list_videos(state).await?;
            if videos.is_empty() {
                println!("No videos");
            }
            for video in videos {
                println!(
                    "{}  {}  {}",
                    video.id,
                    video.timestamp.format("%Y-%m-%d %H:%M"),
                    video.uri.display()
                );
            }
        }
        Commands::Stats => {
            let stats = commands::get_stats(state).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Export { zip, json_only } => {
            if json_only {
                let export = commands::export_json(state).await?;
                println!("Exported records to {}", export.json_path.display());
                if export.video_count > 0 {
                    println!(
                        "{} videos were not included; use a bundle export for those",
                        export.video_count
                    );
                }
                return Ok(());
            }

            match commands::export_bundle(state, zip, |progress| {
                println!("Copying video {} ({})", progress.video_index, progress.file_name);
            })
            .await
            {
                Ok((result, archive)) => {
                    println!(
                        "Exported {} records and {} videos to {}",
                        result.total_records,
                        result.video_count,
                        result.bundle_dir.display()
                    );
                    if let Some(archive) = archive {
                        println!("Archive: {}", archive.display());
                    }
                }
                Err(e) if e.is_nothing_to_export() => println!("Nothing to export"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Settings { command } => {
            let schedule = match command {
                SettingsCommands::Show => commands::get_notification_settings(state).await?,
                SettingsCommands::Enable => commands::set_notifications_enabled(state, true).await?,
                SettingsCommands::Disable => {
                    commands::set_notifications_enabled(state, false).await?
                }
                SettingsCommands::AddTime { time } => {
                    let (hour, minute) = time_arg(&time)?;
                    commands::add_reminder_time(state, hour, minute).await?
                }
                SettingsCommands::EditTime { index, time } => {
                    let (hour, minute) = time_arg(&time)?;
                    commands::edit_reminder_time(state, index, hour, minute).await?
                }
                SettingsCommands::RemoveTime { index } => {
                    commands::remove_reminder_time(state, index).await?
                }
                SettingsCommands::ToggleTime { index } => {
                    commands::toggle_reminder_time(state, index).await?
                }
            };
            print_schedule(&schedule);
        }
        Commands::Remind => commands::run_reminders(state).await?,
        Commands::Remote { command } => match command {
            RemoteCommands::List => {
                let surveys = commands::list_remote_records(state).await?;
                println!("{}", serde_json::to_string_pretty(&surveys)?);
            }
            RemoteCommands::Stats => {
                let stats = commands::get_remote_stats(state).await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        },
        Commands::Info => {
            println!("{}", serde_json::to_string_pretty(&commands::get_app_info(state))?);
        }
    }

    Ok(())
}

fn time_arg(value: &str) -> anyhow::Result<(u8, u8)> {
    parse_time(value).with_context(|| format!("expected HH:MM, got {:?}", value))
}

fn print_schedule(schedule: &NotificationSchedule) {
    let status = if schedule.enabled { "enabled" } else { "disabled" };
    println!("Reminders {}", status);
    for (index, time) in schedule.times.iter().enumerate() {
        let mark = if time.enabled { "on" } else { "off" };
        println!("  [{}] {} {}", index, time, mark);
    }
}
