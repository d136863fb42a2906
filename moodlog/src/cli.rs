use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "moodlog", version, about = "Mood journal with optional video and location")]
pub struct Cli {
    /// Override the application data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a mood from 1 (worst) to 5 (best)
    Record {
        mood: u8,
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
        /// Captured clip to move into the video directory
        #[arg(long)]
        video: Option<PathBuf>,
    },
    /// List records in insertion order
    List {
        #[arg(long, default_value_t = false)]
        newest_first: bool,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Delete a record and its video
    Delete { id: String },
    /// Delete every record and video
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// List records whose video is still on disk
    Videos,
    /// Show mood statistics
    Stats,
    /// Export records and videos
    Export {
        /// Also pack the bundle into a ZIP archive
        #[arg(long, default_value_t = false, conflicts_with = "json_only")]
        zip: bool,
        /// Write only the records file into the documents directory
        #[arg(long, default_value_t = false)]
        json_only: bool,
    },
    /// Show or edit reminder settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Run the reminder scheduler until interrupted
    Remind,
    /// Query the remote mirror
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },
    /// Show version and directories
    Info,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommands {
    Show,
    Enable,
    Disable,
    /// Add a reminder at HH:MM
    AddTime { time: String },
    /// Move the reminder at INDEX to HH:MM
    EditTime { index: usize, time: String },
    RemoveTime { index: usize },
    ToggleTime { index: usize },
}

#[derive(Debug, Subcommand)]
pub enum RemoteCommands {
    List,
    Stats,
}

/// Parse `HH:MM` into hour and minute; range checks happen on save
pub fn parse_time(value: &str) -> Option<(u8, u8)> {
    let (hour, minute) = value.trim().split_once(':')?;
    Some((hour.parse().ok()?, minute.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("09:00"), Some((9, 0)));
        assert_eq!(parse_time(" 22:30 "), Some((22, 30)));
        assert_eq!(parse_time("7:5"), Some((7, 5)));
        assert_eq!(parse_time("0900"), None);
        assert_eq!(parse_time("aa:00"), None);
    }

    #[test]
    fn test_record_requires_both_coordinates() {
        let parsed = Cli::try_parse_from(["moodlog", "record", "4", "--latitude", "1.0"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "moodlog",
            "record",
            "4",
            "--latitude",
            "-33.9",
            "--longitude",
            "151.2",
        ])
        .unwrap();
        match parsed.command {
            Commands::Record {
                mood,
                latitude,
                longitude,
                video,
            } => {
                assert_eq!(mood, 4);
                assert_eq!(latitude, Some(-33.9));
                assert_eq!(longitude, Some(151.2));
                assert!(video.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_export_flags_conflict() {
        assert!(Cli::try_parse_from(["moodlog", "export", "--zip", "--json-only"]).is_err());
        assert!(Cli::try_parse_from(["moodlog", "export", "--zip"]).is_ok());
    }
}
