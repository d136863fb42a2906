//! Mood statistics
//!
//! Same shape as the remote `/api/stats` response so local and mirrored
//! figures can be compared directly.

use crate::config::{MAX_MOOD, MIN_MOOD};
use crate::database::SurveyRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodStats {
    pub total_records: usize,
    /// Mean mood rounded to two decimals, 0 when empty
    pub average_mood: f64,
    pub video_count: usize,
    pub mood_distribution: BTreeMap<u8, usize>,
}

impl MoodStats {
    pub fn from_records(records: &[SurveyRecord]) -> Self {
        let mut mood_distribution: BTreeMap<u8, usize> =
            (MIN_MOOD..=MAX_MOOD).map(|mood| (mood, 0)).collect();

        for record in records {
            *mood_distribution.entry(record.mood).or_insert(0) += 1;
        }

        let total_records = records.len();
        let average_mood = if total_records == 0 {
            0.0
        } else {
            let sum: u64 = records.iter().map(|r| r.mood as u64).sum();
            (sum as f64 / total_records as f64 * 100.0).round() / 100.0
        };

        Self {
            total_records,
            average_mood,
            video_count: records.iter().filter(|r| r.has_video).count(),
            mood_distribution,
        }
    }
}
