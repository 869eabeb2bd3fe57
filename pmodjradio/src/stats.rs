//! Channel statistics
//!
//! [`ChannelReport::compute`] derives every metric from a [`Channel`] and a
//! reference time. The report renders itself through [`std::fmt::Display`].
//!
//! Ratios are plain `f64` divisions. A channel declaring zero subscribers or
//! zero programs, or created less than a day ago, yields infinite or NaN
//! ratios: those denominators are not guarded. Integer totals are checked
//! and fail with [`Error::Other`] rather than wrap.

use crate::error::{Error, Result};
use crate::models::Channel;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::time::Duration;

/// Days without a new program before a channel is reported as stale
pub const STALE_AFTER_DAYS: i64 = 7;

/// Descriptive statistics of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReport {
    pub id: u64,
    pub name: String,
    pub host: String,
    pub category: String,
    pub share_count: u64,
    pub sub_count: u64,
    pub recommendation: Option<String>,
    /// Declared number of programs (not the number listed)
    pub program_count: u64,

    pub created_at: NaiveDateTime,
    pub first_program_date: NaiveDate,
    pub last_program_at: NaiveDateTime,
    /// Whole days between creation and the reference time
    pub days_since_creation: i64,
    /// Whole days between the first and the latest program, at least 1
    pub program_span_days: i64,
    /// Days since the latest program, when at least [`STALE_AFTER_DAYS`]
    pub stale_days: Option<i64>,
    pub programs_per_day: f64,
    pub days_per_program: f64,
    pub subscribers_per_day: f64,

    pub total_duration: Duration,
    pub mean_duration: Duration,

    pub total_plays: u64,
    pub plays_per_subscriber: f64,
    pub plays_per_program: f64,
    pub plays_per_subscriber_per_program: f64,

    pub total_likes: u64,
    pub likes_per_subscriber: f64,
    pub likes_per_program: f64,
}

impl ChannelReport {
    /// Computes the report of `channel` as seen at `now` (local time)
    ///
    /// Fails with [`Error::EmptyChannel`] when no program was listed.
    pub fn compute(channel: &Channel, now: NaiveDateTime) -> Result<Self> {
        let info = &channel.info;
        let programs = &channel.programs;

        let first_program_date = programs
            .iter()
            .map(|p| p.publish_date)
            .min()
            .ok_or(Error::EmptyChannel)?;

        let created_at = info.created_at()?;
        let last_program_at = info.last_program_at()?;

        let days_since_creation = (now - created_at).num_days();
        let program_span_days = (last_program_at - first_program_date.and_time(Default::default()))
            .num_days()
            .max(1);
        let idle_days = (now - last_program_at).num_days();
        let stale_days = (idle_days >= STALE_AFTER_DAYS).then_some(idle_days);

        let subscribers = info.sub_count as f64;
        let declared = info.program_count as f64;

        let total_secs = checked_total(programs.iter().map(|p| p.duration_secs()), "duration")?;
        let mean_secs = total_secs / programs.len() as u64;

        let total_plays = checked_total(programs.iter().map(|p| p.play_count), "play count")?;
        let plays_per_subscriber = total_plays as f64 / subscribers;

        let total_likes = checked_total(programs.iter().map(|p| p.like_count), "like count")?;

        Ok(Self {
            id: info.id,
            name: info.name.clone(),
            host: info.host_name().to_string(),
            category: info.category.clone(),
            share_count: info.share_count,
            sub_count: info.sub_count,
            recommendation: info.recommendation().map(str::to_string),
            program_count: info.program_count,

            created_at,
            first_program_date,
            last_program_at,
            days_since_creation,
            program_span_days,
            stale_days,
            programs_per_day: declared / program_span_days as f64,
            days_per_program: program_span_days as f64 / declared,
            subscribers_per_day: subscribers / days_since_creation as f64,

            total_duration: Duration::from_secs(total_secs),
            mean_duration: Duration::from_secs(mean_secs),

            total_plays,
            plays_per_subscriber,
            plays_per_program: total_plays as f64 / declared,
            plays_per_subscriber_per_program: plays_per_subscriber / declared,

            total_likes,
            likes_per_subscriber: total_likes as f64 / subscribers,
            likes_per_program: total_likes as f64 / declared,
        })
    }
}

fn checked_total(mut values: impl Iterator<Item = u64>, what: &str) -> Result<u64> {
    values
        .try_fold(0u64, |acc, v| acc.checked_add(v))
        .ok_or_else(|| Error::other(format!("total {} overflows", what)))
}

/// Formats a duration as `hours:minutes:seconds`
///
/// Hours are not wrapped into days.
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

impl fmt::Display for ChannelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "============= Channel =============")?;
        writeln!(f, "Name: {}, id: {}", self.name, self.id)?;
        writeln!(f, "Host: {}", self.host)?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Shares: {}", self.share_count)?;
        writeln!(f, "Subscribers: {}", self.sub_count)?;
        if let Some(text) = &self.recommendation {
            writeln!(f, "Recommendation: {}", text)?;
        }
        writeln!(f, "Programs: {}", self.program_count)?;
        writeln!(
            f,
            "First program: {}, latest program: {}",
            self.first_program_date,
            self.last_program_at.date()
        )?;
        write!(f, "Updated over {} days", self.program_span_days)?;
        match self.stale_days {
            Some(days) => writeln!(f, ", no new program for {} days", days)?,
            None => writeln!(f)?,
        }
        writeln!(f, "Update rate: {:.3} programs/day", self.programs_per_day)?;
        writeln!(f, "Update period: {:.3} days/program", self.days_per_program)?;
        writeln!(
            f,
            "Created: {}, {} days ago",
            self.created_at.date(),
            self.days_since_creation
        )?;
        writeln!(f, "New subscribers per day: {:.2}", self.subscribers_per_day)?;

        writeln!(f, "============ Statistics ===========")?;
        writeln!(f, "Total duration:   {}", format_hms(self.total_duration))?;
        writeln!(f, "Average duration: {}", format_hms(self.mean_duration))?;
        writeln!(f, "-----------------------------------")?;
        writeln!(f, "Total plays:                      {}", self.total_plays)?;
        writeln!(f, "Plays per subscriber:             {:.2}", self.plays_per_subscriber)?;
        writeln!(f, "Plays per program:                {:.2}", self.plays_per_program)?;
        writeln!(
            f,
            "Plays per subscriber per program: {:.2}",
            self.plays_per_subscriber_per_program
        )?;
        writeln!(f, "-----------------------------------")?;
        writeln!(f, "Total likes:                      {}", self.total_likes)?;
        writeln!(f, "Likes per subscriber:             {:.2}", self.likes_per_subscriber)?;
        write!(f, "Likes per program:                {:.2}", self.likes_per_program)
    }
}
