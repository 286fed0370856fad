//! Dashboard-editable scheduling, content, and SEO settings.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{PostforgeError, Result};

/// How often the scheduler considers publishing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Hourly,
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "hourly" => Ok(Frequency::Hourly),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

/// Day of week, serialized the way the config files spell them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn all() -> [DayOfWeek; 7] {
        [
            DayOfWeek::Monday,
            DayOfWeek::Tuesday,
            DayOfWeek::Wednesday,
            DayOfWeek::Thursday,
            DayOfWeek::Friday,
            DayOfWeek::Saturday,
            DayOfWeek::Sunday,
        ]
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl std::str::FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(DayOfWeek::Monday),
            "tuesday" | "tue" => Ok(DayOfWeek::Tuesday),
            "wednesday" | "wed" => Ok(DayOfWeek::Wednesday),
            "thursday" | "thu" => Ok(DayOfWeek::Thursday),
            "friday" | "fri" => Ok(DayOfWeek::Friday),
            "saturday" | "sat" => Ok(DayOfWeek::Saturday),
            "sunday" | "sun" => Ok(DayOfWeek::Sunday),
            other => Err(format!("unknown day: {other}")),
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        };
        write!(f, "{name}")
    }
}

/// When and how much to publish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    pub frequency: Frequency,
    pub time_of_day: NaiveTime,
    pub allowed_days: Vec<DayOfWeek>,
    pub max_posts_per_day: u32,
}

impl Default for ScheduleConfig {
    /// Safe fallback: one post per day, any day, 10:00 UTC.
    fn default() -> Self {
        Self {
            frequency: Frequency::Daily,
            time_of_day: NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
            allowed_days: DayOfWeek::all().to_vec(),
            max_posts_per_day: 1,
        }
    }
}

impl ScheduleConfig {
    pub fn allows(&self, day: DayOfWeek) -> bool {
        self.allowed_days.contains(&day)
    }
}

/// Article generation knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentSettings {
    pub min_words: usize,
    pub max_words: usize,
    pub auto_research_keywords: bool,
    pub auto_generate_images: bool,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            min_words: 1000,
            max_words: 2000,
            auto_research_keywords: true,
            auto_generate_images: true,
        }
    }
}

/// SEO analysis thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeoSettings {
    pub keyword_density_min: f64,
    pub keyword_density_max: f64,
    pub meta_description_auto: bool,
}

impl Default for SeoSettings {
    fn default() -> Self {
        Self {
            keyword_density_min: 0.5,
            keyword_density_max: 2.5,
            meta_description_auto: true,
        }
    }
}

/// The full dashboard-writable settings document, persisted as one JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScheduleSettings {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub content: ContentSettings,
    #[serde(default)]
    pub seo: SeoSettings,
}

impl ScheduleSettings {
    /// Reject documents that would wedge or overrun the scheduler.
    pub fn validate(&self) -> Result<()> {
        if self.schedule.max_posts_per_day < 1 {
            return Err(PostforgeError::invalid_config(
                "max_posts_per_day must be at least 1",
            ));
        }
        if self.schedule.allowed_days.is_empty() {
            return Err(PostforgeError::invalid_config(
                "allowed_days must not be empty",
            ));
        }
        if self.content.min_words > self.content.max_words {
            return Err(PostforgeError::invalid_config(
                "min_words must not exceed max_words",
            ));
        }
        if self.seo.keyword_density_min >= self.seo.keyword_density_max {
            return Err(PostforgeError::invalid_config(
                "keyword_density_min must be below keyword_density_max",
            ));
        }
        Ok(())
    }
}
