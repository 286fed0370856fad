//! Lay queued titles out onto the posting calendar.
//!
//! Converts the FIFO title backlog into `Pending` post records with
//! `scheduled_for` slots: at most `max_posts_per_day` per allowed day at the
//! configured time, starting today.

use chrono::{DateTime, Datelike, Utc};

use postforge_core::error::{PostforgeError, Result};
use postforge_core::types::{DayOfWeek, PostRecord, ScheduleConfig};
use postforge_store::{PostStore, TitleStore};

pub fn plan_schedule(
    titles: &TitleStore,
    posts: &PostStore,
    schedule: &ScheduleConfig,
    now: DateTime<Utc>,
) -> Result<Vec<PostRecord>> {
    if schedule.allowed_days.is_empty() {
        return Err(PostforgeError::invalid_config(
            "cannot plan a schedule with no allowed days",
        ));
    }

    let queued = titles.list()?;
    if queued.is_empty() {
        return Ok(Vec::new());
    }

    let cap = schedule.max_posts_per_day.max(1) as usize;
    let mut day = now.date_naive();
    let mut slots_used = 0usize;
    let mut created = Vec::new();

    for entry in &queued {
        // Advance to the next allowed day with a free slot.
        while !schedule.allows(DayOfWeek::from_chrono(day.weekday())) || slots_used >= cap {
            day = day
                .succ_opt()
                .ok_or_else(|| PostforgeError::Other("calendar overflow".into()))?;
            slots_used = 0;
        }

        let scheduled_for = day.and_time(schedule.time_of_day).and_utc();
        match posts.create(
            entry.title.clone(),
            entry.keywords.clone(),
            Some(scheduled_for),
            now,
        ) {
            Ok(record) => {
                slots_used += 1;
                created.push(record);
            }
            Err(e) => {
                // Keep the unconverted tail queued.
                titles.drain(created.len())?;
                return Err(e);
            }
        }
    }

    titles.drain(created.len())?;
    tracing::info!("Scheduled {} title(s) onto the calendar", created.len());
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use postforge_core::types::Frequency;

    fn monday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 4, 12, 0, 0).single().expect("valid")
    }

    fn schedule(days: Vec<DayOfWeek>, cap: u32) -> ScheduleConfig {
        ScheduleConfig {
            frequency: Frequency::Daily,
            time_of_day: NaiveTime::from_hms_opt(10, 0, 0).expect("time"),
            allowed_days: days,
            max_posts_per_day: cap,
        }
    }

    fn stores() -> (tempfile::TempDir, TitleStore, PostStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let titles = TitleStore::open(dir.path().join("titles.json")).expect("titles");
        let posts = PostStore::open(dir.path().join("posts.json")).expect("posts");
        (dir, titles, posts)
    }

    #[test]
    fn test_plan_respects_daily_cap() {
        let (_dir, titles, posts) = stores();
        let now = monday_noon();
        for title in ["a", "b", "c", "d", "e"] {
            titles.add(title, vec![], now).expect("add");
        }

        let created =
            plan_schedule(&titles, &posts, &schedule(DayOfWeek::all().to_vec(), 2), now)
                .expect("plan");
        assert_eq!(created.len(), 5);
        assert!(titles.is_empty().expect("emptied"));

        // 2 + 2 + 1 across three consecutive days.
        let mut by_day = std::collections::BTreeMap::new();
        for record in &created {
            let day = record.scheduled_for.expect("slot").date_naive();
            *by_day.entry(day).or_insert(0usize) += 1;
        }
        let counts: Vec<usize> = by_day.values().copied().collect();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn test_plan_skips_disallowed_days() {
        let (_dir, titles, posts) = stores();
        let now = monday_noon();
        for title in ["a", "b", "c"] {
            titles.add(title, vec![], now).expect("add");
        }

        let created = plan_schedule(
            &titles,
            &posts,
            &schedule(vec![DayOfWeek::Wednesday], 1),
            now,
        )
        .expect("plan");

        // All slots land on Wednesdays, one per week.
        let slots: Vec<DateTime<Utc>> =
            created.iter().map(|r| r.scheduled_for.expect("slot")).collect();
        assert_eq!(
            slots[0],
            Utc.with_ymd_and_hms(2021, 1, 6, 10, 0, 0).single().expect("valid")
        );
        assert_eq!(
            slots[1],
            Utc.with_ymd_and_hms(2021, 1, 13, 10, 0, 0).single().expect("valid")
        );
        assert_eq!(
            slots[2],
            Utc.with_ymd_and_hms(2021, 1, 20, 10, 0, 0).single().expect("valid")
        );
    }

    #[test]
    fn test_plan_carries_keywords() {
        let (_dir, titles, posts) = stores();
        let now = monday_noon();
        titles
            .add("with keywords", vec!["kw1".into(), "kw2".into()], now)
            .expect("add");

        let created =
            plan_schedule(&titles, &posts, &schedule(DayOfWeek::all().to_vec(), 1), now)
                .expect("plan");
        assert_eq!(created[0].keywords, vec!["kw1".to_string(), "kw2".into()]);
        assert_eq!(posts.list_pending().expect("pending").len(), 1);
    }

    #[test]
    fn test_plan_rejects_empty_days() {
        let (_dir, titles, posts) = stores();
        titles.add("t", vec![], monday_noon()).expect("add");
        let err = plan_schedule(&titles, &posts, &schedule(vec![], 1), monday_noon())
            .expect_err("must fail");
        assert!(matches!(err, PostforgeError::InvalidConfig(_)));
        // Queue untouched.
        assert_eq!(titles.len().expect("len"), 1);
    }

    #[test]
    fn test_plan_empty_queue_is_noop() {
        let (_dir, titles, posts) = stores();
        let created = plan_schedule(
            &titles,
            &posts,
            &schedule(DayOfWeek::all().to_vec(), 2),
            monday_noon(),
        )
        .expect("plan");
        assert!(created.is_empty());
    }
}
