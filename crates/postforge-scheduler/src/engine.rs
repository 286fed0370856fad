//! The scheduler engine — gated tick, selection, dispatch.

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

use postforge_content::seo;
use postforge_core::clock::Clock;
use postforge_core::error::{PostforgeError, Result};
use postforge_core::traits::{ContentGenerator, Publisher};
use postforge_core::types::{DayOfWeek, Frequency, PostRecord, PostState, ScheduleConfig, ScheduleSettings};
use postforge_core::PostforgeConfig;
use postforge_store::{ConfigStore, PostStore};

/// Operator-facing snapshot of the loop.
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub last_tick_at: Option<DateTime<Utc>>,
    pub next_eligible_at: Option<DateTime<Utc>>,
    pub today_published_count: usize,
}

pub struct SchedulerEngine {
    posts: Arc<PostStore>,
    settings: Arc<ConfigStore>,
    generator: Arc<dyn ContentGenerator>,
    publisher: Arc<dyn Publisher>,
    clock: Arc<dyn Clock>,
    /// Reentry guard: a tick never overlaps a still-running tick.
    tick_lock: tokio::sync::Mutex<()>,
    last_tick_at: Mutex<Option<DateTime<Utc>>>,
    tick_interval: Duration,
    generation_timeout: Duration,
    publish_timeout: Duration,
}

impl SchedulerEngine {
    /// Build the engine and sweep any `Generating` leftovers from a crashed
    /// run back to `Pending`.
    pub fn new(
        posts: Arc<PostStore>,
        settings: Arc<ConfigStore>,
        generator: Arc<dyn ContentGenerator>,
        publisher: Arc<dyn Publisher>,
        clock: Arc<dyn Clock>,
        config: &PostforgeConfig,
    ) -> Result<Self> {
        let swept = posts.recover_in_flight()?;
        if swept > 0 {
            tracing::info!("Recovered {swept} in-flight post(s) back to pending");
        }
        Ok(Self {
            posts,
            settings,
            generator,
            publisher,
            clock,
            tick_lock: tokio::sync::Mutex::new(()),
            last_tick_at: Mutex::new(None),
            tick_interval: Duration::from_secs(config.tick_interval_secs.max(1)),
            generation_timeout: Duration::from_secs(config.generation_timeout_secs.max(1)),
            publish_timeout: Duration::from_secs(config.publish_timeout_secs.max(1)),
        })
    }

    /// Drive ticks forever. The caller decides when to stop (ctrl-c).
    pub async fn run(&self) {
        tracing::info!(
            "Scheduler started — ticking every {}s with generator '{}' and publisher '{}'",
            self.tick_interval.as_secs(),
            self.generator.name(),
            self.publisher.name()
        );
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One gated tick. Never panics and never returns an error — anything
    /// unexpected is logged so the next tick can run.
    pub async fn tick(&self) {
        let Ok(_guard) = self.tick_lock.try_lock() else {
            tracing::warn!("Previous tick still running — skipping this tick");
            return;
        };
        let now = self.clock.now();
        self.set_last_tick(now);
        match self.run_tick(now, false).await {
            Ok(published) if published > 0 => {
                tracing::info!("Tick complete: {published} post(s) published");
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Tick failed: {e}"),
        }
    }

    /// Operator "publish now": runs the dispatch algorithm immediately,
    /// bypassing the day/time gate. The per-day cap still bounds selection,
    /// so the daily invariant holds across manual and scheduled runs alike.
    pub async fn trigger_now(&self) -> Result<usize> {
        let _guard = self.tick_lock.lock().await;
        let now = self.clock.now();
        self.set_last_tick(now);
        tracing::info!("Manual trigger — bypassing schedule gate");
        self.run_tick(now, true).await
    }

    pub fn status(&self) -> Result<SchedulerStatus> {
        let settings = self.settings.load_or_default();
        let now = self.clock.now();
        let last_tick_at = *self
            .last_tick_at
            .lock()
            .map_err(|e| PostforgeError::store(e.to_string()))?;
        Ok(SchedulerStatus {
            last_tick_at,
            next_eligible_at: next_eligible(&settings.schedule, now),
            today_published_count: self.posts.count_published_on(now.date_naive())?,
        })
    }

    fn set_last_tick(&self, now: DateTime<Utc>) {
        if let Ok(mut last) = self.last_tick_at.lock() {
            *last = Some(now);
        }
    }

    async fn run_tick(&self, now: DateTime<Utc>, bypass_gate: bool) -> Result<usize> {
        let settings = self.settings.load_or_default();
        let cap = settings.schedule.max_posts_per_day as usize;
        let published_today = self.posts.count_published_on(now.date_naive())?;

        if !bypass_gate && !gate_open(&settings.schedule, now, published_today) {
            return Ok(0);
        }

        // The cap bounds every dispatch path, manual triggers included.
        let mut budget = cap.saturating_sub(published_today);
        if budget == 0 {
            tracing::debug!("Daily cap of {cap} already reached");
            return Ok(0);
        }

        let mut published = 0;

        // Posts generated earlier but never published (crash recovery or an
        // operator retry) go out first, without regeneration.
        let mut leftovers = self.posts.list_by_state(PostState::ReadyToPublish)?;
        sort_for_dispatch(&mut leftovers);
        for record in &leftovers {
            if budget == 0 {
                break;
            }
            if self.publish_record(record, &settings).await {
                published += 1;
                budget -= 1;
            }
        }

        // Select due pending records, oldest first, up to what the cap allows.
        let mut eligible: Vec<PostRecord> = self
            .posts
            .list_pending()?
            .into_iter()
            .filter(|r| r.is_due(now))
            .collect();
        sort_for_dispatch(&mut eligible);
        eligible.truncate(budget);

        // Sequential on purpose: the day counter stays honest without locks,
        // and one slow generation cannot start a parallel stampede.
        let mut ready = Vec::new();
        for record in &eligible {
            if let Some(updated) = self.generate_record(record, &settings).await {
                ready.push(updated);
            }
        }

        for record in &ready {
            if self.publish_record(record, &settings).await {
                published += 1;
            }
        }

        Ok(published)
    }

    /// Claim a pending record and drive it through content generation.
    /// Returns the record in `ReadyToPublish`, or `None` when it failed or
    /// was claimed by someone else (a lost race is a skip, not an error).
    async fn generate_record(
        &self,
        record: &PostRecord,
        settings: &ScheduleSettings,
    ) -> Option<PostRecord> {
        match self
            .posts
            .transition(&record.id, PostState::Pending, PostState::Generating, |_| {})
        {
            Ok(_) => {}
            Err(PostforgeError::StaleState { id, actual, .. }) => {
                tracing::debug!("Post {id} already claimed (now {actual}) — skipping");
                return None;
            }
            Err(e) => {
                tracing::error!("Could not claim post {}: {e}", record.id);
                return None;
            }
        }

        tracing::info!("Generating content for '{}'", record.title);
        let outcome = timeout(
            self.generation_timeout,
            self.generator
                .generate(&record.title, &record.keywords, &settings.content),
        )
        .await;

        let content = match outcome {
            Err(_) => {
                let e = PostforgeError::Timeout(format!(
                    "content generation exceeded {}s",
                    self.generation_timeout.as_secs()
                ));
                self.fail_record(&record.id, &e.to_string());
                return None;
            }
            Ok(Err(e)) => {
                self.fail_record(&record.id, &e.to_string());
                return None;
            }
            Ok(Ok(mut content)) => {
                content.seo = Some(seo::analyze(
                    &content.body,
                    &record.title,
                    &content.keywords,
                    &settings.seo,
                ));
                content
            }
        };

        match self.posts.transition(
            &record.id,
            PostState::Generating,
            PostState::ReadyToPublish,
            |r| r.content = Some(content),
        ) {
            Ok(updated) => Some(updated),
            Err(e) => {
                tracing::warn!("Could not store content for post {}: {e}", record.id);
                None
            }
        }
    }

    /// Publish a `ReadyToPublish` record. On failure the generated content is
    /// retained so an operator retry republishes without regenerating.
    async fn publish_record(&self, record: &PostRecord, settings: &ScheduleSettings) -> bool {
        tracing::info!("Publishing '{}'", record.title);
        let outcome = timeout(
            self.publish_timeout,
            self.publisher.publish(record, &settings.seo),
        )
        .await;

        let post = match outcome {
            Err(_) => {
                let e = PostforgeError::Timeout(format!(
                    "publish exceeded {}s",
                    self.publish_timeout.as_secs()
                ));
                self.fail_record(&record.id, &e.to_string());
                return false;
            }
            Ok(Err(e)) => {
                self.fail_record(&record.id, &e.to_string());
                return false;
            }
            Ok(Ok(post)) => post,
        };

        let published_at = self.clock.now();
        match self.posts.transition(
            &record.id,
            PostState::ReadyToPublish,
            PostState::Published,
            |r| {
                r.published_at = Some(published_at);
                r.published_url = Some(post.url.clone());
            },
        ) {
            Ok(updated) => {
                tracing::info!("Published '{}' -> {}", updated.title, post.url);
                true
            }
            Err(PostforgeError::StaleState { id, actual, .. }) => {
                tracing::debug!("Post {id} moved to {actual} under us — skipping");
                false
            }
            Err(e) => {
                tracing::error!("Could not record publish of post {}: {e}", record.id);
                false
            }
        }
    }

    fn fail_record(&self, id: &str, reason: &str) {
        tracing::warn!("Post {id} failed: {reason}");
        if let Err(e) = self.posts.mark_failed(id, reason) {
            tracing::error!("Could not mark post {id} failed: {e}");
        }
    }
}

/// Step-2 gate: allowed weekday, configured time reached, cap not yet met.
fn gate_open(schedule: &ScheduleConfig, now: DateTime<Utc>, published_today: usize) -> bool {
    let today = DayOfWeek::from_chrono(now.weekday());
    if !schedule.allows(today) {
        tracing::debug!("{today} is not an allowed posting day");
        return false;
    }
    if published_today >= schedule.max_posts_per_day as usize {
        return false;
    }
    // Hourly cadence publishes at any time of an allowed day.
    if schedule.frequency != Frequency::Hourly && now.time() < schedule.time_of_day {
        return false;
    }
    true
}

/// Oldest first: scheduled slot ascending (unset means "as soon as
/// possible"), then creation time as the stable tie-break.
fn sort_for_dispatch(records: &mut [PostRecord]) {
    records.sort_by_key(|r| {
        (
            r.scheduled_for.unwrap_or(DateTime::<Utc>::MIN_UTC),
            r.created_at,
        )
    });
}

/// When the schedule next allows publishing, from `now`.
pub fn next_eligible(schedule: &ScheduleConfig, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    for offset in 0..=7u64 {
        let day = now.date_naive().checked_add_days(chrono::Days::new(offset))?;
        if !schedule.allows(DayOfWeek::from_chrono(day.weekday())) {
            continue;
        }
        let candidate = match schedule.frequency {
            Frequency::Hourly => {
                if offset == 0 {
                    now
                } else {
                    day.and_time(NaiveTime::MIN).and_utc()
                }
            }
            _ => day.and_time(schedule.time_of_day).and_utc(),
        };
        if candidate >= now {
            return Some(candidate);
        }
        if offset == 0 {
            // Today's slot already arrived; publishing is allowed right now.
            return Some(now);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use postforge_core::clock::ManualClock;
    use postforge_core::types::{ContentSettings, GeneratedContent, PublishedPost, SeoSettings};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    // Monday noon UTC.
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 4, 12, 0, 0).single().expect("valid")
    }

    fn tuesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 5, 12, 0, 0).single().expect("valid")
    }

    fn content(body: &str) -> GeneratedContent {
        GeneratedContent {
            body: body.into(),
            meta_description: "meta".into(),
            keywords: vec!["kw".into()],
            word_count: body.split_whitespace().count(),
            image_ref: None,
            seo: None,
        }
    }

    struct FakeGenerator {
        fail_titles: HashSet<String>,
        calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
    }

    impl FakeGenerator {
        fn ok() -> Self {
            Self {
                fail_titles: HashSet::new(),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn failing(titles: &[&str]) -> Self {
            Self {
                fail_titles: titles.iter().map(|t| t.to_string()).collect(),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                fail_titles: HashSet::new(),
                calls: AtomicUsize::new(0),
                gate: Some(gate),
            }
        }
    }

    #[async_trait]
    impl ContentGenerator for FakeGenerator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate(
            &self,
            title: &str,
            _keywords: &[String],
            _settings: &ContentSettings,
        ) -> postforge_core::Result<GeneratedContent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.expect("semaphore");
            }
            if self.fail_titles.contains(title) {
                return Err(PostforgeError::generation(format!("forced failure for {title}")));
            }
            Ok(content(&format!("## {title}\nGenerated body.")))
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl ContentGenerator for SlowGenerator {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(
            &self,
            _title: &str,
            _keywords: &[String],
            _settings: &ContentSettings,
        ) -> postforge_core::Result<GeneratedContent> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(content("never reached"))
        }
    }

    struct FakePublisher {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakePublisher {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        fn name(&self) -> &str {
            "fake"
        }

        async fn publish(
            &self,
            record: &PostRecord,
            _seo: &SeoSettings,
        ) -> postforge_core::Result<PublishedPost> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PostforgeError::publish("platform rejected the post"));
            }
            Ok(PublishedPost {
                url: format!("https://example.blogspot.com/{}", record.id),
            })
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        posts: Arc<PostStore>,
        settings: Arc<ConfigStore>,
        clock: Arc<ManualClock>,
    }

    fn harness(start: DateTime<Utc>, max_posts_per_day: u32) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let posts = Arc::new(PostStore::open(dir.path().join("posts.json")).expect("posts"));
        let settings = Arc::new(ConfigStore::open(dir.path().join("schedule.json")));
        let mut doc = ScheduleSettings::default();
        doc.schedule.max_posts_per_day = max_posts_per_day;
        doc.schedule.time_of_day = NaiveTime::from_hms_opt(10, 0, 0).expect("time");
        doc.content.auto_generate_images = false;
        settings.save(&doc).expect("save settings");
        Harness {
            _dir: dir,
            posts,
            settings,
            clock: Arc::new(ManualClock::new(start)),
        }
    }

    fn engine(
        h: &Harness,
        generator: Arc<dyn ContentGenerator>,
        publisher: Arc<dyn Publisher>,
    ) -> SchedulerEngine {
        SchedulerEngine::new(
            Arc::clone(&h.posts),
            Arc::clone(&h.settings),
            generator,
            publisher,
            Arc::clone(&h.clock) as Arc<dyn Clock>,
            &PostforgeConfig::default(),
        )
        .expect("engine")
    }

    fn seed_pending(h: &Harness, titles: &[&str], at: DateTime<Utc>) {
        for (i, title) in titles.iter().enumerate() {
            let mut record = PostRecord::new(
                *title,
                vec![],
                None,
                at + chrono::Duration::seconds(i as i64),
            );
            record.scheduled_for = Some(at);
            h.posts.insert(record).expect("insert");
        }
    }

    #[tokio::test]
    async fn test_cap_never_exceeded_across_ticks() {
        let h = harness(monday(), 2);
        seed_pending(&h, &["a", "b", "c", "d", "e"], monday() - chrono::Duration::days(1));
        let e = engine(&h, Arc::new(FakeGenerator::ok()), Arc::new(FakePublisher::ok()));

        for _ in 0..4 {
            e.tick().await;
        }
        assert_eq!(
            h.posts.count_published_on(monday().date_naive()).expect("count"),
            2
        );

        // The next allowed day opens a fresh budget.
        h.clock.set(monday() + chrono::Duration::days(1));
        e.tick().await;
        let next_day = (monday() + chrono::Duration::days(1)).date_naive();
        assert_eq!(h.posts.count_published_on(next_day).expect("count"), 2);
    }

    #[tokio::test]
    async fn test_disallowed_weekday_is_noop() {
        let h = harness(tuesday(), 2);
        let mut doc = h.settings.load().expect("load");
        doc.schedule.allowed_days = vec![DayOfWeek::Monday];
        h.settings.save(&doc).expect("save");
        seed_pending(&h, &["a", "b"], tuesday() - chrono::Duration::days(1));

        let generator = Arc::new(FakeGenerator::ok());
        let e = engine(&h, Arc::clone(&generator) as Arc<dyn ContentGenerator>, Arc::new(FakePublisher::ok()));
        e.tick().await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.posts.list_pending().expect("pending").len(), 2);
        assert_eq!(
            h.posts.count_published_on(tuesday().date_naive()).expect("count"),
            0
        );
    }

    #[tokio::test]
    async fn test_selects_two_oldest_of_three() {
        let h = harness(monday(), 2);
        let yesterday = monday() - chrono::Duration::days(1);
        seed_pending(&h, &["oldest", "middle", "newest"], yesterday);

        let e = engine(&h, Arc::new(FakeGenerator::ok()), Arc::new(FakePublisher::ok()));
        e.tick().await;

        let pending = h.posts.list_pending().expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "newest");
        let published = h.posts.list_by_state(PostState::Published).expect("published");
        let titles: Vec<&str> = published.iter().map(|r| r.title.as_str()).collect();
        assert!(titles.contains(&"oldest"));
        assert!(titles.contains(&"middle"));
    }

    #[tokio::test]
    async fn test_generation_failure_does_not_block_the_rest() {
        let h = harness(monday(), 3);
        let yesterday = monday() - chrono::Duration::days(1);
        seed_pending(&h, &["bad title", "good title"], yesterday);

        let e = engine(
            &h,
            Arc::new(FakeGenerator::failing(&["bad title"])),
            Arc::new(FakePublisher::ok()),
        );
        e.tick().await;

        let failed = h.posts.list_by_state(PostState::Failed).expect("failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].title, "bad title");
        assert!(failed[0]
            .failure_reason
            .as_deref()
            .expect("reason")
            .contains("forced failure"));

        let published = h.posts.list_by_state(PostState::Published).expect("published");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title, "good title");
        assert!(published[0].published_at.is_some());
        assert_eq!(
            h.posts.count_published_on(monday().date_naive()).expect("count"),
            1
        );
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_content_for_retry() {
        let h = harness(monday(), 1);
        seed_pending(&h, &["unlucky"], monday() - chrono::Duration::days(1));

        let e = engine(&h, Arc::new(FakeGenerator::ok()), Arc::new(FakePublisher::failing()));
        e.tick().await;

        let failed = h.posts.list_by_state(PostState::Failed).expect("failed");
        assert_eq!(failed.len(), 1);
        assert!(failed[0].content.is_some());
        assert!(failed[0].published_at.is_none());

        // Operator retry goes straight back to ReadyToPublish; the next tick
        // publishes without regenerating.
        h.posts.retry(&failed[0].id).expect("retry");
        let generator = Arc::new(FakeGenerator::ok());
        let e = engine(
            &h,
            Arc::clone(&generator) as Arc<dyn ContentGenerator>,
            Arc::new(FakePublisher::ok()),
        );
        e.tick().await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.posts.list_by_state(PostState::Published).expect("published").len(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_timeout_fails_the_record() {
        let h = harness(monday(), 1);
        seed_pending(&h, &["slowpoke"], monday() - chrono::Duration::days(1));

        let e = engine(&h, Arc::new(SlowGenerator), Arc::new(FakePublisher::ok()));
        e.tick().await;

        let failed = h.posts.list_by_state(PostState::Failed).expect("failed");
        assert_eq!(failed.len(), 1);
        assert!(failed[0]
            .failure_reason
            .as_deref()
            .expect("reason")
            .contains("Timed out"));
    }

    #[tokio::test]
    async fn test_manual_trigger_bypasses_day_gate_but_not_cap() {
        let h = harness(tuesday(), 1);
        let mut doc = h.settings.load().expect("load");
        doc.schedule.allowed_days = vec![DayOfWeek::Monday];
        h.settings.save(&doc).expect("save");
        seed_pending(&h, &["first", "second"], tuesday() - chrono::Duration::days(1));

        let e = engine(&h, Arc::new(FakeGenerator::ok()), Arc::new(FakePublisher::ok()));

        // Gated tick does nothing on a Tuesday…
        e.tick().await;
        assert_eq!(
            h.posts.count_published_on(tuesday().date_naive()).expect("count"),
            0
        );

        // …but the operator can force it. The cap still limits it to one.
        let published = e.trigger_now().await.expect("trigger");
        assert_eq!(published, 1);
        let again = e.trigger_now().await.expect("trigger again");
        assert_eq!(again, 0);
        assert_eq!(
            h.posts.count_published_on(tuesday().date_naive()).expect("count"),
            1
        );
    }

    #[tokio::test]
    async fn test_time_of_day_gate() {
        let early = Utc.with_ymd_and_hms(2021, 1, 4, 8, 0, 0).single().expect("valid");
        let h = harness(early, 1);
        seed_pending(&h, &["morning post"], early - chrono::Duration::days(1));

        let e = engine(&h, Arc::new(FakeGenerator::ok()), Arc::new(FakePublisher::ok()));
        e.tick().await;
        assert_eq!(h.posts.list_pending().expect("pending").len(), 1);

        h.clock.set(Utc.with_ymd_and_hms(2021, 1, 4, 10, 5, 0).single().expect("valid"));
        e.tick().await;
        assert_eq!(h.posts.list_pending().expect("pending").len(), 0);
    }

    #[tokio::test]
    async fn test_not_yet_due_records_wait() {
        let h = harness(monday(), 5);
        let mut record = PostRecord::new("future", vec![], None, monday());
        record.scheduled_for = Some(monday() + chrono::Duration::days(2));
        h.posts.insert(record).expect("insert");

        let e = engine(&h, Arc::new(FakeGenerator::ok()), Arc::new(FakePublisher::ok()));
        e.tick().await;
        assert_eq!(h.posts.list_pending().expect("pending").len(), 1);
    }

    #[tokio::test]
    async fn test_restart_sweeps_generating_and_resumes_ready() {
        let h = harness(monday(), 3);
        let yesterday = monday() - chrono::Duration::days(1);
        seed_pending(&h, &["was generating", "was ready"], yesterday);

        // Simulate a crash mid-tick: one record stuck Generating, one fully
        // generated but never published.
        let records = h.posts.list().expect("list");
        let generating = records.iter().find(|r| r.title == "was generating").expect("record");
        let ready = records.iter().find(|r| r.title == "was ready").expect("record");
        h.posts
            .transition(&generating.id, PostState::Pending, PostState::Generating, |_| {})
            .expect("to generating");
        h.posts
            .transition(&ready.id, PostState::Pending, PostState::Generating, |_| {})
            .expect("to generating");
        h.posts
            .transition(&ready.id, PostState::Generating, PostState::ReadyToPublish, |r| {
                r.content = Some(content("already generated"))
            })
            .expect("to ready");

        let generator = Arc::new(FakeGenerator::ok());
        let e = engine(
            &h,
            Arc::clone(&generator) as Arc<dyn ContentGenerator>,
            Arc::new(FakePublisher::ok()),
        );

        // Engine construction swept the Generating leftover back to Pending.
        assert_eq!(h.posts.list_pending().expect("pending").len(), 1);

        e.tick().await;
        let published = h.posts.list_by_state(PostState::Published).expect("published");
        assert_eq!(published.len(), 2);
        // "was ready" went out without a second generation.
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reentry_guard_skips_overlapping_tick() {
        let h = harness(monday(), 2);
        seed_pending(&h, &["blocked", "waiting"], monday() - chrono::Duration::days(1));

        let gate = Arc::new(Semaphore::new(0));
        let e = Arc::new(engine(
            &h,
            Arc::new(FakeGenerator::gated(Arc::clone(&gate))),
            Arc::new(FakePublisher::ok()),
        ));

        let first = {
            let e = Arc::clone(&e);
            tokio::spawn(async move { e.tick().await })
        };

        // Wait until the first tick has claimed its first record.
        for _ in 0..200 {
            if !h.posts.list_by_state(PostState::Generating).expect("list").is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(h.posts.list_by_state(PostState::Generating).expect("list").len(), 1);

        // A second tick while the first is mid-flight is a no-op: the other
        // due record stays untouched.
        e.tick().await;
        assert_eq!(h.posts.list_pending().expect("pending").len(), 1);
        assert_eq!(h.posts.list_by_state(PostState::Generating).expect("list").len(), 1);

        gate.add_permits(2);
        first.await.expect("join");
        assert_eq!(h.posts.list_by_state(PostState::Published).expect("list").len(), 2);
    }

    #[test]
    fn test_gate_open_logic() {
        let schedule = ScheduleConfig {
            frequency: Frequency::Daily,
            time_of_day: NaiveTime::from_hms_opt(10, 0, 0).expect("time"),
            allowed_days: vec![DayOfWeek::Monday],
            max_posts_per_day: 2,
        };
        assert!(gate_open(&schedule, monday(), 0));
        assert!(gate_open(&schedule, monday(), 1));
        assert!(!gate_open(&schedule, monday(), 2));
        assert!(!gate_open(&schedule, tuesday(), 0));

        let before_time = Utc.with_ymd_and_hms(2021, 1, 4, 9, 59, 0).single().expect("valid");
        assert!(!gate_open(&schedule, before_time, 0));

        let hourly = ScheduleConfig {
            frequency: Frequency::Hourly,
            ..schedule
        };
        assert!(gate_open(&hourly, before_time, 0));
    }

    #[test]
    fn test_next_eligible() {
        let schedule = ScheduleConfig {
            frequency: Frequency::Weekly,
            time_of_day: NaiveTime::from_hms_opt(10, 0, 0).expect("time"),
            allowed_days: vec![DayOfWeek::Wednesday],
            max_posts_per_day: 1,
        };
        // Monday noon → Wednesday 10:00.
        let next = next_eligible(&schedule, monday()).expect("next");
        assert_eq!(
            next,
            Utc.with_ymd_and_hms(2021, 1, 6, 10, 0, 0).single().expect("valid")
        );

        // Wednesday noon (slot passed) → still eligible now.
        let wednesday_noon = Utc.with_ymd_and_hms(2021, 1, 6, 12, 0, 0).single().expect("valid");
        assert_eq!(next_eligible(&schedule, wednesday_noon), Some(wednesday_noon));
    }

    #[test]
    fn test_dispatch_order() {
        let now = monday();
        let mut records = vec![
            PostRecord::new("later slot", vec![], Some(now + chrono::Duration::hours(2)), now),
            PostRecord::new("asap", vec![], None, now + chrono::Duration::seconds(1)),
            PostRecord::new("early slot", vec![], Some(now + chrono::Duration::hours(1)), now),
        ];
        sort_for_dispatch(&mut records);
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["asap", "early slot", "later slot"]);
    }
}
