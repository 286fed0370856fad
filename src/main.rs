//! # Postforge CLI
//!
//! Scheduled AI blog-post pipeline — bulk titles in, published posts out.
//!
//! Usage:
//!   postforge run                         # Start the scheduler loop
//!   postforge trigger                     # Publish now, bypassing the gate
//!   postforge titles import titles.csv    # Bulk-import titles
//!   postforge schedule                    # Lay queued titles onto the calendar
//!   postforge status                      # Loop status
//!   postforge onboard                     # First-time setup

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use postforge_core::clock::SystemClock;
use postforge_core::traits::{ContentGenerator, Publisher};
use postforge_core::types::{DayOfWeek, Frequency, PostState};
use postforge_core::PostforgeConfig;
use postforge_scheduler::{next_eligible, plan_schedule, SchedulerEngine};
use postforge_store::{import, ConfigStore, PostStore, TitleStore};

#[derive(Parser)]
#[command(
    name = "postforge",
    version,
    about = "📮 Postforge — scheduled AI blog-post pipeline",
    long_about = "Bulk-uploaded titles are turned into scheduled posts, driven through AI \
                  article and image generation with SEO analysis, and published to the blog \
                  on a configured cadence."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scheduler loop
    Run,

    /// Run exactly one gated tick
    Tick,

    /// Publish now, bypassing the day/time gate (the daily cap still holds)
    Trigger,

    /// Show scheduler status
    Status,

    /// Manage the bulk-title queue
    Titles {
        #[command(subcommand)]
        action: TitlesAction,
    },

    /// Convert queued titles into scheduled posts
    Schedule,

    /// Inspect and retry post records
    Posts {
        #[command(subcommand)]
        action: PostsAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// First-time setup
    Onboard,
}

#[derive(Subcommand)]
enum TitlesAction {
    /// Queue a single title
    Add {
        title: String,

        /// Comma-separated keywords
        #[arg(short, long, value_delimiter = ',')]
        keywords: Vec<String>,
    },
    /// Bulk-import titles from a .csv or .txt file
    Import { file: String },
    /// List queued titles
    List,
}

#[derive(Subcommand)]
enum PostsAction {
    /// List post records
    List {
        /// Filter by state (pending, generating, ready_to_publish, published, failed)
        #[arg(short, long)]
        state: Option<String>,
    },
    /// Reset a failed post for another attempt
    Retry { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show process config and schedule settings
    Show,
    /// Update the posting schedule
    SetSchedule {
        /// daily, weekly, or hourly
        #[arg(long)]
        frequency: Option<String>,

        /// Posting time, HH:MM (UTC)
        #[arg(long)]
        time: Option<String>,

        /// Comma-separated allowed days (monday,wednesday,…)
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,

        #[arg(long)]
        max_per_day: Option<u32>,
    },
    /// Reset schedule settings to defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "postforge=debug,postforge_core=debug,postforge_store=debug,postforge_scheduler=debug,\
         postforge_content=debug,postforge_publisher=debug"
    } else {
        "postforge=info,postforge_scheduler=info,postforge_store=info,postforge_content=info,\
         postforge_publisher=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        PostforgeConfig::load_from(Path::new(path))?
    } else {
        PostforgeConfig::load()?
    };

    match cli.command {
        Commands::Run => {
            let engine = build_engine(&config)?;
            println!(
                "📮 Postforge v{} — scheduler running. Press Ctrl+C to stop.",
                env!("CARGO_PKG_VERSION")
            );
            tokio::select! {
                _ = engine.run() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
            println!("\n👋 Scheduler stopped.");
        }

        Commands::Tick => {
            let engine = build_engine(&config)?;
            engine.tick().await;
            print_status(&engine)?;
        }

        Commands::Trigger => {
            let engine = build_engine(&config)?;
            let published = engine.trigger_now().await?;
            println!("✅ Manual trigger complete: {published} post(s) published");
        }

        Commands::Status => {
            // Read-only: inspect the stores directly rather than standing up
            // an engine (whose construction runs the restart sweep).
            let posts = PostStore::open(config.posts_path())?;
            let titles = TitleStore::open(config.titles_path())?;
            let settings = ConfigStore::open(config.schedule_path()).load_or_default();
            let now = chrono::Utc::now();
            println!("📮 Postforge status");
            println!(
                "   Next eligible:    {}",
                fmt_time(next_eligible(&settings.schedule, now))
            );
            println!(
                "   Published today:  {}",
                posts.count_published_on(now.date_naive())?
            );
            println!("   Queued titles:    {}", titles.len()?);
            for state in [
                PostState::Pending,
                PostState::Generating,
                PostState::ReadyToPublish,
                PostState::Published,
                PostState::Failed,
            ] {
                let count = posts.list_by_state(state)?.len();
                if count > 0 {
                    let name = state.to_string();
                    println!("   {name:<17} {count}");
                }
            }
        }

        Commands::Titles { action } => match action {
            TitlesAction::Add { title, keywords } => {
                let titles = TitleStore::open(config.titles_path())?;
                let entry = titles.add(title, keywords, chrono::Utc::now())?;
                println!("✅ Queued: {}", entry.title);
            }
            TitlesAction::Import { file } => {
                let parsed = import::parse_file(Path::new(&file))?;
                if parsed.is_empty() {
                    return Err(anyhow!("no valid titles found in {file}"));
                }
                let titles = TitleStore::open(config.titles_path())?;
                let posts = PostStore::open(config.posts_path())?;
                let taken: HashSet<String> = posts
                    .list()?
                    .iter()
                    .map(|r| r.title.to_lowercase())
                    .collect();
                let added = titles.add_bulk(parsed, &taken, chrono::Utc::now())?;
                println!("✅ Imported {added} title(s) from {file}");
            }
            TitlesAction::List => {
                let titles = TitleStore::open(config.titles_path())?;
                let queued = titles.list()?;
                if queued.is_empty() {
                    println!("(title queue is empty)");
                }
                for entry in queued {
                    if entry.keywords.is_empty() {
                        println!("  {}", entry.title);
                    } else {
                        println!("  {}  [{}]", entry.title, entry.keywords.join(", "));
                    }
                }
            }
        },

        Commands::Schedule => {
            let titles = TitleStore::open(config.titles_path())?;
            let posts = PostStore::open(config.posts_path())?;
            let settings = ConfigStore::open(config.schedule_path()).load()?;
            let created = plan_schedule(&titles, &posts, &settings.schedule, chrono::Utc::now())?;
            if created.is_empty() {
                println!("No queued titles to schedule.");
            } else {
                println!("✅ Scheduled {} post(s):", created.len());
                for record in created {
                    let slot = record
                        .scheduled_for
                        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "asap".into());
                    println!("  {slot}  {}", record.title);
                }
            }
        }

        Commands::Posts { action } => match action {
            PostsAction::List { state } => {
                let posts = PostStore::open(config.posts_path())?;
                let records = match state {
                    Some(s) => {
                        let state: PostState = s.parse().map_err(|e: String| anyhow!(e))?;
                        posts.list_by_state(state)?
                    }
                    None => posts.list()?,
                };
                if records.is_empty() {
                    println!("(no post records)");
                }
                for record in records {
                    let detail = match record.state {
                        PostState::Published => record.published_url.clone().unwrap_or_default(),
                        PostState::Failed => record.failure_reason.clone().unwrap_or_default(),
                        _ => record
                            .scheduled_for
                            .map(|at| format!("scheduled {}", at.format("%Y-%m-%d %H:%M")))
                            .unwrap_or_else(|| "asap".into()),
                    };
                    println!("  [{:<16}] {}  {}  {detail}", record.state.to_string(), record.id, record.title);
                }
            }
            PostsAction::Retry { id } => {
                let posts = PostStore::open(config.posts_path())?;
                let record = posts.retry(&id)?;
                println!("✅ Post '{}' reset to {}", record.title, record.state);
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("# Process config ({})", PostforgeConfig::default_path().display());
                println!("{}", toml::to_string_pretty(&config)?);
                let settings = ConfigStore::open(config.schedule_path()).load_or_default();
                println!("# Schedule settings ({})", config.schedule_path().display());
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            ConfigAction::SetSchedule {
                frequency,
                time,
                days,
                max_per_day,
            } => {
                let store = ConfigStore::open(config.schedule_path());
                let mut settings = store.load_or_default();
                if let Some(frequency) = frequency {
                    settings.schedule.frequency =
                        frequency.parse::<Frequency>().map_err(|e| anyhow!(e))?;
                }
                if let Some(time) = time {
                    settings.schedule.time_of_day = parse_time(&time)?;
                }
                if !days.is_empty() {
                    settings.schedule.allowed_days = days
                        .iter()
                        .map(|d| d.parse::<DayOfWeek>())
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map_err(|e| anyhow!(e))?;
                }
                if let Some(max) = max_per_day {
                    settings.schedule.max_posts_per_day = max;
                }
                store.save(&settings)?;
                println!("✅ Schedule updated:");
                println!("{}", serde_json::to_string_pretty(&settings.schedule)?);
            }
            ConfigAction::Reset => {
                let store = ConfigStore::open(config.schedule_path());
                store.save(&Default::default())?;
                println!("✅ Schedule settings reset to defaults.");
            }
        },

        Commands::Onboard => {
            println!("📮 Postforge — First-time Setup\n");

            let config = PostforgeConfig::default();
            config.save()?;
            println!("✅ Config saved to: {}", PostforgeConfig::default_path().display());

            std::fs::create_dir_all(&config.data_dir)?;
            std::fs::create_dir_all(config.images_dir())?;
            ConfigStore::open(config.schedule_path()).load()?;
            println!("✅ Data directory created: {}", config.data_dir.display());

            println!("\n📋 Next steps:");
            println!("  1. Add API keys to {}", PostforgeConfig::default_path().display());
            println!("     (openai_api_key, hf_api_key, blogger_blog_id, blogger_access_token)");
            println!("  2. Import titles: postforge titles import titles.csv");
            println!("  3. Lay out the calendar: postforge schedule");
            println!("  4. Start the loop: postforge run");
        }
    }

    Ok(())
}

fn build_engine(config: &PostforgeConfig) -> Result<SchedulerEngine> {
    let posts = Arc::new(PostStore::open(config.posts_path())?);
    let settings = Arc::new(ConfigStore::open(config.schedule_path()));
    let generator: Arc<dyn ContentGenerator> =
        Arc::from(postforge_content::create_generator(config)?);
    let publisher: Arc<dyn Publisher> = Arc::from(postforge_publisher::create_publisher(config)?);
    Ok(SchedulerEngine::new(
        posts,
        settings,
        generator,
        publisher,
        Arc::new(SystemClock),
        config,
    )?)
}

fn print_status(engine: &SchedulerEngine) -> Result<()> {
    let status = engine.status()?;
    println!("📮 Postforge status");
    println!("   Last tick:        {}", fmt_time(status.last_tick_at));
    println!("   Next eligible:    {}", fmt_time(status.next_eligible_at));
    println!("   Published today:  {}", status.today_published_count);
    Ok(())
}

fn fmt_time(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".into())
}

fn parse_time(s: &str) -> Result<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| anyhow!("invalid time '{s}' — use HH:MM"))
}
