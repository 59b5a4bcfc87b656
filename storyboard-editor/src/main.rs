//! Storyboard editor (storyboard-editor) - Main entry point
//!
//! Command-line driver for the scene segmentation engine:
//! - `local`: segment a plain-text story and generate mock illustrations
//! - `review`: review a scene splitter job, commit merges, poll for images
//! - `documents`: list uploaded documents and their job status

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use storyboard_common::config::{load_config, TomlConfig};
use storyboard_common::events::EventBus;
use storyboard_editor::client::{ImageGeneratorClient, SceneSplitterClient};
use storyboard_editor::config::ServiceEndpoints;
use storyboard_editor::models::{status_label, Scene};
use storyboard_editor::services::{ImagePoller, PunctuationSplitter};
use storyboard_editor::{DocumentLibrary, ReviewSession, StorySession};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Command-line arguments for storyboard-editor
#[derive(Parser, Debug)]
#[command(name = "storyboard-editor")]
#[command(about = "Scene segmentation and illustration driver")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "STORYBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Segment a plain-text story and generate mock illustrations
    Local {
        /// Plain-text story file
        #[arg(short, long)]
        file: PathBuf,
        /// Target scene count
        #[arg(short, long)]
        scenes: Option<usize>,
        /// Concurrent generation workers
        #[arg(short, long)]
        parallel: Option<usize>,
    },
    /// Review the scenes of a scene splitter job
    Review {
        /// Processing job id
        #[arg(short, long)]
        job: Uuid,
        /// Story id used by the image generator (defaults to the job id)
        #[arg(long)]
        story: Option<Uuid>,
        /// Queue and commit merges for short scenes
        #[arg(long)]
        auto_merge: bool,
        /// Sentence count below which a scene is short (defaults to config)
        #[arg(long, requires = "auto_merge")]
        threshold: Option<usize>,
        /// Approve the segmentation after review
        #[arg(long)]
        approve: bool,
        /// Poll the image generator until every scene is ready
        #[arg(long)]
        poll: bool,
    },
    /// List uploaded documents
    Documents,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    // Initialize tracing: RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("storyboard_editor={}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storyboard-editor v{}", env!("CARGO_PKG_VERSION"));
    let events = EventBus::default();

    match args.command {
        Command::Local {
            file,
            scenes,
            parallel,
        } => run_local(&config, events, file, scenes, parallel).await,
        Command::Review {
            job,
            story,
            auto_merge,
            threshold,
            approve,
            poll,
        } => {
            let threshold =
                auto_merge.then(|| threshold.unwrap_or(config.review.short_scene_threshold));
            run_review(&config, events, job, story, threshold, approve, poll).await
        }
        Command::Documents => run_documents(&config, events).await,
    }
}

async fn run_local(
    config: &TomlConfig,
    events: EventBus,
    file: PathBuf,
    scenes: Option<usize>,
    parallel: Option<usize>,
) -> Result<()> {
    let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read story file {}", file.display()))?;

    let mut session =
        StorySession::from_text(&text, &PunctuationSplitter, events, &config.generation);
    session.query_mut().page_size = config.review.page_size;
    let target = scenes.unwrap_or(config.review.target_scene_count);
    let count = session.segment(target).await;
    info!(scenes = count, "Story segmented");

    for scene in session.board().scenes().await {
        session.approve(scene.id, true).await;
    }

    let workers = parallel.unwrap_or(config.generation.max_parallel);
    match session.generate_approved(workers).await {
        Some(summary) => println!(
            "Generated {} scene(s) with {} worker(s) in {:.1}s: {} ready, {} failed",
            summary.queued,
            summary.workers,
            summary.duration.as_secs_f64(),
            summary.ready,
            summary.failed
        ),
        None => println!("Nothing to generate"),
    }

    print_scenes(&session.board().scenes().await);
    Ok(())
}

async fn run_review(
    config: &TomlConfig,
    events: EventBus,
    job: Uuid,
    story: Option<Uuid>,
    auto_merge: Option<usize>,
    approve: bool,
    poll: bool,
) -> Result<()> {
    let endpoints = ServiceEndpoints::resolve(config);
    let splitter = SceneSplitterClient::new(&endpoints.scene_splitter_url)
        .context("Failed to create scene splitter client")?;
    let mut session = ReviewSession::new(Arc::new(splitter), Arc::new(PunctuationSplitter), events);
    session.query_mut().page_size = config.review.page_size;

    session
        .load_scenes(job)
        .await
        .with_context(|| format!("Failed to load scenes for job {}", job))?;

    if let Some(threshold) = auto_merge {
        let queued = session.queue_short_scenes(threshold).await;
        if queued > 0 {
            let groups = session
                .commit_merges()
                .await
                .context("Failed to commit merges")?;
            println!("Merged {} group(s) of short scenes", groups);
        }
    }

    print_scenes(&session.scenes().await);

    if approve {
        session
            .approve_current_job()
            .await
            .context("Failed to approve segmentation")?;
        println!("Segmentation approved");
    }

    if poll {
        let images = ImageGeneratorClient::new(
            &endpoints.image_generator_url,
            config.polling.image_expires_seconds,
        )
        .context("Failed to create image generator client")?;
        let poller = ImagePoller::new(
            session.board().clone(),
            Arc::new(images),
            config.polling.concurrency,
        );

        let story_id = story.unwrap_or(job);
        let handle = poller
            .start_polling(story_id, Duration::from_millis(config.polling.interval_ms))
            .await;

        let finished = handle.join();
        tokio::pin!(finished);
        tokio::select! {
            _ = &mut finished => info!(%story_id, "All scenes ready"),
            result = signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                poller.stop_polling().await;
                info!(%story_id, "Polling stopped by user");
            }
        }

        print_scenes(&session.scenes().await);
    }

    Ok(())
}

async fn run_documents(config: &TomlConfig, events: EventBus) -> Result<()> {
    let endpoints = ServiceEndpoints::resolve(config);
    let splitter = SceneSplitterClient::new(&endpoints.scene_splitter_url)
        .context("Failed to create scene splitter client")?;
    let mut library = DocumentLibrary::new(Arc::new(splitter), events);

    library
        .load_documents()
        .await
        .context("Failed to load documents")?;

    for doc in library.documents() {
        let job = doc.latest_job();
        println!(
            "{}  {:<40}  {:<18}  {}",
            doc.id,
            doc.filename,
            status_label(job.map(|j| j.status.as_str())),
            job.map(|j| j.id.to_string()).unwrap_or_default()
        );
    }
    Ok(())
}

fn print_scenes(scenes: &[Scene]) {
    for scene in scenes {
        println!(
            "{:>3}  {:<10}  {:>3} sentence(s)  {}",
            scene.scene_number,
            scene.status.as_str(),
            scene.sentence_count(),
            scene.title
        );
    }
}
