//! # Thumb Studio
//!
//! Command-line tool for saved layouts and local studio state.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use studio_app::{CliArgs, Command, StudioConfig};
use studio_core::gamification::LocalClock;
use studio_core::{layers, CreditLedger, FileStore, GamificationEngine, KeyValueStore, Scene, SceneDocument};
use studio_renderer::{ExportConfig, ExportFormat, SceneExporter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let json_logs = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,studio_app=debug,studio_core=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let args = CliArgs::parse();
    let command = args.command.clone();
    let config = StudioConfig::from(args);
    tracing::debug!(data_dir = %config.data_dir.display(), "Starting thumb-studio");

    match command {
        Command::Export { layout, out, width } => export(&layout, &out, width),
        Command::Credits { add } => credits(&config, add),
        Command::Progress => progress(&config),
        Command::Layers { layout } => list_layers(&layout),
    }
}

fn open_store(config: &StudioConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("cannot open data directory {}", config.data_dir.display()))?;
    Ok(Arc::new(store))
}

fn load_scene(path: &Path) -> anyhow::Result<Scene> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let scene = SceneDocument::from_json(&json)
        .and_then(SceneDocument::into_scene)
        .with_context(|| format!("invalid layout {}", path.display()))?;
    Ok(scene)
}

fn export(layout: &Path, out: &Path, width: u32) -> anyhow::Result<()> {
    let format = out
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ExportFormat::from_extension)
        .with_context(|| format!("unsupported output format for {}", out.display()))?;
    let scene = load_scene(layout)?;

    let exporter = SceneExporter::new(ExportConfig {
        width,
        ..ExportConfig::default()
    });
    let bytes = exporter.export(&scene, format)?;
    std::fs::write(out, &bytes).with_context(|| format!("cannot write {}", out.display()))?;

    let (w, h) = SceneExporter::output_size(&scene, width)?;
    tracing::info!(path = %out.display(), width = w, height = h, bytes = bytes.len(), "Exported");
    println!("{} ({w}x{h}, {})", out.display(), format.mime_type());
    Ok(())
}

fn credits(config: &StudioConfig, add: Option<u64>) -> anyhow::Result<()> {
    let ledger = CreditLedger::with_starting_balance(open_store(config)?, config.starting_credits);
    let balance = match add {
        Some(amount) => ledger.add(amount)?,
        None => ledger.balance()?,
    };
    println!("credits: {balance}");
    Ok(())
}

fn progress(config: &StudioConfig) -> anyhow::Result<()> {
    let engine = GamificationEngine::load(open_store(config)?, Arc::new(LocalClock))?;
    let snapshot = engine.snapshot();
    let state = &snapshot.state;

    match state.points_for_next_level {
        Some(next) => println!(
            "level {} ({}): {} / {next} points",
            state.level, state.level_name, state.points
        ),
        None => println!("level {} ({}): {} points", state.level, state.level_name, state.points),
    }
    println!("streak: {} day(s)", state.daily_streak.count);
    println!(
        "thumbnails: {}, high scores: {}, fast creations: {}",
        state.stats.thumbnails_created, state.stats.high_scores, state.stats.fast_creations
    );

    println!("\nachievements:");
    for achievement in &snapshot.full_achievements {
        let mark = if achievement.unlocked { "x" } else { " " };
        println!(
            "  [{mark}] {} {} (+{}): {}",
            achievement.icon, achievement.name, achievement.points, achievement.description
        );
    }

    println!("\ntoday's challenges:");
    for challenge in &state.challenges.list {
        let mark = if challenge.is_complete { "x" } else { " " };
        println!(
            "  [{mark}] {} {}/{} (+{}): {}",
            challenge.name, challenge.current, challenge.goal, challenge.points, challenge.description
        );
    }
    Ok(())
}

fn list_layers(layout: &Path) -> anyhow::Result<()> {
    let scene = load_scene(layout)?;
    let rows = layers::project(&scene);
    if rows.is_empty() {
        println!("(no layers)");
    }
    for row in rows {
        let visible = if row.visible { "visible" } else { "hidden" };
        let locked = if row.locked { ", locked" } else { "" };
        println!("{}  {} [{}] {visible}{locked}", row.id, row.name, row.kind_label);
    }
    Ok(())
}
