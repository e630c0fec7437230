//! Command handlers.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use pitchbox_core::App;
use pitchbox_core::capture::SelectedFile;
use pitchbox_core::domain::{ArtifactId, CatalogCategory, CatalogQuery};
use pitchbox_core::impls::{AccessMode, FakeMediaDevices, SimulatedEngine, SimulatedFullscreen};
use pitchbox_core::playback::PlaybackState;
use serde::Serialize;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Best-effort MIME type from a file extension.
fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("ogv") => "video/ogg",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

pub async fn upload(
    app: &App,
    file: &Path,
    title: &str,
    description: &str,
    mime_type: Option<String>,
) -> CommandResult {
    let bytes = std::fs::read(file)?;
    let selected = SelectedFile {
        name: file.display().to_string(),
        mime_type: mime_type.unwrap_or_else(|| guess_mime_type(file).to_string()),
        bytes: Bytes::from(bytes),
    };

    // there is no camera on this path; only file selection is used
    let devices = Arc::new(FakeMediaDevices::with_mode(AccessMode::Unavailable));
    let mut session = app.new_capture_session(devices);
    session.select_file(Some(selected))?;

    let record = app.publish(&mut session, title, description).await?;
    println!("{}", record.id);
    Ok(())
}

pub fn list(
    app: &App,
    category: CatalogCategory,
    text: Option<String>,
    json: bool,
) -> CommandResult {
    let mut query = CatalogQuery::new(category);
    if let Some(text) = text {
        query = query.with_text(text);
    }
    let entries = app.catalog().list_pitches(&query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("no pitches");
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{}  {}  {:<30}  likes={:<3} views={:<3}{}",
            entry.record.id,
            entry.record.created_at.format("%Y-%m-%d %H:%M"),
            entry.record.title,
            entry.stats.likes,
            entry.stats.views,
            if entry.featured { "  [featured]" } else { "" },
        );
    }
    Ok(())
}

pub async fn show(app: &App, id: &str) -> CommandResult {
    let id = ArtifactId::new(id);
    let Some(entry) = app.catalog().get(&id)? else {
        return Err(format!("pitch not found: {id}").into());
    };
    println!("{}", serde_json::to_string_pretty(&entry)?);

    match app.store().fetch_payload(&id).await {
        Ok(payload) => println!("video: {} bytes ({})", payload.len(), payload.mime_type()),
        Err(e) => println!("video: unavailable ({e})"),
    }
    Ok(())
}

pub async fn export(app: &App, id: &str, output: &Path) -> CommandResult {
    let payload = app.store().fetch_payload(&ArtifactId::new(id)).await?;
    std::fs::write(output, payload.bytes())?;
    println!("wrote {} bytes to {}", payload.len(), output.display());
    Ok(())
}

pub async fn remove(app: &App, id: &str) -> CommandResult {
    app.store().remove(&ArtifactId::new(id)).await?;
    println!("removed {id}");
    Ok(())
}

#[derive(Debug, Serialize)]
struct PlayStep<'a> {
    step: &'a str,
    time: String,
    progress: f64,
    playing: bool,
    muted: bool,
    fullscreen: bool,
}

impl<'a> PlayStep<'a> {
    fn new(step: &'a str, time: String, progress: f64, state: PlaybackState) -> Self {
        Self {
            step,
            time,
            progress,
            playing: state.playing,
            muted: state.muted,
            fullscreen: state.fullscreen,
        }
    }
}

pub async fn play(app: &App, id: &str, duration: f64, steps: &[String]) -> CommandResult {
    let id = ArtifactId::new(id);
    let Some(display) = app.store().resolve(&id).await else {
        return Err(format!("pitch not found or video missing: {id}").into());
    };

    let mut player = app.new_player(
        SimulatedEngine::with_duration(duration),
        SimulatedFullscreen::new(),
    );
    player.on_metadata_loaded();

    for step in steps {
        let step = step.trim();
        if let Some(secs) = step.strip_prefix("wait:") {
            let secs: f64 = secs.parse()?;
            let ended = player.engine_mut().advance(secs);
            if ended {
                player.on_ended();
            } else {
                player.on_time_update();
            }
            player.tick();
        } else if let Some(fraction) = step.strip_prefix("seek:") {
            player.seek(fraction.parse()?);
        } else {
            let key = if step.eq_ignore_ascii_case("space") {
                " "
            } else {
                step
            };
            if !player.handle_key(key)? {
                tracing::warn!(step, "unknown step ignored");
            }
        }
        let report = PlayStep::new(
            step,
            player.time_label(),
            player.progress_percent(),
            player.state(),
        );
        println!("{}", serde_json::to_string(&report)?);
    }

    display.release();
    Ok(())
}
