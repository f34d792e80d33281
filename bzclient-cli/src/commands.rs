// CLI command handlers
use anyhow::{Context, Result};
use bzclient_core::events::{EventProps, EVENT_TABLE};
use bzclient_core::gfx::{BlockType, GlobalBlock};
use bzclient_core::ClientInfo;
use bzclient_lua::ScriptHost;
use bzclient_render::HeadlessGl;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::ClientConfig;

/// Script ids handed to scripts named on the command line.
const COMMAND_LINE_SCRIPT_BASE_ID: i32 = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub name: &'static str,
    pub order: Option<&'static str>,
    pub loop_type: &'static str,
    pub props: Vec<&'static str>,
}

pub fn event_rows() -> Vec<EventRow> {
    EVENT_TABLE
        .iter()
        .map(|spec| EventRow {
            name: spec.name,
            order: spec.order.map(|o| o.name()),
            loop_type: spec.loop_type.name(),
            props: prop_names(spec.props),
        })
        .collect()
}

fn prop_names(props: EventProps) -> Vec<&'static str> {
    [
        (EventProps::REQ_FULL_READ, "reqFullRead"),
        (EventProps::REQ_GAME_CTRL, "reqGameCtrl"),
        (EventProps::REQ_INPUT_CTRL, "reqInputCtrl"),
        (EventProps::REVERSED, "reversed"),
        (EventProps::REENTRANT, "reentrant"),
    ]
    .into_iter()
    .filter(|(bit, _)| props.contains(*bit))
    .map(|(_, name)| name)
    .collect()
}

pub fn list_events(json: bool) -> Result<()> {
    let rows = event_rows();
    if json {
        let out = serde_json::to_string_pretty(&rows).context("Failed to serialize event table")?;
        println!("{}", out);
        return Ok(());
    }
    println!("{:<22} {:<16} {:<12} properties", "event", "order", "loop");
    for row in &rows {
        println!(
            "{:<22} {:<16} {:<12} {}",
            row.name,
            row.order.unwrap_or("direct"),
            row.loop_type,
            row.props.join(",")
        );
    }
    println!("\n{} events", rows.len());
    Ok(())
}

pub fn list_blocks() {
    println!("Block types:");
    for block_type in BlockType::ALL {
        println!("  {:>2}  {}", block_type.code(), block_type.name());
    }
    println!("\nGlobal blocks:");
    for block in GlobalBlock::ALL {
        let space = if block.is_world() { "world" } else { "screen" };
        println!("  {:>2}  {:<14} {}", block.id(), block.name(), space);
    }
}

/// Options for a headless run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub scripts: Vec<PathBuf>,
    pub frames: u64,
    /// Lose and restore the GL context after every N frames.
    pub reset_every: Option<u64>,
    pub config: ClientConfig,
    pub progress: bool,
}

/// What a headless run left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub scripts: usize,
    pub frames: u64,
    pub failed_passes: usize,
    pub resets: u64,
    pub live_objects: usize,
    pub leaked_objects: usize,
    pub double_deletes: usize,
    pub gl_errors: Vec<String>,
}

fn script_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load every configured and named script into a headless host and drive it
/// for `options.frames` frames.
pub fn run_scripts(options: &RunOptions) -> Result<RunReport> {
    let gl = Rc::new(HeadlessGl::new());
    let mut host = ScriptHost::new(gl.clone());
    options.config.apply(host.render());

    for entry in &options.config.scripts {
        host.load_script_file(entry.client_info(), &entry.path)
            .with_context(|| format!("Failed to load script {}", entry.name))?;
    }
    for (index, path) in options.scripts.iter().enumerate() {
        let info = ClientInfo::new(script_name(path), COMMAND_LINE_SCRIPT_BASE_ID + index as i32);
        host.load_script_file(info, path)?;
    }
    log::info!("loaded {} scripts", host.scripts().len());

    let mut report = RunReport {
        scripts: host.scripts().len(),
        ..RunReport::default()
    };

    let pb = if options.progress {
        create_progress_bar(options.frames)?
    } else {
        ProgressBar::hidden()
    };
    for frame in 1..=options.frames {
        report.failed_passes += host.run_frame();
        report.frames = frame;
        if let Some(every) = options.reset_every.filter(|n| *n > 0) {
            if frame % every == 0 && frame < options.frames {
                host.reset_context()?;
                report.resets += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    host.shutdown();
    report.live_objects = gl.live_count();
    report.leaked_objects = gl.leaked();
    report.double_deletes = gl.double_deletes();
    report.gl_errors = gl.errors();
    Ok(report)
}

pub fn print_report(report: &RunReport) {
    println!("Scripts: {}", report.scripts);
    println!("Frames: {}", report.frames);
    println!("Context resets: {}", report.resets);
    println!("Failed passes: {}", report.failed_passes);
    println!("Live GL objects: {}", report.live_objects);
    println!("Leaked GL objects: {}", report.leaked_objects);
    println!("Double deletes: {}", report.double_deletes);
    for err in &report.gl_errors {
        println!("  GL error: {}", err);
    }
}

fn create_progress_bar(frames: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(frames);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} frames {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=> "),
    );
    Ok(pb)
}
