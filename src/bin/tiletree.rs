use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tiletree::common::config::{Config, config_file};
use tiletree::common::log;
use tiletree::layout_engine::{LayoutCommand, LayoutEngine, LayoutEvent};
use tiletree::sys::geometry::{Point, Size};
use tiletree::sys::headless::HeadlessCompositor;
use tiletree::sys::host::{Monitor, WindowId, WorkspaceId};
use tracing::{info, warn};

#[derive(Parser)]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check whether the configuration can be loaded, print any issues and
    /// exit.
    #[arg(long)]
    validate: bool,

    /// Replay a JSON script of host changes, events and commands against an
    /// in-memory compositor and print the resulting trees.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Print a JSON snapshot of each tree instead of the drawing.
    #[arg(long)]
    json: bool,
}

/// One line of a replay script.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
enum Step {
    Workspace {
        id: WorkspaceId,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        width: f64,
        height: f64,
    },
    Window {
        id: WindowId,
        workspace: WorkspaceId,
        #[serde(default)]
        floating: bool,
    },
    Pointer {
        x: f64,
        y: f64,
    },
    Event(LayoutEvent),
    Command {
        workspace: WorkspaceId,
        command: LayoutCommand,
    },
}

fn main() {
    let opt = Cli::parse();
    log::init_logging();

    let config_path = opt.config.clone().or_else(config_file);
    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(1);
        }
    };

    if opt.validate {
        let issues = config.validate();
        if issues.is_empty() {
            println!("Config validation passed");
        } else {
            for issue in issues {
                eprintln!("{issue}");
            }
            process::exit(1);
        }
        return;
    }

    let Some(script) = opt.script else {
        eprintln!("nothing to do: pass --script or --validate");
        process::exit(2);
    };
    if let Err(e) = replay(&script, config, opt.json) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) if path.exists() => {
            Config::read(path).with_context(|| format!("reading {}", path.display()))
        }
        _ => Ok(Config::default()),
    }
}

fn replay(path: &Path, config: Config, json: bool) -> anyhow::Result<()> {
    let buf =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&buf).context("parsing script")?;

    let mut engine = LayoutEngine::new(config.layout);
    let mut host = HeadlessCompositor::new();

    for (index, step) in steps.into_iter().enumerate() {
        match step {
            Step::Workspace { id, x, y, width, height } => {
                let monitor = Monitor::new(Point::new(x, y), Size::new(width, height));
                host.add_workspace(id, monitor);
                engine.handle_event(&mut host, LayoutEvent::WorkspaceChanged(id))?;
            }
            Step::Window { id, workspace, floating } => {
                host.add_window(id, workspace);
                if let Some(window) = host.windows.get_mut(&id) {
                    window.floating = floating;
                }
                if let Err(e) = engine.handle_event(&mut host, LayoutEvent::WindowAdded(id)) {
                    warn!(index, "window not tiled: {e}");
                }
                host.focused = Some(id);
            }
            Step::Pointer { x, y } => host.pointer = Some(Point::new(x, y)),
            Step::Event(event) => {
                let removed = match event {
                    LayoutEvent::WindowRemoved(window) => Some(window),
                    _ => None,
                };
                engine.handle_event(&mut host, event)?;
                if let Some(window) = removed {
                    host.windows.remove(&window);
                }
            }
            Step::Command { workspace, command } => {
                info!(index, ?command, "running command");
                if let Err(e) = engine.handle_command(&mut host, workspace, command) {
                    warn!(index, "command failed: {e}");
                }
            }
        }
    }

    for issue in engine.check_invariants() {
        warn!("invariant violated: {issue}");
    }
    for notification in &host.notifications {
        warn!("{notification}");
    }

    let workspaces: Vec<WorkspaceId> = host.workspaces.keys().copied().collect();
    for workspace in workspaces {
        if json {
            if let Some(snapshot) = engine.snapshot(workspace) {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
        } else {
            let tree = engine.draw_tree(workspace);
            if !tree.is_empty() {
                println!("{workspace}:\n{tree}");
            }
        }
    }
    Ok(())
}
