// src/lib.rs

pub mod capture;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod resource;
pub mod task;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capture::ShellController;
use crate::cli::{CliArgs, TargetBinding};
use crate::config::{load_playbook, load_resource_config, Playbook, ResourceConfig};
use crate::engine::{Message, Orchestrator};
use crate::errors::TaskchainError;
use crate::resource::{Resource, ResourceProvider};
use crate::task::{CommandTask, Task};
use crate::types::MessageKind;

/// What happened during a CLI run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub chains_completed: usize,
    pub task_errors: usize,
    pub capture_failures: usize,
    pub interrupted: bool,
}

impl RunSummary {
    fn record(&mut self, msg: &Message) {
        match msg.kind {
            MessageKind::TaskChainCompleted => self.chains_completed += 1,
            MessageKind::TaskError => self.task_errors += 1,
            k if k.is_capture_failure() => self.capture_failures += 1,
            _ => {}
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - playbook + resource loading
/// - the orchestrator with a JSON-printing observer
/// - capture binding
/// - Ctrl-C handling (stops the run)
pub async fn run(args: CliArgs) -> Result<()> {
    let playbook = load_playbook(&args.playbook)?;

    if args.dry_run {
        let cfg = load_resource_config(&args.resource_dir)?;
        print_dry_run(&cfg, &playbook);
        return Ok(());
    }

    let resource = Arc::new(Resource::new(Path::new(&args.resource_dir)));

    // Observer runs on the dispatch thread; forward to this task as well.
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Message>();
    let observer = move |kind: MessageKind, payload: &Value| {
        println!("{}", json!({ "kind": kind, "payload": payload }));
        let _ = msg_tx.send(Message {
            kind,
            payload: payload.clone(),
        });
    };

    let orchestrator = Orchestrator::new(
        resource.clone(),
        Box::new(ShellController::new()),
        Some(Box::new(observer)),
    )?;

    if let Some(ref name) = args.binding.target {
        if !resource.targets().iter().any(|t| &t.name == name) {
            return Err(TaskchainError::UnknownTarget(name.clone()).into());
        }
    }

    if !bind(&orchestrator, &args.binding) {
        bail!("failed to bind a capture target");
    }

    let tasks = build_tasks(&playbook);
    info!(chains = playbook.chain.len(), tasks = tasks.len(), "queueing playbook");
    if !orchestrator.append_and_start(tasks) {
        bail!("failed to start the scheduler");
    }

    let mut summary = wait_for_idle(&orchestrator, &mut msg_rx).await;

    // Joining the threads blocks; keep it off the async workers.
    tokio::task::spawn_blocking(move || drop(orchestrator)).await?;

    // The dispatch thread has delivered everything and dropped the observer,
    // so the channel ends after the last forwarded message.
    while let Some(msg) = msg_rx.recv().await {
        summary.record(&msg);
    }
    info!(?summary, "run finished");

    if summary.interrupted {
        bail!("interrupted");
    }
    if summary.capture_failures > 0 {
        bail!("capture failed; run aborted");
    }
    if summary.task_errors > 0 {
        bail!("{} task(s) failed", summary.task_errors);
    }
    Ok(())
}

/// Bind the target selected on the command line.
pub fn bind(orchestrator: &Orchestrator, binding: &TargetBinding) -> bool {
    if binding.fake {
        orchestrator.catch_fake()
    } else if binding.custom {
        orchestrator.catch_custom()
    } else if let Some(ref name) = binding.target {
        orchestrator.catch_target(Some(name))
    } else {
        orchestrator.catch_default()
    }
}

/// One `CommandTask` per playbook entry, chains in file order.
pub fn build_tasks(playbook: &Playbook) -> Vec<Box<dyn Task>> {
    playbook
        .chain
        .iter()
        .flat_map(|chain| {
            chain
                .task
                .iter()
                .map(|t| Box::new(CommandTask::new(&chain.name, &t.cmd)) as Box<dyn Task>)
        })
        .collect()
}

/// Consume forwarded messages until the scheduler has gone idle, or Ctrl-C.
async fn wait_for_idle(
    orchestrator: &Orchestrator,
    msg_rx: &mut mpsc::UnboundedReceiver<Message>,
) -> RunSummary {
    let mut summary = RunSummary::default();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            msg = msg_rx.recv() => {
                let Some(msg) = msg else {
                    debug!("message channel closed");
                    break;
                };
                summary.record(&msg);
                // Later messages are counted once the orchestrator is down.
                // The worker settles idle before posting its last events.
                if msg.kind == MessageKind::AllTasksCompleted || !orchestrator.is_running() {
                    break;
                }
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                info!("Ctrl-C received; stopping run");
                orchestrator.stop();
                summary.interrupted = true;
                break;
            }
        }
    }

    summary
}

/// Simple dry-run output: print options, targets and chains.
fn print_dry_run(cfg: &ResourceConfig, playbook: &Playbook) {
    println!("taskchain dry-run");
    println!("  options.task_delay_ms = {}", cfg.options.task_delay_ms);
    println!("  options.connect_type = {:?}", cfg.options.connect_type);
    println!("  items = {}", cfg.item.len());
    println!();

    println!("targets ({}):", cfg.target.len());
    for (name, target) in cfg.target.iter() {
        println!("  - {name}");
        println!("      connect: {}", target.connect);
        if let Some(ref address) = target.address {
            println!("      address: {address}");
        }
    }
    println!();

    println!("chains ({}):", playbook.chain.len());
    for chain in playbook.chain.iter() {
        println!("  - {}", chain.name);
        for task in chain.task.iter() {
            println!("      cmd: {}", task.cmd);
        }
    }

    debug!("dry-run complete (no execution)");
}
