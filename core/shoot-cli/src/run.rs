//! `shootclock run`: the interactive terminal host.
//!
//! Boots the durable store through the arbiter, then multiplexes a tick
//! interval with stdin commands on a single-threaded runtime. While in safe
//! mode only `retry`, `status` and `quit` are accepted.

use std::sync::Arc;
use std::time::Duration;

use shoot_core::boot::BootOutcome;
use shoot_core::clock::SystemClock;
use shoot_core::config::ShootConfig;
use shoot_core::engine::SessionEngine;
use shoot_core::storage::StorageConfig;
use shoot_core::store::Store;
use shoot_core::types::TimerReadoutFfi;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::boot::{self, StoreArbiter};

const HELP: &str = "commands: go | end | on | off | retry | status | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Go,
    End,
    On,
    Off,
    Retry,
    Status,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "go" | "g" => Some(Command::Go),
            "end" | "e" => Some(Command::End),
            "on" => Some(Command::On),
            "off" => Some(Command::Off),
            "retry" => Some(Command::Retry),
            "status" | "s" => Some(Command::Status),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }

    fn needs_ready_store(self) -> bool {
        matches!(self, Command::Go | Command::End | Command::On | Command::Off)
    }
}

pub fn run(storage: &StorageConfig, config: &ShootConfig) -> Result<(), String> {
    storage.ensure_root()?;
    let arbiter = boot::arbiter(storage, config);
    let engine = SessionEngine::with_storage(storage.clone(), Arc::new(SystemClock));

    let runtime = boot::runtime()?;
    let result = runtime.block_on(event_loop(&arbiter, &engine, config));
    // A pending stdin read lives on the blocking pool; don't wait for it.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result?;

    boot::marker(storage).mark_clean_exit();
    info!("Clean exit recorded");
    Ok(())
}

async fn event_loop(
    arbiter: &StoreArbiter,
    engine: &SessionEngine,
    config: &ShootConfig,
) -> Result<(), String> {
    arbiter.start();
    let mut outcome = arbiter.wait_resolved().await;
    report_outcome(&outcome);
    println!("{}", HELP);

    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if outcome.is_ready() {
                    let readout = engine.tick();
                    if readout.is_running {
                        print_readout(&readout);
                    }
                }
            }
            line = lines.next_line() => {
                let line = line.map_err(|e| format!("Failed to read stdin: {}", e))?;
                let Some(line) = line else {
                    info!("stdin closed; leaving");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(command) = Command::parse(&line) else {
                    println!("unknown command {:?}; {}", line.trim(), HELP);
                    continue;
                };
                if command == Command::Quit {
                    return Ok(());
                }
                if command.needs_ready_store() && !outcome.is_ready() {
                    println!("safe mode: type `retry` to try starting again");
                    continue;
                }
                if command == Command::Retry {
                    arbiter.retry();
                    outcome = arbiter.wait_resolved().await;
                    report_outcome(&outcome);
                    continue;
                }
                apply(engine, command, &outcome);
            }
        }
    }
}

fn apply(engine: &SessionEngine, command: Command, outcome: &BootOutcome<Store>) {
    match command {
        Command::Go => match engine.primary_action() {
            Ok(stage) => println!("-> {}", stage),
            Err(rejection) => {
                warn!(%rejection, "Primary action rejected");
                println!("! {}", rejection);
            }
        },
        Command::End => match engine.end_session() {
            Ok(stage) => println!("-> {}", stage),
            Err(rejection) => println!("! {}", rejection),
        },
        Command::On => {
            engine.set_on_duty(true);
            println!("on duty");
        }
        Command::Off => {
            engine.set_on_duty(false);
            println!("off duty");
        }
        Command::Status => {
            report_outcome(outcome);
            print_readout(&engine.readout());
            println!("glance: {}", engine.glance().line);
        }
        Command::Retry | Command::Quit => {}
    }
}

fn report_outcome(outcome: &BootOutcome<Store>) {
    match outcome {
        BootOutcome::Ready { mode, warning, .. } => {
            println!("ready ({})", mode);
            if let Some(warning) = warning {
                println!("warning: {}", warning);
            }
        }
        BootOutcome::SafeMode { message, mode } => {
            println!("safe mode ({}): {}", mode, message);
        }
        BootOutcome::Loading => println!("loading"),
    }
}

fn print_readout(readout: &TimerReadoutFfi) {
    let duty = if readout.on_duty { "on duty" } else { "off duty" };
    println!(
        "[{}] {:<9} total {}  stage {}",
        duty,
        readout.stage.as_str(),
        readout.total_label,
        readout.stage_label
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_with_aliases() {
        assert_eq!(Command::parse(" GO "), Some(Command::Go));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("status"), Some(Command::Status));
        assert_eq!(Command::parse("dance"), None);
    }

    #[test]
    fn only_session_commands_need_a_ready_store() {
        assert!(Command::Go.needs_ready_store());
        assert!(Command::Off.needs_ready_store());
        assert!(!Command::Retry.needs_ready_store());
        assert!(!Command::Status.needs_ready_store());
    }
}
