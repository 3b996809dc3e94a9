use std::{
    path::PathBuf,
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use receiver::{load_config, open_source, AcquisitionMachine, AcquisitionWorker, ConsolePresenter};
use session::{load_session, SessionWriter};

#[derive(Parser)]
#[command(name = "receiver", about = "Knee and ankle joint angle receiver")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow a live line stream and record sessions
    Record {
        /// Capture file to read instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
        /// Session file prefix, overrides the config
        #[arg(long)]
        prefix: Option<PathBuf>,
        #[arg(long)]
        export_csv: bool,
    },
    /// Recompute the joint angles of a saved session file
    Load {
        file: PathBuf,
        #[arg(long)]
        export_csv: bool,
    },
}

/// Raise `stop` on the first Ctrl-C. The worker sees it at the next line, so a source that went
/// quiet keeps the process alive; a second Ctrl-C exits at once. Body lines are flushed as they
/// are written, so exiting early loses nothing already received.
fn stop_on_interrupt(stop: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("interrupt".into())
        .spawn(move || {
            runtime.block_on(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    log::warn!("Cannot listen for Ctrl-C: {}", err);
                    return;
                }
                log::info!("Stopping after the next line, press Ctrl-C again to quit now");
                stop.store(true, Ordering::Relaxed);

                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupted again, exiting");
                    process::exit(130);
                }
            });
        })?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_filter.as_str())).init();

    match cli.command {
        Command::Record { input, prefix, export_csv } => {
            let prefix = prefix.unwrap_or_else(|| config.output_prefix.clone());
            let machine = AcquisitionMachine::new(SessionWriter::new(prefix));
            let (events, received) = crossbeam_channel::unbounded();

            let worker = AcquisitionWorker::spawn(move || open_source(input.as_deref()), machine, events)?;
            stop_on_interrupt(worker.stop_signal())?;

            let mut presenter = ConsolePresenter::new(config.cutoff_hz, export_csv || config.export_csv);
            for event in received.iter() {
                presenter.handle(event);
            }
            worker.join()?;

            if presenter.saw_fatal() {
                bail!("line source failed");
            }
        }
        Command::Load { file, export_csv } => {
            let loaded = load_session(&file)?;
            log::info!(
                "Loaded {:?}: initial knee {:.2} deg, initial ankle {:.2} deg, {} lines",
                file,
                loaded.pose.initial_knee_angle,
                loaded.pose.initial_ankle_angle,
                loaded.body.len()
            );
            for (key, values) in loaded.header.entries() {
                log::debug!("{} = {:?}", key, values);
            }
            let series = loaded
                .series()
                .with_context(|| format!("no joint angles in {:?}", file))?;

            let presenter = ConsolePresenter::new(config.cutoff_hz, export_csv || config.export_csv);
            presenter.present_series(&series, Some(file.as_path()))?;
        }
    }

    Ok(())
}
