use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use scopelink::cli::{Cli, Commands};
use scopelink::config::{self, Config};
use scopelink::console::{self, ConsoleCommand};
use scopelink::mount::{Applied, Mount};
use scopelink::protocol::Axis;
use scopelink::session::{open_link, SerialSession, SessionRunner};
use scopelink::transport::SerialSource;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Set { axis, speed } => {
            let mut mount = connect(&config).await?;
            let applied = mount.set_speed(axis, speed).await?;
            report(&applied);
            mount.into_session().close().await?;
        }
        Commands::Stop { axis } => {
            let mut mount = connect(&config).await?;
            let applied = match axis {
                Some(axis) => vec![mount.stop(axis).await?],
                None => mount.stop_all().await?,
            };
            applied.iter().for_each(report);
            mount.into_session().close().await?;
        }
        Commands::Run { file, pacing_ms } => {
            let commands = match file {
                Some(path) => config::load_sequence(&path)?,
                None if config.sequence.is_empty() => config::bench_sequence(),
                None => config.commands(),
            };
            let pacing = pacing_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.pacing());

            let mut session = open(&config).await?;
            let outcome = SessionRunner::new(pacing)
                .run(&mut session, &commands)
                .await?;
            for (command, reply) in &outcome.exchanges {
                println!(
                    "{} {:<10} {}",
                    "sent".green(),
                    command.to_string(),
                    reply.text.dimmed()
                );
            }
            println!(
                "{} {} commands in {:.1}s",
                "done".green().bold(),
                outcome.len(),
                outcome.elapsed.as_secs_f64()
            );
            session.close().await?;
        }
        Commands::Console => {
            let mount = connect(&config).await?;
            run_console(mount).await?;
        }
    }

    Ok(())
}

/// Config file plus command-line overrides.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = &cli.port {
        config.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }
    if let Some(ms) = cli.reply_timeout_ms {
        config.reply_timeout_ms = Some(ms);
    }
    config.validate()?;
    Ok(config)
}

async fn open(config: &Config) -> Result<SerialSession> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message(format!(
        "Waiting for actuator on {} ({} baud)",
        config.port, config.baud_rate
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let session = open_link(&config.port, config.baud_rate, config.session_options()).await;
    spinner.finish_and_clear();

    let session = session.with_context(|| format!("Failed to connect on {}", config.port))?;
    println!("{} {}", "connected".green().bold(), config.port);
    Ok(session)
}

async fn connect(config: &Config) -> Result<Mount<SerialSource>> {
    let session = open(config).await?;
    Ok(Mount::new(session).with_calibration(config.calibration))
}

fn report(applied: &Applied) {
    if applied.clamped.was_clamped() {
        eprintln!(
            "{} speed {} out of range, using {}",
            "warning:".yellow().bold(),
            applied.clamped.requested(),
            applied.clamped.effective()
        );
    }
    println!(
        "{} {:<10} {}",
        "sent".green(),
        applied.command.to_string(),
        applied.reply.text.dimmed()
    );
}

async fn run_console(mut mount: Mount<SerialSource>) -> Result<()> {
    println!("{}", console::HELP.dimmed());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", ">".cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let cmd = match console::parse_line(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                eprintln!("{} {}", "error:".red().bold(), msg);
                continue;
            }
        };

        match cmd {
            ConsoleCommand::Set { axis, speed } => report(&mount.set_speed(axis, speed).await?),
            ConsoleCommand::Nudge { axis, delta } => report(&mount.nudge(axis, delta).await?),
            ConsoleCommand::Stop(Some(axis)) => report(&mount.stop(axis).await?),
            ConsoleCommand::Stop(None) => mount.stop_all().await?.iter().for_each(report),
            ConsoleCommand::Status => {
                for axis in Axis::ALL {
                    match mount.angular_rate(axis) {
                        Some(rate) => {
                            println!("{:<4}{:>5}  {:.3} mrad/min", axis, mount.speed(axis), rate)
                        }
                        None => println!("{:<4}{:>5}", axis, mount.speed(axis)),
                    }
                }
            }
            ConsoleCommand::Help => println!("{}", console::HELP),
            ConsoleCommand::Quit => break,
        }
    }

    mount.into_session().close().await?;
    Ok(())
}
