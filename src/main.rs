//! wattview - terminal poller for SmartMeter-style home power meters
//!
//! Polls a meter over HTTP, prints the live wattage, and dumps the collected
//! history when done. The heavy lifting lives in the library; this binary is
//! argument parsing and the poll loop.

use std::thread;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;

use wattview::history::PowerSample;
use wattview::meter::{MeterSession, PowerMeter};

/// Poll a SmartMeter-style power meter and print the live wattage
#[derive(Parser, Debug)]
#[command(name = "wattview")]
#[command(author, version, about = "Poll a SmartMeter-style power meter and print the live wattage")]
struct Cli {
    /// Meter hostname or IP address
    host: String,

    /// Poll interval in seconds
    #[arg(long, default_value_t = 2)]
    interval: u64,

    /// Backfill this many seconds of history on startup
    #[arg(long, default_value_t = 0)]
    span: i64,

    /// Maximum number of samples retained
    #[arg(long, default_value_t = 3600)]
    capacity: usize,

    /// Stop after this many polls, then dump the history
    #[arg(long)]
    polls: Option<u64>,

    /// Dump the history as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print the current wattage once and exit
    #[arg(long)]
    once: bool,
}

fn print_sample_row(sample: &PowerSample) {
    match sample.value {
        Some(watts) => println!("{}  {:>6} W", sample.timestamp.format("%Y-%m-%d %H:%M:%S"), watts),
        None => println!("{}       - W", sample.timestamp.format("%Y-%m-%d %H:%M:%S")),
    }
}

fn dump_history(session: &MeterSession, json: bool) -> Result<()> {
    if json {
        let samples: Vec<PowerSample> = session.history().samples().collect();
        println!("{}", serde_json::to_string_pretty(&samples)?);
    } else {
        for sample in session.history().samples() {
            print_sample_row(&sample);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let meter = PowerMeter::new(cli.host.clone());

    if cli.once {
        match meter.read_current_wattage()? {
            Some(watts) => println!("{} W", watts),
            None => println!("no reading"),
        }
        return Ok(());
    }

    let mut session = MeterSession::new(meter, cli.capacity);

    // fill the tail first so the backfill has an anchor to grow from
    session.update().context("initial fetch failed")?;
    if cli.span > 0 {
        session
            .backfill(Duration::seconds(cli.span), || false)
            .context("backfill failed")?;
    }

    let mut polls: u64 = 1;
    loop {
        if let Some(sample) = session
            .history()
            .count()
            .checked_sub(1)
            .and_then(|last| session.history().get_sample(last))
        {
            print_sample_row(&sample);
        }

        if let Some(limit) = cli.polls {
            if polls >= limit {
                break;
            }
        }
        thread::sleep(StdDuration::from_secs(cli.interval));
        if let Err(e) = session.update() {
            // a missed poll is recoverable; the next add gap-fills the hole
            tracing::warn!(error = %e, "poll failed");
        }
        polls += 1;
    }

    dump_history(&session, cli.json)
}
