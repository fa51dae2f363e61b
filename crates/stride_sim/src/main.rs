//! Scenario simulator
//!
//! Runs one scenario preset to completion and prints a summary.
//!
//! Run with: cargo run -p stride_sim -- crossing_focus
//!       or: STRIDE_SCENARIO=wait cargo run -p stride_sim -- --json

use stride_sim::prelude::*;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = CliArgs::parse(std::env::args().skip(1))?;
    if cli.list {
        for name in SCENARIOS {
            println!("{}", name);
        }
        return Ok(());
    }

    // File, then environment, then command line
    let mut settings = match &cli.config {
        Some(path) => SimSettings::from_file(path)?,
        None => SimSettings::default(),
    };
    settings.apply_env()?;
    cli.apply(&mut settings);

    let name = settings.scenario.as_deref().unwrap_or(SCENARIOS[0]);
    let mut scenario = Scenario::by_name(name)?;
    settings.apply(&mut scenario)?;

    let report = Runner::new(scenario)?.run();
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("Scenario: {}", report.scenario);
    println!(
        "  {} after {} ticks at ({:.3}, {:.3})",
        if report.arrived { "Arrived" } else { "Stopped" },
        report.ticks,
        report.final_position.x,
        report.final_position.y
    );
    println!("  Distance travelled: {:.3}", report.distance_travelled);
    if let Some(clearance) = report.min_clearance {
        println!("  Closest approach: {:.3}", clearance);
    }
    if report.paused_ticks > 0 {
        println!("  Paused ticks: {}", report.paused_ticks);
    }
    for (rule, count) in &report.rule_usage {
        println!("  {}: {} ticks", rule, count);
    }
    for record in &report.transitions {
        println!(
            "  tick {}: {} -> {} ({})",
            record.tick, record.change.from, record.change.to, record.change.reason
        );
    }
}
