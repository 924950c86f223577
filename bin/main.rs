use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use radcomp::fluids::reference::CubicGas;
use radcomp::{condition::OperatingCondition, geometry::Geometry};
use serde::Deserialize;

/// Evaluate a centrifugal compressor mean-line operating point.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON file containing `{"geometry": {...}, "condition": {...}}`
    input: PathBuf,
}

#[derive(Deserialize)]
struct Input {
    geometry: Geometry,
    condition: OperatingCondition,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&cli.input)?;
    let input: Input = serde_json::from_str(&raw)?;

    // The CLI ships with the reference Peng-Robinson backend only; a build
    // with `--features coolprop` would swap this for `CoolPropFluid`.
    let gas = CubicGas::air();

    let result = radcomp::calculate(&input.geometry, &input.condition, &gas);

    if !result.valid {
        println!(
            "invalid operating point: choke={} wet={} surge={}",
            result.choke, result.wet, result.surge
        );
        return Ok(());
    }

    println!("pressure ratio:        {:.4}", result.pr);
    println!("isentropic efficiency: {:.4}", result.eff);
    println!("power:                 {:.1} W", result.power);
    println!("inlet flow coeff m_in: {:.4}", result.m_in);
    println!("specific speed Ns:     {:.4}", result.ns);
    println!("specific diameter Ds:  {:.4}", result.ds);
    println!("head:                  {:.6}", result.head);
    println!("tip speed:             {:.2} m/s", result.tip_speed);

    Ok(())
}
