use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tk_app::scenario_service::request_from_scenario;
use tk_app::{
    AppResult, RunProgressEvent, RunRequest, RunResponse, RunSession, RunStage, SeriesVariable,
    query, run_service, scenario_service,
};
use tk_project::ScenarioDef;

#[derive(Parser)]
#[command(name = "tk-cli")]
#[command(about = "Tank level simulator - PI-controlled drained tank", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print its summary
    Run {
        #[command(flatten)]
        input: RunInput,
        /// Number of final heights to print
        #[arg(long, default_value_t = 10)]
        tail: usize,
        /// Write the full run as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Run a baseline and a modified run, then compare them
    Compare {
        #[command(flatten)]
        baseline: RunInput,
        /// Modified cross-sectional area (m²)
        #[arg(long)]
        with_area: Option<f64>,
        /// Modified drain coefficient
        #[arg(long)]
        with_beta: Option<f64>,
        /// Modified simulated time (s)
        #[arg(long)]
        with_duration: Option<f64>,
        /// Modified setpoint (m)
        #[arg(long)]
        with_setpoint: Option<f64>,
        /// Modified proportional gain
        #[arg(long)]
        with_kp: Option<f64>,
        /// Write the height overlay as CSV to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export time series of a run as CSV
    ExportSeries {
        #[command(flatten)]
        input: RunInput,
        /// Variable name (height, control, commanded_flow, natural_outflow, error, all)
        #[arg(default_value = "all")]
        variable: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate scenario file syntax and values
    Validate {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// Print or write the reset scenario
    Defaults {
        /// Output path (YAML or JSON by extension; defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run inputs: a scenario file, flag overrides, or both.
#[derive(Args, Clone)]
struct RunInput {
    /// Scenario file to start from
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Cross-sectional area A (m²)
    #[arg(long)]
    area: Option<f64>,
    /// Drain coefficient beta
    #[arg(long)]
    beta: Option<f64>,
    /// Simulated time t_sim (s)
    #[arg(long)]
    duration: Option<f64>,
    /// Desired level h_zad (m)
    #[arg(long)]
    setpoint: Option<f64>,
    /// Proportional gain k_p
    #[arg(long)]
    kp: Option<f64>,
    /// Fail on negative heights instead of clamping the drain law
    #[arg(long)]
    strict: bool,
}

impl RunInput {
    fn to_request(&self) -> AppResult<RunRequest> {
        let mut request = match &self.scenario {
            Some(path) => request_from_scenario(&scenario_service::load_scenario(path)?),
            None => RunRequest::default(),
        };
        let params = &mut request.parameters;
        if let Some(v) = self.area {
            params.cross_section = v;
        }
        if let Some(v) = self.beta {
            params.outflow_coefficient = v;
        }
        if let Some(v) = self.duration {
            params.duration = v;
        }
        if let Some(v) = self.setpoint {
            params.setpoint = v;
        }
        if let Some(v) = self.kp {
            params.controller_gain = v;
        }
        if self.strict {
            request.options.outflow_domain = tk_sim::OutflowDomain::Strict;
        }
        Ok(request)
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input, tail, json } => cmd_run(&input, tail, json.as_deref()),
        Commands::Compare {
            baseline,
            with_area,
            with_beta,
            with_duration,
            with_setpoint,
            with_kp,
            output,
        } => {
            let modified = RunInput {
                area: with_area.or(baseline.area),
                beta: with_beta.or(baseline.beta),
                duration: with_duration.or(baseline.duration),
                setpoint: with_setpoint.or(baseline.setpoint),
                kp: with_kp.or(baseline.kp),
                ..baseline.clone()
            };
            cmd_compare(&baseline, &modified, output.as_deref())
        }
        Commands::ExportSeries {
            input,
            variable,
            output,
        } => cmd_export_series(&input, &variable, output.as_deref()),
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Defaults { output } => cmd_defaults(output.as_deref()),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = scenario_service::load_scenario(scenario_path)?;
    scenario_service::validate_scenario(&scenario)?;
    println!("✓ Scenario '{}' is valid", scenario.name);
    Ok(())
}

fn cmd_defaults(output: Option<&Path>) -> AppResult<()> {
    let scenario = ScenarioDef::reset_defaults();
    if let Some(path) = output {
        scenario_service::save_scenario(path, &scenario)?;
        println!("✓ Wrote default scenario to {}", path.display());
    } else {
        let yaml = tk_project::to_yaml_string(&scenario)?;
        print!("{}", yaml);
    }
    Ok(())
}

fn execute_with_cli_progress(request: &RunRequest) -> AppResult<RunResponse> {
    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let response = run_service::execute_with_progress(
        request,
        Some(&mut |event| {
            let fraction = event
                .step
                .as_ref()
                .map(|s| s.fraction_complete)
                .unwrap_or(-1.0);
            let emit_now = (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                if fraction >= 0.0 {
                    last_fraction = fraction;
                }
                last_emit = Instant::now();
            }
        }),
    );
    clear_progress_line();
    response
}

fn cmd_run(input: &RunInput, tail: usize, json: Option<&Path>) -> AppResult<()> {
    let request = input.to_request()?;
    print_parameters(&request);

    let response = execute_with_cli_progress(&request)?;
    println!("✓ Simulation completed");
    print_timing_summary(&response);

    let summary = query::get_run_summary(&response.run)?;
    print_summary(&summary);

    if tail > 0 {
        println!("\nLast heights:");
        for (t, h) in query::height_tail(&response.run, tail) {
            println!("  t = {:>9.1} s  h = {:.6} m", t, h);
        }
    }

    if let Some(path) = json {
        let content = serde_json::to_string_pretty(&response.run)?;
        std::fs::write(path, content)?;
        println!("✓ Wrote run to {}", path.display());
    }
    Ok(())
}

fn cmd_compare(baseline: &RunInput, modified: &RunInput, output: Option<&Path>) -> AppResult<()> {
    let mut session = RunSession::new();

    let first = baseline.to_request()?;
    println!("Baseline run:");
    print_parameters(&first);
    session.record(execute_with_cli_progress(&first)?.run);

    let second = modified.to_request()?;
    println!("Modified run:");
    print_parameters(&second);
    session.record(execute_with_cli_progress(&second)?.run);

    let Some(comparison) = session.comparison()? else {
        println!("Nothing to compare");
        return Ok(());
    };

    println!("\nPrevious run:");
    print_summary(&comparison.previous);
    println!("\nCurrent run:");
    print_summary(&comparison.current);
    println!("\nChange (current - previous):");
    println!("  Final height: {:+.6} m", comparison.final_height_delta);
    println!("  Overshoot:    {:+.6} m", comparison.overshoot_delta);
    println!("  Σ|error|:     {:+.3}", comparison.abs_error_delta);
    println!("  Σ|control|:   {:+.3}", comparison.abs_control_delta);

    if let (Some(path), Some(current), Some(previous)) =
        (output, session.current(), session.previous())
    {
        let csv = query::overlay_csv(current, previous, SeriesVariable::Height);
        std::fs::write(path, csv)?;
        println!("✓ Wrote height overlay to {}", path.display());
    }
    Ok(())
}

fn cmd_export_series(input: &RunInput, variable: &str, output: Option<&Path>) -> AppResult<()> {
    let variables = if variable == "all" {
        SeriesVariable::ALL.to_vec()
    } else {
        vec![variable.parse()?]
    };
    tracing::debug!(?variables, "exporting series");

    let request = input.to_request()?;
    let response = run_service::execute(&request)?;
    let csv = query::series_csv(&response.run, &variables);

    // Write to file or stdout
    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            response.run.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (event.stage, &event.step) {
        (RunStage::Simulating, Some(s)) => {
            let width = 28usize;
            let filled = ((s.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  t={:.1}/{:.1}s  step={}/{}  elapsed={:.1}s",
                bar,
                s.fraction_complete * 100.0,
                s.sim_time_s,
                s.t_end_s,
                s.step,
                s.total_steps,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let mut line = format!(
                "\r{}  elapsed={:.2}s",
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

fn print_parameters(request: &RunRequest) {
    let p = &request.parameters;
    println!(
        "  A = {} m², beta = {}, t_sim = {} s, h_zad = {} m, k_p = {}",
        p.cross_section, p.outflow_coefficient, p.duration, p.setpoint, p.controller_gain
    );
}

fn print_timing_summary(response: &RunResponse) {
    let timing = &response.timing;
    println!("\nTiming summary:");
    println!("  Validate: {:.3}s", timing.validate_time_s);
    println!("  Simulate: {:.3}s", timing.simulate_time_s);
    println!("  Total:    {:.3}s", timing.total_time_s);
    println!("  Control steps: {}", timing.control_steps);
}

fn print_summary(summary: &query::RunSummary) {
    println!("  Samples: {}", summary.entry_count);
    println!(
        "  Time range: {:.1} - {:.1} s",
        summary.time_range.0, summary.time_range.1
    );
    println!(
        "  Final height: {:.6} m (setpoint {:.3} m, error {:+.6} m)",
        summary.final_height, summary.setpoint, summary.steady_state_error
    );
    println!(
        "  Peak height: {:.6} m (overshoot {:.6} m)",
        summary.peak_height, summary.overshoot
    );
    println!(
        "  Saturated control: {:.1}%",
        summary.saturated_fraction * 100.0
    );
    println!("  Σ|error|:   {:.3}", summary.cumulative_abs_error);
    println!("  Σ|control|: {:.3}", summary.cumulative_abs_control);
}
