use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use teamsplit::capability::{capabilities_for, FallbackPolicy};
use teamsplit::context::ExecutionContext;
use teamsplit::engine::native::{NativeConfig, NativeEngine};
use teamsplit::errors::InputError;
use teamsplit::pipeline::{handle_request, SolveRequest};
use teamsplit::result::SolveStatus;
use teamsplit::scenario;
use teamsplit::session::{Session, SessionError, DEFAULT_TIME_LIMIT_MILLIS};

/// Split a CSV roster into two balanced teams with MiniZinc
#[derive(Parser, Debug)]
#[command(author, version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"), about, long_about = None)]
struct Cli {
    /// Roster CSV with a `name,rating[,position]` header ("-" reads stdin)
    #[arg(required_unless_present = "list")]
    roster: Option<PathBuf>,

    /// Balance objective
    #[arg(short, long, default_value = scenario::DEFAULT_SCENARIO)]
    scenario: String,

    /// Solver backend (defaults to this context's default solver)
    #[arg(long)]
    solver: Option<String>,

    /// Time limit in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TIME_LIMIT_MILLIS)]
    time_limit: u64,

    /// Ask the solver for every solution instead of the first optimal one
    #[arg(short, long)]
    all_solutions: bool,

    /// Path to the `minizinc` executable
    #[arg(long, default_value = "minizinc")]
    minizinc: PathBuf,

    /// Use the default solver when the requested one is not available
    #[arg(long)]
    fallback_to_default: bool,

    /// Print the response as JSON instead of the team listing
    #[arg(long)]
    json: bool,

    /// List scenarios and solvers, then exit
    #[arg(short, long)]
    list: bool,
}

/// Entry point of the teamsplit CLI.
///
/// Delegates to [`try_main`], catching any errors and printing them
/// in a user-friendly way before exiting with code 1.
fn main() -> ExitCode {
    // Set up logging
    let debug_enabled = std::env::var("TEAMSPLIT_DEBUG").is_ok();
    teamsplit::log::init_logger(debug_enabled);

    log::info!("Starting teamsplit");

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: cannot start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = runtime.block_on(try_main(cli)) {
        // Print the error message to stderr, with detailed formatting for our own errors
        if let Some(session_err) = e.downcast_ref::<SessionError>() {
            eprintln!("Error: {}", session_err.display_detailed());
        } else if let Some(input_err) = e.downcast_ref::<InputError>() {
            eprintln!("Error: {}", input_err.display_detailed());
        } else {
            eprintln!("Error: {e}");
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_listing(context: ExecutionContext) {
    println!("Scenarios:");
    for s in scenario::all() {
        println!("  {:<24} {}", s.id, s.description);
    }
    let capabilities = capabilities_for(context);
    println!("Solvers ({context}): {} (default {})", capabilities.available.join(", "), capabilities.default);
}

fn read_roster(path: &Path) -> Result<String, InputError> {
    if path.as_os_str() == "-" {
        Ok(std::io::read_to_string(std::io::stdin())?)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Core application logic for the teamsplit CLI.
///
/// Steps:
/// 1. Read the roster from disk (or stdin).
/// 2. Start a native session, which probes the `minizinc` executable.
/// 3. Solve the chosen scenario.
/// 4. Print the teams on stdout and timings on stderr.
async fn try_main(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let context = ExecutionContext::detect();
    if cli.list {
        print_listing(context);
        return Ok(());
    }
    let Some(roster_path) = cli.roster.as_ref() else {
        return Err("no roster given".into());
    };

    let csv_text = read_roster(roster_path)?;

    let t_init = Instant::now();
    let mut session: Session<NativeEngine> = Session::new(context);
    session.init(NativeConfig { executable: cli.minizinc.clone(), ..NativeConfig::default() }).await?;
    let init_secs = t_init.elapsed().as_secs_f64();

    let request = SolveRequest {
        solver_id: cli.solver.unwrap_or_else(|| session.capabilities().default.to_string()),
        scenario_id: cli.scenario,
        csv_text,
        time_limit_millis: Some(cli.time_limit),
        collect_all_solutions: Some(cli.all_solutions),
    };
    let policy = if cli.fallback_to_default { FallbackPolicy::UseDefault } else { FallbackPolicy::Reject };

    let t_solve = Instant::now();
    let response = handle_request(&mut session, &request, policy).await?;
    let solve_secs = t_solve.elapsed().as_secs_f64();
    session.close();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if let Some(teams) = &response.teams {
        println!("{teams}");
    }

    match response.status {
        SolveStatus::Optimal => eprintln!("✓ Optimal split"),
        SolveStatus::Satisfied => eprintln!("✓ Feasible split (not proven optimal)"),
        SolveStatus::Unsatisfiable => eprintln!("⚠️  No split satisfies the scenario's constraints"),
        SolveStatus::Unknown => eprintln!(
            "⚠️  No split found{}",
            response.error_detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
        ),
        SolveStatus::Error => {
            return Err(format!("solver failed: {}", response.error_detail.as_deref().unwrap_or("unknown error")).into());
        }
    }

    eprintln!(
        "Engine ready in {:.3}s; solved in {:.3}s ({} ms inside the session).",
        init_secs, solve_secs, response.elapsed_millis
    );

    Ok(())
}
