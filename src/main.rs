use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use appsweep::models::human_size;
use appsweep::utils::app_lifecycle::is_app_running;
use appsweep::utils::askpass::register_askpass_helper;
use appsweep::{AppError, AppResult, Application, UninstallSettings, UninstallSummary, Uninstaller};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Remove a macOS application together with the files it left around the system",
    long_about = None
)]
struct Args {
    /// Application bundle to remove, e.g. /Applications/Foo.app
    bundle: PathBuf,

    /// Actually delete; without this only the plan is printed
    #[arg(long, short)]
    yes: bool,

    /// Ask for administrator rights up front
    #[arg(long)]
    always_elevate: bool,

    /// Never touch paths under this prefix (repeatable)
    #[arg(long, short = 'x')]
    exclude: Vec<String>,

    /// Settings file (defaults to the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remove even if the application seems to be running
    #[arg(long)]
    force: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> AppResult<bool> {
    let mut settings = match args.config.clone().or_else(UninstallSettings::default_path) {
        Some(path) => UninstallSettings::load(&path)?,
        None => UninstallSettings::default(),
    };
    settings.always_elevate |= args.always_elevate;
    settings.excluded_paths.extend(args.exclude.iter().cloned());
    register_askpass_helper(settings.askpass_helper.as_deref());

    let app = Application::resolve(&args.bundle)?;

    let sweeper = Uninstaller::default();
    let plan = sweeper.plan_for(&app, &settings.excluded_paths).await?;

    if !args.yes {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            println!(
                "{} and {} related paths ({} total)",
                plan.bundle_path.display(),
                plan.artifacts.len(),
                human_size(plan.total_size_bytes)
            );
            println!("  {}  {}", human_size(plan.bundle_size_bytes), plan.bundle_path.display());
            for artifact in &plan.artifacts {
                println!("  {}  {}", human_size(artifact.size_bytes), artifact.path.display());
            }
            println!("Run again with --yes to remove them.");
        }
        return Ok(true);
    }

    if !args.force && is_app_running(&plan.bundle_path) {
        return Err(AppError::Custom(format!(
            "{} is currently running. Quit it first, or pass --force.",
            app.name
        )));
    }

    let outcome = sweeper.execute(plan.clone(), settings.execute_config()).await?;
    let summary = UninstallSummary::from_outcome(&app, &plan, &outcome);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.message);
        for path in &summary.failed_paths {
            println!("  not removed: {}", path.display());
        }
    }
    Ok(summary.success)
}
