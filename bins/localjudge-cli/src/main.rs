mod commands;
mod config;
mod orchestrator;
mod parser;
mod runner;
mod signature;
mod testcases;
mod validator;

use anyhow::Result;
use clap::Parser;
use config::LanguageConfigManager;
use localjudge_common::types::{Problem, TestcaseSelector};
use orchestrator::TestOrchestrator;
use runner::ProcessRunner;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use validator::ValidationContext;

const TESTCASE_OUTPUT_DIR: &str = "testcase_output";
const VALIDATION_SCHEMA_FILE: &str = "config/results_validation_schema.json";

#[derive(Parser)]
#[command(name = "localjudge")]
#[command(
    about = "Build and test coding problems locally against fixture testcases",
    long_about = None
)]
struct Cli {
    /// The programming language
    #[arg(short, long, default_value = "cpp")]
    language: String,

    /// List problems
    #[arg(long, default_value_t = false)]
    list_problems: bool,

    /// List testcases for the problem selected with --problem
    #[arg(long, default_value_t = false)]
    list_testcases: bool,

    /// Name of the problem to build and test
    #[arg(short, long, default_value = "TwoSum", value_name = "problem_name")]
    problem: String,

    /// Directory with the problems (defaults to the current directory)
    #[arg(short = 'd', long, value_name = "dir")]
    problem_builds_dir: Option<PathBuf>,

    /// Run the expected solution instead of the one under test
    #[arg(short, long, default_value_t = false)]
    run_expected_tests: bool,

    /// Name of the testcase to run; 'All' runs every testcase
    #[arg(short, long, default_value = "All", value_name = "testcase_name")]
    testcase: String,

    /// Print verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn fatal(message: String) -> ! {
    error!("{message}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let languages = LanguageConfigManager::load_default()?;
    let language = match languages.get_config(&cli.language) {
        Ok(language) => language,
        Err(_) => fatal(format!(
            "Language '{}' is not configured. Available languages: {:?}",
            cli.language,
            languages.list_languages()
        )),
    };

    let problem_builds_dir = match &cli.problem_builds_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    if !problem_builds_dir.is_dir() {
        fatal(format!(
            "The problem builds directory {} does not exist.",
            problem_builds_dir.display()
        ));
    }

    let problems_dir = problem_builds_dir.join("problems");
    if !problems_dir.is_dir() {
        fatal(format!(
            "The problems directory {} does not exist.",
            problems_dir.display()
        ));
    }

    if cli.list_problems {
        commands::list_problems(&problems_dir)?;
        return Ok(());
    }

    let problem_dir = problems_dir.join(&cli.problem);
    if !problem_dir.is_dir() {
        fatal(format!(
            "The problem directory {} does not exist. Check the problem_builds_dir and problem arguments.",
            problem_dir.display()
        ));
    }

    let template_dir = problem_builds_dir.join("languages").join(&language.name);
    if !template_dir.is_dir() {
        fatal(format!(
            "The source template directory {} does not exist. This usually happens when the language is not supported.",
            template_dir.display()
        ));
    }

    let src_dir = problem_dir.join(&language.name);
    if !src_dir.is_dir() {
        fatal(format!(
            "The source directory {} does not exist. This usually happens when the language is not supported.",
            src_dir.display()
        ));
    }

    let problem = Problem {
        name: cli.problem.clone(),
        source_dir: src_dir,
        testcases_dir: problem_dir.join("testcases"),
    };
    let build_dir = problem.source_dir.join("build");

    if cli.list_testcases {
        commands::list_testcases(&problem.testcases_dir)?;
        return Ok(());
    }

    if !problem.testcases_dir.is_dir() {
        fatal(format!(
            "The testcases directory {} does not exist.",
            problem.testcases_dir.display()
        ));
    }

    println!(
        "Running localjudge on problem {} for testcase {} in language {}",
        problem.name, cli.testcase, language.name
    );
    debug!(
        src_dir = %problem.source_dir.display(),
        build_dir = %build_dir.display(),
        template_dir = %template_dir.display(),
        testcases_dir = %problem.testcases_dir.display(),
        "resolved problem layout"
    );

    commands::copy_templates(&template_dir, &problem.source_dir)?;

    let solution_file = problem.source_dir.join(&language.solution_file);
    let declaration_file = problem.source_dir.join(&language.declaration_file);
    match signature::ensure_declaration(&solution_file, &declaration_file) {
        Ok(function) => info!(function = %function, "solution entry point"),
        Err(err) => fatal(format!(
            "Could not extract the solution function from {}: {err}",
            solution_file.display()
        )),
    }

    let schema_path = Path::new(VALIDATION_SCHEMA_FILE);
    let validation = match ValidationContext::from_file(schema_path) {
        Ok(context) => context,
        Err(err) => fatal(format!(
            "Could not load the validation schema {}: {err}",
            schema_path.display()
        )),
    };

    commands::build_problem(language, &problem.source_dir, &build_dir).await?;

    let bin_dir = problem.source_dir.join("bin");
    if !bin_dir.is_dir() {
        fatal(format!(
            "The bin directory {} does not exist. Check the problem_builds_dir and problem arguments.",
            bin_dir.display()
        ));
    }
    let exe = bin_dir.join(commands::solution_executable_name(
        language,
        cli.run_expected_tests,
    ));
    if !exe.is_file() {
        fatal(format!(
            "The file {} does not exist. Check the problem_builds_dir and problem arguments.",
            exe.display()
        ));
    }

    let output_dir = PathBuf::from(TESTCASE_OUTPUT_DIR);
    let runner = ProcessRunner::new(language.timeout_ms, language.input_mode);
    let orchestrator = TestOrchestrator::new(runner, &validation);
    let selector = TestcaseSelector::parse(&cli.testcase);

    let (status, message) = orchestrator
        .run_tests(
            &exe,
            &problem.testcases_dir,
            &output_dir,
            &problem.name,
            &selector,
        )
        .await;

    if status != 0 {
        error!("Tests failed! Error: {message}");
        std::process::exit(status);
    }

    info!("all selected testcases passed");
    Ok(())
}
