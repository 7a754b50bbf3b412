// Listing, template-copy, and build-invocation glue around the core pipeline
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::LanguageConfig;
use crate::testcases::{TestCaseRepository, natural_cmp};

/// List problem directories under the problems dir.
pub fn list_problems(problems_dir: &Path) -> Result<()> {
    let mut names = Vec::new();
    for entry in fs::read_dir(problems_dir)
        .with_context(|| format!("Failed to read {}", problems_dir.display()))?
    {
        let entry = entry?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort_by(|a, b| natural_cmp(a, b));

    println!("List of problems:");
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// List a problem's testcases in natural order, extension stripped.
pub fn list_testcases(testcases_dir: &Path) -> Result<()> {
    let repository = TestCaseRepository::new(testcases_dir);
    println!("List of testcases:");
    for testcase in repository.list()? {
        println!("{}", testcase.id);
    }
    Ok(())
}

/// Copy language template sources into the problem source dir.
///
/// Files already present are left alone, so a started solution is never
/// overwritten by its template.
pub fn copy_templates(template_dir: &Path, src_dir: &Path) -> Result<()> {
    for entry in fs::read_dir(template_dir)
        .with_context(|| format!("Failed to read {}", template_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let destination = src_dir.join(entry.file_name());
        if destination.exists() {
            continue;
        }
        debug!(
            from = %path.display(),
            to = %destination.display(),
            "copying template file"
        );
        fs::copy(&path, &destination).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                path.display(),
                destination.display()
            )
        })?;
    }
    Ok(())
}

/// Configure (unless already configured), build, and install the solution.
pub async fn build_problem(
    language: &LanguageConfig,
    src_dir: &Path,
    build_dir: &Path,
) -> Result<()> {
    if build_dir.join("CMakeCache.txt").exists() {
        println!("Build already configured. Skipping configuration.");
    } else {
        run_step(&language.build.configure, src_dir, build_dir).await?;
    }
    run_step(&language.build.build, src_dir, build_dir).await?;
    run_step(&language.build.install, src_dir, build_dir).await?;
    Ok(())
}

fn substitute(arg: &str, src_dir: &Path, build_dir: &Path) -> String {
    arg.replace("{src_dir}", &src_dir.display().to_string())
        .replace("{build_dir}", &build_dir.display().to_string())
}

/// Run one build step as an explicit argument vector (no shell), streaming
/// its output.
async fn run_step(argv: &[String], src_dir: &Path, build_dir: &Path) -> Result<()> {
    let argv: Vec<String> = argv
        .iter()
        .map(|arg| substitute(arg, src_dir, build_dir))
        .collect();
    let (program, args) = argv
        .split_first()
        .context("Build step has no command configured")?;

    info!(command = %argv.join(" "), cwd = %src_dir.display(), "running build step");
    println!("🔨 Running: {}", argv.join(" "));

    let status = Command::new(program)
        .args(args)
        .current_dir(src_dir)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to execute {program}. Is it installed and on PATH?"))?;

    if !status.success() {
        bail!(
            "Build step '{}' failed with exit code: {:?}",
            argv.join(" "),
            status.code()
        );
    }
    Ok(())
}

fn exe_extension() -> &'static str {
    if cfg!(windows) { ".exe" } else { "" }
}

/// Name of the installed solution executable for a language.
pub fn solution_executable_name(language: &LanguageConfig, expected: bool) -> String {
    let prefix = if expected {
        "solution_expected_"
    } else {
        "solution_"
    };
    format!("{prefix}{}{}", language.name, exe_extension())
}
