use std::fs;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use lambda_deploy_core::artifact::{package_bootstrap_zip, sha256_hex};

// ── CLI definition ─────────────────────────────────────────────────

const DEPLOY_BINARIES: &[&str] = &[
    "upload_artifact",
    "update_code",
    "update_configuration",
    "deploy",
];

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the lambda-deploy workspace",
    long_about = "A unified CLI for packaging Lambda artifacts, building the\n\
                  deploy binaries, and running CI checks in the lambda-deploy workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap a compiled runtime binary into a `bootstrap` Lambda zip
    Package {
        /// Compiled binary to wrap
        #[arg(long)]
        binary: PathBuf,
        /// Output zip path
        #[arg(long, default_value = "dist/function.zip")]
        output: PathBuf,
    },
    /// Build the deploy binaries for a CI runner target
    Build {
        /// Compilation target triple
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Check plus a release build of the deploy binaries
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_function(binary: &Path, output: &Path) {
    if !binary.exists() {
        panic!("expected compiled binary at '{}'", binary.display());
    }

    step("Package bootstrap zip");
    let contents = fs::read(binary).expect("failed to read runtime binary");
    let archive = package_bootstrap_zip(&contents).expect("failed to package bootstrap zip");
    if let Some(parent) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).expect("failed to create output directory");
    }
    fs::write(output, &archive).expect("failed to write bootstrap zip");

    eprintln!(
        "\nPackaged artifact:\n- {} ({} bytes, sha256 {})",
        output.display(),
        archive.len(),
        sha256_hex(&archive)
    );
}

fn build_deploy_binaries(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build deploy binaries");
    let mut cargo_args = vec!["build", "-p", "lambda_deploy_aws", "--target", target];
    for bin in DEPLOY_BINARIES {
        cargo_args.push("--bin");
        cargo_args.push(bin);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    eprintln!("\nBuilt binaries:");
    for bin in DEPLOY_BINARIES {
        eprintln!("- {}", target_dir.join(binary_name(bin, target)).display());
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- build`"
        );
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test lambda_deploy_core");
    run_cargo(&["test", "-p", "lambda_deploy_core", "--all-features"]);

    step("Test lambda_deploy_aws");
    run_cargo(&["test", "-p", "lambda_deploy_aws"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Package { binary, output } => {
            package_function(&binary, &output);
        }
        Commands::Build { target, profile } => {
            build_deploy_binaries(&target, profile);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::All => {
                    ci_check();
                    build_deploy_binaries("x86_64-unknown-linux-gnu", BuildProfile::Release);
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
