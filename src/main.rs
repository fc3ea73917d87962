use clap::Parser;
use claude_desktop_installer::download::HttpFetcher;
use claude_desktop_installer::paths::{self, InstallTargets};
use claude_desktop_installer::{VERSION, pipeline, platform, remover, report};

#[derive(Parser)]
#[command(name = "claude-desktop-installer")]
#[command(version = VERSION)]
#[command(about = "Repackages Claude Desktop for Linux", long_about = None)]
struct Cli {
    /// Remove the installed application and exit
    #[arg(long)]
    remove: bool,

    /// Remove any existing installation, then install from scratch
    #[arg(long)]
    clean_install: bool,

    /// Unrecognized arguments are ignored rather than rejected
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    extra: Vec<String>,
}

/// Flags after rescuing recognized ones from the trailing catch-all.
///
/// clap stops flag matching at the first unrecognized argument, so
/// `--verbose --remove` lands entirely in `extra`. Recognized flags are
/// honored wherever they appear; only the rest is ignored.
struct Flags {
    remove: bool,
    clean_install: bool,
    ignored: Vec<String>,
}

fn effective_flags(cli: &Cli) -> Flags {
    let mut flags = Flags {
        remove: cli.remove,
        clean_install: cli.clean_install,
        ignored: Vec::new(),
    };
    for arg in &cli.extra {
        match arg.as_str() {
            "--remove" => flags.remove = true,
            "--clean-install" => flags.clean_install = true,
            other => flags.ignored.push(other.to_string()),
        }
    }
    flags
}

fn main() {
    let cli = Cli::parse();
    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let flags = effective_flags(cli);
    if !flags.ignored.is_empty() {
        report::warn(format!(
            "ignoring unrecognized arguments: {}",
            flags.ignored.join(" ")
        ));
    }

    let targets = match InstallTargets::detect() {
        Ok(t) => t,
        Err(e) => {
            report::error(e.to_string());
            return 1;
        }
    };

    // --remove is terminal regardless of other flags
    if flags.remove {
        return match remover::remove(&targets) {
            Ok(()) => 0,
            Err(e) => {
                report::error(e.to_string());
                1
            }
        };
    }

    if flags.clean_install {
        if let Err(e) = remover::remove(&targets) {
            report::error(e.to_string());
            return 1;
        }
    }

    install(&targets)
}

fn install(targets: &InstallTargets) -> i32 {
    let platform = match platform::detect() {
        Ok(p) => p,
        Err(e) => {
            report::error(e.to_string());
            return 1;
        }
    };

    let fetcher = HttpFetcher { show_progress: true };
    let workspace = paths::workspace_dir();

    let build = match pipeline::run_build(platform, &fetcher, &workspace) {
        Ok(b) => b,
        Err(e) => {
            report::error(e.to_string());
            return 1;
        }
    };

    if let Err(e) = pipeline::run_install(platform, targets, &build) {
        report::error(e.to_string());
        return 1;
    }

    report::info("installation complete!");
    report::info(format!(
        "run '{}' or find Claude in your application menu",
        targets.launcher.display()
    ));
    0
}
