//! grab - install the latest GitHub release asset of a project.

use std::process::ExitCode;

use clap::{ArgAction, CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use grab::{Api, GrabError};

const EXAMPLE: &str = "\
Example:
    $ grab -p ~/bin/ -r barg tobyjoe/grab";

#[derive(Debug, Parser)]
#[command(name = "grab", version, about, after_help = EXAMPLE)]
struct Cli {
    /// Project to grab, as owner/repo
    #[arg(value_name = "REPO")]
    repo: String,

    /// Rename the local download to NEWNAME
    #[arg(short, long, value_name = "NEWNAME")]
    rename: Option<String>,

    /// Install the local download to NEWPATH
    #[arg(short, long, value_name = "NEWPATH", env = "GRAB_PATH")]
    path: Option<String>,

    /// Perform a dry-run - do not download or install
    #[arg(short, long)]
    dry_run: bool,

    /// GitHub API base URL
    #[arg(long, value_name = "URL", env = "GRAB_API_URL", hide = true)]
    api_url: Option<String>,

    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Silence log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_usage() {
                eprintln!();
                eprintln!("{}", Cli::command().render_usage());
                eprintln!("\n{EXAMPLE}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), GrabError> {
    debug!(
        "Flags: rename({}), path({}), dry({})",
        cli.rename.as_deref().unwrap_or_default(),
        cli.path.as_deref().unwrap_or_default(),
        cli.dry_run
    );
    debug!("Args : {}", cli.repo);

    let mut api = Api::new().dry_run(cli.dry_run);
    if let Some(path) = &cli.path {
        api = api.set_install_dir(path);
    }
    if let Some(name) = &cli.rename {
        api = api.set_rename(name);
    }
    if let Some(url) = &cli.api_url {
        api = api.set_api_base(url);
    }

    let grabbed = api.repo(&cli.repo).grab().await?;
    if grabbed.downloaded {
        println!(
            "Installed {} ({}) to {}",
            grabbed.asset.name,
            grabbed.tag,
            grabbed.destination.display()
        );
    }
    Ok(())
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,grab=info",
        1 => "info,grab=debug",
        2 => "debug,grab=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from(["grab", "-p", "~/bin/", "-r", "barg", "-d", "tobyjoe/grab"]).unwrap();
        assert_eq!(cli.repo, "tobyjoe/grab");
        assert_eq!(cli.rename.as_deref(), Some("barg"));
        assert_eq!(cli.path.as_deref(), Some("~/bin/"));
        assert!(cli.dry_run);
    }

    #[test]
    fn repo_is_required() {
        assert!(Cli::try_parse_from(["grab", "-d"]).is_err());
    }

    #[test]
    fn counts_verbosity() {
        let cli = Cli::try_parse_from(["grab", "-vv", "a/b"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(Cli::try_parse_from(["grab", "-q", "-v", "a/b"]).is_err());
    }
}
