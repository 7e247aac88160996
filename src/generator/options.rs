use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

// -------------------------------------------------------------------------------------------------

/// Command line interface of the site generator.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the site and write it with all configured backends.
    Build(Options),
    /// Print the assembled context and collected build artifacts as JSON.
    Info(Options),
    /// Print a `book.toml` for the project.
    CreateConfig(Options),
}

impl Command {
    pub fn options(&self) -> &Options {
        match self {
            Command::Build(options) | Command::Info(options) | Command::CreateConfig(options) => {
                options
            }
        }
    }
}

/// Options for a single generator run.
///
/// All values are optional and override the matching config file values.
#[derive(Args, Clone, Debug, Default)]
pub struct Options {
    /// Path of the config file [default: nodebook.yml, when present].
    #[arg(short = 'p', long = "config-path")]
    pub config_path: Option<PathBuf>,
    /// Local path or remote git URL of the documented repository.
    #[arg(short = 'r', long = "repo-url")]
    pub repo_path: Option<String>,
    /// Name of the build routine.
    #[arg(short = 'b', long = "build-fn")]
    pub build_fn: Option<String>,
    /// Depth of the history when cloning a remote repository.
    #[arg(short = 'c', long = "clone-depth")]
    pub clone_depth: Option<u32>,
    /// Root directory of the generated output.
    #[arg(short = 'd', long = "site-dir")]
    pub site_dir: Option<PathBuf>,
    /// Treat undefined template variables as errors.
    #[arg(short = 's', long)]
    pub strict: bool,
    /// Don't query the hosting API.
    #[arg(long)]
    pub offline: bool,
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_line() {
        let cli = Cli::try_parse_from([
            "nodebook", "-vv", "build", "-r", "../repo", "-c", "5", "-d", "out", "--offline",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        let Command::Build(options) = &cli.command else {
            panic!("expected the build command");
        };
        assert_eq!(options.repo_path.as_deref(), Some("../repo"));
        assert_eq!(options.clone_depth, Some(5));
        assert_eq!(options.site_dir, Some(PathBuf::from("out")));
        assert!(options.offline);
        assert!(!options.strict);
    }

    #[test]
    fn subcommand_names() {
        let cli = Cli::try_parse_from(["nodebook", "create-config", "-b", "website"]).unwrap();
        assert!(matches!(cli.command, Command::CreateConfig(_)));
        assert_eq!(cli.command.options().build_fn.as_deref(), Some("website"));
        assert!(Cli::try_parse_from(["nodebook", "info", "-q"]).unwrap().quiet);
        assert!(Cli::try_parse_from(["nodebook"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
