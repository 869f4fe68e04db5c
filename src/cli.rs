//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ird", version, about = "Find IRD disc-verification files for PS3 games")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON); defaults to the platform config directory
    #[arg(long, global = true, env = "IRD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding downloaded IRD files; overrides the configuration
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect every IRD file for a product code, downloading what isn't cached
    Resolve {
        /// Product code, e.g. BLES01234
        product_code: String,
    },
    /// Search the IRD Library without downloading anything
    Search { query: String },
    /// Look a game up in the RPCS3 compatibility list
    Compat {
        /// Game title or product code
        search: String,
        /// Number of results (rounded up to 25, 50, 100 or 200)
        #[arg(long, default_value_t = 25)]
        amount: u32,
    },
    /// Check for a newer RPCS3 build
    Update {
        /// Commit of the build to compare against
        commit: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["ird", "resolve", "BLES01234", "-v", "--cache-dir", "/tmp/irds"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/irds")));
        assert!(matches!(cli.command, Command::Resolve { ref product_code } if product_code == "BLES01234"));
    }

    #[test]
    fn test_compat_amount_defaults() {
        let cli = Cli::try_parse_from(["ird", "compat", "Demon's Souls"]).unwrap();
        assert!(matches!(cli.command, Command::Compat { amount: 25, .. }));
        let cli = Cli::try_parse_from(["ird", "update"]).unwrap();
        assert!(matches!(cli.command, Command::Update { commit: None }));
    }
}
