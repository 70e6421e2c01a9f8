use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fetchkit")]
#[command(about = "Download named resources from a catalog", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $FETCHKIT_CONFIG or config/fetchkit.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog file, overriding catalog.path from the configuration
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download resources by name; nothing is fetched if any name is unknown
    Fetch(FetchArgs),
    /// List catalog entries
    List(ListArgs),
    /// Show a single catalog entry
    Show(ShowArgs),
    /// Add an entry to the catalog
    Add(AddArgs),
    /// Remove an entry from the catalog
    Remove(RemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Resource names to download
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Maximum concurrent downloads
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Directory relative filenames are written into
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Print the batch outcome as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only entries carrying this tag
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    pub name: String,

    #[arg(long)]
    pub url: String,

    /// Destination file name
    #[arg(long)]
    pub filename: PathBuf,

    #[arg(long)]
    pub description: Option<String>,

    /// Tag for searching; repeatable
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "fetchkit", "--catalog", "samples/catalog.toml", "fetch", "naif0012", "de440", "-w",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.catalog, Some(PathBuf::from("samples/catalog.toml")));
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.names, vec!["naif0012", "de440"]);
                assert_eq!(args.workers, Some(2));
                assert!(!args.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_fetch_requires_a_name() {
        assert!(Cli::try_parse_from(["fetchkit", "fetch"]).is_err());
    }

    #[test]
    fn test_parse_add_with_tags() {
        let cli = Cli::try_parse_from([
            "fetchkit",
            "add",
            "de430",
            "--url",
            "https://example.org/de430.bsp",
            "--filename",
            "de430.bsp",
            "--tag",
            "spk",
            "--tag",
            "planets",
        ])
        .unwrap();

        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.name, "de430");
                assert_eq!(args.tags, vec!["spk", "planets"]);
                assert!(args.description.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
