use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::catalog::CatalogKind;

#[derive(Debug, Parser)]
#[command(
    name = "omnia",
    version,
    about = "Browse, like and track movies, TV shows and video games"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive browser (default)
    Tui,
    /// Liked items of every kind plus recently viewed
    Home,
    /// List a catalog, optionally filtered
    Browse(BrowseArgs),
    /// Categories of a catalog grouped by initial
    Categories { kind: KindArg },
    /// Show one item and remember it as recently viewed
    Open { kind: KindArg, id: String },
    /// Flip the liked flag of one item
    Like { kind: KindArg, id: String },
    /// Recently viewed items
    Recent,
    /// Ask for something that is missing from the catalog
    Request {
        text: String,
        #[arg(long)]
        kind: Option<KindArg>,
    },
    /// Add a new item to a catalog
    Add(AddArgs),
    /// Print the config path and effective settings
    Config {
        /// Write the effective settings to the config file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Args)]
pub struct BrowseArgs {
    pub kind: KindArg,
    #[arg(short, long, default_value = "")]
    pub query: String,
    #[arg(short, long)]
    pub category: Option<String>,
    #[arg(short, long)]
    pub liked: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub kind: KindArg,
    #[arg(long)]
    pub title: String,
    /// Description for movies and shows, console for games
    #[arg(long, default_value = "")]
    pub detail: String,
    /// Explicit key; left to the backend when omitted
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(alias = "movies")]
    Movie,
    #[value(alias = "shows", alias = "tv")]
    Show,
    #[value(alias = "games")]
    Game,
}

impl From<KindArg> for CatalogKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => CatalogKind::Movie,
            KindArg::Show => CatalogKind::Show,
            KindArg::Game => CatalogKind::Game,
        }
    }
}
