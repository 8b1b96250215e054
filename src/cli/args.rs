use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "siteupdate",
    version,
    about = "Create SQL, stats, graphs, and log files from highway and user data"
)]
pub struct Args {
    /// Path to the root of the highway data directory structure
    #[arg(short = 'w', long, default_value = "../../../HighwayData")]
    pub highwaydatapath: PathBuf,

    /// File of highway systems to include
    #[arg(short = 's', long, default_value = "systems.csv")]
    pub systemsfile: String,

    /// Path to the user list file data
    #[arg(short = 'u', long, default_value = "../../../UserData/list_files")]
    pub userlistfilepath: PathBuf,

    /// Database name for the .sql file name
    #[arg(short = 'd', long, default_value = "TravelMapping")]
    pub databasename: String,

    /// Path to write log files, which should have a "users" subdirectory
    #[arg(short = 'l', long, default_value = ".")]
    pub logfilepath: PathBuf,

    /// Path to write csv statistics files
    #[arg(short = 'c', long, default_value = ".")]
    pub csvstatfilepath: PathBuf,

    /// Path to write graph format data files
    #[arg(short = 'g', long, default_value = ".")]
    pub graphfilepath: PathBuf,

    /// Turn off generation of graph files
    #[arg(short = 'k', long, action = ArgAction::SetTrue)]
    pub skipgraphs: bool,

    /// Path to write data with near-miss points merged (generated only if
    /// specified)
    #[arg(short = 'n', long)]
    pub nmpmergepath: Option<PathBuf>,

    /// For development: restrict the dataset to these travelers
    #[arg(short = 'U', long, num_args = 1..)]
    pub userlist: Option<Vec<String>>,

    /// Run only the subset of the process needed to verify highway data
    /// changes
    #[arg(short = 'e', long, action = ArgAction::SetTrue)]
    pub errorcheck: bool,

    /// Additionally materialize the relational data into a local SQLite
    /// database at this path
    #[arg(long)]
    pub sqlite: Option<PathBuf>,
}
