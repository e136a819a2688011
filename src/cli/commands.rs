use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Crawl listings for a keyword and export the results as CSV")]
    Crawl {
        #[arg(help = "Search keyword")]
        keyword: String,
        #[arg(
            long,
            help = "Listing pages to scrape; omit for all discovered pages, 0 for none"
        )]
        pages: Option<usize>,
        #[arg(long, help = "Directory for the export file")]
        output_dir: Option<PathBuf>,
    },

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    #[command(about = "Show the effective configuration")]
    Show,

    #[command(about = "Print the default config file path")]
    Path,
}
