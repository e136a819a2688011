use super::Cli;
use super::commands::{Command, ConfigCommand};
use crate::config::{Config, ConfigOverrides, default_config_path};
use crate::crawler::Crawler;
use crate::{Result, output};

pub async fn dispatch(mut cli: Cli, config: Config) -> Result<()> {
    let command = match cli.command.take() {
        Some(cmd) => cmd,
        None => {
            eprintln!("No command provided. Use --help for usage.");
            std::process::exit(1);
        }
    };

    match command {
        Command::Crawl {
            keyword,
            pages,
            output_dir,
        } => {
            let config = config.load_with_overrides(ConfigOverrides {
                headless: cli.headless,
                chrome_path: cli.chrome_path.clone(),
                output_dir,
            });

            let summary = Crawler::new(config, keyword, pages).run().await?;
            output::print_output(&summary, cli.json, true)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigCommand::Path => {
                println!("{}", default_config_path()?.display());
            }
        },
    }

    Ok(())
}
