mod catalog;
mod config;
mod rating;
mod search;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use catalog::Catalog;
use config::Config;

#[derive(Parser, Debug)]
#[command(name = "menudex", about = "Terminal meal catalog browser", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a meal catalog JSON file (overrides config and embedded data)
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter the catalog and print matches, one per line (tab-separated)
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Search term, matched case-insensitively against name, description
    /// and country. An empty term lists the whole catalog.
    #[arg(default_value = "")]
    query: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let (catalog, label) = load_catalog(&cli, &config)?;

    match cli.command {
        Some(Command::Query(args)) => {
            handle_query(&catalog, &config, &args);
            Ok(())
        }
        None => {
            let mut app = ui::app::App::new(&catalog, &config, label);
            app.run()
        }
    }
}

fn load_catalog(cli: &Cli, config: &Config) -> Result<(Catalog, String)> {
    if let Some(path) = cli.catalog.as_ref().or(config.catalog.as_ref()) {
        Ok((Catalog::load(path)?, path.display().to_string()))
    } else {
        Ok((Catalog::embedded()?, "embedded".to_string()))
    }
}

fn handle_query(catalog: &Catalog, config: &Config, args: &QueryArgs) {
    let results = search::filter_indices(catalog, &args.query);
    if results.is_empty() {
        println!("No matches for \"{}\"", args.query.trim());
        return;
    }

    println!(
        "Found {} meal(s) matching \"{}\"",
        results.len(),
        args.query.trim()
    );
    for index in results {
        if let Some(meal) = catalog.get(index) {
            println!(
                "{}\t{}\t{}\t{}",
                meal.name,
                meal.country,
                rating::stars(meal.rate),
                meal.price_display(&config.currency)
            );
        }
    }
}
