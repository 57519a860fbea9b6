use anyhow::{anyhow, Context, Result};
use crossterm::style::Stylize;
use std::path::Path;
use std::sync::Arc;

use queryable_table::config::config::Config;
use queryable_table::data::column::infer_columns;
use queryable_table::data::data_exporter::DataExporter;
use queryable_table::data::datatable_loaders::load_file_to_datatable;
use queryable_table::table::{QueryableTable, TableOptions};
use queryable_table::table_display::render_to_string;
use queryable_table::utils::logging::init_tracing;

fn print_help() {
    println!("{}", "Queryable Table - search, sort and page through records".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  queryable-table [OPTIONS] FILE.csv|FILE.json");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}     - Keep rows containing TEXT", "--search TEXT".green());
    println!("  {}       - Sort by column KEY (ascending)", "--sort KEY".green());
    println!("  {}           - Sort descending", "--desc".green());
    println!("  {}         - Show page N (1-based)", "--page N".green());
    println!("  {}    - Rows per page", "--page-size N".green());
    println!("  {}     - Select every row on the page", "--select-all".green());
    println!("  {}  - Write selection (or page) to .csv/.json", "--export FILE".green());
    println!("  {} - Write a commented config file", "--generate-config".green());
    println!("  {}      - Print recent log entries", "--show-logs".green());
    println!("  {}        - Log to stderr", "--verbose".green());
    println!();
}

#[derive(Debug, Default)]
struct CliArgs {
    file: Option<String>,
    search: Option<String>,
    sort: Option<String>,
    descending: bool,
    page: usize,
    page_size: Option<usize>,
    select_all: bool,
    export: Option<String>,
    generate_config: bool,
    show_logs: bool,
    verbose: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs {
        page: 1,
        ..CliArgs::default()
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} needs a value", name))
        };
        match arg.as_str() {
            "--search" => cli.search = Some(value("--search")?),
            "--sort" => cli.sort = Some(value("--sort")?),
            "--desc" => cli.descending = true,
            "--page" => {
                cli.page = value("--page")?
                    .parse()
                    .context("--page expects a number")?;
                if cli.page == 0 {
                    return Err(anyhow!("--page starts at 1"));
                }
            }
            "--page-size" => {
                cli.page_size = Some(
                    value("--page-size")?
                        .parse()
                        .context("--page-size expects a number")?,
                )
            }
            "--select-all" => cli.select_all = true,
            "--export" => cli.export = Some(value("--export")?),
            "--generate-config" => cli.generate_config = true,
            "--show-logs" => cli.show_logs = true,
            "--verbose" => cli.verbose = true,
            "--help" | "-h" => cli.help = true,
            other if other.starts_with("--") => return Err(anyhow!("Unknown option {}", other)),
            other => cli.file = Some(other.to_string()),
        }
    }

    Ok(cli)
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error creating config directory {:?}", parent))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("Error writing config file {:?}", path))?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

fn run(cli: CliArgs) -> Result<()> {
    if cli.generate_config {
        return generate_config();
    }

    let file = cli
        .file
        .as_deref()
        .ok_or_else(|| anyhow!("No data file given (try --help)"))?;

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(target: "config", "Using default config: {:#}", e);
        Config::default()
    });

    let rows = Arc::new(load_file_to_datatable(file)?);
    let columns = infer_columns(&rows);
    let mut options = TableOptions::from_config(&config).title(format!("{} ({})", rows.name, file));
    if cli.select_all {
        options = options.selectable(true);
    }

    let mut table = QueryableTable::new(columns, rows, options);

    if let Some(size) = cli.page_size {
        table.set_page_size(size)?;
    }
    if let Some(term) = &cli.search {
        table.set_search_term(term.as_str());
    }
    if let Some(key) = &cli.sort {
        table.set_sort(key)?;
        if cli.descending {
            table.set_sort(key)?;
        }
    }
    table.set_page(cli.page - 1);
    if cli.select_all {
        table.toggle_select_all(true);
    }

    println!("{}", render_to_string(&table.render(), &config.display));

    if let Some(target) = &cli.export {
        let rows = if table.state().selected_ids.is_empty() {
            table.page_rows()
        } else {
            table.selected_rows()
        };
        let message = DataExporter::export_to_file(Path::new(target), table.columns(), &rows)?;
        println!("{}", message.green());
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            print_help();
            std::process::exit(2);
        }
    };

    if cli.help {
        print_help();
        return;
    }

    let buffer = init_tracing(cli.verbose);
    let show_logs = cli.show_logs;

    let result = run(cli);

    if show_logs {
        println!();
        println!("{}", "Recent log entries:".yellow());
        for entry in buffer.get_recent(50) {
            println!("  {}", entry.format_for_display());
        }
    }

    if let Err(e) = result {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}
