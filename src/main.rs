use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use tabwork::export::{self, ExportFormat};
use tabwork::logging::{init_logging, LogConfig};
use tabwork::{load, ops};
use tabwork::parser::parse_chart_request;
use tabwork::workflow::{Nav, Session};
use tabwork::{OutputFormat, Settings};

#[derive(Parser, Debug)]
#[command(name = "tabwork")]
#[command(about = "Clean, transform, chart and export a tabular dataset", long_about = None)]
struct Args {
    /// Dataset to load (.csv, .json, .xlsx, .xls, .ods), or - for CSV on stdin
    #[arg(required_unless_present = "list_ops")]
    input: Option<PathBuf>,

    /// Operation to apply, as "Category::Operation" (repeatable, applied in order)
    #[arg(long = "op", value_name = "CATEGORY::OPERATION")]
    ops: Vec<String>,

    /// Chart expression (e.g., 'pie(names: region, values: sales) | labs(title: "Sales")')
    #[arg(long)]
    chart: Option<String>,

    /// Where to write the chart; stdout when omitted. The extension picks PNG or SVG.
    #[arg(long, value_name = "PATH", requires = "chart")]
    chart_out: Option<PathBuf>,

    /// Print the chart parameters as JSON (to stderr when the chart goes to stdout)
    #[arg(long, requires = "chart")]
    print_spec: bool,

    /// Write the processed dataset here
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Export format (csv or xlsx); defaults to the export path's extension
    #[arg(long, requires = "export")]
    format: Option<ExportFormat>,

    /// JSON settings file (render size and format, export naming)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// List every operation category and operation, then exit
    #[arg(long)]
    list_ops: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_config =
        LogConfig::from_verbosity(args.verbose, args.quiet).with_ansi(io::stderr().is_terminal());
    init_logging(&log_config);

    if args.list_ops {
        print_catalog();
        return Ok(());
    }

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("No input dataset given"))?;
    run(&args, input, &settings)
}

fn run(args: &Args, input: &Path, settings: &Settings) -> Result<()> {
    let mut session = Session::new();

    // 1. Upload
    session.navigate(Nav::GetStarted)?;
    let (rows, cols) = if input == Path::new("-") {
        let table = load::read_csv(io::stdin().lock()).context("Error loading stdin")?;
        session.load_table(table).shape()
    } else {
        session.upload(input)?.shape()
    };
    eprintln!("Dataset loaded successfully! Shape: ({rows}, {cols})");

    // 2. Cleaning and transformation operations, in the order given
    session.navigate(Nav::Next)?;
    for op in &args.ops {
        let (category, label) = op
            .split_once("::")
            .ok_or_else(|| anyhow!("Operation '{}' must be written as Category::Operation", op))?;
        let (category, label) = (category.trim(), label.trim());
        let applied = session
            .apply(category, label)
            .with_context(|| format!("Failed to apply '{label}'"))?;
        if let Some(notice) = applied.notice {
            eprintln!("Warning: {notice}");
        }
        eprintln!("Operation '{label}' applied successfully!");
        if let Some(change) = applied.shape_change {
            eprintln!("{change}");
        }
    }
    session.navigate(Nav::Next)?;
    session.navigate(Nav::Next)?;

    // 3. Chart
    if let Some(expression) = &args.chart {
        let request = parse_chart_request(expression)?;
        let mut selections = settings.render.selections();
        selections.extend(request.selections);

        let chart = session
            .chart(request.chart_type, &selections)
            .context("Failed to generate chart")?;
        if let Some(notice) = chart.notice() {
            eprintln!("Warning: {notice}");
        }
        if args.print_spec {
            if let Some(spec) = session.chart_spec() {
                let json = serde_json::to_string_pretty(spec)?;
                // Chart bytes own stdout unless they go to a file
                if args.chart_out.is_some() {
                    println!("{json}");
                } else {
                    eprintln!("{json}");
                }
            }
        }

        let format = match &args.chart_out {
            Some(path) => OutputFormat::from_path(path)?,
            None => settings.render.format,
        };
        let bytes = chart.encode(format)?;
        match &args.chart_out {
            Some(path) => std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write chart to {}", path.display()))?,
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(&bytes)
                    .context("Failed to write chart to stdout")?;
                handle.flush().context("Failed to flush stdout")?;
            }
        }
    }

    // 4. Export
    session.navigate(Nav::Next)?;
    if let Some(path) = &args.export {
        let format = match args.format {
            Some(format) => format,
            None => path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("csv")
                .parse()
                .map_err(|e: String| anyhow!(e))?,
        };
        let writer = export::spreadsheet_writer();
        let export = session.export(format, writer.as_deref(), &settings.export)?;
        if let Some(notice) = &export.degraded {
            eprintln!("Warning: {notice}");
        }

        // A CSV fallback gets a matching extension
        let target = path.with_extension(export.format.extension());
        std::fs::write(&target, &export.bytes)
            .with_context(|| format!("Failed to write export to {}", target.display()))?;
        eprintln!("{}: {}", export.label(), target.display());
    }

    Ok(())
}

fn print_catalog() {
    for menu in [ops::Menu::Cleaning, ops::Menu::Transformation] {
        println!("{menu:?}");
        for category in menu.categories() {
            println!("  {}", category.label());
            for operation in category.operations() {
                println!("    {}", operation.label());
            }
        }
    }
}
