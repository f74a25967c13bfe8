use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, Table as ComfyTable, presets::UTF8_FULL};
use serde_json::{Value as JsonValue, json};
use tablescope::{
    BrowseResult, BrowseSpec, EngineConfig, EngineError, ExportFormat, PagedTable, Preview, RowTable, Table,
    browse_table,
};

/// Browse, summarize and export tabular data from a JSON records file
#[derive(Parser, Debug)]
#[command(name = "tablescope")]
#[command(about = "Table browsing engine: filters, sort, paging, column statistics", long_about = None)]
struct Args {
    /// JSON file holding an array of flat objects, one per row
    input: PathBuf,

    /// Native table representation to load the rows into
    #[arg(short, long, value_enum, default_value_t = BackendKind::Memory)]
    backend: BackendKind,

    /// Config file (default: <config dir>/tablescope/config.toml, then ./tablescope.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override stats.max_cells
    #[arg(long)]
    max_cells: Option<usize>,

    /// Override display.max_columns
    #[arg(long)]
    max_columns: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    Memory,
    Paged,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of rows
    Browse {
        /// Browse request as JSON (filters, sortBy, pageSize, pageIndex, ...)
        #[arg(short, long)]
        spec: Option<String>,

        /// Serve the page from a cached preview
        #[arg(long)]
        preview: bool,

        /// Render rows as a grid instead of JSON
        #[arg(long)]
        grid: bool,
    },
    /// Print per-column statistics
    Stats {
        /// Column that needs min/max for a color scale (repeatable)
        #[arg(long = "color-scale")]
        color_scale: Vec<String>,
    },
    /// Write all rows to a file
    Export {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, default_value = "csv")]
        format: String,
    },
    /// Estimate the byte size of a full export
    Estimate {
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

fn load_config(args: &Args) -> Result<EngineConfig, EngineError> {
    let mut config = EngineConfig::load(args.config.as_deref())?;
    if let Some(max_cells) = args.max_cells {
        config.stats.max_cells = max_cells;
    }
    if let Some(max_columns) = args.max_columns {
        config.display.max_columns = max_columns;
    }
    Ok(config)
}

fn load_table(args: &Args, config: &EngineConfig) -> Result<Table, EngineError> {
    let text = fs::read_to_string(&args.input)?;
    let records: Vec<JsonValue> = serde_json::from_str(&text)?;
    let rows = RowTable::from_json_records(&records)?;
    log::debug!("Loaded {} rows from {}", rows.len(), args.input.display());

    Ok(match args.backend {
        BackendKind::Memory => Table::from(rows),
        BackendKind::Paged => Table::from(PagedTable::from_rows(
            rows.columns,
            &rows.rows,
            config.storage.page_size,
        )?),
    })
}

fn format_grid(result: &BrowseResult) -> String {
    let columns = result.rows.first().map(|r| r.keys().cloned().collect::<Vec<_>>()).unwrap_or_default();
    if columns.is_empty() {
        return "(0 rows)\n".to_string();
    }

    let mut table = ComfyTable::new();
    table.load_preset(UTF8_FULL);
    table.set_header(columns.iter().map(Cell::new));
    for row in &result.rows {
        table.add_row(columns.iter().map(|c| match row.get(c) {
            Some(JsonValue::String(s)) => Cell::new(s),
            Some(JsonValue::Null) | None => Cell::new(""),
            Some(other) => Cell::new(other),
        }));
    }

    format!("{table}\n({} of {} rows)\n", result.rows.len(), result.row_count)
}

fn run(args: &Args) -> Result<(), EngineError> {
    let config = load_config(args)?;
    let table = load_table(args, &config)?;
    let mut stdout = BufWriter::new(io::stdout().lock());

    match &args.command {
        Command::Browse { spec, preview, grid } => {
            let spec = BrowseSpec::from_json(spec.as_deref(), &table.column_names())?;
            let mut preview = preview.then(|| Preview::with_options(table.clone(), config.preview_options()));
            let result = browse_table(&table, &spec, preview.as_mut(), &config.display)?;

            if *grid {
                write!(stdout, "{}", format_grid(&result))?;
            } else {
                let output = json!({
                    "rows": result.rows,
                    "row_count": result.row_count,
                    "preview_row_count": result.preview_row_count,
                    "output_type": result.output_type,
                });
                writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
            }
        }
        Command::Stats { color_scale } => {
            let stats = table.analyze_columns(color_scale, &config.stats)?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&stats)?)?;
        }
        Command::Export { output, format } => {
            let _format: ExportFormat = format.parse()?;
            let mut file = BufWriter::new(fs::File::create(output)?);
            let bytes = table.to_csv(&mut file)?;
            file.flush()?;
            log::info!("Exported {} rows ({bytes} bytes) to {}", table.size()?, output.display());
        }
        Command::Estimate { format } => {
            let format: ExportFormat = format.parse()?;
            let bytes = table.estimate_export_byte_size_with(format, config.export.sample_size)?;
            writeln!(stdout, "{bytes}")?;
        }
    }

    stdout.flush()?;
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
