// Command-line front end.
//
// - `show` prints one property's chart series and detail table.
// - `compare` overlays two properties, aligning their fee categories.
// - `properties` lists the configured vocabularies.
// Chart data and tables can also be exported for an external renderer.
use bill_report::combine::{compare, PropertyData};
use bill_report::loader::{self, LoadReport};
use bill_report::output;
use bill_report::reshape::reshape;
use bill_report::schema::{self, PropertySchema, SchemaRegistry};
use bill_report::types::{BillRow, LongRow, Selection, SeriesKey, WideTable};
use bill_report::util;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EMPTY_SELECTION_WARNING: &str = "請選擇至少一個年份與費用類型";

#[derive(Parser)]
#[command(name = "bill_report", about = "Household utility bill trends per year and fee category")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the bill CSV files
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// JSON file replacing the built-in property schemas
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// -v for info, -vv for debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// One property's bills
    Show {
        property: String,
        /// Only print these series, e.g. 2023電費
        #[arg(long)]
        series: Vec<String>,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Two properties on one chart
    Compare {
        #[arg(long, default_value = "綠園")]
        primary: String,
        #[arg(long, default_value = "奧斯卡")]
        secondary: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List configured properties
    Properties,
}

#[derive(Args)]
struct QueryArgs {
    /// Years to include, comma separated (default: every year in the data)
    #[arg(long, value_delimiter = ',')]
    years: Vec<i32>,
    /// Fee categories, comma separated (default: the property's defaults)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,
    /// Write the chart payload as JSON
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write the detail table as CSV
    #[arg(long)]
    table_csv: Option<PathBuf>,
    /// Write the long form as CSV
    #[arg(long)]
    long_csv: Option<PathBuf>,
    /// Rows shown in the console previews
    #[arg(long, default_value_t = 12)]
    preview: usize,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_registry(path: Option<&Path>) -> Result<SchemaRegistry, Box<dyn Error>> {
    match path {
        Some(p) => SchemaRegistry::from_json_file(p),
        None => Ok(schema::builtin().clone()),
    }
}

/// Load one property's CSV and print a short summary of what happened.
fn handle_load(data_dir: &Path, schema: &PropertySchema) -> Result<Vec<BillRow>, Box<dyn Error>> {
    let path = data_dir.join(&schema.source);
    let (rows, report): (Vec<BillRow>, LoadReport) = loader::load_bills_file(&path, schema)?;
    println!(
        "Processing {}... ({} rows loaded, {} skipped)",
        schema.source,
        util::format_int(report.loaded_rows),
        util::format_int(report.skipped_rows)
    );
    if report.non_numeric_cells > 0 {
        println!(
            "Note: {} non-numeric cells treated as missing.",
            util::format_int(report.non_numeric_cells)
        );
    }
    Ok(rows)
}

fn pick_years(requested: &[i32], available: impl IntoIterator<Item = i32>) -> Vec<i32> {
    if requested.is_empty() {
        available.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
    } else {
        requested.to_vec()
    }
}

fn export(title: &str, long: &[LongRow], table: &WideTable, query: &QueryArgs) -> Result<(), Box<dyn Error>> {
    if let Some(path) = &query.json {
        output::write_json(path, &output::chart_payload(title, long))?;
        println!("(Chart data exported to {})", path.display());
    }
    if let Some(path) = &query.table_csv {
        output::write_wide_csv_file(path, table)?;
        println!("(Detail table exported to {})", path.display());
    }
    if let Some(path) = &query.long_csv {
        output::write_long_csv_file(path, long)?;
        println!("(Series exported to {})", path.display());
    }
    Ok(())
}

fn handle_show(
    registry: &SchemaRegistry,
    data_dir: &Path,
    property: &str,
    series: &[String],
    query: &QueryArgs,
) -> Result<(), Box<dyn Error>> {
    let schema = registry.get(property)?;
    let rows = handle_load(data_dir, schema)?;

    let categories = if query.categories.is_empty() {
        schema.default_selection()
    } else {
        query.categories.clone()
    };
    let selection = Selection::new(
        pick_years(&query.years, rows.iter().map(|r| r.year)),
        categories,
    );
    let reshaped = reshape(&rows, &selection, schema, None)?;

    let wanted: Vec<SeriesKey> = series
        .iter()
        .map(|label| {
            SeriesKey::parse(label, selection.years(), &[schema.tag.as_str()], &schema.vocabulary)
        })
        .collect::<Result<_, _>>()?;
    let shown: Vec<LongRow> = reshaped
        .long
        .iter()
        .filter(|r| {
            wanted.is_empty()
                || wanted
                    .iter()
                    .any(|k| k.year == r.key.year && k.category == r.key.category)
        })
        .cloned()
        .collect();

    let title = format!("{}各年度各項費用趨勢", schema.name);
    println!("\n{}\n", title);
    if reshaped.is_empty() {
        println!("{}\n", EMPTY_SELECTION_WARNING);
    } else {
        output::preview_long(&shown, query.preview);
    }

    let mut table = reshaped.wide.clone();
    table.sort_by_period();
    println!("費用明細表\n");
    output::preview_wide(&table, query.preview);

    export(&title, &shown, &table, query)
}

fn handle_compare(
    registry: &SchemaRegistry,
    data_dir: &Path,
    primary: &str,
    secondary: &str,
    query: &QueryArgs,
) -> Result<(), Box<dyn Error>> {
    let a_schema = registry.get(primary)?;
    let b_schema = registry.get(secondary)?;
    let a_rows = handle_load(data_dir, a_schema)?;
    let b_rows = handle_load(data_dir, b_schema)?;

    let categories = if query.categories.is_empty() {
        a_schema.default_selection()
    } else {
        query.categories.clone()
    };
    let years = pick_years(
        &query.years,
        a_rows.iter().chain(b_rows.iter()).map(|r| r.year),
    );
    let selection = Selection::new(years, categories);

    let cmp = compare(
        PropertyData { schema: a_schema, rows: &a_rows },
        PropertyData { schema: b_schema, rows: &b_rows },
        &selection,
    )?;

    let title = format!("{} vs {}各年度各項費用趨勢", a_schema.name, b_schema.name);
    println!("\n{}\n", title);
    println!(
        "{} categories: {}",
        b_schema.name,
        cmp.secondary_selection.categories().join(", ")
    );
    if cmp.is_incomplete() {
        println!("{}\n", EMPTY_SELECTION_WARNING);
    } else {
        output::preview_long(&cmp.long, query.preview);
    }

    println!("費用明細表\n");
    output::preview_wide(&cmp.table, query.preview);

    export(&title, &cmp.long, &cmp.table, query)
}

fn handle_properties(registry: &SchemaRegistry) {
    for p in &registry.properties {
        println!("{} ({}) <- {}", p.name, p.id, p.source);
        println!("  categories: {}", p.vocabulary.join(", "));
        println!("  default:    {}", p.default_selection().join(", "));
        for (from, to) in &p.aliases {
            println!("  alias:      {} -> {}", from, to);
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let registry = load_registry(cli.schema.as_deref())?;
    match &cli.command {
        Command::Show { property, series, query } => {
            handle_show(&registry, &cli.data_dir, property, series, query)
        }
        Command::Compare { primary, secondary, query } => {
            handle_compare(&registry, &cli.data_dir, primary, secondary, query)
        }
        Command::Properties => {
            handle_properties(&registry);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
