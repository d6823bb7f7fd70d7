use clap::{Arg, ArgAction, Command};
use data_explorer::{explore_path, logging, CsvDialect, Exploration, ExplorerConfig};
use std::path::PathBuf;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging()?;

    let matches = Command::new("explore")
        .about("Parse a CSV/JSON upload and print its profile")
        .arg(Arg::new("path").long("path").required(true).value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("config").long("config").help("JSON settings file; EXPLORER_* variables are used when absent").value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("sample-size").long("sample-size").help("Rows examined for type inference and null counting").value_parser(clap::value_parser!(usize)))
        .arg(Arg::new("preview-rows").long("preview-rows").value_parser(clap::value_parser!(usize)))
        .arg(Arg::new("quoted").long("quoted").help("Use the quote-aware CSV grammar instead of the naive comma splitter").action(ArgAction::SetTrue))
        .arg(Arg::new("json").long("json").help("Print the whole exploration as JSON").action(ArgAction::SetTrue))
        .get_matches();

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(file) => ExplorerConfig::from_json_file(file)?,
        None => ExplorerConfig::from_env()?,
    };
    if let Some(&n) = matches.get_one::<usize>("sample-size") {
        config.profiler.sample_size = n;
    }
    if let Some(&n) = matches.get_one::<usize>("preview-rows") {
        config.preview_rows = n;
    }
    if matches.get_flag("quoted") {
        config.dialect = CsvDialect::Quoted;
    }

    let path = matches
        .get_one::<PathBuf>("path")
        .ok_or_else(|| anyhow::anyhow!("Provide --path <file>"))?;

    let start = Instant::now();
    let exploration = explore_path(path, &config).await?;
    let elapsed = start.elapsed().as_secs_f64();

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&exploration)?);
    } else {
        print_summary(&exploration, elapsed);
    }
    Ok(())
}

fn print_summary(ex: &Exploration, elapsed: f64) {
    let p = &ex.profile;
    let completeness = p
        .completeness_percent()
        .map(|c| format!("{c}%"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "source={} size={} crc=0x{:08x}\nrows={} columns={} sampled={} nulls={} completeness={}\nelapsed={:.3}s",
        ex.file.name,
        ex.file.human_size,
        ex.file.checksum,
        p.total_rows,
        p.total_columns,
        p.sampled_rows,
        p.null_count,
        completeness,
        elapsed
    );

    println!();
    for col in &p.column_profiles {
        println!("  {:<24} {:<8} nulls={}", col.name, col.inferred_type, col.null_count);
    }

    let preview = &ex.preview;
    if preview.columns.is_empty() {
        return;
    }
    println!();
    println!("{}", preview.columns.join(" | "));
    for row in &preview.rows {
        let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("null")).collect();
        println!("{}", cells.join(" | "));
    }
    if preview.hidden_columns > 0 {
        println!("(+{} more columns)", preview.hidden_columns);
    }
    if preview.hidden_rows > 0 {
        println!("(+{} more rows)", preview.hidden_rows);
    }
}
