use clap::{Arg, Command};
use std::io::{self, Write};

/// Cell for column `c` of row `i`: id, then numeric / date / text columns in
/// rotation. Every `blank_every`-th cell is left empty.
fn cell(i: u64, c: usize, blank_every: u64) -> String {
    if c > 0 && blank_every > 0 && (i + c as u64) % blank_every == 0 {
        return String::new();
    }
    match c % 3 {
        0 if c == 0 => format!("{i}"),
        1 => format!("{}.{:02}", i * 7 % 1000, i % 100),
        2 => format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
        _ => format!("v{c}_{i}"),
    }
}

fn column_name(c: usize) -> String {
    if c == 0 {
        "id".to_string()
    } else {
        format!("col{c}")
    }
}

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("cols")
                .long("cols")
                .value_parser(clap::value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["csv", "json"])
                .default_value("csv"),
        )
        .arg(
            Arg::new("blank-every")
                .long("blank-every")
                .help("Leave every Nth cell empty (0 = never)")
                .value_parser(clap::value_parser!(u64))
                .default_value("0"),
        )
        .get_matches();

    let rows = *matches.get_one::<u64>("rows").unwrap_or(&0);
    let cols = (*matches.get_one::<usize>("cols").unwrap_or(&4)).max(1);
    let blank_every = *matches.get_one::<u64>("blank-every").unwrap_or(&0);
    let json = matches.get_one::<String>("format").map(String::as_str) == Some("json");

    let mut out = io::BufWriter::new(io::stdout().lock());

    if json {
        writeln!(&mut out, "[")?;
        for i in 0..rows {
            let mut obj = serde_json::Map::new();
            for c in 0..cols {
                obj.insert(column_name(c), cell(i, c, blank_every).into());
            }
            let sep = if i + 1 < rows { "," } else { "" };
            writeln!(&mut out, "  {}{sep}", serde_json::Value::Object(obj))?;
        }
        writeln!(&mut out, "]")?;
    } else {
        let header: Vec<String> = (0..cols).map(column_name).collect();
        writeln!(&mut out, "{}", header.join(","))?;
        for i in 0..rows {
            let line: Vec<String> = (0..cols).map(|c| cell(i, c, blank_every)).collect();
            writeln!(&mut out, "{}", line.join(","))?;
            if i % 10_000 == 0 {
                out.flush()?;
            } // keep buffers moving on huge runs
        }
    }

    out.flush()?;
    Ok(())
}
