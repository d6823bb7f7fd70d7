use data_explorer::{explore, ExplorerConfig, RawFile};

fn main() -> anyhow::Result<()> {
    let raw = RawFile::from_text(
        "orders.csv",
        "order_id,placed_on,customer,total\n\
         1001,2024-01-03,ada,19.99\n\
         1002,2024-01-04,grace,\n\
         1003,2024-01-09,,5.00\n",
    );

    let ex = explore(&raw, &ExplorerConfig::default())?;
    println!(
        "{} rows x {} columns, {} empty cells",
        ex.profile.total_rows, ex.profile.total_columns, ex.profile.null_count
    );
    for col in &ex.profile.column_profiles {
        println!("{:<10} {}", col.name, col.inferred_type);
    }
    Ok(())
}
