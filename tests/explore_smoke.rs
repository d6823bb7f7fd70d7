use data_explorer::{explore_path, explore_reader, ExplorerConfig, FileMeta, InferredType};
use std::{fs::File, io::Write, path::PathBuf, process::Command};

#[tokio::test]
async fn explores_gzip_csv_and_counts_rows() -> anyhow::Result<()> {
    // Create small CSV
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("tiny.csv");
    let mut f = File::create(&csv_path)?;
    writeln!(f, "sku,qty")?;
    for i in 0..10_000 {
        if i % 50 == 0 {
            writeln!(f, "SKU{i:06},")?;
        } else {
            writeln!(f, "SKU{i:06},{i}")?;
        }
    }

    // gzip it (use system gzip for speed)
    let gz_path: PathBuf = dir.path().join("tiny.csv.gz");
    let status = Command::new("bash")
        .arg("-lc")
        .arg(format!(
            "gzip -c {} > {}",
            csv_path.display(),
            gz_path.display()
        ))
        .status()?;
    assert!(status.success());

    let ex = explore_path(&gz_path, &ExplorerConfig::default()).await?;

    assert_eq!(ex.file.name, "tiny.csv");
    assert_eq!(ex.file.content_type, "text/csv");
    assert_eq!(ex.file.content_encoding, "gzip");
    assert_eq!(ex.file.size, std::fs::metadata(&gz_path)?.len());
    assert_eq!(ex.table.columns(), ["sku", "qty"]);
    assert_eq!(ex.profile.total_rows, 10_000);
    assert_eq!(ex.profile.sampled_rows, 100);
    // rows 0 and 50 of the first hundred have no qty
    assert_eq!(ex.profile.null_count, 2);
    assert_eq!(ex.profile.column("sku").unwrap().inferred_type, InferredType::Text);
    assert_eq!(ex.profile.column("qty").unwrap().inferred_type, InferredType::Numeric);
    assert_eq!(ex.preview.rows.len(), 10);
    assert_eq!(ex.preview.hidden_rows, 9_990);
    Ok(())
}

#[tokio::test]
async fn explores_json_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("people.JSON");
    std::fs::write(
        &path,
        r#"[{"name":"ada","born":"1815-12-10"},{"name":"alan","born":"1912-06-23"}]"#,
    )?;

    let ex = explore_path(&path, &ExplorerConfig::default()).await?;
    assert_eq!(ex.file.content_type, "application/json");
    assert_eq!(ex.file.content_encoding, "");
    assert_eq!(ex.table.columns(), ["name", "born"]);
    assert_eq!(ex.profile.column("born").unwrap().inferred_type, InferredType::Date);
    assert_eq!(ex.profile.completeness_percent(), Some(100));
    Ok(())
}

#[tokio::test]
async fn unsupported_upload_is_reported_not_swallowed() -> anyhow::Result<()> {
    let meta = FileMeta::named("notes.txt");
    let err = explore_reader(&b"hello"[..], meta, &ExplorerConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        data_explorer::ExplorerError::UnsupportedFormat { ref extension } if extension == "txt"
    ));
    Ok(())
}

#[tokio::test]
async fn missing_file_is_io_error() {
    let err = explore_path(
        std::path::Path::new("/definitely/not/here.csv"),
        &ExplorerConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, data_explorer::ExplorerError::Io(_)));
}
