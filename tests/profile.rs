use data_explorer::{
    explore, parse, profile, ExplorerConfig, ExplorerError, InferredType, Profiler,
    ProfilerConfig, RawFile,
};

#[test]
fn csv_scenario_counts_empty_cells() {
    let table = parse("data.csv", "a,b\n1,x\n2,\n,z\n").unwrap();
    let p = profile(&table, 3).unwrap();
    assert_eq!(p.total_rows, 3);
    assert_eq!(p.total_columns, 2);
    assert_eq!(p.null_count, 2);
    assert_eq!(p.column_profiles[0].null_count, 1);
    assert_eq!(p.column_profiles[1].null_count, 1);
    assert_eq!(p.completeness_percent(), Some(67));
}

#[test]
fn json_numbers_are_numeric() {
    let table = parse("x.json", r#"[{"a":1},{"a":2}]"#).unwrap();
    let p = profile(&table, 100).unwrap();
    assert_eq!(p.total_rows, 2);
    assert_eq!(p.column_profiles[0].inferred_type, InferredType::Numeric);
}

#[test]
fn type_inference() {
    let mut csv = String::from("mostly_ints,colors,nothing,when,years,mixed\n");
    let colors = ["red", "blue", "green"];
    let mixed = ["1", "2", "3", "x", "y"];
    for i in 0..10 {
        let int = if i == 9 { String::new() } else { i.to_string() };
        csv.push_str(&format!(
            "{int},{},,2024-01-{:02},{},{}\n",
            colors[i % 3],
            i + 1,
            1990 + i,
            mixed[i % 5]
        ));
    }
    let table = parse("t.csv", &csv).unwrap();
    let p = profile(&table, 100).unwrap();
    let ty = |name: &str| p.column(name).unwrap().inferred_type;

    assert_eq!(ty("mostly_ints"), InferredType::Numeric);
    assert_eq!(ty("colors"), InferredType::Text);
    assert_eq!(ty("nothing"), InferredType::Empty);
    assert_eq!(ty("when"), InferredType::Date);
    // bare years parse as dates too, numeric wins
    assert_eq!(ty("years"), InferredType::Numeric);
    // 60% numeric is under the cutoff
    assert_eq!(ty("mixed"), InferredType::Text);
}

#[test]
fn rows_past_the_sample_do_not_matter() {
    let mut csv = String::from("n,label\n");
    for i in 0..5 {
        csv.push_str(&format!("{i},item{i}\n"));
    }
    let base = parse("s.csv", &csv).unwrap();

    for _ in 0..50 {
        csv.push_str(",,garbage,more\n");
    }
    let padded = parse("s.csv", &csv).unwrap();

    let a = profile(&base, 5).unwrap();
    let b = profile(&padded, 5).unwrap();
    assert_eq!(b.total_rows, 55);
    assert_eq!(a.null_count, b.null_count);
    assert_eq!(a.column_profiles, b.column_profiles);
    assert_eq!(b.sampled_rows, 5);
}

#[test]
fn zero_sample_size_is_rejected() {
    let table = parse("s.csv", "a\n1\n").unwrap();
    assert!(matches!(
        profile(&table, 0),
        Err(ExplorerError::InvalidArgument(_))
    ));
}

#[test]
fn thresholds_are_configurable() {
    let table = parse("m.csv", "v\n1\n2\nthree\n").unwrap();
    assert_eq!(
        profile(&table, 100).unwrap().column_profiles[0].inferred_type,
        InferredType::Text
    );

    let lenient = Profiler::new(ProfilerConfig {
        numeric_threshold: 0.5,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        lenient.profile(&table).column_profiles[0].inferred_type,
        InferredType::Numeric
    );
}

#[test]
fn json_nulls_count_as_missing() {
    let table = parse("n.json", r#"[{"a":null,"b":""},{"b":"x"}]"#).unwrap();
    let p = profile(&table, 10).unwrap();
    // a is null then absent, b is empty once
    assert_eq!(p.null_count, 3);
    assert_eq!(p.column("a").unwrap().inferred_type, InferredType::Empty);
}

#[test]
fn empty_table_profile() {
    let table = parse("e.json", "[]").unwrap();
    let p = profile(&table, 100).unwrap();
    assert_eq!(p.total_rows, 0);
    assert!(p.column_profiles.is_empty());
    assert_eq!(p.completeness_percent(), None);
}

#[test]
fn explore_bundles_preview_and_file_info() {
    let mut csv = String::from("c1,c2,c3,c4,c5,c6,c7,c8\n");
    for i in 0..12 {
        csv.push_str(&format!("{i},b,c,d,e,f,g,h\n"));
    }
    let raw = RawFile::from_text("wide.csv", csv.clone());
    let ex = explore(&raw, &ExplorerConfig::default()).unwrap();

    assert_eq!(ex.file.size, csv.len() as u64);
    assert_eq!(ex.file.checksum, crc32fast::hash(csv.as_bytes()));
    assert_eq!(ex.preview.columns.len(), 6);
    assert_eq!(ex.preview.hidden_columns, 2);
    assert_eq!(ex.preview.rows.len(), 10);
    assert_eq!(ex.preview.hidden_rows, 2);
    assert_eq!(ex.preview.rows[3][0].as_deref(), Some("3"));

    let bad = ExplorerConfig {
        profiler: ProfilerConfig {
            sample_size: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(explore(&raw, &bad).is_err());
}
