use bill_report::loader::{available_years, load_bills, load_bills_file};
use bill_report::output::{chart_payload, write_json, write_wide_csv_file};
use bill_report::schema::builtin;
use bill_report::{compare, reshape, BillError, PropertyData, Selection, SeriesKey};
use std::fs;
use std::path::Path;

const LUYUAN_CSV: &str = "\
年份,月份,電費,水費,瓦斯費
2023,1,1200,350,410
2023,2,1100,,395
2024,1,1350,360,abc
2024,2,1280,340,0
2025,13,999,999,999
";

const OSCAR_CSV: &str = "\
年份,月份,總電費,用電度數,公共電費,純住宅電費,水費,瓦斯費,備註
2023,1,\"2,600\",640,800,1800,420,
2024,1,2700,655,820,1880,430,510,換表
";

fn write_fixture(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("fixture should be written");
}

#[test]
fn loader_counts_skipped_rows_and_bad_cells() {
    let schema = builtin().get("綠園").expect("builtin");
    let (rows, report) =
        load_bills(LUYUAN_CSV.as_bytes(), "綠園帳單.csv", schema).expect("load should succeed");

    assert_eq!(report.total_rows, 5);
    assert_eq!(report.loaded_rows, 4);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(report.non_numeric_cells, 1);
    assert_eq!(available_years(&rows), vec![2023, 2024]);

    assert_eq!(rows[1].amount("水費"), None);
    assert_eq!(rows[2].amount("瓦斯費"), None);
    assert_eq!(rows[3].amount("瓦斯費"), Some(0.0));
}

#[test]
fn loader_requires_every_vocabulary_column() {
    let schema = builtin().get("奧斯卡").expect("builtin");
    let err = load_bills(LUYUAN_CSV.as_bytes(), "綠園帳單.csv", schema)
        .expect_err("綠園 file lacks 奧斯卡 columns");
    let err = err
        .downcast_ref::<BillError>()
        .expect("should be a schema error");
    assert!(matches!(err, BillError::MissingColumn { column, .. } if column == "總電費"));
}

#[test]
fn single_property_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), "綠園帳單.csv", LUYUAN_CSV);
    let schema = builtin().get("綠園").expect("builtin");

    let (rows, _) = load_bills_file(&dir.path().join(&schema.source), schema).expect("load");
    let sel = Selection::new([2023, 2024, 2025], ["瓦斯費", "水費"]);
    let out = reshape(&rows, &sel, schema, None).expect("reshape");

    // 2025 has no valid rows but still gets its columns
    assert_eq!(out.columns().len(), 6);
    assert!(out
        .columns()
        .contains(&SeriesKey::new(2025, None, "瓦斯費")));
    assert!(out.long.iter().all(|r| r.year != 2025));
    // 2023-02 water and 2024-01 gas are missing
    assert_eq!(out.long.len(), 6);

    let table_path = dir.path().join("table.csv");
    write_wide_csv_file(&table_path, &out.wide).expect("export table");
    let table = fs::read_to_string(&table_path).expect("read back");
    let header = table.lines().next().expect("header line");
    assert_eq!(
        header,
        "年份,月份,2023瓦斯費,2023水費,2024瓦斯費,2024水費,2025瓦斯費,2025水費"
    );
    // header plus four rows
    assert_eq!(table.lines().count(), 5);
}

#[test]
fn two_properties_compared() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), "綠園帳單.csv", LUYUAN_CSV);
    write_fixture(dir.path(), "奧斯卡帳單.csv", OSCAR_CSV);
    let reg = builtin();
    let (a_schema, b_schema) = (reg.get("綠園").expect("builtin"), reg.get("奧斯卡").expect("builtin"));

    let (a_rows, _) = load_bills_file(&dir.path().join(&a_schema.source), a_schema).expect("load a");
    let (b_rows, b_report) =
        load_bills_file(&dir.path().join(&b_schema.source), b_schema).expect("load b");
    assert_eq!(b_report.loaded_rows, 2);
    assert_eq!(b_rows[0].amount("總電費"), Some(2600.0));

    let sel = Selection::new([2023, 2024], ["電費"]);
    let cmp = compare(
        PropertyData { schema: a_schema, rows: &a_rows },
        PropertyData { schema: b_schema, rows: &b_rows },
        &sel,
    )
    .expect("compare");

    let labels: Vec<String> = cmp.table.header();
    assert_eq!(
        labels,
        vec![
            "年份",
            "月份",
            "2023綠園電費",
            "2024綠園電費",
            "2023奧斯卡純住宅電費",
            "2024奧斯卡純住宅電費",
        ]
    );
    let periods: Vec<(i32, u32)> = cmp.table.rows.iter().map(|r| (r.year, r.month)).collect();
    assert_eq!(periods, vec![(2023, 1), (2023, 1), (2023, 2), (2024, 1), (2024, 1), (2024, 2)]);

    let b_points: Vec<(String, f64)> = cmp
        .long
        .iter()
        .filter(|r| r.key.tag.as_deref() == Some("奧斯卡"))
        .map(|r| (r.variable(), r.value))
        .collect();
    assert_eq!(
        b_points,
        vec![
            ("2023奧斯卡純住宅電費".to_string(), 1800.0),
            ("2024奧斯卡純住宅電費".to_string(), 1880.0),
        ]
    );

    let json_path = dir.path().join("chart.json");
    write_json(&json_path, &chart_payload("民生綠園 vs 展昇奧斯卡各年度各項費用趨勢", &cmp.long))
        .expect("export chart");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).expect("read back")).expect("valid json");
    assert_eq!(json["points"].as_array().map(Vec::len), Some(cmp.long.len()));
    assert_eq!(json["points"][0]["項目"], "電費");
}

#[test]
fn repeated_queries_give_identical_output() {
    let schema = builtin().get("綠園").expect("builtin");
    let (rows, _) = load_bills(LUYUAN_CSV.as_bytes(), "綠園帳單.csv", schema).expect("load");
    let sel = Selection::new([2024, 2023], ["電費", "水費", "瓦斯費"]);
    let first = reshape(&rows, &sel, schema, Some("綠園")).expect("first");
    let second = reshape(&rows, &sel, schema, Some("綠園")).expect("second");
    assert_eq!(first, second);
}
