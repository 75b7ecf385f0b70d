//! Translation table and identity CSV behavior against real files on disk.

use pinna::config::IdsConfig;
use pinna::export_processing::detection_key;
use pinna::translation::{run_identity_export, TranslationTable};
use std::fs;
use std::path::Path;

const TABLE: &str = "\
Detection filename,Recognition filename,Class ID
test/0501.png,bank/10/01.png,10
test/0502.png,bank/10/02.png,10
test/0503.png,bank/11/01.png,11
train/0001.png,bank/12/01.png,12
";

#[test]
fn lookup_matches_directory_qualified_keys() {
    let temp_dir = tempfile::tempdir().unwrap();
    let table_path = temp_dir.path().join("awe-translation.csv");
    fs::write(&table_path, TABLE).unwrap();

    let table = TranslationTable::load(&table_path).unwrap();
    assert_eq!(table.len(), 4);

    // Keys are derived from the image path the way the export driver does it
    let key = detection_key(Path::new("data/ears/test/0502.png"));
    let row = table.recognition_for(&key).unwrap();
    assert_eq!(row.recognition_filename, "bank/10/02.png");
    assert_eq!(row.class_id, 10);

    // An image that is not in the table must fail the run
    let missing = detection_key(Path::new("data/ears/test/0999.png"));
    assert!(table.recognition_for(&missing).is_err());
}

#[test]
fn identity_export_writes_one_row_per_table_row() {
    let temp_dir = tempfile::tempdir().unwrap();
    let table_path = temp_dir.path().join("awe-translation.csv");
    fs::write(&table_path, TABLE).unwrap();

    let config = IdsConfig {
        translation: table_path,
        output: temp_dir.path().join("ids.csv"),
    };

    let written = run_identity_export(&config).unwrap();
    assert_eq!(written, 4);

    let contents = fs::read_to_string(&config.output).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);

    // Order preserving, separators flattened, segmented/ prefix applied
    assert_eq!(lines[0], "segmented/bank_10_01.png,10");
    assert_eq!(lines[1], "segmented/bank_10_02.png,10");
    assert_eq!(lines[2], "segmented/bank_11_01.png,11");
    assert_eq!(lines[3], "segmented/bank_12_01.png,12");
}

#[test]
fn identity_export_missing_table_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = IdsConfig {
        translation: temp_dir.path().join("does-not-exist.csv"),
        output: temp_dir.path().join("ids.csv"),
    };

    assert!(run_identity_export(&config).is_err());
}
