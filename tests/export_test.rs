//! Integration test for run export: digests → Parquet table + JSON records

use std::fs;

use runlog_digest::descriptor::RunDescriptor;
use runlog_digest::pipeline::{collect_runs, FailurePolicy};
use runlog_digest::store::{read_parquet, write_parquet, RunRecords};

#[test]
fn test_export_collection_to_parquet_and_records() {
    let dir = tempfile::tempdir().unwrap();
    let short = dir.path().join("short");
    fs::create_dir_all(&short).unwrap();
    fs::write(
        short.join("100000_100_19_20_40_0.5.txt"),
        "@best=500|gen=0\n@best=120|gen=1\n@best=90|gen=2\n",
    )
    .unwrap();
    fs::write(
        short.join("100000_100_10_20_40_0.5.txt"),
        "@best=480|gen=0\n@best=200|gen=1\n@best=95|gen=2\n",
    )
    .unwrap();

    let collection = collect_runs(&short, "txt", FailurePolicy::Abort).unwrap();

    let parquet = dir.path().join("trajectories.parquet");
    assert_eq!(write_parquet(&collection.runs, &parquet).unwrap(), 6);
    let table = read_parquet(&parquet).unwrap();
    assert_eq!(table.len(), 2);
    for ((label, trajectory), run) in table.iter().zip(&collection.runs) {
        assert_eq!(*label, run.descriptor.label());
        assert_eq!(trajectory, &run.trajectory);
    }

    let records_path = dir.path().join("records.json");
    let mut records = RunRecords::load_or_default(&records_path).unwrap();
    for run in &collection.runs {
        records.insert(&run.descriptor, run.trajectory.clone());
    }
    records.save(&records_path).unwrap();

    let reloaded = RunRecords::load_or_default(&records_path).unwrap();
    let elite_19 = RunDescriptor::decode("100000_100_19_20_40_0.5.txt").unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get(&elite_19).unwrap().values(), &[500, 120, 90]);
}
