//! Integration tests for the CSV cohort reader.

use std::io::Write;

use triage_stack::io::{read_cohort_csv, read_cohort_csv_with_config, CohortReaderConfig};

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn reads_features_outcome_and_triage() {
    let file = write_csv(
        "age,hr,sbp,tc,s30d\n\
         34,88,120,1,0\n\
         71,110,90,3,1\n\
         55,95,135,2,0\n",
    );

    let cohort = read_cohort_csv(file.path()).unwrap();
    assert_eq!(cohort.len(), 3);
    assert_eq!(cohort.x.dim(), (3, 3));
    assert_eq!(cohort.y, vec![0, 1, 0]);
    assert_eq!(cohort.triage, Some(vec![1, 3, 2]));
    assert_eq!(cohort.feature_names, vec!["age", "hr", "sbp"]);
    assert_eq!(cohort.x[(1, 1)], 110.0);
}

#[test]
fn custom_columns_and_no_triage() {
    let file = write_csv(
        "id,hr,dead\n\
         1,88,0\n\
         2,110,1\n",
    );

    let config = CohortReaderConfig {
        outcome_column: "dead".to_string(),
        triage_column: None,
        ignore_columns: vec!["id".to_string()],
    };
    let cohort = read_cohort_csv_with_config(file.path(), &config).unwrap();
    assert_eq!(cohort.x.dim(), (2, 1));
    assert_eq!(cohort.triage, None);
    assert_eq!(cohort.feature_names, vec!["hr"]);
}

#[test]
fn missing_outcome_column_fails() {
    let file = write_csv("hr,tc\n88,1\n");
    let err = read_cohort_csv(file.path()).unwrap_err();
    assert!(err.to_string().contains("outcome column"));
}

#[test]
fn non_binary_outcome_fails() {
    let file = write_csv("hr,tc,s30d\n88,1,2\n");
    assert!(read_cohort_csv(file.path()).is_err());
}

#[test]
fn out_of_range_triage_fails() {
    let file = write_csv("hr,tc,s30d\n88,7,1\n");
    assert!(read_cohort_csv(file.path()).is_err());
}

#[test]
fn malformed_feature_value_fails() {
    let file = write_csv("hr,tc,s30d\nfast,1,0\n");
    let err = read_cohort_csv(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("hr"));
}
