mod common;

use common::{BASE_CSV, FOLLOWUP_CSV, TestWorkspace, dataset};
use encoding_rs::UTF_8;
use record_merge::{
    dataset::Dataset,
    dataset_merge::{merge_datasets, validate_datasets},
    diagnostics::MergeDiagnostics,
    error::{DatasetRole, DeficientSide, MergerError},
    policy::{FieldPolicy, MandatoryKind, PolicyRegistry},
    strategy::MergeStrategyKind,
};

fn merge(base: &Dataset, followup: &Dataset) -> Result<Dataset, MergerError> {
    let mut diagnostics = MergeDiagnostics::new("test");
    merge_datasets(base, followup, &PolicyRegistry::builtin(), &mut diagnostics)
}

fn load_pair(workspace: &TestWorkspace) -> (Dataset, Dataset) {
    let base_path = workspace.write("base.csv", BASE_CSV);
    let followup_path = workspace.write("followup.csv", FOLLOWUP_CSV);
    let base = Dataset::load(&base_path, b',', UTF_8).expect("load base");
    let followup = Dataset::load(&followup_path, b',', UTF_8).expect("load followup");
    (base, followup)
}

#[test]
fn happy_path_merges_matched_rows_and_passes_through_the_rest() {
    let workspace = TestWorkspace::new();
    let (base, followup) = load_pair(&workspace);
    let mut diagnostics = MergeDiagnostics::new("happy");
    let merged = merge_datasets(
        &base,
        &followup,
        &PolicyRegistry::builtin(),
        &mut diagnostics,
    )
    .expect("merge succeeds");

    assert_eq!(merged.row_count(), 3);
    assert_eq!(merged.headers(), base.headers());

    let first = merged.record(0).unwrap();
    assert_eq!(first.value("registration_number"), "2024/000001");
    assert_eq!(first.value("title"), "Flood defences");
    assert_eq!(first.value("status"), "Rejected");
    assert_eq!(
        first.value("response_text"),
        "**Original Response:** Initial reply\n\n**Current Followup:** Further reply"
    );
    assert_eq!(first.value("is_closed"), "True");
    assert_eq!(first.value("last_updated"), "2025-08-01");
    assert_eq!(first.value("tags"), r#"["water","budget"]"#);

    let second = merged.record(1).unwrap();
    assert_eq!(second.value("status"), "In progress");
    assert_eq!(second.value("response_text"), "First reply");
    assert_eq!(second.value("is_closed"), "False");
    assert_eq!(second.value("last_updated"), "2024-03-01");
    assert_eq!(second.value("tags"), "");

    let third = merged.record(2).unwrap();
    assert_eq!(third.values(), base.record(2).unwrap().values());

    assert_eq!(diagnostics.matched_rows(), 2);
    assert_eq!(diagnostics.base_only_rows(), 1);
    assert_eq!(diagnostics.changes_for("status"), 2);
    assert_eq!(diagnostics.changes_for("title"), 0);
}

#[test]
fn merged_rows_follow_base_order_not_followup_order() {
    let base = dataset(
        &["registration_number", "status"],
        &[
            &["2024/000003", "Pending"],
            &["2024/000001", "Pending"],
            &["2024/000002", "Pending"],
        ],
    );
    let followup = dataset(
        &["registration_number", "status"],
        &[&["2024/000002", "Closed"], &["2024/000003", "Open"]],
    );
    let merged = merge(&base, &followup).expect("merge succeeds");
    assert_eq!(
        merged.column_values("registration_number").unwrap(),
        vec!["2024/000003", "2024/000001", "2024/000002"]
    );
    assert_eq!(
        merged.column_values("status").unwrap(),
        vec!["Open", "Pending", "Closed"]
    );
}

#[test]
fn excess_followup_rows_are_rejected_with_both_counts() {
    let base = dataset(&["registration_number"], &[&["2024/000001"]]);
    let followup = dataset(
        &["registration_number"],
        &[&["2024/000001"], &["2024/000002"], &["2024/000003"]],
    );
    let err = merge(&base, &followup).unwrap_err();
    assert!(matches!(
        err,
        MergerError::FollowupRowCountExceedsBase {
            followup: 3,
            base: 1
        }
    ));
    let message = err.to_string();
    assert!(message.contains("3 rows"));
    assert!(message.contains("1 rows"));
}

#[test]
fn unknown_followup_keys_are_listed_sorted() {
    let base = dataset(
        &["registration_number"],
        &[&["2024/000001"], &["2024/000002"], &["2024/000003"]],
    );
    let followup = dataset(
        &["registration_number"],
        &[&["2025/000009"], &["2024/000001"], &["2025/000008"]],
    );
    let err = merge(&base, &followup).unwrap_err();
    assert_eq!(
        err,
        MergerError::RegistrationNumberMismatch {
            keys: vec!["2025/000008".to_string(), "2025/000009".to_string()],
        }
    );
    assert!(err.to_string().contains("2025/000008, 2025/000009"));
}

#[test]
fn empty_datasets_are_rejected_base_first() {
    let empty = dataset(&["registration_number"], &[]);
    let one = dataset(&["registration_number"], &[&["2024/000001"]]);

    assert_eq!(
        merge(&empty, &empty).unwrap_err(),
        MergerError::EmptyData {
            dataset: DatasetRole::Base
        }
    );
    assert_eq!(
        merge(&one, &empty).unwrap_err(),
        MergerError::EmptyData {
            dataset: DatasetRole::Followup
        }
    );
}

#[test]
fn followup_only_columns_are_rejected_sorted() {
    let base = dataset(&["registration_number", "status"], &[&["2024/000001", "A"]]);
    let followup = dataset(
        &["registration_number", "zeta", "status", "alpha"],
        &[&["2024/000001", "z", "B", "a"]],
    );
    let err = validate_datasets(&base, &followup).unwrap_err();
    assert_eq!(
        err,
        MergerError::MissingColumns {
            columns: vec!["alpha".to_string(), "zeta".to_string()],
        }
    );
}

#[test]
fn key_column_format_and_uniqueness_are_enforced() {
    let no_key = dataset(&["status"], &[&["A"]]);
    let good = dataset(&["registration_number"], &[&["2024/000001"], &["2024/000002"]]);
    assert_eq!(merge(&no_key, &good).unwrap_err().code(), "followup-row-count-exceeds-base");
    assert!(matches!(
        merge(&good, &no_key).unwrap_err(),
        MergerError::MissingKeyColumn {
            dataset: DatasetRole::Followup,
            ..
        }
    ));

    let malformed = dataset(&["registration_number"], &[&["24-1"], &["2024/000002"]]);
    assert_eq!(
        merge(&malformed, &good).unwrap_err(),
        MergerError::InvalidRegistrationNumber {
            dataset: DatasetRole::Base,
            key: "24-1".to_string(),
        }
    );

    let duplicated = dataset(&["registration_number"], &[&["2024/000002"], &["2024/000002"]]);
    assert_eq!(
        merge(&good, &duplicated).unwrap_err(),
        MergerError::DuplicateRegistrationNumber {
            dataset: DatasetRole::Followup,
            key: "2024/000002".to_string(),
        }
    );
}

#[test]
fn immutable_conflict_aborts_the_whole_merge() {
    let base = dataset(
        &["registration_number", "responsible_body"],
        &[&["2024/000001", "Treasury"], &["2024/000002", "Health"]],
    );
    let followup = dataset(
        &["registration_number", "responsible_body"],
        &[&["2024/000002", "Defence"]],
    );
    let mut registry = PolicyRegistry::builtin();
    registry.set(
        "responsible_body",
        FieldPolicy::optional(MergeStrategyKind::KeepBaseOnly),
    );
    let mut diagnostics = MergeDiagnostics::new("conflict");
    let err = merge_datasets(&base, &followup, &registry, &mut diagnostics).unwrap_err();
    assert_eq!(err.code(), "immutable-field-conflict");
    let message = err.to_string();
    assert!(message.contains("2024/000002"));
    assert!(message.contains("Health"));
    assert!(message.contains("Defence"));
}

#[test]
fn base_only_fields_reject_followup_values() {
    let base = dataset(
        &["registration_number", "title"],
        &[&["2024/000001", "Flood defences"]],
    );
    let followup = dataset(
        &["registration_number", "title"],
        &[&["2024/000001", "Flood defences"]],
    );
    let err = merge(&base, &followup).unwrap_err();
    assert_eq!(
        err,
        MergerError::MandatoryFieldMissing {
            field: "title".to_string(),
            key: "2024/000001".to_string(),
            side: DeficientSide::Followup,
        }
    );
}

#[test]
fn unmatched_rows_still_owe_required_both_fields() {
    let base = dataset(
        &["registration_number", "status"],
        &[&["2024/000001", "Open"], &["2024/000002", "Open"]],
    );
    let followup = dataset(
        &["registration_number", "status"],
        &[&["2024/000001", "Closed"]],
    );
    let mut registry = PolicyRegistry::builtin();
    registry.set(
        "status",
        FieldPolicy::new(
            MergeStrategyKind::ValidatedStatusTransition,
            MandatoryKind::RequiredBoth,
        ),
    );
    let mut diagnostics = MergeDiagnostics::new("required");
    let err = merge_datasets(&base, &followup, &registry, &mut diagnostics).unwrap_err();
    assert_eq!(
        err,
        MergerError::MandatoryFieldMissing {
            field: "status".to_string(),
            key: "2024/000002".to_string(),
            side: DeficientSide::Followup,
        }
    );
    assert!(err.to_string().contains("followup"));
}

#[test]
fn unknown_columns_keep_their_base_values() {
    let base = dataset(
        &["registration_number", "internal_ref"],
        &[&["2024/000001", "REF-1"], &["2024/000002", ""]],
    );
    let followup = dataset(
        &["registration_number", "internal_ref"],
        &[&["2024/000002", "REF-2"]],
    );
    let merged = merge(&base, &followup).expect("merge succeeds");
    assert_eq!(merged.column_values("internal_ref").unwrap(), vec!["REF-1", ""]);
}

#[test]
fn unmatched_rows_keep_json_cells_byte_for_byte() {
    let base = dataset(
        &["registration_number", "officials", "tags", "last_updated"],
        &[
            &["2024/000001", r#"{"lead": ["Ann"], "deputy": "Bo"}"#, r#"["b", "a"]"#, "null"],
            &["2024/000002", r#"{"lead": ["Cy"]}"#, "", "2024-01-01"],
        ],
    );
    let followup = dataset(
        &["registration_number", "tags", "last_updated"],
        &[&["2024/000002", r#"["c"]"#, "None"]],
    );
    let mut diagnostics = MergeDiagnostics::new("passthrough");
    let merged = merge_datasets(
        &base,
        &followup,
        &PolicyRegistry::builtin(),
        &mut diagnostics,
    )
    .expect("merge succeeds");

    assert_eq!(merged.record(0).unwrap().values(), base.record(0).unwrap().values());
    let second = merged.record(1).unwrap();
    assert_eq!(second.value("officials"), r#"{"lead": ["Cy"]}"#);
    assert_eq!(second.value("tags"), r#"["c"]"#);
    assert_eq!(second.value("last_updated"), "2024-01-01");

    assert_eq!(diagnostics.changes_for("officials"), 0);
    assert_eq!(diagnostics.changes_for("last_updated"), 0);
    assert_eq!(diagnostics.changes_for("tags"), 1);
}

#[test]
fn merging_is_deterministic() {
    let workspace = TestWorkspace::new();
    let (base, followup) = load_pair(&workspace);
    let first = merge(&base, &followup).unwrap().to_csv_bytes(b',').unwrap();
    let second = merge(&base, &followup).unwrap().to_csv_bytes(b',').unwrap();
    assert_eq!(first, second);
}

#[test]
fn written_output_reloads_with_the_base_schema() {
    let workspace = TestWorkspace::new();
    let (base, followup) = load_pair(&workspace);
    let merged = merge(&base, &followup).unwrap();
    let out_path = workspace.path().join("merged.csv");
    std::fs::write(&out_path, merged.to_csv_bytes(b',').unwrap()).unwrap();

    let reloaded = Dataset::load(&out_path, b',', UTF_8).expect("reload merged");
    assert_eq!(reloaded, merged);
}

#[test]
fn short_rows_are_padded_when_loading() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "short.csv",
        "registration_number,status,notes\n2024/000001,Open\n",
    );
    let loaded = Dataset::load(&path, b',', UTF_8).expect("load short rows");
    let record = loaded.record(0).unwrap();
    assert_eq!(record.value("status"), "Open");
    assert_eq!(record.get("notes"), Some(""));
}

#[test]
fn duplicate_headers_fail_to_load() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("dup.csv", "registration_number,status,status\n2024/000001,a,b\n");
    let err = Dataset::load(&path, b',', UTF_8).unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate column 'status'"));
}
