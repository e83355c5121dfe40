//! Tests for record ingestion and input documents

use rstest::rstest;
use serde_json::json;

use casemap::domain::{
    DomainError, ExtraData, FieldValue, InputDocument, RecordBag, SourceFileEntry,
};

#[test]
fn given_bare_bag_when_parsing_then_reads_all_lists() {
    // Arrange
    let content = r#"{
        "users": [{"user_id": "U1", "name": "A", "unexpected": true}],
        "transactions": [{"base_asset": "BTC"}, {"base_asset": "ETH"}],
        "asset_movements": [],
        "login_logs": [{"login_ip": "1.1.1.1"}],
        "devices": [{"device_id": "D1"}],
        "source_files": ["a.xlsx"]
    }"#;

    // Act
    let doc = InputDocument::parse(content).unwrap();

    // Assert
    let bag = doc.bag.expect("bag");
    assert_eq!(bag.users.len(), 1);
    assert_eq!(bag.users[0].name, Some(FieldValue::from("A")));
    assert_eq!(bag.transactions.len(), 2);
    assert!(bag.asset_movements.is_empty());
    assert_eq!(bag.login_logs.len(), 1);
    assert_eq!(bag.devices.len(), 1);
    assert_eq!(bag.total_records(), 6);
}

#[rstest]
#[case(json!({"users": null}))]
#[case(json!({"users": "nope"}))]
#[case(json!({"users": {"user_id": "U1"}}))]
#[case(json!({}))]
fn given_missing_or_malformed_list_when_ingesting_then_treated_as_empty(
    #[case] value: serde_json::Value,
) {
    // Act
    let bag = RecordBag::from_value(&value).unwrap();

    // Assert
    assert!(bag.users.is_empty());
}

#[test]
fn given_non_object_rows_when_ingesting_then_rows_have_no_fields() {
    // Arrange
    let value = json!({"devices": [42, null, "x", {"device_id": "D1"}]});

    // Act
    let bag = RecordBag::from_value(&value).unwrap();

    // Assert
    assert_eq!(bag.devices.len(), 4);
    assert!(bag.devices[0].device_id.is_none());
    assert!(bag.devices[2].extra_data.is_none());
    assert_eq!(bag.devices[3].device_id, Some(FieldValue::from("D1")));
}

#[test]
fn given_mistyped_field_when_ingesting_then_keeps_value_for_display() {
    // Arrange
    let value = json!({"transactions": [{"total_amount": "12.5", "user_id": 7}]});

    // Act
    let bag = RecordBag::from_value(&value).unwrap();

    // Assert
    let tx = &bag.transactions[0];
    assert_eq!(tx.total_amount.as_ref().and_then(FieldValue::as_f64), Some(12.5));
    assert_eq!(tx.user_id.as_ref().map(|v| v.to_string()), Some("7".to_string()));
}

#[rstest]
#[case(json!("{\"os\": \"iOS\"}"), Some(ExtraData::Fields(vec![("os".to_string(), FieldValue::from("iOS"))])))]
#[case(json!({"os": "iOS"}), Some(ExtraData::Fields(vec![("os".to_string(), FieldValue::from("iOS"))])))]
#[case(json!("not json"), Some(ExtraData::Raw("not json".to_string())))]
#[case(json!("[1,2]"), Some(ExtraData::Raw("[1,2]".to_string())))]
#[case(json!("123"), Some(ExtraData::Raw("123".to_string())))]
#[case(json!(""), None)]
#[case(json!(null), None)]
#[case(json!(0), None)]
#[case(json!(5), Some(ExtraData::Raw("5".to_string())))]
fn given_extra_data_variants_when_decoding_then_classifies(
    #[case] raw: serde_json::Value,
    #[case] expected: Option<ExtraData>,
) {
    // Arrange
    let value = json!({"devices": [{"extra_data": raw}]});

    // Act
    let bag = RecordBag::from_value(&value).unwrap();

    // Assert
    assert_eq!(bag.devices[0].extra_data, expected);
}

#[test]
fn given_source_file_shapes_when_ingesting_then_detects_variant() {
    // Arrange
    let value = json!({"source_files": [{"file_name": "a.xlsx"}, "b.xlsx", null, 3]});

    // Act
    let bag = RecordBag::from_value(&value).unwrap();

    // Assert
    assert!(matches!(bag.source_files[0], SourceFileEntry::Detailed(_)));
    assert_eq!(
        bag.source_files[1],
        SourceFileEntry::Legacy(Some(FieldValue::from("b.xlsx")))
    );
    assert_eq!(bag.source_files[2], SourceFileEntry::Legacy(None));
    assert!(matches!(bag.source_files[3], SourceFileEntry::Legacy(Some(_))));
}

#[test]
fn given_envelope_with_user_info_when_parsing_then_reads_identity() {
    // Arrange
    let content = r#"{
        "status": "success",
        "data": {"users": []},
        "userInfo": {"user_id": "U9", "name": "B"}
    }"#;

    // Act
    let doc = InputDocument::parse(content).unwrap();

    // Assert
    assert!(doc.bag.is_some());
    let info = doc.user_info.expect("user info");
    assert_eq!(info.user_id, Some(FieldValue::from("U9")));
    assert_eq!(info.name, Some(FieldValue::from("B")));
}

#[test]
fn given_error_envelope_when_parsing_then_returns_upstream_message() {
    // Act
    let result = InputDocument::parse(r#"{"status": "error", "message": "user not found"}"#);

    // Assert
    match result {
        Err(DomainError::Upstream { message }) => assert_eq!(message, "user not found"),
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[rstest]
#[case("[1, 2, 3]")]
#[case("null")]
#[case("\"text\"")]
#[case(r#"{"status": "success", "data": [1]}"#)]
fn given_non_bag_json_when_parsing_then_no_bag(#[case] content: &str) {
    // Act
    let doc = InputDocument::parse(content).unwrap();

    // Assert
    assert!(doc.bag.is_none());
}

#[test]
fn given_invalid_json_when_parsing_then_invalid_json_error() {
    // Act
    let result = InputDocument::parse("{not json");

    // Assert
    assert!(matches!(result, Err(DomainError::InvalidJson(_))));
}
