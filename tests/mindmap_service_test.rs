//! Tests for MindMapService

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use casemap::application::services::{MindMapService, RenderOptions};
use casemap::application::ApplicationError;
use casemap::config::OutputFormat;
use casemap::domain::{DomainError, Limits, UserInfo, ZhCnFormat};
use casemap::infrastructure::traits::RealFileSystem;
use casemap::util::testing;

fn service() -> MindMapService {
    testing::init_test_setup();
    MindMapService::new(
        Arc::new(RealFileSystem),
        Arc::new(ZhCnFormat::default()),
        Limits::default(),
    )
}

fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write input");
    path
}

const SAMPLE: &str = r#"{
    "users": [{"user_id": "U1", "name": "A"}],
    "devices": [{"device_id": "D1", "client_type": "iOS"}]
}"#;

#[test]
fn given_bag_file_when_converting_to_json_then_emits_widget_tree() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let input = write_input(&temp, "bag.json", SAMPLE);
    let options = RenderOptions {
        format: OutputFormat::Json,
        respect_collapse: false,
    };

    // Act
    let conversion = service().convert(&input, None, options).unwrap();

    // Assert
    let value: serde_json::Value = serde_json::from_str(&conversion.rendered).unwrap();
    assert_eq!(value["data"]["text"], "A (U1) 调证数据");
    assert_eq!(value["children"].as_array().unwrap().len(), 6);
    assert!(!conversion.rendered.contains('\n'));
}

#[test]
fn given_identity_override_when_converting_then_root_uses_it() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let input = write_input(
        &temp,
        "bag.json",
        r#"{"status": "success", "data": {"users": []}, "userInfo": {"user_id": "U5", "name": "Doc"}}"#,
    );
    let identity = UserInfo::new(None, Some("Override"));

    // Act
    let conversion = service()
        .convert(&input, Some(&identity), RenderOptions::default())
        .unwrap();

    // Assert
    assert_eq!(conversion.root.label(), "Override (U5) 调证数据");
}

#[test]
fn given_tree_format_when_rendering_then_draws_text_tree() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let input = write_input(&temp, "bag.json", SAMPLE);
    let svc = service();
    let document = svc.load(&input).unwrap();
    let root = svc.build(&document, None);

    // Act
    let full = svc
        .render(
            &root,
            RenderOptions {
                format: OutputFormat::Tree,
                respect_collapse: false,
            },
        )
        .unwrap();
    let collapsed = svc
        .render(
            &root,
            RenderOptions {
                format: OutputFormat::Tree,
                respect_collapse: true,
            },
        )
        .unwrap();

    // Assert
    assert!(full.starts_with("A (U1) 调证数据"));
    assert!(full.contains("设备ID: D1"));
    assert!(!collapsed.contains("设备ID: D1"));
    assert!(collapsed.contains("D1 [+2]"));
}

#[test]
fn given_missing_file_when_loading_then_input_not_found() {
    // Arrange
    let temp = TempDir::new().unwrap();

    // Act
    let result = service().load(&temp.path().join("absent.json"));

    // Assert
    assert!(matches!(result, Err(ApplicationError::InputNotFound(_))));
}

#[test]
fn given_upstream_error_document_when_converting_then_domain_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let input = write_input(&temp, "err.json", r#"{"status": "error", "message": "denied"}"#);

    // Act
    let result = service().convert(&input, None, RenderOptions::default());

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::Upstream { .. }))
    ));
}

#[test]
fn given_non_object_document_when_converting_then_placeholder_root() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let input = write_input(&temp, "list.json", "[]");

    // Act
    let conversion = service()
        .convert(&input, None, RenderOptions::default())
        .unwrap();

    // Assert
    assert_eq!(conversion.root.label(), "暂无数据");
    assert!(conversion.root.children().is_empty());
}

#[test]
fn given_nested_output_path_when_writing_then_creates_parents() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("a/b/out.json");

    // Act
    service().write(&output, "{}").unwrap();

    // Assert
    assert_eq!(std::fs::read_to_string(output).unwrap(), "{}");
}
