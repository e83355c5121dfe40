//! Tests for BatchService

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use casemap::application::services::{BatchService, MindMapService, RenderOptions};
use casemap::application::ApplicationError;
use casemap::config::OutputFormat;
use casemap::domain::{Limits, ZhCnFormat};
use casemap::infrastructure::traits::RealFileSystem;

fn batch() -> BatchService {
    let mindmap = MindMapService::new(
        Arc::new(RealFileSystem),
        Arc::new(ZhCnFormat::default()),
        Limits::default(),
    );
    BatchService::new(Arc::new(mindmap))
}

fn create_file(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    std::fs::write(&path, content).expect("write file");
    path
}

#[test]
fn given_directory_when_finding_inputs_then_skips_generated_and_other_files() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_file(temp.path(), "b.json", "{}");
    create_file(temp.path(), "a.json", "{}");
    create_file(temp.path(), "a.mindmap.json", "{}");
    create_file(temp.path(), "notes.txt", "x");
    create_file(temp.path(), "nested/c.json", "{}");

    // Act
    let inputs = BatchService::find_inputs(temp.path()).unwrap();

    // Assert
    let names: Vec<_> = inputs
        .iter()
        .map(|p| p.strip_prefix(temp.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("a.json"),
            PathBuf::from("b.json"),
            PathBuf::from("nested/c.json"),
        ]
    );
}

#[test]
fn given_missing_directory_when_finding_inputs_then_input_not_found() {
    // Arrange
    let temp = TempDir::new().unwrap();

    // Act
    let result = BatchService::find_inputs(&temp.path().join("absent"));

    // Assert
    assert!(matches!(result, Err(ApplicationError::InputNotFound(_))));
}

#[test]
fn given_out_dir_when_computing_output_path_then_mirrors_layout() {
    // Arrange
    let dir = Path::new("/data/in");
    let input = Path::new("/data/in/case1/bag.json");

    // Act
    let beside = BatchService::output_path(input, dir, None, OutputFormat::Pretty);
    let mirrored =
        BatchService::output_path(input, dir, Some(Path::new("/out")), OutputFormat::Tree);

    // Assert
    assert_eq!(beside, PathBuf::from("/data/in/case1/bag.mindmap.json"));
    assert_eq!(mirrored, PathBuf::from("/out/case1/bag.mindmap.txt"));
}

#[test]
fn given_mixed_inputs_when_converting_dir_then_reports_each_outcome() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_file(temp.path(), "good.json", r#"{"users": [{"user_id": "U1"}]}"#);
    create_file(temp.path(), "broken.json", "{not json");

    // Act
    let outcomes = batch()
        .convert_dir(temp.path(), Some(out.path()), RenderOptions::default())
        .unwrap();

    // Assert
    assert_eq!(outcomes.len(), 2);
    let broken = outcomes.iter().find(|o| o.input.ends_with("broken.json")).unwrap();
    assert!(!broken.is_ok());
    let good = outcomes.iter().find(|o| o.input.ends_with("good.json")).unwrap();
    assert!(good.is_ok());
    assert_eq!(good.output, out.path().join("good.mindmap.json"));

    let written = std::fs::read_to_string(&good.output).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["data"]["text"], "用户 U1 调证数据");
    assert!(!out.path().join("broken.mindmap.json").exists());
}

#[test]
fn given_converted_dir_when_converting_again_then_ignores_previous_outputs() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_file(temp.path(), "bag.json", "{}");
    let service = batch();
    service
        .convert_dir(temp.path(), None, RenderOptions::default())
        .unwrap();

    // Act
    let outcomes = service
        .convert_dir(temp.path(), None, RenderOptions::default())
        .unwrap();

    // Assert
    assert_eq!(outcomes.len(), 1);
    assert!(temp.path().join("bag.mindmap.json").exists());
}
