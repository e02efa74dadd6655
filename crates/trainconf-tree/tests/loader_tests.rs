//! Tests for document loading and `_base_` inheritance

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trainconf_tree::{ConfigMap, ConfigValue, DocumentFormat, DocumentLoader, Error, load};

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn parse(content: &str) -> ConfigMap {
    DocumentFormat::Yaml
        .parse(content, Path::new("inline.yaml"))
        .unwrap()
}

#[test]
fn test_document_without_base_loads_verbatim() {
    let temp = TempDir::new().unwrap();
    let content = "\
batch_size: 4
model:
  type: Foo
  _inherited_: false
  layers: [1, 2, 3]
";
    let path = write(temp.path(), "train.yml", content);

    assert_eq!(load(&path).unwrap(), parse(content));
}

#[test]
fn test_child_overrides_only_named_keys() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "base.yaml",
        "batch_size: 8\nmodel:\n  type: Foo\n  depth: 50\n",
    );
    let child = write(
        temp.path(),
        "child.yaml",
        "_base_: base.yaml\nmodel:\n  depth: 101\niters: 1000\n",
    );

    let tree = load(&child).unwrap();

    assert_eq!(
        tree,
        parse("batch_size: 8\niters: 1000\nmodel:\n  type: Foo\n  depth: 101\n")
    );
    assert!(!tree.contains_key("_base_"));
}

#[test]
fn test_base_is_resolved_relative_to_referencing_document() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "_base_/datasets/kitti.yaml",
        "train_dataset:\n  type: KittiDataset\n  mode: train\n",
    );
    write(
        temp.path(),
        "_base_/models/smoke.yaml",
        "_base_: ../datasets/kitti.yaml\nmodel:\n  type: SMOKE\n",
    );
    let top = write(
        temp.path(),
        "smoke/smoke_dla34.yaml",
        "_base_: ../_base_/models/smoke.yaml\nbatch_size: 8\n",
    );

    let tree = load(&top).unwrap();

    assert_eq!(
        tree,
        parse(
            "batch_size: 8\nmodel: {type: SMOKE}\ntrain_dataset: {type: KittiDataset, mode: train}\n"
        )
    );
}

#[test]
fn test_three_level_chain_applies_nearest_override_last() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.yaml", "lr: 1\nkeep: a\n");
    write(temp.path(), "b.yaml", "_base_: a.yaml\nlr: 2\n");
    let c = write(temp.path(), "c.yaml", "_base_: b.yaml\nlr: 3\n");

    let tree = load(&c).unwrap();
    assert_eq!(tree["lr"], ConfigValue::Integer(3));
    assert_eq!(tree["keep"], ConfigValue::from("a"));
}

#[test]
fn test_inherited_false_drops_base_subtree() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "base.yaml",
        "val_dataset:\n  type: KittiDataset\n  transforms:\n    - type: LoadImage\n    - type: Normalize\n",
    );
    let child = write(
        temp.path(),
        "child.yaml",
        "_base_: base.yaml\nval_dataset:\n  _inherited_: false\n  type: NuscenesDataset\n",
    );

    let tree = load(&child).unwrap();
    assert_eq!(tree["val_dataset"], ConfigValue::Mapping(parse("type: NuscenesDataset\n")));
}

#[test]
fn test_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = load(temp.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_missing_base_propagates_not_found() {
    let temp = TempDir::new().unwrap();
    let child = write(temp.path(), "child.yaml", "_base_: nowhere/base.yaml\n");

    let err = DocumentLoader::new().load(&child).unwrap_err();
    match err {
        Error::NotFound { path } => assert!(path.ends_with("nowhere/base.yaml")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_unsupported_extension_is_format_error() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "train.ini", "batch_size = 4\n");

    let err = load(&path).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { ref extension, .. } if extension == "ini"));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "broken.yaml", "model: [unclosed\n");

    let err = load(&path).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_two_document_cycle_is_detected() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.yaml", "_base_: b.yaml\n");
    let b = write(temp.path(), "b.yaml", "_base_: a.yaml\n");

    let err = load(&b).unwrap_err();
    assert!(matches!(err, Error::InheritanceCycle { .. }));
}

#[test]
fn test_toml_child_can_inherit_from_yaml_base() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "base.yaml", "optimizer:\n  type: SGD\n  momentum: 0.9\n");
    let child = write(
        temp.path(),
        "child.toml",
        "_base_ = \"base.yaml\"\n[optimizer]\nweight_decay = 0.0001\n",
    );

    let tree = load(&child).unwrap();
    assert_eq!(
        tree["optimizer"],
        ConfigValue::Mapping(parse("type: SGD\nmomentum: 0.9\nweight_decay: 0.0001\n"))
    );
}
