//! Layout checks: the library is importable and the documented files exist.

use std::path::Path;

#[test]
fn test_library_is_importable() {
    assert_eq!(personal_project::greet("World"), "Hello, World!");
}

#[test]
fn test_project_layout() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    assert!(root.join("Cargo.toml").is_file());
    assert!(root.join("README.md").is_file());
    assert!(root.join("src").join("lib.rs").is_file());
    assert!(root.join("tests").is_dir());
}

#[test]
fn test_default_config_is_valid() {
    use personal_project::utils::validation::Validate;

    let config = personal_project::ProjectConfig::default();
    assert!(config.validate().is_ok());
}
