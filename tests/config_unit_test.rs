//! Unit tests for the YAML fill configuration.

use sql_seeder::config::{Provider, SeederConfig};
use sql_seeder::filler::{FillOptions, FillTargets};
use sql_seeder::schema::Schema;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
default:
  rows: 20
  examples_per_table: 3
  max_consecutive_failures: 10
oracle:
  provider: fake
  seed: 7
  timeout_secs: 30
tables:
  Department:
    rows: 5
  employee: {}
"#;

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seed.yaml");
    fs::write(&path, CONFIG).unwrap();

    let config = SeederConfig::load(&path).unwrap();
    assert_eq!(config.default.rows, Some(20));
    assert_eq!(config.oracle.provider, Some(Provider::Fake));
    assert_eq!(config.oracle.seed, Some(7));
    assert_eq!(config.oracle.timeout_secs, Some(30));
    assert!(config.oracle.model.is_none());
    assert_eq!(
        config.fill_options(),
        FillOptions {
            example_limit: 3,
            max_consecutive_failures: Some(10),
        }
    );
}

#[test]
fn test_per_table_targets() {
    let config = SeederConfig::from_yaml(CONFIG).unwrap();
    let schema = Schema::parse(
        "CREATE TABLE department (id INT); CREATE TABLE employee (id INT); CREATE TABLE audit (id INT);",
    )
    .unwrap();

    let targets = config.targets(5);
    assert!(matches!(targets, FillTargets::PerTable(_)));
    assert_eq!(targets.target_for(schema.get_table("department").unwrap()), Some(5));
    // Listed without rows: falls back to the default section
    assert_eq!(targets.target_for(schema.get_table("employee").unwrap()), Some(20));
    assert_eq!(targets.target_for(schema.get_table("audit").unwrap()), None);

    assert_eq!(config.get_table_config("DEPARTMENT").unwrap().rows, Some(5));
    assert!(config.get_table_config("audit").is_none());
}

#[test]
fn test_without_tables_is_uniform() {
    let config = SeederConfig::from_yaml("default:\n  rows: 8\n").unwrap();
    assert_eq!(config.targets(5), FillTargets::Uniform(8));

    let config = SeederConfig::from_yaml("oracle:\n  provider: openai\n").unwrap();
    assert_eq!(config.targets(5), FillTargets::Uniform(5));
    assert_eq!(config.oracle.provider, Some(Provider::OpenAi));
}

#[test]
fn test_invalid_files() {
    assert!(SeederConfig::from_yaml("oracle:\n  provider: gemini\n").is_err());
    assert!(SeederConfig::from_yaml("default: [1, 2]").is_err());

    let temp_dir = TempDir::new().unwrap();
    let err = SeederConfig::load(&temp_dir.path().join("missing.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
