//! Config loading feeding the run context

use leveler::cli::RunContext;
use leveler::config::ConfigLoader;
use leveler::provider::ProviderType;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_workspace_config_sets_store_path_and_provider() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        r#"
[leveling]
target_total = 90
batch_size = 3

[provider]
provider_type = "callable"
endpoint = "https://functions.example.test/generateQuestions"
timeout_secs = 60

[storage]
store_path = "data/questions"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.leveling.target_total, 90);
    assert_eq!(config.leveling.batch_size, 3);
    assert_eq!(config.provider.provider_type, ProviderType::Callable);
    assert_eq!(config.provider.timeout_secs, 60);

    let ctx = RunContext::new(temp_dir.path().to_path_buf(), None).unwrap();
    assert_eq!(ctx.config().leveling.target_total, 90);
    assert!(temp_dir.path().join("data/questions").exists());
}

#[test]
fn test_invalid_config_is_rejected_by_run_context() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "[leveling]\nbatch_size = 0\n").unwrap();

    let result = RunContext::new(temp_dir.path().to_path_buf(), Some(path));
    assert!(result.is_err());
}
