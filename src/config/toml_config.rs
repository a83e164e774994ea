use crate::utils::error::{ProjectError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const DEFAULT_CONFIG_FILE: &str = "personal-project.toml";

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub paths: PathsConfig,
    pub eda: EdaConfig,
    pub model: ModelConfig,
    pub kaggle: KaggleConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub project_root: String,
    pub data_dir: String,
    pub dataset_file: String,
    pub sample_file: String,
    pub reports_dir: String,
    pub models_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_root: ".".to_string(),
            data_dir: "data".to_string(),
            dataset_file: "Cars Datasets 2025.csv".to_string(),
            sample_file: "sample_data.csv".to_string(),
            reports_dir: "reports".to_string(),
            models_dir: "models".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdaConfig {
    pub histogram_bins: usize,
    pub top_companies: usize,
    pub compress: bool,
}

impl Default for EdaConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 50,
            top_companies: 10,
            compress: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_estimators: usize,
    pub random_state: u64,
    pub test_size: f64,
    pub cv_folds: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Worker threads for tree fitting; 0 uses every available core.
    pub n_jobs: usize,
    pub model_file: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            random_state: 42,
            test_size: 0.2,
            cv_folds: 3,
            max_depth: None,
            min_samples_split: 2,
            n_jobs: 0,
            model_file: "car_price_rf.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KaggleConfig {
    pub base_url: String,
    /// Defaults to `~/.kaggle/kaggle.json` when unset.
    pub credentials_path: Option<String>,
}

impl Default for KaggleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.kaggle.com/api/v1".to_string(),
            credentials_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub low: i64,
    pub high: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { low: 1, high: 100 }
    }
}

impl ProjectConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Reads `path`. Only the default file name may be absent, in which
    /// case the built-in defaults apply.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        tracing::debug!("Loading configuration from {}", path.display());
        Self::from_file(path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn project_root(&self) -> PathBuf {
        PathBuf::from(&self.paths.project_root)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.project_root().join(&self.paths.data_dir)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir().join(&self.paths.dataset_file)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.project_root().join(&self.paths.models_dir)
    }

    pub fn kaggle_credentials_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.kaggle.credentials_path {
            return Some(PathBuf::from(path));
        }
        home_dir().map(|home| home.join(".kaggle").join("kaggle.json"))
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

impl Validate for ProjectConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("paths.project_root", &self.paths.project_root)?;
        validation::validate_path("paths.data_dir", &self.paths.data_dir)?;
        validation::validate_path("paths.reports_dir", &self.paths.reports_dir)?;
        validation::validate_path("paths.models_dir", &self.paths.models_dir)?;
        validation::validate_file_extension("paths.dataset_file", &self.paths.dataset_file, &["csv"])?;
        validation::validate_file_extension("paths.sample_file", &self.paths.sample_file, &["csv"])?;

        validation::validate_positive_number("eda.histogram_bins", self.eda.histogram_bins, 1)?;
        validation::validate_positive_number("eda.top_companies", self.eda.top_companies, 1)?;

        validation::validate_positive_number("model.n_estimators", self.model.n_estimators, 1)?;
        validation::validate_positive_number("model.cv_folds", self.model.cv_folds, 2)?;
        validation::validate_positive_number(
            "model.min_samples_split",
            self.model.min_samples_split,
            2,
        )?;
        if let Some(depth) = self.model.max_depth {
            validation::validate_positive_number("model.max_depth", depth, 1)?;
        }
        validation::validate_open_range("model.test_size", self.model.test_size, 0.0, 1.0)?;
        validation::validate_non_empty_string("model.model_file", &self.model.model_file)?;

        validation::validate_url("kaggle.base_url", &self.kaggle.base_url)?;

        if self.game.low >= self.game.high {
            return Err(ProjectError::ConfigValidationError {
                field: "game".to_string(),
                message: format!(
                    "low ({}) must be smaller than high ({})",
                    self.game.low, self.game.high
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ProjectConfig::from_toml_str("").unwrap();

        assert_eq!(config.paths.data_dir, "data");
        assert_eq!(config.eda.histogram_bins, 50);
        assert_eq!(config.model.n_estimators, 200);
        assert_eq!(config.model.random_state, 42);
        assert_eq!(config.game.low, 1);
        assert_eq!(config.game.high, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let toml_content = r#"
[paths]
project_root = "/srv/cars"

[model]
n_estimators = 25
max_depth = 8
"#;

        let config = ProjectConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.model.n_estimators, 25);
        assert_eq!(config.model.max_depth, Some(8));
        assert_eq!(config.model.cv_folds, 3);
        assert_eq!(
            config.dataset_path(),
            PathBuf::from("/srv/cars/data/Cars Datasets 2025.csv")
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PERSONAL_PROJECT_TEST_ROOT", "/tmp/pp-root");

        let toml_content = r#"
[paths]
project_root = "${PERSONAL_PROJECT_TEST_ROOT}"
reports_dir = "${PERSONAL_PROJECT_UNSET_VAR}"
"#;

        let config = ProjectConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.paths.project_root, "/tmp/pp-root");
        assert_eq!(config.paths.reports_dir, "${PERSONAL_PROJECT_UNSET_VAR}");

        std::env::remove_var("PERSONAL_PROJECT_TEST_ROOT");
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let bad_url = ProjectConfig::from_toml_str("[kaggle]\nbase_url = \"not a url\"\n").unwrap();
        assert!(bad_url.validate().is_err());

        let bad_split = ProjectConfig::from_toml_str("[model]\ntest_size = 1.5\n").unwrap();
        assert!(bad_split.validate().is_err());

        let bad_game = ProjectConfig::from_toml_str("[game]\nlow = 10\nhigh = 10\n").unwrap();
        assert!(matches!(
            bad_game.validate(),
            Err(ProjectError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_toml_error() {
        let err = ProjectConfig::from_toml_str("[paths\n").unwrap_err();
        assert!(matches!(err, ProjectError::TomlError(_)));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[eda]\ntop_companies = 3\ncompress = true\n")
            .unwrap();

        let config = ProjectConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.eda.top_companies, 3);
        assert!(config.eda.compress);
    }

    #[test]
    fn test_load_or_default_without_default_file() {
        assert!(!Path::new(DEFAULT_CONFIG_FILE).exists());
        let config = ProjectConfig::load_or_default(DEFAULT_CONFIG_FILE).unwrap();
        assert_eq!(config.paths.models_dir, "models");
    }

    #[test]
    fn test_load_or_default_rejects_missing_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ProjectConfig::load_or_default(dir.path().join("typo.toml")).unwrap_err();
        assert!(matches!(err, ProjectError::IoError(_)));
    }

    #[test]
    fn test_explicit_credentials_path() {
        let config =
            ProjectConfig::from_toml_str("[kaggle]\ncredentials_path = \"/etc/kaggle.json\"\n")
                .unwrap();
        assert_eq!(
            config.kaggle_credentials_path(),
            Some(PathBuf::from("/etc/kaggle.json"))
        );
    }
}
