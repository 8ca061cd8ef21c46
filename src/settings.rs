use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "GITLAB";

#[derive(Debug)]
pub struct Settings {
    pub gitlab: crate::core::config::Config,
}

impl Settings {
    /// Reads `config.yaml` (the given path, or the platform config dir) and
    /// lets `GITLAB_URL`, `GITLAB_TOKEN` and `GITLAB_TIMEOUT_SECS` override it.
    pub fn new(config_file: Option<&Path>) -> Result<Self> {
        Self::load(config_file, ENV_PREFIX)
    }

    fn load(config_file: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        match config_file {
            Some(path) => {
                builder = builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Yaml).required(true));
            }
            None => {
                if let Some(path) = default_config_file() {
                    builder = builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Yaml).required(false));
                }
            }
        }

        let gitlab: crate::core::config::Config = builder
            .add_source(Environment::with_prefix(env_prefix))
            .build()?
            .try_deserialize()
            .with_context(|| {
                format!("Set {env_prefix}_URL and {env_prefix}_TOKEN, or put `url` and `token` into a config file")
            })?;

        if gitlab.auth_token().is_empty() {
            anyhow::bail!("{env_prefix}_TOKEN is empty");
        }

        Ok(Self { gitlab })
    }
}

fn default_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mrs").map(|dirs| dirs.config_dir().join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_connection_from_file() {
        let file = yaml("url: https://gitlab.example.com\ntoken: glpat-file\ntimeout_secs: 5\n");

        let settings = Settings::load(Some(file.path()), "MRS_TEST_FILE").unwrap();

        assert_eq!(settings.gitlab.host().as_str(), "https://gitlab.example.com/");
        assert_eq!(settings.gitlab.auth_token(), "glpat-file");
        assert_eq!(settings.gitlab.timeout().as_secs(), 5);
    }

    #[test]
    fn environment_overrides_file() {
        let file = yaml("url: https://gitlab.example.com\ntoken: glpat-file\n");
        std::env::set_var("MRS_TEST_ENV_TOKEN", "glpat-env");

        let settings = Settings::load(Some(file.path()), "MRS_TEST_ENV").unwrap();

        assert_eq!(settings.gitlab.auth_token(), "glpat-env");
        std::env::remove_var("MRS_TEST_ENV_TOKEN");
    }

    #[test]
    fn missing_token_is_an_error() {
        let file = yaml("url: https://gitlab.example.com\n");

        let err = Settings::load(Some(file.path()), "MRS_TEST_MISSING").unwrap_err();

        assert!(err.to_string().contains("MRS_TEST_MISSING_TOKEN"));
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let missing = Path::new("/nonexistent/mrs/config.yaml");

        assert!(Settings::load(Some(missing), "MRS_TEST_NOFILE").is_err());
    }
}
