use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::blocks::Pattern;
use crate::error::SettingsError;

const ENV_PREFIX: &str = "BLOCKS";

/// Maps fragments to transforms: every element matching `selector` is
/// converted with `pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub selector: String,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Page URL that relative `src`/`href` values resolve against.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Keep converting the rest of a page when one fragment fails.
    #[serde(default = "default_continue_on_error")]
    pub continue_on_error: bool,
}

fn default_continue_on_error() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: None,
            rules: Vec::new(),
            continue_on_error: default_continue_on_error(),
        }
    }
}

impl Settings {
    /// Defaults, then the rules file (format from its extension), then
    /// `BLOCKS_*` environment variables.
    pub fn load(rules_file: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_env(rules_file, Environment::with_prefix(ENV_PREFIX))
    }

    pub(crate) fn load_with_env(
        rules_file: Option<&Path>,
        env: Environment,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder().set_default("continue_on_error", true)?;
        if let Some(path) = rules_file {
            builder = builder.add_source(File::from(path));
        }
        let settings: Settings = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.parsed_base_url()?;
        Ok(settings)
    }

    pub fn parsed_base_url(&self) -> Result<Option<Url>, SettingsError> {
        self.base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|source| SettingsError::BaseUrl {
                    url: raw.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(vars.into_iter().collect()))
    }

    fn rules_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults() {
        let settings = Settings::load_with_env(None, env(&[])).unwrap();
        assert!(settings.rules.is_empty());
        assert!(settings.continue_on_error);
        assert_eq!(settings.parsed_base_url().unwrap(), None);
    }

    #[test]
    fn rules_from_file() {
        let file = rules_file(
            r##"
            base_url = "https://agency.example/"

            [[rules]]
            selector = "#services"
            pattern = "feature-columns"

            [[rules]]
            selector = "header.masthead"
            pattern = "hero-media"
            "##,
        );
        let settings = Settings::load_with_env(Some(file.path()), env(&[])).unwrap();
        assert_eq!(
            settings.rules,
            [
                Rule { selector: "#services".into(), pattern: Pattern::FeatureColumns },
                Rule { selector: "header.masthead".into(), pattern: Pattern::HeroMedia },
            ]
        );
        assert_eq!(
            settings.parsed_base_url().unwrap().unwrap().as_str(),
            "https://agency.example/"
        );
    }

    #[test]
    fn environment_overrides_file() {
        let file = rules_file(r#"base_url = "https://old.example/""#);
        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[
                ("BLOCKS_BASE_URL", "https://new.example/"),
                ("BLOCKS_CONTINUE_ON_ERROR", "false"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.base_url.as_deref(), Some("https://new.example/"));
        assert!(!settings.continue_on_error);
    }

    #[test]
    fn example_rules_file_loads() {
        let settings = Settings::load_with_env(Some(Path::new("rules.example.toml")), env(&[])).unwrap();
        assert_eq!(settings.rules.len(), 5);
        assert_eq!(settings.rules[0].pattern, Pattern::SocialLinks);
    }

    #[test]
    fn unknown_pattern_rejected() {
        let file = rules_file(
            r#"
            [[rules]]
            selector = "nav"
            pattern = "mega-menu"
            "#,
        );
        assert!(Settings::load_with_env(Some(file.path()), env(&[])).is_err());
    }

    #[test]
    fn bad_base_url_rejected() {
        let err = Settings::load_with_env(None, env(&[("BLOCKS_BASE_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, SettingsError::BaseUrl { .. }));
    }
}
