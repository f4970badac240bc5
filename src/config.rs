use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _};
use serde::{Deserialize, Serialize};

use dotmark::locale::{BuiltinLocaleLoader, LocaleLoader};
use dotmark::{ContextOptions, DocumentInfo};
use dotmark_parser::Flavor;

/// Name of the configuration file looked up next to a compiled document.
pub const CONFIG_FILE: &str = "dotmark.yml";

/// What happens to a call that fails to expand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorHandling {
    /// Log the error, leave a marker in the output and keep compiling.
    #[default]
    Log,
    /// Stop at the first error.
    Strict,
}

/// Refers to a dotmark.yml file that sets the options documents are compiled with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub flavor: Flavor,
    pub error_handling: ErrorHandling,
    pub options: ContextOptions,
    pub document: DocumentInfo,
}

impl CompilerConfig {
    pub fn from_yaml(input: &str) -> anyhow::Result<Self> {
        if input.trim().is_empty() {
            return Ok(CompilerConfig::default());
        }
        let mut config: CompilerConfig =
            serde_yaml::from_str(input).context("Error loading compiler configuration:")?;
        config.resolve_locale()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let input = fs::read_to_string(path)
            .with_context(|| format!("Could not read configuration file {}", path.display()))?;
        Self::from_yaml(&input).with_context(|| format!("in {}", path.display()))
    }

    /// Loads the configuration file in the directory of `source`, if there is one.
    pub fn discover<P: AsRef<Path>>(source: P) -> anyhow::Result<Self> {
        match config_path(source.as_ref()) {
            Some(path) => Self::load(path),
            None => Ok(CompilerConfig::default()),
        }
    }

    /// Replaces the configured locale, which may be a name such as `Italian`, with its tag.
    fn resolve_locale(&mut self) -> anyhow::Result<()> {
        if let Some(locale) = &self.document.locale {
            let found = BuiltinLocaleLoader
                .find(locale)
                .ok_or_else(|| anyhow!("Unknown locale '{}'", locale))?;
            self.document.locale = Some(found.tag);
        }
        Ok(())
    }
}

fn config_path(source: &Path) -> Option<PathBuf> {
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let path = dir.join(CONFIG_FILE);
    path.is_file().then_some(path)
}
