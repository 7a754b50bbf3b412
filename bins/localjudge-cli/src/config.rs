// Language configuration management for the localjudge harness
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// How a testcase fixture reaches the solution subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Fixture path passed as the single command-line argument.
    Argument,
    /// Fixture file connected to the child's standard input.
    Stdin,
}

/// Build tool invocations, as explicit argument vectors.
///
/// `{src_dir}` and `{build_dir}` placeholders are substituted before the
/// step runs; every step executes with the problem source dir as cwd.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSteps {
    pub configure: Vec<String>,
    pub build: Vec<String>,
    pub install: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    pub version: String,
    pub file_extension: String,
    pub solution_file: String,
    pub declaration_file: String,
    pub timeout_ms: u64,
    pub input_mode: InputMode,
    pub build: BuildSteps,
}

#[derive(Debug, Serialize, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageConfig>,
}

/// Language configuration manager
#[derive(Debug, Clone)]
pub struct LanguageConfigManager {
    configs: HashMap<String, LanguageConfig>,
}

impl LanguageConfigManager {
    /// Load language configurations from languages.json
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Language config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .context("Failed to read languages.json")?;

        let languages_json: LanguagesJson = serde_json::from_str(&content)
            .context("Failed to parse languages.json")?;

        let mut configs = HashMap::new();
        for lang in languages_json.languages {
            configs.insert(lang.name.clone(), lang);
        }

        Ok(Self { configs })
    }

    /// Load with default path (config/languages.json), falling back to the
    /// built-in C++ entry so a fresh checkout works without any config.
    pub fn load_default() -> Result<Self> {
        let default_path = Path::new("config/languages.json");
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// The wired-in C++ configuration.
    pub fn builtin() -> Self {
        let cpp = LanguageConfig {
            name: "cpp".to_string(),
            version: "17".to_string(),
            file_extension: ".cpp".to_string(),
            solution_file: "solution.cpp".to_string(),
            declaration_file: "solutionfunction.h".to_string(),
            timeout_ms: 10_000,
            input_mode: InputMode::Argument,
            build: BuildSteps {
                configure: vec![
                    "cmake".to_string(),
                    "-B".to_string(),
                    "{build_dir}".to_string(),
                    "-DCMAKE_BUILD_TYPE=Debug".to_string(),
                ],
                build: vec![
                    "cmake".to_string(),
                    "--build".to_string(),
                    "{build_dir}".to_string(),
                    "--config".to_string(),
                    "Debug".to_string(),
                    "-j".to_string(),
                ],
                install: vec![
                    "cmake".to_string(),
                    "--install".to_string(),
                    "{build_dir}".to_string(),
                    "--config".to_string(),
                    "Debug".to_string(),
                ],
            },
        };

        let mut configs = HashMap::new();
        configs.insert(cpp.name.clone(), cpp);
        Self { configs }
    }

    /// Get configuration for a specific language
    pub fn get_config(&self, language: &str) -> Result<&LanguageConfig> {
        self.configs
            .get(language)
            .ok_or_else(|| anyhow::anyhow!("No configuration found for language: {}", language))
    }

    /// List all supported languages
    pub fn list_languages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_carries_cpp() {
        let manager = LanguageConfigManager::builtin();
        let cpp = manager.get_config("cpp").unwrap();
        assert_eq!(cpp.solution_file, "solution.cpp");
        assert_eq!(cpp.declaration_file, "solutionfunction.h");
        assert_eq!(cpp.input_mode, InputMode::Argument);
        assert!(cpp.build.configure.iter().any(|a| a == "{build_dir}"));
    }

    #[test]
    fn unknown_language_is_an_error() {
        let manager = LanguageConfigManager::builtin();
        assert!(manager.get_config("cobol").is_err());
    }

    #[test]
    fn load_parses_languages_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
  "languages": [
    {{
      "name": "cpp",
      "version": "20",
      "file_extension": ".cpp",
      "solution_file": "solution.cpp",
      "declaration_file": "solutionfunction.h",
      "timeout_ms": 5000,
      "input_mode": "stdin",
      "build": {{
        "configure": ["cmake", "-B", "{{build_dir}}"],
        "build": ["cmake", "--build", "{{build_dir}}"],
        "install": ["cmake", "--install", "{{build_dir}}"]
      }}
    }}
  ]
}}"#
        )
        .unwrap();

        let manager = LanguageConfigManager::load(&path).unwrap();
        let cpp = manager.get_config("cpp").unwrap();
        assert_eq!(cpp.version, "20");
        assert_eq!(cpp.timeout_ms, 5000);
        assert_eq!(cpp.input_mode, InputMode::Stdin);
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(LanguageConfigManager::load(Path::new("/nonexistent/languages.json")).is_err());
    }
}
