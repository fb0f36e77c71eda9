use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::errors;
use protinfer::AnalysisConfig;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub output: Option<OutputConfig>,
}

/// One identification file, already converted to NDJSON PSM records.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InputConfig {
    pub path: PathBuf,
    /// Defaults to the file stem. Preferred scores are keyed by this name.
    pub name: Option<String>,
    #[serde(default = "default_file_type")]
    pub file_type: String,
}

fn default_file_type() -> String {
    "ndjson".to_string()
}

impl InputConfig {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            path,
            name: None,
            file_type: default_file_type(),
        }
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| self.path.to_string_lossy().to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Config {
    pub fn load(path: &PathBuf) -> Result<Self, errors::CliError> {
        let file = std::fs::File::open(path).map_err(|e| errors::CliError::Io {
            source: e.to_string(),
            path: Some(path.to_string_lossy().to_string()),
        })?;
        serde_json::from_reader(file).map_err(|e| errors::CliError::ParseError {
            msg: e.to_string(),
        })
    }

    /// Command line arguments win over the config file.
    pub fn with_cli_args(mut self, args: &Cli) -> Result<Self, errors::CliError> {
        if !args.input.is_empty() {
            self.inputs = args.input.iter().cloned().map(InputConfig::from_path).collect();
        }
        if let Some(dir) = &args.output_dir {
            self.output = Some(OutputConfig {
                directory: dir.clone(),
            });
        }
        if let Some(method) = args.method {
            self.analysis.inference.method = method;
        }
        if let Some(strategy) = &args.decoy_strategy {
            self.analysis.psm.decoy_strategy = strategy.clone();
            self.analysis.protein.decoy_strategy = strategy.clone();
        }
        if let Some(threshold) = args.fdr_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(errors::CliError::Config {
                    source: format!("FDR threshold must be within [0, 1], got {}", threshold),
                });
            }
            self.analysis.protein.fdr_threshold = threshold;
        }

        if self.inputs.is_empty() {
            return Err(errors::CliError::Config {
                source: "No input provided, add one to the config file or use --input"
                    .to_string(),
            });
        }
        if self.output.is_none() {
            return Err(errors::CliError::Config {
                source: "No output directory provided, set one in the config file or use \
                         --output-dir"
                    .to_string(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use protinfer::InferenceMethod;

    #[test]
    fn test_cli_overrides_config() {
        let raw = r#"{
            "inputs": [{"path": "data/mascot_run.ndjson", "name": "mascot", "file_type": "mascot"}],
            "analysis": {"inference": {"method": "report_all"}},
            "output": {"directory": "out"}
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.inputs[0].display_name(), "mascot");

        let args = Cli::parse_from([
            "protinfer",
            "--input",
            "a/run1.ndjson",
            "--method",
            "spectrum_extractor",
            "--decoy-strategy",
            "accession-pattern:DECOY_.*",
        ]);
        let config = config.with_cli_args(&args).unwrap();
        assert_eq!(config.inputs.len(), 1);
        assert_eq!(config.inputs[0].display_name(), "run1");
        assert_eq!(
            config.analysis.inference.method,
            InferenceMethod::SpectrumExtractor
        );
        assert_eq!(
            config.analysis.protein.decoy_strategy.to_string(),
            "accession-pattern:DECOY_.*"
        );
    }

    #[test]
    fn test_missing_inputs() {
        let args = Cli::parse_from(["protinfer", "--output-dir", "out"]);
        assert!(Config::default().with_cli_args(&args).is_err());
    }
}
