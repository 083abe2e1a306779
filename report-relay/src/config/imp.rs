// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    client::Attribute,
    errors::{ConfigParseError, ConfigParseErrorKind},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use itertools::Itertools;
use serde::Deserialize;
use std::{collections::BTreeSet, time::Duration};
use tracing::warn;

/// Overall configuration for a [`Reporter`](crate::reporter::Reporter).
///
/// Construct this either with [`ReporterConfig::from_sources`], which layers a user config file on
/// top of the embedded defaults, or programmatically starting from [`Default`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReporterConfig {
    test_set_name: String,
    description: Option<String>,
    attributes: Vec<Attribute>,
    snippet_context_lines: usize,
    artifact_wait: ArtifactWaitConfig,
    root_dir: Option<Utf8PathBuf>,
}

impl ReporterConfig {
    /// The default configuration, embedded in the library.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the reporter config, layering `config_file` (if provided) on top of the defaults.
    ///
    /// Unknown keys are reported as warnings and otherwise ignored.
    pub fn from_sources(config_file: Option<&Utf8Path>) -> Result<Self, ConfigParseError> {
        let mut builder = Self::make_default_config();
        if let Some(config_file) = config_file {
            builder = builder.add_source(File::new(config_file.as_str(), FileFormat::Toml));
        }
        let label = config_file.unwrap_or(Utf8Path::new("<default config>"));
        Self::from_builder(&builder, label)
    }

    /// Reads the reporter config from a TOML string layered on top of the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigParseError> {
        let builder =
            Self::make_default_config().add_source(File::from_str(contents, FileFormat::Toml));
        Self::from_builder(&builder, Utf8Path::new("<inline config>"))
    }

    /// Returns the name of the test set, used as the name of the remote run.
    pub fn test_set_name(&self) -> &str {
        &self.test_set_name
    }

    /// Returns the description of the remote run.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the attributes attached to the remote run.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the number of lines of source shown on either side of a failing line.
    pub fn snippet_context_lines(&self) -> usize {
        self.snippet_context_lines
    }

    /// Returns settings for waiting on artifact files.
    pub fn artifact_wait(&self) -> ArtifactWaitConfig {
        self.artifact_wait
    }

    /// Returns the directory module paths are made relative to, if configured.
    ///
    /// If this is `None`, the process working directory is used.
    pub fn root_dir(&self) -> Option<&Utf8Path> {
        self.root_dir.as_deref()
    }

    /// Sets the name of the test set.
    pub fn set_test_set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.test_set_name = name.into();
        self
    }

    /// Sets the description of the remote run.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an attribute to the remote run.
    pub fn add_attribute(&mut self, attribute: Attribute) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    /// Sets the number of lines of source shown on either side of a failing line.
    pub fn set_snippet_context_lines(&mut self, lines: usize) -> &mut Self {
        self.snippet_context_lines = lines;
        self
    }

    /// Sets settings for waiting on artifact files.
    pub fn set_artifact_wait(&mut self, artifact_wait: ArtifactWaitConfig) -> &mut Self {
        self.artifact_wait = artifact_wait;
        self
    }

    /// Sets the directory module paths are made relative to.
    pub fn set_root_dir(&mut self, root_dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.root_dir = Some(root_dir.into());
        self
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn from_builder(
        builder: &ConfigBuilder<DefaultState>,
        config_file: &Utf8Path,
    ) -> Result<Self, ConfigParseError> {
        let (config, ignored) = Self::build_and_deserialize_config(builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;

        if !ignored.is_empty() {
            warn!(
                "ignoring unknown configuration keys in {config_file}: {}",
                ignored.iter().join(", ")
            );
        }

        Ok(config.into_config())
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(ReporterConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: ReporterConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The config crate also reports the key. Drop it so the path is only reported
                // once.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            test_set_name: "Test run".to_owned(),
            description: None,
            attributes: Vec::new(),
            snippet_context_lines: 3,
            artifact_wait: ArtifactWaitConfig::default(),
            root_dir: None,
        }
    }
}

/// Settings for waiting on an artifact file to stop changing before it is uploaded.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArtifactWaitConfig {
    /// The interval between the two metadata samples that must agree.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// The overall time allowed for the file to stabilize.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ArtifactWaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReporterConfigDeserialize {
    test_set_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    attributes: Vec<Attribute>,
    snippet_context_lines: usize,
    artifact_wait: ArtifactWaitConfig,
    #[serde(default)]
    root_dir: Option<Utf8PathBuf>,
}

impl ReporterConfigDeserialize {
    fn into_config(self) -> ReporterConfig {
        ReporterConfig {
            test_set_name: self.test_set_name,
            description: self.description,
            attributes: self.attributes,
            snippet_context_lines: self.snippet_context_lines,
            artifact_wait: self.artifact_wait,
            root_dir: self.root_dir,
        }
    }
}
