use serde::de::DeserializeOwned;

/// Everything noticed while loading a config that did not stop the load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDiagnostics {
    /// Keys present in the file that the schema does not know, as dotted
    /// paths (`memory.max_memroy_mb`).
    pub unknown_keys: Vec<String>,
    /// Recoverable issues; a default or fallback was used.
    pub warnings: Vec<ConfigWarning>,
    /// Inconsistent settings the runtime cannot honor as written.
    pub errors: Vec<ConfigValidationError>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn extend_validation(&mut self, validation: ValidationDiagnostics) {
        self.warnings.extend(validation.warnings);
        self.errors.extend(validation.errors);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationDiagnostics {
    pub warnings: Vec<ConfigWarning>,
    pub errors: Vec<ConfigValidationError>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    InvalidValue { toml_path: String, message: String },
    LoggingLevelInvalid { value: String, normalized: String },
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    InvalidValue { toml_path: String, message: String },
    ThresholdOrder { warning: f64, critical: f64 },
    CacheExceedsMemory { max_cache_mb: u64, max_memory_mb: u64 },
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(path.to_string().trim_start_matches('.').to_string());
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}
