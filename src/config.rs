use std::path::PathBuf;

pub const APP_NAME: &str = "labreport";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;
const DEFAULT_DETECTION_MODEL: &str = "models/text-detection-checkpoint-03.23.recall_92.precis_85.rten";
const DEFAULT_RECOGNITION_MODEL: &str = "models/text-rec-checkpoint-7.rten";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "labreport=info,tower_http=info"
}

/// Runtime settings, read from `LABREPORT_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub upload_dir: PathBuf,
    pub body_limit: usize,
    pub detection_model: PathBuf,
    pub recognition_model: PathBuf,
    pub ranges_path: Option<PathBuf>,
    pub specialties_path: Option<PathBuf>,
    pub symptoms_path: Option<PathBuf>,
    pub tokens: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upload_dir: std::env::temp_dir(),
            body_limit: DEFAULT_BODY_LIMIT,
            detection_model: PathBuf::from(DEFAULT_DETECTION_MODEL),
            recognition_model: PathBuf::from(DEFAULT_RECOGNITION_MODEL),
            ranges_path: None,
            specialties_path: None,
            symptoms_path: None,
            tokens: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparsable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        Self {
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            upload_dir: path("LABREPORT_UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            body_limit: lookup("LABREPORT_BODY_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.body_limit),
            detection_model: path("LABREPORT_DETECTION_MODEL").unwrap_or(defaults.detection_model),
            recognition_model: path("LABREPORT_RECOGNITION_MODEL").unwrap_or(defaults.recognition_model),
            ranges_path: path("LABREPORT_RANGES"),
            specialties_path: path("LABREPORT_SPECIALTIES"),
            symptoms_path: path("LABREPORT_SYMPTOMS"),
            tokens: lookup("LABREPORT_TOKENS").unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "3000"),
            ("LABREPORT_UPLOAD_DIR", "/var/uploads"),
            ("LABREPORT_BODY_LIMIT", "1024"),
            ("LABREPORT_RANGES", "ranges.json"),
            ("LABREPORT_TOKENS", "t=alice"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.upload_dir, PathBuf::from("/var/uploads"));
        assert_eq!(config.body_limit, 1024);
        assert_eq!(config.ranges_path, Some(PathBuf::from("ranges.json")));
        assert_eq!(config.specialties_path, None);
        assert_eq!(config.tokens, "t=alice");
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("LABREPORT_BODY_LIMIT", "-1")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn empty_paths_are_unset() {
        let config = config_from(&[("LABREPORT_SYMPTOMS", "")]);
        assert_eq!(config.symptoms_path, None);
    }
}
