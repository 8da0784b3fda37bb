//! Server configuration from the environment.
//!
//! `.env` is loaded first (see `main`), so real environment variables win.
//!
//! | Variable             | Default        |
//! |----------------------|----------------|
//! | `KHET_BIND_ADDR`     | `0.0.0.0:8000` |
//! | `KHET_DEFAULT_DEPTH` | `3`            |
//! | `KHET_MAX_DEPTH`     | `5`            |
//! | `KHET_TIE_BREAK`     | `first`        |
//! | `KHET_EVAL_WEIGHTS`  | unset          |

use std::env;
use std::fs;
use std::path::PathBuf;

use khet_core::{EvalWeights, SearchConfig, TieBreak, WeightsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("KHET_DEFAULT_DEPTH ({default}) exceeds KHET_MAX_DEPTH ({max})")]
    DepthRange { default: u32, max: u32 },

    #[error("failed to read evaluation weights from {path:?}")]
    WeightsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse evaluation weights in {path:?}")]
    WeightsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid evaluation weights in {path:?}")]
    WeightsInvalid {
        path: PathBuf,
        #[source]
        source: WeightsError,
    },
}

/// How the agent breaks ties between equally scored moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreakSetting {
    First,
    /// Random with a fixed seed, or a fresh seed per request.
    Random(Option<u64>),
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub default_depth: u32,
    pub max_depth: u32,
    pub tie_break: TieBreakSetting,
    pub weights: EvalWeights,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: "0.0.0.0:8000".to_string(),
            default_depth: 3,
            max_depth: 5,
            tie_break: TieBreakSetting::First,
            weights: EvalWeights::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ApiConfig::default();

        if let Some(addr) = get("KHET_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(depth) = get("KHET_DEFAULT_DEPTH") {
            config.default_depth = parse_depth("KHET_DEFAULT_DEPTH", depth)?;
        }
        if let Some(depth) = get("KHET_MAX_DEPTH") {
            config.max_depth = parse_depth("KHET_MAX_DEPTH", depth)?;
        }
        if config.default_depth > config.max_depth {
            return Err(ConfigError::DepthRange {
                default: config.default_depth,
                max: config.max_depth,
            });
        }
        if let Some(tie_break) = get("KHET_TIE_BREAK") {
            config.tie_break = parse_tie_break(tie_break)?;
        }
        if let Some(path) = get("KHET_EVAL_WEIGHTS") {
            config.weights = load_weights(PathBuf::from(path))?;
        }
        Ok(config)
    }

    /// Search settings for one request, with the depth clamped to `1..=max_depth`.
    pub fn search_config(&self, requested_depth: Option<u32>) -> SearchConfig {
        let max_depth = requested_depth
            .unwrap_or(self.default_depth)
            .clamp(1, self.max_depth);
        let tie_break = match self.tie_break {
            TieBreakSetting::First => TieBreak::FirstFound,
            TieBreakSetting::Random(Some(seed)) => TieBreak::Random { seed },
            TieBreakSetting::Random(None) => TieBreak::Random {
                seed: rand::random::<u64>(),
            },
        };
        SearchConfig {
            max_depth,
            prune: true,
            tie_break,
        }
    }
}

fn parse_depth(key: &'static str, value: String) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(depth) if depth >= 1 => Ok(depth),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

/// `first`, `random` or `random:<seed>`.
fn parse_tie_break(value: String) -> Result<TieBreakSetting, ConfigError> {
    let lowered = value.trim().to_ascii_lowercase();
    match lowered.split_once(':') {
        None if lowered == "first" => Ok(TieBreakSetting::First),
        None if lowered == "random" => Ok(TieBreakSetting::Random(None)),
        Some(("random", seed)) => seed
            .parse()
            .map(|seed| TieBreakSetting::Random(Some(seed)))
            .map_err(|_| ConfigError::Invalid {
                key: "KHET_TIE_BREAK",
                value,
            }),
        _ => Err(ConfigError::Invalid {
            key: "KHET_TIE_BREAK",
            value,
        }),
    }
}

fn load_weights(path: PathBuf) -> Result<EvalWeights, ConfigError> {
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(source) => return Err(ConfigError::WeightsRead { path, source }),
    };
    let weights: EvalWeights = match serde_json::from_str(&text) {
        Ok(weights) => weights,
        Err(source) => return Err(ConfigError::WeightsParse { path, source }),
    };
    match weights.validate() {
        Ok(()) => Ok(weights),
        Err(source) => Err(ConfigError::WeightsInvalid { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.default_depth, 3);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.tie_break, TieBreakSetting::First);
        assert_eq!(config.weights, EvalWeights::default());
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("KHET_BIND_ADDR", "127.0.0.1:9000"),
            ("KHET_DEFAULT_DEPTH", "2"),
            ("KHET_MAX_DEPTH", "4"),
            ("KHET_TIE_BREAK", "random:7"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.default_depth, 2);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.tie_break, TieBreakSetting::Random(Some(7)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("KHET_MAX_DEPTH", "zero")])),
            Err(ConfigError::Invalid { key: "KHET_MAX_DEPTH", .. })
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("KHET_DEFAULT_DEPTH", "0")])),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("KHET_DEFAULT_DEPTH", "6")])),
            Err(ConfigError::DepthRange { default: 6, max: 5 })
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("KHET_TIE_BREAK", "sometimes")])),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("KHET_EVAL_WEIGHTS", "/nonexistent/weights.json")])),
            Err(ConfigError::WeightsRead { .. })
        ));
    }

    #[test]
    fn test_weights_file() {
        let dir = env::temp_dir().join(format!("khet-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.json");
        fs::write(&good, r#"{"king": 300}"#).unwrap();
        let config =
            ApiConfig::from_lookup(lookup(&[("KHET_EVAL_WEIGHTS", good.to_str().unwrap())])).unwrap();
        assert_eq!(config.weights.king, 300);
        assert_eq!(config.weights.win_score, EvalWeights::default().win_score);

        let overflowing = dir.join("overflowing.json");
        fs::write(&overflowing, r#"{"win_score": 2147483000, "depth_bonus": 1000}"#).unwrap();
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("KHET_EVAL_WEIGHTS", overflowing.to_str().unwrap())])),
            Err(ConfigError::WeightsInvalid { .. })
        ));

        let weak = dir.join("weak.json");
        fs::write(&weak, r#"{"win_score": 100}"#).unwrap();
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("KHET_EVAL_WEIGHTS", weak.to_str().unwrap())])),
            Err(ConfigError::WeightsInvalid {
                source: WeightsError::WinScoreTooSmall { .. },
                ..
            })
        ));

        let garbled = dir.join("garbled.json");
        fs::write(&garbled, "{ king: }").unwrap();
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("KHET_EVAL_WEIGHTS", garbled.to_str().unwrap())])),
            Err(ConfigError::WeightsParse { .. })
        ));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_search_depth_clamped() {
        let config = ApiConfig::default();
        assert_eq!(config.search_config(None).max_depth, 3);
        assert_eq!(config.search_config(Some(0)).max_depth, 1);
        assert_eq!(config.search_config(Some(9)).max_depth, 5);
        assert_eq!(config.search_config(Some(4)).tie_break, TieBreak::FirstFound);
    }

    #[test]
    fn test_unseeded_random_draws_fresh_seeds() {
        let config = ApiConfig {
            tie_break: TieBreakSetting::Random(None),
            ..ApiConfig::default()
        };
        let seeds: Vec<u64> = (0..4)
            .map(|_| match config.search_config(None).tie_break {
                TieBreak::Random { seed } => seed,
                other => panic!("expected random tie-break, got {:?}", other),
            })
            .collect();
        assert!(seeds.windows(2).any(|pair| pair[0] != pair[1]));

        let seeded = ApiConfig {
            tie_break: TieBreakSetting::Random(Some(42)),
            ..ApiConfig::default()
        };
        assert_eq!(seeded.search_config(None).tie_break, TieBreak::Random { seed: 42 });
        assert_eq!(seeded.search_config(Some(2)).tie_break, TieBreak::Random { seed: 42 });
    }
}
