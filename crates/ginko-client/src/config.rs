//! `ginko.toml` の読み込み
//!
//! ```toml
//! [engine]
//! path = "engine/target/release/engine"
//! args = []
//!
//! [play]
//! human_color = "b"
//! depth = 3
//! randomness = 200
//! turn_delay_ms = 1000
//! auto_play = false
//! ```
//!
//! すべて省略可能。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use ginko_core::types::Color;

use crate::engine::{EngineConfig, default_engine_path, find_engine_in_dir};
use crate::session::{DEFAULT_DEPTH, DEFAULT_RANDOMNESS, DEFAULT_TURN_DELAY, PlaySettings};

/// 既定の設定ファイル名（カレントディレクトリ）
pub const DEFAULT_CONFIG_FILE: &str = "ginko.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub engine: EngineSection,
    pub play: PlaySection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    /// 未指定ならプロジェクトの `engine/target/{debug,release}/engine` を探す
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaySection {
    pub human_color: Color,
    pub depth: u32,
    pub randomness: u32,
    pub turn_delay_ms: u64,
    pub auto_play: bool,
}

impl Default for PlaySection {
    fn default() -> Self {
        PlaySection {
            human_color: Color::Black,
            depth: DEFAULT_DEPTH,
            randomness: DEFAULT_RANDOMNESS,
            turn_delay_ms: DEFAULT_TURN_DELAY.as_millis() as u64,
            auto_play: false,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// `path` が指定されていればそれを、なければ既定ファイルがあれば読む
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// エンジン起動設定（パス未指定時は `root` 配下を探索）
    pub fn engine_config(&self, root: &Path) -> EngineConfig {
        let path = self
            .engine
            .path
            .clone()
            .or_else(|| find_engine_in_dir(root))
            .unwrap_or_else(|| default_engine_path(root));
        EngineConfig {
            path,
            args: self.engine.args.clone(),
        }
    }

    pub fn play_settings(&self) -> PlaySettings {
        let mut settings = PlaySettings {
            human_color: self.play.human_color,
            auto_play: self.play.auto_play,
            ..PlaySettings::default()
        };
        settings.set_depth(self.play.depth);
        settings.set_randomness(self.play.randomness);
        settings.set_turn_delay(Duration::from_millis(self.play.turn_delay_ms));
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ClientConfig::parse("", Path::new("ginko.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.play_settings(), PlaySettings::default());
    }

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[engine]
path = "/opt/ginko/engine"
args = ["--threads", "1"]

[play]
human_color = "w"
depth = 0
randomness = 0
turn_delay_ms = 250
auto_play = true
"#
        )
        .unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        let engine = config.engine_config(Path::new("/unused"));
        assert_eq!(engine.path, PathBuf::from("/opt/ginko/engine"));
        assert_eq!(engine.args, vec!["--threads", "1"]);

        let settings = config.play_settings();
        assert_eq!(settings.human_color, Color::White);
        assert_eq!(settings.depth, 1);
        assert_eq!(settings.randomness, 0);
        assert_eq!(settings.turn_delay, Duration::from_millis(250));
        assert!(settings.auto_play);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = ClientConfig::parse("[play]\nspeed = 3\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let err = ClientConfig::parse("[play]\nhuman_color = \"black\"\n", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_engine_path_falls_back_to_release_build() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ClientConfig::default().engine_config(dir.path());
        assert_eq!(engine.path, default_engine_path(dir.path()));
    }
}
