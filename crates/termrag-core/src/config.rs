use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkerConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    pub corpus_path: String,
    pub index_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingSettings {
    pub window: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAi,
    /// Deterministic local hashing embedder; no network.
    Hash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f32,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data: DataSettings {
                corpus_path: "data/dev_terms.json".to_string(),
                index_dir: "data/index".to_string(),
            },
            chunking: ChunkingSettings { window: 1000, overlap: 200 },
            retrieval: RetrievalSettings { top_k: 4 },
            embedding: EmbeddingSettings {
                provider: EmbeddingProvider::OpenAi,
                model: "text-embedding-3-small".to_string(),
                dimension: 1536,
                endpoint: "https://api.openai.com".to_string(),
                timeout_secs: 30,
            },
            llm: LlmSettings {
                model: "gpt-4o-mini".to_string(),
                temperature: 0.0,
                endpoint: "https://api.openai.com".to_string(),
                timeout_secs: 60,
            },
        }
    }
}

impl Settings {
    /// Merge built-in defaults, `config.toml`, `config.<env>.toml` and `APP_*`
    /// variables (nested keys separated by `__`, e.g. `APP_RETRIEVAL__TOP_K`).
    ///
    /// The environment name comes from `RUST_ENV` (default `dev`).
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::from_figment(Self::figment(&env_name, Path::new(".")))
    }

    /// Same as [`Settings::load`], reading the TOML files from `dir`.
    pub fn load_from(dir: &Path, env_name: &str) -> Result<Self> {
        Self::from_figment(Self::figment(env_name, dir))
    }

    fn figment(env_name: &str, dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment.merge(Env::prefixed("APP_").split("__"))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.window == 0 || self.chunking.overlap >= self.chunking.window {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.window ({})",
                self.chunking.overlap, self.chunking.window
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be at least 1".into()));
        }
        Ok(())
    }

    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig::new(self.chunking.window, self.chunking.overlap)
    }

    /// `data.corpus_path`, expanded and resolved against `base` when relative.
    pub fn corpus_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.data.corpus_path)
    }

    /// `data.index_dir`, expanded and resolved against `base` when relative.
    pub fn index_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.data.index_dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
