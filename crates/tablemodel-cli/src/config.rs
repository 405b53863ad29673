use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// URL used when nothing else is configured.
pub const DEFAULT_URL: &str = "sqlite::memory:";

/// Contents of `tablemodel.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSection {
    pub url: Option<String>,
    /// Log statements slower than this as warnings.
    pub slow_query_ms: Option<u64>,
    pub statement_cache: Option<bool>,
}

impl ConfigFile {
    /// Load the config file if it exists; a missing file is an empty config.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        let mut file: ConfigFile = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
        file.expand_env()?;
        Ok(file)
    }

    fn expand_env(&mut self) -> anyhow::Result<()> {
        if let Some(url) = self.database.url.as_mut() {
            *url = expand_env_vars(url)?;
        }
        Ok(())
    }

    pub fn slow_threshold(&self) -> Option<Duration> {
        self.database.slow_query_ms.map(Duration::from_millis)
    }
}

/// Pick the database URL: command line, then config file, then `DATABASE_URL`
/// (including a `.env` file), then the in-memory default.
pub fn resolve_url(cli: Option<&str>, file: &ConfigFile) -> String {
    if let Some(url) = cli {
        return url.to_string();
    }
    if let Some(url) = file.database.url.as_deref().filter(|u| !u.trim().is_empty()) {
        return url.to_string();
    }
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_URL.to_string())
}

/// Replace each `${VAR}` in the config text with the variable's value; unset or
/// malformed references are errors.
fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
