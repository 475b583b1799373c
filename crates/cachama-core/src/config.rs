use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CachamaError, Result};
use crate::types::MAX_CONTEXT_RECORDS;

/// Top-level configuration for the Cachama chat relay.
///
/// Loaded from `~/.cachama/config.toml` by default. Read once at startup and
/// handed to constructors by value; nothing below is global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachamaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
}

impl CachamaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CachamaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CachamaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the catalog database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.cachama/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for every path the API does not own (photos, icons).
    pub assets_dir: String,
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            assets_dir: "public".to_string(),
            max_body_bytes: 256 * 1024,
        }
    }
}

/// Catalog storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file name, relative to `general.data_dir`.
    pub db_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: "catalog.db".to_string(),
        }
    }
}

/// Context retrieval limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Records returned for a matching query.
    pub max_results: usize,
    /// Records suggested when nothing matches.
    pub fallback_results: usize,
}

impl RetrievalConfig {
    /// `max_results`, clamped to the prompt's record budget.
    pub fn effective_max_results(&self) -> usize {
        self.max_results.min(MAX_CONTEXT_RECORDS)
    }

    /// `fallback_results`, clamped to the prompt's record budget.
    pub fn effective_fallback_results(&self) -> usize {
        self.fallback_results.min(MAX_CONTEXT_RECORDS)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            fallback_results: 3,
        }
    }
}

/// Streaming text generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of the model runner; the model id is appended as a path segment.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
    /// Bearer token. `CACHAMA_AI_TOKEN` overrides it at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Request timeout in seconds, covering the whole streamed reply.
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.cloudflare.com/client/v4/accounts/ACCOUNT_ID/ai/run"
                .to_string(),
            model: "@cf/meta/llama-3-8b-instruct".to_string(),
            max_tokens: 1024,
            api_token: None,
            timeout_secs: 120,
        }
    }
}

/// Persona, prompt wording and page theme.
///
/// Every storefront variant is one instance of this section; the pipeline
/// itself never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Business name shown in the header and used in the prompt.
    pub business_name: String,
    /// Short subtitle under the header title.
    pub tagline: String,
    pub location: String,
    pub tone: String,
    pub style: String,
    /// Greeting the generator is told to use.
    pub greeting: String,
    /// Numbered rules appended to the prompt, before the photo rule.
    pub instructions: Vec<String>,
    /// Origin serving `/fotos/<id>.png`.
    pub photo_base_url: String,
    /// Alt text of the photo directive.
    pub image_alt: String,
    /// Prefix placed before matched records.
    pub exact_label: String,
    /// Prefix placed before fallback suggestions.
    pub fallback_label: String,
    /// Context text used when the catalog cannot be reached.
    pub unavailable_notice: String,
    /// Body of the `{ "error": ... }` response on inference failure.
    pub error_message: String,
    /// First bot bubble on the chat page.
    pub welcome_message: String,
    pub input_placeholder: String,
    pub typing_indicator: String,
    /// Shown by the page when the request itself fails.
    pub connection_error: String,
    #[serde(default)]
    pub theme: ThemeConfig,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            business_name: "La Cachamita de Oro".to_string(),
            tagline: "En línea | Barinas".to_string(),
            location: "Barinas, Venezuela".to_string(),
            tone: "Profesional, cálido, acogedor y educado.".to_string(),
            style: "Servicial y directo para tomar pedidos. NO uses jergas antiguas como \"camarita\".".to_string(),
            greeting: "¡Bienvenido a La Cachamita de Oro! 🐟 Es un gusto recibirle.".to_string(),
            instructions: vec![
                "Si el usuario saluda, ofrece ver \"Desayunos\" o \"Almuerzos Criollos\"."
                    .to_string(),
                "Si das un precio, sé exacto según la base de datos.".to_string(),
            ],
            photo_base_url: "http://127.0.0.1:8787".to_string(),
            image_alt: "foto".to_string(),
            exact_label: "INFORMACIÓN DEL MENÚ ENCONTRADA: ".to_string(),
            fallback_label: "No hay coincidencia exacta. Sugerencias generales: ".to_string(),
            unavailable_notice: "Error de conexión a precios. Ofrece el menú general."
                .to_string(),
            error_message: "Error interno".to_string(),
            welcome_message: "¡Hola! 👋 Es un gusto saludarle.\n\nBienvenido a La Cachamita de Oro. ¿Le gustaría ver nuestro menú de Desayunos o prefiere los Almuerzos Criollos?".to_string(),
            input_placeholder: "Escribe un mensaje...".to_string(),
            typing_indicator: "Escribiendo...".to_string(),
            connection_error: "Disculpe, hubo un error de conexión.".to_string(),
            theme: ThemeConfig::default(),
        }
    }
}

/// Page colors, as CSS color values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub primary: String,
    pub primary_dark: String,
    pub background: String,
    pub text: String,
    pub user_bubble: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary: "#008069".to_string(),
            primary_dark: "#005c4b".to_string(),
            background: "#efe7dd".to_string(),
            text: "#111111".to_string(),
            user_bubble: "#d9fdd3".to_string(),
        }
    }
}
