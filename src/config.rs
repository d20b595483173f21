//! Carga y gestión de configuración de la aplicación (almacén de periódicos + LLM).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// Almacén del que se leen los periódicos.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreBackend {
    Neo4j,
    /// Fichero JSON de sólo lectura, útil en local y en pruebas.
    Memory,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "neo4j" => Ok(Self::Neo4j),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("Almacén de documentos no soportado: {other}")),
        }
    }
}

/// Nivel de detalle de la instrucción de sistema que recibe el modelo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionPolicy {
    /// Plantilla corta: sólo las reglas de anclaje al documento.
    Concise,
    /// Plantilla extendida: respuestas largas, referencias a turnos previos
    /// y estimaciones numéricas sobre los artículos.
    Analytical,
}

impl InstructionPolicy {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "concise" => Ok(Self::Concise),
            "analytical" => Ok(Self::Analytical),
            other => Err(anyhow!("Política de instrucciones no soportada: {other}")),
        }
    }

    pub fn default_temperature(self) -> f64 {
        match self {
            Self::Concise => 0.5,
            Self::Analytical => 0.7,
        }
    }

    pub fn default_max_output_tokens(self) -> Option<u64> {
        match self {
            Self::Concise => None,
            Self::Analytical => Some(2048),
        }
    }
}

/// Parámetros de generación ya resueltos (política + overrides del entorno).
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSettings {
    pub policy: InstructionPolicy,
    pub temperature: f64,
    pub max_output_tokens: Option<u64>,
}

impl GenerationSettings {
    pub fn for_policy(policy: InstructionPolicy) -> Self {
        Self {
            policy,
            temperature: policy.default_temperature(),
            max_output_tokens: policy.default_max_output_tokens(),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,

    pub store_backend: StoreBackend,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub fixtures_path: Option<PathBuf>,

    /// Credencial del backend de chat. Puede faltar: cada petición de chat
    /// falla entonces con un error de configuración.
    pub google_api_key: Option<String>,
    pub llm_chat_model: String,
    pub generation: GenerationSettings,

    pub request_timeout: Duration,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

        let store_backend_str =
            env::var("DOCUMENT_STORE").unwrap_or_else(|_| "neo4j".to_string());
        let store_backend = StoreBackend::from_str(&store_backend_str)?;

        let (neo4j_uri, neo4j_user, neo4j_password) = match store_backend {
            StoreBackend::Neo4j => (
                env::var("NEO4J_URI").map_err(|_| anyhow!("Falta NEO4J_URI en el entorno"))?,
                env::var("NEO4J_USER").map_err(|_| anyhow!("Falta NEO4J_USER en el entorno"))?,
                env::var("NEO4J_PASSWORD")
                    .map_err(|_| anyhow!("Falta NEO4J_PASSWORD en el entorno"))?,
            ),
            StoreBackend::Memory => Default::default(),
        };

        let fixtures_path = env::var("NEWSPAPER_FIXTURES").ok().map(PathBuf::from);
        if store_backend == StoreBackend::Memory && fixtures_path.is_none() {
            return Err(anyhow!(
                "Falta NEWSPAPER_FIXTURES en el entorno (requerido con DOCUMENT_STORE=memory)"
            ));
        }

        let google_api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let llm_chat_model = env::var("LLM_CHAT_MODEL")
            .unwrap_or_else(|_| "gemini-2.5-flash-lite".to_string());

        let policy_str = env::var("INSTRUCTION_POLICY").unwrap_or_else(|_| "concise".to_string());
        let generation = resolve_generation(
            InstructionPolicy::from_str(&policy_str)?,
            env::var("CHAT_TEMPERATURE").ok().as_deref(),
            env::var("CHAT_MAX_OUTPUT_TOKENS").ok().as_deref(),
        )?;

        let request_timeout_secs: u64 = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS no es un entero válido: {raw}"))?,
            Err(_) => 60,
        };

        Ok(Self {
            server_addr,
            store_backend,
            neo4j_uri,
            neo4j_user,
            neo4j_password,
            fixtures_path,
            google_api_key,
            llm_chat_model,
            generation,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

#[cfg(test)]
impl AppConfig {
    /// Almacén en memoria, sin credencial y con la política concisa.
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            store_backend: StoreBackend::Memory,
            neo4j_uri: String::new(),
            neo4j_user: String::new(),
            neo4j_password: String::new(),
            fixtures_path: None,
            google_api_key: None,
            llm_chat_model: "gemini-2.5-flash-lite".to_string(),
            generation: GenerationSettings::for_policy(InstructionPolicy::Concise),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Aplica los overrides de temperatura y longitud máxima sobre la política.
fn resolve_generation(
    policy: InstructionPolicy,
    temperature: Option<&str>,
    max_output_tokens: Option<&str>,
) -> Result<GenerationSettings> {
    let mut settings = GenerationSettings::for_policy(policy);

    if let Some(raw) = temperature {
        let value: f64 = raw
            .parse()
            .with_context(|| format!("CHAT_TEMPERATURE no es un número válido: {raw}"))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(anyhow!("CHAT_TEMPERATURE debe estar entre 0 y 1 (recibido {value})"));
        }
        settings.temperature = value;
    }

    if let Some(raw) = max_output_tokens {
        let value: u64 = raw
            .parse()
            .with_context(|| format!("CHAT_MAX_OUTPUT_TOKENS no es un entero válido: {raw}"))?;
        settings.max_output_tokens = Some(value);
    }

    Ok(settings)
}
