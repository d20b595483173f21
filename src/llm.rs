//! Abstracción sobre Rig para conversar con el proveedor de LLM.
//!
//! El resto de la aplicación sólo ve el trait `ChatBackend`; la
//! implementación real (`GeminiBackend`) se construye una única vez al
//! arrancar y se comparte por referencia.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use rig::completion::{Chat, Message};
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::ChatMessage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Un turno previo en el formato que entiende el modelo.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    /// Sólo `"user"` es el usuario; cualquier otro remitente es el asistente.
    pub fn from_message(message: &ChatMessage) -> Self {
        let role = if message.sender == "user" {
            Role::User
        } else {
            Role::Assistant
        };
        Self {
            role,
            text: message.content.clone(),
        }
    }

    fn into_rig(self) -> Message {
        match self.role {
            Role::User => Message::user(self.text),
            Role::Assistant => Message::assistant(self.text),
        }
    }
}

/// Todo lo necesario para una sesión de chat: se crea por petición y se
/// descarta al terminar.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatInvocation {
    pub system_instruction: String,
    pub history: Vec<Turn>,
    pub message: String,
    pub temperature: f64,
    pub max_output_tokens: Option<u64>,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;

    /// `false` cuando falta la credencial; no se debe llamar a `chat`.
    fn is_configured(&self) -> bool;

    async fn chat(&self, invocation: ChatInvocation) -> AppResult<String>;
}

// ---------------------------------------------------------------------
// GEMINI (vía Rig)
// ---------------------------------------------------------------------

pub struct GeminiBackend {
    client: Option<rig::providers::gemini::Client>,
    model: String,
}

impl GeminiBackend {
    pub fn from_config(cfg: &AppConfig) -> Self {
        use rig::providers::gemini;

        let client = match cfg.google_api_key.as_deref() {
            Some(key) => Some(gemini::Client::new(key)),
            None => {
                warn!("GOOGLE_API_KEY no definida: las peticiones de chat fallarán.");
                None
            }
        };

        Self {
            client,
            model: cfg.llm_chat_model.clone(),
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn chat(&self, invocation: ChatInvocation) -> AppResult<String> {
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AppError::Configuration("GOOGLE_API_KEY no definida".to_string()))?;

        let mut builder = client
            .agent(&self.model)
            .preamble(&invocation.system_instruction)
            .temperature(invocation.temperature);
        if let Some(max_tokens) = invocation.max_output_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        let agent = builder.build();

        let history: Vec<Message> = invocation.history.into_iter().map(Turn::into_rig).collect();
        debug!(
            "Enviando mensaje a {} con {} turnos previos",
            self.model,
            history.len()
        );

        agent
            .chat(Message::user(invocation.message), history)
            .await
            .map_err(|e| AppError::Generation(e.to_string()))
    }
}

static BACKEND: OnceLock<Arc<GeminiBackend>> = OnceLock::new();

/// Devuelve el backend del proceso, creándolo en la primera llamada.
/// Las llamadas posteriores reutilizan el mismo cliente.
pub fn shared_backend(cfg: &AppConfig) -> Arc<GeminiBackend> {
    if let Some(backend) = BACKEND.get() {
        debug!("Backend de LLM ya inicializado, se reutiliza.");
        return backend.clone();
    }

    BACKEND
        .get_or_init(|| {
            info!("Inicializando backend de LLM ({})", cfg.llm_chat_model);
            Arc::new(GeminiBackend::from_config(cfg))
        })
        .clone()
}
