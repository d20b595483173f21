//! Dobles de prueba compartidos por los tests de los módulos.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    llm::{ChatBackend, ChatInvocation},
    models::NewspaperRecord,
};

/// Backend que registra cada invocación y devuelve una respuesta fija.
pub struct RecordingBackend {
    configured: bool,
    reply: Result<String, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<ChatInvocation>>,
}

impl RecordingBackend {
    pub fn replying(reply: &str) -> Self {
        Self {
            configured: true,
            reply: Ok(reply.to_string()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            ..Self::replying("")
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::replying("nunca")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ChatInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn chat(&self, invocation: ChatInvocation) -> AppResult<String> {
        self.calls.lock().unwrap().push(invocation);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(AppError::Generation)
    }
}

pub fn star_of_chile() -> NewspaperRecord {
    newspaper("star_of_chile_1904-08-06", "Star of Chile", "1904-08-06")
}

pub fn newspaper(id: &str, name: &str, date: &str) -> NewspaperRecord {
    serde_json::from_value(json!({
        "id": id,
        "newspaper_name": name,
        "date": date,
        "full_json_data": {
            "Content": format!("Articles printed by {name} on {date}."),
            "Markdown": "<raw>"
        }
    }))
    .unwrap()
}
