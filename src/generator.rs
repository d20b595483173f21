//! Generación de respuestas ancladas a un periódico.
//!
//! Flujo por petición:
//!   1. Comprobar que el backend tiene credencial (antes de cualquier red).
//!   2. Sanear el registro y construir la instrucción de sistema.
//!   3. Traducir el historial a turnos del modelo, en el mismo orden.
//!   4. Abrir una sesión nueva con la instrucción + historial y enviar el mensaje.
//!   5. Devolver el texto tal cual.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    config::GenerationSettings,
    context::{build_system_instruction, sanitize},
    error::{AppError, AppResult},
    llm::{ChatBackend, ChatInvocation, Turn},
    models::{ChatMessage, NewspaperRecord},
};

pub struct ResponseGenerator {
    backend: Arc<dyn ChatBackend>,
    settings: GenerationSettings,
}

impl ResponseGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: GenerationSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub async fn respond(
        &self,
        record: &NewspaperRecord,
        history: &[ChatMessage],
        message: &str,
    ) -> AppResult<String> {
        let invocation = self.prepare(record, history, message)?;

        info!(
            "Consultando {} sobre '{}' ({} turnos previos)",
            self.backend.name(),
            record.id,
            invocation.history.len()
        );
        let reply = self.backend.chat(invocation).await?;

        if reply.trim().is_empty() {
            return Err(AppError::Generation(
                "el modelo devolvió una respuesta vacía".to_string(),
            ));
        }
        Ok(reply)
    }

    /// Construye la invocación sin tocar la red.
    pub fn prepare(
        &self,
        record: &NewspaperRecord,
        history: &[ChatMessage],
        message: &str,
    ) -> AppResult<ChatInvocation> {
        if !self.backend.is_configured() {
            return Err(AppError::Configuration(format!(
                "el backend '{}' no tiene credencial (GOOGLE_API_KEY)",
                self.backend.name()
            )));
        }

        let context = sanitize(record);
        let system_instruction = build_system_instruction(&context, self.settings.policy);
        debug!("Instrucción de sistema para '{}':\n{}", record.id, system_instruction);

        Ok(ChatInvocation {
            system_instruction,
            history: history.iter().map(Turn::from_message).collect(),
            message: message.to_string(),
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstructionPolicy;
    use crate::llm::Role;
    use crate::test_helpers::{newspaper, star_of_chile, RecordingBackend};

    fn generator(backend: Arc<RecordingBackend>) -> ResponseGenerator {
        ResponseGenerator::new(
            backend,
            GenerationSettings::for_policy(InstructionPolicy::Concise),
        )
    }

    #[tokio::test]
    async fn summarize_scenario_passes_reply_through() {
        let backend = Arc::new(RecordingBackend::replying("Una edición sobre navegación."));
        let reply = generator(backend.clone())
            .respond(&star_of_chile(), &[], "Summarize this issue")
            .await
            .unwrap();

        assert_eq!(reply, "Una edición sobre navegación.");

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert!(call.history.is_empty());
        assert!(!call.system_instruction.is_empty());
        assert!(call.system_instruction.contains("Star of Chile"));
        assert!(call.system_instruction.contains("1904-08-06"));
        assert!(call.system_instruction.contains("Content"));
        assert!(!call.system_instruction.contains("Markdown"));
        assert!(!call.system_instruction.contains("<raw>"));
        assert_eq!(call.message, "Summarize this issue");
        assert_eq!(call.temperature, 0.5);
        assert_eq!(call.max_output_tokens, None);
    }

    #[tokio::test]
    async fn history_is_replayed_in_order() {
        let backend = Arc::new(RecordingBackend::replying("ok"));
        let history = vec![
            ChatMessage::new("user", "first"),
            ChatMessage::new("bot", "second"),
            ChatMessage::new("user", "third"),
            ChatMessage::new("assistant", "fourth"),
        ];

        generator(backend.clone())
            .respond(&star_of_chile(), &history, "fifth")
            .await
            .unwrap();

        let turns = &backend.calls()[0].history;
        let replayed: Vec<(Role, &str)> = turns.iter().map(|t| (t.role, t.text.as_str())).collect();
        assert_eq!(
            replayed,
            vec![
                (Role::User, "first"),
                (Role::Assistant, "second"),
                (Role::User, "third"),
                (Role::Assistant, "fourth"),
            ]
        );
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_call() {
        let backend = Arc::new(RecordingBackend::unconfigured());
        let err = generator(backend.clone())
            .respond(&star_of_chile(), &[], "Hola")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_is_a_generation_error() {
        let backend = Arc::new(RecordingBackend::failing("429 rate limited"));
        let err = generator(backend)
            .respond(&star_of_chile(), &[], "Hola")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Generation(msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn blank_reply_is_rejected() {
        let backend = Arc::new(RecordingBackend::replying("  \n"));
        let err = generator(backend)
            .respond(&star_of_chile(), &[], "Hola")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn analytical_policy_sets_generation_parameters() {
        let backend = Arc::new(RecordingBackend::replying("ok"));
        let generator = ResponseGenerator::new(
            backend.clone(),
            GenerationSettings::for_policy(InstructionPolicy::Analytical),
        );

        generator.respond(&star_of_chile(), &[], "Which article is longest?").await.unwrap();

        let call = &backend.calls()[0];
        assert_eq!(call.temperature, 0.7);
        assert_eq!(call.max_output_tokens, Some(2048));
        assert!(call.system_instruction.contains("that article"));
    }

    #[tokio::test]
    async fn concurrent_requests_do_not_share_context() {
        let backend = Arc::new(RecordingBackend::replying("ok"));
        let generator = generator(backend.clone());
        let chile = star_of_chile();
        let herald = newspaper("valparaiso_herald_1899-01-02", "Valparaiso Herald", "1899-01-02");

        let (a, b) = futures::join!(
            generator.respond(&chile, &[], "about chile"),
            generator.respond(&herald, &[], "about herald"),
        );
        a.unwrap();
        b.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        let instruction_for = |message: &str| {
            calls
                .iter()
                .find(|call| call.message == message)
                .map(|call| call.system_instruction.clone())
                .unwrap()
        };

        let chile_instruction = instruction_for("about chile");
        let herald_instruction = instruction_for("about herald");
        assert!(chile_instruction.contains("Star of Chile"));
        assert!(!chile_instruction.contains("Valparaiso Herald"));
        assert!(herald_instruction.contains("Valparaiso Herald"));
        assert!(!herald_instruction.contains("Star of Chile"));
    }
}
