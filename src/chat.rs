//! Petición de chat completa contra un periódico.
//!
//! Flujo:
//!   1. Validar la petición (id y mensaje no vacíos).
//!   2. Resolver el periódico en el almacén. Si no existe, se corta aquí y
//!      el modelo no llega a invocarse.
//!   3. Delegar en `ResponseGenerator` con el historial recibido.
//!
//! Los pasos 2 y 3 comparten un único plazo por petición.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    document_store::DocumentStore,
    error::{AppError, AppResult},
    generator::ResponseGenerator,
    models::{ChatRequest, ChatResponse},
};

pub async fn chat_with_newspaper(
    store: &dyn DocumentStore,
    generator: &ResponseGenerator,
    request: &ChatRequest,
    deadline: Duration,
) -> AppResult<ChatResponse> {
    let newspaper_id = request.newspaper_id.trim();
    if newspaper_id.is_empty() {
        return Err(AppError::InvalidRequest(
            "falta el identificador del periódico".to_string(),
        ));
    }
    if request.message.trim().is_empty() {
        return Err(AppError::InvalidRequest("el mensaje está vacío".to_string()));
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id, newspaper_id);

    let work = async {
        let record = store.fetch(newspaper_id).await?;
        let response = generator
            .respond(&record, &request.history, &request.message)
            .await?;
        Ok::<_, AppError>(ChatResponse { response })
    };

    match timeout(deadline, work).instrument(span.clone()).await {
        Ok(Ok(response)) => {
            span.in_scope(|| info!("Respuesta generada ({} caracteres)", response.response.len()));
            Ok(response)
        }
        Ok(Err(err)) => {
            span.in_scope(|| warn!("La petición de chat falló: {err}"));
            Err(err)
        }
        Err(_) => {
            span.in_scope(|| warn!("La petición de chat superó {deadline:?}"));
            Err(AppError::Timeout(format!(
                "la petición sobre '{newspaper_id}' superó {}s",
                deadline.as_secs_f32()
            )))
        }
    }
}
