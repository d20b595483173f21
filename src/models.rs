//! Modelos de dominio (periódicos almacenados y mensajes de conversación).

use serde::{Deserialize, Deserializer, Serialize};

/// Contenido estructurado de un periódico: mapa ordenado de campo a valor
/// (texto, número, mapa anidado o lista).
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Un periódico digitalizado tal y como vive en el almacén.
/// El `id` lo asigna el proceso de ingesta externo y nunca cambia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewspaperRecord {
    pub id: String,
    pub newspaper_name: String,
    /// Etiqueta de fecha tal cual se publicó; no se normaliza.
    pub date: String,
    #[serde(default, deserialize_with = "payload_or_empty")]
    pub full_json_data: Payload,
}

/// `null` cuenta como payload vacío, igual que una clave ausente.
fn payload_or_empty<'de, D>(deserializer: D) -> Result<Payload, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Payload>::deserialize(deserializer)?.unwrap_or_default())
}

impl NewspaperRecord {
    pub fn summary(&self) -> NewspaperSummary {
        NewspaperSummary {
            id: self.id.clone(),
            newspaper_name: self.newspaper_name.clone(),
            date: self.date.clone(),
        }
    }
}

/// Entrada del listado de periódicos (sin el contenido).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewspaperSummary {
    pub id: String,
    pub newspaper_name: String,
    pub date: String,
}

/// Mensaje previo de la conversación, enviado por el cliente en cada petición.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" para el usuario; cualquier otro valor se trata como asistente.
    pub sender: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[cfg(test)]
impl ChatMessage {
    pub fn new(sender: &str, content: &str) -> Self {
        Self {
            sender: sender.to_string(),
            content: content.to_string(),
            id: None,
            timestamp: None,
            kind: None,
        }
    }
}

/// Petición de chat: el historial nunca incluye el mensaje nuevo.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(alias = "document_id", alias = "documentId")]
    pub newspaper_id: String,
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_accepts_frontend_shape() {
        let request: ChatRequest = serde_json::from_value(json!({
            "newspaper_id": "star_of_chile_1904-08-06",
            "message": "Who is mentioned?",
            "history": [
                {"sender": "user", "content": "Hi", "id": "m1", "timestamp": "2024-01-01T10:00:00Z", "type": "text"},
                {"sender": "bot", "content": "Hello"}
            ]
        }))
        .unwrap();

        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[0].kind.as_deref(), Some("text"));
        assert_eq!(request.history[1].id, None);
    }

    #[test]
    fn history_defaults_to_empty() {
        let request: ChatRequest =
            serde_json::from_value(json!({"newspaper_id": "a", "message": "b"})).unwrap();
        assert!(request.history.is_empty());
    }

    #[test]
    fn null_payload_is_empty() {
        let record: NewspaperRecord = serde_json::from_value(json!({
            "id": "x",
            "newspaper_name": "X",
            "date": "1900",
            "full_json_data": null
        }))
        .unwrap();
        assert!(record.full_json_data.is_empty());

        let missing: NewspaperRecord =
            serde_json::from_value(json!({"id": "y", "newspaper_name": "Y", "date": "1900"}))
                .unwrap();
        assert!(missing.full_json_data.is_empty());
    }

    #[test]
    fn payload_keeps_field_order() {
        let record: NewspaperRecord = serde_json::from_value(json!({
            "id": "x",
            "newspaper_name": "X",
            "date": "1900",
            "full_json_data": {"Zeta": 1, "Alpha": 2, "Content": "text"}
        }))
        .unwrap();

        let keys: Vec<&str> = record.full_json_data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Content"]);
    }
}
