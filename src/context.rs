//! Contexto de ejecución que ancla al modelo a un único periódico.
//!
//! Flujo:
//!   1. `sanitize` proyecta el registro a su forma reducida: nombre, fecha y
//!      el payload sin los campos de markup bruto (duplican `Content`).
//!   2. `build_system_instruction` rellena la plantilla de la política
//!      elegida con el contexto serializado.
//!
//! Ambos pasos son puros y se recalculan en cada petición.

use serde::Serialize;

use crate::{
    config::InstructionPolicy,
    models::{NewspaperRecord, Payload},
};

/// Campos del payload que nunca llegan al modelo.
pub const EXCLUDED_FIELDS: &[&str] = &["Markdown"];

/// Campo del payload que contiene el cuerpo de los artículos.
pub const CONTENT_FIELD: &str = "Content";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedContext {
    pub newspaper_name: String,
    pub date: String,
    pub data: Payload,
}

impl SanitizedContext {
    /// Representación textual que se incrusta en la instrucción.
    pub fn to_text(&self) -> String {
        // Un struct con claves String y valores JSON siempre serializa.
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub fn sanitize(record: &NewspaperRecord) -> SanitizedContext {
    let data = record
        .full_json_data
        .iter()
        .filter(|(field, _)| !EXCLUDED_FIELDS.contains(&field.as_str()))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();

    SanitizedContext {
        newspaper_name: record.newspaper_name.clone(),
        date: record.date.clone(),
        data,
    }
}

pub fn build_system_instruction(context: &SanitizedContext, policy: InstructionPolicy) -> String {
    let rules = match policy {
        InstructionPolicy::Concise => concise_rules(CONTENT_FIELD),
        InstructionPolicy::Analytical => analytical_rules(CONTENT_FIELD),
    };

    format!(
        r#"You are a historical newspaper analysis assistant.

CONTEXT:
You are analyzing the newspaper "{name}" from {date}.

STRUCTURED DATA:
{data}

INSTRUCTIONS:
{rules}"#,
        name = context.newspaper_name,
        date = context.date,
        data = context.to_text(),
    )
}

fn concise_rules(content: &str) -> String {
    format!(
        r#"1. Answer ONLY based on the structured data provided above. Do not use outside knowledge.
2. The '{content}' field contains the actual articles.
3. If asked for a summary, synthesize the articles in '{content}'.
4. If the requested information is not present in the data, say so explicitly.
5. For questions about the issue itself (how many articles, which is longest, comparisons), reason over the supplied text."#
    )
}

fn analytical_rules(content: &str) -> String {
    format!(
        r#"1. Answer ONLY based on the structured data provided above. Do not use outside knowledge.
2. The '{content}' field contains the actual articles; treat it as the primary source.
3. If the requested information is not present in the data, say so explicitly instead of guessing.
4. Long, detailed answers are welcome when the question calls for them.
5. This is a multi-turn conversation: resolve references such as "it", "that article" or "the second one" against the previous turns.
6. You may analyze the text itself: count articles, estimate word counts, identify the longest or shortest article and compare articles, always by reasoning over the supplied text.
7. When summarizing, synthesize the articles in '{content}' and mention their headlines when available."#
    )
}
