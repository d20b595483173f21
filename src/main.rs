// Módulos de la aplicación
mod api;
mod app_state;
mod chat;
mod config;
mod context;
mod document_store;
mod error;
mod generator;
mod llm;
mod models;
mod neo4j_client;
#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    app_state::AppState,
    config::StoreBackend,
    document_store::{DocumentStore, MemoryStore, Neo4jStore},
    generator::ResponseGenerator,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env()?;

    // 3. Abrir el almacén de periódicos
    let store: Arc<dyn DocumentStore> = match cfg.store_backend {
        StoreBackend::Neo4j => {
            let graph = neo4j_client::connect_from_config(&cfg).await?;
            neo4j_client::check_schema(&graph).await;
            Arc::new(Neo4jStore::new(graph))
        }
        StoreBackend::Memory => {
            // from_env garantiza la ruta con DOCUMENT_STORE=memory
            let path = cfg.fixtures_path.clone().unwrap_or_default();
            Arc::new(MemoryStore::from_file(&path)?)
        }
    };

    // 4. Inicializar el backend de LLM (una sola vez por proceso)
    let backend = llm::shared_backend(&cfg);
    let generator = ResponseGenerator::new(backend, cfg.generation.clone());
    info!(
        "Política de instrucciones: {:?} (temperatura {}, máx. tokens {:?})",
        generator.settings().policy,
        generator.settings().temperature,
        generator.settings().max_output_tokens
    );

    // 5. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        store,
        generator: Arc::new(generator),
        started_at: Utc::now(),
    };

    // 6. Configurar el router de la API
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 7. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr).await?;
    info!("🚀 Servidor escuchando en http://{}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
