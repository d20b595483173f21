use crate::config::AppConfig;
use anyhow::Result;
use neo4rs::{query, Graph};
use tracing::{info, warn};
use url::Url;

/// Abre la conexión al grafo donde la ingesta guarda los `:Newspaper`.
/// Sólo se admite host y puerto del URI; el esquema (`bolt://`, `neo4j://`)
/// se ignora.
pub async fn connect_from_config(cfg: &AppConfig) -> Result<Graph> {
    let url = Url::parse(&cfg.neo4j_uri)?;
    let addr = format!(
        "{}:{}",
        url.host_str().unwrap_or("localhost"),
        url.port().unwrap_or(7687)
    );

    info!("Conectando al almacén de periódicos (Neo4j) en {addr} como '{}'...", cfg.neo4j_user);
    let graph = Graph::new(&addr, &cfg.neo4j_user, &cfg.neo4j_password).await?;
    info!("Almacén de periódicos disponible en {addr}");
    Ok(graph)
}

/// Comprueba, sin modificar nada, que existe la restricción de unicidad
/// sobre `:Newspaper(id)`. El esquema es de la ingesta: aquí sólo se avisa.
pub async fn check_schema(graph: &Graph) {
    let constraints = async {
        let mut cursor = graph
            .execute(query(
                "SHOW CONSTRAINTS YIELD labelsOrTypes, properties
                 WHERE 'Newspaper' IN labelsOrTypes AND 'id' IN properties
                 RETURN count(*) AS total",
            ))
            .await?;
        let total = match cursor.next().await? {
            Some(row) => row.get::<i64>("total").unwrap_or(0),
            None => 0,
        };
        Ok::<_, neo4rs::Error>(total)
    };

    match schema_warning(constraints.await) {
        Some(message) => warn!("{message}"),
        None => info!("Restricción :Newspaper(id) presente."),
    }
}

fn schema_warning(constraints: std::result::Result<i64, neo4rs::Error>) -> Option<String> {
    match constraints {
        Ok(0) => Some(
            "No hay restricción de unicidad sobre :Newspaper(id); los ids duplicados \
             devolverán el primer nodo encontrado."
                .to_string(),
        ),
        Ok(_) => None,
        Err(e) => Some(format!("No se pudo consultar el esquema de Neo4j: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_only_when_constraint_is_missing() {
        assert!(schema_warning(Ok(1)).is_none());
        assert!(schema_warning(Ok(0)).unwrap().contains(":Newspaper(id)"));
    }
}
