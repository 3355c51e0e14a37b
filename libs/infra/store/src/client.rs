// [libs/infra/store/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y PERSISTENCIA ACID
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Para garantizar que el esquema sea visible entre conexiones en modo RAM,
 * el cliente detecta URLs de memoria y retiene un ancla de persistencia
 * antes de abrir conexiones de trabajo adicionales.
 * =================================================================
 */

use crate::errors::StoreError;
use crate::schema::apply_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct StoreClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene la base de datos viva en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(database_access_token))]
    pub async fn connect(
        database_connection_url: &str,
        database_access_token: Option<String>,
    ) -> Result<Self, StoreError> {
        if database_connection_url.is_empty() {
            return Err(StoreError::ConfigurationError(
                "DATABASE_URL_UNDEFINED".into(),
            ));
        }

        info!(
            "🔌 [DATABASE]: Initiating link synchronization to [{}]",
            database_connection_url
        );

        let is_remote = database_connection_url.starts_with("libsql://")
            || database_connection_url.starts_with("https://");

        let is_memory = database_connection_url.contains(":memory:")
            || database_connection_url.contains("mode=memory");

        let database_driver = if is_remote {
            let token = database_access_token.ok_or_else(|| {
                StoreError::ConfigurationError("remote access denied: token missing".into())
            })?;
            Builder::new_remote(database_connection_url.to_string(), token)
                .build()
                .await
        } else {
            Builder::new_local(database_connection_url).build().await
        }
        .map_err(|e| StoreError::ConnectionError(format!("driver ignition failure: {}", e)))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if is_memory {
            // En modo memoria abrimos el ancla ANTES de cualquier otra operación
            // y aplicamos el esquema directamente sobre ella, para que las
            // tablas sigan siendo visibles a conexiones posteriores.
            let anchor_conn = shared_driver
                .connect()
                .map_err(|e| StoreError::ConnectionError(format!("anchor fault: {}", e)))?;
            apply_schema(&anchor_conn)
                .await
                .map_err(|e| StoreError::ConnectionError(format!("schema sync fault: {}", e)))?;
            anchor = Some(Arc::new(anchor_conn));
            info!("⚓ [DATABASE]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_conn = shared_driver
                .connect()
                .map_err(|e| StoreError::ConnectionError(format!("bootstrap link fault: {}", e)))?;
            apply_schema(&bootstrap_conn)
                .await
                .map_err(|e| StoreError::ConnectionError(format!("schema sync fault: {}", e)))?;
        }

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, StoreError> {
        self.internal_database_driver.connect().map_err(|e| {
            error!("⚠️ [POOL_FAULT]: Connection allocation failed: {}", e);
            StoreError::ConnectionError(e.to_string())
        })
    }
}
