// [libs/infra/store/src/errors.rs]
/*!
 * =================================================================
 * APARATO: STORE ERROR CATALOG (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Error de enlace físico o de red con el motor libSQL.
    #[error("[L3_DB_NET_FAULT]: connection failed -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (URL vacía o malformada).
    #[error("[L3_DB_CONFIG_FAULT]: invalid configuration -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: query rejected -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: mapping violation -> {0}")]
    MappingError(String),

    /// Violación de unicidad en `insert_unique` — el registro ya existe.
    #[error("[L3_DB_CONFLICT]: duplicate key")]
    DuplicateKey,

    /// El registro solicitado no existe.
    #[error("[L3_DB_FAULT]: record not found")]
    NotFound,

    /// El campo de partición solicitado no está presente en un documento.
    #[error("[L3_DB_FAULT]: split field '{0}' missing on document '{1}'")]
    MissingSplitField(String, String),
}
