// [libs/infra/store/src/schema.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Dos tablas soportan el protocolo completo:
 * - `work_tables`: un registro por (collection, field), con el lease
 *   advisorio y la lista de unidades serializada como JSON.
 * - `documents`: la coleccion de datos externa que el framework escanea;
 *   persistida aqui unicamente para que el adaptador sea ejecutable y
 *   verificable de forma independiente.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument};

const TACTICAL_TABLES: &[(&str, &str)] = &[
    (
        "TABLE_WORK_TABLES",
        r#"
        CREATE TABLE IF NOT EXISTS work_tables (
            collection TEXT NOT NULL,
            field      TEXT NOT NULL,
            lock       INTEGER NOT NULL DEFAULT 0,
            ts         TEXT NOT NULL,
            units      TEXT,
            PRIMARY KEY (collection, field)
        );
    "#,
    ),
    (
        "TABLE_DOCUMENTS",
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id         TEXT NOT NULL,
            payload    TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
    "#,
    ),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[(
    "IDX_WORK_TABLES_LOCK",
    "CREATE INDEX IF NOT EXISTS idx_work_tables_lock ON work_tables(collection, field, lock);",
)];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 * Idempotente: segura de invocar en cada conexión nueva.
 */
#[instrument(skip(database_connection))]
pub async fn apply_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V1.0...");

    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        database_connection
            .execute(sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }

    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        database_connection
            .execute(sql, ())
            .await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }

    info!("✅ [SCHEMA_ENGINE]: Store V1.0 level and certified.");
    Ok(())
}
