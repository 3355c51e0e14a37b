// [libs/infra/store/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INFRA STORE (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 *
 * Motor A: adaptador de document-store minimalista sobre libSQL. Expone
 * el contrato `StoreAdapter` que el resto del workspace consume sin
 * conocer SQL.
 * =================================================================
 */

pub mod adapter;
pub mod client;
pub mod errors;
pub mod libsql_store;
pub mod schema;

pub use adapter::{CollectionStats, DocumentStream, ScannedDocument, StoreAdapter};
pub use client::StoreClient;
pub use errors::StoreError;
pub use libsql_store::LibsqlStore;
