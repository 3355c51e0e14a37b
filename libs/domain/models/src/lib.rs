// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COORDINATION DOMAIN MODELS (V1.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE CONTRATOS SOBERANOS DEL PROTOCOLO
 *                  DE COORDINACIÓN (Range, Unit, WorkTable)
 *
 * Estos tipos son agnosticos del almacen subyacente: ninguna
 * dependencia hacia libsql vive en este estrato.
 * =================================================================
 */

pub mod range;
pub mod unit;
pub mod work_table;
pub mod worker_id;

pub use range::{compare_keys, KeyOrdering};
pub use unit::{Unit, UnitStatus};
pub use work_table::WorkTable;
pub use worker_id::WorkerId;
