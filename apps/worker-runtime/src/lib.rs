// [apps/worker-runtime/src/lib.rs]
/*!
 * =================================================================
 * APARATO: WORKER LIBRARY ROOT (V1.0)
 * CLASIFICACIÓN: ESTRATO L1-WORKER
 * RESPONSABILIDAD: BUCLE DE EJECUCIÓN Y PUNTO DE EXTENSIÓN DE USUARIO
 * =================================================================
 */

pub mod config;
pub mod errors;
pub mod hooks;
pub mod worker;

pub mod prelude {
    pub use crate::config::{ScanConfig, ScanConfigBuilder};
    pub use crate::errors::{ConfigError, WorkerError};
    pub use crate::hooks::{Hooks, RangeBound};
    pub use crate::worker::{Worker, WorkerOutcome};
}

pub use config::{ScanConfig, ScanConfigBuilder};
pub use errors::{ConfigError, WorkerError};
pub use hooks::{Hooks, RangeBound};
pub use worker::{Worker, WorkerOutcome};
