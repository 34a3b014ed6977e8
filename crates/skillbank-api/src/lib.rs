//! HTTP surface of the SkillBank wallet: axum handlers, auth middleware and
//! the proof store. Handlers stay thin and hand each request to the ledger on
//! the blocking pool.

pub mod auth;
pub mod charges;
pub mod convert;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod params;
pub mod payments;
pub mod proofs;
pub mod roles;
pub mod routes;
pub mod state;
pub mod wallet;
pub mod withdrawals;

pub use routes::router;
pub use state::{AppState, AppStateInner};
