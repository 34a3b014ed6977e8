use std::sync::Arc;

use skillbank_ledger::Ledger;

use crate::proofs::ProofStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub ledger: Ledger,
    pub jwt_secret: String,
    pub proofs: ProofStore,
    /// Username that receives the owner role when it registers.
    pub owner_username: Option<String>,
}
