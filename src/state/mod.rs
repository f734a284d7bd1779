use std::sync::Arc;

use crate::core::{AdmissionPolicy, PollDirectory, VoteLedger};
use crate::store::DocumentStore;

/// Application state carried into request handlers. The store is injected
/// once here and everything downstream borrows it; there are no ambient
/// store singletons.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub polls: Arc<PollDirectory>,
    pub ledger: Arc<VoteLedger>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, policy: AdmissionPolicy) -> Self {
        let polls = Arc::new(PollDirectory::new(Arc::clone(&store)));
        let ledger = Arc::new(VoteLedger::new(Arc::clone(&store), policy));
        Self {
            store,
            polls,
            ledger,
        }
    }
}
