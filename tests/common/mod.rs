//! Shared helpers for the integration tests

#![allow(dead_code)]

use peerlens::{ConstructionState, DataWarehouse, Period, SessionId, SessionRegistry};

/// Competitors used by the sample analyses, each with one filing
pub const PEERS: [&str; 3] = ["Wells Fargo", "Citibank", "PNC Bank"];

/// Fill `state` so it passes readiness
pub fn fill_ready(state: &mut ConstructionState, name: &str) {
    state.set_name(name);
    state.set_description("Peer benchmarking of regional lenders");
    state.set_period(Period::Q1_2025);
    state.set_data_warehouse(DataWarehouse::Risk);
    state.attach_internal_documents(["internal-q1-2025.xlsx"]);
    for (i, peer) in PEERS.iter().enumerate() {
        state.add_competitor(peer);
        state.attach_competitor_documents(i, [format!("{}-10q.pdf", peer)]);
    }
}

/// Open a session on `registry` already filled with a ready state
pub fn ready_session(registry: &SessionRegistry, name: &str) -> SessionId {
    let id = registry.open();
    registry.edit(&id, |state| fill_ready(state, name));
    id
}
