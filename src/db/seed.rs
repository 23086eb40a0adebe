use tracing::info;

use super::store::{DocumentStore, StoreError};

/// Example diagrams inserted into an empty store
pub const EXAMPLE_DIAGRAMS: [(&str, &str); 3] = [
    (
        "Simple Approval Process",
        include_str!("../../seed/simple_approval.bpmn"),
    ),
    (
        "Order Processing with Gateway",
        include_str!("../../seed/order_processing.bpmn"),
    ),
    (
        "Multi-Step Request Workflow",
        include_str!("../../seed/multi_step_request.bpmn"),
    ),
];

/// Insert the example diagrams when the store holds nothing yet.
/// Returns how many diagrams were inserted.
pub async fn seed_examples(store: &dyn DocumentStore) -> Result<usize, StoreError> {
    if !store.list().await?.is_empty() {
        return Ok(0);
    }

    for (name, xml) in EXAMPLE_DIAGRAMS {
        store.create(name.to_string(), Some(xml.to_string())).await?;
    }
    info!("Seeded {} example diagrams", EXAMPLE_DIAGRAMS.len());
    Ok(EXAMPLE_DIAGRAMS.len())
}
