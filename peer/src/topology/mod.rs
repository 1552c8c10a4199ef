mod reconciler;

pub use reconciler::{TopologyAction, TopologyReconciler};
