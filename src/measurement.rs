use std::sync::Arc;

use crate::id::Id;

/// A single point-in-time sample extracted from a meter. Created fresh each
/// send cycle and discarded after encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub id: Arc<Id>,
    pub value: f64,
}

impl Measurement {
    pub fn new(id: Arc<Id>, value: f64) -> Self {
        Self { id, value }
    }
}
