use serde::Serialize;

use crate::types::{ChangeVector, Field, VarSlot, ZoneStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VarWrite {
    pub field: Field,
    pub slot: VarSlot,
    pub value: i64,
}

/// One write per changed field, in field order. Unchanged fields are never written.
pub fn plan_writes(
    changes: &ChangeVector,
    status: &ZoneStatus,
    zone_index: u16,
) -> Vec<VarWrite> {
    changes
        .changed_fields()
        .map(|field| VarWrite {
            field,
            slot: field.slot(zone_index),
            value: status.encoded(field),
        })
        .collect()
}
