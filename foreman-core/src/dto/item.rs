//! Approval DTOs
//!
//! The approval gateway delivers one of these per item that cleared its
//! human vote. The item id becomes the job id.

use serde::{Deserialize, Serialize};

/// "Item approved" event from the approval gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedItem {
    /// Opaque, stable identifier of the approved item
    pub item_id: String,
}
