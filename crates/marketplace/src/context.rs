//! Identity context of a single invocation.

use serde::{Deserialize, Serialize};

use coursemart_core::{Amount, PrincipalId};

/// Who is calling, and how much value rides along with the call.
///
/// Produced by the transport layer from an already-authenticated principal.
/// The ledger never authenticates; it only consumes this.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    caller: PrincipalId,
    attached_value: Amount,
}

impl CallContext {
    /// A call with no value attached.
    pub fn new(caller: PrincipalId) -> Self {
        Self {
            caller,
            attached_value: 0,
        }
    }

    pub fn with_value(caller: PrincipalId, attached_value: Amount) -> Self {
        Self {
            caller,
            attached_value,
        }
    }

    pub fn caller(&self) -> PrincipalId {
        self.caller
    }

    pub fn attached_value(&self) -> Amount {
        self.attached_value
    }

    pub fn carries_value(&self) -> bool {
        self.attached_value > 0
    }
}
