use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wallet_guard_types::Call;

use crate::decoder::{decode_token_action, TokenAction};

/// Lets the wallet grant allowances to one spender (the swap proxy) and nothing else.
///
/// Registered on the token contracts the wallet may sell, this keeps the approval channel from
/// being used to move tokens out directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveOnlyFilter {
    pub spender: Address,
}

impl ApproveOnlyFilter {
    pub fn new(spender: Address) -> Self {
        Self { spender }
    }

    pub fn validate(&self, call: &Call) -> bool {
        if call.value != U256::ZERO {
            debug!(to = %call.to, "approve-only: native value attached");
            return false;
        }
        match decode_token_action(&call.data) {
            Ok(TokenAction::Approve { spender, .. }) if spender == self.spender => true,
            Ok(TokenAction::Approve { spender, .. }) => {
                debug!(to = %call.to, %spender, "approve-only: unexpected spender");
                false
            }
            Ok(action) => {
                debug!(to = %call.to, ?action, "approve-only: not an approval");
                false
            }
            Err(err) => {
                debug!(to = %call.to, %err, "approve-only: undecodable payload");
                false
            }
        }
    }
}
