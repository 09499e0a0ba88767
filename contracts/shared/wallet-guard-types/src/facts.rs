use alloy_primitives::Address;

/// Read-only view of the trade registries, as consulted by filters.
///
/// Defaults deny, so a partial provider fails closed.
pub trait TradeFacts {
    /// Whether `exchange` (an adapter or a venue it drives) is an authorised swap target.
    fn is_authorised_exchange(&self, _exchange: Address) -> bool {
        false
    }

    /// Whether `token` is marked tradable.
    fn is_tradable(&self, _token: Address) -> bool {
        false
    }
}
