//! Solidity ABI surface shared by the guard and the tooling.
//!
//! The aggregator layout follows the multi-route swapper the guard protects: a swap is a list of
//! sequential `Path` hops, each split across `Route` legs by percentage.

use alloy_primitives::{address, Address};
use alloy_sol_types::sol;

/// Sentinel the aggregator (and the ledger) use for the chain's native asset.
pub const ETH_TOKEN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Route percentages are expressed in basis points of this value.
pub const PERCENT_BASE: u64 = 10_000;

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

sol! {
    /// One leg of a hop: adapter, venue it drives, share of the hop amount.
    struct Route {
        address exchange;
        address targetExchange;
        uint256 percent;
        bytes payload;
        uint256 networkFee;
    }

    /// One sequential hop, ending in token `to`.
    struct Path {
        address to;
        uint256 totalNetworkFee;
        Route[] routes;
    }

    /// Leg of the exact-output entry point.
    struct BuyRoute {
        address exchange;
        address targetExchange;
        uint256 fromAmount;
        uint256 toAmount;
        bytes payload;
        uint256 networkFee;
    }

    interface IAugustusSwapper {
        function multiSwap(
            address fromToken,
            address toToken,
            uint256 fromAmount,
            uint256 toAmount,
            uint256 expectedAmount,
            Path[] path,
            uint256 mintPrice,
            address beneficiary,
            uint256 donationPercentage,
            string referrer
        ) external payable returns (uint256);

        function buy(
            address fromToken,
            address toToken,
            uint256 fromAmount,
            uint256 toAmount,
            uint256 expectedAmount,
            BuyRoute[] route,
            uint256 mintPrice,
            address beneficiary,
            uint256 donationPercentage,
            string referrer
        ) external payable returns (uint256);

        function getTokenTransferProxy() external view returns (address);
    }

    interface ITokenTransferProxy {
        function transferFrom(address token, address from, address to, uint256 amount) external;
    }
}

sol! {
    /// ABI shape of a batched call inside the relayed calldata.
    struct Transaction {
        address to;
        uint256 value;
        bytes data;
    }

    interface IRelayModule {
        function multiCall(address wallet, Transaction[] transactions) external returns (bytes[]);
        function multiCallWithGuardians(address wallet, Transaction[] transactions) external returns (bytes[]);
    }
}
