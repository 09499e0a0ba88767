//! Policy enforcement for a smart-contract wallet that acts through relayed, batched calls.
//!
//! A relayer submits a signed batch to [`GuardModule::submit_relayed_batch`]. The batch is
//! admitted (nonce freshness, signer threshold), every call is authorised against the dapp
//! registry and its per-target [`Filter`], and only then does anything execute: all calls
//! commit or none do.

pub mod chain;
pub mod clock;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod executor;
pub mod filters;
pub mod gas;
pub mod module;
pub mod registry;
pub mod relay;
pub mod wallet;


pub use chain::{ExecutionContext, ExecutionFault, InMemoryChain};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GuardConfig, PolicyDocument};
pub use errors::{BatchError, NonceError, RegistryError, RelayError, SignatureError, CALL_NOT_AUTHORISED};
pub use executor::{CallBatchExecutor, ExecutionOutcome};
pub use filters::{ApproveOnlyFilter, Filter, SwapAggregatorFilter, TradableCheck};
pub use module::{GuardModule, RelayOutcome};
pub use registry::{Authorisation, DappRegistry, DexRegistry, Registries, TokenPriceRegistry};
pub use wallet::{Wallet, WalletStore};
