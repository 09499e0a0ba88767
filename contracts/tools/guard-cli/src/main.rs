use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{keccak256, Address};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use regex::Regex;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wallet_guard::{decoder::selector, relay::relay_sign_hash, CallBatchExecutor, Clock, PolicyDocument, SystemClock};
use wallet_guard_types::{batch_hash, compose_nonce, nonce_timestamp, Call, RelayedTransaction};

/// Operator tooling for the wallet guard: dry-run batches against a policy document and
/// compute the values clients need to build relayed transactions.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authorise a batch against a policy without executing it, and write a JSON report.
    Check {
        /// Policy document (registries, wallets, config).
        #[arg(long, env = "GUARD_POLICY")]
        policy: PathBuf,

        /// JSON array of calls (`{ "to", "value", "data" }`).
        #[arg(long)]
        batch: PathBuf,

        /// Wallet the batch runs as; must be declared in the policy.
        #[arg(long)]
        wallet: Address,

        /// Evaluation time (unix seconds); defaults to now.
        #[arg(long)]
        now: Option<u64>,

        /// Where to write the report; stdout only if omitted.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the 4-byte selector of a function signature, eg `approve(address,uint256)`.
    Selector { signature: String },

    /// Compose a relay nonce from a timestamp and a sequence number.
    Nonce {
        /// Unix seconds; defaults to now.
        #[arg(long)]
        timestamp: Option<u64>,

        #[arg(long, default_value_t = 0)]
        sequence: u64,
    },

    /// Print the digest signers must sign for a relayed transaction.
    SignHash {
        #[arg(long, env = "GUARD_POLICY")]
        policy: PathBuf,

        /// Relayed transaction JSON.
        #[arg(long)]
        tx: PathBuf,

        /// Address of the guard module.
        #[arg(long, env = "GUARD_MODULE")]
        module: Address,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            policy,
            batch,
            wallet,
            now,
            report,
        } => {
            let now = now.unwrap_or_else(|| SystemClock.now());
            let report_json = check_batch(&policy, &batch, wallet, now)?;
            println!("{}", serde_json::to_string_pretty(&report_json)?);
            if let Some(path) = report {
                write_json_atomic(&path, &report_json)?;
                info!(path = %path.display(), "report written");
            }
        }
        Command::Selector { signature } => {
            println!("0x{}", alloy_primitives::hex::encode(selector_of(&signature)?));
        }
        Command::Nonce { timestamp, sequence } => {
            let timestamp = timestamp.unwrap_or_else(|| SystemClock.now());
            let nonce = compose_nonce(timestamp, sequence);
            println!("{nonce:#x}");
            info!(timestamp = nonce_timestamp(nonce), sequence, "nonce composed");
        }
        Command::SignHash { policy, tx, module } => {
            let policy = load_policy(&policy)?;
            let tx: RelayedTransaction = read_json(&tx)?;
            println!("{}", relay_sign_hash(module, policy.config.chain_id, &tx));
        }
    }
    Ok(())
}

fn check_batch(policy_path: &Path, batch_path: &Path, wallet: Address, now: u64) -> Result<Value> {
    let policy = load_policy(policy_path)?;
    let calls: Vec<Call> = read_json(batch_path)?;

    let registries = policy
        .build_registries(now)
        .context("failed building registries from policy")?;
    let wallets = policy
        .build_wallets(&registries)
        .context("failed building wallets from policy")?;
    let wallet = wallets
        .get(wallet)
        .ok_or_else(|| anyhow!("wallet {wallet} is not declared in {}", policy_path.display()))?;

    let per_call: Vec<Value> = calls
        .iter()
        .enumerate()
        .map(|(index, call)| {
            let auth = registries.authorise(&wallet.lists, wallet.address, call, now);
            json!({
                "index": index,
                "to": call.to,
                "value": call.value,
                "selector": selector(&call.data).ok().map(|s| format!("0x{}", alloy_primitives::hex::encode(s))),
                "authorisation": auth,
            })
        })
        .collect();

    let verdict = CallBatchExecutor::new(&registries).authorise(wallet, &calls, now);
    let authorised = verdict.is_ok();
    let checked_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let mut report = json!({
        "wallet": wallet.address,
        "batch_hash": batch_hash(&calls),
        "evaluated_at": now,
        "checked_at": checked_at,
        "authorised": authorised,
        "calls": per_call,
    });
    if let Err(err) = &verdict {
        report["failure"] = json!({ "index": err.index(), "reason": err.reason() });
    }
    info!(
        wallet = %wallet.address,
        calls = calls.len(),
        authorised,
        "batch checked"
    );
    Ok(report)
}

/// Selector of a canonical signature such as `transfer(address,uint256)`.
fn selector_of(signature: &str) -> Result<[u8; 4]> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\([A-Za-z0-9_,\[\]() ]*\)$")?;
    let signature = signature.trim();
    if !re.is_match(signature) {
        return Err(anyhow!("not a function signature: {signature}"));
    }
    let canonical = signature.replace(' ', "");
    let hash = keccak256(canonical.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&hash[..4]);
    Ok(sel)
}

fn load_policy(path: &Path) -> Result<PolicyDocument> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    PolicyDocument::from_json(&raw).with_context(|| format!("invalid policy in {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed parsing JSON in {}", path.display()))
}

fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised = serde_json::to_string_pretty(value).context("failed serialising report JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
