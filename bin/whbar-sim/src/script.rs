//! Script format and execution.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};
use whbar_ledger::{abi::IWHBAR, CallError, LedgerSnapshot, Runtime, Whbar, WhbarEvent};
use whbar_precompile::WhbarConfig;

/// A sequence of calls against a fresh ledger.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct Script {
    /// Ledger address and metadata. Falls back to the environment.
    #[serde(default)]
    pub(crate) config: Option<WhbarConfig>,
    /// Native balances to fund before the first call.
    #[serde(default)]
    pub(crate) accounts: BTreeMap<Address, U256>,
    /// Accounts whose code refuses value, such as contracts without a receive hook.
    #[serde(default)]
    pub(crate) non_payable: Vec<Address>,
    /// Calls to run, in order.
    pub(crate) calls: Vec<Step>,
}

impl Script {
    pub(crate) fn load(path: &Path) -> eyre::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read script {}", path.display()))?;
        serde_json::from_str(&raw)
            .wrap_err_with(|| format!("failed to parse script {}", path.display()))
    }
}

/// One call of a [`Script`].
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Step {
    pub(crate) caller: Address,
    #[serde(flatten)]
    pub(crate) op: Op,
}

/// Entry point invoked by a [`Step`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub(crate) enum Op {
    /// `deposit()` carrying `value` fine units.
    Deposit { value: U256 },
    /// Plain value transfer to the ledger, optionally with unmatched calldata.
    Send {
        value: U256,
        #[serde(default)]
        data: Bytes,
    },
    Withdraw { amount: U256 },
    Transfer { to: Address, amount: U256 },
    Approve { spender: Address, amount: U256 },
    TransferFrom {
        owner: Address,
        to: Address,
        amount: U256,
    },
}

impl Op {
    const fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Send { .. } => "send",
            Self::Withdraw { .. } => "withdraw",
            Self::Transfer { .. } => "transfer",
            Self::Approve { .. } => "approve",
            Self::TransferFrom { .. } => "transferFrom",
        }
    }

    fn value(&self) -> U256 {
        match self {
            Self::Deposit { value } | Self::Send { value, .. } => *value,
            _ => U256::ZERO,
        }
    }

    fn calldata(&self) -> Vec<u8> {
        match self {
            Self::Deposit { .. } => IWHBAR::depositCall {}.abi_encode(),
            Self::Send { data, .. } => data.to_vec(),
            Self::Withdraw { amount } => IWHBAR::withdrawCall { amount: *amount }.abi_encode(),
            Self::Transfer { to, amount } => IWHBAR::transferCall {
                to: *to,
                amount: *amount,
            }
            .abi_encode(),
            Self::Approve { spender, amount } => IWHBAR::approveCall {
                spender: *spender,
                amount: *amount,
            }
            .abi_encode(),
            Self::TransferFrom { owner, to, amount } => IWHBAR::transferFromCall {
                from: *owner,
                to: *to,
                amount: *amount,
            }
            .abi_encode(),
        }
    }
}

/// Outcome of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Status {
    /// The call succeeded.
    Ok,
    /// The call failed and left no trace.
    Reverted,
    /// The call failed after committing state.
    FailedCommitted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StepReport {
    pub(crate) index: usize,
    pub(crate) caller: Address,
    pub(crate) op: &'static str,
    pub(crate) status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) output: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) revert_data: Option<Bytes>,
}

/// Everything a script run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Report {
    pub(crate) contract: Address,
    pub(crate) steps: Vec<StepReport>,
    pub(crate) events: Vec<WhbarEvent>,
    pub(crate) snapshot: LedgerSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) invariant_violation: Option<String>,
}

/// Runs `script` against a fresh runtime hosting the ledger described by `config`.
pub(crate) fn run(script: &Script, config: &WhbarConfig) -> Report {
    let whbar = Whbar::new(config.precompile_address, config.metadata.clone());
    let contract = whbar.contract();
    let mut runtime = Runtime::new(whbar);

    for (account, amount) in &script.accounts {
        runtime.fund(*account, *amount);
    }
    for account in &script.non_payable {
        runtime.deploy_non_payable(*account);
    }

    let mut steps = Vec::with_capacity(script.calls.len());
    for (index, step) in script.calls.iter().enumerate() {
        let result = runtime.call(
            step.caller,
            contract,
            step.op.value(),
            &step.op.calldata(),
        );
        let report = step_report(index, step, result);
        tracing::info!(
            target: "whbar::sim",
            index,
            caller = ?step.caller,
            op = report.op,
            status = ?report.status,
            "call finished"
        );
        steps.push(report);
    }

    let invariant_violation = runtime.audit().err().map(|err| err.to_string());
    if let Some(err) = &invariant_violation {
        tracing::error!(target: "whbar::sim", %err, "ledger invariant violated");
    }

    Report {
        contract,
        steps,
        events: runtime.events().to_vec(),
        snapshot: runtime.snapshot(),
        invariant_violation,
    }
}

fn step_report(index: usize, step: &Step, result: Result<Bytes, CallError>) -> StepReport {
    let mut report = StepReport {
        index,
        caller: step.caller,
        op: step.op.name(),
        status: Status::Ok,
        output: None,
        error: None,
        revert_data: None,
    };

    match result {
        Ok(output) => {
            report.output = (!output.is_empty()).then_some(output);
        }
        Err(err) => {
            report.status = if err.is_committed() {
                Status::FailedCommitted
            } else {
                Status::Reverted
            };
            if let CallError::Ledger(ledger_err) = &err {
                let data = ledger_err.revert_data();
                report.revert_data = (!data.is_empty()).then_some(data);
            }
            report.error = Some(err.to_string());
        }
    }
    report
}
