// src/services/aggregator.rs
use log::{error, info};

use crate::models::{BalanceSnapshot, Credential};
use crate::services::plaid::{AccountBalance, BalanceSource, FetchError};

#[derive(Debug, Clone, Copy)]
enum Slot {
    WellsFargoChecking,
    WellsFargoCredit,
    Robinhood,
    Vanguard,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    LastWriteWins,
    Sum,
}

struct SlotRule {
    institution: &'static str,
    subtype: Option<&'static str>,
    slot: Slot,
    mode: Mode,
}

/// Closed classification table: which institution/subtype pair lands in
/// which snapshot slot, and whether repeats overwrite or add. A subtype
/// of None matches every account the institution returns. Anything not
/// listed here is ignored.
const SLOT_RULES: &[SlotRule] = &[
    SlotRule {
        institution: "wells_fargo",
        subtype: Some("checking"),
        slot: Slot::WellsFargoChecking,
        mode: Mode::LastWriteWins,
    },
    SlotRule {
        institution: "wells_fargo",
        subtype: Some("credit card"),
        slot: Slot::WellsFargoCredit,
        mode: Mode::LastWriteWins,
    },
    SlotRule {
        institution: "robinhood",
        subtype: None,
        slot: Slot::Robinhood,
        mode: Mode::Sum,
    },
    SlotRule {
        institution: "vanguard",
        subtype: None,
        slot: Slot::Vanguard,
        mode: Mode::Sum,
    },
];

/// Outcome of one credential's fetch within an aggregation cycle. On
/// success, carries the number of accounts that matched a slot rule.
#[derive(Debug)]
pub struct InstitutionFetch {
    pub institution: String,
    pub outcome: Result<usize, FetchError>,
}

fn apply_account(snapshot: &mut BalanceSnapshot, institution: &str, account: &AccountBalance) -> bool {
    let subtype = account.subtype.as_deref();

    for rule in SLOT_RULES {
        if rule.institution != institution {
            continue;
        }
        if let Some(wanted) = rule.subtype {
            if subtype != Some(wanted) {
                continue;
            }
        }

        let value = account.current.unwrap_or(0.0);
        let slot = match rule.slot {
            Slot::WellsFargoChecking => &mut snapshot.wells_fargo_checking,
            Slot::WellsFargoCredit => &mut snapshot.wells_fargo_credit,
            Slot::Robinhood => &mut snapshot.robinhood,
            Slot::Vanguard => &mut snapshot.vanguard,
        };
        match rule.mode {
            Mode::LastWriteWins => *slot = value,
            Mode::Sum => *slot += value,
        }
        return true;
    }

    false
}

/// Fetches balances for every stored credential and folds them into
/// one snapshot. Best-effort per institution: a failed fetch is logged,
/// contributes zero, and never aborts the loop.
pub async fn aggregate(
    source: &dyn BalanceSource,
    credentials: &[Credential],
) -> (BalanceSnapshot, Vec<InstitutionFetch>) {
    let mut snapshot = BalanceSnapshot::default();
    let mut fetches = Vec::with_capacity(credentials.len());

    for credential in credentials {
        match source.get_balances(&credential.access_token).await {
            Ok(accounts) => {
                let mut applied = 0;
                for account in &accounts {
                    if apply_account(&mut snapshot, &credential.institution, account) {
                        applied += 1;
                    }
                }
                info!(
                    "{}: classified {} of {} accounts",
                    credential.institution,
                    applied,
                    accounts.len()
                );
                fetches.push(InstitutionFetch {
                    institution: credential.institution.clone(),
                    outcome: Ok(applied),
                });
            }
            Err(e) => {
                error!("{} fetch failed: {}", credential.institution, e);
                fetches.push(InstitutionFetch {
                    institution: credential.institution.clone(),
                    outcome: Err(e),
                });
            }
        }
    }

    snapshot.compute_net_worth();
    (snapshot, fetches)
}
