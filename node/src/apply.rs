//! Ledger state transitions for a single block transaction.
//!
//! Every step re-reads the account it touches, so a transaction whose sender,
//! recipient and beneficiary alias each other still balances. Every touched account's
//! nonce is incremented once per debit or credit.

use tessera_ledger::{BlockHeader, Transaction, TxKind};
use tessera_store::{Account, AccountStore, Token, TokenStore};
use tessera_types::{Address, Amount, ChainId};

use crate::error::{StoreContext, SyncError};

pub(crate) fn apply_transaction<T>(
    txn: &mut T,
    header: &BlockHeader,
    tx: &Transaction,
) -> Result<(), SyncError>
where
    T: AccountStore + TokenStore + ?Sized,
{
    match tx.kind {
        TxKind::Coin => apply_coin(txn, header, tx),
        TxKind::Token => apply_token(txn, header, tx),
    }
}

/// `from` pays `value`, `to` receives `value - fee`, the beneficiary receives `fee`.
fn apply_coin<T>(txn: &mut T, header: &BlockHeader, tx: &Transaction) -> Result<(), SyncError>
where
    T: AccountStore + TokenStore + ?Sized,
{
    let chain_id = header.chain_id;
    let fee = header.transaction_fee;
    let net = tx
        .value
        .checked_sub(fee)
        .ok_or(SyncError::ValueBelowFee {
            value: tx.value,
            fee,
        })?;

    debit(txn, chain_id, tx.from, tx.value, Missing::Fail("coin debit"))?;
    credit(txn, chain_id, tx.to, net, Missing::Create)?;
    credit(
        txn,
        chain_id,
        header.beneficiary,
        fee,
        Missing::Fail("fee deposit"),
    )?;
    tracing::trace!(from = %tx.from, to = %tx.to, value = tx.value, fee, "coin transfer applied");
    Ok(())
}

/// `from` pays the block fee, the token moves to `to` unless a newer move is already
/// stored, the beneficiary receives the fee.
fn apply_token<T>(txn: &mut T, header: &BlockHeader, tx: &Transaction) -> Result<(), SyncError>
where
    T: AccountStore + TokenStore + ?Sized,
{
    let chain_id = header.chain_id;
    let fee = header.transaction_fee;

    debit(txn, chain_id, tx.from, fee, Missing::Create)?;
    ensure_account(txn, chain_id, tx.to)?;
    let token = Token {
        chain_id,
        id: tx.token_id,
        owner: tx.to,
        metadata_uri: tx.token_metadata_uri.clone(),
        nonce: tx.token_nonce.clone(),
    };
    let moved = txn
        .upsert_token_if_not_older(&token)
        .during("token upsert")?;
    if !moved {
        tracing::debug!(token = %tx.token_id, nonce = %tx.token_nonce, "stale token move ignored");
    }
    credit(
        txn,
        chain_id,
        header.beneficiary,
        fee,
        Missing::Fail("fee deposit"),
    )?;
    Ok(())
}

/// What to do when the account to debit or credit does not exist.
#[derive(Clone, Copy)]
pub(crate) enum Missing {
    Create,
    Fail(&'static str),
}

fn load<T>(
    txn: &T,
    chain_id: ChainId,
    address: Address,
    missing: Missing,
) -> Result<Account, SyncError>
where
    T: AccountStore + ?Sized,
{
    match txn.get_account(chain_id, &address).during("account read")? {
        Some(account) => Ok(account),
        None => match missing {
            Missing::Create => Ok(Account::new(chain_id, address)),
            Missing::Fail(operation) => Err(SyncError::MissingAccount { operation, address }),
        },
    }
}

pub(crate) fn debit<T>(
    txn: &mut T,
    chain_id: ChainId,
    address: Address,
    amount: Amount,
    missing: Missing,
) -> Result<(), SyncError>
where
    T: AccountStore + ?Sized,
{
    let mut account = load(txn, chain_id, address, missing)?;
    account.balance =
        account
            .balance
            .checked_sub(amount)
            .ok_or(SyncError::InsufficientBalance {
                address,
                balance: account.balance,
                needed: amount,
            })?;
    account.nonce.increment();
    txn.upsert_account(&account).during("account debit")
}

pub(crate) fn credit<T>(
    txn: &mut T,
    chain_id: ChainId,
    address: Address,
    amount: Amount,
    missing: Missing,
) -> Result<(), SyncError>
where
    T: AccountStore + ?Sized,
{
    let mut account = load(txn, chain_id, address, missing)?;
    account.balance = account
        .balance
        .checked_add(amount)
        .ok_or(SyncError::BalanceOverflow(address))?;
    account.nonce.increment();
    txn.upsert_account(&account).during("account credit")
}

pub(crate) fn ensure_account<T>(
    txn: &mut T,
    chain_id: ChainId,
    address: Address,
) -> Result<(), SyncError>
where
    T: AccountStore + ?Sized,
{
    if txn
        .get_account(chain_id, &address)
        .during("account read")?
        .is_none()
    {
        txn.upsert_account(&Account::new(chain_id, address))
            .during("account create")?;
    }
    Ok(())
}
