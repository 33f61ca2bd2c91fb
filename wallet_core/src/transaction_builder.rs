//! Pure transaction construction against the wallet's local view of the ledger.
//!
//! Builders check what the wallet can know locally (its own balance, token ownership,
//! the current fee). The authority remains the final judge.

use tessera_ledger::Transaction;
use tessera_store::{Account, Token};
use tessera_types::{Address, Amount, ChainId};

use crate::error::WalletError;

/// Coin transfer of `value` from `account`. The recipient receives `value - fee`.
pub fn build_coin_transfer(
    chain_id: ChainId,
    account: &Account,
    to: Address,
    value: Amount,
    fee: Amount,
) -> Result<Transaction, WalletError> {
    if to == account.address {
        return Err(WalletError::SelfTransfer(to));
    }
    if value <= fee {
        return Err(WalletError::ValueNotAboveFee { value, fee });
    }
    if account.balance < value {
        return Err(WalletError::InsufficientBalance {
            needed: value,
            available: account.balance,
        });
    }
    Ok(Transaction::coin(
        chain_id,
        account.nonce.clone(),
        account.address,
        to,
        value,
    ))
}

/// Ownership transfer of `token` to `to`, paying `fee`. `Address::ZERO` burns it.
pub fn build_token_transfer(
    chain_id: ChainId,
    account: &Account,
    token: &Token,
    to: Address,
    fee: Amount,
) -> Result<Transaction, WalletError> {
    if token.owner != account.address {
        return Err(WalletError::TokenNotOwned {
            token_id: token.id,
            owner: token.owner,
        });
    }
    if to == account.address {
        return Err(WalletError::SelfTransfer(to));
    }
    if account.balance < fee {
        return Err(WalletError::InsufficientBalance {
            needed: fee,
            available: account.balance,
        });
    }
    Ok(Transaction::token(
        chain_id,
        account.nonce.clone(),
        account.address,
        to,
        fee,
        token.id,
        token.metadata_uri.clone(),
        token.nonce.next(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_ledger::TxKind;
    use tessera_types::{Nonce, TokenId};

    const CHAIN: ChainId = ChainId::new(4);

    fn account(balance: Amount) -> Account {
        Account {
            chain_id: CHAIN,
            address: Address::new([1; 20]),
            balance,
            nonce: Nonce::from(7u64),
        }
    }

    fn token(owner: Address) -> Token {
        Token {
            chain_id: CHAIN,
            id: TokenId::new(3),
            owner,
            metadata_uri: "ipfs://three".into(),
            nonce: Nonce::from(4u64),
        }
    }

    #[test]
    fn coin_transfer_uses_account_nonce() {
        let tx = build_coin_transfer(CHAIN, &account(100), Address::new([2; 20]), 60, 5).unwrap();
        assert_eq!(tx.kind, TxKind::Coin);
        assert_eq!(tx.nonce, Nonce::from(7u64));
        assert_eq!(tx.value, 60);
    }

    #[test]
    fn coin_transfer_checks() {
        let to = Address::new([2; 20]);
        assert!(matches!(
            build_coin_transfer(CHAIN, &account(100), to, 5, 5),
            Err(WalletError::ValueNotAboveFee { value: 5, fee: 5 })
        ));
        assert!(matches!(
            build_coin_transfer(CHAIN, &account(100), to, 101, 5),
            Err(WalletError::InsufficientBalance { needed: 101, available: 100 })
        ));
        let own = account(100).address;
        assert!(matches!(
            build_coin_transfer(CHAIN, &account(100), own, 50, 5),
            Err(WalletError::SelfTransfer(_))
        ));
        // The whole balance may be sent.
        build_coin_transfer(CHAIN, &account(100), to, 100, 5).unwrap();
    }

    #[test]
    fn token_transfer_bumps_token_nonce_and_carries_fee() {
        let acct = account(10);
        let tx = build_token_transfer(CHAIN, &acct, &token(acct.address), Address::ZERO, 5).unwrap();
        assert_eq!(tx.kind, TxKind::Token);
        assert_eq!(tx.token_nonce, Nonce::from(5u64));
        assert_eq!(tx.value, 5);
        assert_eq!(tx.token_metadata_uri, "ipfs://three");
    }

    #[test]
    fn token_transfer_requires_ownership_and_fee() {
        let acct = account(10);
        assert!(matches!(
            build_token_transfer(CHAIN, &acct, &token(Address::new([9; 20])), Address::ZERO, 5),
            Err(WalletError::TokenNotOwned { .. })
        ));
        assert!(matches!(
            build_token_transfer(CHAIN, &account(4), &token(acct.address), Address::ZERO, 5),
            Err(WalletError::InsufficientBalance { needed: 5, available: 4 })
        ));
    }
}
