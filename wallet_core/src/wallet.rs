//! A wallet bound to one chain, one local replica and one authority.
//!
//! Every outgoing transaction goes through the same path: admission gate → build → sign
//! → persist as pending and commit → submit. The pending record is committed before any
//! network I/O, so a crash after submission is still visible through [`Wallet::pending`]
//! and cleared by the sync engine once the transaction lands in a block.

use tessera_ledger::{MempoolTransaction, PendingTransaction, SignedTransaction, Transaction};
use tessera_network::{AuthorityClient, AuthorityError};
use tessera_store::{
    Account, AccountStore, ChainStateStore, LedgerStore, LedgerTxn, PendingTxStore, Token, TokenStore,
};
use tessera_types::{Address, Amount, ChainId, KeyPair, Nonce, TokenId, TxHash};

use crate::error::{StoreContext, WalletError};
use crate::keys::address_of;
use crate::portfolio::{PendingSummary, Portfolio};
use crate::transaction_builder::{build_coin_transfer, build_token_transfer};

/// A transaction accepted by the authority's mempool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub hash: TxHash,
    pub nonce: Nonce,
}

pub struct Wallet<S, A> {
    keys: KeyPair,
    address: Address,
    chain_id: ChainId,
    store: S,
    authority: A,
}

impl<S: LedgerStore, A: AuthorityClient> Wallet<S, A> {
    pub fn new(keys: KeyPair, chain_id: ChainId, store: S, authority: A) -> Result<Self, WalletError> {
        if !chain_id.is_valid() {
            return Err(WalletError::ZeroChainId);
        }
        let address = address_of(&keys);
        Ok(Self {
            keys,
            address,
            chain_id,
            store,
            authority,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Send `value` coins to `to`. The recipient is credited `value` minus the fee.
    pub async fn transfer(&self, to: Address, value: Amount) -> Result<Submission, WalletError> {
        let txn = self.store.begin().during("begin transfer")?;
        let (account, fee) = self.admit(&txn)?;
        let tx = build_coin_transfer(self.chain_id, &account, to, value, fee)?;
        tracing::info!(%to, value, fee, nonce = %tx.nonce, "coin transfer built");
        self.sign_and_submit(txn, tx).await
    }

    /// Hand `token_id` to `to`.
    pub async fn transfer_token(&self, to: Address, token_id: TokenId) -> Result<Submission, WalletError> {
        let txn = self.store.begin().during("begin token transfer")?;
        let (account, fee) = self.admit(&txn)?;
        let token = self.owned_token(&txn, token_id)?;
        let tx = build_token_transfer(self.chain_id, &account, &token, to, fee)?;
        tracing::info!(%to, token = %token_id, fee, nonce = %tx.nonce, "token transfer built");
        self.sign_and_submit(txn, tx).await
    }

    /// Give `token_id` to the zero address.
    pub async fn burn_token(&self, token_id: TokenId) -> Result<Submission, WalletError> {
        self.transfer_token(Address::ZERO, token_id).await
    }

    /// Submit the stored pending transaction again, e.g. after a transport failure.
    pub async fn resubmit_pending(&self) -> Result<Submission, WalletError> {
        let pending = self.pending()?;
        let signed = pending
            .into_iter()
            .next()
            .ok_or(WalletError::NothingPending)?
            .signed;
        self.submit(signed).await
    }

    pub fn account(&self) -> Result<Option<Account>, WalletError> {
        let txn = self.store.begin().during("begin read")?;
        txn.get_account(self.chain_id, &self.address)
            .during("account read")
    }

    /// Local balance; zero until the account first appears in a synced block.
    pub fn balance(&self) -> Result<Amount, WalletError> {
        Ok(self.account()?.map_or(0, |a| a.balance))
    }

    pub fn tokens(&self) -> Result<Vec<Token>, WalletError> {
        let txn = self.store.begin().during("begin read")?;
        txn.list_tokens_by_owner(self.chain_id, &self.address)
            .during("token list")
    }

    pub fn pending(&self) -> Result<Vec<PendingTransaction>, WalletError> {
        let txn = self.store.begin().during("begin read")?;
        txn.list_pending(self.chain_id).during("pending list")
    }

    pub fn portfolio(&self) -> Result<Portfolio, WalletError> {
        let txn = self.store.begin().during("begin read")?;
        let account = txn
            .get_account(self.chain_id, &self.address)
            .during("account read")?
            .unwrap_or_else(|| Account::new(self.chain_id, self.address));
        let tokens = txn
            .list_tokens_by_owner(self.chain_id, &self.address)
            .during("token list")?;
        let pending = match txn.list_pending(self.chain_id).during("pending list")?.first() {
            Some(p) => {
                let tx = &p.signed.transaction;
                Some(PendingSummary {
                    hash: p.signed.hash()?,
                    nonce: tx.nonce.clone(),
                    to: tx.to,
                    value: tx.value,
                })
            }
            None => None,
        };
        let synced_block = txn
            .get_chain_state(self.chain_id)
            .during("chain state read")?
            .map(|s| s.latest_block_number);
        Ok(Portfolio {
            chain_id: self.chain_id,
            address: self.address,
            balance: account.balance,
            nonce: account.nonce,
            tokens: tokens.into_iter().map(|t| t.id).collect(),
            pending,
            synced_block,
        })
    }

    /// Admission gate plus what every builder needs: the local account and current fee.
    /// Runs before any signing or network call.
    fn admit(&self, txn: &S::Txn) -> Result<(Account, Amount), WalletError> {
        if let Some(outstanding) = txn
            .list_pending(self.chain_id)
            .during("admission check")?
            .first()
        {
            return Err(WalletError::TransactionPending {
                nonce: outstanding.nonce().clone(),
            });
        }
        let fee = txn
            .get_chain_state(self.chain_id)
            .during("chain state read")?
            .ok_or(WalletError::NotSynced(self.chain_id))?
            .transaction_fee;
        let account = txn
            .get_account(self.chain_id, &self.address)
            .during("account read")?
            .unwrap_or_else(|| Account::new(self.chain_id, self.address));
        Ok((account, fee))
    }

    fn owned_token(&self, txn: &S::Txn, token_id: TokenId) -> Result<Token, WalletError> {
        txn.get_token(self.chain_id, token_id)
            .during("token read")?
            .ok_or(WalletError::UnknownToken(token_id))
    }

    async fn sign_and_submit(&self, mut txn: S::Txn, tx: Transaction) -> Result<Submission, WalletError> {
        let signed = tx.sign(&self.keys.private)?;
        txn.upsert_pending(&PendingTransaction::new(signed.clone()))
            .during("pending write")?;
        txn.commit().during("pending commit")?;
        self.submit(signed).await
    }

    async fn submit(&self, signed: SignedTransaction) -> Result<Submission, WalletError> {
        let nonce = signed.nonce().clone();
        let mempool = MempoolTransaction::new(signed)?;
        let hash = mempool.id;
        match self.authority.submit_transaction(&mempool).await {
            Ok(()) => {
                tracing::info!(%hash, %nonce, "transaction submitted");
                Ok(Submission { hash, nonce })
            }
            Err(AuthorityError::Rejected(reason)) => {
                tracing::warn!(%hash, %nonce, %reason, "authority rejected transaction");
                let mut txn = self.store.begin().during("begin rejection cleanup")?;
                txn.delete_pending(self.chain_id, &nonce)
                    .during("pending delete")?;
                txn.commit().during("rejection cleanup commit")?;
                Err(WalletError::Rejected { hash, reason })
            }
            Err(source) => {
                tracing::warn!(%hash, %nonce, error = %source, "submission failed, transaction stays pending");
                Err(WalletError::Submission { hash, source })
            }
        }
    }
}
