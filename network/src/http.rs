//! HTTP adapter for [`AuthorityClient`].
//!
//! Bodies use the ledger's binary codec (`application/octet-stream`); state-change
//! notifications arrive as server-sent events carrying `{"chain_id": N}`.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tessera_ledger::{BlockData, BlockchainState, GenesisBlockData, MempoolTransaction};
use tessera_types::{BlockHash, ChainId};

use crate::client::{AuthorityClient, ChainNotification, NotificationStream};
use crate::sse::{SseDecoder, SseEvent};
use crate::AuthorityError;

const OCTET_STREAM: &str = "application/octet-stream";
const EVENT_STREAM: &str = "text/event-stream";

/// Default timeout for single-shot requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default silence allowed on an event stream before it counts as a timeout.
/// Authority keepalives arrive well inside this.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct HttpAuthorityConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest gap between reads on a subscription stream.
    pub idle_timeout: Duration,
}

impl HttpAuthorityConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

pub struct HttpAuthority {
    base_url: String,
    /// Single-shot requests, bounded by the request timeout.
    http: reqwest::Client,
    /// Long-lived event streams: no overall deadline, but a stalled read times out.
    stream_http: reqwest::Client,
}

impl HttpAuthority {
    pub fn new(config: HttpAuthorityConfig) -> Result<Self, AuthorityError> {
        let setup_error = |e: reqwest::Error| AuthorityError::Transport {
            operation: "client setup",
            message: e.to_string(),
        };
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(setup_error)?;
        let stream_http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.idle_timeout)
            .build()
            .map_err(setup_error)?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            stream_http,
        })
    }

    fn chain_url(&self, chain_id: ChainId, path: &str) -> String {
        format!("{}/chains/{}/{}", self.base_url, chain_id, path)
    }

    /// GET a codec-encoded record; 404 or an empty body is `None`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: String,
    ) -> Result<Option<T>, AuthorityError> {
        tracing::trace!(operation, %url, "authority request");
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, OCTET_STREAM)
            .send()
            .await
            .map_err(|e| AuthorityError::from_reqwest(operation, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthorityError::Status {
                operation,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthorityError::from_reqwest(operation, e))?;
        tessera_ledger::decode(&body).map_err(|e| AuthorityError::Decode {
            operation,
            message: e.to_string(),
        })
    }
}

fn parse_notification(event: &SseEvent) -> Result<ChainNotification, AuthorityError> {
    serde_json::from_str(&event.data).map_err(|e| AuthorityError::Decode {
        operation: "subscribe_state_changes",
        message: format!("{e}: {}", event.data),
    })
}

#[async_trait]
impl AuthorityClient for HttpAuthority {
    async fn get_genesis_block(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<GenesisBlockData>, AuthorityError> {
        self.fetch("get_genesis_block", self.chain_url(chain_id, "genesis"))
            .await
    }

    async fn get_chain_state(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<BlockchainState>, AuthorityError> {
        self.fetch("get_chain_state", self.chain_url(chain_id, "state"))
            .await
    }

    async fn get_block_by_hash(
        &self,
        chain_id: ChainId,
        hash: &BlockHash,
    ) -> Result<Option<BlockData>, AuthorityError> {
        let url = self.chain_url(chain_id, &format!("blocks/hash/{}", hash.to_hex()));
        self.fetch("get_block_by_hash", url).await
    }

    async fn get_block_by_number(
        &self,
        chain_id: ChainId,
        number: u64,
    ) -> Result<Option<BlockData>, AuthorityError> {
        let url = self.chain_url(chain_id, &format!("blocks/number/{number}"));
        self.fetch("get_block_by_number", url).await
    }

    async fn submit_transaction(&self, tx: &MempoolTransaction) -> Result<(), AuthorityError> {
        const OPERATION: &str = "submit_transaction";
        let body = tessera_ledger::encode(tx).map_err(|e| AuthorityError::Decode {
            operation: OPERATION,
            message: e.to_string(),
        })?;
        let url = self.chain_url(tx.signed.transaction.chain_id, "mempool");
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(body)
            .send()
            .await
            .map_err(|e| AuthorityError::from_reqwest(OPERATION, e))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(id = %tx.id, "transaction accepted by authority");
            return Ok(());
        }
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let reason = response.text().await.unwrap_or_default();
            return Err(AuthorityError::Rejected(if reason.is_empty() {
                status.to_string()
            } else {
                reason
            }));
        }
        Err(AuthorityError::Status {
            operation: OPERATION,
            status: status.as_u16(),
        })
    }

    async fn subscribe_state_changes(
        &self,
        chain_id: ChainId,
    ) -> Result<NotificationStream, AuthorityError> {
        const OPERATION: &str = "subscribe_state_changes";
        let url = self.chain_url(chain_id, "events");
        let response = self
            .stream_http
            .get(&url)
            .header(ACCEPT, EVENT_STREAM)
            .send()
            .await
            .map_err(|e| AuthorityError::from_reqwest(OPERATION, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthorityError::Status {
                operation: OPERATION,
                status: status.as_u16(),
            });
        }
        tracing::debug!(%chain_id, "subscribed to authority state changes");

        let bytes = Box::pin(response.bytes_stream());
        let state = (bytes, SseDecoder::new(), VecDeque::new(), false);
        let stream = futures_util::stream::unfold(
            state,
            |(mut bytes, mut decoder, mut queue, mut done)| async move {
                loop {
                    if let Some(item) = queue.pop_front() {
                        return Some((item, (bytes, decoder, queue, done)));
                    }
                    if done {
                        return None;
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => {
                            for event in decoder.push(&chunk) {
                                queue.push_back(parse_notification(&event));
                            }
                        }
                        Some(Err(e)) => {
                            queue.push_back(Err(AuthorityError::from_reqwest(OPERATION, e)));
                            done = true;
                        }
                        None => return None,
                    }
                }
            },
        );
        Ok(Box::pin(stream))
    }
}
