// Cosmos DB (SQL API) REST client
// Point read and upsert of counter documents, signed with the account
// master key. The HTTP client is built once and shared by all invocations
//
// Numan Thabit 2025 Nov

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use once_cell::sync::OnceCell;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

use super::{CounterDocument, CounterStore, ReadOutcome, StoreConnector};
use crate::config::StoreSettings;
use crate::errors::CounterError;
use crate::metrics::{STORE_ERRORS, STORE_LATENCY};

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2018-12-31";

/// Hands out `CosmosStore`s backed by one lazily built HTTP client.
#[derive(Default)]
pub struct CosmosConnector {
    http: OnceCell<Client>,
}

impl CosmosConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self, settings: &StoreSettings) -> Result<Client, CounterError> {
        self.http
            .get_or_try_init(|| {
                Client::builder()
                    .timeout(settings.timeout)
                    .gzip(true)
                    .build()
            })
            .cloned()
            .map_err(|e| CounterError::connect(format!("build HTTP client: {e}")))
    }
}

#[async_trait]
impl StoreConnector for CosmosConnector {
    async fn connect(
        &self,
        settings: &StoreSettings,
    ) -> Result<Arc<dyn CounterStore>, CounterError> {
        let store = CosmosStore::new(self.client(settings)?, settings)?;
        Ok(Arc::new(store))
    }
}

#[derive(Clone)]
pub struct CosmosStore {
    http: Client,
    endpoint: Url,
    key: Vec<u8>,
    database: String,
    container: String,
}

impl CosmosStore {
    pub fn new(http: Client, settings: &StoreSettings) -> Result<Self, CounterError> {
        let endpoint = Url::parse(&settings.endpoint)
            .map_err(|e| CounterError::connect(format!("invalid COSMOS_ENDPOINT: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(CounterError::connect(format!(
                "invalid COSMOS_ENDPOINT: {} is not a base URL",
                settings.endpoint
            )));
        }
        let key = B64
            .decode(settings.key.trim())
            .map_err(|e| CounterError::connect(format!("invalid COSMOS_KEY encoding: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            key,
            database: settings.database.clone(),
            container: settings.container.clone(),
        })
    }

    fn collection_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.container)
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, CounterError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CounterError::connect("COSMOS_ENDPOINT cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn signed(
        &self,
        method: Method,
        url: Url,
        resource_link: &str,
        partition_key: &str,
    ) -> Result<RequestBuilder, CounterError> {
        let date = rfc1123(Utc::now());
        let token = auth_token(&self.key, method.as_str(), "docs", resource_link, &date)?;
        let partition = serde_json::to_string(&[partition_key])
            .map_err(|e| CounterError::connect(format!("encode partition key: {e}")))?;

        Ok(self
            .http
            .request(method, url)
            .header("authorization", token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-documentdb-partitionkey", partition))
    }
}

#[async_trait]
impl CounterStore for CosmosStore {
    async fn read(&self, id: &str) -> Result<ReadOutcome, CounterError> {
        let _timer = STORE_LATENCY.with_label_values(&["read"]).start_timer();

        let link = format!("{}/docs/{}", self.collection_link(), id);
        let url = self.url_for(&[
            "dbs",
            self.database.as_str(),
            "colls",
            self.container.as_str(),
            "docs",
            id,
        ])?;
        let resp = self
            .signed(Method::GET, url, &link, id)?
            .send()
            .await
            .map_err(|e| send_error("read", e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(id = %id, "counter document not found");
            return Ok(ReadOutcome::NotFound);
        }
        if !status.is_success() {
            STORE_ERRORS.with_label_values(&["read"]).inc();
            let extra = error_message(resp).await;
            return Err(CounterError::StoreRead {
                message: format!("http {status} reading {id}"),
                code: Some(status.as_u16()),
                extra,
            });
        }

        let doc: CounterDocument = resp.json().await.map_err(|e| {
            STORE_ERRORS.with_label_values(&["read"]).inc();
            CounterError::StoreRead {
                message: format!("decode document {id}: {e}"),
                code: None,
                extra: None,
            }
        })?;
        Ok(ReadOutcome::Found(doc))
    }

    async fn upsert(&self, doc: &CounterDocument) -> Result<(), CounterError> {
        let _timer = STORE_LATENCY.with_label_values(&["upsert"]).start_timer();

        let link = self.collection_link();
        let url = self.url_for(&[
            "dbs",
            self.database.as_str(),
            "colls",
            self.container.as_str(),
            "docs",
        ])?;
        let resp = self
            .signed(Method::POST, url, &link, &doc.id)?
            .header("x-ms-documentdb-is-upsert", "True")
            .json(doc)
            .send()
            .await
            .map_err(|e| send_error("upsert", e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        STORE_ERRORS.with_label_values(&["upsert"]).inc();
        let extra = error_message(resp).await;
        Err(CounterError::StoreWrite {
            message: format!("http {status} writing {}", doc.id),
            code: Some(status.as_u16()),
            extra,
        })
    }
}

fn send_error(op: &str, err: reqwest::Error) -> CounterError {
    STORE_ERRORS.with_label_values(&[op]).inc();
    warn!(op = op, error = %err, timeout = err.is_timeout(), "store request did not complete");
    CounterError::Connect {
        message: format!("{op}: {err}"),
        code: err.status().map(|s| s.as_u16()),
    }
}

// Cosmos error bodies look like {"code":"TooManyRequests","message":"..."}.
async fn error_message(resp: Response) -> Option<String> {
    let body = resp.text().await.ok()?;
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(v) => v
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        Err(_) if !body.is_empty() => Some(body),
        Err(_) => None,
    }
}

/// HTTP date in the form the store expects for `x-ms-date`.
pub fn rfc1123(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Master-key authorization token, URL-encoded.
pub fn auth_token(
    key: &[u8],
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String, CounterError> {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CounterError::connect(format!("invalid COSMOS_KEY: {e}")))?;
    mac.update(payload.as_bytes());
    let sig = B64.encode(mac.finalize().into_bytes());
    let token = format!("type=master&ver=1.0&sig={sig}");
    Ok(form_urlencoded::byte_serialize(token.as_bytes()).collect())
}
