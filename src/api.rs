use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::state::{CatalogPage, Creature, SearchResults};

pub const API_BASE: &str = "https://pokeapi.co/api/v2";
pub const SEARCH_BATCH_SIZE: u32 = 100;
const HYDRATE_CONCURRENCY: usize = 12;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ApiError {
    #[error("request to {url} failed with status {status}")]
    Http { url: String, status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("response parse error: {0}")]
    Decode(String),
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Body of a successful GET; non-2xx statuses are `ApiError::Http`.
    async fn get(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HttpTransport;

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = http_client()
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    count: u32,
    next: Option<String>,
    previous: Option<String>,
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    types: Vec<PokemonTypeSlot>,
    sprites: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonTypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug)]
enum Cached {
    Listing(ListResponse),
    Page(CatalogPage),
    Creature(Creature),
}

/// PokeAPI client with a process-lifetime response cache.
///
/// Entries are keyed by request signature (`list_<offset>_<limit>`,
/// `pokemon_<id>`, ...) and only go away through [`ApiClient::clear_cache`].
pub struct ApiClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    cache: Mutex<HashMap<String, Cached>>,
}

impl ApiClient<HttpTransport> {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(HttpTransport, base_url)
    }
}

impl Default for ApiClient<HttpTransport> {
    fn default() -> Self {
        Self::new(API_BASE)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(transport: T, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cached_entries(&self) -> usize {
        self.entries().len()
    }

    pub fn clear_cache(&self) {
        let mut entries = self.entries();
        debug!("clearing {} cached responses", entries.len());
        entries.clear();
    }

    pub async fn list_page(
        &self,
        offset: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<CatalogPage, ApiError> {
        let key = format!("list_{offset}_{limit}");
        if let Some(Cached::Page(page)) = self.cached(&key) {
            return Ok(page);
        }

        let page = cancellable(cancel, async {
            let listing = self.listing(offset, limit).await?;
            let items = self.hydrate(&listing.results).await?;
            Ok(CatalogPage {
                items,
                total_count: listing.count,
                has_next: listing.next.is_some(),
                has_prev: listing.previous.is_some(),
            })
        })
        .await?;

        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        self.store(key, Cached::Page(page.clone()));
        Ok(page)
    }

    /// Full record for a resource URL, a numeric id, or a name.
    pub async fn get_details(&self, reference: &str) -> Result<Creature, ApiError> {
        let (key, url) = self.detail_target(reference);
        if let Some(Cached::Creature(creature)) = self.cached(&key) {
            return Ok(creature);
        }

        let response: PokemonResponse = self.fetch_json(&url).await?;
        let creature = creature_from_response(response);
        self.store(key, Cached::Creature(creature.clone()));
        Ok(creature)
    }

    /// Exact lookup by name; a 404 means there is no such creature.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Creature>, ApiError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Ok(None);
        }
        let key = format!("search_{name}");
        if let Some(Cached::Creature(creature)) = self.cached(&key) {
            return Ok(Some(creature));
        }

        let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
        let url = format!("{}/pokemon/{encoded}", self.base_url);
        match self.fetch_json::<PokemonResponse>(&url).await {
            Ok(response) => {
                let creature = creature_from_response(response);
                self.store(key, Cached::Creature(creature.clone()));
                Ok(Some(creature))
            }
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Scans the whole listing for names containing `term`, in listing order.
    ///
    /// A failed batch ends the scan early with whatever matched so far.
    /// The only error returned is [`ApiError::Cancelled`].
    pub async fn search_by_partial_name(
        &self,
        term: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<SearchResults, ApiError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() || max_results == 0 {
            return Ok(SearchResults::default());
        }

        let mut matches = Vec::new();
        let mut offset = 0u32;
        loop {
            let batch = match cancellable(cancel, self.listing(offset, SEARCH_BATCH_SIZE)).await {
                Ok(batch) => batch,
                Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
                Err(err) => {
                    warn!("search for {needle:?} stopped at offset {offset}: {err}");
                    break;
                }
            };

            let hits: Vec<NamedResource> = batch
                .results
                .iter()
                .filter(|entry| entry.name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            if !hits.is_empty() {
                match cancellable(cancel, self.hydrate(&hits)).await {
                    Ok(found) => matches.extend(found),
                    Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
                    Err(err) => {
                        warn!("search for {needle:?} stopped at offset {offset}: {err}");
                        break;
                    }
                }
            }

            if batch.next.is_none() || matches.len() >= max_results {
                break;
            }
            offset = offset.saturating_add(SEARCH_BATCH_SIZE);
        }

        let total_count = matches.len();
        matches.truncate(max_results);
        debug!(
            "search for {needle:?} matched {total_count}, returning {}",
            matches.len()
        );
        Ok(SearchResults {
            items: matches,
            total_count,
        })
    }

    async fn listing(&self, offset: u32, limit: u32) -> Result<ListResponse, ApiError> {
        let key = format!("listing_{offset}_{limit}");
        if let Some(Cached::Listing(listing)) = self.cached(&key) {
            return Ok(listing);
        }
        let url = format!("{}/pokemon?offset={offset}&limit={limit}", self.base_url);
        let listing: ListResponse = self.fetch_json(&url).await?;
        self.store(key, Cached::Listing(listing.clone()));
        Ok(listing)
    }

    async fn hydrate(&self, entries: &[NamedResource]) -> Result<Vec<Creature>, ApiError> {
        let urls: Vec<String> = entries.iter().map(|entry| entry.url.clone()).collect();
        stream::iter(urls)
            .map(move |url| async move { self.get_details(&url).await })
            .buffered(HYDRATE_CONCURRENCY)
            .try_collect()
            .await
    }

    async fn fetch_json<R: DeserializeOwned>(&self, url: &str) -> Result<R, ApiError> {
        debug!("GET {url}");
        let bytes = self.transport.get(url).await?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    fn detail_target(&self, reference: &str) -> (String, String) {
        let reference = reference.trim();
        if reference.starts_with("http://") || reference.starts_with("https://") {
            let key = match creature_id_from_url(reference) {
                Some(id) => format!("pokemon_{id}"),
                None => reference.to_string(),
            };
            return (key, reference.to_string());
        }
        let name = reference.to_lowercase();
        (
            format!("pokemon_{name}"),
            format!("{}/pokemon/{name}", self.base_url),
        )
    }

    fn cached(&self, key: &str) -> Option<Cached> {
        let hit = self.entries().get(key).cloned();
        if hit.is_some() {
            debug!("cache hit {key}");
        }
        hit
    }

    fn store(&self, key: String, value: Cached) {
        self.entries().insert(key, value);
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Cached>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Trailing numeric path segment of a resource URL such as `.../pokemon/25/`.
pub fn creature_id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .filter(|id| *id > 0)
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        result = future => result,
    }
}

fn creature_from_response(response: PokemonResponse) -> Creature {
    Creature {
        id: response.id,
        name: response.name,
        types: response
            .types
            .into_iter()
            .map(|slot| slot.type_info.name)
            .collect(),
        artwork_url: pointer_string(&response.sprites, "/other/official-artwork/front_default"),
        sprite_url: pointer_string(&response.sprites, "/front_default"),
    }
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}
