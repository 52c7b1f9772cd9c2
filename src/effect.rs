use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::api::{ApiClient, ApiError, Transport};
use crate::history::Navigator;

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    LoadPage {
        generation: u64,
        offset: u32,
        limit: u32,
    },
    SearchCatalog {
        generation: u64,
        term: String,
        max_results: usize,
    },
    ReadLocation,
    PushLocation { query: String },
    ReplaceLocation { query: String },
    HistoryBack,
    HistoryForward,
    ClearCache,
}

impl Effect {
    /// Applies a location effect to `navigator`.
    ///
    /// Returns the location the controller has to restore, if any. Writes
    /// (`PushLocation`, `ReplaceLocation`) never restore anything.
    pub fn navigate<N: Navigator + ?Sized>(&self, navigator: &mut N) -> Option<String> {
        match self {
            Effect::ReadLocation => Some(navigator.current().to_string()),
            Effect::PushLocation { query } => {
                if navigator.current() != query {
                    navigator.push(query.clone());
                }
                None
            }
            Effect::ReplaceLocation { query } => {
                navigator.replace(query.clone());
                None
            }
            Effect::HistoryBack => navigator.back().map(str::to_string),
            Effect::HistoryForward => navigator.forward().map(str::to_string),
            _ => None,
        }
    }
}

/// Runs one listing fetch and turns the outcome into its completion action.
pub async fn load_page<T: Transport>(
    api: &ApiClient<T>,
    generation: u64,
    offset: u32,
    limit: u32,
    cancel: &CancellationToken,
) -> Action {
    match api.list_page(offset, limit, cancel).await {
        Ok(page) => Action::PageDidLoad { generation, page },
        Err(ApiError::Cancelled) => Action::RequestDidCancel { generation },
        Err(err) => Action::PageDidError {
            generation,
            error: err.to_string(),
        },
    }
}

pub async fn search_catalog<T: Transport>(
    api: &ApiClient<T>,
    generation: u64,
    term: &str,
    max_results: usize,
    cancel: &CancellationToken,
) -> Action {
    match api.search_by_partial_name(term, max_results, cancel).await {
        Ok(results) => Action::SearchDidLoad {
            generation,
            results,
        },
        Err(ApiError::Cancelled) => Action::RequestDidCancel { generation },
        Err(err) => Action::SearchDidError {
            generation,
            error: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    const BASE: &str = "http://dex.test/api/v2";

    struct OfflineTransport;

    #[async_trait]
    impl Transport for OfflineTransport {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
    }

    fn offline() -> ApiClient<OfflineTransport> {
        ApiClient::with_transport(OfflineTransport, BASE)
    }

    /// Three creatures, listed in one batch of any limit used below.
    struct TinyDex(HashMap<String, serde_json::Value>);

    impl TinyDex {
        fn new() -> Self {
            let names = ["bulbasaur", "pichu", "pikachu"];
            let results: Vec<_> = names
                .iter()
                .enumerate()
                .map(|(index, name)| json!({ "name": name, "url": format!("{BASE}/pokemon/{}/", index + 1) }))
                .collect();
            let listing = json!({ "count": 3, "next": null, "previous": null, "results": results });
            let mut routes = HashMap::new();
            routes.insert(format!("{BASE}/pokemon?offset=0&limit=18"), listing.clone());
            routes.insert(format!("{BASE}/pokemon?offset=0&limit=100"), listing);
            for (index, name) in names.iter().enumerate() {
                let id = index + 1;
                routes.insert(
                    format!("{BASE}/pokemon/{id}/"),
                    json!({
                        "id": id,
                        "name": name,
                        "types": [{ "slot": 1, "type": { "name": "electric", "url": "" } }],
                        "sprites": { "front_default": null }
                    }),
                );
            }
            Self(routes)
        }
    }

    #[async_trait]
    impl Transport for TinyDex {
        async fn get(&self, url: &str) -> Result<Vec<u8>, ApiError> {
            match self.0.get(url) {
                Some(body) => Ok(serde_json::to_vec(body).expect("fixture json")),
                None => Err(ApiError::Http {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    #[test]
    fn read_location_returns_current_entry() {
        let mut history = MemoryHistory::new("?search=pika");
        assert_eq!(
            Effect::ReadLocation.navigate(&mut history),
            Some("search=pika".to_string())
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn push_skips_identical_location() {
        let mut history = MemoryHistory::new("page=2");
        let push = Effect::PushLocation {
            query: "page=2".to_string(),
        };
        assert_eq!(push.navigate(&mut history), None);
        assert_eq!(history.len(), 1);

        let push = Effect::PushLocation {
            query: "page=3".to_string(),
        };
        assert_eq!(push.navigate(&mut history), None);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn back_and_forward_restore_entries() {
        let mut history = MemoryHistory::new("");
        history.push("page=2".to_string());

        assert_eq!(Effect::HistoryBack.navigate(&mut history), Some(String::new()));
        assert_eq!(Effect::HistoryBack.navigate(&mut history), None);
        assert_eq!(
            Effect::HistoryForward.navigate(&mut history),
            Some("page=2".to_string())
        );
    }

    #[test]
    fn fetch_effects_do_not_navigate() {
        let mut history = MemoryHistory::new("page=4");
        let load = Effect::LoadPage {
            generation: 1,
            offset: 0,
            limit: 18,
        };
        assert_eq!(load.navigate(&mut history), None);
        assert_eq!(Effect::ClearCache.navigate(&mut history), None);
        assert_eq!(history.current(), "page=4");
    }

    #[tokio::test]
    async fn fetches_run_as_spawned_tasks() {
        let api = Arc::new(ApiClient::with_transport(TinyDex::new(), BASE));
        let cancel = CancellationToken::new();

        let listing = tokio::spawn({
            let api = Arc::clone(&api);
            let cancel = cancel.clone();
            async move { load_page(&api, 1, 0, 18, &cancel).await }
        });
        let search = tokio::spawn({
            let api = Arc::clone(&api);
            let cancel = cancel.clone();
            async move { search_catalog(&api, 2, " PI ", 200, &cancel).await }
        });

        match listing.await.expect("listing task") {
            Action::PageDidLoad { generation, page } => {
                assert_eq!(generation, 1);
                assert_eq!(page.total_count, 3);
                let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["bulbasaur", "pichu", "pikachu"]);
            }
            other => panic!("unexpected listing outcome {other:?}"),
        }
        match search.await.expect("search task") {
            Action::SearchDidLoad {
                generation,
                results,
            } => {
                assert_eq!(generation, 2);
                let names: Vec<_> = results.items.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["pichu", "pikachu"]);
            }
            other => panic!("unexpected search outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_page_load_reports_error() {
        let action = load_page(&offline(), 3, 0, 18, &CancellationToken::new()).await;
        assert!(matches!(
            action,
            Action::PageDidError { generation: 3, ref error } if error.contains("offline")
        ));
    }

    #[tokio::test]
    async fn cancelled_page_load_reports_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let action = load_page(&offline(), 4, 0, 18, &cancel).await;
        assert_eq!(action, Action::RequestDidCancel { generation: 4 });
    }

    #[tokio::test]
    async fn offline_search_degrades_to_empty_results() {
        let action = search_catalog(&offline(), 2, "pika", 200, &CancellationToken::new()).await;
        assert!(matches!(
            action,
            Action::SearchDidLoad { generation: 2, ref results } if results.items.is_empty()
        ));
    }

    #[tokio::test]
    async fn cancelled_search_reports_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let action = search_catalog(&offline(), 5, "pika", 200, &cancel).await;
        assert_eq!(action, Action::RequestDidCancel { generation: 5 });
    }
}
