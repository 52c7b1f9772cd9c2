//! Location state: the `search`/`page` query and the history it lives in.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

const SEARCH_PARAM: &str = "search";
const PAGE_PARAM: &str = "page";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub search: String,
    pub page: u32,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
        }
    }
}

impl Route {
    /// Reads a query string, with or without the leading `?`.
    ///
    /// A missing, non-numeric or non-positive `page` becomes 1. When a
    /// parameter repeats, its first occurrence is the one read.
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut search = None;
        let mut page = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                SEARCH_PARAM if search.is_none() => search = Some(value.trim().to_string()),
                PAGE_PARAM if page.is_none() => page = Some(parse_page(&value)),
                _ => {}
            }
        }
        Route {
            search: search.unwrap_or_default(),
            page: page.unwrap_or(1),
        }
    }

    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            serializer.append_pair(SEARCH_PARAM, &self.search);
        }
        if self.page > 1 {
            serializer.append_pair(PAGE_PARAM, &self.page.to_string());
        }
        serializer.finish()
    }

    pub fn to_location(&self) -> String {
        let query = self.to_query();
        if query.is_empty() {
            query
        } else {
            format!("?{query}")
        }
    }
}

fn parse_page(value: &str) -> u32 {
    match value.trim().parse::<i64>() {
        Ok(page) if page > 0 => u32::try_from(page).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Where the current location is read from and written to.
pub trait Navigator {
    fn current(&self) -> &str;
    fn push(&mut self, query: String);
    fn replace(&mut self, query: String);
    fn back(&mut self) -> Option<&str>;
    fn forward(&mut self) -> Option<&str>;
}

/// Browser-style history kept in memory: pushing drops forward entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![normalize(initial.into())],
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl Navigator for MemoryHistory {
    fn current(&self) -> &str {
        &self.entries[self.index]
    }

    fn push(&mut self, query: String) {
        self.entries.truncate(self.index + 1);
        self.entries.push(normalize(query));
        self.index = self.entries.len() - 1;
    }

    fn replace(&mut self, query: String) {
        self.entries[self.index] = normalize(query);
    }

    fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }
}

fn normalize(query: String) -> String {
    match query.trim().strip_prefix('?') {
        Some(stripped) => stripped.to_string(),
        None => query.trim().to_string(),
    }
}
