use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::grid::CardGrid;
use crate::history::Route;
use crate::pagination::Pagination;
use crate::search_bar::SearchBar;

pub const DEFAULT_ITEMS_PER_PAGE: u32 = 18;
pub const DEFAULT_SEARCH_LIMIT: usize = 200;

pub const LIST_ERROR_MESSAGE: &str = "Failed to load Pokémon. Please try again later.";
pub const SEARCH_ERROR_MESSAGE: &str =
    "Failed to search Pokémon. Check your connection and try again.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub id: u32,
    pub name: String,
    pub types: Vec<String>,
    pub artwork_url: Option<String>,
    pub sprite_url: Option<String>,
}

impl Creature {
    /// Official artwork when the API has it, otherwise the front sprite.
    pub fn image_url(&self) -> Option<&str> {
        self.artwork_url
            .as_deref()
            .or(self.sprite_url.as_deref())
    }

    pub fn primary_type(&self) -> &str {
        self.types.first().map(String::as_str).unwrap_or("normal")
    }
}

/// One server-paginated slice of the catalog, hydrated into full records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<Creature>,
    pub total_count: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<Creature>,
    /// Matches found before truncation to the requested maximum.
    pub total_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogMode {
    Listing,
    Searching,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppState {
    pub terminal_size: (u16, u16),

    pub current_page: u32,
    pub items_per_page: u32,
    pub search_limit: usize,
    pub total_items: u32,
    pub search_term: String,
    pub results: Vec<Creature>,
    pub request_generation: u64,

    pub pagination: Pagination,
    pub search_bar: SearchBar,
    pub grid: CardGrid,
    pub grid_scroll: u16,

    pub loading: bool,
    pub message: Option<String>,
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE, DEFAULT_SEARCH_LIMIT)
    }
}

impl AppState {
    pub fn new(items_per_page: u32, search_limit: usize) -> Self {
        Self {
            terminal_size: (80, 24),
            current_page: 1,
            items_per_page: items_per_page.max(1),
            search_limit,
            total_items: 0,
            search_term: String::new(),
            results: Vec::new(),
            request_generation: 0,
            pagination: Pagination::default(),
            search_bar: SearchBar::default(),
            grid: CardGrid::default(),
            grid_scroll: 0,
            loading: false,
            message: None,
            tick: 0,
        }
    }

    pub fn is_searching(&self) -> bool {
        !self.search_term.is_empty()
    }

    pub fn mode(&self) -> CatalogMode {
        if self.is_searching() {
            CatalogMode::Searching
        } else {
            CatalogMode::Listing
        }
    }

    pub fn total_pages_for(&self, total_items: usize) -> u32 {
        let per_page = self.items_per_page.max(1) as usize;
        let pages = total_items.div_ceil(per_page).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn page_offset(&self) -> u32 {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.items_per_page)
    }

    /// The part of a client-held result list that belongs on the current page.
    pub fn page_slice(&self) -> &[Creature] {
        let per_page = self.items_per_page as usize;
        let start = (self.current_page.saturating_sub(1) as usize).saturating_mul(per_page);
        if start >= self.results.len() {
            return &[];
        }
        let end = start.saturating_add(per_page).min(self.results.len());
        &self.results[start..end]
    }

    /// The location that describes the current view.
    pub fn route(&self) -> Route {
        Route {
            search: self.search_term.clone(),
            page: self.current_page,
        }
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Catalog")
                .entry("mode", ron_string(&self.mode()))
                .entry("page", ron_string(&self.current_page))
                .entry("total_pages", ron_string(&self.pagination.total_pages()))
                .entry("total_items", ron_string(&self.total_items))
                .entry("results", ron_string(&self.results.len()))
                .entry("search", ron_string(&self.search_term)),
            DebugSection::new("Requests")
                .entry("generation", ron_string(&self.request_generation))
                .entry("loading", ron_string(&self.loading))
                .entry("location", ron_string(&self.route().to_query())),
            DebugSection::new("Grid")
                .entry("view", ron_string(&self.grid.view()))
                .entry("cards", ron_string(&self.grid.cards().len()))
                .entry("scroll", ron_string(&self.grid_scroll))
                .entry("message", ron_string(&self.message)),
        ]
    }
}
