use log::{debug, error};
use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::history::Route;
use crate::state::{AppState, CatalogMode, LIST_ERROR_MESSAGE, SEARCH_ERROR_MESSAGE};
use crate::ui::max_grid_scroll;

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.message = None;
            DispatchResult::changed_with(Effect::ReadLocation)
        }

        Action::LocationDidChange(query) => restore_location(state, &query),

        Action::HistoryBack => DispatchResult::changed_with(Effect::HistoryBack),
        Action::HistoryForward => DispatchResult::changed_with(Effect::HistoryForward),

        Action::PageDidLoad { generation, page } => {
            if is_stale(state, generation) {
                return DispatchResult::unchanged();
            }
            state.loading = false;
            state.total_items = page.total_count;
            state.results = page.items;
            let total_pages = state.total_pages_for(state.total_items as usize);
            state
                .pagination
                .set_state(state.current_page as i64, total_pages as i64);
            state.grid.render_creatures(&state.results);
            DispatchResult::changed()
        }

        Action::PageDidError { generation, error } => {
            if is_stale(state, generation) {
                return DispatchResult::unchanged();
            }
            error!("failed to load page {}: {error}", state.current_page);
            state.loading = false;
            state.grid.show_error(LIST_ERROR_MESSAGE);
            state.message = Some(error);
            DispatchResult::changed()
        }

        Action::SearchDidLoad {
            generation,
            results,
        } => {
            if is_stale(state, generation) {
                return DispatchResult::unchanged();
            }
            state.loading = false;
            state.results = results.items;
            state.total_items = u32::try_from(state.results.len()).unwrap_or(u32::MAX);
            render_search_page(state);
            DispatchResult::changed()
        }

        Action::SearchDidError { generation, error } => {
            if is_stale(state, generation) {
                return DispatchResult::unchanged();
            }
            error!("search for {:?} failed: {error}", state.search_term);
            state.loading = false;
            state.grid.show_error(SEARCH_ERROR_MESSAGE);
            state.message = Some(error);
            DispatchResult::changed()
        }

        Action::RequestDidCancel { generation } => {
            debug!("request {generation} cancelled");
            DispatchResult::unchanged()
        }

        Action::SearchStart => {
            if state.search_bar.start_editing() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::SearchInput(ch) => {
            if !state.search_bar.is_editing() {
                return DispatchResult::unchanged();
            }
            state.search_bar.insert(ch);
            DispatchResult::changed()
        }

        Action::SearchBackspace => {
            if !state.search_bar.is_editing() || !state.search_bar.backspace() {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed()
        }

        Action::SearchSubmit => {
            let term = state.search_bar.submit();
            apply_search(state, term)
        }

        Action::SearchClear => {
            let term = state.search_bar.clear();
            apply_search(state, term)
        }

        Action::PageRequest(page) => match state.pagination.request(page) {
            Some(page) => change_page(state, page),
            None => DispatchResult::unchanged(),
        },
        Action::PagePrev => match state.pagination.request_previous() {
            Some(page) => change_page(state, page),
            None => DispatchResult::unchanged(),
        },
        Action::PageNext => match state.pagination.request_next() {
            Some(page) => change_page(state, page),
            None => DispatchResult::unchanged(),
        },
        Action::PageFirst => match state.pagination.request_first() {
            Some(page) => change_page(state, page),
            None => DispatchResult::unchanged(),
        },
        Action::PageLast => match state.pagination.request_last() {
            Some(page) => change_page(state, page),
            None => DispatchResult::unchanged(),
        },

        Action::GridScroll(delta) => {
            let max = max_grid_scroll(state.terminal_size, state.grid.cards().len()) as i32;
            let next = (state.grid_scroll as i32 + delta as i32).clamp(0, max) as u16;
            if next == state.grid_scroll {
                return DispatchResult::unchanged();
            }
            state.grid_scroll = next;
            DispatchResult::changed()
        }

        Action::CacheClear => {
            state.message = Some("Cache cleared".to_string());
            DispatchResult::changed_with(Effect::ClearCache)
        }

        Action::UiTerminalResize(width, height) => {
            if state.terminal_size == (width, height) {
                return DispatchResult::unchanged();
            }
            state.terminal_size = (width, height);
            DispatchResult::changed()
        }

        Action::Tick => {
            if !state.loading {
                return DispatchResult::unchanged();
            }
            state.tick = state.tick.wrapping_add(1);
            DispatchResult::changed()
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn is_stale(state: &AppState, generation: u64) -> bool {
    let stale = generation != state.request_generation;
    if stale {
        debug!(
            "dropping result of request {generation}, current is {}",
            state.request_generation
        );
    }
    stale
}

/// Rebuilds search/page from a location read out of history. Never pushes.
fn restore_location(state: &mut AppState, query: &str) -> DispatchResult<Effect> {
    let route = Route::parse(query);
    state.search_term = route.search.clone();
    state.current_page = route.page;
    state.grid_scroll = 0;
    state.search_bar.set_value(&route.search);

    let mut effects = Vec::new();
    let normalized = route.to_query();
    if normalized != query.trim().trim_start_matches('?') {
        effects.push(Effect::ReplaceLocation { query: normalized });
    }
    effects.push(start_request(state));
    DispatchResult::changed_with_many(effects)
}

fn apply_search(state: &mut AppState, term: String) -> DispatchResult<Effect> {
    let term = term.trim().to_string();
    if term == state.search_term {
        return DispatchResult::changed();
    }
    state.search_term = term;
    state.current_page = 1;
    state.grid_scroll = 0;
    let push = push_location(state);
    let request = start_request(state);
    DispatchResult::changed_with_many(vec![push, request])
}

fn change_page(state: &mut AppState, page: u32) -> DispatchResult<Effect> {
    // Search pages are cut from the pending result; there is nothing to show yet.
    if state.loading && state.is_searching() {
        debug!("ignoring page {page} while search {:?} loads", state.search_term);
        return DispatchResult::unchanged();
    }
    state.current_page = page.max(1);
    state.grid_scroll = 0;
    let total_pages = state.pagination.total_pages();
    state
        .pagination
        .set_state(state.current_page as i64, total_pages as i64);
    let mut effects = vec![push_location(state)];
    match state.mode() {
        CatalogMode::Searching => render_search_page(state),
        CatalogMode::Listing => effects.push(start_request(state)),
    }
    DispatchResult::changed_with_many(effects)
}

/// Supersedes whatever request is in flight and describes the next one.
fn start_request(state: &mut AppState) -> Effect {
    state.request_generation += 1;
    state.loading = true;
    state.message = None;
    state.results.clear();
    state.grid.show_loading();

    let generation = state.request_generation;
    match state.mode() {
        CatalogMode::Listing => Effect::LoadPage {
            generation,
            offset: state.page_offset(),
            limit: state.items_per_page,
        },
        CatalogMode::Searching => Effect::SearchCatalog {
            generation,
            term: state.search_term.clone(),
            max_results: state.search_limit,
        },
    }
}

fn render_search_page(state: &mut AppState) {
    let total_pages = state.total_pages_for(state.results.len());
    state
        .pagination
        .set_state(state.current_page as i64, total_pages as i64);
    let slice = state.page_slice().to_vec();
    state.grid.render_creatures(&slice);
}

fn push_location(state: &AppState) -> Effect {
    Effect::PushLocation {
        query: state.route().to_query(),
    }
}
