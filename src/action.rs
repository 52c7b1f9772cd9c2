use serde::{Deserialize, Serialize};

use crate::state::{CatalogPage, SearchResults};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,

    /// A location was read from history (startup, back or forward).
    LocationDidChange(String),
    HistoryBack,
    HistoryForward,

    PageDidLoad { generation: u64, page: CatalogPage },
    PageDidError { generation: u64, error: String },
    SearchDidLoad { generation: u64, results: SearchResults },
    SearchDidError { generation: u64, error: String },
    RequestDidCancel { generation: u64 },

    SearchStart,
    SearchInput(char),
    SearchBackspace,
    SearchSubmit,
    SearchClear,

    PageRequest(i64),
    PagePrev,
    PageNext,
    PageFirst,
    PageLast,

    GridScroll(i16),

    CacheClear,

    UiTerminalResize(u16, u16),
    Tick,
    Quit,
}
