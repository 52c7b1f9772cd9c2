use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info};
use pokegrid::action::Action;
use pokegrid::api::{self, ApiClient};
use pokegrid::effect::{load_page, search_catalog, Effect};
use pokegrid::history::MemoryHistory;
use pokegrid::reducer::reducer;
use pokegrid::state::{AppState, DEFAULT_ITEMS_PER_PAGE, DEFAULT_SEARCH_LIMIT};
use pokegrid::ui::{CatalogComponentId, CatalogContext, CatalogUi};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio_util::sync::CancellationToken;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventKind,
    HandlerResponse, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

const LOG_ENV: &str = "POKEGRID_LOG";
const CATALOG_TASK: &str = "catalog";
const LOCATION_TASK: &str = "location";
const LOADING_TICK_MS: u64 = 90;

#[derive(Parser, Debug)]
#[command(name = "pokegrid")]
#[command(about = "Browse and search the Pokémon catalog page by page")]
struct Args {
    /// Location to open, e.g. "?search=pika&page=2"
    #[arg(long, default_value = "")]
    url: String,

    /// PokeAPI base URL
    #[arg(long, default_value = api::API_BASE)]
    api_base: String,

    /// Cards per page
    #[arg(long, default_value_t = DEFAULT_ITEMS_PER_PAGE, value_parser = clap::value_parser!(u32).range(1..))]
    per_page: u32,

    /// Maximum matches kept by a name search
    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    search_limit: usize,

    /// Log file (defaults to the user cache directory); level comes from POKEGRID_LOG
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        url,
        api_base,
        per_page,
        search_limit,
        log_file,
        debug: debug_args,
    } = Args::parse();

    init_logging(log_file)?;

    let debug = DebugSession::new(debug_args);
    let state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(per_page, search_limit))
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let effects = EffectRuntime::new(ApiClient::new(api_base), MemoryHistory::new(url));

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions, effects).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

fn init_logging(path: Option<PathBuf>) -> io::Result<()> {
    let Some(path) = path.or_else(default_log_path) else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, "warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .init();

    info!("logging to {}", path.display());
    Ok(())
}

fn default_log_path() -> Option<PathBuf> {
    dirs_next::cache_dir().map(|dir| dir.join("pokegrid").join("pokegrid.log"))
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

/// Owns what effects act on: the API client, the location history and the
/// token of the fetch in flight.
struct EffectRuntime {
    api: Arc<ApiClient>,
    history: MemoryHistory,
    inflight: Option<CancellationToken>,
}

impl EffectRuntime {
    fn new(api: ApiClient, history: MemoryHistory) -> Self {
        Self {
            api: Arc::new(api),
            history,
            inflight: None,
        }
    }

    fn handle(&mut self, effect: Effect, ctx: &mut EffectContext<Action>) {
        match effect {
            Effect::LoadPage {
                generation,
                offset,
                limit,
            } => {
                let cancel = self.begin_request();
                let api = Arc::clone(&self.api);
                ctx.tasks().spawn(TaskKey::new(CATALOG_TASK), async move {
                    load_page(&api, generation, offset, limit, &cancel).await
                });
            }
            Effect::SearchCatalog {
                generation,
                term,
                max_results,
            } => {
                let cancel = self.begin_request();
                let api = Arc::clone(&self.api);
                ctx.tasks().spawn(TaskKey::new(CATALOG_TASK), async move {
                    search_catalog(&api, generation, &term, max_results, &cancel).await
                });
            }
            Effect::ClearCache => self.api.clear_cache(),
            location => {
                if let Some(query) = location.navigate(&mut self.history) {
                    debug!("restoring location {query:?}");
                    ctx.tasks().spawn(TaskKey::new(LOCATION_TASK), async move {
                        Action::LocationDidChange(query)
                    });
                }
            }
        }
    }

    /// Cancels the previous fetch and hands out the token for the next one.
    fn begin_request(&mut self) -> CancellationToken {
        if let Some(previous) = self.inflight.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.inflight = Some(token.clone());
        token
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    effects: EffectRuntime,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(CatalogUi::new()));
    let effects = RefCell::new(effects);
    let mut bus: EventBus<AppState, Action, CatalogComponentId, CatalogContext> = EventBus::new();
    let keybindings: Keybindings<CatalogContext> = Keybindings::new();

    let ui_search = Rc::clone(&ui);
    bus.register(CatalogComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    let ui_grid = Rc::clone(&ui);
    bus.register(CatalogComponentId::Grid, move |event, state| {
        ui_grid.borrow_mut().handle_grid_event(&event.kind, state)
    });

    bus.register_global(|event, state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) => match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                HandlerResponse::action(Action::Quit)
            }
            KeyCode::Char('q') if !state.search_bar.is_editing() => {
                HandlerResponse::action(Action::Quit)
            }
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime.subscriptions().interval(
                    "tick",
                    Duration::from_millis(LOADING_TICK_MS),
                    || Action::Tick,
                );
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            |effect, ctx| effects.borrow_mut().handle(effect, ctx),
        )
        .await
}
