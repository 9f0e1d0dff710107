use std::time::Duration;

use gloo_timers::future::TimeoutFuture;
use leptos::ev::{KeyboardEvent, SubmitEvent};
use leptos::leptos_dom::helpers::{set_interval_with_handle, IntervalHandle};
use leptos::logging::log;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::{
    components::{Route, Router, Routes},
    hooks::use_navigate,
    path, NavigateOptions,
};

use crate::api::{CrosswordBackend, HttpBackend};
use crate::engine::{apply_key, GridModel, InputKey, Pos};
use crate::error::CrosswordError;
use crate::model::{Puzzle, SolutionDoc};
use crate::storage::{
    load_player_name, now_utc, save_player_name, LocalStore, SavedSession, SessionStore,
};
use crate::submit::{build_payload, SubmitGuard};

/// Countdown length for one puzzle, in seconds.
const TOTAL_TIME_SECS: u32 = 180;

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    view! {
        // injects a stylesheet into the document <head>
        // id=leptos means cargo-leptos will hot-reload this stylesheet
        <Stylesheet id="leptos" href="/pkg/crossword-challenge.css" />

        // sets the document title
        <Title text="Crossword Challenge" />

        <Router>
            <main>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=StartPage />
                    <Route path=path!("/crossword") view=CrosswordPage />
                    <Route path=path!("/leaderboard") view=LeaderboardPage />
                    <Route path=path!("/solutions") view=SolutionsPage />
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn StartPage() -> impl IntoView {
    let name = RwSignal::new(String::new());

    Effect::new(move || {
        if let Some(stored) = load_player_name() {
            name.set(stored);
        }
    });

    let start = move |ev: SubmitEvent| {
        ev.prevent_default();
        let entered = name.get();
        let trimmed = entered.trim();
        save_player_name(if trimmed.is_empty() { "Guest" } else { trimmed });
        let navigate = use_navigate();
        navigate("/crossword", NavigateOptions::default());
    };

    view! {
        <div class="start-root">
            <div class="brand">
                <h1 class="site-title">"Crossword Challenge"</h1>
                <p class="tagline">"A new puzzle every day"</p>
            </div>
            <div class="auth-card">
                <form on:submit=start>
                    <label>
                        "Your name: "
                        <input
                            type="text"
                            prop:value=move || name.get()
                            on:input=move |ev| name.set(event_target_value(&ev))
                        />
                    </label>
                    <button class="btn primary" type="submit">
                        "Start Game"
                    </button>
                </form>
                <div class="row">
                    <a href="/leaderboard">"Leaderboard"</a>
                    <a href="/solutions">"Solutions"</a>
                </div>
            </div>
        </div>
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Popup {
    title: String,
    message: String,
    success: bool,
}

impl Popup {
    fn success(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            success: true,
        }
    }

    fn failure(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            success: false,
        }
    }
}

/// Moves DOM focus to a cell's input element. Outside the browser this does
/// nothing.
fn focus_cell(pos: Pos) {
    #[cfg(feature = "hydrate")]
    {
        use wasm_bindgen::JsCast;
        let id = format!("cell-{}-{}", pos.0, pos.1);
        if let Some(element) = leptos::leptos_dom::helpers::document().get_element_by_id(&id) {
            if let Ok(element) = element.dyn_into::<web_sys::HtmlElement>() {
                let _ = element.focus();
            }
        }
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = pos;
}

fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[component]
fn CrosswordPage() -> impl IntoView {
    let puzzle = RwSignal::new(None::<Puzzle>);
    let grid = RwSignal::new(None::<GridModel>);
    let remaining = RwSignal::new(TOTAL_TIME_SECS);
    let submitted = RwSignal::new(false);
    let loading = RwSignal::new(true);
    let popup = RwSignal::new(None::<Popup>);
    let player = RwSignal::new("Guest".to_string());
    let timer = RwSignal::new(None::<IntervalHandle>);
    let guard = StoredValue::new(SubmitGuard::new());

    let stop_timer = move || {
        if let Some(handle) = timer.get_untracked() {
            handle.clear();
            timer.set(None);
        }
    };

    let persist = move || {
        if submitted.get_untracked() {
            return;
        }
        if let (Some(p), Some(g)) = (puzzle.get_untracked(), grid.get_untracked()) {
            LocalStore.save(&SavedSession {
                crossword_id: p.id,
                letters: g.letters(),
                remaining_secs: remaining.get_untracked(),
                saved_at: now_utc(),
            });
        }
    };

    // Shared by the submit button and the countdown's auto-submit. The guard
    // is claimed before any request leaves, so overlapping triggers send at
    // most one submission even while an earlier one is still in flight.
    let do_submit = move |auto: bool| {
        let Some(p) = puzzle.get_untracked() else {
            return;
        };
        let Some(g) = grid.get_untracked() else {
            return;
        };
        if !guard.with_value(|guard| guard.try_begin()) {
            return;
        }
        submitted.set(true);
        stop_timer();
        LocalStore.clear();

        let payload = build_payload(p.id, &g, &p.clues, &p.numbering);
        spawn_local(async move {
            match HttpBackend::default().submit_answers(&payload).await {
                Ok(message) => {
                    popup.set(Some(Popup::success("Submission Successful!", &message)));
                }
                Err(CrosswordError::Rejected(message)) => {
                    popup.set(Some(Popup::failure("Submission Failed", &message)));
                }
                Err(err) => {
                    if auto {
                        log!("auto submit failed: {}", err);
                    }
                    popup.set(Some(Popup::failure(
                        "Network Error",
                        "Could not submit answers. Try again later.",
                    )));
                }
            }
        });
    };

    let start_timer = move || {
        stop_timer();
        let result = set_interval_with_handle(
            move || {
                let left = remaining.get_untracked();
                if left <= 1 {
                    remaining.set(0);
                    stop_timer();
                    do_submit(true);
                } else {
                    remaining.set(left - 1);
                    persist();
                }
            },
            Duration::from_secs(1),
        );
        match result {
            Ok(handle) => timer.set(Some(handle)),
            Err(_) => log!("failed to start the countdown timer"),
        }
    };

    // Fetch the puzzle and resume any saved session. Runs once, on the
    // client only.
    Effect::new(move || {
        player.set(load_player_name().unwrap_or_else(|| "Guest".to_string()));
        spawn_local(async move {
            let result = HttpBackend::default().fetch_puzzle().await;
            loading.set(false);
            match result.and_then(|doc| Puzzle::from_doc(&doc)) {
                Ok(p) => {
                    let mut g = p.grid.clone();
                    let mut left = TOTAL_TIME_SECS;
                    if let Some(saved) = LocalStore.load() {
                        if saved.crossword_id == p.id {
                            g.restore_letters(&saved.letters);
                            left = saved.remaining_at(now_utc());
                        } else {
                            // A new day's puzzle invalidates the old state.
                            LocalStore.clear();
                        }
                    }
                    remaining.set(left);
                    grid.set(Some(g));
                    puzzle.set(Some(p));
                    if left == 0 {
                        // The deadline passed while the page was closed.
                        do_submit(true);
                    } else {
                        start_timer();
                    }
                }
                Err(err) => {
                    log!("failed to load crossword: {}", err);
                    popup.set(Some(Popup::failure(
                        "Error",
                        &format!("Could not load crossword: {}", err),
                    )));
                }
            }
        });
    });

    on_cleanup(move || stop_timer());

    let on_cell_key = move |row: usize, col: usize, ev: KeyboardEvent| {
        if submitted.get_untracked() {
            return;
        }
        let Some(key) = InputKey::from_key(&ev.key()) else {
            return;
        };
        ev.prevent_default();
        let mut next = (row, col);
        grid.update(|g| {
            if let Some(g) = g.as_mut() {
                next = apply_key(g, (row, col), key);
            }
        });
        if next != (row, col) {
            focus_cell(next);
        }
        persist();
    };

    // The board structure is built once per loaded puzzle; only the cell
    // values and the disabled state are reactive, so typing never rebuilds
    // the inputs out from under the focused element.
    let board = move || match puzzle.get() {
        None => view! { <div class="board-loading">"Loading crossword..."</div> }.into_any(),
        Some(p) => {
            let layout = p.grid.clone();
            let numbering = p.numbering.clone();
            (0..layout.rows())
                .map(|r| {
                    let row_cells = (0..layout.cols())
                        .map(|c| {
                            if layout.is_fillable((r, c)) {
                                let number = numbering.get(&(r, c)).copied();
                                view! {
                                    <div class="cell white" role="gridcell">
                                        {number
                                            .map(|n| view! { <span class="cell-number">{n}</span> })}
                                        <input
                                            id=format!("cell-{}-{}", r, c)
                                            class="cell-input"
                                            maxlength="1"
                                            autocomplete="off"
                                            prop:value=move || {
                                                grid.with(|g| {
                                                    g.as_ref()
                                                        .and_then(|g| g.letter_at((r, c)))
                                                        .map(String::from)
                                                        .unwrap_or_default()
                                                })
                                            }
                                            disabled=move || submitted.get()
                                            on:keydown=move |ev| on_cell_key(r, c, ev)
                                        />
                                    </div>
                                }
                                    .into_any()
                            } else {
                                view! { <div class="cell black" role="gridcell"></div> }.into_any()
                            }
                        })
                        .collect_view();
                    view! { <div class="board-row" role="row">{row_cells}</div> }
                })
                .collect_view()
                .into_any()
        }
    };

    let clue_items = move |across: bool| {
        let clues: Vec<_> = puzzle.with(|p| {
            p.as_ref()
                .map(|p| {
                    if across {
                        p.across_clues().cloned().collect()
                    } else {
                        p.down_clues().cloned().collect()
                    }
                })
                .unwrap_or_default()
        });
        clues
            .into_iter()
            .map(|clue| {
                view! {
                    <li>
                        <strong>{clue.id}</strong>
                        ". "
                        {clue.text}
                    </li>
                }
            })
            .collect_view()
    };

    let view_leaderboard = move |_| {
        spawn_local(async move {
            TimeoutFuture::new(900).await;
            let navigate = use_navigate();
            navigate("/leaderboard", NavigateOptions::default());
        });
    };

    view! {
        <div class="cw-root">
            {move || {
                loading.get().then(|| view! { <div class="gate-overlay">"Loading..."</div> })
            }}
            <header class="cw-header">
                <div class="cw-title">"Crossword"</div>
                <div class="cw-meta">
                    <div class="cw-user">"Player: " <strong>{move || player.get()}</strong></div>
                    <div class="cw-timer">
                        "Time Left: " <strong>{move || format_time(remaining.get())}</strong>
                    </div>
                </div>
            </header>

            <main class="cw-main">
                <section class="cw-board">
                    <div class="board-grid" role="grid" aria-label="Crossword grid">{board}</div>
                </section>

                <aside class="cw-side">
                    <div class="clues">
                        <h3>"Clues"</h3>
                        <div class="clue-group">
                            <h4>"Across"</h4>
                            <ul>{move || clue_items(true)}</ul>
                        </div>
                        <div class="clue-group">
                            <h4>"Down"</h4>
                            <ul>{move || clue_items(false)}</ul>
                        </div>
                    </div>

                    <div class="actions">
                        <button
                            class="btn primary"
                            on:click=move |_| do_submit(false)
                            disabled=move || submitted.get()
                        >
                            "Submit Answers"
                        </button>
                        <button class="btn ghost" on:click=view_leaderboard>
                            "View Leaderboard"
                        </button>
                    </div>

                    <div class="progress-card">
                        <h4>"Progress"</h4>
                        <p>
                            "Filled: "
                            <strong>
                                {move || {
                                    grid.with(|g| g.as_ref().map(|g| g.filled_count()).unwrap_or(0))
                                }}
                            </strong>
                        </p>
                        <p>
                            "Words: "
                            <strong>
                                {move || {
                                    puzzle.with(|p| p.as_ref().map(|p| p.clues.len()).unwrap_or(0))
                                }}
                            </strong>
                        </p>
                    </div>
                </aside>
            </main>

            {move || {
                popup
                    .get()
                    .map(|p| {
                        let success = p.success;
                        view! {
                            <div class="popup-overlay">
                                <div class="popup-box">
                                    <h2>{p.title}</h2>
                                    <p>{p.message}</p>
                                    <div class="popup-actions">
                                        <button
                                            class="btn primary"
                                            on:click=move |_| {
                                                popup.set(None);
                                                if success {
                                                    let navigate = use_navigate();
                                                    navigate("/leaderboard", NavigateOptions::default());
                                                }
                                            }
                                        >
                                            {if success { "Go to Leaderboard" } else { "Close" }}
                                        </button>
                                    </div>
                                </div>
                            </div>
                        }
                    })
            }}
        </div>
    }
}

#[component]
fn LeaderboardPage() -> impl IntoView {
    let player = RwSignal::new("Player".to_string());

    Effect::new(move || {
        if let Some(stored) = load_player_name() {
            player.set(stored);
        }
    });

    view! {
        <div class="lb-root">
            <nav class="lb-navbar">
                <div class="nav-left">"Crossword Challenge"</div>
                <div class="nav-center">"Leaderboard"</div>
                <div class="nav-right">
                    <a class="home-btn" href="/">
                        "Home"
                    </a>
                    <a class="home-btn" href="/solutions">
                        "Solutions"
                    </a>
                </div>
            </nav>

            <main class="lb-main">
                <div class="last-card">
                    <div class="hi-user">
                        "Hi, " <span class="user-name">{move || player.get()}</span> "!"
                    </div>
                    <div class="score-top">
                        "Your Score: " <span class="user-score">"Will be updated soon!"</span>
                    </div>
                </div>

                <table class="lb-table" aria-label="Leaderboard">
                    <thead>
                        <tr>
                            <th>"#"</th>
                            <th>"Name"</th>
                            <th>"Score"</th>
                        </tr>
                    </thead>
                    <tbody>
                        <tr>
                            <td colspan="3" class="lb-placeholder">
                                "The leaderboard will be updated soon!"
                            </td>
                        </tr>
                    </tbody>
                </table>
            </main>
        </div>
    }
}

#[component]
fn SolutionsPage() -> impl IntoView {
    let day = RwSignal::new(1u32);
    let solution = RwSignal::new(None::<SolutionDoc>);
    let loading = RwSignal::new(false);

    // Refetches whenever the selected day changes.
    Effect::new(move || {
        let current = day.get();
        loading.set(true);
        spawn_local(async move {
            match HttpBackend::default().fetch_solution(current).await {
                Ok(doc) => solution.set(Some(doc)),
                Err(err) => {
                    log!("failed to fetch solution for day {}: {}", current, err);
                    solution.set(None);
                }
            }
            loading.set(false);
        });
    });

    let solution_card = move || {
        solution
            .get()
            .map(|doc| {
                let answers: std::collections::HashMap<u32, String> = doc
                    .solution
                    .sol
                    .iter()
                    .map(|entry| (entry.id, entry.text.clone()))
                    .collect();
                let answer_for = move |id: u32| answers.get(&id).cloned().unwrap_or_default();

                let grid_rows = doc
                    .crossword
                    .grid
                    .iter()
                    .map(|row| {
                        let cells = row
                            .iter()
                            .map(|cell| {
                                if cell.is_blank {
                                    view! { <td class="cell-black"></td> }.into_any()
                                } else {
                                    view! {
                                        <td class="cell-white">
                                            {cell.letter.clone().unwrap_or_default()}
                                        </td>
                                    }
                                        .into_any()
                                }
                            })
                            .collect_view();
                        view! { <tr>{cells}</tr> }
                    })
                    .collect_view();

                let across = doc
                    .crossword
                    .clues
                    .across
                    .iter()
                    .map(|clue| {
                        view! {
                            <li>
                                <strong>"Across " {clue.id} ": "</strong>
                                {clue.text.clone()}
                                " "
                                <span class="answer">{answer_for(clue.id)}</span>
                            </li>
                        }
                    })
                    .collect_view();
                let down = doc
                    .crossword
                    .clues
                    .down
                    .iter()
                    .map(|clue| {
                        view! {
                            <li>
                                <strong>"Down " {clue.id} ": "</strong>
                                {clue.text.clone()}
                                " "
                                <span class="answer">{answer_for(clue.id)}</span>
                            </li>
                        }
                    })
                    .collect_view();

                view! {
                    <div class="solution-card">
                        <h3>"Day " {day.get()} " Solution"</h3>
                        <table class="grid-table">
                            <tbody>{grid_rows}</tbody>
                        </table>
                        <div>
                            <h4>"Clues and Answers"</h4>
                            <ul>{across} {down}</ul>
                        </div>
                    </div>
                }
                    .into_any()
            })
            .unwrap_or_else(|| {
                view! { <div>"No solution available for day " {day.get()}</div> }.into_any()
            })
    };

    view! {
        <div class="solution-root">
            <nav class="lb-navbar">
                <div class="nav-left">"Crossword Challenge"</div>
                <div class="nav-center">"Solutions"</div>
                <div class="nav-right">
                    <a class="home-btn" href="/">
                        "Home"
                    </a>
                    <a class="home-btn" href="/leaderboard">
                        "Leaderboard"
                    </a>
                </div>
            </nav>

            <main class="solution-main">
                <div class="solution-controls">
                    <button on:click=move |_| day.update(|d| *d = d.saturating_sub(1).max(1))>
                        "Prev Day"
                    </button>
                    <span class="solution-day">"Day " {move || day.get()} " Solution"</span>
                    <button on:click=move |_| day.update(|d| *d += 1)>"Next Day"</button>
                </div>
                {move || {
                    if loading.get() {
                        view! { <div>"Loading..."</div> }.into_any()
                    } else {
                        solution_card()
                    }
                }}
            </main>
        </div>
    }
}
