use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::journal::{JournalView, CLEAR_ALL_PROMPT};
use crate::types::Mood;

/// Write a static snapshot of the journal
pub fn generate_html(view: &JournalView, path: &Path) -> Result<()> {
    let html = render_page(view);
    fs::write(path, html.into_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn render_page(view: &JournalView) -> Markup {
    let recorded: usize = view.tally().iter().map(|c| c.count).sum();

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Year Journal" }
                style { (PreEscaped(CSS)) }
            }
            body.dark[view.dark_mode] {
                div.container #"page" {
                    div.toolbar {
                        h1 { "Year Journal" }
                        button.dark-toggle #"dark-toggle" {
                            @if view.dark_mode { "Light mode" } @else { "Dark mode" }
                        }
                    }
                    div.stats {
                        span #"recorded-count" { (recorded) }
                        " days recorded"
                    }
                    (render_picker(view))
                    (render_grid(view))
                    button.clear-all #"clear-all" data-prompt=(CLEAR_ALL_PROMPT) { "Clear All" }
                }
                script { (PreEscaped(JAVASCRIPT)) }
            }
        }
    }
}

fn render_picker(view: &JournalView) -> Markup {
    html! {
        div.picker {
            @for mood in Mood::PALETTE {
                button.mood-button data-color=(mood.color()) {
                    span.swatch style={"background-color: " (mood.color())} {}
                    span.mood-label { (mood.label()) }
                }
            }
            @if view.selected.is_some() {
                button.remove-button #"remove-mood" { "Remove ❌" }
            }
        }
    }
}

fn render_grid(view: &JournalView) -> Markup {
    html! {
        div.grid #"grid" {
            @for (index, mood) in view.moods.iter().enumerate() {
                @let selected = view.selected == Some(index);
                @let disabled = view.is_disabled(index);
                div.square.selected[selected].disabled[disabled]
                    data-index=(index)
                    title=(mood.label())
                    style={"background-color: " (mood.color())} {}
            }
        }
    }
}

const CSS: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, sans-serif;
    background: #fafafa;
    color: #111;
    min-height: 100vh;
}

body.dark {
    background: #0a0a0a;
    color: #eee;
}

.container {
    max-width: 1000px;
    margin: 0 auto;
    padding: 32px 24px;
    display: flex;
    flex-direction: column;
    align-items: center;
}

.toolbar {
    width: 100%;
    display: flex;
    justify-content: space-between;
    align-items: center;
}

h1 {
    font-size: 1.9rem;
}

.stats {
    margin-top: 8px;
    opacity: 0.7;
}

.picker {
    display: flex;
    flex-wrap: wrap;
    gap: 16px;
    margin-top: 16px;
}

button {
    cursor: pointer;
    border-radius: 8px;
    padding: 8px;
    border: 1px solid #ccc;
    background: transparent;
    color: inherit;
}

.mood-button {
    display: flex;
    align-items: center;
    width: 7rem;
}

.swatch {
    width: 20px;
    height: 20px;
    border: 1px solid #999;
    border-radius: 2px;
    margin-right: 8px;
}

.remove-button {
    border: 2px solid #dc2626;
}

.grid {
    display: flex;
    flex-wrap: wrap;
    gap: 4px;
    margin-top: 16px;
}

.square {
    width: 40px;
    height: 40px;
    border: 1px solid #d1d5db;
    cursor: pointer;
}

.square.selected {
    border: 4px solid #3b82f6;
}

.square.disabled {
    cursor: not-allowed;
    opacity: 0.15;
}

.clear-all {
    margin-top: 24px;
    background: #ef4444;
    color: #fff;
    border: none;
}
"#;

const JAVASCRIPT: &str = r#"
async function post(path) {
    const res = await fetch(path, { method: 'POST' });
    if (res.ok) {
        window.location.reload();
    }
}

document.querySelectorAll('.square').forEach(square => {
    square.addEventListener('click', event => {
        event.stopPropagation();
        if (square.classList.contains('disabled')) return;
        post(`/api/select/${square.dataset.index}`);
    });
});

document.querySelectorAll('.mood-button').forEach(button => {
    button.addEventListener('click', () => post(`/api/mood/${button.dataset.color}`));
});

const remove = document.getElementById('remove-mood');
if (remove) {
    remove.addEventListener('click', () => post('/api/remove'));
}

document.getElementById('dark-toggle').addEventListener('click', () => post('/api/dark-mode'));

const clearAll = document.getElementById('clear-all');
clearAll.addEventListener('click', () => {
    if (window.confirm(clearAll.dataset.prompt)) {
        post('/api/clear');
    }
});

// Clicking the page background drops the selection
document.getElementById('page').addEventListener('click', event => {
    if (event.target === event.currentTarget) {
        post('/api/deselect');
    }
});
"#;
