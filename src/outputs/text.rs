//! Plain-text rendering for the terminal.

use crate::models::{Article, Category, CategoryLanding, DataSource, Language, SubcategoryHeading};
use crate::state::{LoadPhase, QueryStateController};
use std::fmt::Write;

fn source_note(source: &DataSource) -> &'static str {
    if source.is_remote() { "" } else { " (offline data)" }
}

pub fn render_categories(categories: &[Category], source: &DataSource) -> String {
    let mut out = format!("Categories{}\n", source_note(source));
    for category in categories {
        let _ = writeln!(out, "  {:<10} {}", category.id, category.title);
        if !category.description.is_empty() {
            let _ = writeln!(out, "             {}", category.description);
        }
    }
    out
}

pub fn render_landing(landing: &CategoryLanding) -> String {
    let mut out = format!("{}\n", landing.category.title);
    if !landing.category.description.is_empty() {
        let _ = writeln!(out, "{}", landing.category.description);
    }
    if landing.tiles.is_empty() {
        out.push_str("  (no subcategories)\n");
    }
    for tile in &landing.tiles {
        let _ = writeln!(out, "  {:<12} {} [{}]", tile.id, tile.title, tile.count);
    }
    out
}

pub fn render_overview(landings: &[CategoryLanding]) -> String {
    landings.iter().map(render_landing).collect::<Vec<_>>().join("\n")
}

/// The article page as currently held by `controller`.
pub fn render_articles(controller: &QueryStateController, heading: &SubcategoryHeading) -> String {
    let state = controller.state();
    let mut out = format!("{}\n", heading.title);

    match controller.phase() {
        LoadPhase::NotFound => {
            out.push_str("No articles found.\n");
            return out;
        }
        LoadPhase::Errored { message } => {
            let _ = writeln!(out, "Showing offline data: {message}");
        }
        LoadPhase::Idle | LoadPhase::Loading | LoadPhase::Ready => {}
    }

    let Some(envelope) = controller.envelope() else {
        return out;
    };

    if !envelope.months.is_empty() {
        let months = envelope
            .months
            .iter()
            .map(|m| {
                let marker = if state.month.as_deref() == Some(m.key.as_str()) { "*" } else { "" };
                format!("{marker}{} ({})", m.label, m.count)
            })
            .collect::<Vec<_>>()
            .join(" | ");
        let _ = writeln!(out, "Months: {months}");
    }

    for article in &envelope.articles {
        let _ = writeln!(out, "- [{}] {} ({}, {})", article.id, article.title, article.date, article.scope);
        if !article.excerpt.is_empty() {
            let _ = writeln!(out, "    {}", article.excerpt);
        }
    }

    let _ = writeln!(
        out,
        "Page {} of {} · {} articles{}",
        state.page,
        controller.total_pages(),
        envelope.meta.total,
        controller.source().map_or("", source_note)
    );
    out
}

pub fn render_article(article: &Article, source: &DataSource) -> String {
    let mut out = format!("{}{}\n", article.title, source_note(source));
    let _ = writeln!(
        out,
        "{} · {} · {}",
        article.date,
        article.scope,
        article
            .language
            .as_deref()
            .and_then(|code| code.parse::<Language>().ok())
            .map_or("", Language::label)
    );
    if !article.body.is_empty() {
        let _ = writeln!(out, "\n{}", article.body);
    } else if !article.excerpt.is_empty() {
        let _ = writeln!(out, "\n{}", article.excerpt);
    }
    out
}
