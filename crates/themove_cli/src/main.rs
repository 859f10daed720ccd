//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `themove_core` linkage.
//! - Render the explore feed of the sample moves, optionally searched by the
//!   first argument.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use themove_core::{
    sample_moves, ActorId, InMemoryMoveRepository, MoveRepository, StoreCapabilities, ViewConfig,
};

fn main() -> ExitCode {
    println!("themove_core ping={}", themove_core::ping());
    println!("themove_core version={}", themove_core::core_version());

    let config = ViewConfig {
        search_term: std::env::args().nth(1).unwrap_or_default(),
        ..ViewConfig::default()
    };
    match render_feed(&config) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("themove_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn render_feed(config: &ViewConfig) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let repo = InMemoryMoveRepository::with_moves(StoreCapabilities::default(), sample_moves()?)?;
    let moves = repo.list_moves()?;
    let viewer = ActorId::parse("cli").ok_or("invalid viewer id")?;
    let capabilities = repo.capabilities();

    let cards = themove_core::project(&moves, &viewer, config)
        .into_iter()
        .map(|record| themove_core::MoveCard::for_viewer(record, &viewer, capabilities))
        .map(|card| {
            format!(
                "{:<6} {:<10} {:<7} {:>5}  {} @ {}",
                card.id.as_str(),
                card.status.label(),
                card.category.label(),
                card.capacity_label,
                card.title,
                card.location
            )
        })
        .collect::<Vec<_>>();
    Ok(cards)
}
