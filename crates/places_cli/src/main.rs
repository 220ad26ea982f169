//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise `places_core` end to end against the in-memory remote store.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `places_cli [config.json]`

use places_core::{
    init_from_config, process_error_channel, store_from_config, CoreConfig, InMemoryGateway, Place,
    PlaceImage,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("places_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = match std::env::args().nth(1) {
        Some(path) => CoreConfig::from_file(&path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    if init_from_config(&config.logging)? {
        log::info!("event=cli_start module=cli status=ok");
    }

    let catalog = vec![
        Place::with_id(
            "p1",
            "Forest Waterfall",
            PlaceImage::new("forest-waterfall.jpg", "A tranquil forest with a cascading waterfall"),
            44.5588,
            -80.344,
        ),
        Place::with_id(
            "p2",
            "Sahara Desert Dunes",
            PlaceImage::new("desert-dunes.jpg", "Golden sand dunes in the Sahara"),
            25.0,
            0.0,
        ),
    ];
    let gateway = Arc::new(
        InMemoryGateway::new(config.endpoints.endpoints()).with_available(catalog.clone()),
    );
    let errors = process_error_channel();
    let store = store_from_config(&config, gateway.clone(), errors.clone());

    println!("places_core version={}", places_core::core_version());
    store.load_user_places().map_err(|err| err.to_string())?;
    print_state("loaded", &store.places());

    store.add(catalog[0].clone()).map_err(|err| err.to_string())?;
    print_state("added p1", &store.places());

    if let Err(err) = store.add(catalog[0].clone()) {
        println!("add p1 again rejected: {err}");
    }

    gateway.fail_next_write();
    if let Err(err) = store.add(catalog[1].clone()) {
        println!("add p2 failed remotely: {}", err.user_message());
    }
    print_state("after rollback", &store.places());
    println!(
        "error channel: {}",
        errors.current_error().unwrap_or_else(|| "-".to_string())
    );
    errors.clear_error();

    store.remove(&catalog[0]).map_err(|err| err.to_string())?;
    print_state("removed p1", &store.places());
    Ok(())
}

fn print_state(label: &str, places: &[Place]) {
    let ids: Vec<&str> = places.iter().map(|place| place.id.as_str()).collect();
    println!("{label}: [{}]", ids.join(", "));
}
