#[path = "translation/export.rs"]
mod export;
#[path = "translation/import.rs"]
mod import;
#[path = "translation/round_trip.rs"]
mod round_trip;
#[path = "translation/style_cache.rs"]
mod style_cache;
