// ABOUTME: SeaORM entity module exports
// ABOUTME: Re-exports the user and item entities for the rest of the app

pub mod item;
pub mod user;
