//! Love Letter rules engine: the card catalog, the round and game state
//! machine, effect resolution, and the per-viewer history log.
pub mod game;
pub mod model;
