//! Live route map.
//!
//! * [`MapRenderer`] draws tiles or a grid, the route and the position marker
//!   onto any [`MapCanvas`].
//! * [`TileFetcher`] downloads and decodes tile imagery.
//! * [`tiles`] holds the slippy-map math and the tile cache.

pub mod fetch;
pub mod renderer;
pub mod tiles;

pub use fetch::{decode_png, TileError, TileFetcher, TileImage};
pub use renderer::{palette, pulse_radius, Frame, MapCanvas, MapRenderer, Point, Rect, Rgba};
pub use tiles::{latlng_to_tile, tile_position, visible_tiles, TileCache, TileKey, TileSlot};
