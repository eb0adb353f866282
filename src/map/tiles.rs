//! Slippy-map tile math and the in-memory tile cache.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::geo::Coordinate;

/// Edge length of a map tile in logical pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Web-Mercator latitude limit; beyond it the projection diverges.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// A tile address at a zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Expand a `{z}/{x}/{y}` URL template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// Number of tiles per axis at `zoom`.
pub fn tiles_per_axis(zoom: u8) -> f64 {
    2f64.powi(i32::from(zoom))
}

/// Fractional tile coordinates of a point.
pub fn tile_position(point: Coordinate, zoom: u8) -> (f64, f64) {
    let n = tiles_per_axis(zoom);
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (point.lng + 180.0) / 360.0 * n;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n;
    (x, y)
}

/// Integer tile indices containing a point.
///
/// ```rust
/// use stride_tracker::geo::Coordinate;
/// use stride_tracker::map::latlng_to_tile;
///
/// assert_eq!(latlng_to_tile(Coordinate::new(0.0, 0.0), 1), (1, 1));
/// ```
pub fn latlng_to_tile(point: Coordinate, zoom: u8) -> (i64, i64) {
    let (x, y) = tile_position(point, zoom);
    (x.floor() as i64, y.floor() as i64)
}

/// Tiles covering a `width` x `height` viewport around `center`, clipped to
/// the world.
pub fn visible_tiles(center: Coordinate, zoom: u8, width: f64, height: f64) -> Vec<TileKey> {
    let (cx, cy) = latlng_to_tile(center, zoom);
    let tiles_x = (width / TILE_SIZE).ceil() as i64 + 2;
    let tiles_y = (height / TILE_SIZE).ceil() as i64 + 2;
    let start_x = cx - tiles_x / 2;
    let start_y = cy - tiles_y / 2;
    let limit = tiles_per_axis(zoom) as i64;

    let mut keys = Vec::new();
    for x in start_x..start_x + tiles_x {
        for y in start_y..start_y + tiles_y {
            if (0..limit).contains(&x) && (0..limit).contains(&y) {
                keys.push(TileKey::new(zoom, x as u32, y as u32));
            }
        }
    }
    keys
}

// ---------------------------------------------------------------------------
// TileCache
// ---------------------------------------------------------------------------

/// Result of a cache lookup.
#[derive(Debug, PartialEq)]
pub enum TileSlot<'a, T> {
    Ready(&'a T),
    Pending,
    Failed,
    Absent,
}

#[derive(Debug)]
enum Entry<T> {
    Pending,
    Ready(T),
    Failed,
}

/// Tile images keyed by [`TileKey`]. Entries are never evicted.
#[derive(Debug)]
pub struct TileCache<T> {
    entries: HashMap<TileKey, Entry<T>>,
}

impl<T> Default for TileCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> TileCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &TileKey) -> TileSlot<'_, T> {
        match self.entries.get(key) {
            Some(Entry::Ready(tile)) => TileSlot::Ready(tile),
            Some(Entry::Pending) => TileSlot::Pending,
            Some(Entry::Failed) => TileSlot::Failed,
            None => TileSlot::Absent,
        }
    }

    /// Record that a fetch for `key` is in flight.
    pub fn mark_pending(&mut self, key: TileKey) {
        self.entries.entry(key).or_insert(Entry::Pending);
    }

    pub fn insert(&mut self, key: TileKey, tile: T) {
        self.entries.insert(key, Entry::Ready(tile));
    }

    pub fn mark_failed(&mut self, key: TileKey) {
        self.entries.insert(key, Entry::Failed);
    }

    /// Number of loaded tiles.
    pub fn ready_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, Entry::Ready(_)))
            .count()
    }
}
