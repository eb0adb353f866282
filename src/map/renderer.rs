//! Route renderer over an injected 2D canvas.
//!
//! [`MapRenderer`] owns the map center, the tile cache and the imagery mode.
//! Each [`MapRenderer::render`] pass draws onto a [`MapCanvas`] and returns
//! the tiles the caller should fetch; fetched tiles come back through
//! [`MapRenderer::tile_loaded`] / [`MapRenderer::tile_failed`].

use crate::geo::Coordinate;

use super::tiles::{tile_position, visible_tiles, TileCache, TileKey, TileSlot, TILE_SIZE};

/// Synthetic grid cell size in logical pixels.
pub const GRID_SPACING: f64 = 30.0;

pub const ROUTE_WIDTH: f32 = 4.0;
pub const START_MARKER_RADIUS: f64 = 8.0;
pub const POSITION_MARKER_RADIUS: f64 = 10.0;

/// Halo radius at time `t` (seconds).
pub fn pulse_radius(t: f64) -> f64 {
    15.0 + 5.0 * (3.0 * t).sin()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b, 255)
    }
}

pub mod palette {
    use super::Rgba;

    pub const MAP_BACKGROUND: Rgba = Rgba::opaque(0xf8, 0xf8, 0xf8);
    pub const TILE_PLACEHOLDER: Rgba = Rgba::opaque(0xe5, 0xe5, 0xe5);
    pub const GRID_BACKGROUND: Rgba = Rgba::opaque(0x11, 0x11, 0x11);
    pub const GRID_LINE: Rgba = Rgba::opaque(0x1f, 0x1f, 0x1f);
    pub const ROUTE: Rgba = Rgba::opaque(0xff, 0xff, 0xff);
    pub const START: Rgba = Rgba::opaque(0x10, 0xb9, 0x81);
    pub const POSITION: Rgba = Rgba::opaque(0x3b, 0x82, 0xf6);
    pub const HALO: Rgba = Rgba(0x3b, 0x82, 0xf6, 51);
    pub const POSITION_RING: Rgba = Rgba::opaque(0xff, 0xff, 0xff);
}

/// A point in logical canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in logical canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Drawing surface. Coordinates are logical pixels; the surface applies the
/// scale passed to `resize`.
pub trait MapCanvas {
    type Tile;

    /// Resize the backing store to `width_px` x `height_px` device pixels.
    fn resize(&mut self, width_px: u32, height_px: u32, scale: f32);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn draw_line(&mut self, from: Point, to: Point, width: f32, color: Rgba);
    fn draw_tile(&mut self, tile: &Self::Tile, rect: Rect);
    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Rgba);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba);
    fn stroke_circle(&mut self, center: Point, radius: f64, width: f32, color: Rgba);
}

/// Everything one render pass depends on besides renderer state.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Viewport size in logical pixels.
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f32,
    pub route: &'a [Coordinate],
    pub current: Option<Coordinate>,
    pub tracking: bool,
    /// Animation clock in seconds.
    pub time_secs: f64,
}

pub struct MapRenderer<T> {
    center: Coordinate,
    zoom: u8,
    tiles: TileCache<T>,
    synthetic: bool,
}

impl<T> MapRenderer<T> {
    /// `online` false starts directly in grid mode.
    pub fn new(center: Coordinate, zoom: u8, online: bool) -> Self {
        Self {
            center,
            zoom,
            tiles: TileCache::new(),
            synthetic: !online,
        }
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// True once a tile has failed (or imagery was disabled).
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Overlay label for the current mode.
    pub fn mode_label(&self) -> &'static str {
        if self.synthetic {
            "GPS GRID"
        } else {
            "LIVE MAP"
        }
    }

    pub fn tiles(&self) -> &TileCache<T> {
        &self.tiles
    }

    pub fn tile_loaded(&mut self, key: TileKey, tile: T) {
        self.tiles.insert(key, tile);
    }

    /// Mark `key` failed and switch to grid mode for good.
    pub fn tile_failed(&mut self, key: TileKey) {
        if !self.synthetic {
            log::warn!("map: tile {}/{}/{} failed, switching to grid", key.z, key.x, key.y);
        }
        self.tiles.mark_failed(key);
        self.synthetic = true;
    }

    /// Canvas position of `point` relative to the current center.
    pub fn project(&self, point: Coordinate, width: f64, height: f64) -> Point {
        let (cx, cy) = tile_position(self.center, self.zoom);
        let (px, py) = tile_position(point, self.zoom);
        Point::new(
            (px - cx) * TILE_SIZE + width / 2.0,
            (py - cy) * TILE_SIZE + height / 2.0,
        )
    }

    /// Draw one frame; returns tiles that need fetching.
    pub fn render<C>(&mut self, canvas: &mut C, frame: &Frame<'_>) -> Vec<TileKey>
    where
        C: MapCanvas<Tile = T>,
    {
        let scale = frame.pixel_ratio.max(1.0);
        canvas.resize(
            (frame.width * f64::from(scale)).round() as u32,
            (frame.height * f64::from(scale)).round() as u32,
            scale,
        );

        if frame.tracking {
            if let Some(current) = frame.current {
                self.center = current;
            }
        }

        let requests = if self.synthetic {
            self.draw_grid(canvas, frame.width, frame.height);
            Vec::new()
        } else {
            self.draw_tiles(canvas, frame.width, frame.height)
        };

        self.draw_route(canvas, frame);
        self.draw_position(canvas, frame);
        requests
    }

    fn draw_tiles<C>(&mut self, canvas: &mut C, width: f64, height: f64) -> Vec<TileKey>
    where
        C: MapCanvas<Tile = T>,
    {
        canvas.fill_rect(Rect::new(0.0, 0.0, width, height), palette::MAP_BACKGROUND);

        let (cx, cy) = tile_position(self.center, self.zoom);
        let mut requests = Vec::new();
        for key in visible_tiles(self.center, self.zoom, width, height) {
            let rect = Rect::new(
                (f64::from(key.x) - cx) * TILE_SIZE + width / 2.0,
                (f64::from(key.y) - cy) * TILE_SIZE + height / 2.0,
                TILE_SIZE,
                TILE_SIZE,
            );
            match self.tiles.lookup(&key) {
                TileSlot::Ready(tile) => canvas.draw_tile(tile, rect),
                TileSlot::Absent => {
                    canvas.fill_rect(rect, palette::TILE_PLACEHOLDER);
                    requests.push(key);
                }
                TileSlot::Pending | TileSlot::Failed => {
                    canvas.fill_rect(rect, palette::TILE_PLACEHOLDER)
                }
            }
        }
        for key in &requests {
            self.tiles.mark_pending(*key);
        }
        requests
    }

    fn draw_grid<C: MapCanvas>(&self, canvas: &mut C, width: f64, height: f64) {
        canvas.fill_rect(Rect::new(0.0, 0.0, width, height), palette::GRID_BACKGROUND);

        let mut x = 0.0;
        while x < width {
            canvas.draw_line(Point::new(x, 0.0), Point::new(x, height), 1.0, palette::GRID_LINE);
            x += GRID_SPACING;
        }
        let mut y = 0.0;
        while y < height {
            canvas.draw_line(Point::new(0.0, y), Point::new(width, y), 1.0, palette::GRID_LINE);
            y += GRID_SPACING;
        }
    }

    fn draw_route<C: MapCanvas>(&self, canvas: &mut C, frame: &Frame<'_>) {
        if frame.route.len() < 2 {
            return;
        }
        let points: Vec<Point> = frame
            .route
            .iter()
            .map(|c| self.project(*c, frame.width, frame.height))
            .collect();
        canvas.stroke_polyline(&points, ROUTE_WIDTH, palette::ROUTE);
        canvas.fill_circle(points[0], START_MARKER_RADIUS, palette::START);
    }

    fn draw_position<C: MapCanvas>(&self, canvas: &mut C, frame: &Frame<'_>) {
        let Some(current) = frame.current else {
            return;
        };
        let at = self.project(current, frame.width, frame.height);
        if frame.tracking {
            canvas.fill_circle(at, pulse_radius(frame.time_secs), palette::HALO);
        }
        canvas.fill_circle(at, POSITION_MARKER_RADIUS, palette::POSITION);
        canvas.stroke_circle(at, POSITION_MARKER_RADIUS, 3.0, palette::POSITION_RING);
    }
}
