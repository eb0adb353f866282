//! stride-tracker library: live run tracking with coaching and a route map.
//!
//! Modules in dependency order:
//!
//! * [`geo`]      - coordinates and haversine distance.
//! * [`location`] - position sources and the geolocation sampler.
//! * [`track`]    - route accumulation, timing and the session state machine.
//! * [`coach`]    - post-run analysis and realtime pace cues.
//! * [`voice`]    - spoken feedback.
//! * [`map`]      - tile math, tile fetching and the route renderer.
//! * [`pipeline`] - the session runner tying the above together.
//! * [`app`]      - the egui tracker window.

pub mod app;
pub mod coach;
pub mod config;
pub mod geo;
pub mod location;
pub mod map;
pub mod pipeline;
pub mod track;
pub mod voice;
