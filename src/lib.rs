//! Shooting-gallery simulation core.
//!
//! The library is the whole game: `entities` holds the data, `compute`
//! moves it, `geometry` maps pointer coordinates into the playfield.
//! The binary shell owns scheduling and rendering; it calls
//! [`compute::step`] once per frame with the measured delta and feeds
//! taps through [`compute::handle_tap`].

pub mod compute;
pub mod entities;
pub mod geometry;
