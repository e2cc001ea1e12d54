//! Domain types for feed reconciliation.
//!
//! This module contains the core domain model types representing
//! validated transit data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod frequency;
mod route;
mod stop;
mod tags;
mod time;
mod trip;

pub use frequency::FrequencyWindow;
pub use route::{Agency, Route, RouteType};
pub use stop::{InvalidStopId, Stop, StopId, round_coord};
pub use tags::{MULTI_VALUE_KEYS, TagError, TagSet};
pub use time::{ServiceTime, TimeError};
pub use trip::{Trip, TripStop};
