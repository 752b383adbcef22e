pub mod error;
pub mod route;
pub mod vehicle;

pub use error::{PlaybackError, PlaybackResult};
pub use route::{Coordinate, RoutePoint};
pub use vehicle::{VehicleSnapshot, VehicleStatus};
