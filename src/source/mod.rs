pub mod fleet;
pub mod mock;

pub use fleet::{FleetDatabase, FleetFile};
pub use mock::MockVehicleSource;

use crate::core::{RoutePoint, VehicleSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Date key format used by fleet feeds
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Trait for anything that can supply vehicles and their route history
///
/// Implementations:
/// - `FleetFile`, a JSON fleet database on disk
/// - `MockVehicleSource`, in-memory tables for tests and demos
///
/// Unknown dates and vehicles yield empty lists rather than errors; errors are
/// reserved for the source itself failing.
#[async_trait]
pub trait VehicleSource: Send + Sync {
    /// Get the name/identifier of this source
    fn name(&self) -> &str;

    /// Vehicles reported on `date`
    async fn fetch_vehicles(&self, date: NaiveDate) -> Result<Vec<VehicleSnapshot>>;

    /// Recorded positions of `vehicle_no` on `date`, oldest first
    async fn fetch_history(&self, vehicle_no: &str, date: NaiveDate) -> Result<Vec<RoutePoint>>;
}
