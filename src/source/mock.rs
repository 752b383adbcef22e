use crate::core::{RoutePoint, VehicleSnapshot};
use crate::source::{FleetDatabase, VehicleSource};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

/// Simulated fleet backend answering from in-memory tables
///
/// Optionally waits before each answer to mimic network latency.
pub struct MockVehicleSource {
    name: String,
    db: FleetDatabase,
    latency: Option<Duration>,
}

impl MockVehicleSource {
    /// Create a new, empty mock source
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            db: FleetDatabase::default(),
            latency: None,
        }
    }

    /// Wrap an existing database
    pub fn with_database(name: &str, db: FleetDatabase) -> Self {
        Self {
            name: name.to_string(),
            db,
            latency: None,
        }
    }

    /// Delay every fetch by `latency`
    pub fn set_latency(&mut self, latency: Duration) {
        self.latency = Some(latency);
    }

    /// Add a vehicle to the list for `date`
    pub fn inject_vehicle(&mut self, date: NaiveDate, vehicle: VehicleSnapshot) {
        self.db.add_vehicle(date, vehicle);
    }

    /// Set the history returned for `vehicle_no` on `date`
    pub fn inject_history(&mut self, vehicle_no: &str, date: NaiveDate, route: Vec<RoutePoint>) {
        self.db.set_history(vehicle_no, date, route);
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl VehicleSource for MockVehicleSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_vehicles(&self, date: NaiveDate) -> Result<Vec<VehicleSnapshot>> {
        self.simulate_latency().await;
        Ok(self.db.vehicles_on(date))
    }

    async fn fetch_history(&self, vehicle_no: &str, date: NaiveDate) -> Result<Vec<RoutePoint>> {
        self.simulate_latency().await;
        Ok(self.db.history(vehicle_no, date))
    }
}
