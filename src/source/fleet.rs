use crate::core::{RoutePoint, VehicleSnapshot};
use crate::source::{date_key, VehicleSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Vehicles per day and routes per vehicle per day, keyed by `YYYY-MM-DD`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetDatabase {
    #[serde(default)]
    pub vehicles: HashMap<String, Vec<VehicleSnapshot>>,
    #[serde(default)]
    pub routes: HashMap<String, HashMap<String, Vec<RoutePoint>>>,
}

impl FleetDatabase {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse fleet database")
    }

    pub fn vehicles_on(&self, date: NaiveDate) -> Vec<VehicleSnapshot> {
        self.vehicles.get(&date_key(date)).cloned().unwrap_or_default()
    }

    pub fn history(&self, vehicle_no: &str, date: NaiveDate) -> Vec<RoutePoint> {
        self.routes
            .get(vehicle_no)
            .and_then(|by_date| by_date.get(&date_key(date)))
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_vehicle(&mut self, date: NaiveDate, vehicle: VehicleSnapshot) {
        self.vehicles.entry(date_key(date)).or_default().push(vehicle);
    }

    pub fn set_history(&mut self, vehicle_no: &str, date: NaiveDate, route: Vec<RoutePoint>) {
        self.routes
            .entry(vehicle_no.to_string())
            .or_default()
            .insert(date_key(date), route);
    }
}

/// Fleet database loaded from a JSON file
pub struct FleetFile {
    name: String,
    db: FleetDatabase,
}

impl FleetFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fleet file: {:?}", path))?;
        let db = FleetDatabase::parse(&content)
            .with_context(|| format!("Invalid fleet file: {:?}", path))?;
        debug!(
            "Loaded fleet file {:?}: {} days, {} vehicles with routes",
            path,
            db.vehicles.len(),
            db.routes.len()
        );
        Ok(Self {
            name: path.to_string_lossy().to_string(),
            db,
        })
    }

    pub fn database(&self) -> &FleetDatabase {
        &self.db
    }
}

#[async_trait]
impl VehicleSource for FleetFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_vehicles(&self, date: NaiveDate) -> Result<Vec<VehicleSnapshot>> {
        Ok(self.db.vehicles_on(date))
    }

    async fn fetch_history(&self, vehicle_no: &str, date: NaiveDate) -> Result<Vec<RoutePoint>> {
        Ok(self.db.history(vehicle_no, date))
    }
}
