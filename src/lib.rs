//! Hotelier API Library
//!
//! Booking lifecycle, financial reconciliation, operator shift ledger and
//! room inventory tracking for a small-hotel back office.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod dates;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

use services::bookings::BookingService;
use services::inventory::InventoryUsageService;
use services::shifts::ShiftService;

/// Domain services wired against one shared pool.
#[derive(Clone)]
pub struct AppServices {
    pub bookings: BookingService,
    pub shifts: ShiftService,
    pub inventory: InventoryUsageService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<events::EventSender>) -> Self {
        let shifts = ShiftService::new(db.clone(), Some(event_sender.clone()));
        let inventory = InventoryUsageService::new(db.clone());
        let bookings = BookingService::new(
            db,
            shifts.clone(),
            inventory.clone(),
            Some(event_sender),
        );
        Self {
            bookings,
            shifts,
            inventory,
        }
    }
}

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Liveness routes. The domain services are driven in-process; only health
/// is exposed over HTTP.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "hotelier-api up" }))
        .route("/health", get(health_check))
}
