//! Routing and dispatch core for a network of emergency response stations.
//!
//! Stations are connected by weighted undirected links.
//! Incidents are placed at the nearest operational station and served by the closest
//! units of the resource kinds their category needs, while stations fail and recover.

#[macro_use]
pub mod report;
pub mod algo;
pub mod availability;
pub mod cli;
pub mod config;
pub mod datastr;
pub mod dispatch;
pub mod export;
pub mod incident;
pub mod session;

pub use session::{IncidentReport, Session, SessionError};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
