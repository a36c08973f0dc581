// Shortest and alternative routes between two stations.
// Usage: route <from> <to> [num_alternatives]

#[macro_use]
extern crate emergency_net;
use emergency_net::{cli::*, config::SessionConfig, report::*, Session};
use std::{env, error::Error};

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("route");

    let mut args = env::args().skip(1);
    let from = required_arg(&mut args, "No source station given")?;
    let to = required_arg(&mut args, "No target station given")?;
    let num_alternatives: usize = optional_arg(&mut args, "Invalid number of alternatives")?.unwrap_or(1);

    let config = SessionConfig::from_env()?;
    report!("config", config);
    let session = Session::from_config(&config)?;
    report!("network", session.network_stats());

    let route = report_time("shortest route", || session.shortest_route(&from, &to))?;
    match route.distance {
        Some(distance) => eprintln!("{} -> {}: {} via {}", from, to, distance, route.path.join(" -> ")),
        None => eprintln!("{} -> {}: unreachable", from, to),
    }
    report!("route", route);

    if num_alternatives > 1 {
        let alternatives = report_time_with_key("alternative routes", "alternatives_running_time_ms", || {
            session.alternative_routes(&from, &to, num_alternatives)
        })?;
        report!("alternatives", alternatives);
    }

    Ok(())
}
