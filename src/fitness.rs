//! Fitness evaluation of giant-tour routes.
//!
//! A route is a permutation of all customers without the depot. It is decoded
//! left to right: a new depot-anchored trip starts whenever the next customer
//! would push the running load strictly above the vehicle capacity. The
//! decoding is greedy and order dependent; it never searches for the best
//! split.

use crate::instance::ProblemData;
use anyhow::{ensure, Result};

/// Check that `route` is a permutation of every customer of `data`.
pub fn validate_route(data: &ProblemData, route: &[usize]) -> Result<()> {
    ensure!(
        route.len() == data.num_customers(),
        "route visits {} customers, instance has {}",
        route.len(),
        data.num_customers()
    );

    let mut seen = vec![false; data.dimension()];
    for (pos, &node) in route.iter().enumerate() {
        ensure!(node < data.dimension(), "position {}: node index {} out of range", pos, node);
        ensure!(node != data.depot(), "position {}: route must not contain the depot", pos);
        ensure!(!seen[node], "position {}: customer {} appears twice", pos, node);
        seen[node] = true;
    }

    Ok(())
}

/// Total travel distance of `route` under the greedy capacity split.
pub fn evaluate(data: &ProblemData, route: &[usize]) -> Result<f64> {
    validate_route(data, route)?;
    Ok(decode(data, route, |_| {}))
}

/// Decode `route` into its depot-anchored trips using the same rule as [`evaluate`].
pub fn split_trips(data: &ProblemData, route: &[usize]) -> Result<Vec<Vec<usize>>> {
    validate_route(data, route)?;

    let mut starts = vec![0];
    decode(data, route, |pos| starts.push(pos));
    starts.push(route.len());

    Ok(starts.windows(2).map(|w| route[w[0]..w[1]].to_vec()).collect())
}

/// Load carried on each trip
pub fn trip_loads(data: &ProblemData, trips: &[Vec<usize>]) -> Vec<f64> {
    trips
        .iter()
        .map(|trip| trip.iter().map(|&c| data.demand(c)).sum())
        .collect()
}

/// Length of a single trip leaving from and returning to the depot
pub fn trip_length(data: &ProblemData, trip: &[usize]) -> f64 {
    let (Some(&first), Some(&last)) = (trip.first(), trip.last()) else {
        return 0.0;
    };
    let depot = data.depot();
    let inner: f64 = trip.windows(2).map(|w| data.distance(w[0], w[1])).sum();
    data.distance(depot, first) + inner + data.distance(last, depot)
}

/// Walk the route once, calling `on_new_trip` with the position of every
/// customer that opens a new trip after the first one.
fn decode(data: &ProblemData, route: &[usize], mut on_new_trip: impl FnMut(usize)) -> f64 {
    let depot = data.depot();
    let capacity = data.capacity();

    let mut load = data.demand(route[0]);
    let mut cost = data.distance(depot, route[0]);

    for (i, pair) in route.windows(2).enumerate() {
        let (current, next) = (pair[0], pair[1]);
        let demand = data.demand(next);

        if load + demand > capacity {
            cost += data.distance(current, depot) + data.distance(depot, next);
            load = demand;
            on_new_trip(i + 1);
        } else {
            cost += data.distance(current, next);
            load += demand;
        }
    }

    cost + data.distance(route[route.len() - 1], depot)
}
