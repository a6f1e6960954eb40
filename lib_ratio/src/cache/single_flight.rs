//! # In-Flight Registry
//!
//! Deduplicates concurrent loads of the same key. The first caller spawns the
//! load as its own task and registers a shared handle to it; callers arriving
//! before it completes attach to the handle and get a clone of its output.
//! The task runs to completion whether or not anyone is still waiting.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt, Shared};

/// Output of a flight: the load's result, or why its task did not finish.
pub type FlightResult<T> = Result<T, String>;

type Flight<T> = Shared<BoxFuture<'static, FlightResult<T>>>;
type Registry<T> = Arc<Mutex<HashMap<String, Flight<T>>>>;

/// Registry of in-flight operations keyed by source identifier.
pub struct SingleFlight<T: Clone> {
    flights: Registry<T>,
}

impl<T: Clone> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            flights: Arc::clone(&self.flights),
        }
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Unregisters its key when the spawned task ends, including by panic.
struct Landing<T: Clone> {
    flights: Registry<T>,
    key: String,
}

impl<T: Clone> Drop for Landing<T> {
    fn drop(&mut self) {
        if let Ok(mut flights) = self.flights.lock() {
            flights.remove(&self.key);
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `make()` for `key` unless a run is already in flight, in which
    /// case its result is awaited instead. `make` is only called by the
    /// caller that starts the run, and the future it returns is spawned on
    /// the tokio runtime.
    ///
    /// # Errors
    /// The panic or cancellation message when the spawned task did not
    /// finish.
    pub async fn run<F, Fut>(&self, key: &str, make: F) -> FlightResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = {
            let mut flights = self.flights.lock().expect("in-flight registry lock poisoned");
            match flights.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let landing = Landing {
                        flights: Arc::clone(&self.flights),
                        key: key.to_string(),
                    };
                    let work = make();
                    let handle = tokio::spawn(async move {
                        let _landing = landing;
                        work.await
                    });
                    let flight = handle
                        .map(|joined| joined.map_err(|e| e.to_string()))
                        .boxed()
                        .shared();
                    flights.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Number of keys currently being loaded.
    pub fn in_flight(&self) -> usize {
        self.flights.lock().expect("in-flight registry lock poisoned").len()
    }
}
