use crate::generator::profile::{build_recording_from_config, GeneratorConfig};
use crate::gui_bridge::model::FeedModel;
use crate::workflow::runner::Runner;
use anyhow::{anyhow, Result};
use log::{error, info, warn};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct ReplayError;

impl warp::reject::Reject for ReplayError {}

/// Bridge that hosts the detection feed endpoint and replays rides on request.
pub struct GuiBridge {
    state: Arc<RwLock<FeedModel>>,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>, address: SocketAddr) -> Self {
        let state = Arc::new(RwLock::new(FeedModel::default()));
        let state_for_filter = state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());

        let feed_route = warp::path("detections")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<FeedModel>>| {
                let guard = state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
                warp::reply::json(&*guard)
            });

        let replay_route = warp::path("replay")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig,
                 state: Arc<RwLock<FeedModel>>,
                 runner: Arc<Runner>| async move {
                    match build_recording_from_config(&config)
                        .and_then(|recording| runner.execute(&recording))
                    {
                        Ok(result) => {
                            let detections = result.detections.len();
                            {
                                let mut guard =
                                    state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
                                *guard = FeedModel::from_result(&result);
                            }
                            if let Some(name) = config.scenario.as_ref() {
                                info!("[bridge] scenario {} -> detections {}", name, detections);
                            }
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "detections": detections,
                                    "description": config.description.clone().unwrap_or_default()
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            warn!("replay error: {:#}", err);
                            Err(warp::reject::custom(ReplayError))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = feed_route.or(replay_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        });

        Self { state }
    }

    pub fn publish(&self, model: &FeedModel) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("detection feed state poisoned"))?;
        *guard = model.clone();
        info!(
            "[bridge] ride {}: detections {}, events {}",
            guard.ride,
            guard.detections.len(),
            guard.events.len()
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> FeedModel {
        self.state.read().unwrap().clone()
    }
}
