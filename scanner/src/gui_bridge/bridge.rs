use crate::gui_bridge::model::{ContourRequest, WaveformModel};
use anyhow::{anyhow, Result};
use galvocore::daq_interface::OutputHandoff;
use galvocore::scan::{AssembledScan, ScanSession};
use galvocore::telemetry::CollectingSink;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, RwLock},
};
use warp::{http::StatusCode, Filter};

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

/// Bridge that serves the latest drive cycle over HTTP and ingests external
/// contours into the live session.
pub struct GuiBridge {
    session: Mutex<ScanSession>,
    sink: Arc<CollectingSink>,
    state: RwLock<WaveformModel>,
    handoff: Arc<OutputHandoff>,
}

impl GuiBridge {
    pub fn new(session: ScanSession, sink: Arc<CollectingSink>, handoff: Arc<OutputHandoff>) -> Self {
        Self {
            session: Mutex::new(session),
            sink,
            state: RwLock::new(WaveformModel::default()),
            handoff,
        }
    }

    /// Stores `scan` as the served model and hands it to the output worker.
    pub fn publish(&self, scan: &AssembledScan, committed_slots: Vec<u32>) -> Result<WaveformModel> {
        let mut messages = self.sink.drain();
        {
            let previous = self
                .state
                .read()
                .map_err(|_| anyhow!("bridge state lock poisoned"))?;
            if messages.is_empty() {
                messages = previous.messages.clone();
            }
        }
        let model = WaveformModel::from_scan(scan, committed_slots, messages);
        {
            let mut guard = self
                .state
                .write()
                .map_err(|_| anyhow!("bridge state lock poisoned"))?;
            *guard = model.clone();
        }
        self.handoff.submit(scan.to_waveform());
        log::info!(
            "[GUI] {} points per round at {:.2} Hz",
            model.points_per_round,
            model.contour_frequency
        );
        Ok(model)
    }

    /// Commits an external contour and republishes the assembled cycle. The
    /// session stays locked until the cycle is published.
    pub fn ingest(&self, request: ContourRequest) -> Result<WaveformModel> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("scan session lock poisoned"))?;
        session.commit_external(request.slot, request.contour)?;
        let scan = session.assemble()?;
        self.publish(&scan, session.committed_slots())
    }

    pub fn snapshot(&self) -> WaveformModel {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn routes(
        bridge: Arc<GuiBridge>,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let bridge_filter = warp::any().map(move || bridge.clone());

        let get_route = warp::path("waveform")
            .and(warp::path::end())
            .and(warp::get())
            .and(bridge_filter.clone())
            .map(|bridge: Arc<GuiBridge>| warp::reply::json(&bridge.snapshot()));

        let post_route = warp::path("contour")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge_filter)
            .map(|request: ContourRequest, bridge: Arc<GuiBridge>| {
                let slot = request.slot;
                match bridge.ingest(request) {
                    Ok(model) => warp::reply::with_status(
                        warp::reply::json(&json!({
                            "status": "ok",
                            "slot": slot,
                            "points_per_round": model.points_per_round,
                        })),
                        StatusCode::OK,
                    ),
                    Err(err) => {
                        log::warn!("contour ingest for slot {} failed: {:#}", slot, err);
                        warp::reply::with_status(
                            warp::reply::json(&json!({
                                "status": "error",
                                "slot": slot,
                                "message": err.to_string(),
                            })),
                            StatusCode::UNPROCESSABLE_ENTITY,
                        )
                    }
                }
            });

        get_route.or(post_route)
    }

    pub async fn serve(bridge: Arc<GuiBridge>, addr: SocketAddr) {
        warp::serve(Self::routes(bridge)).run(addr).await;
    }
}
