//! End-to-end: MAVLink datagrams in, georeferenced anchor pose out.
//!
//! Exercises the listener, snapshot store, origin initializer, initialization
//! sequencer and pose smoother together, with an in-test terrain dataset that
//! answers height queries from a worker thread.
//!
//! Run with: `cargo test --test anchor_pipeline_integration`

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nalgebra::UnitQuaternion;
use skyanchor_core::prelude::*;
use skyanchor_core::protocol::{encode_v2, Attitude, GlobalPositionInt, OutgoingMessage};

// ============================================================================
// Test Helpers
// ============================================================================

/// Terrain that finishes loading after a few polls and answers on a worker thread.
struct SlowTerrain {
    elevation: f64,
    polls: AtomicU32,
}

impl TerrainDataset for SlowTerrain {
    fn load_progress(&self) -> f32 {
        let polls = self.polls.fetch_add(1, Ordering::Relaxed);
        (polls as f32 * 25.0).min(100.0)
    }

    fn sample_height_most_detailed(&self, positions: &[GeoPosition]) -> HeightQuery {
        let (responder, query) = skyanchor_core::anchor::height_query();
        let elevation = self.elevation;
        let positions = positions.to_vec();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            responder.complete(
                positions
                    .into_iter()
                    .map(|p| {
                        HeightSample::sampled(GeoPosition {
                            height: elevation,
                            ..p
                        })
                    })
                    .collect(),
            );
        });
        query
    }
}

#[derive(Default)]
struct Origin(Option<GeoPosition>);

impl OriginSink for Origin {
    fn place_origin(&mut self, position: GeoPosition) {
        self.0 = Some(position);
    }
}

#[derive(Default)]
struct Anchor {
    position: Option<GeoPosition>,
    orientation: Option<UnitQuaternion<f64>>,
    writes: usize,
}

impl AnchorSink for Anchor {
    fn set_position(&mut self, position: GeoPosition) {
        self.position = Some(position);
        self.writes += 1;
    }

    fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.orientation = Some(orientation);
    }
}

fn send_fix(tx: &UdpSocket, to: SocketAddr, seq: u8, altitude: f64, yaw: f32) {
    let position = OutgoingMessage::GlobalPosition(GlobalPositionInt::from_degrees(
        1_000, 47.0, 8.0, altitude,
    ));
    let attitude = OutgoingMessage::Attitude(Attitude {
        yaw,
        ..Default::default()
    });
    tx.send_to(&encode_v2(seq, 1, 1, &position), to).unwrap();
    tx.send_to(&encode_v2(seq.wrapping_add(1), 1, 1, &attitude), to)
        .unwrap();
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn datagrams_become_a_smoothed_anchor_pose() {
    let store = Arc::new(TelemetryStore::new());
    let mut listener = TelemetryListener::new(
        ListenerConfig {
            receive_timeout: Duration::from_millis(50),
            ..Default::default()
        },
        store.clone(),
    );
    let addr = listener
        .start(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .unwrap();

    let mut origin_init = OriginInitializer::new(OriginConfig {
        initialization_delay: Duration::from_millis(10),
        ..Default::default()
    });
    let mut controller = AnchorController::builder(AnchorConfig {
        vertical_offset: 1.5,
        ..Default::default()
    })
    .store(store.clone())
    .origin(Arc::new(origin_init.signal()))
    .terrain(Arc::new(SlowTerrain {
        elevation: 400.0,
        polls: AtomicU32::new(0),
    }))
    .build()
    .unwrap();

    let tx = UdpSocket::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).unwrap();
    send_fix(&tx, addr, 0, 100.0, 0.0);

    // Consumer loop at ~200 Hz until the first pose is written.
    let mut origin = Origin::default();
    let mut anchor = Anchor::default();
    let deadline = Instant::now() + Duration::from_secs(3);
    let mut first = None;
    while Instant::now() < deadline && first.is_none() {
        let now = Instant::now();
        origin_init.tick(now, &store.read(), &mut origin);
        first = controller.tick(now, &mut anchor);
        thread::sleep(Duration::from_millis(5));
    }

    let first = first.expect("anchor never became ready");
    assert_eq!(controller.state(), InitializationState::Ready);
    assert_eq!(origin.0, Some(GeoPosition::new(8.0, 47.0, 2250.0)));
    assert!((first.position.height - 501.5).abs() < 1e-9);
    assert_eq!(anchor.writes, 1);

    // New telemetry: the target moves, the displayed pose follows gradually.
    send_fix(&tx, addr, 2, 200.0, 1.0);
    assert!({
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline && store.read().relative_altitude() < 200.0 {
            thread::sleep(Duration::from_millis(5));
        }
        store.read().relative_altitude() == 200.0
    });

    let mut last_height = first.position.height;
    for _ in 0..50 {
        let pose = controller.tick(Instant::now(), &mut anchor).unwrap();
        assert!(pose.position.height >= last_height);
        assert!(pose.position.height <= 601.5 + 1e-9);
        last_height = pose.position.height;
    }
    assert!(last_height > 595.0);
    assert_eq!(anchor.writes, 51);
    assert!(anchor.orientation.unwrap().angle() > 0.9);

    listener.stop();
    assert_eq!(listener.status(), ListenerStatus::Stopped);
}
