mod common;

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use common::*;
use spacetraders_sync::operations::{ShipActor, ShipActorError, ShipActorStatus};
use spacetraders_sync::{Action, ActionError, ApiError, Method};

fn extract() -> Action {
    Action::Extract {
        ship_symbol: "S1".to_string(),
        survey: None,
    }
}

fn script_extract(transport: &MockTransport, units: u32) {
    transport.ok(
        Method::Post,
        "my/ships/S1/extract",
        json!({
            "cooldown": cooldown_json("S1", 80),
            "extraction": {"shipSymbol": "S1", "yield": {"symbol": "IRON_ORE", "units": 10}},
            "cargo": cargo_json(40, &[("IRON_ORE", units)])
        }),
    );
}

#[tokio::test(start_paused = true)]
async fn task_waits_out_cooldowns_between_steps() {
    let transport = MockTransport::new();
    script_extract(&transport, 10);
    script_extract(&transport, 20);
    let harness = Harness::new(transport, vec![ship("S1", &[])], vec![]);

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let (handle, join) = ShipActor::spawn("S1".to_string(), harness.executor.clone(), status_tx);

    let started = tokio::time::Instant::now();
    let task = handle.submit(vec![extract(), extract()]).unwrap();
    let report = task.wait().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.outcomes.len(), 2);
    assert!(started.elapsed() >= Duration::from_secs(80));
    assert_eq!(harness.store().ship("S1").unwrap().cargo.units_of("IRON_ORE"), 20);

    let mut saw_cooldown = false;
    let mut saw_completed = false;
    while let Ok(update) = status_rx.try_recv() {
        assert_eq!(update.ship_symbol, "S1");
        match update.status {
            ShipActorStatus::OnCooldown { step: 1, .. } => saw_cooldown = true,
            ShipActorStatus::Completed { steps: 2, .. } => saw_completed = true,
            _ => {}
        }
    }
    assert!(saw_cooldown);
    assert!(saw_completed);

    drop(handle);
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn task_stops_at_first_failure() {
    let transport = MockTransport::new();
    transport.fail(
        Method::Post,
        "my/ships/S1/orbit",
        ApiError::new(4236, "Ship is in transit."),
    );
    let harness = Harness::new(transport, vec![ship("S1", &[])], vec![]);
    let (status_tx, _status_rx) = mpsc::unbounded_channel();
    let (handle, _join) = ShipActor::spawn("S1".to_string(), harness.executor.clone(), status_tx);

    let report = handle
        .submit(vec![
            Action::Orbit {
                ship_symbol: "S1".to_string(),
            },
            extract(),
        ])
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert!(report.outcomes.is_empty());
    assert_eq!(report.error.and_then(|e| e.api_error().map(|a| a.code)), Some(4236));
    assert_eq!(harness.transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_abandons_cooldown_wait() {
    let harness = Harness::new(MockTransport::new(), vec![ship("S1", &[])], vec![]);
    harness.cooldowns().arm("S1", 600);
    let (status_tx, _status_rx) = mpsc::unbounded_channel();
    let (handle, _join) = ShipActor::spawn("S1".to_string(), harness.executor.clone(), status_tx);

    let task = handle.submit(vec![extract()]).unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    task.cancel();
    let report = task.wait().await.unwrap();

    assert_eq!(
        report.error,
        Some(ActionError::Cancelled {
            ship: "S1".to_string()
        })
    );
    assert_eq!(harness.transport.call_count(), 0);
    assert!(!harness.cooldowns().is_ready("S1"));
}

#[tokio::test(start_paused = true)]
async fn actions_for_other_ships_are_refused() {
    let harness = Harness::new(MockTransport::new(), vec![ship("S1", &[]), ship("S2", &[])], vec![]);
    let (status_tx, _status_rx) = mpsc::unbounded_channel();
    let (handle, _join) = ShipActor::spawn("S1".to_string(), harness.executor.clone(), status_tx);

    let result = handle.submit(vec![Action::Dock {
        ship_symbol: "S2".to_string(),
    }]);

    assert!(matches!(result, Err(ShipActorError::WrongShip { .. })));
}
