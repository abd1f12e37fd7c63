use pir_test_utils::{demo_engine, doc_id};
use pir_workflow::{MonitorBoard, RunCondition};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_board_never_touches_store() {
    let engine = demo_engine();
    let before = engine.store().list();

    let board = MonitorBoard::from_store(engine.store());
    let rows = board.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].document_id, doc_id("doc-2"));
    assert_eq!(rows[0].current_step, 2);

    let handle = board.spawn(Duration::from_secs(3));
    tokio::time::sleep(Duration::from_secs(10)).await;
    handle.shutdown().await;

    let rows = board.snapshot();
    assert_eq!(rows[0].current_step, 3);
    assert_eq!(rows[0].condition, RunCondition::Completed);
    assert_eq!(engine.store().list(), before);
}
