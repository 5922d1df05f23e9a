//! End-to-end pipeline tests against scripted sinks.

use std::time::Duration;

use pgbridge_config::shared::{BatchConfig, PipelineConfig, PoolConfig};

use pgbridge::error::ErrorKind;
use pgbridge::pipeline::IngestPipeline;
use pgbridge::test_utils::{ScriptedSink, WriteScript};

fn pipeline_config(
    workers: u16,
    write_timeout_ms: u64,
    max_write_attempts: u32,
    batch_max_size: usize,
) -> PipelineConfig {
    PipelineConfig {
        batch: BatchConfig {
            max_size: batch_max_size,
        },
        pool: PoolConfig {
            workers,
            write_timeout_ms,
            max_write_attempts,
            drain_grace_ms: 50,
        },
    }
}

#[tokio::test]
async fn failing_sink_exhausts_attempts_then_worker_returns_to_idle() {
    let sink = ScriptedSink::with_script(vec![
        WriteScript::Fail,
        WriteScript::Fail,
        WriteScript::Fail,
    ]);
    let mut pipeline = IngestPipeline::new(pipeline_config(2, 50, 3, 1), sink.clone());
    pipeline.start().unwrap();
    let mut batcher = pipeline.take_batcher().unwrap();

    batcher.push("doomed".to_string()).await.unwrap();
    sink.wait_for_invocations(3).await;

    let invocations = sink.invocations();
    assert_eq!(invocations.len(), 3);
    for (index, invocation) in invocations.iter().enumerate() {
        assert_eq!(invocation.attempt as usize, index + 1);
        assert_eq!(invocation.records, ["doomed"]);
        assert_eq!(invocation.worker_id, invocations[0].worker_id);
    }

    // The batch was dropped, not retried further, and the worker is idle
    // again: a subsequent batch is processed with a fresh attempt counter.
    batcher.push("next".to_string()).await.unwrap();
    sink.wait_for_invocations(4).await;

    let invocations = sink.invocations();
    assert_eq!(invocations[3].attempt, 1);
    assert_eq!(invocations[3].records, ["next"]);

    batcher.flush().await.unwrap();
    drop(batcher);
    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test]
async fn single_worker_processes_batches_strictly_one_at_a_time() {
    let sink = ScriptedSink::new();
    let mut pipeline = IngestPipeline::new(pipeline_config(1, 1_000, 1, 1), sink.clone());
    pipeline.start().unwrap();
    let mut batcher = pipeline.take_batcher().unwrap();

    for record in ["first", "second", "third"] {
        batcher.push(record.to_string()).await.unwrap();
    }
    sink.wait_for_invocations(3).await;

    let invocations = sink.invocations();
    assert_eq!(invocations.len(), 3);
    assert!(invocations.iter().all(|invocation| invocation.attempt == 1));
    assert_eq!(sink.max_in_flight(), 1);

    batcher.flush().await.unwrap();
    drop(batcher);
    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test]
async fn timed_out_attempt_is_retried_and_succeeds() {
    let sink = ScriptedSink::with_script(vec![WriteScript::Stall, WriteScript::Succeed]);
    let mut pipeline = IngestPipeline::new(pipeline_config(1, 50, 3, 1), sink.clone());
    pipeline.start().unwrap();
    let mut batcher = pipeline.take_batcher().unwrap();

    batcher.push("slow-then-fine".to_string()).await.unwrap();
    sink.wait_for_invocations(2).await;

    let invocations = sink.invocations();
    assert_eq!(invocations.len(), 2);
    assert_eq!(invocations[0].attempt, 1);
    assert_eq!(invocations[1].attempt, 2);

    batcher.flush().await.unwrap();
    drop(batcher);
    pipeline.shutdown_and_wait().await.unwrap();

    // No further attempts after the success.
    assert_eq!(sink.invocation_count(), 2);
}

#[tokio::test]
async fn final_partial_batch_is_attempted_before_shutdown() {
    let sink = ScriptedSink::new();
    let mut pipeline = IngestPipeline::new(pipeline_config(2, 1_000, 3, 10), sink.clone());
    pipeline.start().unwrap();
    let mut batcher = pipeline.take_batcher().unwrap();

    for index in 0..5 {
        batcher.push(format!("record-{index}")).await.unwrap();
    }
    assert_eq!(batcher.pending(), 5);
    assert_eq!(sink.invocation_count(), 0);

    // Drain: the partial batch goes through the same path and gets the grace
    // period before the stop signal is raised.
    batcher.flush().await.unwrap();
    drop(batcher);
    pipeline.shutdown_and_wait().await.unwrap();

    let invocations = sink.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].records.len(), 5);
}

#[tokio::test]
async fn every_batch_is_delivered_to_exactly_one_worker_exactly_once() {
    let sink = ScriptedSink::new();
    let mut pipeline = IngestPipeline::new(pipeline_config(3, 1_000, 1, 1), sink.clone());
    pipeline.start().unwrap();
    let mut batcher = pipeline.take_batcher().unwrap();

    let expected: Vec<String> = (0..10).map(|index| format!("record-{index}")).collect();
    for record in &expected {
        batcher.push(record.clone()).await.unwrap();
    }
    sink.wait_for_invocations(10).await;

    let mut delivered: Vec<String> = sink
        .invocations()
        .into_iter()
        .flat_map(|invocation| invocation.records)
        .collect();
    delivered.sort();
    assert_eq!(delivered, expected);

    batcher.flush().await.unwrap();
    drop(batcher);
    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test]
async fn producer_is_throttled_by_assignment_not_write_completion() {
    // One worker, and a first write that stalls until its deadline.
    let sink = ScriptedSink::with_script(vec![WriteScript::Stall]);
    let mut pipeline = IngestPipeline::new(pipeline_config(1, 200, 1, 1), sink.clone());
    pipeline.start().unwrap();
    let mut batcher = pipeline.take_batcher().unwrap();

    // First batch is assigned immediately, so push returns.
    batcher.push("busy".to_string()).await.unwrap();

    // The only worker is busy: the second push must suspend on the admission
    // gate after submitting its batch.
    {
        let second_push = batcher.push("queued".to_string());
        tokio::pin!(second_push);
        let suspended = tokio::time::timeout(Duration::from_millis(100), &mut second_push).await;
        assert!(
            suspended.is_err(),
            "push must suspend while no worker can be assigned"
        );

        // Once the first attempt times out the worker returns to idle, the queued
        // batch is assigned, and the producer is admitted again even though that
        // batch's write has not completed.
        second_push.await.unwrap();
    }
    sink.wait_for_invocations(2).await;

    drop(batcher);
    pipeline.shutdown_and_wait().await.unwrap();
}

#[tokio::test]
async fn shutdown_with_all_workers_idle_terminates_promptly() {
    // Every worker is registered, so the idle registry is at capacity when
    // the stop signal is raised; shutdown must still complete.
    let sink = ScriptedSink::new();
    let mut pipeline = IngestPipeline::new(pipeline_config(4, 1_000, 3, 1), sink.clone());
    pipeline.start().unwrap();

    // Give every worker time to publish itself before stopping.
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(2), pipeline.shutdown_and_wait())
        .await
        .expect("shutdown must not stall on a full registry")
        .unwrap();

    assert_eq!(sink.invocation_count(), 0);
}

#[tokio::test]
async fn pipeline_misuse_is_reported() {
    let sink = ScriptedSink::new();
    let mut pipeline = IngestPipeline::new(pipeline_config(1, 1_000, 1, 1), sink);

    let err = pipeline.take_batcher().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    pipeline.start().unwrap();
    let err = pipeline.start().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let _batcher = pipeline.take_batcher().unwrap();
    let err = pipeline.take_batcher().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}
