//! # Example: Processing Queue
//!
//! Submits six acquisitions to a scheduler with a ceiling of two, cancels one
//! while it waits and another while it runs.
//!
//! Run with: `RUST_LOG=procvisor=debug cargo run --example queue --features logging`

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use procvisor::{
    Controller, ControllerRef, ExecutorRef, LogWriter, Scheduler, SchedulerConfig, StepRegistry,
    TaskError, TaskFn, TaskRef, TokioExecutor,
};

/// Step task sleeping for `work_ms`, stopping early when canceled.
fn make_step(step: &'static str, work_ms: u64) -> TaskRef {
    TaskFn::arc(step, move |ctx: CancellationToken| async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(work_ms)) => {
                println!("  [{step}] done");
                Ok::<(), TaskError>(())
            }
            _ = ctx.cancelled() => Err(TaskError::Canceled),
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("procvisor=debug")),
        )
        .init();

    let sched = Scheduler::builder(SchedulerConfig {
        max_concurrent: 2,
        ..SchedulerConfig::default()
    })
    .with_subscriber(Arc::new(LogWriter::new()))
    .build();

    let mut steps = StepRegistry::new();
    steps.add(("baseline", 150));
    steps.add(("smooth", 100));
    steps.add(("centroid", 200));

    let exec: ExecutorRef = Arc::new(TokioExecutor::new());
    let scans: Vec<ControllerRef> = (1..=6)
        .map(|i| {
            Controller::from_steps(format!("scan-{i}"), &steps, exec.clone(), |&(step, ms)| {
                make_step(step, ms)
            })
        })
        .collect();

    for scan in &scans {
        sched.submit(scan);
    }
    println!("queued: waiting={} running={}", sched.waiting_len(), sched.running_len());

    sched.set_enabled(true);
    sched.cancel(&scans[4]);

    tokio::time::sleep(Duration::from_millis(200)).await;
    sched.cancel(&scans[1]);

    for scan in &scans {
        let status = scan.wait_terminal().await;
        println!(
            "{} -> {status} ({}/{} steps)",
            scan.name(),
            scan.completed_tasks(),
            scan.task_count()
        );
    }

    sched.shutdown();
    // Let the subscriber drain its queue.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
