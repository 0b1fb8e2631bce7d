// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::events::EventReceiver;
use crate::test_helpers::resolve_yaml;
use fleet_core::{AgentStatus, FakeClock};
use tempfile::TempDir;

struct Harness {
    _config_dir: TempDir,
    _state_dir: TempDir,
    store: Arc<StateStore>,
    runner: JobRunner<FakeClock>,
    events: EventReceiver,
    agent: ResolvedAgent,
}

fn harness(command: &str) -> Harness {
    let yaml = format!(
        r#"
fleet: {{ name: test }}
agents:
  - name: builder
    command: '{command}'
    hooks:
      on_error:
        - run: "echo $FLEET_JOB_STATUS > on_error.txt"
"#
    );
    let (config_dir, config) = resolve_yaml(&yaml);
    let state_dir = TempDir::new().unwrap();
    let store = Arc::new(StateStore::open(state_dir.path()).unwrap());
    store.fleet().reconcile(config.agent_names()).unwrap();
    let bus = EventBus::new();
    let events = bus.subscribe();
    let runner = JobRunner::new(Arc::clone(&store), bus, FakeClock::new());
    let agent = config.agent("builder").unwrap().clone();
    Harness { _config_dir: config_dir, _state_dir: state_dir, store, runner, events, agent }
}

impl Harness {
    fn start(&self) -> Result<JobMetadata, RunnerError> {
        self.runner.start(JobRequest {
            agent: self.agent.clone(),
            schedule: "manual".to_string(),
            prompt: Some("do it".to_string()),
        })
    }

    /// Next job:completed / job:failed / job:cancelled event.
    async fn terminal_event(&mut self) -> FleetEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), self.events.recv())
                .await
                .expect("timed out waiting for job event")
                .expect("event bus closed");
            if matches!(
                event,
                FleetEvent::JobCompleted { .. }
                    | FleetEvent::JobFailed { .. }
                    | FleetEvent::JobCancelled { .. }
            ) {
                return event;
            }
        }
    }

    fn agent_status(&self) -> AgentStatus {
        self.store.read_fleet_state().unwrap().agent("builder").unwrap().status
    }
}

#[tokio::test]
async fn successful_job_records_output_and_completes() {
    let mut h = harness("echo hello; echo warn >&2");
    let job = h.start().unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.started_at.is_some());

    let FleetEvent::JobCompleted { job: done, .. } = h.terminal_event().await else {
        panic!("expected job:completed");
    };
    assert_eq!(done.id, job.id);
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.exit_code, Some(0));
    assert!(done.ended_at.is_some());

    let stored = h.store.get_job(&job.id).unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);

    let output = h.store.read_job_output_all(&job.id).unwrap();
    let lines: Vec<_> = output.iter().map(|r| (r.source, r.content.as_str())).collect();
    assert!(lines.contains(&(OutputSource::Stdout, "hello")));
    assert!(lines.contains(&(OutputSource::Stderr, "warn")));
    assert_eq!(lines.last(), Some(&(OutputSource::System, "job completed")));

    assert!(h.runner.wait_idle(Duration::from_secs(5)).await);
    let state = h.store.read_fleet_state().unwrap();
    let agent = state.agent("builder").unwrap();
    assert_eq!(agent.status, AgentStatus::Idle);
    assert_eq!(agent.current_job, None);
    assert_eq!(agent.last_job.as_ref(), Some(&job.id));
}

#[tokio::test]
async fn nonzero_exit_fails_job_and_runs_error_hooks() {
    let mut h = harness("exit 3");
    let job = h.start().unwrap();

    let FleetEvent::JobFailed { job: failed, error } = h.terminal_event().await else {
        panic!("expected job:failed");
    };
    assert_eq!(error, "exited with code 3");
    assert_eq!(failed.exit_code, Some(3));
    assert_eq!(failed.error.as_deref(), Some("exited with code 3"));
    assert_eq!(h.agent_status(), AgentStatus::Error);

    let marker = h.agent.working_directory.join("on_error.txt");
    for _ in 0..100 {
        if marker.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(std::fs::read_to_string(marker).unwrap().trim(), "failed");
    assert_eq!(h.store.get_job(&job.id).unwrap().unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn spawn_failure_yields_failed_job() {
    let mut h = harness("true");
    h.agent.working_directory = h.agent.working_directory.join("does-not-exist");

    let job = h.start().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap_or_default().contains("failed to spawn sh"));
    assert!(matches!(h.terminal_event().await, FleetEvent::JobFailed { .. }));
    assert!(!h.runner.is_busy("builder"));
    assert_eq!(h.agent_status(), AgentStatus::Error);
}

#[tokio::test]
async fn second_start_for_busy_agent_is_rejected() {
    let mut h = harness("sleep 30");
    let job = h.start().unwrap();
    assert!(h.runner.is_busy("builder"));
    assert_eq!(h.runner.running_jobs(), vec![job.id.clone()]);

    let err = h.start().unwrap_err();
    assert!(matches!(err, RunnerError::AgentBusy(ref agent) if agent == "builder"));

    assert!(h.runner.cancel(&job.id, Duration::ZERO));
    let FleetEvent::JobCancelled { termination_type, .. } = h.terminal_event().await else {
        panic!("expected job:cancelled");
    };
    assert_eq!(termination_type, TerminationType::Forced);
    assert!(h.runner.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(h.runner.running_count(), 0);
}

#[tokio::test]
async fn cancel_within_grace_is_graceful() {
    let mut h = harness("sleep 30");
    let job = h.start().unwrap();

    assert!(h.runner.cancel(&job.id, Duration::from_secs(5)));
    let FleetEvent::JobCancelled { job: cancelled, termination_type } = h.terminal_event().await
    else {
        panic!("expected job:cancelled");
    };
    assert_eq!(termination_type, TerminationType::Graceful);
    assert_eq!(cancelled.status, JobStatus::Cancelled);
    assert_eq!(cancelled.termination_type, Some(TerminationType::Graceful));
    assert_eq!(h.agent_status(), AgentStatus::Idle);
}

#[tokio::test]
async fn unit_ignoring_terminate_is_killed_after_grace() {
    let mut h = harness("trap \"\" TERM; sleep 30");
    let job = h.start().unwrap();
    // Let the trap install before signalling.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = std::time::Instant::now();
    assert!(h.runner.cancel(&job.id, Duration::from_millis(300)));
    let FleetEvent::JobCancelled { termination_type, .. } = h.terminal_event().await else {
        panic!("expected job:cancelled");
    };
    assert_eq!(termination_type, TerminationType::Forced);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn cancel_unknown_job_is_false() {
    let h = harness("true");
    assert!(!h.runner.cancel(&JobId::from_string("job-20260101-000000-nope00"), Duration::ZERO));
    assert!(h.runner.cancel_all(Duration::ZERO).is_empty());
    assert!(h.runner.wait_idle(Duration::from_millis(10)).await);
}

#[tokio::test]
async fn session_id_from_output_is_remembered() {
    let mut h = harness(r#"echo "{\"session_id\":\"sess-1\"}""#);
    let job = h.start().unwrap();

    let FleetEvent::JobCompleted { job: done, .. } = h.terminal_event().await else {
        panic!("expected job:completed");
    };
    assert_eq!(done.session_id.as_deref(), Some("sess-1"));
    assert_eq!(done.id, job.id);

    let session = h.store.sessions().get(&session_key("builder")).unwrap().unwrap();
    assert_eq!(session.session_id, "sess-1");
    assert_eq!(session.job_count, 1);
}

#[tokio::test]
async fn unit_whose_start_cannot_be_recorded_is_killed_and_failed() {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let mut h = harness("sleep 30");
    let new = NewJob { agent: "builder".to_string(), schedule: "manual".to_string(), prompt: None };
    let job = h.store.create_job(new, h.runner.inner.clock.now()).unwrap();
    let execution = Execution::spawn(&build_command(&h.agent, &job, None, None)).unwrap();
    let pid = Pid::from_raw(execution.child.id().unwrap() as i32);

    let failed = h.runner.abandon(
        &h.agent,
        job.clone(),
        execution,
        "failed to record job start: disk full".to_string(),
    );
    assert_eq!(failed.status, JobStatus::Failed);

    let FleetEvent::JobFailed { job: reported, error } = h.terminal_event().await else {
        panic!("expected job:failed");
    };
    assert_eq!(reported.id, job.id);
    assert_eq!(error, "failed to record job start: disk full");
    assert_eq!(h.store.get_job(&job.id).unwrap().unwrap().status, JobStatus::Failed);
    assert_eq!(h.agent_status(), AgentStatus::Error);
    assert!(!h.runner.is_busy("builder"));

    let mut alive = true;
    for _ in 0..100 {
        alive = kill(pid, None).is_ok();
        if !alive {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(!alive, "execution unit still running");
}
