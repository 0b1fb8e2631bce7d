// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn write(dir: &TempDir, rel: &str, content: &str) -> PathBuf {
    let path = dir.path().join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn load(dir: &TempDir) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(dir.path(), &HashMap::<String, String>::new())
}

const BASIC: &str = r#"
version: 1
fleet:
  name: demo
  description: Demo fleet
defaults:
  model: sonnet
  permission_mode: acceptEdits
  allowed_tools: [Read, Grep]
  docker:
    image: fleet/base:1
    enabled: false
agents:
  - name: reviewer
    prompt: Review open pull requests
    allowed_tools: [Read]
    schedules:
      hourly:
        type: interval
        interval: 1h
      nightly:
        type: cron
        expression: "0 3 * * *"
        prompt: Nightly summary
      on-demand:
        type: manual
  - name: tidy
    command: ./tidy.sh
    working_directory: scripts
    docker:
      enabled: true
      network: none
"#;

#[test]
fn loads_basic_fleet() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fleet.yaml", BASIC);
    let config = load(&dir).unwrap();

    assert_eq!(config.name, "demo");
    assert_eq!(config.description.as_deref(), Some("Demo fleet"));
    assert_eq!(config.agent_names().collect::<Vec<_>>(), vec!["reviewer", "tidy"]);

    let reviewer = config.agent("reviewer").unwrap();
    assert_eq!(reviewer.qualified_name, "reviewer");
    assert!(reviewer.fleet_path.is_empty());
    assert!(!reviewer.is_containerized());
    let Invocation::Runtime(runtime) = &reviewer.invocation else {
        panic!("expected runtime invocation");
    };
    assert_eq!(runtime.program, DEFAULT_RUNTIME);
    assert_eq!(runtime.model.as_deref(), Some("sonnet"));
    assert_eq!(runtime.allowed_tools, vec!["Read"]);

    assert_eq!(
        reviewer.schedule("hourly").unwrap().kind,
        ScheduleKind::Interval { every: Duration::from_secs(3600) }
    );
    let nightly = reviewer.schedule("nightly").unwrap();
    assert!(matches!(nightly.kind, ScheduleKind::Cron { .. }));
    assert_eq!(nightly.prompt.as_deref(), Some("Nightly summary"));
    assert!(reviewer.schedule("on-demand").unwrap().kind.is_manual());
}

#[test]
fn paths_resolve_against_defining_document() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fleet.yaml", BASIC);
    let config = load(&dir).unwrap();
    let root_dir = dir.path().canonicalize().unwrap();

    assert_eq!(config.agent("reviewer").unwrap().working_directory, root_dir);
    assert_eq!(config.agent("tidy").unwrap().working_directory, root_dir.join("scripts"));
}

#[test]
fn nested_docker_block_merges_with_defaults() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fleet.yaml", BASIC);
    let config = load(&dir).unwrap();
    let tidy = config.agent("tidy").unwrap();

    let docker = tidy.docker.as_ref().unwrap();
    assert_eq!(docker.image, "fleet/base:1");
    assert_eq!(docker.network.as_deref(), Some("none"));
    assert_eq!(tidy.invocation, Invocation::Command { command: "./tidy.sh".to_string() });
}

#[test]
fn sub_fleet_agents_are_qualified_and_inherit_defaults() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "fleet.yaml",
        "defaults:\n  model: root-model\n  max_turns: 5\nfleets:\n  - path: teams/web.yaml\n    name: web\nagents:\n  - name: lead\n",
    );
    write(
        &dir,
        "teams/web.yaml",
        "defaults:\n  model: web-model\nweb:\n  enabled: true\nagents:\n  - name: frontend\n",
    );
    let config = load(&dir).unwrap();

    let frontend = config.agent("frontend").unwrap();
    assert_eq!(frontend.fleet_path, vec!["web"]);
    assert_eq!(frontend.qualified_name, "web.frontend");
    assert_eq!(
        frontend.working_directory,
        dir.path().canonicalize().unwrap().join("teams")
    );
    let Invocation::Runtime(runtime) = &frontend.invocation else {
        panic!("expected runtime");
    };
    assert_eq!(runtime.model.as_deref(), Some("web-model"));
    assert_eq!(runtime.max_turns, Some(5));

    assert!(config.web.is_none(), "sub-fleet web blocks are ignored");
    assert_eq!(config.fleets.len(), 1);
    assert_eq!(config.fleets[0].name, "web");
}

#[test]
fn agent_names_must_be_unique_across_fleets() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fleet.yaml", "fleets:\n  - path: sub.yaml\nagents:\n  - name: twin\n");
    write(&dir, "sub.yaml", "agents:\n  - name: twin\n");
    let err = load(&dir).unwrap_err();
    assert!(
        matches!(&err, ConfigError::FleetNameCollision { kind: "agent", name, .. } if name == "twin"),
        "got {err:?}"
    );
}

#[test]
fn agent_references_load_files_with_overrides() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "fleet.yaml",
        "agents:\n  - path: agents/helper.yaml\n    overrides:\n      model: opus\n      env:\n        MODE: fast\n",
    );
    write(
        &dir,
        "agents/helper.yaml",
        "name: helper\nmodel: haiku\nworking_directory: work\nenv:\n  MODE: slow\n  LEVEL: \"2\"\n",
    );
    let config = load(&dir).unwrap();
    let helper = config.agent("helper").unwrap();

    let Invocation::Runtime(runtime) = &helper.invocation else {
        panic!("expected runtime");
    };
    assert_eq!(runtime.model.as_deref(), Some("opus"));
    assert_eq!(helper.env.get("MODE").map(String::as_str), Some("fast"));
    assert_eq!(helper.env.get("LEVEL").map(String::as_str), Some("2"));
    assert_eq!(
        helper.working_directory,
        dir.path().canonicalize().unwrap().join("agents/work")
    );
}

#[test]
fn interpolation_uses_bound_and_default_values() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "fleet.yaml",
        "agents:\n  - name: a\n    prompt: \"Check ${REPO}\"\n    model: ${MODEL:-haiku}\n",
    );
    let vars: HashMap<String, String> = [("REPO".to_string(), "acme/api".to_string())].into();
    let config = load_config_with(dir.path(), &vars).unwrap();
    let agent = config.agent("a").unwrap();
    assert_eq!(agent.prompt.as_deref(), Some("Check acme/api"));
    let Invocation::Runtime(runtime) = &agent.invocation else {
        panic!("expected runtime");
    };
    assert_eq!(runtime.model.as_deref(), Some("haiku"));
}

#[test]
fn undefined_variable_fails_whole_load() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fleet.yaml", "agents:\n  - name: a\n    prompt: ${MISSING_TOKEN}\n");
    let err = load(&dir).unwrap_err();
    assert!(matches!(err, ConfigError::UndefinedVariable { .. }), "got {err:?}");
}

#[test]
fn validation_collects_every_issue() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "fleet.yaml",
        r#"
agents:
  - name: "bad name"
    schedules:
      no-interval:
        type: interval
      zero:
        type: interval
        interval: 0s
      bad-cron:
        type: cron
        expression: "not a cron"
      no-expr:
        type: cron
  - name: boxed
    docker:
      network: none
"#,
    );
    let err = load(&dir).unwrap_err();
    let messages: Vec<_> = err.issues().iter().map(|i| i.to_string()).collect();
    assert_eq!(messages.len(), 6, "issues: {messages:#?}");
    assert!(messages.iter().any(|m| m.contains("invalid agent name")));
    assert!(messages.iter().any(|m| m.contains("require `interval`")));
    assert!(messages.iter().any(|m| m.contains("greater than zero")));
    assert!(messages.iter().any(|m| m.contains("invalid cron expression")));
    assert!(messages.iter().any(|m| m.contains("require `expression`")));
    assert!(messages.iter().any(|m| m.contains("image must not be empty")));
}

#[test]
fn unknown_agent_field_is_reported() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fleet.yaml", "agents:\n  - name: a\n    modle: typo\n");
    let err = load(&dir).unwrap_err();
    assert_eq!(err.issues().len(), 1);
    assert!(err.issues()[0].message.contains("modle"), "got {err}");
}

#[test]
fn disabled_schedule_is_kept_but_not_timed() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "fleet.yaml",
        "agents:\n  - name: a\n    schedules:\n      s:\n        type: interval\n        interval: 5s\n        enabled: false\n",
    );
    let config = load(&dir).unwrap();
    let schedule = config.agent("a").unwrap().schedule("s").unwrap();
    assert!(!schedule.enabled);
    assert!(!schedule.is_timed());
}

#[test]
fn hooks_default_timeout_and_lists_replace() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "fleet.yaml",
        r#"
defaults:
  hooks:
    after_run:
      - run: echo default
    on_error:
      - run: echo failed
agents:
  - name: a
    hooks:
      after_run:
        - run: echo mine
          timeout: 5s
"#,
    );
    let config = load(&dir).unwrap();
    let hooks = &config.agent("a").unwrap().hooks;
    assert_eq!(hooks.after_run.len(), 1);
    assert_eq!(hooks.after_run[0].run, "echo mine");
    assert_eq!(hooks.after_run[0].timeout, Duration::from_secs(5));
    assert_eq!(hooks.on_error[0].timeout, DEFAULT_HOOK_TIMEOUT);
}

#[test]
fn session_settings_resolve() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fleet.yaml", "agents:\n  - name: a\n    session:\n      max_age: 2h\n      resume: false\n");
    let session = load(&dir).unwrap().agent("a").unwrap().session.clone();
    assert_eq!(session.max_age, Duration::from_secs(7200));
    assert!(!session.resume);
}

#[test]
fn missing_config_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = load_config(&dir.path().join("nothing-here")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got {err:?}");
}

#[test]
fn acyclic_trees_always_have_unique_agent_names() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fleet.yaml", "fleets:\n  - path: a.yaml\n  - path: b.yaml\nagents:\n  - name: r\n");
    write(&dir, "a.yaml", "agents:\n  - name: a1\n  - name: a2\n");
    write(&dir, "b.yaml", "fleets:\n  - path: c.yaml\nagents:\n  - name: b1\n");
    write(&dir, "c.yaml", "agents:\n  - name: c1\n");
    let config = load(&dir).unwrap();

    let qualified: Vec<_> = config.agents.values().map(|a| a.qualified_name.as_str()).collect();
    similar_asserts::assert_eq!(qualified, vec!["r", "a.a1", "a.a2", "b.b1", "b.c.c1"]);
}
