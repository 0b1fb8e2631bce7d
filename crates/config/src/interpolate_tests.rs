// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[yare::parameterized(
    no_placeholders = { "plain text", "plain text" },
    bound           = { "hi ${NAME}", "hi fleet" },
    twice           = { "${NAME}-${NAME}", "fleet-fleet" },
    default_unused  = { "${NAME:-other}", "fleet" },
    default_used    = { "${MISSING:-fallback}", "fallback" },
    empty_default   = { "[${MISSING:-}]", "[]" },
    not_a_var       = { "cost: $5 {x}", "cost: $5 {x}" },
)]
fn interpolate_str_cases(input: &str, expected: &str) {
    let env = vars(&[("NAME", "fleet")]);
    assert_eq!(interpolate_str(input, &env, "x").unwrap(), expected);
}

#[test]
fn undefined_variable_names_placeholder_and_location() {
    let err = interpolate_str("${NOPE}", &vars(&[]), "agents[0].prompt").unwrap_err();
    match err {
        ConfigError::UndefinedVariable { name, location } => {
            assert_eq!(name, "NOPE");
            assert_eq!(location, "agents[0].prompt");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn nested_values_are_interpolated_but_keys_are_not() {
    let doc: Value = serde_yml::from_str(
        "agents:\n  - name: ${NAME}\n    env:\n      ${KEY}: ${NAME}\n    max_turns: 3\n",
    )
    .unwrap();
    let out = interpolate_value(&doc, &vars(&[("NAME", "bot")]), "").unwrap();
    let agent = &out["agents"][0];
    assert_eq!(agent["name"], Value::from("bot"));
    assert_eq!(agent["env"]["${KEY}"], Value::from("bot"));
    assert_eq!(agent["max_turns"], Value::from(3));
}

#[test]
fn error_location_is_field_path() {
    let doc: Value = serde_yml::from_str("agents:\n  - name: a\n    prompt: ${X}\n").unwrap();
    let err = interpolate_value(&doc, &vars(&[]), "").unwrap_err();
    assert!(
        matches!(&err, ConfigError::UndefinedVariable { location, .. } if location == "agents[0].prompt"),
        "got {err:?}"
    );
}

#[test]
#[serial_test::serial]
fn process_env_is_consulted() {
    std::env::set_var("FLEET_TEST_INTERP", "from-env");
    let out = interpolate_str("${FLEET_TEST_INTERP}", &ProcessEnv, "x");
    std::env::remove_var("FLEET_TEST_INTERP");
    assert_eq!(out.unwrap(), "from-env");
}

proptest! {
    // Any document containing an unbound placeholder fails as a whole.
    #[test]
    fn unresolved_placeholder_always_fails(
        prefix in "[a-z ]{0,8}",
        bound in proptest::collection::vec("[a-z]{1,6}", 0..4),
        position in 0usize..4,
    ) {
        let env = vars(&[("SET", "v")]);
        let mut items: Vec<Value> =
            bound.iter().map(|s| Value::from(format!("{prefix}${{SET}}{s}"))).collect();
        let at = position.min(items.len());
        items.insert(at, Value::from(format!("{prefix}${{UNSET_VAR}}")));
        let doc = Value::Sequence(items);

        let result = interpolate_value(&doc, &env, "");
        let is_undefined = matches!(result, Err(ConfigError::UndefinedVariable { .. }));
        prop_assert!(is_undefined);
    }

    #[test]
    fn fully_bound_documents_leave_no_placeholders(words in proptest::collection::vec("[a-z]{1,6}", 1..5)) {
        let env = vars(&[("SET", "v")]);
        let doc = Value::Sequence(words.iter().map(|w| Value::from(format!("${{SET}}{w}"))).collect());
        let out = interpolate_value(&doc, &env, "").unwrap();
        for item in out.as_sequence().unwrap() {
            prop_assert!(!item.as_str().unwrap().contains("${"), "placeholder left in output");
        }
    }
}
