use super::*;

fn table() -> ControlValues {
    let unminted = BTreeMap::from([("517-0".to_string(), 3.0), ("518-1".to_string(), 40.0)]);
    let minted = BTreeMap::from([("518-1".to_string(), 55.0)]);
    ControlValues::new(516, unminted, minted)
}

#[test]
fn absent_everywhere_resolves_to_zero() {
    let values = table();
    let r = ControlRef {
        token_id: 9,
        lever_id: 9,
    };
    assert_eq!(values.resolve_ref(&r), 0.0);
}

#[test]
fn override_wins_over_defaults() {
    let values = table().with_overrides(BTreeMap::from([("517-0".to_string(), 12.0)]));
    let r = ControlRef {
        token_id: 1,
        lever_id: 0,
    };
    assert_eq!(values.resolve_ref(&r), 12.0);
}

#[test]
fn minted_shadows_unminted() {
    let values = table();
    let r = ControlRef {
        token_id: 2,
        lever_id: 1,
    };
    assert_eq!(values.resolve_ref(&r), 55.0);
}

#[test]
fn key_incorporates_master_token_offset() {
    let values = table();
    let r = ControlRef {
        token_id: 2,
        lever_id: 1,
    };
    assert_eq!(values.key_for(&r), "518-1");
}

#[test]
fn oversized_token_id_saturates_instead_of_panicking() {
    let values = table();
    let r = ControlRef {
        token_id: u64::MAX,
        lever_id: 3,
    };
    assert_eq!(values.key_for(&r), format!("{}-3", u64::MAX));
    assert_eq!(values.resolve_ref(&r), 0.0);
}

#[test]
fn literal_values_pass_through() {
    let values = table();
    assert_eq!(values.resolve(&Value::Number(-7.5)), -7.5);
    assert_eq!(
        values.resolve(&Value::Ref(ControlRef {
            token_id: 1,
            lever_id: 0,
        })),
        3.0
    );
}
