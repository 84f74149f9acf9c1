use super::*;

fn layer(id: &str, anchor: Option<&str>) -> LayerDescriptor {
    LayerDescriptor {
        id: id.to_string(),
        anchor: anchor.map(str::to_string),
        uri: Some(format!("ipfs://{id}")),
        states: None,
        transform: TransformSpec::default(),
    }
}

fn master(layers: Vec<LayerDescriptor>) -> MasterMetadata {
    MasterMetadata {
        name: "piece".to_string(),
        description: String::new(),
        image: "ipfs://master".to_string(),
        layout: Layout { version: 1, layers },
        attributes: vec![],
        async_attributes: None,
    }
}

#[test]
fn backward_anchors_validate() {
    let meta = master(vec![
        layer("bg", None),
        layer("fg", Some("bg")),
        layer("accent", Some("fg")),
    ]);
    assert!(meta.validate().is_ok());
}

#[test]
fn forward_anchor_is_rejected() {
    let meta = master(vec![layer("fg", Some("bg")), layer("bg", None)]);
    let err = meta.validate().unwrap_err();
    assert!(matches!(err, LaminaError::MetadataInvalid(_)));
    assert!(err.to_string().contains("does not appear earlier"));
}

#[test]
fn self_anchor_is_rejected() {
    let meta = master(vec![layer("bg", Some("bg"))]);
    assert!(matches!(
        meta.validate(),
        Err(LaminaError::MetadataInvalid(_))
    ));
}

#[test]
fn duplicate_layer_ids_are_rejected() {
    let meta = master(vec![layer("bg", None), layer("bg", None)]);
    assert!(matches!(
        meta.validate(),
        Err(LaminaError::MetadataInvalid(_))
    ));
}

#[test]
fn document_round_trips_from_wire_json() {
    let raw = serde_json::json!({
        "name": "First Supper",
        "image": "ipfs://QmMaster/master.png",
        "layout": {
            "version": 1,
            "layers": [
                { "id": "bg", "uri": "ipfs://QmBg" },
                {
                    "id": "moon",
                    "anchor": "bg",
                    "states": {
                        "options": ["ipfs://QmNew", "ipfs://QmFull"],
                        "token-id": 2, "lever-id": 0,
                    },
                    "transform": {
                        "relative-position": {
                            "x": { "token-id": 2, "lever-id": 1 },
                            "y": 120,
                        },
                        "opacity": 0.8,
                    },
                },
            ],
        },
        "async-attributes": {
            "artists": ["a"],
            "unminted-token-values": { "518-0": 1.0 },
        },
    });

    let meta: MasterMetadata = serde_json::from_value(raw).unwrap();
    meta.validate().unwrap();
    assert_eq!(meta.layout.layers.len(), 2);
    assert_eq!(meta.unminted_token_values().get("518-0"), Some(&1.0));

    let moon = &meta.layout.layers[1];
    let states = moon.states.as_ref().unwrap();
    assert_eq!(states.selector.token_id, 2);
    let rel = moon.transform.relative_position.as_ref().unwrap();
    assert_eq!(rel.y, Value::Number(120.0));
}

#[test]
fn active_state_uri_selects_and_clamps() {
    let values = ControlValues::new(
        516,
        BTreeMap::from([("518-0".to_string(), 1.0)]),
        BTreeMap::new(),
    );
    let mut moon = layer("moon", None);
    moon.uri = None;
    moon.states = Some(LayerStates {
        options: vec!["ipfs://QmNew".to_string(), "ipfs://QmFull".to_string()],
        selector: ControlRef {
            token_id: 2,
            lever_id: 0,
        },
    });

    assert_eq!(moon.active_state_uri(&values), Some("ipfs://QmFull"));

    // Out-of-range selector clamps to the last option.
    let values = ControlValues::new(
        516,
        BTreeMap::from([("518-0".to_string(), 40.0)]),
        BTreeMap::new(),
    );
    assert_eq!(moon.active_state_uri(&values), Some("ipfs://QmFull"));

    // Unset selector resolves to 0 and picks the first option.
    let values = ControlValues::new(516, BTreeMap::new(), BTreeMap::new());
    assert_eq!(moon.active_state_uri(&values), Some("ipfs://QmNew"));
}

#[test]
fn layer_without_any_source_yields_none() {
    let mut bare = layer("bare", None);
    bare.uri = None;
    let values = ControlValues::new(0, BTreeMap::new(), BTreeMap::new());
    assert_eq!(bare.active_state_uri(&values), None);
}
