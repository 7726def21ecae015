//! Property-based tests over the state tree
//!
//! Generated states use dyadic fractions so linear blends and f32
//! narrowing stay exact.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use imvox_state::{
    hex_string_from_segment_id, AccessMode, FromJson, ImageLayer, Interpolate, Layer, Layers,
    SegmentationLayer, ToJson, ViewerState,
};

fn dyadic() -> impl Strategy<Value = f64> {
    (0i32..=64).prop_map(|n| f64::from(n) / 4.0)
}

fn unit_dyadic() -> impl Strategy<Value = f64> {
    (0i32..=4).prop_map(|n| f64::from(n) / 4.0)
}

fn layer_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn arb_layer_json() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        (layer_name(), unit_dyadic()).prop_map(|(name, opacity)| {
            json!({"type": "image", "name": name, "opacity": opacity})
        }),
        (layer_name(), prop::collection::btree_set(any::<u32>(), 0..5)).prop_map(
            |(name, ids)| {
                let segments: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                json!({"type": "segmentation", "name": name, "segments": segments})
            }
        ),
    ]
}

fn arb_state_json() -> impl Strategy<Value = serde_json::Value> {
    (
        prop::collection::vec(dyadic(), 1..4),
        prop::collection::vec(arb_layer_json(), 0..4),
        proptest::sample::select(vec!["xy", "4panel", "3d", "xz-3d"]),
    )
        .prop_map(|(position, layers, layout)| {
            json!({
                "position": position,
                "layers": layers,
                "layout": layout,
            })
        })
}

proptest! {
    // === Round Trip ===

    #[test]
    fn test_emission_is_a_fixed_point(input in arb_state_json()) {
        let first = ViewerState::from_json(&input, AccessMode::ReadWrite)
            .unwrap()
            .to_json();
        let second = ViewerState::from_json(&first, AccessMode::ReadWrite)
            .unwrap()
            .to_json();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_unrecognized_keys_are_never_dropped(
        key in "ext[A-Za-z]{0,8}",
        flag in any::<bool>(),
        count in any::<i32>(),
    ) {
        let payload = json!({"flag": flag, "count": count});
        let mut input = Map::new();
        input.insert("title".to_string(), json!("session"));
        input.insert(key.clone(), payload.clone());
        let state =
            ViewerState::from_json(&Value::Object(input), AccessMode::ReadWrite).unwrap();
        let emitted = state.to_json();
        prop_assert_eq!(&emitted[key.as_str()], &payload);
    }

    #[test]
    fn test_visible_segments_survive_emission(
        ids in prop::collection::btree_set(any::<u64>(), 0..8)
    ) {
        let ids: Vec<u64> = ids.into_iter().collect();
        let mut seg = SegmentationLayer::new();
        seg.set_segments(ids.clone()).unwrap();
        let listed: Vec<u64> = seg.segments().iter().collect();
        prop_assert_eq!(&listed, &ids);

        let back = SegmentationLayer::from_json(&seg.to_json(), AccessMode::ReadWrite).unwrap();
        let relisted: Vec<u64> = back.segments().iter().collect();
        prop_assert_eq!(&relisted, &ids);
    }

    // === Collection Behavior ===

    #[test]
    fn test_upsert_by_name_never_grows_twice(
        names in prop::collection::vec(layer_name(), 1..6)
    ) {
        let mut layers = Layers::new();
        for name in &names {
            layers.set(name.clone(), ImageLayer::new()).unwrap();
        }
        let after_first_pass = layers.len();
        for name in &names {
            layers.set(name.clone(), ImageLayer::new()).unwrap();
        }
        prop_assert_eq!(layers.len(), after_first_pass);

        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(after_first_pass, unique.len());
    }

    // === Interpolation ===

    #[test]
    fn test_blend_endpoints_recover_inputs(
        (xs, ys) in (1usize..4).prop_flat_map(|len| (
            prop::collection::vec(dyadic(), len..=len),
            prop::collection::vec(dyadic(), len..=len),
        )),
        opacity_a in unit_dyadic(),
        opacity_b in unit_dyadic(),
    ) {
        let build = |position: &[f64], opacity: f64| {
            ViewerState::from_json(
                &json!({
                    "position": position,
                    "layers": [{"type": "image", "name": "raw", "opacity": opacity}],
                }),
                AccessMode::ReadWrite,
            )
            .unwrap()
        };
        let a = build(&xs, opacity_a);
        let b = build(&ys, opacity_b);

        let start = ViewerState::interpolate(&a, &b, 0.0);
        prop_assert_eq!(start.position(), a.position());
        let end = ViewerState::interpolate(&a, &b, 1.0);
        prop_assert_eq!(end.position(), b.position());
    }

    #[test]
    fn test_blend_stays_within_bounds(
        x_a in dyadic(),
        x_b in dyadic(),
        t in unit_dyadic(),
    ) {
        let build = |x: f64| {
            ViewerState::from_json(
                &json!({"position": [x, 0.0]}),
                AccessMode::ReadWrite,
            )
            .unwrap()
        };
        let c = ViewerState::interpolate(&build(x_a), &build(x_b), t);
        let got = c.position().unwrap()[0] as f64;
        prop_assert!(got >= x_a.min(x_b) && got <= x_a.max(x_b), "got {got}");
    }

    #[test]
    fn test_blended_states_still_parse(
        input_a in arb_state_json(),
        input_b in arb_state_json(),
        t in unit_dyadic(),
    ) {
        let a = ViewerState::from_json(&input_a, AccessMode::ReadWrite).unwrap();
        let b = ViewerState::from_json(&input_b, AccessMode::ReadWrite).unwrap();
        let c = ViewerState::interpolate(&a, &b, t);
        let emitted = c.to_json();
        let back = ViewerState::from_json(&emitted, AccessMode::ReadWrite).unwrap();
        prop_assert_eq!(back.to_json(), emitted);
    }

    // === Segment Colors ===

    #[test]
    fn test_segment_colors_are_stable_css_hex(
        seed in any::<u32>(),
        id in any::<u64>(),
    ) {
        let color = hex_string_from_segment_id(seed, id);
        prop_assert_eq!(color.len(), 7);
        prop_assert!(color.starts_with('#'));
        prop_assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        prop_assert_eq!(color.clone(), hex_string_from_segment_id(seed, id));
    }
}

// === Deterministic Spot Checks ===

#[test]
fn test_mid_blend_is_exact_for_dyadics() {
    let a = ViewerState::from_json(
        &json!({"position": [0.25, 0.5], "layers": [{"type": "image", "name": "x", "opacity": 0.25}]}),
        AccessMode::ReadWrite,
    )
    .unwrap();
    let b = ViewerState::from_json(
        &json!({"position": [0.75, 1.0], "layers": [{"type": "image", "name": "x", "opacity": 0.75}]}),
        AccessMode::ReadWrite,
    )
    .unwrap();
    let c = ViewerState::interpolate(&a, &b, 0.5);
    assert_eq!(c.position(), Some(&vec![0.5, 0.75]));
    let opacity = match c.layers().get("x").unwrap().layer() {
        Layer::Image(image) => image.opacity(),
        other => panic!("wrong kind: {:?}", other.kind_name()),
    };
    assert_eq!(opacity, 0.5);
}
