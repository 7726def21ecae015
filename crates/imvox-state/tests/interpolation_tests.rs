//! State animation integration tests
//!
//! Blending two complete states the way a recorded fly-through does,
//! checking which fields animate and which hold.

use imvox_state::{
    AccessMode, FromJson, Interpolate, Layer, Layout, ToJson, ViewerState,
};
use rstest::rstest;
use serde_json::json;

fn keyframe(position: [f64; 3], scale: f64, opacity: f64) -> ViewerState {
    let value = json!({
        "position": position,
        "projectionScale": scale,
        "layers": [
            {"type": "image", "name": "raw", "opacity": opacity},
            {"type": "segmentation", "name": "seg", "selectedAlpha": opacity},
        ],
        "layout": "xy-3d",
    });
    ViewerState::from_json(&value, AccessMode::ReadWrite).unwrap()
}

fn image_opacity(state: &ViewerState, name: &str) -> f64 {
    match state.layers().get(name).unwrap().layer() {
        Layer::Image(image) => image.opacity(),
        other => panic!("wrong kind: {:?}", other.kind_name()),
    }
}

// === Fly-Through Blending ===

#[rstest]
#[case(0.0, 0.0)]
#[case(0.25, 4.0)]
#[case(0.5, 8.0)]
#[case(1.0, 16.0)]
fn test_position_animates_linearly(#[case] t: f64, #[case] expected_x: f32) {
    let a = keyframe([0.0, 0.0, 0.0], 1.0, 0.5);
    let b = keyframe([16.0, 32.0, 64.0], 1.0, 0.5);
    let c = ViewerState::interpolate(&a, &b, t);
    let position = c.position().unwrap();
    assert_eq!(position[0], expected_x);
    assert_eq!(position[1], expected_x * 2.0);
    assert_eq!(position[2], expected_x * 4.0);
}

#[test]
fn test_zoom_animates_in_log_space() {
    let a = keyframe([0.0; 3], 1.0, 0.5);
    let b = keyframe([0.0; 3], 16.0, 0.5);
    let c = ViewerState::interpolate(&a, &b, 0.5);
    // Halfway between 1x and 16x is 4x, not 8.5x.
    assert_eq!(c.projection_scale(), Some(4.0));
}

#[test]
fn test_layer_blending_matches_names() {
    let a = keyframe([0.0; 3], 1.0, 0.25);
    let b = keyframe([0.0; 3], 1.0, 0.75);
    let c = ViewerState::interpolate(&a, &b, 0.5);
    assert_eq!(image_opacity(&c, "raw"), 0.5);

    let seg_alpha = match c.layers().get("seg").unwrap().layer() {
        Layer::Segmentation(seg) => seg.selected_alpha(),
        other => panic!("wrong kind: {:?}", other.kind_name()),
    };
    assert_eq!(seg_alpha, 0.5);
}

#[test]
fn test_orientation_materializes_identity() {
    let a = keyframe([0.0; 3], 1.0, 0.5);
    let b = keyframe([0.0; 3], 1.0, 0.5);
    let c = ViewerState::interpolate(&a, &b, 0.25);
    assert_eq!(c.projection_orientation(), Some([0.0, 0.0, 0.0, 1.0]));
    assert_eq!(c.cross_section_orientation(), Some([0.0, 0.0, 0.0, 1.0]));
}

#[test]
fn test_matching_orientations_hold() {
    let quarter_turn = [0.5, 0.5, 0.5, 0.5];
    let mut a = keyframe([0.0; 3], 1.0, 0.5);
    a.set_projection_orientation(Some(quarter_turn)).unwrap();
    let mut b = keyframe([0.0; 3], 1.0, 0.5);
    b.set_projection_orientation(Some(quarter_turn)).unwrap();
    let c = ViewerState::interpolate(&a, &b, 0.5);
    let q = c.projection_orientation().unwrap();
    for (got, want) in q.iter().zip(quarter_turn.iter()) {
        assert!((got - want).abs() < 1e-6, "got {q:?}");
    }
}

// === Held Fields ===

#[test]
fn test_structural_mismatches_hold_the_start() {
    let a = ViewerState::from_json(
        &json!({
            "title": "start",
            "showSlices": false,
            "layers": [
                {"type": "image", "name": "raw", "opacity": 0.25},
                {"type": "image", "name": "extra", "opacity": 0.25},
            ],
            "layout": "xy",
        }),
        AccessMode::ReadWrite,
    )
    .unwrap();
    let b = ViewerState::from_json(
        &json!({
            "title": "end",
            "layers": [
                {"type": "segmentation", "name": "raw"},
            ],
            "layout": "3d",
        }),
        AccessMode::ReadWrite,
    )
    .unwrap();
    let c = ViewerState::interpolate(&a, &b, 0.75);

    // Kind change and missing partner both hold the start layer.
    assert_eq!(image_opacity(&c, "raw"), 0.25);
    assert_eq!(image_opacity(&c, "extra"), 0.25);
    // Layout names differ, so the start layout holds.
    assert_eq!(c.layout().kind_name(), "xy");
    // Non-animated settings are carried verbatim.
    assert_eq!(c.title(), Some("start"));
    assert!(!c.show_slices());
}

#[test]
fn test_nested_group_viewers_animate() {
    let frame = |x: f64| {
        ViewerState::from_json(
            &json!({
                "layout": {
                    "type": "row",
                    "children": [{
                        "type": "viewer",
                        "layers": ["raw"],
                        "position": {"link": "unlinked", "value": [x, 0.0]},
                    }],
                },
            }),
            AccessMode::ReadWrite,
        )
        .unwrap()
    };
    let c = ViewerState::interpolate(&frame(0.0), &frame(8.0), 0.25);
    let stack = match c.layout() {
        Layout::Stack(stack) => stack,
        other => panic!("wrong kind: {:?}", other.kind_name()),
    };
    let group = match stack.children().get(0).unwrap() {
        Layout::Group(group) => group.clone(),
        other => panic!("wrong kind: {:?}", other.kind_name()),
    };
    assert_eq!(group.position().value(), Some(&vec![2.0, 0.0]));
}

// === Endpoints ===

#[test]
fn test_endpoints_recover_the_animated_fields() {
    let a = keyframe([1.0, 2.0, 3.0], 2.0, 0.25);
    let b = keyframe([5.0, 6.0, 7.0], 8.0, 0.75);

    let at_start = ViewerState::interpolate(&a, &b, 0.0);
    assert_eq!(at_start.position(), a.position());
    assert_eq!(at_start.projection_scale(), Some(2.0));
    assert_eq!(image_opacity(&at_start, "raw"), 0.25);

    let at_end = ViewerState::interpolate(&a, &b, 1.0);
    assert_eq!(at_end.position(), b.position());
    assert_eq!(at_end.projection_scale(), Some(8.0));
    assert_eq!(image_opacity(&at_end, "raw"), 0.75);
}

#[test]
fn test_interpolated_state_still_round_trips() {
    let a = keyframe([0.0; 3], 1.0, 0.25);
    let b = keyframe([16.0, 32.0, 64.0], 16.0, 0.75);
    let c = ViewerState::interpolate(&a, &b, 0.5);
    let json = c.to_json();
    let back = ViewerState::from_json(&json, AccessMode::ReadWrite).unwrap();
    assert_eq!(back.to_json(), json);
}
