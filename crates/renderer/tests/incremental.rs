//! Diff and incremental render driven through the command interpreter,
//! the way an observer of the snapshot stream uses them.

use std::sync::Arc;

use document::{CanvasState, Image, LayerContent};
use engine::DrawContext;
use protocol::Message;
use renderer::diff::diff_canvas_states;
use renderer::{render_canvas, CanvasDiff};

fn apply(state: &Arc<CanvasState>, message: Message) -> Arc<CanvasState> {
    let mut dc = DrawContext::new();
    engine::handle(state, &mut dc, &message).expect("handle message")
}

fn canvas_with_layer(size: i32) -> Arc<CanvasState> {
    let state = Arc::new(CanvasState::new());
    let state = apply(
        &state,
        Message::CanvasResize {
            context_id: 1,
            top: 0,
            right: size,
            bottom: size,
            left: 0,
        },
    );
    apply(
        &state,
        Message::LayerCreate {
            context_id: 1,
            layer_id: 1,
            source_id: 0,
            fill: 0,
            flags: 0,
            title: "base".to_string(),
        },
    )
}

fn solid_image_payload(size: u32, bgra: u32) -> Vec<u8> {
    let mut image = Image::new(size, size);
    for pixel in image.pixels_mut() {
        *pixel = model::Pixel::from_bgra(bgra);
    }
    image.deflate().expect("deflate")
}

fn changed_tiles(diff: &CanvasDiff) -> Vec<usize> {
    let mut indexes = Vec::new();
    diff.each_index(|index| indexes.push(index));
    indexes
}

#[test]
fn put_image_marks_only_the_touched_tile() {
    let state = canvas_with_layer(128);
    let next = apply(
        &state,
        Message::PutImage {
            context_id: 1,
            layer_id: 1,
            blend_mode: model::BlendMode::Normal.raw(),
            x: 0,
            y: 0,
            width: 32,
            height: 32,
            image: solid_image_payload(32, 0xffff0000),
        },
    );

    let mut diff = CanvasDiff::new();
    diff_canvas_states(&next, Some(&state), &mut diff);
    assert_eq!(changed_tiles(&diff), vec![0]);
    assert!(!diff.layer_props_changed_reset());
}

#[test]
fn diff_against_self_is_clean() {
    let state = canvas_with_layer(128);
    let mut diff = CanvasDiff::new();
    diff_canvas_states(&state, Some(&state), &mut diff);
    assert!(!diff.tiles_changed());
}

#[test]
fn diff_without_a_previous_snapshot_marks_nothing_extra() {
    let state = canvas_with_layer(128);
    let mut diff = CanvasDiff::new();
    diff_canvas_states(&state, None, &mut diff);
    // A brand-new canvas has no old dimensions to compare against, so
    // everything counts as changed.
    assert_eq!(changed_tiles(&diff).len(), 4);
}

#[test]
fn identical_commands_diff_clean_across_snapshots() {
    let state = canvas_with_layer(128);
    let message = Message::FillRect {
        context_id: 1,
        layer_id: 1,
        blend_mode: model::BlendMode::Normal.raw(),
        x: 0,
        y: 0,
        width: 16,
        height: 16,
        color: 0xffff0000,
    };
    let first = apply(&state, message.clone());
    let second = apply(&first, message);
    assert!(!Arc::ptr_eq(&first, &second));

    let mut diff = CanvasDiff::new();
    diff_canvas_states(&second, Some(&first), &mut diff);
    assert!(!diff.tiles_changed());
}

#[test]
fn resize_marks_every_tile() {
    let state = canvas_with_layer(128);
    let next = apply(
        &state,
        Message::CanvasResize {
            context_id: 1,
            top: 0,
            right: 64,
            bottom: 0,
            left: 0,
        },
    );
    let mut diff = CanvasDiff::new();
    diff_canvas_states(&next, Some(&state), &mut diff);
    assert_eq!(changed_tiles(&diff).len(), 6);
}

#[test]
fn background_change_marks_every_tile() {
    let state = canvas_with_layer(128);
    let next = apply(
        &state,
        Message::CanvasBackground {
            context_id: 1,
            tile: protocol::TilePayload::Color(0xff112233),
        },
    );
    let mut diff = CanvasDiff::new();
    diff_canvas_states(&next, Some(&state), &mut diff);
    assert_eq!(changed_tiles(&diff).len(), 4);
}

#[test]
fn opacity_change_marks_the_layer_and_sets_the_props_flag() {
    let state = canvas_with_layer(128);
    let state = apply(
        &state,
        Message::FillRect {
            context_id: 1,
            layer_id: 1,
            blend_mode: model::BlendMode::Normal.raw(),
            x: 0,
            y: 0,
            width: 16,
            height: 16,
            color: 0xffff0000,
        },
    );
    let next = apply(
        &state,
        Message::LayerAttr {
            layer_id: 1,
            sublayer_id: 0,
            opacity: 128,
            blend_mode: model::BlendMode::Normal.raw(),
            flags: 0,
        },
    );

    let mut diff = CanvasDiff::new();
    diff_canvas_states(&next, Some(&state), &mut diff);
    // Only the tile the layer actually occupies re-renders.
    assert_eq!(changed_tiles(&diff), vec![0]);
    assert!(diff.layer_props_changed_reset());
}

#[test]
fn retitle_sets_the_props_flag_without_dirtying_tiles() {
    let state = canvas_with_layer(128);
    let next = apply(
        &state,
        Message::LayerRetitle {
            layer_id: 1,
            title: "renamed".to_string(),
        },
    );
    let mut diff = CanvasDiff::new();
    diff_canvas_states(&next, Some(&state), &mut diff);
    assert!(!diff.tiles_changed());
    assert!(diff.layer_props_changed_reset());
}

#[test]
fn incremental_render_tracks_the_flat_image() {
    let mut target = LayerContent::new(0, 0, None);
    let mut previous: Option<Arc<CanvasState>> = None;
    let mut state = Arc::new(CanvasState::new());

    let script = vec![
        Message::CanvasResize {
            context_id: 1,
            top: 0,
            right: 192,
            bottom: 128,
            left: 0,
        },
        Message::LayerCreate {
            context_id: 1,
            layer_id: 1,
            source_id: 0,
            fill: 0,
            flags: 0,
            title: "base".to_string(),
        },
        Message::CanvasBackground {
            context_id: 1,
            tile: protocol::TilePayload::Color(0xffffffff),
        },
        Message::FillRect {
            context_id: 1,
            layer_id: 1,
            blend_mode: model::BlendMode::Normal.raw(),
            x: 10,
            y: 10,
            width: 100,
            height: 60,
            color: 0xffff0000,
        },
        Message::FillRect {
            context_id: 1,
            layer_id: 1,
            blend_mode: model::BlendMode::Multiply.raw(),
            x: 60,
            y: 30,
            width: 100,
            height: 60,
            color: 0xff00ff00,
        },
    ];

    let mut diff = CanvasDiff::new();
    for message in script {
        let next = apply(&state, message);
        diff_canvas_states(&next, previous.as_deref(), &mut diff);
        render_canvas(&next, &mut target, &diff);
        previous = Some(Arc::clone(&next));
        state = next;
    }

    assert_eq!(
        target.to_image(),
        state.to_flat_image(true).expect("flat image")
    );
}
