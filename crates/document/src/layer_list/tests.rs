use super::*;

const RED: u32 = 0xffff0000;

fn list_with_layers(ids: &[LayerId]) -> LayerList {
    let mut list = LayerList::new();
    for &id in ids {
        list.layer_create(id, 0, None, false, false, 64, 64, format!("layer {id}"))
            .expect("create layer");
    }
    list
}

#[test]
fn create_stacks_on_top() {
    let list = list_with_layers(&[1, 2, 3]);
    assert_eq!(list.layer_ids(), vec![1, 2, 3]);
}

#[test]
fn create_rejects_duplicate_and_zero_ids() {
    let mut list = list_with_layers(&[1]);
    assert!(matches!(
        list.layer_create(1, 0, None, false, false, 64, 64, String::new()),
        Err(StateError::LayerExists { layer_id: 1 })
    ));
    assert!(matches!(
        list.layer_create(0, 0, None, false, false, 64, 64, String::new()),
        Err(StateError::InvalidArgument(_))
    ));
}

#[test]
fn insert_goes_just_above_the_source() {
    let mut list = list_with_layers(&[1, 2]);
    list.layer_create(3, 1, None, true, false, 64, 64, String::new())
        .expect("insert layer");
    assert_eq!(list.layer_ids(), vec![1, 3, 2]);
}

#[test]
fn copy_duplicates_source_content() {
    let mut list = list_with_layers(&[1]);
    list.fill_rect(1, 1, model::BlendMode::Normal, 0, 0, 4, 4, RED)
        .expect("fill");
    list.layer_create(2, 1, None, false, true, 64, 64, String::new())
        .expect("copy layer");

    let copy = list.find(2).expect("layer 2");
    assert_eq!(copy.content.to_image().pixel_at(0, 0).to_bgra(), RED);
    // The copy shares the source's tiles until one of them is written.
    assert!(Tile::ptr_eq(
        copy.content.tile_at_index(0),
        list.find(1).expect("layer 1").content.tile_at_index(0)
    ));
}

#[test]
fn copy_of_unknown_source_fails() {
    let mut list = list_with_layers(&[1]);
    assert!(matches!(
        list.layer_create(2, 9, None, false, true, 64, 64, String::new()),
        Err(StateError::LayerNotFound { layer_id: 9 })
    ));
}

#[test]
fn reorder_applies_the_permutation() {
    let mut list = list_with_layers(&[1, 2, 3]);
    list.layer_reorder(&[3, 1, 2]).expect("reorder");
    assert_eq!(list.layer_ids(), vec![3, 1, 2]);
    // Every id still resolves.
    assert!(list.find(1).is_some());
    assert!(list.find(2).is_some());
    assert!(list.find(3).is_some());
}

#[test]
fn reorder_rejects_unknown_and_duplicate_ids() {
    let mut list = list_with_layers(&[1, 2]);
    assert!(matches!(
        list.layer_reorder(&[1, 9]),
        Err(StateError::LayerNotFound { layer_id: 9 })
    ));
    assert!(matches!(
        list.layer_reorder(&[1, 1]),
        Err(StateError::InvalidArgument(_))
    ));
    assert!(matches!(
        list.layer_reorder(&[1]),
        Err(StateError::InvalidArgument(_))
    ));
    assert_eq!(list.layer_ids(), vec![1, 2]);
}

#[test]
fn attr_retitle_visibility_mutate_props() {
    let mut list = list_with_layers(&[1]);
    list.layer_attr(1, 0, 128, model::BlendMode::Multiply, true, false)
        .expect("attr");
    list.layer_retitle(1, "renamed".to_string()).expect("retitle");
    list.layer_visibility(1, false).expect("visibility");

    let layer = list.find(1).expect("layer 1");
    assert_eq!(layer.props.opacity, 128);
    assert_eq!(layer.props.blend_mode, model::BlendMode::Multiply);
    assert!(layer.props.censored);
    assert_eq!(layer.props.title, "renamed");
    assert!(!layer.props.visible);
}

#[test]
fn attr_with_sublayer_id_configures_the_sublayer() {
    let mut list = list_with_layers(&[1]);
    list.layer_attr(1, 7, 0x80, model::BlendMode::Multiply, false, false)
        .expect("sublayer attr");
    let layer = list.find(1).expect("layer 1");
    let sublayer = &layer.content.sub_layers()[0];
    assert_eq!(sublayer.props.sublayer_id, 7);
    assert_eq!(sublayer.props.opacity, 0x80);
    assert_eq!(sublayer.props.blend_mode, model::BlendMode::Multiply);
    // The layer's own props are untouched.
    assert_eq!(layer.props.opacity, 255);
}

#[test]
fn delete_without_merge_drops_the_layer() {
    let mut list = list_with_layers(&[1, 2]);
    list.layer_delete(1, 2, false).expect("delete");
    assert_eq!(list.layer_ids(), vec![1]);
    assert!(matches!(
        list.layer_delete(1, 2, false),
        Err(StateError::LayerNotFound { layer_id: 2 })
    ));
}

#[test]
fn delete_with_merge_composites_into_the_layer_below() {
    let mut list = list_with_layers(&[1, 2]);
    list.fill_rect(1, 2, model::BlendMode::Normal, 0, 0, 4, 4, RED)
        .expect("fill");
    list.layer_delete(1, 2, true).expect("merge delete");
    assert_eq!(list.layer_ids(), vec![1]);
    let below = list.find(1).expect("layer 1");
    assert_eq!(below.content.to_image().pixel_at(0, 0).to_bgra(), RED);
}

#[test]
fn delete_with_merge_fails_on_the_bottom_layer() {
    let mut list = list_with_layers(&[1]);
    assert!(matches!(
        list.layer_delete(1, 1, true),
        Err(StateError::InvalidArgument(_))
    ));
    assert_eq!(list.layer_ids(), vec![1]);
}

#[test]
fn routed_writes_fail_on_unknown_layers() {
    let mut list = list_with_layers(&[1]);
    let image = crate::image::Image::new(2, 2);
    assert!(matches!(
        list.put_image(1, 9, model::BlendMode::Normal, 0, 0, &image),
        Err(StateError::LayerNotFound { layer_id: 9 })
    ));
    let tile = Tile::from_solid_color(1, RED);
    assert!(matches!(
        list.put_tile(&tile, 9, 0, 0, 0, 0),
        Err(StateError::LayerNotFound { layer_id: 9 })
    ));
}

#[test]
fn context_sublayer_queries_stay_read_only() {
    let mut list = list_with_layers(&[1, 2]);
    assert!(!list.has_context_sublayers(7));
    assert!(!list.merge_context_sublayers(7));

    list.layer_attr(2, 7, 255, model::BlendMode::Normal, false, false)
        .expect("sublayer attr");
    assert!(list.has_context_sublayers(7));
    assert!(list.merge_context_sublayers(7));
    assert!(!list.has_context_sublayers(7));
}
