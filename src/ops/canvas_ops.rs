// ============================================================================
// CANVAS-LEVEL OPERATIONS — add / duplicate / delete / resize / clear
// ============================================================================

use crate::canvas::{Layer, LayerStack, check_canvas_dimensions};
use crate::error::{CanvasError, CanvasResult};

/// Append a new transparent, visible layer on top and make it active.
/// Returns the new layer's index.
pub fn add_layer(state: &mut LayerStack) -> CanvasResult<usize> {
    let name = format!("Layer {}", state.layers.len() + 1);
    let layer = Layer::new(name, state.width, state.height)?;
    state.layers.push(layer);
    state.active_layer_index = state.layers.len() - 1;

    crate::log_info!(
        "Added layer '{}' ({} layers)",
        state.layers[state.active_layer_index].name,
        state.layers.len()
    );
    Ok(state.active_layer_index)
}

/// Append a deep copy of the active layer on top and make it active.
/// Returns the new layer's index.
pub fn duplicate_active_layer(state: &mut LayerStack) -> usize {
    let dup = state.active_layer().duplicate();
    crate::log_info!("Duplicated layer into '{}'", dup.name);
    state.layers.push(dup);
    state.active_layer_index = state.layers.len() - 1;
    state.active_layer_index
}

/// Delete the active layer. Refused when it is the only one left.
pub fn delete_active_layer(state: &mut LayerStack) -> CanvasResult<()> {
    delete_layer(state, state.active_layer_index)
}

/// Delete the layer at `index` (must keep at least one layer).
/// The active index is clamped to the new last layer if it fell off the end.
pub fn delete_layer(state: &mut LayerStack, index: usize) -> CanvasResult<()> {
    if state.layers.len() <= 1 {
        crate::log_warn!("Refused to delete the last remaining layer");
        return Err(CanvasError::LastLayerProtected);
    }
    if index >= state.layers.len() {
        return Err(CanvasError::InvalidIndex {
            index,
            len: state.layers.len(),
        });
    }

    let removed = state.layers.remove(index);
    if state.active_layer_index >= state.layers.len() {
        state.active_layer_index = state.layers.len() - 1;
    }

    crate::log_info!(
        "Deleted layer '{}' ({} layers left)",
        removed.name,
        state.layers.len()
    );
    Ok(())
}

/// Crop/extend every layer to the new canvas size, keeping each layer's
/// content anchored at the top-left. Rejected sizes leave everything untouched.
pub fn resize_canvas(state: &mut LayerStack, width: u32, height: u32) -> CanvasResult<()> {
    if let Err(e) = check_canvas_dimensions(width, height) {
        crate::log_warn!("Rejected canvas resize to {}×{}", width, height);
        return Err(e);
    }
    for layer in &mut state.layers {
        layer.surface.resize(width, height)?;
    }
    crate::log_info!(
        "Resized canvas {}×{} → {}×{}",
        state.width,
        state.height,
        width,
        height
    );
    state.width = width;
    state.height = height;
    Ok(())
}

/// Erase the active layer to transparency.
pub fn clear_active_layer(state: &mut LayerStack) {
    state.active_layer_mut().surface.clear();
}

/// Erase every layer to transparency. Layers themselves are kept.
pub fn clear_all_layers(state: &mut LayerStack) {
    for layer in &mut state.layers {
        layer.surface.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn stack() -> LayerStack {
        LayerStack::new(64, 48).unwrap()
    }

    #[test]
    fn add_appends_and_activates() {
        let mut s = stack();
        assert_eq!(add_layer(&mut s).unwrap(), 1);
        assert_eq!(add_layer(&mut s).unwrap(), 2);
        assert_eq!(s.active_layer_index(), 2);
        let names: Vec<_> = s.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Layer 1", "Layer 2", "Layer 3"]);
        assert!(s.layers().iter().all(|l| l.visible));
        assert!(s.layers().iter().all(|l| l.surface.width() == 64));
    }

    #[test]
    fn last_layer_cannot_be_deleted() {
        let mut s = stack();
        s.active_layer_mut().surface.put_pixel(3, 3, RED);
        let id = s.active_layer().id;
        assert!(matches!(
            delete_active_layer(&mut s),
            Err(CanvasError::LastLayerProtected)
        ));
        assert_eq!(s.len(), 1);
        assert_eq!(s.active_layer().id, id);
        assert_eq!(s.active_layer().surface.get_pixel(3, 3), Some(RED));
    }

    #[test]
    fn delete_clamps_active_index() {
        let mut s = stack();
        add_layer(&mut s).unwrap();
        add_layer(&mut s).unwrap();
        delete_active_layer(&mut s).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.active_layer_index(), 1);

        s.set_active(0).unwrap();
        delete_active_layer(&mut s).unwrap();
        assert_eq!(s.active_layer_index(), 0);
        assert_eq!(s.active_layer().name, "Layer 2");
    }

    #[test]
    fn delete_below_active_keeps_index_in_range() {
        let mut s = stack();
        add_layer(&mut s).unwrap();
        add_layer(&mut s).unwrap();
        delete_layer(&mut s, 0).unwrap();
        assert!(s.active_layer_index() < s.len());
        assert!(delete_layer(&mut s, 9).is_err());
    }

    #[test]
    fn duplicate_is_isolated() {
        let mut s = stack();
        s.active_layer_mut().surface.put_pixel(5, 5, RED);
        let idx = duplicate_active_layer(&mut s);
        assert_eq!(idx, 1);
        assert_eq!(s.active_layer().name, "Layer 1 copy");
        assert_eq!(s.active_layer().surface.get_pixel(5, 5), Some(RED));

        // Mutate the copy, original stays put.
        s.active_layer_mut().surface.put_pixel(5, 5, GREEN);
        assert_eq!(s.layer(0).unwrap().surface.get_pixel(5, 5), Some(RED));

        // And the other way round.
        s.layer_mut(0).unwrap().surface.put_pixel(6, 6, GREEN);
        assert_eq!(s.layer(1).unwrap().surface.get_pixel(6, 6), Some(image::Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn resize_keeps_each_layer_content() {
        let mut s = stack();
        s.active_layer_mut().surface.put_pixel(10, 10, RED);
        add_layer(&mut s).unwrap();
        s.active_layer_mut().surface.put_pixel(60, 40, GREEN);

        resize_canvas(&mut s, 100, 50).unwrap();
        assert_eq!((s.width(), s.height()), (100, 50));
        assert_eq!(s.layer(0).unwrap().surface.get_pixel(10, 10), Some(RED));
        assert_eq!(s.layer(1).unwrap().surface.get_pixel(60, 40), Some(GREEN));
        assert!(s.layers().iter().all(|l| l.surface.width() == 100));
    }

    #[test]
    fn resize_out_of_range_is_rejected() {
        let mut s = stack();
        assert!(resize_canvas(&mut s, 49, 100).is_err());
        assert!(resize_canvas(&mut s, 100, 4001).is_err());
        assert_eq!((s.width(), s.height()), (64, 48));
    }

    #[test]
    fn clear_operations() {
        let mut s = stack();
        s.active_layer_mut().surface.put_pixel(1, 1, RED);
        add_layer(&mut s).unwrap();
        s.active_layer_mut().surface.put_pixel(2, 2, GREEN);

        clear_active_layer(&mut s);
        assert!(s.active_layer().surface.is_transparent());
        assert!(!s.layer(0).unwrap().surface.is_transparent());

        clear_all_layers(&mut s);
        assert_eq!(s.len(), 2);
        assert!(s.layers().iter().all(|l| l.surface.is_transparent()));
    }
}
