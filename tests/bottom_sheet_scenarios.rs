use runmate::sheet::{COLLAPSED_HEIGHT, MAX_HEIGHT};
use runmate::{
    BottomSheet, DragTarget, ListenerChange, PointerInput, SheetCommands, SheetConfig,
    SheetHandle,
};

/// Deterministic pseudo-random pointer positions (LCG).
fn pointer_walk(seed: u64, steps: usize) -> Vec<f64> {
    let mut state = seed;
    (0..steps)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            // -400..1400 px, well past both limits
            ((state >> 33) % 1800) as f64 - 400.0
        })
        .collect()
}

#[test]
fn test_drag_from_collapsed_to_max() {
    let mut sheet = BottomSheet::new(SheetConfig::default());
    assert_eq!(sheet.height(), 32);

    sheet.drag_start(DragTarget::Handle, PointerInput::mouse(500.0));
    assert_eq!(sheet.drag_move(PointerInput::mouse(400.0)).height, 132);
    assert_eq!(sheet.drag_move(PointerInput::mouse(0.0)).height, 420);
    assert_eq!(sheet.drag_end().height, 420);
}

#[test]
fn test_height_stays_within_limits() {
    for seed in 1..=20u64 {
        let mut sheet = BottomSheet::default();
        let walk = pointer_walk(seed, 200);

        for (i, &y) in walk.iter().enumerate() {
            // Restart the drag every so often from wherever the sheet is
            let r = match i % 37 {
                0 => sheet.drag_start(DragTarget::Handle, PointerInput::touch(y)),
                36 => sheet.drag_end(),
                _ => sheet.drag_move(PointerInput::touch(y)),
            };
            assert!(
                (COLLAPSED_HEIGHT..=MAX_HEIGHT).contains(&r.height),
                "seed {} step {}: height {}",
                seed,
                i,
                r.height
            );
            assert_eq!(r.height, sheet.height());
        }
    }
}

#[test]
fn test_custom_limits_clamp() {
    let config = SheetConfig::new(60, 300).unwrap();
    let mut sheet = BottomSheet::new(config);
    sheet.drag_start(DragTarget::Handle, PointerInput::mouse(0.0));
    for y in pointer_walk(99, 100) {
        let h = sheet.drag_move(PointerInput::mouse(y)).height;
        assert!((60..=300).contains(&h));
    }
}

#[test]
fn test_collapse_twice() {
    let handle = SheetHandle::new(SheetConfig::default());
    assert_eq!(handle.collapse().height, COLLAPSED_HEIGHT);
    assert_eq!(handle.collapse().height, COLLAPSED_HEIGHT);

    handle.drag_start(DragTarget::Handle, PointerInput::mouse(500.0));
    handle.drag_move(PointerInput::mouse(200.0));
    assert_eq!(handle.height(), 332);

    let first = handle.collapse();
    let second = handle.collapse();
    assert_eq!(first.height, COLLAPSED_HEIGHT);
    assert_eq!(first.listeners, ListenerChange::Detach);
    assert_eq!(second.height, COLLAPSED_HEIGHT);
    assert_eq!(second.listeners, ListenerChange::Unchanged);
}

#[test]
fn test_parent_collapses_through_commands() {
    let sheet = SheetHandle::new(SheetConfig::default());
    let parent: Box<dyn SheetCommands> = Box::new(sheet.clone());

    sheet.drag_start(DragTarget::Handle, PointerInput::touch(600.0));
    sheet.drag_move(PointerInput::touch(450.0));
    sheet.drag_end();
    assert_eq!(sheet.height(), 182);

    parent.collapse();
    assert_eq!(sheet.height(), COLLAPSED_HEIGHT);
    assert!(!sheet.is_dragging());
}

#[test]
fn test_listeners_follow_drag_lifecycle() {
    let mut sheet = BottomSheet::default();
    assert_eq!(sheet.drag_end().listeners, ListenerChange::Unchanged);

    let start = sheet.drag_start(DragTarget::Handle, PointerInput::touch(300.0));
    assert_eq!(start.listeners, ListenerChange::Attach);
    assert!(!start.prevent_default);

    let mv = sheet.drag_move(PointerInput::touch(280.0));
    assert_eq!(mv.listeners, ListenerChange::Unchanged);
    assert!(mv.prevent_default);

    assert_eq!(sheet.drag_end().listeners, ListenerChange::Detach);
    assert_eq!(sheet.drag_end().listeners, ListenerChange::Unchanged);
}
