use std::sync::Arc;

use view_dock::sim::{InMemoryViewRegistry, RecordedMove, VirtualWindowProvider};
use view_dock::{
    MoveReason, PlacementCommand, PlacementConfig, PlacementManager, ViewContainerLocation,
    ViewDescriptor, ViewId, WindowSize,
};

fn setup() -> (
    PlacementManager,
    Arc<InMemoryViewRegistry>,
    Arc<VirtualWindowProvider>,
) {
    let registry = Arc::new(InMemoryViewRegistry::new());
    registry.register(
        ViewDescriptor::new("explorer", "Explorer"),
        ViewContainerLocation::Sidebar,
    );
    registry.register(
        ViewDescriptor::new("outline", "Outline").with_can_move_view(false),
        ViewContainerLocation::Sidebar,
    );
    let windows = Arc::new(VirtualWindowProvider::new());
    let manager = PlacementManager::new(registry.clone(), windows.clone(), PlacementConfig::default());
    (manager, registry, windows)
}

#[tokio::test]
async fn float_uses_descriptor_name_and_default_size() {
    let (manager, _registry, windows) = setup();
    PlacementCommand::Float
        .run(&manager, Some(ViewId::from("explorer")))
        .await
        .unwrap();
    let panel = manager
        .floating_panel_by_view(&ViewId::from("explorer"))
        .unwrap();
    assert_eq!(panel.title(), "Explorer");
    let options = windows.windows()[0].options().clone();
    assert_eq!(options.size, WindowSize::new(500, 400));
}

#[tokio::test]
async fn float_on_floating_view_brings_it_to_front() {
    let (manager, _registry, windows) = setup();
    let target = Some(ViewId::from("explorer"));
    PlacementCommand::Float.run(&manager, target.clone()).await.unwrap();
    PlacementCommand::Float.run(&manager, target).await.unwrap();
    assert_eq!(windows.open_count(), 1);
    assert_eq!(windows.windows()[0].focus_count(), 1);
}

#[tokio::test]
async fn float_unknown_view_is_a_no_op() {
    let (manager, _registry, windows) = setup();
    PlacementCommand::Float
        .run(&manager, Some(ViewId::from("nope")))
        .await
        .unwrap();
    assert_eq!(windows.open_count(), 0);
    assert!(manager.all_floating_panels().is_empty());
}

#[tokio::test]
async fn commands_fall_back_to_focused_view() {
    let (manager, registry, _windows) = setup();
    PlacementCommand::Float.run(&manager, None).await.unwrap();
    assert!(manager.all_floating_panels().is_empty());

    registry.set_focused(Some(ViewId::from("explorer")));
    PlacementCommand::Float.run(&manager, None).await.unwrap();
    assert!(manager.is_view_floating(&ViewId::from("explorer")));

    PlacementCommand::DockToPanel.run(&manager, None).await.unwrap();
    assert!(!manager.is_view_floating(&ViewId::from("explorer")));
    assert_eq!(
        registry.location_of(&ViewId::from("explorer")),
        Some(ViewContainerLocation::Panel)
    );
}

#[tokio::test]
async fn dock_floating_view_goes_through_manager() {
    let (manager, registry, windows) = setup();
    let explorer = ViewId::from("explorer");
    PlacementCommand::Float
        .run(&manager, Some(explorer.clone()))
        .await
        .unwrap();
    PlacementCommand::DockToAuxiliaryBar
        .run(&manager, Some(explorer.clone()))
        .await
        .unwrap();
    assert!(!manager.is_view_floating(&explorer));
    assert!(windows.live_windows().is_empty());
    assert_eq!(
        registry.moves(),
        vec![RecordedMove {
            view_id: explorer,
            location: ViewContainerLocation::AuxiliaryBar,
            reason: MoveReason::Dock,
        }]
    );
}

#[tokio::test]
async fn dock_docked_view_moves_directly() {
    let (manager, registry, windows) = setup();
    PlacementCommand::DockToPanel
        .run(&manager, Some(ViewId::from("explorer")))
        .await
        .unwrap();
    assert_eq!(windows.open_count(), 0);
    assert_eq!(
        registry.location_of(&ViewId::from("explorer")),
        Some(ViewContainerLocation::Panel)
    );
    assert_eq!(registry.moves()[0].reason, MoveReason::Dock);
}

#[tokio::test]
async fn dock_fixed_docked_view_does_nothing() {
    let (manager, registry, _windows) = setup();
    PlacementCommand::DockToPanel
        .run(&manager, Some(ViewId::from("outline")))
        .await
        .unwrap();
    assert!(registry.moves().is_empty());
    assert_eq!(
        registry.location_of(&ViewId::from("outline")),
        Some(ViewContainerLocation::Sidebar)
    );
}

#[tokio::test]
async fn dock_fixed_floating_view_still_closes_window() {
    let (manager, registry, windows) = setup();
    let outline = ViewId::from("outline");
    PlacementCommand::Float
        .run(&manager, Some(outline.clone()))
        .await
        .unwrap();
    PlacementCommand::DockToSidebar
        .run(&manager, Some(outline.clone()))
        .await
        .unwrap();
    assert!(registry.moves().is_empty());
    assert!(!manager.is_view_floating(&outline));
    assert!(windows.live_windows().is_empty());
}
