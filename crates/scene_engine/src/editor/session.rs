//! Per-viewport editor session
//!
//! Frame order: keyboard input, gizmo hover/drag (or click picking when the
//! gizmo does not capture the mouse), transform mutation. The caller then
//! refreshes the TLAS and renders.

use crate::core::EngineConfig;
use crate::debug::{colors, DebugDrawSystem};
use crate::ecs::components::{MeshComponent, SelectionComponent, TransformComponent};
use crate::ecs::systems::PickingSystem;
use crate::ecs::{Entity, World};
use crate::gizmo::{GizmoInput, GizmoMode, TransformGizmo};
use crate::input::MouseState;
use crate::render::Camera;
use crate::spatial::BoundsProvider;

/// Input for one editor frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Mouse state with this frame's edges
    pub mouse: MouseState,
    /// Gizmo mode hotkey pressed this frame
    pub mode_switch: Option<GizmoMode>,
    /// Escape pressed this frame
    pub cancel: bool,
}

impl FrameInput {
    /// Input carrying only mouse state
    pub fn from_mouse(mouse: MouseState) -> Self {
        Self {
            mouse,
            mode_switch: None,
            cancel: false,
        }
    }

    fn gizmo_input(&self) -> GizmoInput {
        let mut input = GizmoInput::from_mouse(&self.mouse);
        input.mode_switch = self.mode_switch;
        input.cancel = self.cancel;
        input
    }
}

/// What happened during a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The gizmo consumed the mouse
    pub gizmo_captured: bool,
    /// A transform was changed; the TLAS needs refreshing
    pub transform_modified: bool,
    /// The selection changed
    pub selection_changed: bool,
}

/// Picking, gizmo and selection state for one viewport
#[derive(Debug)]
pub struct EditorSession {
    picking: PickingSystem,
    gizmo: TransformGizmo,
    debug: DebugDrawSystem,
    selected: Option<Entity>,
    hovered: Option<Entity>,
    frame: u64,
}

impl EditorSession {
    /// Create a session from engine configuration
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            picking: PickingSystem::from_config(&config.picking),
            gizmo: TransformGizmo::new(config.gizmo.clone()),
            debug: DebugDrawSystem::new(),
            selected: None,
            hovered: None,
            frame: 0,
        }
    }

    /// Currently selected entity
    pub fn selected(&self) -> Option<Entity> {
        self.selected
    }

    /// Entity under the cursor as of the last frame
    pub fn hovered(&self) -> Option<Entity> {
        self.hovered
    }

    /// The transform gizmo
    pub fn gizmo(&self) -> &TransformGizmo {
        &self.gizmo
    }

    /// The picking system
    pub fn picking_mut(&mut self) -> &mut PickingSystem {
        &mut self.picking
    }

    /// Lines drawn during the last frame
    pub fn debug_draw(&self) -> &DebugDrawSystem {
        &self.debug
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Replace the selection, updating [`SelectionComponent`] flags.
    ///
    /// Returns whether the selection changed. Dead entities are ignored.
    pub fn select(&mut self, world: &mut World, entity: Option<Entity>) -> bool {
        let entity = entity.filter(|entity| world.is_alive(*entity));
        if entity == self.selected {
            return false;
        }

        let frame = self.frame;
        if let Some(previous) = self.selected {
            if let Some(selection) = world.get_component_mut::<SelectionComponent>(previous) {
                selection.set_selected(false, frame);
            }
        }
        if let Some(next) = entity {
            mark(world, next, |selection| {
                selection.set_selected(true, frame);
            });
            log::debug!("Selected '{}'", world.name_of(next).unwrap_or("<unnamed>"));
        }

        self.selected = entity;
        self.gizmo.reset();
        true
    }

    /// Run one editor frame
    pub fn frame(
        &mut self,
        world: &mut World,
        input: &FrameInput,
        camera: &Camera,
        bounds: &dyn BoundsProvider,
    ) -> FrameOutcome {
        self.frame += 1;
        self.debug.begin_frame();

        let mut outcome = FrameOutcome::default();

        if self.selected.is_some_and(|entity| !world.is_alive(entity)) {
            log::debug!("Selected entity was destroyed, selection cleared");
            self.selected = None;
            self.gizmo.reset();
            outcome.selection_changed = true;
        }

        let response = self
            .gizmo
            .update(world, self.selected, &input.gizmo_input(), camera, &mut self.debug);
        outcome.gizmo_captured = response.captured;
        outcome.transform_modified = response.modified;

        let under_cursor = if response.captured {
            None
        } else {
            camera
                .screen_to_world_ray(input.mouse.position, input.mouse.viewport)
                .and_then(|ray| self.picking.pick(world, &ray, bounds))
                .map(|hit| hit.entity)
        };
        self.set_hovered(world, under_cursor);

        // A miss leaves the selection unchanged
        if !response.captured && input.mouse.pressed {
            if let Some(entity) = under_cursor {
                outcome.selection_changed |= self.select(world, Some(entity));
            }
        }

        self.draw_selection(world, bounds);
        outcome
    }

    fn set_hovered(&mut self, world: &mut World, entity: Option<Entity>) {
        if entity == self.hovered {
            return;
        }
        let frame = self.frame;
        if let Some(previous) = self.hovered {
            if let Some(selection) = world.get_component_mut::<SelectionComponent>(previous) {
                selection.set_hovered(false, frame);
            }
        }
        if let Some(next) = entity {
            mark(world, next, |selection| {
                selection.set_hovered(true, frame);
            });
        }
        self.hovered = entity;
    }

    fn draw_selection(&mut self, world: &World, bounds: &dyn BoundsProvider) {
        let Some(entity) = self.selected else {
            return;
        };
        let Some((transform, mesh)) = world
            .get_component::<TransformComponent>(entity)
            .zip(world.get_component::<MeshComponent>(entity))
        else {
            return;
        };

        let aabb = bounds.bounds_for(mesh);
        if aabb.is_valid() {
            self.debug.draw_box(&aabb, &transform.world_matrix(), colors::ORANGE);
        }
    }
}

fn mark(world: &mut World, entity: Entity, update: impl FnOnce(&mut SelectionComponent)) {
    if !world.has_component::<SelectionComponent>(entity)
        && world.add_component(entity, SelectionComponent::default()).is_err()
    {
        return;
    }
    if let Some(selection) = world.get_component_mut::<SelectionComponent>(entity) {
        update(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec2, Vec3};
    use crate::spatial::{project_to_screen, StaticBoundsOnly};
    use approx::assert_relative_eq;

    struct Scene {
        world: World,
        session: EditorSession,
        camera: Camera,
        mouse: MouseState,
        a: Entity,
        b: Entity,
    }

    impl Scene {
        fn new() -> Self {
            let mut world = World::new();
            let a = spawn(&mut world, "A", Vec3::zeros());
            let b = spawn(&mut world, "B", Vec3::new(-4.0, 0.0, 0.0));
            Self {
                world,
                session: EditorSession::new(&EngineConfig::default()),
                camera: Camera::perspective(Vec3::new(0.0, 5.0, 10.0), 60.0, 1.0, 0.1, 100.0),
                mouse: MouseState::new(800, 800),
                a,
                b,
            }
        }

        fn cursor_at(&self, point: Vec3) -> Vec2 {
            project_to_screen(point, &self.camera.view_projection(), self.mouse.viewport).unwrap()
        }

        fn frame(&mut self, cursor: Vec2, button_down: bool) -> FrameOutcome {
            self.mouse.update_position(cursor.x, cursor.y);
            self.mouse.set_button(button_down);
            let input = FrameInput::from_mouse(self.mouse.clone());
            let outcome = self.session.frame(&mut self.world, &input, &self.camera, &StaticBoundsOnly);
            self.mouse.clear_edges();
            outcome
        }

        fn click(&mut self, point: Vec3) -> FrameOutcome {
            let cursor = self.cursor_at(point);
            let outcome = self.frame(cursor, true);
            self.frame(cursor, false);
            outcome
        }

        fn selection(&self, entity: Entity) -> SelectionComponent {
            self.world.get_component::<SelectionComponent>(entity).copied().unwrap_or_default()
        }
    }

    fn spawn(world: &mut World, name: &str, position: Vec3) -> Entity {
        let entity = world.create_object(name).unwrap();
        world.add_component(entity, TransformComponent::from_position(position)).unwrap();
        world.add_component(entity, MeshComponent::cube()).unwrap();
        entity
    }

    #[test]
    fn test_click_selects_entity_under_cursor() {
        let mut scene = Scene::new();
        let outcome = scene.click(Vec3::new(-4.0, 0.0, 0.0));

        assert!(outcome.selection_changed);
        assert_eq!(scene.session.selected(), Some(scene.b));
        assert!(scene.selection(scene.b).selected);
        assert!(!scene.selection(scene.a).selected);
    }

    #[test]
    fn test_click_on_empty_space_keeps_selection() {
        let mut scene = Scene::new();
        scene.click(Vec3::new(-4.0, 0.0, 0.0));

        let outcome = scene.frame(Vec2::new(790.0, 10.0), true);
        assert!(!outcome.selection_changed);
        assert_eq!(scene.session.selected(), Some(scene.b));
    }

    #[test]
    fn test_switching_selection_updates_flags() {
        let mut scene = Scene::new();
        scene.click(Vec3::zeros());
        assert_eq!(scene.session.selected(), Some(scene.a));

        scene.click(Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(scene.session.selected(), Some(scene.b));
        assert!(!scene.selection(scene.a).selected);
        assert!(scene.selection(scene.b).selected);
    }

    #[test]
    fn test_hover_flag_follows_cursor() {
        let mut scene = Scene::new();
        let over_b = scene.cursor_at(Vec3::new(-4.0, 0.0, 0.0));

        scene.frame(over_b, false);
        assert_eq!(scene.session.hovered(), Some(scene.b));
        assert!(scene.selection(scene.b).hovered);

        scene.frame(Vec2::new(790.0, 10.0), false);
        assert_eq!(scene.session.hovered(), None);
        assert!(!scene.selection(scene.b).hovered);
    }

    #[test]
    fn test_destroyed_selection_is_cleared() {
        let mut scene = Scene::new();
        scene.click(Vec3::zeros());
        scene.world.destroy_entity(scene.a);

        let outcome = scene.frame(Vec2::new(790.0, 10.0), false);
        assert!(outcome.selection_changed);
        assert_eq!(scene.session.selected(), None);
    }

    #[test]
    fn test_gizmo_drag_moves_selection_without_repicking() {
        let mut scene = Scene::new();
        scene.click(Vec3::zeros());

        let size = (Vec3::zeros() - scene.camera.position).norm() * scene.session.gizmo().config().screen_fraction;
        let grab = scene.cursor_at(Vec3::new(size * 0.6, 0.0, 0.0));
        let target = scene.cursor_at(Vec3::new(size * 0.6 + 2.0, 0.0, 0.0));

        assert!(scene.frame(grab, false).gizmo_captured);
        let press = scene.frame(grab, true);
        assert!(press.gizmo_captured);
        assert!(!press.selection_changed);

        let moved = scene.frame(target, true);
        assert!(moved.transform_modified);
        scene.frame(target, false);

        let position = scene.world.get_component::<TransformComponent>(scene.a).unwrap().position;
        assert_relative_eq!(position, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-3);
        assert_eq!(scene.session.selected(), Some(scene.a));
    }

    #[test]
    fn test_selected_mesh_gets_bounds_box() {
        let mut scene = Scene::new();
        scene.frame(Vec2::new(790.0, 10.0), false);
        assert_eq!(scene.session.debug_draw().line_count(), 0);

        scene.click(Vec3::new(-4.0, 0.0, 0.0));
        let boxes = scene
            .session
            .debug_draw()
            .lines()
            .iter()
            .filter(|line| line.color == colors::ORANGE)
            .count();
        assert_eq!(boxes, 12);
    }
}
