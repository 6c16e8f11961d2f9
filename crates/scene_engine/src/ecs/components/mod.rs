//! ECS Components module
//!
//! Plain data components; all behavior lives in systems and the editor
//! session.

pub mod name;
pub mod transform;
pub mod mesh;
pub mod lighting;
pub mod camera;
pub mod environment;
pub mod pickable;
pub mod selection;

pub use name::NameComponent;
pub use transform::{TransformComponent, MIN_SCALE};
pub use mesh::{MeshComponent, PrimitiveMesh};
pub use lighting::{LightComponent, LightType, LightFactory};
pub use camera::CameraComponent;
pub use environment::{SkyComponent, FogComponent};
pub use pickable::PickableComponent;
pub use selection::SelectionComponent;
