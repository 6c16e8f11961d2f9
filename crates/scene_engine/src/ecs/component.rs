//! Component trait

/// Marker trait for components
///
/// Any `'static` data type can be stored in the world once it opts in with
/// an empty `impl Component for T {}`.
pub trait Component: 'static {}
