//! Progress dashboard: displays aggregates computed by the server.

pub mod model;
pub mod view;

pub use model::DashboardData;
pub use view::{DashboardState, DashboardView};
