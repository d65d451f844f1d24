pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dump;
pub mod ir;
pub mod render;
pub mod theme;

pub use catalog::{Catalog, CatalogError};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, GeometryConfig, load_config};
pub use ir::{Connection, Diagram, Group, Node, NodeShape, Point, Side};
pub use render::{connection_point, render_svg};
pub use theme::Theme;
