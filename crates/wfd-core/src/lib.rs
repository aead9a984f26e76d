pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod model;
pub mod store;

pub use config::DesignerConfig;
pub use document::WorkflowDocument;
pub use error::{DocumentError, LayoutError};
pub use geometry::{HeightCache, NodeMetrics, PathSpec};
pub use id::{ConnectionId, NodeId};
pub use layout::{LayoutConfig, LayoutPlan, compute_layout};
pub use model::*;
pub use store::{NodeUpdate, StoreEvent, SubscriptionId, WorkflowStore};
