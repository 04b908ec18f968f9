//! Domain models of the background manager.

mod background;
mod background_type;
mod config;
mod fill;
mod ids;
mod input;
mod view;

pub use background::{background_url, is_local_background_name, Background};
pub use background_type::{BackgroundKind, BackgroundType};
pub use config::ManagerConfig;
pub use fill::BackgroundFill;
pub use ids::{BackgroundId, FileId, ReferenceSourceId, MAX_LOCAL_BACKGROUND_ID};
pub use input::InputBackground;
pub use view::{BackgroundView, Update};
