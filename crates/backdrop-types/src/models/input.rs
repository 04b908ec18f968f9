use serde::{Deserialize, Serialize};

use super::ids::{BackgroundId, FileId};

/// Background chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputBackground {
    /// A local file that has to be uploaded (or is already known)
    Local(FileId),
    /// A background the client already knows by id
    Remote(BackgroundId),
}
