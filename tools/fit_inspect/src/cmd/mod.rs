use crate::InspectError;
use std::path::Path;

/// Structure dump command.
pub mod dump;
/// Kernel extraction command.
pub mod extract;
/// Header and kernel description command.
pub mod info;

/// Read a whole image file
pub fn read_image(path: &Path) -> Result<Vec<u8>, InspectError> {
    std::fs::read(path).map_err(|e| InspectError::io(path, e))
}
