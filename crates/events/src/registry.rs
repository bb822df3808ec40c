use realtime_codec::{Registry, RegistryError};

use crate::server::{ErrorEvent, ServerEvent};

/// Build the registry of every server event, with `error` as the fallback
/// for unknown tags.
///
/// # Errors
///
/// Fails only if two events share a tag.
pub fn registry() -> Result<Registry<ServerEvent>, RegistryError> {
    let mut builder = Registry::builder();
    builder.error_type::<ErrorEvent>()?;
    ServerEvent::register_all(&mut builder)?;
    Ok(builder.build())
}
