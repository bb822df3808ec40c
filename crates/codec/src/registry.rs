//! Tag registry.
//!
//! Maps every inbound tag to a factory that can build the zero value of the
//! shape and decode a frame into it. A registry is built once and shared
//! read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::RegistryError;
use crate::message::Tagged;

/// Constructor pair for one payload shape.
pub struct Factory<P> {
    create: fn() -> P,
    decode: fn(&[u8]) -> serde_json::Result<P>,
}

impl<P> Factory<P> {
    /// Build a factory from explicit functions.
    pub const fn new(create: fn() -> P, decode: fn(&[u8]) -> serde_json::Result<P>) -> Self {
        Self { create, decode }
    }

    /// Factory for a concrete shape `T` wrapped into `P`.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: Default + DeserializeOwned + Into<P>,
    {
        Self {
            create: create_default::<T, P>,
            decode: decode_into::<T, P>,
        }
    }

    /// Build the zero value.
    pub fn create(&self) -> P {
        (self.create)()
    }

    /// Decode a full frame into this shape.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error if the frame does not fit the shape.
    pub fn decode(&self, bytes: &[u8]) -> serde_json::Result<P> {
        (self.decode)(bytes)
    }
}

impl<P> Clone for Factory<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Factory<P> {}

impl<P> fmt::Debug for Factory<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory").finish_non_exhaustive()
    }
}

fn create_default<T: Default + Into<P>, P>() -> P {
    T::default().into()
}

fn decode_into<T: DeserializeOwned + Into<P>, P>(bytes: &[u8]) -> serde_json::Result<P> {
    serde_json::from_slice::<T>(bytes).map(Into::into)
}

/// Collects registrations before freezing them into a [`Registry`].
pub struct RegistryBuilder<P> {
    entries: HashMap<&'static str, Factory<P>>,
    error_tag: Option<&'static str>,
}

impl<P> RegistryBuilder<P> {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            error_tag: None,
        }
    }

    /// Register a factory for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTag`] if `tag` already has a factory.
    pub fn register(
        &mut self,
        tag: &'static str,
        factory: Factory<P>,
    ) -> Result<&mut Self, RegistryError> {
        if self.entries.contains_key(tag) {
            return Err(RegistryError::DuplicateTag(tag));
        }
        self.entries.insert(tag, factory);
        Ok(self)
    }

    /// Register shape `T` under its own tag.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTag`] if the tag already has a factory.
    pub fn register_type<T>(&mut self) -> Result<&mut Self, RegistryError>
    where
        T: Tagged + Default + DeserializeOwned + Into<P>,
    {
        self.register(T::TAG, Factory::of::<T>())
    }

    /// Register shape `T` and make it the fallback for unknown tags.
    ///
    /// # Errors
    ///
    /// Fails if the tag is taken or an error shape was already chosen.
    pub fn error_type<T>(&mut self) -> Result<&mut Self, RegistryError>
    where
        T: Tagged + Default + DeserializeOwned + Into<P>,
    {
        if let Some(existing) = self.error_tag {
            return Err(RegistryError::ErrorShapeAlreadySet {
                existing,
                requested: T::TAG,
            });
        }
        self.register_type::<T>()?;
        self.error_tag = Some(T::TAG);
        Ok(self)
    }

    /// Freeze the registrations.
    #[must_use]
    pub fn build(self) -> Registry<P> {
        Registry {
            entries: self.entries,
            error_tag: self.error_tag,
        }
    }
}

impl<P> Default for RegistryBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable tag to factory map.
pub struct Registry<P> {
    entries: HashMap<&'static str, Factory<P>>,
    error_tag: Option<&'static str>,
}

impl<P> Registry<P> {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder<P> {
        RegistryBuilder::new()
    }

    /// Build the zero value registered for `tag`.
    pub fn create(&self, tag: &str) -> Option<P> {
        self.entries.get(tag).map(Factory::create)
    }

    /// Whether `tag` has a factory.
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tags in lexical order.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.entries.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tag of the fallback error shape.
    pub const fn error_tag(&self) -> Option<&'static str> {
        self.error_tag
    }

    pub(crate) fn factory(&self, tag: &str) -> Option<&Factory<P>> {
        self.entries.get(tag)
    }

    pub(crate) fn error_factory(&self) -> Option<&Factory<P>> {
        self.error_tag.and_then(|tag| self.entries.get(tag))
    }
}

impl<P> fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags())
            .field("error_tag", &self.error_tag)
            .finish()
    }
}
