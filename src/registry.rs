//! Resolves fully-qualified names to descriptors, built up from registered
//! files.
//!
//! Readers are concurrent, writers are exclusive: a `TypeRegistry` is
//! typically populated once, at startup, and queried many times afterwards,
//! so a `RwLock` over a plain `HashMap` is the right tool (the same
//! trade-off `prost-reflect`'s `DescriptorPool` makes with its
//! `Arc`-shared, append-only pool).

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use log::debug;

use crate::descriptor::{EnumDescriptor, FileDescriptor, MessageDescriptor, ServiceDescriptor};
use crate::error::{Error, Result};

#[derive(Clone)]
enum Entry {
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
    Service(ServiceDescriptor),
}

#[derive(Default)]
struct Inner {
    files: HashMap<String, FileDescriptor>,
    entries: HashMap<String, Entry>,
}

/// Maps fully qualified name to descriptor.
///
/// A registry is built from [`FileDescriptor`]s registered one at a time
/// via [`TypeRegistry::register_file`]; each message, enum, and service
/// contained in the file (at any nesting depth) is indexed under its
/// [`crate::descriptor::MessageDescriptor::full_name`] / equivalent.
#[derive(Default)]
pub struct TypeRegistry {
    inner: RwLock<Inner>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Registers a file and all the messages/enums/services it (directly
    /// or transitively, via nesting) defines.
    ///
    /// Fails with [`Error::DuplicateName`] if the file's name collides with
    /// an already-registered file, if any fully-qualified type name within
    /// it collides with an already-registered entry, or if two of the
    /// file's own messages/enums/services share a fully-qualified name. On
    /// failure, the registry is left unchanged.
    pub fn register_file(&self, file: FileDescriptor) -> Result<()> {
        let messages = file.all_messages();
        let enums = file.all_enums();
        let services = file.services().to_vec();

        let mut inner = self.inner.write().expect("type registry lock poisoned");

        if inner.files.contains_key(file.name()) {
            return Err(Error::DuplicateName(file.name().to_string()));
        }

        let mut seen_in_file = HashSet::with_capacity(messages.len() + enums.len() + services.len());
        for full_name in messages
            .iter()
            .map(|m| m.full_name())
            .chain(enums.iter().map(|e| e.full_name()))
            .chain(services.iter().map(|s| s.full_name()))
        {
            if !seen_in_file.insert(full_name) {
                return Err(Error::DuplicateName(full_name.to_string()));
            }
            if inner.entries.contains_key(full_name) {
                return Err(Error::DuplicateName(full_name.to_string()));
            }
        }

        debug!(
            "registering file `{}` ({} messages, {} enums, {} services)",
            file.name(),
            messages.len(),
            enums.len(),
            services.len()
        );

        for message in messages {
            inner
                .entries
                .insert(message.full_name().to_string(), Entry::Message(message));
        }
        for enum_ in enums {
            inner
                .entries
                .insert(enum_.full_name().to_string(), Entry::Enum(enum_));
        }
        for service in services {
            inner
                .entries
                .insert(service.full_name().to_string(), Entry::Service(service));
        }
        inner.files.insert(file.name().to_string(), file);

        Ok(())
    }

    pub fn find_message(&self, fqn: &str) -> Option<MessageDescriptor> {
        let inner = self.inner.read().expect("type registry lock poisoned");
        match inner.entries.get(fqn) {
            Some(Entry::Message(m)) => Some(m.clone()),
            _ => None,
        }
    }

    pub fn find_enum(&self, fqn: &str) -> Option<EnumDescriptor> {
        let inner = self.inner.read().expect("type registry lock poisoned");
        match inner.entries.get(fqn) {
            Some(Entry::Enum(e)) => Some(e.clone()),
            _ => None,
        }
    }

    pub fn find_service(&self, fqn: &str) -> Option<ServiceDescriptor> {
        let inner = self.inner.read().expect("type registry lock poisoned");
        match inner.entries.get(fqn) {
            Some(Entry::Service(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn find_file(&self, name: &str) -> Option<FileDescriptor> {
        let inner = self.inner.read().expect("type registry lock poisoned");
        inner.files.get(name).cloned()
    }

    /// All registered fully-qualified type names (messages, enums, and
    /// services, not file names), in deterministic order.
    pub fn registered_types(&self) -> BTreeSet<String> {
        let inner = self.inner.read().expect("type registry lock poisoned");
        inner.entries.keys().cloned().collect()
    }
}
