use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::ProtoRegistry;
use crate::compile::{CompilationUnit, CompiledSchema};
use crate::error::CompileError;

/// A thread-safe, cloneable handle to a [`ProtoRegistry`].
///
/// Compilation resolves and builds under a read lock and takes the write
/// lock only to register the finished file, so independent units compile
/// concurrently.
#[derive(Clone, Default)]
pub struct SharedRegistry {
    /// The wrapped [`ProtoRegistry`].
    pub internal: Arc<RwLock<ProtoRegistry>>,
}

impl SharedRegistry {
    #[inline]
    pub fn new(registry: ProtoRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }

    /// Takes a read lock on the underlying [`ProtoRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, ProtoRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`ProtoRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, ProtoRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Compiles `unit` and registers its types.
    pub fn compile(&self, unit: &CompilationUnit) -> Result<CompiledSchema, CompileError> {
        let prepared = unit.prepare(&self.read())?;
        prepared.commit(&mut self.write())
    }
}

impl core::fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&*self.read(), f)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::prelude::ProtoMessage;

    #[derive(ProtoMessage, Debug, PartialEq)]
    struct Person {
        #[proto(number = 1)]
        id: i32,
    }

    #[derive(ProtoMessage, Debug, PartialEq)]
    struct Tag {
        #[proto(number = 1)]
        label: String,
    }

    #[test]
    fn compiles_concurrently() {
        let registry = SharedRegistry::default();
        thread::scope(|scope| {
            for i in 0..8 {
                let registry = registry.clone();
                scope.spawn(move || {
                    let unit = if i % 2 == 0 {
                        CompilationUnit::new("person.proto").add::<Person>()
                    } else {
                        CompilationUnit::new("tag.proto").add::<Tag>()
                    };
                    registry.compile(&unit).unwrap();
                });
            }
        });

        let read = registry.read();
        assert_eq!(read.len(), 2);
        assert_eq!(read.files().count(), 2);
        let bytes = read.encode(&Person { id: 3 }).unwrap();
        assert_eq!(read.decode::<Person>(&bytes).unwrap(), Person { id: 3 });
    }

    #[test]
    fn clones_share_the_registry() {
        let registry = SharedRegistry::new(ProtoRegistry::new());
        let clone = registry.clone();
        clone
            .compile(&CompilationUnit::new("tag.proto").package("t").add::<Tag>())
            .unwrap();
        assert!(registry.read().lookup_by_name("t.Tag").is_some());
        assert!(format!("{registry:?}").contains("t.Tag"));
    }
}
