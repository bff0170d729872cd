use core::any::{Any, TypeId};
use std::sync::Arc;

use crate::collections::{HashMap, TypeIdMap};
use crate::error::{DecodeError, EncodeError, RegistrationError};
use crate::marshal::{EnumMarshaller, Marshaller, MessageMarshaller};
use crate::schema::{Descriptor, FileSchema};
use crate::wire::{ProtoReader, ProtoWriter};

// -----------------------------------------------------------------------------
// RegisteredType

/// One bound identity: a native type, its descriptor and its marshaller.
#[derive(Debug, Clone)]
pub struct RegisteredType {
    descriptor: Descriptor,
    marshaller: Marshaller,
    file: Option<Arc<str>>,
}

impl RegisteredType {
    #[inline]
    pub fn qualified_name(&self) -> &str {
        self.descriptor.qualified_name()
    }

    #[inline]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    #[inline]
    pub fn marshaller(&self) -> &Marshaller {
        &self.marshaller
    }

    /// The schema file the type was generated into, if any.
    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

// -----------------------------------------------------------------------------
// ProtoRegistry

/// Marshallers and descriptors by native type and by qualified name.
///
/// # Example
///
/// ```
/// use vc_proto::prelude::*;
///
/// #[derive(ProtoMessage, Debug, PartialEq)]
/// struct Point {
///     #[proto(number = 1)]
///     x: i32,
///     #[proto(number = 2)]
///     y: i32,
/// }
///
/// let mut registry = ProtoRegistry::new();
/// CompilationUnit::new("point.proto")
///     .package("geo")
///     .add::<Point>()
///     .compile(&mut registry)
///     .unwrap();
///
/// let bytes = registry.encode(&Point { x: 1, y: -1 }).unwrap();
/// assert_eq!(registry.decode::<Point>(&bytes).unwrap(), Point { x: 1, y: -1 });
/// assert!(registry.lookup_by_name("geo.Point").is_some());
/// ```
#[derive(Default)]
pub struct ProtoRegistry {
    by_type: TypeIdMap<RegisteredType>,
    by_name: HashMap<String, TypeId>,
    files: HashMap<String, Arc<FileSchema>>,
}

impl ProtoRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.by_type.contains(&type_id)
    }

    /// The registration bound to a native type.
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&RegisteredType> {
        self.by_type.get(&type_id)
    }

    /// The qualified name and marshaller bound to a native type.
    pub fn lookup_by_native_type(&self, type_id: TypeId) -> Option<(&str, &Marshaller)> {
        self.by_type
            .get(&type_id)
            .map(|entry| (entry.qualified_name(), &entry.marshaller))
    }

    /// The descriptor bound to a qualified schema name.
    pub fn lookup_by_name(&self, name: &str) -> Option<&Descriptor> {
        let type_id = self.by_name.get(name)?;
        self.by_type.get(type_id).map(|entry| &entry.descriptor)
    }

    /// The registration bound to a qualified schema name.
    pub fn get_with_name(&self, name: &str) -> Option<&RegisteredType> {
        self.by_type.get(self.by_name.get(name)?)
    }

    pub fn message_marshaller(&self, type_id: TypeId) -> Option<&Arc<dyn MessageMarshaller>> {
        self.by_type.get(&type_id)?.marshaller.as_message()
    }

    pub fn enum_marshaller(&self, type_id: TypeId) -> Option<&Arc<EnumMarshaller>> {
        self.by_type.get(&type_id)?.marshaller.as_enum()
    }

    #[inline]
    pub fn file(&self, name: &str) -> Option<&Arc<FileSchema>> {
        self.files.get(name)
    }

    pub fn files(&self) -> impl Iterator<Item = &Arc<FileSchema>> {
        self.files.values()
    }

    /// Every registration, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredType> {
        self.by_type.values()
    }

    // Ok(true) when the pair is new, Ok(false) when already bound identically.
    fn check(
        &self,
        descriptor: &Descriptor,
        marshaller: &Marshaller,
    ) -> Result<bool, RegistrationError> {
        let type_id = marshaller.type_id();
        let name = descriptor.qualified_name();
        if let Some(existing) = self.by_type.get(&type_id) {
            return if existing.descriptor == *descriptor {
                Ok(false)
            } else {
                Err(RegistrationError::TypeConflict {
                    type_path: marshaller.type_path().to_owned(),
                    name: existing.qualified_name().to_owned(),
                })
            };
        }
        if let Some(other) = self.by_name.get(name).and_then(|id| self.by_type.get(id)) {
            return Err(RegistrationError::NameConflict {
                name: name.to_owned(),
                existing: other.marshaller.type_path().to_owned(),
            });
        }
        Ok(true)
    }

    fn insert(&mut self, descriptor: Descriptor, marshaller: Marshaller, file: Option<Arc<str>>) {
        let type_id = marshaller.type_id();
        let name = descriptor.qualified_name().to_owned();
        log::debug!("registered `{name}` for `{}`", marshaller.type_path());
        self.by_type.insert(
            type_id,
            RegisteredType {
                descriptor,
                marshaller,
                file,
            },
        );
        self.by_name.insert(name, type_id);
    }

    /// Binds a descriptor and marshaller to the marshaller's native type.
    ///
    /// Registering an identical descriptor again is a no-op that keeps the
    /// first marshaller.
    pub fn register(
        &mut self,
        descriptor: Descriptor,
        marshaller: Marshaller,
    ) -> Result<(), RegistrationError> {
        if self.check(&descriptor, &marshaller)? {
            self.insert(descriptor, marshaller, None);
        }
        Ok(())
    }

    /// Registers a whole file: either everything is bound or nothing is.
    pub fn register_schema(
        &mut self,
        file: Arc<FileSchema>,
        entries: Vec<(Descriptor, Marshaller)>,
    ) -> Result<(), RegistrationError> {
        let file_name = file.file_name().to_owned();
        let file_is_new = match self.files.get(&file_name) {
            Some(existing) if **existing == *file => false,
            Some(_) => return Err(RegistrationError::FileConflict { file: file_name }),
            None => true,
        };

        let mut fresh = Vec::with_capacity(entries.len());
        {
            // Scoped: the names borrow `entries`.
            let mut names: HashMap<&str, TypeId> = HashMap::default();
            for (descriptor, marshaller) in &entries {
                if let Some(&other) = names.get(descriptor.qualified_name())
                    && other != marshaller.type_id()
                {
                    return Err(RegistrationError::NameConflict {
                        name: descriptor.qualified_name().to_owned(),
                        existing: marshaller.type_path().to_owned(),
                    });
                }
                names.insert(descriptor.qualified_name(), marshaller.type_id());
                fresh.push(self.check(descriptor, marshaller)?);
            }
        }

        let shared_name: Arc<str> = Arc::from(file_name.as_str());
        for ((descriptor, marshaller), is_new) in entries.into_iter().zip(fresh) {
            if is_new {
                self.insert(descriptor, marshaller, Some(shared_name.clone()));
            }
        }
        if file_is_new {
            self.files.insert(file_name, file);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Encode and decode

    /// Writes `value` as a top-level message.
    pub fn encode_dyn(&self, value: &dyn Any) -> Result<Vec<u8>, EncodeError> {
        let marshaller = self
            .message_marshaller(value.type_id())
            .ok_or_else(|| EncodeError::UnknownType(format!("{:?}", value.type_id())))?;
        let mut writer = ProtoWriter::new();
        marshaller.write(self, &mut writer, value)?;
        Ok(writer.into_inner())
    }

    pub fn encode<T: Any>(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        let marshaller = self
            .message_marshaller(TypeId::of::<T>())
            .ok_or_else(|| EncodeError::UnknownType(core::any::type_name::<T>().to_owned()))?;
        let mut writer = ProtoWriter::new();
        marshaller.write(self, &mut writer, value)?;
        Ok(writer.into_inner())
    }

    /// Reads a top-level message of type `T`.
    pub fn decode<T: Any>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let marshaller = self
            .message_marshaller(TypeId::of::<T>())
            .ok_or_else(|| DecodeError::UnknownType(core::any::type_name::<T>().to_owned()))?;
        let instance = marshaller.read(self, &mut ProtoReader::new(bytes))?;
        instance
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| DecodeError::TypeMismatch {
                expected: core::any::type_name::<T>().to_owned(),
            })
    }

    /// Reads a top-level message by qualified schema name.
    pub fn decode_by_name(&self, name: &str, bytes: &[u8]) -> Result<Box<dyn Any>, DecodeError> {
        let marshaller = self
            .get_with_name(name)
            .and_then(|entry| entry.marshaller.as_message())
            .ok_or_else(|| DecodeError::UnknownType(name.to_owned()))?;
        marshaller.read(self, &mut ProtoReader::new(bytes))
    }
}

impl core::fmt::Debug for ProtoRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.by_name.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::CompilationUnit;
    use crate::prelude::{ProtoEnum, ProtoMessage};

    #[derive(ProtoMessage)]
    struct Person {
        #[proto(number = 1)]
        id: i32,
    }

    #[derive(ProtoMessage)]
    struct Tag {
        #[proto(number = 1)]
        label: String,
    }

    #[derive(ProtoEnum)]
    enum Mood {
        Calm,
    }

    mod other {
        use crate::prelude::ProtoMessage;

        #[derive(ProtoMessage)]
        pub struct Person {
            #[proto(number = 1)]
            pub name: String,
        }
    }

    fn compiled(unit: CompilationUnit) -> ProtoRegistry {
        let mut registry = ProtoRegistry::new();
        unit.compile(&mut registry).unwrap();
        registry
    }

    fn person_in(package: &str) -> ProtoRegistry {
        compiled(CompilationUnit::new("a.proto").package(package).add::<Person>())
    }

    fn impostor() -> ProtoRegistry {
        compiled(CompilationUnit::new("b.proto").package("a").add::<other::Person>())
    }

    fn entry<T: Any>(registry: &ProtoRegistry) -> (Descriptor, Marshaller) {
        let entry = registry.get(TypeId::of::<T>()).unwrap();
        (entry.descriptor().clone(), entry.marshaller().clone())
    }

    #[test]
    fn looks_up_by_type_and_name() {
        let registry = compiled(
            CompilationUnit::new("a.proto")
                .package("a")
                .add::<Person>()
                .add::<Mood>(),
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.iter().count(), 2);
        assert_eq!(registry.files().count(), 1);

        let (name, marshaller) = registry.lookup_by_native_type(TypeId::of::<Person>()).unwrap();
        assert_eq!(name, "a.Person");
        assert!(marshaller.as_message().is_some());
        assert!(registry.message_marshaller(TypeId::of::<Person>()).is_some());
        assert!(registry.enum_marshaller(TypeId::of::<Person>()).is_none());

        let mood = registry.enum_marshaller(TypeId::of::<Mood>()).unwrap();
        assert!(mood.is_known(0));
        assert!(!mood.is_known(1));
        assert!(registry.lookup_by_name("a.Mood").unwrap().as_enum().is_some());
        assert_eq!(registry.get_with_name("a.Person").unwrap().file(), Some("a.proto"));
        assert!(registry.lookup_by_name("Person").is_none());
        assert!(format!("{registry:?}").contains("a.Person"));
    }

    #[test]
    fn binds_each_message_type_to_its_own_id() {
        let mut registry = person_in("a");
        CompilationUnit::new("tag.proto")
            .package("a")
            .add::<Tag>()
            .compile(&mut registry)
            .unwrap();
        assert_eq!(registry.len(), 2);

        let expected = [
            (TypeId::of::<Person>(), "a.Person"),
            (TypeId::of::<Tag>(), "a.Tag"),
        ];
        for (type_id, name) in expected {
            assert!(registry.contains(type_id));
            let (found, marshaller) = registry.lookup_by_native_type(type_id).unwrap();
            assert_eq!(found, name);
            assert_eq!(marshaller.type_id(), type_id);
        }
        assert_eq!(registry.encode(&Person { id: 3 }).unwrap(), [0x08, 0x03]);
        assert_eq!(
            registry.encode(&Tag { label: "x".into() }).unwrap(),
            [0x0A, 0x01, b'x']
        );
    }

    #[test]
    fn identical_registration_is_a_no_op() {
        let mut registry = person_in("a");
        let (_, first) = entry::<Person>(&registry);
        let (descriptor, second) = entry::<Person>(&person_in("a"));
        assert!(!first.ptr_eq(&second));

        registry.register(descriptor, second).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(TypeId::of::<Person>()).unwrap().marshaller().ptr_eq(&first));
    }

    #[test]
    fn rejects_conflicting_bindings() {
        let mut registry = person_in("a");

        let (descriptor, marshaller) = entry::<Person>(&person_in("b"));
        assert_eq!(
            registry.register(descriptor, marshaller),
            Err(RegistrationError::TypeConflict {
                type_path: core::any::type_name::<Person>().into(),
                name: "a.Person".into(),
            })
        );

        let impostor = impostor();
        let (descriptor, marshaller) = entry::<other::Person>(&impostor);
        assert_eq!(
            registry.register(descriptor, marshaller),
            Err(RegistrationError::NameConflict {
                name: "a.Person".into(),
                existing: core::any::type_name::<Person>().into(),
            })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schema_registration_is_atomic() {
        let mut registry = person_in("a");
        let tags = compiled(CompilationUnit::new("tag.proto").package("a").add::<Tag>());
        let impostor = impostor();

        let file = tags.file("tag.proto").unwrap().clone();
        let err = registry
            .register_schema(file, vec![entry::<Tag>(&tags), entry::<other::Person>(&impostor)])
            .unwrap_err();
        assert!(matches!(err, RegistrationError::NameConflict { .. }));
        assert!(!registry.contains(TypeId::of::<Tag>()));
        assert!(registry.file("tag.proto").is_none());

        let file = tags.file("tag.proto").unwrap().clone();
        registry.register_schema(file, vec![entry::<Tag>(&tags)]).unwrap();
        assert!(registry.contains(TypeId::of::<Tag>()));
        assert_eq!(registry.get_with_name("a.Tag").unwrap().file(), Some("tag.proto"));
    }

    #[test]
    fn rejects_a_different_file_under_the_same_name() {
        let mut registry = person_in("a");
        let tags = compiled(CompilationUnit::new("a.proto").package("a").add::<Tag>());
        let file = tags.file("a.proto").unwrap().clone();
        assert_eq!(
            registry.register_schema(file, vec![entry::<Tag>(&tags)]),
            Err(RegistrationError::FileConflict { file: "a.proto".into() })
        );
        assert!(!registry.contains(TypeId::of::<Tag>()));

        // The same file again is accepted.
        let same = person_in("a");
        let file = same.file("a.proto").unwrap().clone();
        registry.register_schema(file, vec![entry::<Person>(&same)]).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
