use std::sync::Arc;

use super::closure::{Decision, Walker};
use super::entry::{CompiledSchema, SchemaEntry};
use crate::builder::{BuiltType, MetadataBuilder, is_package};
use crate::error::{CompileError, SchemaError};
use crate::info::{TypeRef, Typed};
use crate::marshal::{EnumMarshaller, GeneratedMarshaller, Marshaller};
use crate::registry::ProtoRegistry;
use crate::schema::{Descriptor, FileSchema};

// -----------------------------------------------------------------------------
// CompilationUnit

/// A request to compile types into one schema file.
///
/// Types referenced by the requested ones are pulled into the same file
/// unless they are already registered, in which case they are imported.
/// With [`auto_expand`](Self::auto_expand) disabled, every referenced type
/// must be requested or registered.
///
/// # Example
///
/// ```
/// use vc_proto::prelude::*;
///
/// #[derive(ProtoMessage)]
/// struct Person {
///     #[proto(number = 1, required)]
///     id: i32,
///     #[proto(number = 2)]
///     tags: Vec<String>,
/// }
///
/// let mut registry = ProtoRegistry::new();
/// let schema = CompilationUnit::new("person.proto")
///     .package("demo")
///     .add::<Person>()
///     .compile(&mut registry)
///     .unwrap();
///
/// let person = schema.message_types().next().unwrap();
/// assert_eq!(person.qualified_name(), "demo.Person");
/// assert_eq!(person.fields().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    file_name: String,
    package: Option<String>,
    generator: Option<String>,
    requested: Vec<TypeRef>,
    auto_expand: bool,
}

impl CompilationUnit {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            package: None,
            generator: None,
            requested: Vec::new(),
            auto_expand: true,
        }
    }

    /// Sets the namespace qualified names are built in.
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Sets the generator id recorded on generated entries.
    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    #[inline]
    pub fn add<T: Typed>(self) -> Self {
        self.add_type(TypeRef::of::<T>())
    }

    /// Requests a type by handle, such as a live adapter.
    pub fn add_type(mut self, ty: TypeRef) -> Self {
        self.requested.push(ty);
        self
    }

    /// Whether unrequested referenced types are generated. Defaults to `true`.
    pub fn auto_expand(mut self, enabled: bool) -> Self {
        self.auto_expand = enabled;
        self
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Resolves, builds and compiles without touching the registry.
    pub fn prepare(&self, registry: &ProtoRegistry) -> Result<PreparedUnit, CompileError> {
        if self.requested.is_empty() {
            return Err(SchemaError::EmptyCompilation.into());
        }
        if let Some(package) = &self.package
            && !is_package(package)
        {
            return Err(SchemaError::InvalidName {
                type_path: self.file_name.clone(),
                name: package.clone(),
            }
            .into());
        }

        let mut walker = Walker::new(
            registry,
            &self.file_name,
            self.package.as_deref(),
            self.auto_expand,
        );
        for ty in &self.requested {
            walker.request(ty)?;
        }
        let closure = walker.finish()?;

        let builder = MetadataBuilder::new(&closure);
        let mut types = Vec::new();
        let mut registrations = Vec::new();
        for node in closure.nodes() {
            if !matches!(node.decision, Decision::Generate) {
                continue;
            }
            let info = node.ty.info().ok_or_else(|| SchemaError::MissingTypeInfo {
                type_path: node.ty.type_path().to_owned(),
            })?;
            let (descriptor, marshaller) = match builder.build(&node.ty)? {
                BuiltType::Message(built) => {
                    let marshaller = GeneratedMarshaller::compile(info, &built)?;
                    (
                        Descriptor::Message(built.descriptor),
                        Marshaller::Message(Arc::new(marshaller)),
                    )
                }
                BuiltType::Enum(descriptor) => {
                    let marshaller =
                        EnumMarshaller::new(info.id(), info.type_path(), descriptor.clone());
                    (Descriptor::Enum(descriptor), Marshaller::Enum(Arc::new(marshaller)))
                }
            };
            log::debug!("generated `{}` into `{}`", node.qualified_name, self.file_name);
            types.push(descriptor.clone());
            registrations.push((descriptor, marshaller));
        }

        let mut entries = Vec::with_capacity(closure.nodes().len());
        let mut imported = Vec::new();
        let mut imports: Vec<String> = Vec::new();
        let mut generated = types.iter();
        for node in closure.into_nodes() {
            match node.decision {
                Decision::Generate => {
                    if let Some(descriptor) = generated.next() {
                        entries.push(SchemaEntry::Generated {
                            descriptor: descriptor.clone(),
                            owner: node.ty,
                            generator: self.generator.clone(),
                        });
                    }
                }
                Decision::Import {
                    descriptor,
                    marshaller,
                    file,
                } => {
                    if let Some(file) = file
                        && file != self.file_name
                        && !imports.contains(&file)
                    {
                        imports.push(file);
                    }
                    imported.push(SchemaEntry::Imported {
                        descriptor,
                        marshaller,
                    });
                }
            }
        }
        entries.append(&mut imported);

        Ok(PreparedUnit {
            file: Arc::new(FileSchema {
                file_name: self.file_name.clone(),
                package: self.package.clone(),
                generator: self.generator.clone(),
                imports,
                types,
            }),
            entries,
            registrations,
        })
    }

    /// Prepares and commits in one step.
    pub fn compile(self, registry: &mut ProtoRegistry) -> Result<CompiledSchema, CompileError> {
        self.prepare(registry)?.commit(registry)
    }
}

// -----------------------------------------------------------------------------
// PreparedUnit

/// A compiled but not yet registered unit.
#[derive(Debug)]
pub struct PreparedUnit {
    file: Arc<FileSchema>,
    entries: Vec<SchemaEntry>,
    registrations: Vec<(Descriptor, Marshaller)>,
}

impl PreparedUnit {
    #[inline]
    pub fn file(&self) -> &Arc<FileSchema> {
        &self.file
    }

    /// Registers every generated type, or none of them.
    pub fn commit(self, registry: &mut ProtoRegistry) -> Result<CompiledSchema, CompileError> {
        registry.register_schema(self.file.clone(), self.registrations)?;
        Ok(CompiledSchema {
            file: self.file,
            entries: self.entries,
        })
    }
}
