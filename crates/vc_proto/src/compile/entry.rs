use std::sync::Arc;

use crate::info::TypeRef;
use crate::marshal::Marshaller;
use crate::schema::{Descriptor, EnumType, FileSchema, MessageType};

/// One type of a compilation's closure.
#[derive(Debug, Clone)]
pub enum SchemaEntry {
    /// Built by this compilation and written to its file.
    Generated {
        descriptor: Descriptor,
        owner: TypeRef,
        generator: Option<String>,
    },
    /// Known to the registry before this compilation started.
    Imported {
        descriptor: Descriptor,
        marshaller: Marshaller,
    },
}

impl SchemaEntry {
    #[inline]
    pub fn descriptor(&self) -> &Descriptor {
        match self {
            Self::Generated { descriptor, .. } | Self::Imported { descriptor, .. } => descriptor,
        }
    }

    #[inline]
    pub fn qualified_name(&self) -> &str {
        self.descriptor().qualified_name()
    }

    #[inline]
    pub fn is_imported(&self) -> bool {
        matches!(self, Self::Imported { .. })
    }
}

/// The result of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub(super) file: Arc<FileSchema>,
    pub(super) entries: Vec<SchemaEntry>,
}

impl CompiledSchema {
    /// The generated file; imported types appear only as imports.
    #[inline]
    pub fn file(&self) -> &Arc<FileSchema> {
        &self.file
    }

    /// Generated entries in file order, then imported ones in the order
    /// they were reached.
    #[inline]
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn entry(&self, qualified_name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.qualified_name() == qualified_name)
    }

    pub fn message_types(&self) -> impl Iterator<Item = &MessageType> {
        self.file.message_types()
    }

    pub fn enum_types(&self) -> impl Iterator<Item = &EnumType> {
        self.file.enum_types()
    }

    pub fn imported(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.iter().filter(|e| e.is_imported())
    }
}
