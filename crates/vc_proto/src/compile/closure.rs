use core::any::TypeId;
use std::collections::VecDeque;

use crate::adapters;
use crate::builder::{RefKind, ResolvedType, TypeResolver, qualify};
use crate::collections::HashMap;
use crate::error::{CompileError, ImportError, SchemaError};
use crate::info::{FieldType, MemberKind, TypeInfo, TypeKind, TypeRef};
use crate::marshal::Marshaller;
use crate::registry::ProtoRegistry;
use crate::schema::Descriptor;

// -----------------------------------------------------------------------------
// Node

pub(super) enum Decision {
    Generate,
    Import {
        descriptor: Descriptor,
        marshaller: Marshaller,
        file: Option<String>,
    },
}

/// One reachable type and the name it has in this compilation.
pub(super) struct Node {
    pub ty: TypeRef,
    pub qualified_name: String,
    pub kind: RefKind,
    pub decision: Decision,
}

impl Node {
    fn type_path(&self) -> &str {
        match &self.decision {
            Decision::Generate => self.ty.type_path(),
            Decision::Import { marshaller, .. } => marshaller.type_path(),
        }
    }
}

// -----------------------------------------------------------------------------
// Closure

/// Every type reachable from a unit's requests, in the order reached.
pub(super) struct Closure {
    nodes: Vec<Node>,
    index: HashMap<TypeId, usize>,
}

impl Closure {
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

impl TypeResolver for Closure {
    fn resolve(&self, ty: &TypeRef) -> Option<ResolvedType> {
        let node = &self.nodes[*self.index.get(&ty.id())?];
        Some(ResolvedType {
            qualified_name: node.qualified_name.clone(),
            kind: node.kind,
        })
    }
}

// -----------------------------------------------------------------------------
// Walker

pub(super) struct Walker<'a> {
    registry: &'a ProtoRegistry,
    file_name: &'a str,
    package: Option<&'a str>,
    auto_expand: bool,
    closure: Closure,
    pending: VecDeque<usize>,
}

impl<'a> Walker<'a> {
    pub fn new(
        registry: &'a ProtoRegistry,
        file_name: &'a str,
        package: Option<&'a str>,
        auto_expand: bool,
    ) -> Self {
        Self {
            registry,
            file_name,
            package,
            auto_expand,
            closure: Closure {
                nodes: Vec::new(),
                index: HashMap::default(),
            },
            pending: VecDeque::new(),
        }
    }

    /// Adds a requested type. Registered types are imported instead.
    pub fn request(&mut self, ty: &TypeRef) -> Result<(), CompileError> {
        if self.closure.index.contains_key(&ty.id()) || self.try_import(ty) {
            return Ok(());
        }
        let ty = with_adapter(ty)?;
        self.generate(ty);
        Ok(())
    }

    /// Walks all pending types, then checks the combined namespace.
    pub fn finish(mut self) -> Result<Closure, CompileError> {
        while let Some(index) = self.pending.pop_front() {
            let ty = self.closure.nodes[index].ty.clone();
            let Some(info) = ty.info() else { continue };
            let mut refs = Vec::new();
            collect_refs(info, &mut refs, &mut vec![info.id()]);
            for referenced in &refs {
                self.reach(info.type_path(), referenced)?;
            }
        }
        self.check_names()?;
        Ok(self.closure)
    }

    fn reach(&mut self, referrer: &str, ty: &TypeRef) -> Result<(), CompileError> {
        if self.closure.index.contains_key(&ty.id()) || self.try_import(ty) {
            return Ok(());
        }
        if !self.auto_expand {
            return Err(ImportError::Unresolved {
                referrer: referrer.to_owned(),
                referenced: ty.type_path().to_owned(),
            }
            .into());
        }
        let ty = with_adapter(ty)?;
        log::debug!("`{referrer}` pulls `{}` into the compilation", ty.type_path());
        self.generate(ty);
        Ok(())
    }

    // Types registered by an earlier compilation of this same file are
    // generated again, so recompiling a unit is idempotent.
    fn try_import(&mut self, ty: &TypeRef) -> bool {
        let Some(entry) = self.registry.get(ty.id()) else {
            return false;
        };
        if entry.file() == Some(self.file_name) {
            return false;
        }
        let kind = match entry.descriptor() {
            Descriptor::Message(_) => RefKind::Message,
            Descriptor::Enum(_) => RefKind::Enum,
        };
        log::debug!("importing `{}` for `{}`", entry.qualified_name(), ty.type_path());
        self.push(Node {
            ty: ty.clone(),
            qualified_name: entry.qualified_name().to_owned(),
            kind,
            decision: Decision::Import {
                descriptor: entry.descriptor().clone(),
                marshaller: entry.marshaller().clone(),
                file: entry.file().map(str::to_owned),
            },
        });
        true
    }

    // `ty` must carry type info.
    fn generate(&mut self, ty: TypeRef) {
        let Some(info) = ty.info() else { return };
        let qualified_name = qualify(self.package, info.proto_name());
        let kind = match info.kind() {
            TypeKind::Message(_) => RefKind::Message,
            TypeKind::Enum(_) => RefKind::Enum,
        };
        let index = self.push(Node {
            ty,
            qualified_name,
            kind,
            decision: Decision::Generate,
        });
        self.pending.push_back(index);
    }

    fn push(&mut self, node: Node) -> usize {
        let index = self.closure.nodes.len();
        self.closure.index.insert(node.ty.id(), index);
        self.closure.nodes.push(node);
        index
    }

    fn check_names(&self) -> Result<(), SchemaError> {
        let mut seen: HashMap<&str, &Node> = HashMap::default();
        for node in &self.closure.nodes {
            if let Some(first) = seen.insert(node.qualified_name.as_str(), node) {
                return Err(SchemaError::DuplicateTypeName {
                    name: node.qualified_name.clone(),
                    first: first.type_path().to_owned(),
                    second: node.type_path().to_owned(),
                });
            }
            if matches!(node.decision, Decision::Generate)
                && let Some(existing) = self.registry.get_with_name(&node.qualified_name)
                && existing.marshaller().type_id() != node.ty.id()
            {
                return Err(SchemaError::DuplicateTypeName {
                    name: node.qualified_name.clone(),
                    first: existing.marshaller().type_path().to_owned(),
                    second: node.type_path().to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Replaces a foreign reference by its built-in adapter.
fn with_adapter(ty: &TypeRef) -> Result<TypeRef, ImportError> {
    if ty.info().is_some() {
        return Ok(ty.clone());
    }
    adapters::builtin(ty.id()).ok_or_else(|| ImportError::NoAdapter {
        type_path: ty.type_path().to_owned(),
    })
}

// Flattened supertypes are inlined, so their references belong to the
// flattening type. Cycles are left for the builder to report.
fn collect_refs(info: &TypeInfo, out: &mut Vec<TypeRef>, visiting: &mut Vec<TypeId>) {
    let Some(message) = info.as_message() else {
        return;
    };
    for member in message.members() {
        match member.kind() {
            MemberKind::Field => {
                out.extend(member.field_type().referenced_types().into_iter().cloned())
            }
            MemberKind::Flatten => {
                if let FieldType::Message(parent) = member.field_type()
                    && !visiting.contains(&parent.id())
                    && let Some(parent_info) = parent.info()
                {
                    visiting.push(parent.id());
                    collect_refs(parent_info, out, visiting);
                    visiting.pop();
                }
            }
        }
    }
}
