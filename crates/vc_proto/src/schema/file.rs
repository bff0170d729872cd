use core::fmt::{self, Write};

use super::{DefaultValue, Descriptor, EnumType, FieldDescriptor, MessageType, ValueType};

/// The output of one compilation unit.
///
/// Holds the generated types only; types reused from earlier units appear
/// as file names in [`FileSchema::imports`]. The [`Display`](fmt::Display)
/// impl renders `.proto` source.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSchema {
    pub(crate) file_name: String,
    pub(crate) package: Option<String>,
    pub(crate) generator: Option<String>,
    pub(crate) imports: Vec<String>,
    pub(crate) types: Vec<Descriptor>,
}

impl FileSchema {
    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// The id of whatever produced this file.
    #[inline]
    pub fn generator(&self) -> Option<&str> {
        self.generator.as_deref()
    }

    #[inline]
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Generated types in discovery order.
    #[inline]
    pub fn types(&self) -> &[Descriptor] {
        &self.types
    }

    pub fn message_types(&self) -> impl Iterator<Item = &MessageType> {
        self.types.iter().filter_map(|t| t.as_message().map(|m| &**m))
    }

    pub fn enum_types(&self) -> impl Iterator<Item = &EnumType> {
        self.types.iter().filter_map(|t| t.as_enum().map(|e| &**e))
    }

    /// Finds a type by simple or qualified name.
    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.types
            .iter()
            .find(|t| t.qualified_name() == name || t.name() == name)
    }

    /// Renders the `.proto` source text.
    pub fn to_proto_string(&self) -> String {
        self.to_string()
    }
}

// -----------------------------------------------------------------------------
// Rendering

const INDENT: &str = "    ";

fn write_docs(f: &mut fmt::Formatter<'_>, indent: &str, docs: Option<&str>) -> fmt::Result {
    let Some(docs) = docs else { return Ok(()) };
    writeln!(f, "{indent}/**")?;
    for line in docs.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            writeln!(f, "{indent} *")?;
        } else {
            writeln!(f, "{indent} * {line}")?;
        }
    }
    writeln!(f, "{indent} */")
}

fn escape_into(out: &mut String, bytes: &[u8]) {
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
}

fn default_literal(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Bool(b) => b.to_string(),
        DefaultValue::Int(i) => i.to_string(),
        DefaultValue::UInt(u) => u.to_string(),
        DefaultValue::Float(v) if v.is_nan() => "nan".into(),
        DefaultValue::Float(v) if v.is_infinite() => {
            if *v > 0.0 { "inf".into() } else { "-inf".into() }
        }
        DefaultValue::Float(v) => format!("{v:?}"),
        DefaultValue::String(s) => {
            let mut out = String::from("\"");
            escape_into(&mut out, s.as_bytes());
            out.push('"');
            out
        }
        DefaultValue::Bytes(b) => {
            let mut out = String::from("\"");
            escape_into(&mut out, b);
            out.push('"');
            out
        }
        DefaultValue::Enum { name, .. } => name.clone(),
    }
}

struct Renderer<'a> {
    package: Option<&'a str>,
}

impl Renderer<'_> {
    // Same-package references are written relative, others fully qualified.
    fn type_name(&self, value_type: &ValueType) -> String {
        match value_type {
            ValueType::Scalar(s) => s.proto_name().into(),
            ValueType::Message(name) | ValueType::Enum(name) => match self.package {
                Some(pkg) => match name.strip_prefix(pkg).and_then(|r| r.strip_prefix('.')) {
                    Some(local) => local.into(),
                    None => format!(".{name}"),
                },
                None => name.clone(),
            },
        }
    }

    fn field(
        &self,
        f: &mut fmt::Formatter<'_>,
        indent: &str,
        field: &FieldDescriptor,
    ) -> fmt::Result {
        write_docs(f, indent, field.docs())?;
        f.write_str(indent)?;
        if let Some(key) = field.map_key {
            write!(f, "map<{}, {}>", key, self.type_name(&field.value_type))?;
        } else {
            if field.oneof.is_none() {
                write!(f, "{} ", field.cardinality.label())?;
            }
            f.write_str(&self.type_name(&field.value_type))?;
        }
        write!(f, " {} = {}", field.name, field.number)?;
        if let Some(default) = &field.default {
            write!(f, " [default = {}]", default_literal(default))?;
        } else if field.packed {
            f.write_str(" [packed = true]")?;
        }
        f.write_str(";\n")
    }

    fn message(&self, f: &mut fmt::Formatter<'_>, message: &MessageType) -> fmt::Result {
        write_docs(f, "", message.docs())?;
        writeln!(f, "message {} {{", message.name)?;
        let nested = format!("{INDENT}{INDENT}");
        let mut rendered_oneofs: Vec<&str> = Vec::new();
        for field in &message.fields {
            match &field.oneof {
                None => self.field(f, INDENT, field)?,
                Some(group) if rendered_oneofs.contains(&group.as_str()) => {}
                Some(group) => {
                    rendered_oneofs.push(group);
                    writeln!(f, "{INDENT}oneof {group} {{")?;
                    for member in message
                        .fields
                        .iter()
                        .filter(|m| m.oneof.as_ref() == Some(group))
                    {
                        self.field(f, &nested, member)?;
                    }
                    writeln!(f, "{INDENT}}}")?;
                }
            }
        }
        f.write_str("}\n")
    }

    fn enumeration(&self, f: &mut fmt::Formatter<'_>, ty: &EnumType) -> fmt::Result {
        write_docs(f, "", ty.docs())?;
        writeln!(f, "enum {} {{", ty.name)?;
        for value in &ty.values {
            write_docs(f, INDENT, value.docs())?;
            writeln!(f, "{INDENT}{} = {};", value.name, value.number)?;
        }
        f.write_str("}\n")
    }
}

impl fmt::Display for FileSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(generator) = &self.generator {
            writeln!(f, "// File `{}` generated by {generator}.", self.file_name)?;
            writeln!(f)?;
        }
        writeln!(f, "syntax = \"proto2\";")?;
        if let Some(package) = &self.package {
            writeln!(f, "\npackage {package};")?;
        }
        if !self.imports.is_empty() {
            writeln!(f)?;
            for import in &self.imports {
                writeln!(f, "import \"{import}\";")?;
            }
        }

        let renderer = Renderer {
            package: self.package.as_deref(),
        };
        for ty in &self.types {
            writeln!(f)?;
            match ty {
                Descriptor::Message(m) => renderer.message(f, m)?,
                Descriptor::Enum(e) => renderer.enumeration(f, e)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::{Cardinality, EnumValue, OneofGroup, ScalarType};
    use crate::wire::WireType;

    fn field(
        number: u32,
        name: &str,
        cardinality: Cardinality,
        value_type: ValueType,
    ) -> FieldDescriptor {
        FieldDescriptor {
            number,
            name: name.into(),
            wire_type: value_type.wire_type(),
            cardinality,
            value_type,
            map_key: None,
            default: None,
            presence: false,
            packed: false,
            oneof: None,
            docs: None,
        }
    }

    #[test]
    fn renders_messages_and_enums() {
        let string = || ValueType::Scalar(ScalarType::String);
        let mut email = field(3, "email", Cardinality::Optional, string());
        email.oneof = Some("contact".into());
        let mut phone = field(4, "phone", Cardinality::Optional, string());
        phone.oneof = Some("contact".into());
        let level_type = ValueType::Enum("demo.Level".into());
        let mut level = field(5, "level", Cardinality::Optional, level_type);
        level.default = Some(DefaultValue::Enum {
            name: "LOW".into(),
            number: 0,
        });
        let mut scores = field(6, "scores", Cardinality::Map, ValueType::Scalar(ScalarType::Int32));
        scores.map_key = Some(ScalarType::String);
        scores.wire_type = WireType::LengthDelimited;

        let big_type = ValueType::Message("math.BigInteger".into());
        let message = MessageType {
            name: "Person".into(),
            qualified_name: "demo.Person".into(),
            fields: vec![
                field(1, "id", Cardinality::Required, ValueType::Scalar(ScalarType::Int32)),
                field(2, "tags", Cardinality::Repeated, string()),
                email,
                phone,
                level,
                scores,
                field(7, "big", Cardinality::Optional, big_type),
            ],
            oneofs: vec![OneofGroup {
                name: "contact".into(),
                numbers: vec![3, 4],
            }],
            docs: Some("A person.".into()),
        };
        let level = EnumType {
            name: "Level".into(),
            qualified_name: "demo.Level".into(),
            values: vec![EnumValue {
                name: "LOW".into(),
                number: 0,
                docs: None,
            }],
            docs: None,
        };
        let file = FileSchema {
            file_name: "person.proto".into(),
            package: Some("demo".into()),
            generator: Some("test".into()),
            imports: vec!["math.proto".into()],
            types: vec![
                Descriptor::Message(Arc::new(message)),
                Descriptor::Enum(Arc::new(level)),
            ],
        };

        let expected = "\
// File `person.proto` generated by test.

syntax = \"proto2\";

package demo;

import \"math.proto\";

/**
 * A person.
 */
message Person {
    required int32 id = 1;
    repeated string tags = 2;
    oneof contact {
        string email = 3;
        string phone = 4;
    }
    optional Level level = 5 [default = LOW];
    map<string, int32> scores = 6;
    optional .math.BigInteger big = 7;
}

enum Level {
    LOW = 0;
}
";
        assert_eq!(file.to_proto_string(), expected);
        assert!(file.get("Person").is_some());
        assert!(file.get("demo.Level").is_some());
        assert_eq!(file.message_types().count(), 1);
    }

    #[test]
    fn escapes_string_defaults() {
        assert_eq!(
            default_literal(&DefaultValue::String("a\"b\n".into())),
            "\"a\\\"b\\n\""
        );
        assert_eq!(default_literal(&DefaultValue::Float(1.5)), "1.5");
        assert_eq!(default_literal(&DefaultValue::Bytes(vec![0, b'a'])), "\"\\000a\"");
    }
}
