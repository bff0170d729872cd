//! Marshallers: executable plans that move instances across the wire.
//!
//! A [`GeneratedMarshaller`] is compiled from a built message descriptor
//! and the type's [`MessageInfo`](crate::info::MessageInfo). Nested and
//! imported types are never called directly; every reference goes through
//! the [`ProtoRegistry`] at run time, so a marshaller registered by an
//! earlier compilation serves all later ones.

// -----------------------------------------------------------------------------
// Modules

mod decode;
mod encode;
mod plan;

// -----------------------------------------------------------------------------
// Exports

pub use plan::GeneratedMarshaller;

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

use crate::collections::HashSet;
use crate::error::{DecodeError, EncodeError};
use crate::registry::ProtoRegistry;
use crate::schema::{EnumType, MessageType};
use crate::wire::{ProtoReader, ProtoWriter};

// -----------------------------------------------------------------------------
// MessageMarshaller

/// Reads and writes one message type.
///
/// `read` consumes the whole reader: a top-level message has no length
/// header, nested ones are handed a reader over their frame.
pub trait MessageMarshaller: Send + Sync + 'static {
    /// The native type instances have.
    fn type_id(&self) -> TypeId;

    fn type_path(&self) -> &str;

    fn descriptor(&self) -> &Arc<MessageType>;

    fn read(
        &self,
        registry: &ProtoRegistry,
        reader: &mut ProtoReader<'_>,
    ) -> Result<Box<dyn Any>, DecodeError>;

    fn write(
        &self,
        registry: &ProtoRegistry,
        writer: &mut ProtoWriter,
        value: &dyn Any,
    ) -> Result<(), EncodeError>;
}

// -----------------------------------------------------------------------------
// EnumMarshaller

/// Validates enum numbers against the declared values.
pub struct EnumMarshaller {
    type_id: TypeId,
    type_path: String,
    descriptor: Arc<EnumType>,
    known: HashSet<i32>,
}

impl EnumMarshaller {
    pub fn new(type_id: TypeId, type_path: impl Into<String>, descriptor: Arc<EnumType>) -> Self {
        let known = descriptor.values().iter().map(|v| v.number()).collect();
        Self {
            type_id,
            type_path: type_path.into(),
            descriptor,
            known,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    #[inline]
    pub fn descriptor(&self) -> &Arc<EnumType> {
        &self.descriptor
    }

    #[inline]
    pub fn is_known(&self, number: i32) -> bool {
        self.known.contains(&number)
    }
}

impl fmt::Debug for EnumMarshaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumMarshaller")
            .field("type_path", &self.type_path)
            .field("name", &self.descriptor.qualified_name())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Marshaller

/// A registered marshaller of either kind.
#[derive(Clone)]
pub enum Marshaller {
    Message(Arc<dyn MessageMarshaller>),
    Enum(Arc<EnumMarshaller>),
}

impl Marshaller {
    pub fn type_id(&self) -> TypeId {
        match self {
            // `Any::type_id` would answer for the `Arc` itself.
            Self::Message(m) => MessageMarshaller::type_id(&**m),
            Self::Enum(e) => EnumMarshaller::type_id(e),
        }
    }

    pub fn type_path(&self) -> &str {
        match self {
            Self::Message(m) => m.type_path(),
            Self::Enum(e) => e.type_path(),
        }
    }

    pub fn as_message(&self) -> Option<&Arc<dyn MessageMarshaller>> {
        match self {
            Self::Message(m) => Some(m),
            Self::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Arc<EnumMarshaller>> {
        match self {
            Self::Enum(e) => Some(e),
            Self::Message(_) => None,
        }
    }

    /// Whether both handles share one instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Message(a), Self::Message(b)) => Arc::ptr_eq(a, b),
            (Self::Enum(a), Self::Enum(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Marshaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(m) => write!(f, "Marshaller::Message({})", m.type_path()),
            Self::Enum(e) => write!(f, "Marshaller::Enum({})", e.type_path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::any::TypeId;
    use std::collections::BTreeMap;

    use bytes::Bytes;
    use proptest::prelude::*;

    use crate::error::{DecodeError, EncodeError, RequiredFieldError, WireError};
    use crate::prelude::*;
    use crate::wire::{RECURSION_LIMIT, WireType};

    #[derive(ProtoMessage, Debug, Clone, PartialEq)]
    struct Person {
        #[proto(number = 1, required)]
        id: i32,
        #[proto(number = 2)]
        tags: Vec<String>,
    }

    #[derive(ProtoEnum, Debug, Clone, Copy, PartialEq)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    fn registry(unit: CompilationUnit) -> ProtoRegistry {
        let mut registry = ProtoRegistry::new();
        unit.compile(&mut registry).unwrap();
        registry
    }

    fn people() -> ProtoRegistry {
        registry(CompilationUnit::new("people.proto").package("t").add::<Person>())
    }

    #[test]
    fn round_trips_fields_in_order() {
        let registry = people();
        let person = Person {
            id: 7,
            tags: vec!["a".into(), "b".into()],
        };
        let bytes = registry.encode(&person).unwrap();
        assert_eq!(bytes, [0x08, 0x07, 0x12, 0x01, b'a', 0x12, 0x01, b'b']);
        assert_eq!(registry.decode::<Person>(&bytes).unwrap(), person);

        let decoded = registry.decode_by_name("t.Person", &bytes).unwrap();
        assert_eq!(decoded.downcast_ref::<Person>(), Some(&person));

        // Dropping the last byte cuts the second tag short.
        assert_eq!(
            registry.decode::<Person>(&bytes[..bytes.len() - 1]),
            Err(DecodeError::Wire(WireError::Truncated { needed: 1 }))
        );
    }

    #[test]
    fn rejects_malformed_input() {
        let registry = people();
        assert_eq!(
            registry.decode::<Person>(&[0x08]),
            Err(DecodeError::Wire(WireError::Truncated { needed: 1 }))
        );
        assert_eq!(
            registry.decode::<Person>(&[0x0B]),
            Err(DecodeError::Wire(WireError::UnknownWireType(3)))
        );
        assert_eq!(
            registry.decode::<Person>(&[0x0A, 0x00]),
            Err(DecodeError::Wire(WireError::WireTypeMismatch {
                number: 1,
                expected: WireType::Varint,
                found: WireType::LengthDelimited,
            }))
        );
        assert_eq!(
            registry.decode::<Person>(&[0x08, 0x01, 0x12, 0x05, b'a']),
            Err(DecodeError::Wire(WireError::Truncated { needed: 4 }))
        );
        assert_eq!(
            registry.decode::<Person>(&[0x08, 0x01, 0x12, 0x01, 0xFF]),
            Err(DecodeError::Wire(WireError::InvalidUtf8 { number: 2 }))
        );
    }

    #[test]
    fn reports_missing_required_fields() {
        let registry = people();
        assert_eq!(
            registry.decode::<Person>(&[0x12, 0x01, b'a']),
            Err(DecodeError::Required(RequiredFieldError {
                type_name: "t.Person".into(),
                field: "id".into(),
            }))
        );
        // A required scalar is written even when zero.
        let zero = Person { id: 0, tags: vec![] };
        assert_eq!(registry.encode(&zero).unwrap(), [0x08, 0x00]);
    }

    #[test]
    fn nests_messages() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Team {
            #[proto(number = 1)]
            lead: Option<Person>,
            #[proto(number = 2)]
            members: Vec<Person>,
        }

        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Order {
            #[proto(number = 1)]
            buyer: Person,
        }

        let registry = registry(
            CompilationUnit::new("teams.proto")
                .package("t")
                .add::<Team>()
                .add::<Order>(),
        );
        let team = Team {
            lead: Some(Person { id: 1, tags: vec![] }),
            members: vec![
                Person { id: 2, tags: vec!["x".into()] },
                Person { id: 3, tags: vec![] },
            ],
        };
        let bytes = registry.encode(&team).unwrap();
        assert_eq!(&bytes[..4], [0x0A, 0x02, 0x08, 0x01]);
        assert_eq!(registry.decode::<Team>(&bytes).unwrap(), team);

        let empty = Team { lead: None, members: vec![] };
        assert!(registry.encode(&empty).unwrap().is_empty());
        assert_eq!(registry.decode::<Team>(&[]).unwrap(), empty);

        // The nested message is decoded as a whole and its own required
        // field is checked.
        assert!(matches!(
            registry.decode::<Team>(&[0x0A, 0x00]),
            Err(DecodeError::Required(RequiredFieldError { field, .. })) if field == "id"
        ));
        // A bare message field is required.
        assert!(matches!(
            registry.decode::<Order>(&[]),
            Err(DecodeError::Required(RequiredFieldError { field, .. })) if field == "buyer"
        ));
    }

    #[test]
    fn bounds_message_nesting() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Node {
            #[proto(number = 1)]
            child: Option<Box<Node>>,
        }

        fn chain(depth: u32) -> Node {
            (0..depth).fold(Node { child: None }, |node, _| Node {
                child: Some(Box::new(node)),
            })
        }

        let registry = registry(CompilationUnit::new("tree.proto").package("t").add::<Node>());
        let deepest = chain(RECURSION_LIMIT);
        let bytes = registry.encode(&deepest).unwrap();
        assert_eq!(registry.decode::<Node>(&bytes).unwrap(), deepest);

        let bytes = registry.encode(&chain(RECURSION_LIMIT + 1)).unwrap();
        assert_eq!(
            registry.decode::<Node>(&bytes),
            Err(DecodeError::Wire(WireError::RecursionLimit(RECURSION_LIMIT)))
        );

        // Far deeper input fails the same way instead of exhausting the stack.
        let mut hostile = Vec::new();
        for _ in 0..2000 {
            let mut outer = vec![0x0A];
            prost::encoding::encode_varint(hostile.len() as u64, &mut outer);
            outer.extend_from_slice(&hostile);
            hostile = outer;
        }
        assert_eq!(
            registry.decode::<Node>(&hostile),
            Err(DecodeError::Wire(WireError::RecursionLimit(RECURSION_LIMIT)))
        );
    }

    #[test]
    fn keeps_unknown_fields() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        #[proto(name = "Person")]
        struct PersonV2 {
            #[proto(number = 1, required)]
            id: i32,
            #[proto(number = 2)]
            tags: Vec<String>,
            #[proto(number = 3)]
            email: String,
        }

        #[derive(ProtoMessage, Debug, PartialEq)]
        #[proto(name = "Person")]
        struct Lean {
            #[proto(number = 1, required)]
            id: i32,
            #[proto(unknown_fields)]
            unknown: UnknownFieldSet,
        }

        let v2 = registry(CompilationUnit::new("v2.proto").package("v2").add::<PersonV2>());
        let v1 = registry(CompilationUnit::new("v1.proto").package("v1").add::<Lean>());

        let full = PersonV2 {
            id: 9,
            tags: vec!["a".into()],
            email: "e".into(),
        };
        let bytes = v2.encode(&full).unwrap();
        let lean = v1.decode::<Lean>(&bytes).unwrap();
        assert_eq!(lean.id, 9);
        assert_eq!(lean.unknown.as_bytes(), [0x12, 0x01, b'a', 0x1A, 0x01, b'e']);
        assert_eq!(
            lean.unknown.tags().iter().map(|t| t.number).collect::<Vec<_>>(),
            [2, 3]
        );

        let reencoded = v1.encode(&lean).unwrap();
        assert_eq!(reencoded, bytes);
        assert_eq!(v2.decode::<PersonV2>(&reencoded).unwrap(), full);
    }

    #[test]
    fn drops_unknown_fields_without_holder() {
        let registry = people();
        let person = registry.decode::<Person>(&[0x08, 0x01, 0x18, 0x05]).unwrap();
        assert_eq!(person, Person { id: 1, tags: vec![] });
        assert_eq!(registry.encode(&person).unwrap(), [0x08, 0x01]);
    }

    #[test]
    fn oneof_keeps_last_member() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Contact {
            #[proto(number = 1, oneof = "channel")]
            email: Option<String>,
            #[proto(number = 2, oneof = "channel")]
            phone: Option<String>,
        }

        let registry = registry(CompilationUnit::new("contact.proto").add::<Contact>());
        let descriptor = registry.lookup_by_name("Contact").unwrap().as_message().unwrap().clone();
        assert_eq!(descriptor.oneofs()[0].numbers(), [1, 2]);

        let contact = registry
            .decode::<Contact>(&[0x0A, 0x01, b'a', 0x12, 0x01, b'5'])
            .unwrap();
        assert_eq!(contact.email, None);
        assert_eq!(contact.phone.as_deref(), Some("5"));

        let contact = registry
            .decode::<Contact>(&[0x12, 0x01, b'5', 0x0A, 0x01, b'a'])
            .unwrap();
        assert_eq!(contact.email.as_deref(), Some("a"));
        assert_eq!(contact.phone, None);

        let bytes = registry
            .encode(&Contact {
                email: None,
                phone: Some(String::new()),
            })
            .unwrap();
        assert_eq!(bytes, [0x12, 0x00]);
    }

    #[test]
    fn routes_unknown_enum_values() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Paint {
            #[proto(number = 1)]
            color: Color,
            #[proto(number = 2)]
            colors: Vec<Color>,
            #[proto(number = 3, packed = false)]
            loose: Vec<Color>,
            #[proto(unknown_fields)]
            unknown: UnknownFieldSet,
        }

        #[derive(ProtoMessage, Debug, PartialEq)]
        struct OpenPaint {
            #[proto(number = 1)]
            color: OpenEnum<Color>,
        }

        let registry = registry(
            CompilationUnit::new("paint.proto")
                .package("t")
                .add::<Paint>()
                .add::<OpenPaint>(),
        );
        assert!(registry.lookup_by_name("t.Color").is_some());

        let input = [
            0x08, 0x07, // color: unknown
            0x12, 0x02, 0x01, 0x09, // colors: packed [GREEN, 9]
            0x18, 0x02, // loose: BLUE
            0x18, 0x05, // loose: unknown
        ];
        let paint = registry.decode::<Paint>(&input).unwrap();
        assert_eq!(paint.color, Color::Red);
        assert_eq!(paint.colors, [Color::Green]);
        assert_eq!(paint.loose, [Color::Blue]);
        assert_eq!(paint.unknown.as_bytes(), [0x08, 0x07, 0x10, 0x09, 0x18, 0x05]);

        assert_eq!(
            registry.encode(&paint).unwrap(),
            [0x08, 0x00, 0x12, 0x01, 0x01, 0x18, 0x02, 0x08, 0x07, 0x10, 0x09, 0x18, 0x05]
        );

        let open = registry.decode::<OpenPaint>(&[0x08, 0x07]).unwrap();
        assert_eq!(open.color, OpenEnum::Unknown(7));
        assert_eq!(open.color.known(), None);
        assert_eq!(registry.encode(&open).unwrap(), [0x08, 0x07]);

        let open = registry.decode::<OpenPaint>(&[0x08, 0x02]).unwrap();
        assert_eq!(open.color, OpenEnum::Known(Color::Blue));
        assert_eq!(registry.decode::<OpenPaint>(&[]).unwrap().color, OpenEnum::Known(Color::Red));
    }

    #[test]
    fn encodes_maps_as_entries() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Inventory {
            #[proto(number = 1)]
            stock: BTreeMap<String, u32>,
            #[proto(number = 2)]
            labels: BTreeMap<i32, Color>,
            #[proto(unknown_fields)]
            unknown: UnknownFieldSet,
        }

        let registry = registry(CompilationUnit::new("inventory.proto").add::<Inventory>());
        let inventory = Inventory {
            stock: BTreeMap::from([("a".to_owned(), 1)]),
            labels: BTreeMap::new(),
            unknown: UnknownFieldSet::new(),
        };
        let bytes = registry.encode(&inventory).unwrap();
        assert_eq!(bytes, [0x0A, 0x05, 0x0A, 0x01, b'a', 0x10, 0x01]);
        assert_eq!(registry.decode::<Inventory>(&bytes).unwrap(), inventory);

        // Missing halves take zero values, a later duplicate key wins.
        let inventory = registry
            .decode::<Inventory>(&[
                0x0A, 0x03, 0x0A, 0x01, b'b', // "b" without a value
                0x0A, 0x02, 0x10, 0x04, // value without a key
                0x0A, 0x05, 0x0A, 0x01, b'b', 0x10, 0x02,
            ])
            .unwrap();
        assert_eq!(inventory.stock.get("b"), Some(&2));
        assert_eq!(inventory.stock.get(""), Some(&4));

        // An entry with an unknown enum value is kept whole.
        let entry = [0x12, 0x04, 0x08, 0x01, 0x10, 0x09];
        let inventory = registry.decode::<Inventory>(&entry).unwrap();
        assert!(inventory.labels.is_empty());
        assert_eq!(inventory.unknown.as_bytes(), entry);
    }

    #[test]
    fn flattens_supertype_fields() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Entity {
            #[proto(number = 1)]
            id: u64,
        }

        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Named {
            #[proto(flatten)]
            base: Entity,
            #[proto(number = 2)]
            name: String,
        }

        let registry = registry(CompilationUnit::new("named.proto").add::<Named>());
        let descriptor = registry.lookup_by_name("Named").unwrap().as_message().unwrap().clone();
        assert_eq!(descriptor.fields().len(), 2);
        assert!(registry.lookup_by_name("Entity").is_none());

        let named = Named {
            base: Entity { id: 5 },
            name: "x".into(),
        };
        let bytes = registry.encode(&named).unwrap();
        assert_eq!(bytes, [0x08, 0x05, 0x12, 0x01, b'x']);
        assert_eq!(registry.decode::<Named>(&bytes).unwrap(), named);
    }

    #[test]
    fn accepts_packed_and_unpacked_input() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Numbers {
            #[proto(number = 1)]
            packed: Vec<i32>,
            #[proto(number = 2, packed = false)]
            plain: Vec<i32>,
        }

        let registry = registry(CompilationUnit::new("numbers.proto").add::<Numbers>());
        let numbers = Numbers {
            packed: vec![1, 2],
            plain: vec![3],
        };
        let bytes = registry.encode(&numbers).unwrap();
        assert_eq!(bytes, [0x0A, 0x02, 0x01, 0x02, 0x10, 0x03]);

        let swapped = registry
            .decode::<Numbers>(&[0x08, 0x01, 0x08, 0x02, 0x12, 0x01, 0x03])
            .unwrap();
        assert_eq!(swapped, numbers);
    }

    #[test]
    fn applies_defaults() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Settings {
            #[proto(number = 1, default = 42)]
            retries: i32,
            #[proto(number = 2, default = "guest")]
            user: String,
            #[proto(number = 3)]
            verbose: Option<bool>,
            #[proto(number = 4, default = "BLUE")]
            color: Color,
        }

        let registry = registry(CompilationUnit::new("settings.proto").add::<Settings>());
        let settings = registry.decode::<Settings>(&[]).unwrap();
        assert_eq!(
            settings,
            Settings {
                retries: 42,
                user: "guest".into(),
                verbose: None,
                color: Color::Blue,
            }
        );
        assert!(registry.encode(&settings).unwrap().is_empty());

        let changed = Settings { retries: 0, ..settings };
        assert_eq!(registry.encode(&changed).unwrap(), [0x08, 0x00]);
    }

    #[test]
    fn rejects_foreign_instances() {
        let registry = people();
        assert!(matches!(
            registry.encode(&5_u8),
            Err(EncodeError::UnknownType(_))
        ));
        assert!(matches!(
            registry.decode_by_name("t.Missing", &[]),
            Err(DecodeError::UnknownType(name)) if name == "t.Missing"
        ));
    }

    #[test]
    fn names_unregistered_nested_types() {
        #[derive(ProtoMessage, Debug, PartialEq)]
        struct Crew {
            #[proto(number = 1)]
            lead: Option<Person>,
        }

        let full = registry(CompilationUnit::new("crew.proto").package("t").add::<Crew>());
        let entry = full.get(TypeId::of::<Crew>()).unwrap();
        let mut partial = ProtoRegistry::new();
        partial
            .register(entry.descriptor().clone(), entry.marshaller().clone())
            .unwrap();

        let crew = Crew {
            lead: Some(Person { id: 1, tags: vec![] }),
        };
        assert_eq!(
            partial.encode(&crew),
            Err(EncodeError::UnknownType("t.Person".into()))
        );
        assert_eq!(
            partial.decode::<Crew>(&[0x0A, 0x02, 0x08, 0x01]),
            Err(DecodeError::UnknownType("t.Person".into()))
        );
    }

    #[derive(ProtoMessage, Debug, Clone, PartialEq)]
    struct Mixed {
        #[proto(number = 1)]
        a: i32,
        #[proto(number = 2, ty = "sint64")]
        b: i64,
        #[proto(number = 3, ty = "fixed32")]
        c: u32,
        #[proto(number = 4)]
        d: f64,
        #[proto(number = 5)]
        e: String,
        #[proto(number = 6)]
        f: Vec<u64>,
        #[proto(number = 7)]
        g: Option<bool>,
        #[proto(number = 8)]
        h: Bytes,
        #[proto(number = 9)]
        i: Vec<Color>,
    }

    fn color() -> impl Strategy<Value = Color> {
        prop_oneof![Just(Color::Red), Just(Color::Green), Just(Color::Blue)]
    }

    proptest! {
        #[test]
        fn round_trips_any_message(
            a in any::<i32>(),
            b in any::<i64>(),
            c in any::<u32>(),
            d in -1.0e9_f64..1.0e9,
            e in ".{0,16}",
            f in prop::collection::vec(any::<u64>(), 0..8),
            g in any::<Option<bool>>(),
            h in prop::collection::vec(any::<u8>(), 0..16),
            i in prop::collection::vec(color(), 0..8),
        ) {
            let registry = registry(CompilationUnit::new("mixed.proto").add::<Mixed>());
            let mixed = Mixed { a, b, c, d, e, f, g, h: Bytes::from(h), i };
            let bytes = registry.encode(&mixed).unwrap();
            prop_assert_eq!(registry.decode::<Mixed>(&bytes).unwrap(), mixed);
        }
    }
}
