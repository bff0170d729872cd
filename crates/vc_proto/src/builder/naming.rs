use convert_case::{Case, Casing};

use crate::info::VariantInfo;

/// Whether `name` is a valid protobuf identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `name` is a valid dotted package name.
pub fn is_package(name: &str) -> bool {
    name.split('.').all(is_identifier)
}

/// `package.Name`, or `Name` without a package.
pub fn qualify(package: Option<&str>, name: &str) -> String {
    match package {
        Some(package) if !package.is_empty() => format!("{package}.{name}"),
        _ => name.to_owned(),
    }
}

/// The schema name of an enum value: the override, else the variant name
/// in `UPPER_SNAKE_CASE`.
pub fn enum_value_name(variant: &VariantInfo) -> String {
    match variant.proto_name() {
        Some(name) => name.to_owned(),
        None => variant.name().to_case(Case::UpperSnake),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("Person"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("Box<[i32]>"));
        assert!(!is_identifier(""));
        assert!(is_package("org.demo"));
        assert!(!is_package("org..demo"));
    }

    #[test]
    fn qualified_names() {
        assert_eq!(qualify(Some("demo"), "Person"), "demo.Person");
        assert_eq!(qualify(None, "Person"), "Person");
        assert_eq!(qualify(Some(""), "Person"), "Person");
    }

    #[test]
    fn enum_values_are_upper_snake() {
        assert_eq!(enum_value_name(&VariantInfo::new("VeryHigh", 2)), "VERY_HIGH");
        assert_eq!(enum_value_name(&VariantInfo::new("LOW", 0)), "LOW");
        assert_eq!(
            enum_value_name(&VariantInfo::new("Low", 0).with_proto_name("L")),
            "L"
        );
    }
}
