use std::borrow::Cow;

/// One value of a native enum.
#[derive(Debug, Clone)]
pub struct VariantInfo {
    name: Cow<'static, str>,
    number: i32,
    proto_name: Option<Cow<'static, str>>,
    docs: Option<Cow<'static, str>>,
}

impl VariantInfo {
    #[inline]
    pub fn new(name: impl Into<Cow<'static, str>>, number: i32) -> Self {
        Self {
            name: name.into(),
            number,
            proto_name: None,
            docs: None,
        }
    }

    /// Overrides the schema value name, which otherwise is the variant name
    /// in `UPPER_SNAKE_CASE`.
    #[inline]
    pub fn with_proto_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.proto_name = Some(name.into());
        self
    }

    #[inline]
    pub fn with_docs(mut self, docs: impl Into<Cow<'static, str>>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn number(&self) -> i32 {
        self.number
    }

    #[inline]
    pub fn proto_name(&self) -> Option<&str> {
        self.proto_name.as_deref()
    }

    #[inline]
    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }
}

/// The values of a native enum, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct EnumInfo {
    variants: Vec<VariantInfo>,
}

impl EnumInfo {
    #[inline]
    pub const fn new() -> Self {
        Self {
            variants: Vec::new(),
        }
    }

    #[inline]
    pub fn with_variant(mut self, variant: VariantInfo) -> Self {
        self.variants.push(variant);
        self
    }

    #[inline]
    pub fn variants(&self) -> &[VariantInfo] {
        &self.variants
    }
}
