//! Binary file parts.

use bytes::Bytes;

use super::{CodecError, SerializerProfile, TypeShape, WireKind, WireType, WireValue};

/// Binary content with its file name, content type and length.
///
/// Used both as a multipart upload argument and as an operation result.
/// The content is owned by the part and released when the part is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub length: Option<u64>,
    pub content: Bytes,
}

impl FilePart {
    pub fn new(content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            file_name: None,
            content_type: None,
            length: Some(content.len() as u64),
            content,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }
}

impl WireType for FilePart {
    fn shape() -> TypeShape {
        TypeShape::of::<Self>(WireKind::File)
    }

    fn to_wire(self, _profile: &SerializerProfile) -> Result<WireValue, CodecError> {
        Ok(WireValue::File(self))
    }

    fn from_wire(value: WireValue, _profile: &SerializerProfile) -> Result<Self, CodecError> {
        match value {
            WireValue::File(part) => Ok(part),
            _ => Err(CodecError::UnexpectedWire { expected: "file" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_records_length() {
        let part = FilePart::new(&b"abc"[..])
            .with_file_name("a.txt")
            .with_content_type("text/plain");
        assert_eq!(part.length, Some(3));
        assert_eq!(part.file_name.as_deref(), Some("a.txt"));
        assert_eq!(part.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_text_is_not_a_file() {
        let err = FilePart::from_wire(WireValue::Text("x".into()), &SerializerProfile::web());
        assert!(matches!(err, Err(CodecError::UnexpectedWire { expected: "file" })));
    }
}
