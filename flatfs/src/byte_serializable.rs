/// Fixed-size little-endian serialization of a table record into and out of the image.
pub trait ByteSerializable {
    type BytesArrayType;

    fn to_bytes(&self) -> Self::BytesArrayType;

    /// Deserializes a record, returning None if the bytes are too short or fail validation.
    fn from_bytes(bytes: &[u8]) -> Option<Self>
    where
        Self: core::marker::Sized;

    fn generic_bytes_rep(bytes: &Self::BytesArrayType) -> &[u8];
}
