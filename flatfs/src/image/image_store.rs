use crate::FlatFSErrorConvertible;
use alloc::vec::Vec;

/// Implementors supply the backing file for an image. Transfers always move the entire
/// image at once; there is no partial read or write.
pub trait ImageStore<E: FlatFSErrorConvertible> {
    /// Reads the full contents of the named backing file.
    fn read_image(&mut self, name: &str) -> Result<Vec<u8>, E>;

    /// Replaces the named backing file with `bytes`.
    fn write_image(&mut self, name: &str, bytes: &[u8]) -> Result<(), E>;
}
