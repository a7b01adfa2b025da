use crate::error::ImageFileError;
use flatfs::ImageStore;
use std::fs;

/// Backs images with plain files, read and written whole.
pub struct FileStore {}

impl FileStore {
    pub fn new() -> Self {
        return Self {};
    }
}

impl ImageStore<ImageFileError> for FileStore {
    fn read_image(&mut self, name: &str) -> Result<Vec<u8>, ImageFileError> {
        return match fs::read(name) {
            Ok(bytes) => Ok(bytes),
            Err(e) => Err(ImageFileError::new(&format!(
                "Failed to read image file {}. Error: {}",
                name, e
            ))),
        };
    }

    fn write_image(&mut self, name: &str, bytes: &[u8]) -> Result<(), ImageFileError> {
        return match fs::write(name, bytes) {
            Ok(_) => Ok(()),
            Err(e) => Err(ImageFileError::new(&format!(
                "Failed to write image file {}. Error: {}",
                name, e
            ))),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfs::ImageStore;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        let path = path.to_str().unwrap();

        let mut store = FileStore::new();

        store.write_image(path, &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.read_image(path).unwrap(), vec![1, 2, 3, 4]);

        store.write_image(path, &[9, 9]).unwrap();
        assert_eq!(store.read_image(path).unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_read_missing_file() {
        let mut store = FileStore::new();

        assert!(store.read_image("/definitely/not/here.img").is_err());
    }
}
