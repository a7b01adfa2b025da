use flatfs::FlatFSErrorConvertible;
use std::fmt::Formatter;

/// The error type of the std backed store, carrying a human readable message.
#[derive(Debug, PartialEq, Clone)]
pub struct ImageFileError {
    message: String,
}

impl ImageFileError {
    pub fn new(message: &str) -> Self {
        return ImageFileError {
            message: String::from(message),
        };
    }

    pub fn get_message(&self) -> String {
        return self.message.clone();
    }
}

impl FlatFSErrorConvertible for ImageFileError {}

impl std::fmt::Display for ImageFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.message);
    }
}
