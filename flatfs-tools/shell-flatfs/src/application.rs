use flatfs::{FileSystem, FlatFSError, ListMode};
use flatfs_tool_lib::{FileStore, ImageFileError, Manager};
use std::fs;
use std::io::{self, BufRead, Write};

/// The command word plus up to four arguments; anything beyond that is dropped.
const MAX_TOKENS: usize = 5;

const PROMPT: &str = "flatfs> ";

/// The interactive command loop. A thin caller: each line is tokenized, dispatched to one
/// engine operation and its outcome printed; every failure keeps the loop running. Only
/// `quit` leaves, and it never flushes the image implicitly.
pub struct Application {
    startup_image: Option<String>,
    quit: bool,
}

impl Application {
    pub fn new(startup_image: Option<String>) -> Self {
        return Self {
            startup_image,
            quit: false,
        };
    }

    pub fn run(&mut self) -> Result<(), ImageFileError> {
        let mut store = FileStore::new();
        let mut manager = Manager::new();
        let mut fs = FileSystem::new(&mut store, &mut manager);

        if let Some(path) = self.startup_image.clone() {
            if fs.open_image(&path).is_err() {
                println!("ERROR: Disk image does not exist.");
            }
        }

        let stdin = io::stdin();

        while !self.quit {
            print!("{}", PROMPT);
            ignore_result!(io::stdout().flush());

            let mut line = String::new();

            match stdin.lock().read_line(&mut line) {
                Ok(0) => break, // end of input
                Ok(_) => (),
                Err(e) => {
                    return Err(ImageFileError::new(&format!(
                        "Failed to read a command. Error: {}",
                        e
                    )))
                }
            }

            let tokens = tokenize(&line);

            if tokens.is_empty() {
                continue;
            }

            self.dispatch(&mut fs, &tokens);
        }

        return Ok(());
    }

    fn dispatch(&mut self, fs: &mut FileSystem<ImageFileError>, tokens: &[&str]) {
        match tokens[0] {
            "createfs" => match tokens.get(1) {
                Some(path) => report(fs.create_new_image(path)),
                None => println!("ERROR: No disk image name specified."),
            },
            "savefs" => report(fs.save_image()),
            "open" => match tokens.get(1) {
                Some(path) => {
                    if fs.open_image(path).is_err() {
                        println!("ERROR: Disk image does not exist.");
                    }
                }
                None => println!("ERROR: No disk image name specified."),
            },
            "close" => report(fs.close_image()),
            "list" => self.list(fs, tokens.get(1).copied()),
            "attrib" => match (tokens.get(1), tokens.get(2)) {
                (Some(token), Some(name)) => report(fs.set_attribute(token, name)),
                (None, _) => println!("ERROR: Attribute not specified."),
                (_, None) => println!("ERROR: Filename not specified."),
            },
            "df" => match fs.free_bytes() {
                Ok(free) => println!("{} bytes free", free),
                Err(e) => report::<()>(Err(e)),
            },
            "insert" => match tokens.get(1) {
                Some(path) => self.insert(fs, path),
                None => println!("ERROR: No filename specified."),
            },
            "retrieve" => match tokens.get(1).copied() {
                Some(name) => {
                    let destination = tokens.get(2).copied().unwrap_or(name);
                    self.retrieve(fs, name, destination);
                }
                None => println!("ERROR: No filename specified."),
            },
            "read" => match (tokens.get(1), tokens.get(2), tokens.get(3)) {
                (Some(name), Some(start), Some(count)) => self.read(fs, name, start, count),
                (None, _, _) => println!("ERROR: No filename specified."),
                (_, None, _) => println!("ERROR: No start byte specified."),
                (_, _, None) => println!("ERROR: No byte count specified."),
            },
            "encrypt" | "decrypt" => match (tokens.get(1), tokens.get(2)) {
                (Some(name), Some(key)) => self.cipher(fs, name, key),
                (None, _) => println!("ERROR: No filename specified."),
                (_, None) => println!("ERROR: No cipher specified."),
            },
            "delete" => match tokens.get(1) {
                Some(name) => report(fs.delete_file(name)),
                None => println!("ERROR: No filename specified."),
            },
            "undel" => match tokens.get(1) {
                Some(name) => report(fs.restore_file(name)),
                None => println!("ERROR: No filename specified."),
            },
            "quit" => self.quit = true,
            _ => (), // unknown commands re-prompt, as ever
        }
    }

    fn list(&self, fs: &FileSystem<ImageFileError>, flag: Option<&str>) {
        let mode = match flag {
            Some("-h") => ListMode::AllNames,
            Some("-a") => ListMode::Attributes,
            _ => ListMode::Visible,
        };

        let records = match fs.list_files(mode) {
            Ok(records) => records,
            Err(e) => return report::<()>(Err(e)),
        };

        if records.is_empty() {
            println!("ERROR: No files found.");
            return;
        }

        for record in records {
            match mode {
                ListMode::Visible => println!(
                    "{:>10} {:>8} B     {}",
                    record.name(),
                    record.file_size(),
                    record.modified_time().format("%a %b %e %H:%M:%S %Y")
                ),
                ListMode::AllNames => println!("{}", record.name()),
                ListMode::Attributes => {
                    println!("{} {:>8}", record.name(), record.attributes().to_u8())
                }
            }
        }
    }

    fn insert(&self, fs: &mut FileSystem<ImageFileError>, path: &str) {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => {
                println!("ERROR: File does not exist.");
                return;
            }
        };

        if !metadata.is_file() {
            println!("ERROR: Not a regular file.");
            return;
        }

        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) => {
                println!("ERROR: Could not read input file. Error: {}", e);
                return;
            }
        };

        println!("Reading {} bytes from {}", contents.len(), path);

        report(fs.insert_file(path, &contents));
    }

    fn retrieve(&self, fs: &FileSystem<ImageFileError>, name: &str, destination: &str) {
        // Nothing is written unless the file resolves; a failed lookup creates no file.
        let contents = match fs.read_file(name) {
            Ok(contents) => contents,
            Err(e) => return report::<()>(Err(e)),
        };

        println!("Writing {} bytes to {}", contents.len(), destination);

        match fs::write(destination, &contents) {
            Ok(_) => (),
            Err(e) => println!("ERROR: Could not open output file {}. Error: {}", destination, e),
        }
    }

    fn read(&self, fs: &FileSystem<ImageFileError>, name: &str, start: &str, count: &str) {
        let start: u64 = match start.parse() {
            Ok(start) => start,
            Err(_) => {
                println!("ERROR: Invalid start byte.");
                return;
            }
        };

        let count: u64 = match count.parse() {
            Ok(count) => count,
            Err(_) => {
                println!("ERROR: Invalid byte count.");
                return;
            }
        };

        match fs.read_file_range(name, start, count) {
            Ok(bytes) => println!("{}", hex::encode(&bytes)),
            Err(e) => report::<()>(Err(e)),
        }
    }

    fn cipher(&self, fs: &mut FileSystem<ImageFileError>, name: &str, key: &str) {
        let key: u8 = match key.parse() {
            Ok(key) => key,
            Err(_) => {
                println!("ERROR: Cipher must be between 0 and 255.");
                return;
            }
        };

        report(fs.apply_cipher(name, key));
    }
}

/// Splits a command line on whitespace, keeping the command word and at most four
/// arguments.
fn tokenize(line: &str) -> Vec<&str> {
    return line.split_whitespace().take(MAX_TOKENS).collect();
}

fn report<T>(result: Result<T, FlatFSError<ImageFileError>>) {
    match result {
        Ok(_) => (),
        Err(FlatFSError::ImageNotOpen) => println!("ERROR: Disk image is not open."),
        Err(e) => println!("ERROR: {}.", e),
    }
}

#[cfg(test)]
mod tests {
    use super::tokenize;

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(tokenize("insert a.txt\n"), vec!["insert", "a.txt"]);
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        assert_eq!(
            tokenize("  read\ta.txt   0  16 \r\n"),
            vec!["read", "a.txt", "0", "16"]
        );
    }

    #[test]
    fn test_tokenize_empty_line() {
        assert!(tokenize("\n").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_caps_token_count() {
        assert_eq!(tokenize("a b c d e f g").len(), 5);
    }
}
