use clap::{App, Arg};
use flatfs::layout::IMAGE_SIZE;
use flatfs::FileSystem;
use flatfs_tool_lib::{u64_to_sized_string, FileStore, Manager};
use std::process::exit;

fn main() {
    let arguments = App::new("mkimage-flatfs")
        .version("0.1.0")
        .about("This program creates an empty flatfs image.")
        .arg(
            Arg::with_name("path")
                .required(true)
                .takes_value(true)
                .help("The path of the image to create"),
        )
        .get_matches();

    let path = match arguments.value_of("path") {
        Some(p) => p,
        None => {
            eprintln!("An image path is required.");
            exit(1);
        }
    };

    let mut store = FileStore::new();
    let mut manager = Manager::new();

    let mut fs = FileSystem::new(&mut store, &mut manager);

    match fs.create_new_image(path) {
        Ok(_) => println!(
            "Created a {} flatfs image at {}",
            u64_to_sized_string(IMAGE_SIZE as u64),
            path
        ),
        Err(e) => {
            eprintln!("Failed to create the image: {}", e);
            exit(1);
        }
    }
}
