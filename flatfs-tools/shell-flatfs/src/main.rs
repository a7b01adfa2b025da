#[macro_use]
mod macros;
mod application;

use application::Application;
use clap::{App, Arg};
use std::process::exit;

fn main() {
    let arguments = App::new("shell-flatfs")
        .version("0.1.0")
        .about("An interactive shell for flatfs images.")
        .arg(
            Arg::with_name("image")
                .required(false)
                .takes_value(true)
                .help("An image to open before the first prompt"),
        )
        .get_matches();

    let startup_image = arguments.value_of("image").map(String::from);

    let mut application = Application::new(startup_image);

    match application.run() {
        Ok(_) => (),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    }
}
