use crate::cmd::read_image;
use crate::InspectError;
use fit_image::fit::{dump, FitImage};
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    pub path: PathBuf,
}

/// Print every record of the image, stopping at the first malformed one.
pub fn run(args: Args) -> Result<(), InspectError> {
    let buf = read_image(&args.path)?;
    let image = FitImage::from_buffer(&buf)?;

    let mut out = String::new();
    let result = dump(&image, &mut out);
    print!("{}", out);
    Ok(result?)
}
