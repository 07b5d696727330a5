use crate::cmd::read_image;
use crate::InspectError;
use fit_image::fit::{FitImage, Token};
use fit_loader::{KernelImage, DEFAULT_KERNEL_NODE};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    pub path: PathBuf,
    /// Image node that holds the kernel
    #[arg(long, default_value = DEFAULT_KERNEL_NODE)]
    pub node: String,
}

/// Print header fields, image nodes and the kernel description.
pub fn run(args: Args) -> Result<(), InspectError> {
    let Args { path, node } = args;

    let buf = read_image(&path)?;
    let image = FitImage::from_buffer(&buf)?;
    println!("path: {}", path.display());
    print!("{}", render(&image, &node)?);
    Ok(())
}

fn render(image: &FitImage<'_>, node: &str) -> Result<String, InspectError> {
    let mut out = String::new();
    let header = &image.header;
    // writing into a String never fails
    let _ = writeln!(out, "total_size: {}", header.total_size);
    let _ = writeln!(out, "version: {:#x}", header.version);
    let _ = writeln!(out, "last_comp_version: {:#x}", header.last_comp_version);
    if let Some(description) = image
        .find_property("", "description")
        .ok()
        .and_then(|value| <&str>::try_from(value).ok())
    {
        let _ = writeln!(out, "description: {}", description);
    }

    let _ = writeln!(out, "nodes:");
    let mut depth = 0usize;
    for record in image.records() {
        match record {
            Ok(record) => match record.token {
                Token::BeginNode { name } => {
                    if depth > 0 {
                        let _ = writeln!(
                            out,
                            "{:indent$}{}",
                            "",
                            name.to_string_lossy(),
                            indent = depth * 2
                        );
                    }
                    depth += 1;
                }
                Token::EndNode => depth = depth.saturating_sub(1),
                _ => {}
            },
            Err(e) => {
                log::warn!("node listing stopped early: {}", e);
                break;
            }
        }
    }

    let kernel = KernelImage::from_node(image, node)?;
    let _ = writeln!(out, "{}:", node);
    if let Some(description) = kernel.description {
        let _ = writeln!(out, "  description: {}", description);
    }
    let _ = writeln!(out, "  compression: {}", kernel.compression.name());
    let _ = writeln!(out, "  data_size: {}", kernel.data.len());
    let _ = writeln!(out, "  load: {:#010x}", kernel.load);
    let _ = writeln!(out, "  entry: {:#010x}", kernel.entry);
    Ok(out)
}
