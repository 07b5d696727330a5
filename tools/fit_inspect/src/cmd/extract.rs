use crate::cmd::read_image;
use crate::InspectError;
use fit_image::fit::FitImage;
use fit_loader::{load_kernel, LzmaCodec, DEFAULT_KERNEL_NODE, DEFAULT_LOAD_SIZE};
use lzma_decode::MAX_PROBABILITY_COUNT;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    pub path: PathBuf,
    /// Image node that holds the kernel
    #[arg(long, default_value = DEFAULT_KERNEL_NODE)]
    pub node: String,
    /// File the extracted kernel is written to
    #[arg(short, long)]
    pub output: PathBuf,
    /// Largest accepted kernel size in bytes
    #[arg(long, default_value_t = DEFAULT_LOAD_SIZE)]
    pub capacity: usize,
}

/// Decompress a kernel image exactly like the loader would and write it to a file.
pub fn run(args: Args) -> Result<(), InspectError> {
    let Args {
        path,
        node,
        output,
        capacity,
    } = args;

    let buf = read_image(&path)?;
    let image = FitImage::from_buffer(&buf)?;

    let mut arena = vec![0u16; MAX_PROBABILITY_COUNT];
    let mut region = vec![0u8; capacity];
    let loaded = load_kernel(&image, &node, &mut LzmaCodec::new(&mut arena), &mut region)?;

    std::fs::write(&output, &region[..loaded.size]).map_err(|e| InspectError::io(&output, e))?;
    println!(
        "{}: {} bytes written to {} (load {:#010x}, entry {:#010x})",
        node,
        loaded.size,
        output.display(),
        loaded.load,
        loaded.entry
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const ITB: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../kernel/fit_loader/tests/data/kernel_lzma.itb"
    );
    const KERNEL_BIN: &[u8] = include_bytes!("../../../../kernel/fit_loader/tests/data/kernel.bin");

    #[test]
    fn extract_writes_the_plain_kernel() {
        let output = std::env::temp_dir().join(format!("fit_inspect_{}.bin", std::process::id()));
        run(Args {
            path: PathBuf::from(ITB),
            node: DEFAULT_KERNEL_NODE.to_string(),
            output: output.clone(),
            capacity: 1 << 20,
        })
        .unwrap();

        let written = std::fs::read(&output).unwrap();
        let _ = std::fs::remove_file(&output);
        assert_eq!(written, KERNEL_BIN);
    }

    #[test]
    fn extract_respects_capacity() {
        let output = std::env::temp_dir().join("fit_inspect_never_written.bin");
        let result = run(Args {
            path: PathBuf::from(ITB),
            node: DEFAULT_KERNEL_NODE.to_string(),
            output: output.clone(),
            capacity: 1024,
        });
        assert!(matches!(result, Err(InspectError::Loader(_))));
        assert!(!output.exists());
    }

    #[test]
    fn missing_files_are_io_errors() {
        let result = run(Args {
            path: PathBuf::from("/nonexistent/image.itb"),
            node: DEFAULT_KERNEL_NODE.to_string(),
            output: PathBuf::from("/nonexistent/out.bin"),
            capacity: 1024,
        });
        assert!(matches!(result, Err(InspectError::Io { .. })));
    }
}
