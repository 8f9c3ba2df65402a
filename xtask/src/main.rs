// Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use std::path::PathBuf;

mod compose;
mod flash;
mod layout;
mod patch;
mod scan;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Xtask {
    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, relocate, and package every named external application
    ComposeExternalApp {
        /// Directory holding the companion module container (baseband.img)
        src_dir: PathBuf,
        /// Directory holding application.elf; artifacts are written here
        binary_dir: PathBuf,
        /// Path to the toolchain objcopy
        objcopy: PathBuf,
        /// Section-name suffixes of the apps to package
        #[arg(required = true)]
        app_prefixes: Vec<String>,
    },
    /// Rewrite placeholder addresses in a flat binary (relocation only)
    PatchExternalApp {
        input: PathBuf,
        output: PathBuf,
        #[arg(value_parser = maybe_hex::<u32>)]
        search_address: u32,
        #[arg(value_parser = maybe_hex::<u32>)]
        replace_address: u32,
    },
    /// Lay out the firmware regions into one flat flash image
    AssembleFlashImage {
        application_bin: PathBuf,
        baseband_bin: PathBuf,
        output_bin: PathBuf,
    },
    /// Report words that still look like shared-window addresses
    ScanForLeakedAddresses { binary: PathBuf },
    /// Check the declared external-app memory layout
    ValidateAddressLayout {
        /// Linker script to read regions from; defaults to the built-in table
        linker_script: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let cli = Xtask::parse();
    match cli.xtask {
        Commands::ComposeExternalApp {
            src_dir,
            binary_dir,
            objcopy,
            app_prefixes,
        } => compose::compose_external_apps(&src_dir, &binary_dir, &objcopy, &app_prefixes),
        Commands::PatchExternalApp {
            input,
            output,
            search_address,
            replace_address,
        } => patch::patch_external_app(&input, &output, search_address, replace_address),
        Commands::AssembleFlashImage {
            application_bin,
            baseband_bin,
            output_bin,
        } => flash::assemble_flash_image(&application_bin, &baseband_bin, &output_bin),
        Commands::ScanForLeakedAddresses { binary } => scan::scan_for_leaked_addresses(&binary),
        Commands::ValidateAddressLayout { linker_script } => {
            layout::validate_address_layout(linker_script.as_deref())
        }
    }
}
