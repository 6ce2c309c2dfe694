use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

#[derive(Args, Debug)]
pub struct ManArgs {
    /// Output directory (default: dist/share/man/man1)
    #[arg(long = "out-dir", default_value = "dist/share/man/man1")]
    pub out_dir: PathBuf,
}

fn write_page(cmd: clap::Command, path: &Path) -> Result<(), String> {
    let mut buffer: Vec<u8> = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut buffer)
        .map_err(|e| format!("render {}: {e}", path.display()))?;
    fs::write(path, buffer).map_err(|e| format!("{}: {e}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

/// One page for `jiggle`, plus `jiggle-<subcommand>.1` for each subcommand.
pub fn cmd_man(args: ManArgs) -> Result<(), String> {
    let out_dir = crate::output_dir(&args.out_dir)?;
    let cmd = jiggle::command();
    let bin = cmd.get_name().to_string();

    for sub in cmd.get_subcommands() {
        let page = out_dir.join(format!("{bin}-{}.1", sub.get_name()));
        write_page(sub.clone(), &page)?;
    }
    write_page(cmd, &out_dir.join(format!("{bin}.1")))
}
