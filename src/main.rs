//! eglboot - bring up an EGL display and report what was negotiated
//!
//! Loads display settings, opens a context on the configured platform,
//! presents a few frames and disposes it again.

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

use eglboot::{DisplaySettings, PlatformKind};

/// Frames presented when --frames is not given
const DEFAULT_FRAMES: u32 = 60;

fn print_help() {
    println!("eglboot {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("    eglboot [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>    Settings file (default: search EGLBOOT_CONFIG,");
    println!("                           ~/.config/eglboot/config.toml, /etc/eglboot/config.toml)");
    println!("    -n, --frames <N>       Frames to present before exiting (default: {})", DEFAULT_FRAMES);
    println!("        --elevated         Process was launched with elevated privileges (Orbis)");
    println!("        --print-config     Print the effective settings as TOML and exit");
    println!("    -h, --help             Show this help");
    println!("    -V, --version          Show version");
}

/// Value following `short`/`long` on the command line
fn arg_value<'a>(args: &'a [String], short: &str, long: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == short || a == long)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("eglboot {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = match arg_value(&args, "-c", "--config") {
        Some(path) => DisplaySettings::load_from_file(Path::new(path))?,
        None => DisplaySettings::load(),
    };

    if args.iter().any(|a| a == "--print-config") {
        print!("{}", toml::to_string_pretty(&settings)?);
        return Ok(());
    }

    let frames: u32 = match arg_value(&args, "-n", "--frames") {
        Some(n) => n
            .parse()
            .with_context(|| format!("Invalid frame count: {}", n))?,
        None => DEFAULT_FRAMES,
    };
    let elevated = args.iter().any(|a| a == "--elevated");
    if settings.platform == PlatformKind::Orbis && settings.force_shader_compiler && !elevated {
        warn!("force_shader_compiler needs --elevated; the shader compiler stays disabled");
    }

    let display = eglboot::open(&settings, elevated).context("Failed to open display")?;
    let (major, minor) = display.egl_version();
    info!(
        "Display ready: {}x{} EGL {}.{}",
        display.width(),
        display.height(),
        major,
        minor
    );

    for frame in 0..frames {
        display
            .swap_buffers()
            .with_context(|| format!("Swap failed at frame {}", frame))?;
    }

    println!(
        "[OK] {}x{} EGL {}.{}, {} frames, shader compiler: {}",
        display.width(),
        display.height(),
        major,
        minor,
        frames,
        if display.capabilities().shader_compiler {
            "available"
        } else {
            "unavailable"
        }
    );

    display.dispose();
    Ok(())
}
