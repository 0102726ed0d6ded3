use std::io::Write;
use std::str::FromStr;

use chrono::Local;
use log::LevelFilter;

/// Initializes the global logger.
///
/// `RUST_LOG` takes precedence over `level`. Lines go to stderr so they do not
/// interleave with the device table and prompts on stdout.
pub fn init(level: &str) {
    let level_filter = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Unknown log level {:?}, using info", level);
        LevelFilter::Info
    });

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_filter)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    if let Err(e) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", e);
    }
}
