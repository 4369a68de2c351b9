use console::style;
use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

/// Default level for `-v` repetitions: none → warn, one → debug, more → trace
fn default_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialize logger; `RUST_LOG` overrides the verbosity flag
pub fn init_logger(verbosity: u8) {
    let level = default_level(verbosity);
    let env = Env::default().filter_or("RUST_LOG", level.as_str().to_lowercase());

    Builder::from_env(env)
        .format(|buf, record| {
            let tag = match record.level() {
                Level::Error => style("ERROR").red().bold(),
                Level::Warn => style("WARN ").yellow().bold(),
                Level::Info => style("INFO ").green(),
                Level::Debug => style("DEBUG").cyan(),
                Level::Trace => style("TRACE").dim(),
            };
            writeln!(buf, "{} {} {}", tag, style(record.target()).dim(), record.args())
        })
        .init();
}
