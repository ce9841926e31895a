mod cli;

use ptee_core::config::ConfigError;
use ptee_core::interrupt;

fn main() {
    if let Err(e) = cli::run() {
        if e.downcast_ref::<interrupt::InterruptedError>().is_some() {
            std::process::exit(130);
        }
        eprintln!("ptee: {e:#}"); // pretty anyhow chain
        if e.downcast_ref::<ConfigError>().is_some() {
            std::process::exit(2);
        }
        std::process::exit(1);
    }
}
