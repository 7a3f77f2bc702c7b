use cgpu_power::write_report;
use env_logger::Env;
use std::io;
use std::process::exit;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let stdout = io::stdout();
    if let Err(e) = write_report(&mut stdout.lock()) {
        log::debug!("{:?}", e);
        eprintln!("{}", e);
        exit(1);
    }
}
