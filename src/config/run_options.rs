use std::{env, path::PathBuf};

use getopts::Options;
use tracing::warn;

use crate::config::CONFIG_FILE;

#[derive(Clone, Debug, Default)]
pub struct Args {
    pub cfg_file: PathBuf,
    pub address: Option<String>,
    pub database: Option<String>,
}

pub fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] [config_file]", program);
    print!("{}", opts.usage(&brief));
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optopt("a", "address", "HTTP listen address", "HOST:PORT");
    opts.optopt("d", "database", "store connection string", "URL");
    opts.optflag("h", "help", "print this help");
    opts
}

pub fn get_args() -> Args {
    let args: Vec<String> = env::args().collect();
    parse_args(&args)
}

pub fn parse_args(args: &[String]) -> Args {
    let program = args.first().cloned().unwrap_or_else(|| "wtr".to_owned());
    let opts = options();

    let default_args = Args { cfg_file: default_cfg_file(), address: None, database: None };
    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(m) => m,
        Err(f) => {
            warn!("Error parsing arguments: {}", f);
            warn!("Proceeding with defaults.");
            print_usage(&program, &opts);
            return default_args;
        }
    };
    if matches.opt_present("h") {
        print_usage(&program, &opts);
        std::process::exit(0);
    }

    let cfg_file = matches.free.first().map(PathBuf::from).unwrap_or(default_args.cfg_file);
    Args { cfg_file, address: matches.opt_str("a"), database: matches.opt_str("d") }
}

pub fn default_cfg_file() -> PathBuf {
    env::current_dir().map(|dir| dir.join(CONFIG_FILE)).unwrap_or_else(|_| PathBuf::from(CONFIG_FILE))
}
