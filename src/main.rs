// Copyright (c) 2026  Teddy Wing
//
// This file is part of Reposcope.
//
// Reposcope is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Reposcope is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Reposcope. If not, see <https://www.gnu.org/licenses/>.


use getopts::Options;
use tokio;

use reposcope::config::{self, Settings};

use std::env;
use std::process;


const DEFAULT_CONFIG: &'static str = "reposcope.toml";


#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    ).init();

    let args: Vec<String> = env::args().collect();

    let mut opts = Options::new();
    opts.optopt("c", "config", "settings file (default reposcope.toml)", "FILE");
    opts.optflag("h", "help", "print this help menu");
    opts.optflag("V", "version", "show the program version");

    let opt_matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(exitcode::USAGE);
        },
    };

    if opt_matches.opt_present("h") {
        print_usage(&opts);
        process::exit(exitcode::OK);
    }

    if opt_matches.opt_present("V") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        process::exit(exitcode::OK);
    }

    let config_path = opt_matches.opt_str("c")
        .unwrap_or_else(|| DEFAULT_CONFIG.to_owned());

    let settings = match Settings::from_file(&config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}: {:#}", config_path, anyhow::Error::new(e));

            process::exit(exitcode::CONFIG);
        },
    };

    if let Err(e) = reposcope::run(settings).await {
        eprintln!("error: {:#}", e);

        process::exit(exitcode::SOFTWARE);
    }
}


fn print_usage(opts: &Options) {
    let brief = format!(
        "usage: {} [options]\n\nThe GitHub token may also be given in ${}.",
        env!("CARGO_PKG_NAME"),
        config::TOKEN_VAR,
    );

    print!("{}", opts.usage(&brief));
}
