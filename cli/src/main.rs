use std::fs::File;
use std::io::{self, BufReader};

use clap::Parser;

use lognum::{run_generate, run_solve, Cli, Command};

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut stdout = io::stdout();

    let code = match cli.command {
        Command::Generate { n, seed, weights } => {
            run_generate(n, seed, weights.into(), &mut stdout)
        }
        Command::Solve { file, max_steps } => match File::open(&file) {
            Ok(f) => run_solve(BufReader::new(f), max_steps, &mut stdout),
            Err(e) => {
                eprintln!("error: could not open `{}`: {e}", file.display());
                2
            }
        },
    };

    std::process::exit(code);
}
