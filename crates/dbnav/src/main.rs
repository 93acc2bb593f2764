mod replay;

use log::error;

const USAGE: &str =
    "Usage: dbnav replay <tree.json> <events.json> [--session <dir>] [--config <file>]";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    std::process::exit(run(&args));
}

fn run(args: &[String]) -> i32 {
    if args.get(1).map(|s| s.as_str()) != Some("replay") {
        eprintln!("{}", USAGE);
        return 2;
    }

    let replay_args = match replay::ReplayArgs::parse(&args[2..]) {
        Ok(replay_args) => replay_args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            return 2;
        }
    };

    match replay::run(replay_args) {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            0
        }
        Err(e) => {
            error!("Replay failed: {:#}", e);
            1
        }
    }
}
