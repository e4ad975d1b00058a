use std::{io, path::PathBuf, process::ExitCode};

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ugoira::{
    api::{
        illust::IllustrationId,
        login::{Session, SessionAuthenticator},
    },
    config::{ClientConfig, Endpoints},
    pipeline::{Pipeline, Target},
    ugoira::assemble::DEFAULT_SPEED,
};

const HELP: &str = "\
ugoira - download a pixiv animation as a gif

USAGE:
  ugoira [OPTIONS] <ILLUST_ID> [OUTPUT]

OPTIONS:
  -u, --id <PIXIV_ID>         pixiv id to log in with       [env: PIXIV_ID]
  -p, --password <PASSWORD>   password to log in with       [env: PIXIV_PASSWORD]
      --cookie <COOKIE>       session cookie header to reuse [env: PIXIV_COOKIE]
  -s, --speed <FACTOR>        playback speed factor          [default: 1.0]
      --zip                   keep the frame archive instead of a gif
  -h, --help                  print this help
";

struct Args {
    id: IllustrationId,
    output: Option<PathBuf>,
    pixiv_id: Option<String>,
    password: Option<String>,
    cookie: Option<String>,
    speed: f64,
    zip: bool,
}

fn parse_args() -> Result<Option<Args>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let parsed = Args {
        pixiv_id: args
            .opt_value_from_str(["-u", "--id"])?
            .or_else(|| std::env::var("PIXIV_ID").ok()),
        password: args
            .opt_value_from_str(["-p", "--password"])?
            .or_else(|| std::env::var("PIXIV_PASSWORD").ok()),
        cookie: args
            .opt_value_from_str("--cookie")?
            .or_else(|| std::env::var("PIXIV_COOKIE").ok()),
        speed: args
            .opt_value_from_str(["-s", "--speed"])?
            .unwrap_or(DEFAULT_SPEED),
        zip: args.contains("--zip"),
        id: IllustrationId(args.free_from_str()?),
        output: args.opt_free_from_str()?,
    };

    let rest = args.finish();
    if !rest.is_empty() {
        eprintln!("Warning: unused arguments {:?}", rest);
    }
    Ok(Some(parsed))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{}", HELP);
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("Error: {}\n\n{}", err, HELP);
            return ExitCode::FAILURE;
        }
    };

    init_tracing();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> ugoira::Result<()> {
    let agent = ClientConfig::default().build_agent();
    let endpoints = Endpoints::default();

    let session = match (&args.pixiv_id, &args.password, &args.cookie) {
        (Some(id), Some(password), _) => {
            Some(SessionAuthenticator::new(&agent, &endpoints).login(id, password)?)
        }
        (_, _, Some(cookie)) => Some(Session::from_cookie_header(cookie)),
        _ => None,
    };

    let target = if args.zip {
        Target::Zip {
            path: args
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{}.zip", args.id))),
        }
    } else {
        Target::Gif {
            path: args
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{}.gif", args.id))),
            speed: args.speed,
        }
    };

    info!(id = %args.id, ?target, authenticated = session.is_some(), "Starting");
    Pipeline::new(&agent, &endpoints).run(args.id, &target, session.as_ref())
}
