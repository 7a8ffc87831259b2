use std::path::PathBuf;

use structopt::StructOpt;

use mixweld::{KwargsMixin, Value};

#[derive(StructOpt, Debug)]
#[structopt(name = "mixweld", about = "evaluate a mixin-composed overlay directory")]
struct Opt {
    /// Directory to load as the root overlay scope.
    #[structopt(parse(from_os_str))]
    directory: PathBuf,

    /// Dotted names to evaluate and print, relative to the root scope.
    /// Defaults to every public name directly under the root.
    #[structopt(short = "a", long = "attr")]
    attrs: Vec<String>,

    /// `key=value` pairs injected as kwargs, satisfying unresolved
    /// externs and patch chains with no elected merger.
    #[structopt(short = "s", long = "set")]
    kwargs: Vec<String>,

    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

fn parse_kwargs(pairs: &[String]) -> Vec<(String, Value)> {
    pairs
        .iter()
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_string(), Value::new(value.to_string())))
        })
        .collect()
}

fn describe(value: &Value) -> String {
    if let Some(s) = value.downcast_ref::<String>() {
        return s.clone();
    }
    if let Some(n) = value.downcast_ref::<i64>() {
        return n.to_string();
    }
    if let Some(j) = value.downcast_ref::<serde_json::Value>() {
        return j.to_string();
    }
    format!("{:?}", value)
}

fn main() {
    let opt = Opt::from_args();
    let level = if opt.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    log::debug!("loading overlay directory {:?}", opt.directory);
    let kwargs = KwargsMixin::from_pairs(parse_kwargs(&opt.kwargs));
    let scope = match mixweld::load_directory(&opt.directory, Some(kwargs)) {
        Ok(scope) => scope,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let names = if opt.attrs.is_empty() {
        match scope.public_names() {
            Ok(names) => names.iter().map(|n| n.to_string()).collect(),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        opt.attrs.clone()
    };

    let mut failed = false;
    for name in &names {
        log::trace!("evaluating {}", name);
        match scope.get_path(name) {
            Ok(value) => println!("{} = {}", name, describe(&value)),
            Err(e) => {
                eprintln!("{}: {}", name, e);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
