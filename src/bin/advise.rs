use std::env;
use std::fs::File;
use std::io::BufReader;
use std::process;

use idxsched::advisor::{recommend, Strategy};
use idxsched::parse::read_cost_table;

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("advise: {err}");
            Options::print_help();
            process::exit(2);
        }
    };

    let file = match File::open(&options.path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("advise: cannot open `{}`: {err}", options.path);
            process::exit(1);
        }
    };

    let mut model = match read_cost_table(BufReader::new(file)) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("advise: {err}");
            process::exit(1);
        }
    };

    let path = match recommend(&mut model, options.strategy) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("advise: {err}");
            process::exit(1);
        }
    };

    println!(
        "{:<10}  {:<24}  {:>12}  {:>12}  {:>12}",
        "query", "configuration", "transition", "query_cost", "cumulative"
    );
    for entry in &path.entries {
        let label = match entry.query {
            Some(pos) => model.queries()[pos].name.clone(),
            None => "-".to_string(),
        };
        println!(
            "{:<10}  {:<24}  {:>12.2}  {:>12.2}  {:>12.2}",
            label,
            model.config_label(entry.config),
            entry.transition_cost,
            entry.query_cost,
            entry.cost_until
        );
    }
    if path.is_feasible() {
        println!("total cost: {:.2}", path.total_cost());
    } else {
        println!("no feasible schedule for this lattice");
        process::exit(1);
    }
}

struct Options {
    path: String,
    strategy: Strategy,
}

impl Options {
    fn parse<I, T>(args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut path = None;
        let mut strategy = Strategy::Greedy;

        let mut args = args.map(Into::into);
        while let Some(arg) = args.next() {
            if arg == "--help" || arg == "-h" {
                Options::print_help();
                process::exit(0);
            } else if let Some(value) = arg.strip_prefix("--strategy=") {
                strategy = strategy_from_str(value)?;
            } else if arg == "--strategy" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --strategy".to_string())?;
                strategy = strategy_from_str(&value)?;
            } else if arg.starts_with('-') {
                return Err(format!("unrecognized argument '{arg}'"));
            } else if path.is_some() {
                return Err("more than one input file given".to_string());
            } else {
                path = Some(arg);
            }
        }

        let path = path.ok_or_else(|| "missing input file".to_string())?;
        Ok(Self { path, strategy })
    }

    fn print_help() {
        println!(
            "\
Usage: advise [options] <cost-table-file>

Options:
  --strategy <exhaustive|greedy|partitioned>   Scheduling strategy (default: greedy)
  -h, --help                                   Print this help message

Examples:
  advise workload.txt
  advise --strategy exhaustive workload.txt
"
        );
    }
}

fn strategy_from_str(value: &str) -> Result<Strategy, String> {
    match value {
        "exhaustive" => Ok(Strategy::Exhaustive),
        "greedy" => Ok(Strategy::Greedy),
        "partitioned" => Ok(Strategy::Partitioned),
        other => Err(format!("unknown strategy '{other}'")),
    }
}
