//! Check service contract descriptions: parse, validate projections, and
//! optionally dump decode plans.
//!
//! Usage:
//!   check_design [OPTIONS] [FILE.svc ...]
//!   check_design < design.svc
//!
//! Options:
//!   --plan, -p   Print decode plans for every valid (method, response) pair
//!
//! If no files are given, reads from stdin. Exit code 1 if any description
//! fails validation.

use std::io::Read;
use std::path::Path;

use svcdsl::dump::plan_to_dump;
use svcdsl::plan::plan_method;
use svcdsl::validate::{validate_design, EndpointRef};
use svcdsl::{parse, ResolvedDesign};
use tracing_subscriber::EnvFilter;

fn check_source(name: &str, source: &str, show_plans: bool) -> anyhow::Result<bool> {
    let design = match parse(source) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}: {}", name, e);
            return Ok(false);
        }
    };
    let resolved = match ResolvedDesign::resolve(design) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}: {}", name, e);
            return Ok(false);
        }
    };
    if let Err(e) = validate_design(&resolved) {
        for line in e.detail.lines() {
            println!("{}: {}", name, line);
        }
        return Ok(false);
    }
    if show_plans {
        for service in &resolved.design.services {
            for method in &service.methods {
                let ep = EndpointRef {
                    service: &service.name,
                    endpoint: &method.name,
                };
                let plans = plan_method(
                    &resolved,
                    ep,
                    &method.result,
                    &method.views,
                    &method.responses,
                );
                for p in &plans {
                    println!("{}", plan_to_dump(p));
                }
            }
        }
    }
    Ok(true)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let show_plans = if let Some(pos) = args.iter().position(|a| a == "--plan" || a == "-p") {
        args.remove(pos);
        true
    } else {
        false
    };

    let mut has_error = false;

    if args.is_empty() {
        let mut src = String::new();
        std::io::stdin().read_to_string(&mut src)?;
        if !check_source("<stdin>", &src, show_plans)? {
            has_error = true;
        }
    } else {
        for path in &args {
            let path = Path::new(path);
            let src = match std::fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    has_error = true;
                    continue;
                }
            };
            if !check_source(&path.display().to_string(), &src, show_plans)? {
                has_error = true;
            }
        }
    }

    if has_error {
        std::process::exit(1);
    }
    Ok(())
}
