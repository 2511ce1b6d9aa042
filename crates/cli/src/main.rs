use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

use projdyn::api;
use projdyn::cfg::{default_workers, DEFAULT_LIFTING_PRIME};
use projdyn::graph::CycleGraph;
use projdyn::preimage::{ClosureCfg, DEFAULT_MAX_ITERATIONS};
use projdyn::reduction::PrimeRange;
use projdyn::space::{parse_point, SelfMap};
use projdyn::{Endomorphism, PeriodicCfg, ProjectivePoint};

mod provenance;

use provenance::{write_sidecar, RunRecord};

#[derive(Parser)]
#[command(name = "projdyn")]
#[command(about = "Rational periodic and preperiodic points of maps of projective space")]
struct Cmd {
    /// Comma-separated coordinate names, e.g. `x,y` or `x,y,z`
    #[arg(long, global = true, default_value = "x,y")]
    vars: String,

    /// One homogeneous form per coordinate, in order
    #[arg(long = "poly", global = true)]
    polys: Vec<String>,

    /// Write the JSON result here (plus FILE.provenance.json) instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Log progress to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    action: Action,
}

#[derive(Args, Clone, Debug, Serialize)]
struct SearchOpts {
    /// Largest prime used to bound the periods
    #[arg(long, default_value_t = 20)]
    primes: u64,
    /// Smallest prime used to bound the periods
    #[arg(long, default_value_t = 1)]
    primes_from: u64,
    /// First prime tried for p-adic lifting
    #[arg(long, default_value_t = DEFAULT_LIFTING_PRIME)]
    lifting_prime: u64,
    /// Primes never used, comma-separated
    #[arg(long, value_delimiter = ',')]
    bad_primes: Vec<u64>,
    /// Known possible periods, comma-separated; skips the bounding step
    #[arg(long, value_delimiter = ',')]
    periods: Option<Vec<usize>>,
    /// Worker threads (default: available parallelism)
    #[arg(long)]
    workers: Option<usize>,
    /// Cap on preimage computations during closure
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
}

impl SearchOpts {
    fn cfg(&self) -> PeriodicCfg {
        PeriodicCfg {
            prime_bound: PrimeRange::new(self.primes_from, self.primes),
            lifting_prime: self.lifting_prime,
            periods: self.periods.clone(),
            bad_primes: self.bad_primes.clone(),
            workers: self.workers.unwrap_or_else(default_workers),
            closure: ClosureCfg {
                max_iterations: self.max_iterations,
            },
        }
    }
}

#[derive(Subcommand)]
enum Action {
    /// Possible minimal periods of rational periodic points
    Periods {
        #[command(flatten)]
        search: SearchOpts,
    },
    /// All rational periodic points
    Periodic {
        #[command(flatten)]
        search: SearchOpts,
    },
    /// All rational preperiodic points
    Preperiodic {
        #[command(flatten)]
        search: SearchOpts,
    },
    /// Orbit graph on the rational preperiodic points
    Graph {
        #[command(flatten)]
        search: SearchOpts,
    },
    /// Rational preimages of one point
    Preimages {
        /// Target point, e.g. `(17 : 15)`
        #[arg(long)]
        point: String,
    },
    /// Multiplier of the n-th iterate at a point
    Multiplier {
        #[arg(long)]
        point: String,
        #[arg(long, default_value_t = 1)]
        n: usize,
        /// Skip the check that the point has period n
        #[arg(long)]
        no_check: bool,
    },
    /// Print build provenance and, if a map is given, a summary of it
    Report,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Periods { .. } => "periods",
            Action::Periodic { .. } => "periodic",
            Action::Preperiodic { .. } => "preperiodic",
            Action::Graph { .. } => "graph",
            Action::Preimages { .. } => "preimages",
            Action::Multiplier { .. } => "multiplier",
            Action::Report => "report",
        }
    }

    fn params(&self) -> Result<Value> {
        Ok(match self {
            Action::Periods { search }
            | Action::Periodic { search }
            | Action::Preperiodic { search }
            | Action::Graph { search } => serde_json::to_value(search)?,
            Action::Preimages { point } => json!({ "point": point }),
            Action::Multiplier { point, n, no_check } => {
                json!({ "point": point, "n": n, "check": !no_check })
            }
            Action::Report => json!({}),
        })
    }
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = match cmd.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = execute(&cmd)?;
    match &cmd.out {
        Some(out) => write_result(out, &cmd, &result)?,
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn var_names(vars: &str) -> Vec<String> {
    vars.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn load_map(cmd: &Cmd) -> Result<Endomorphism> {
    if cmd.polys.is_empty() {
        bail!("no map given: pass one --poly per coordinate");
    }
    let vars = var_names(&cmd.vars);
    let vars: Vec<&str> = vars.iter().map(String::as_str).collect();
    let polys: Vec<&str> = cmd.polys.iter().map(String::as_str).collect();
    Endomorphism::parse(&vars, &polys).context("building the map")
}

fn point_strings(points: &[ProjectivePoint]) -> Vec<String> {
    points.iter().map(ToString::to_string).collect()
}

#[derive(Serialize)]
struct EdgeJson {
    from: String,
    to: String,
}

#[derive(Serialize)]
struct GraphJson {
    vertices: Vec<String>,
    edges: Vec<EdgeJson>,
    cycles: Vec<Vec<String>>,
}

impl From<&CycleGraph<ProjectivePoint>> for GraphJson {
    fn from(g: &CycleGraph<ProjectivePoint>) -> Self {
        Self {
            vertices: point_strings(g.vertices()),
            edges: g
                .edges()
                .map(|(a, b)| EdgeJson {
                    from: a.to_string(),
                    to: b.to_string(),
                })
                .collect(),
            cycles: g
                .cycles()
                .into_iter()
                .map(|c| c.into_iter().map(ToString::to_string).collect())
                .collect(),
        }
    }
}

/// Run the subcommand and return its JSON result.
fn execute(cmd: &Cmd) -> Result<Value> {
    tracing::info!(command = cmd.action.name(), "run");
    let value = match &cmd.action {
        Action::Periods { search } => {
            let f = load_map(cmd)?;
            let cfg = search.cfg();
            let periods =
                api::possible_periods(&f, cfg.prime_bound, &cfg.bad_primes, cfg.workers)?;
            json!({ "map": f.to_string(), "periods": periods })
        }
        Action::Periodic { search } => {
            let f = load_map(cmd)?;
            let points = api::rational_periodic_points(&f, &search.cfg())?;
            json!({ "map": f.to_string(), "count": points.len(), "points": point_strings(&points) })
        }
        Action::Preperiodic { search } => {
            let f = load_map(cmd)?;
            let out = api::preperiodic_closure(&f, &search.cfg())?;
            json!({
                "map": f.to_string(),
                "count": out.points.len(),
                "capped": out.capped,
                "points": point_strings(&out.points),
            })
        }
        Action::Graph { search } => {
            let f = load_map(cmd)?;
            let g = api::rational_preperiodic_graph(&f, &search.cfg())?;
            json!({ "map": f.to_string(), "graph": GraphJson::from(&g) })
        }
        Action::Preimages { point } => {
            let f = load_map(cmd)?;
            let q = parse_point(point)?;
            let pre = api::rational_preimages(&f, &q)?;
            json!({ "map": f.to_string(), "point": q.to_string(), "preimages": point_strings(&pre) })
        }
        Action::Multiplier { point, n, no_check } => {
            let f = load_map(cmd)?;
            let p = parse_point(point)?;
            let m = api::multiplier(&f, &p, *n, !no_check)?;
            let rows: Vec<Vec<String>> = m
                .row_iter()
                .map(|r| r.iter().map(ToString::to_string).collect())
                .collect();
            json!({ "map": f.to_string(), "point": p.to_string(), "n": n, "multiplier": rows })
        }
        Action::Report => {
            let mut obj = json!({
                "version": projdyn::VERSION,
                "code_rev": provenance::current_git_rev(),
            });
            if !cmd.polys.is_empty() {
                let f = load_map(cmd)?;
                let bound = (f.degree() >= 2)
                    .then(|| api::height_bound(&f))
                    .transpose()?;
                obj["map"] = json!({
                    "forms": f.to_string(),
                    "dimension": f.dimension(),
                    "degree": f.degree(),
                    "global_height": f.global_height(),
                    "log_height_bound": bound.map(|b| b.log_bound()),
                    "lifting_precision": bound.map(|b| b.precision_for(DEFAULT_LIFTING_PRIME)),
                });
            }
            obj
        }
    };
    Ok(value)
}

fn write_result(out: &Path, cmd: &Cmd, result: &Value) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(result)?)
        .with_context(|| format!("writing {}", out.display()))?;
    let record = RunRecord {
        command: cmd.action.name().to_string(),
        vars: var_names(&cmd.vars),
        polys: cmd.polys.clone(),
        params: cmd.action.params()?,
    };
    let summary = json!({
        "count": result.get("count"),
        "periods": result.get("periods"),
        "capped": result.get("capped"),
    });
    let sidecar = write_sidecar(out, &record, summary)?;
    tracing::info!(out = %out.display(), sidecar = %sidecar.display(), "wrote result");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cmd {
        let mut full = vec!["projdyn"];
        full.extend_from_slice(args);
        Cmd::try_parse_from(full).unwrap()
    }

    const MAP: [&str; 4] = ["--poly", "x^2 - 29/16*y^2", "--poly", "y^2"];

    fn with_map(args: &[&str]) -> Cmd {
        let mut all: Vec<&str> = args.to_vec();
        all.extend_from_slice(&MAP);
        parse(&all)
    }

    #[test]
    fn periodic_points_as_json() {
        let v = execute(&with_map(&["periodic", "--workers", "1"])).unwrap();
        assert_eq!(v["count"], 4);
        assert_eq!(v["map"], "(16*x^2 - 29*y^2 : 16*y^2)");
        let pts: Vec<String> = serde_json::from_value(v["points"].clone()).unwrap();
        assert!(pts.contains(&"(5/4 : 1)".to_string()));
        assert!(pts.contains(&"(1 : 0)".to_string()));
    }

    #[test]
    fn periods_contain_the_three_cycle() {
        let v = execute(&with_map(&["periods", "--primes", "20", "--workers", "1"])).unwrap();
        let periods: Vec<usize> = serde_json::from_value(v["periods"].clone()).unwrap();
        assert!(periods.contains(&1) && periods.contains(&3));
    }

    #[test]
    fn preimages_subcommand() {
        let cmd = parse(&[
            "preimages",
            "--point",
            "(17 : 15)",
            "--poly",
            "x^2 + y^2",
            "--poly",
            "2*x*y",
        ]);
        let v = execute(&cmd).unwrap();
        assert_eq!(v["preimages"], json!(["(3/5 : 1)", "(5/3 : 1)"]));
    }

    #[test]
    fn multiplier_subcommand() {
        let v = execute(&with_map(&["multiplier", "--point", "5/4 : 1", "--n", "3"])).unwrap();
        assert_eq!(v["multiplier"], json!([["35/8"]]));
        assert!(execute(&with_map(&["multiplier", "--point", "5/4 : 1", "--n", "2"])).is_err());
    }

    #[test]
    fn graph_lists_both_cycles() {
        let v = execute(&with_map(&["graph", "--workers", "1"])).unwrap();
        assert_eq!(v["graph"]["vertices"].as_array().unwrap().len(), 9);
        assert_eq!(v["graph"]["cycles"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn missing_map_is_an_error() {
        let cmd = parse(&["periodic"]);
        assert!(execute(&cmd).is_err());
    }

    #[test]
    fn report_without_a_map() {
        let v = execute(&parse(&["report"])).unwrap();
        assert_eq!(v["version"], projdyn::VERSION);
        assert!(v.get("map").is_none());
    }

    #[test]
    fn out_writes_result_and_sidecar() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("res").join("periodic.json");
        let out_str = out.to_string_lossy().to_string();
        let cmd = with_map(&["periodic", "--workers", "1", "--out", &out_str]);
        let result = execute(&cmd).unwrap();
        write_result(&out, &cmd, &result).unwrap();
        let written: Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(written, result);
        let sidecar = dir.path().join("res").join("periodic.json.provenance.json");
        let prov: Value = serde_json::from_slice(&std::fs::read(sidecar).unwrap()).unwrap();
        assert_eq!(prov["run"]["command"], "periodic");
        assert_eq!(prov["run"]["params"]["workers"], 1);
        assert_eq!(prov["summary"]["count"], 4);
    }
}
