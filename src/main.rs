use anyhow::{Context, Result, bail};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;

use rvedeck::deck::{DeckOptions, OrientationSource, generate_deck};
use rvedeck::matching::run_assignment;
use rvedeck::runtime;
use rvedeck::store::{
    bank_from_mtex_csv, default_snapshot_path, load_bank, load_hierarchy, mean_subgroup_count,
    save_assignment, save_bank,
};

enum RunMode {
    Deck {
        dir: PathBuf,
        source: OrientationSource,
        out_dir: Option<PathBuf>,
    },
    Assign {
        bank: PathBuf,
        hierarchy: PathBuf,
        snapshot_out: PathBuf,
    },
    Bank {
        csv: PathBuf,
        out: PathBuf,
    },
    Stats {
        bank: PathBuf,
    },
}

fn usage() -> ! {
    eprintln!(
        "usage: rvedeck deck <rve_dir> [--bank <bank.json>] [--resume <assignment.npz>] [--out <dir>]\n       \
         rvedeck assign <bank.json> <hierarchy.json|.stcell> [snapshot_out.npz]\n       \
         rvedeck bank <mtex.csv> <bank_out.json>\n       \
         rvedeck stats <bank.json>"
    );
    std::process::exit(1);
}

fn existing(arg: Option<String>) -> Result<PathBuf> {
    let path = PathBuf::from(arg.unwrap_or_else(|| usage()));
    if !path.exists() {
        bail!("input {:?} does not exist", path);
    }
    Ok(path)
}

fn parse_args() -> Result<RunMode> {
    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| usage());

    match command.as_str() {
        "deck" => {
            let dir = existing(args.next())?;
            let mut source = OrientationSource::Tess;
            let mut out_dir = None;
            while let Some(flag) = args.next() {
                let value = args.next().unwrap_or_else(|| usage());
                // --bank and --resume are exclusive
                let from_tess = matches!(source, OrientationSource::Tess);
                match flag.as_str() {
                    "--bank" if from_tess => source = OrientationSource::Bank(existing(Some(value))?),
                    "--resume" if from_tess => {
                        source = OrientationSource::Snapshot(existing(Some(value))?)
                    }
                    "--out" => out_dir = Some(PathBuf::from(value)),
                    _ => usage(),
                }
            }
            Ok(RunMode::Deck {
                dir,
                source,
                out_dir,
            })
        }
        "assign" => {
            let bank = existing(args.next())?;
            let hierarchy = existing(args.next())?;
            let snapshot_out = if let Some(explicit) = args.next() {
                PathBuf::from(explicit)
            } else if let Ok(from_env) = env::var("RVEDECK_SNAPSHOT_PATH") {
                PathBuf::from(from_env)
            } else {
                default_snapshot_path(&hierarchy)
            };
            Ok(RunMode::Assign {
                bank,
                hierarchy,
                snapshot_out,
            })
        }
        "bank" => {
            let csv = existing(args.next())?;
            let out = PathBuf::from(args.next().unwrap_or_else(|| usage()));
            Ok(RunMode::Bank { csv, out })
        }
        "stats" => Ok(RunMode::Stats {
            bank: existing(args.next())?,
        }),
        _ => usage(),
    }
}

fn main() -> Result<()> {
    runtime::init_logging();
    runtime::configure_thread_pool();

    match parse_args()? {
        RunMode::Deck {
            dir,
            source,
            out_dir,
        } => {
            let opts = DeckOptions {
                source,
                out_dir,
                progress: std::io::stderr().is_terminal(),
            };
            let report = generate_deck(&dir, &opts)?;
            println!("{} grains -> {}", report.grains, report.deck.display());
            if let Some(snapshot) = &report.snapshot {
                println!("assignment snapshot: {}", snapshot.display());
            }
        }
        RunMode::Assign {
            bank,
            hierarchy,
            snapshot_out,
        } => {
            let mut bank = load_bank(&bank)?;
            let target = load_hierarchy(&hierarchy)?;
            let mut rng = runtime::sampling_rng();
            let outcome = run_assignment(&mut bank, &target, &mut *rng)?;

            if let Some(parent) = snapshot_out.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("create dir {}", parent.display()))?;
                }
            }
            save_assignment(&snapshot_out, &outcome.orientations)?;

            for pair in &outcome.matches {
                println!("{} -> {}", pair.target, pair.bank);
            }
            for ext in &outcome.extensions {
                println!(
                    "extended {}/{}: {} -> {} records",
                    ext.group, ext.subgroup, ext.original, ext.extended_to
                );
            }
            println!(
                "{} grains assigned, snapshot at {}",
                outcome.orientations.len(),
                snapshot_out.display()
            );
        }
        RunMode::Bank { csv, out } => {
            let bank = bank_from_mtex_csv(&csv)?;
            save_bank(&out, &bank)?;
            println!("{} groups -> {}", bank.len(), out.display());
        }
        RunMode::Stats { bank } => {
            let bank = load_bank(&bank)?;
            println!("groups: {}", bank.len());
            println!("mean sub-groups per group: {:.3}", mean_subgroup_count(&bank));
        }
    }
    Ok(())
}
