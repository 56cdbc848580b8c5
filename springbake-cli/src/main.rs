use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use springbake_core::export::JsonTableWriter;
use springbake_core::job::{self, schema::Job};
use springbake_core::presets::{JsonPresetStore, PresetKey, PresetRecord, PresetStore, PresetStoreConfig};
use springbake_core::rig::{mirror, ControllerId};
use springbake_core::secondary::{BakeRunner, PreviewRunner};
use springbake_core::VERSION;

#[derive(Parser, Debug)]
#[command(name = "springbake", version = VERSION, about = "Rotational spring bake for controller chains")]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Preset file, or directory holding the default preset file.
    #[arg(long, global = true)]
    presets: Option<PathBuf>,
    /// Environment variable naming a root that a relative --presets path is joined onto.
    #[arg(long, global = true)]
    presets_root_env: Option<String>,
    /// Allow edits to the preset file.
    #[arg(long, global = true)]
    writable: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and inspect a job YAML
    Inspect { path: PathBuf },
    /// Simulate the whole chain and write the orientation table
    Bake {
        path: PathBuf,
        #[arg(long, default_value = "bake.json")]
        out: PathBuf,
        /// Take spring settings from `character/body_part`
        #[arg(long)]
        preset: Option<PresetKey>,
    },
    /// Tick a live preview of the root controller through the job's range
    Preview {
        path: PathBuf,
        #[arg(long)]
        preset: Option<PresetKey>,
    },
    /// Print the opposite-side chain for a job's controllers
    Mirror {
        path: PathBuf,
        /// File listing the controllers present in the scene, one per line
        #[arg(long)]
        scene: Option<PathBuf>,
    },
    /// Manage the shared preset file
    Presets {
        #[command(subcommand)]
        cmd: PresetCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PresetCommand {
    /// Create an empty preset file if none exists
    Init,
    /// List presets, optionally for one character
    List { character: Option<String> },
    Show { key: PresetKey },
    /// Store a job's spring settings as a preset
    Save {
        key: PresetKey,
        #[arg(long)]
        job: PathBuf,
        #[arg(long, default_value = "0,0,0", value_delimiter = ',', allow_negative_numbers = true)]
        locator_offset: Vec<f64>,
        #[arg(long, default_value_t = 1.0)]
        locator_scale: f64,
        #[arg(long)]
        overwrite: bool,
    },
    /// Remove a preset, or a whole character when only a name is given
    Remove { target: String },
    Rename { from: PresetKey, to: PresetKey },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn open_store(cli: &Cli) -> Result<JsonPresetStore> {
    let Some(path) = cli.presets.as_deref() else {
        bail!("no preset file given, pass --presets");
    };
    let root = match &cli.presets_root_env {
        Some(var) => std::env::var_os(var).map(PathBuf::from),
        None => None,
    };
    let config = if path.extension().is_some_and(|e| e == "json") {
        let dir = path.parent().unwrap_or(path);
        let file = path.file_name().and_then(|f| f.to_str());
        PresetStoreConfig::resolve(root.as_deref(), dir, file, cli.writable)
    } else {
        PresetStoreConfig::resolve(root.as_deref(), path, None, cli.writable)
    };
    Ok(JsonPresetStore::open(config))
}

fn load_job(cli: &Cli, path: &Path, preset: Option<&PresetKey>) -> Result<Job> {
    let mut job = job::load_from_path(path)?;
    if let Some(key) = preset {
        let record = open_store(cli)?.load(key)?;
        job.apply_preset(&record).with_context(|| format!("apply preset {key}"))?;
        info!("using preset {key}");
    }
    Ok(job)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.cmd {
        Command::Inspect { path } => {
            let job = job::load_from_path(path)?;
            let p = &job.params;
            println!("Loaded job: {}", job.name);
            println!("  frames: {}..={} (step {})", job.range.start(), job.range.end(), p.frame_step);
            println!("  spring: k={:.2}, d={:.2}, m={:.2}, axes={}", p.stiffness, p.damping, p.mass, p.enabled_axes);
            println!("  decay: {:.2}", job.decay);
            for (i, node) in job.build_chain()?.nodes().iter().enumerate() {
                let k = node.params.map_or(p.stiffness, |np| np.stiffness);
                println!("  [{}] {} rest={:?} k={:.2}", i, node.id.short_name(), <[f64; 3]>::from(node.rest), k);
            }
        }
        Command::Bake { path, out, preset } => {
            let job = load_job(&cli, path, preset.as_ref())?;
            let mut chain = job.build_chain()?;
            let goal = job.goal();
            let mut writer = JsonTableWriter::new(out);
            let table = BakeRunner::new(job.params)
                .bake_and_commit(&mut chain, job.range, goal.as_ref(), &mut writer)
                .with_context(|| format!("bake {}", job.name))?;
            println!("Baked {} frames to {}", table.frame_count(), writer.path().display());
            for id in table.controllers() {
                println!("  {id}");
            }
        }
        Command::Preview { path, preset } => {
            let job = load_job(&cli, path, preset.as_ref())?;
            let chain = job.build_chain()?;
            let goal = job.goal();
            let mut preview = PreviewRunner::new();
            preview.arm(&chain, job.params, job.range)?;
            let root = chain.root().map(|n| n.id.to_string()).unwrap_or_default();
            for frame in job.range.frames(job.params.frame_step) {
                let o = preview.tick(frame, goal.as_ref())?;
                println!("{frame:>6} {root} [{:9.3} {:9.3} {:9.3}]", o.0.x, o.0.y, o.0.z);
            }
        }
        Command::Mirror { path, scene } => {
            let job = job::load_from_path(path)?;
            let ids: Vec<ControllerId> = job.build_chain()?.ids().cloned().collect();
            let opposite = match scene {
                Some(scene) => {
                    let data = std::fs::read_to_string(scene)
                        .with_context(|| format!("read scene list {}", scene.display()))?;
                    let present: HashSet<ControllerId> =
                        data.lines().map(str::trim).filter(|l| !l.is_empty()).map(ControllerId::from).collect();
                    mirror::opposite_chain(&ids, |c| present.contains(c))
                }
                None => mirror::opposite_chain(&ids, |_| true),
            };
            if opposite.len() < ids.len() {
                warn!("{} of {} controllers have no opposite", ids.len() - opposite.len(), ids.len());
            }
            for id in opposite {
                println!("{id}");
            }
        }
        Command::Presets { cmd } => run_presets(&cli, cmd)?,
    }
    Ok(())
}

fn run_presets(cli: &Cli, cmd: &PresetCommand) -> Result<()> {
    let mut store = open_store(cli)?;
    match cmd {
        PresetCommand::Init => {
            store.create_if_missing()?;
            println!("{}", store.path().display());
        }
        PresetCommand::List { character } => {
            for key in store.list()? {
                if character.as_ref().map_or(true, |c| c == &key.character) {
                    println!("{key}");
                }
            }
        }
        PresetCommand::Show { key } => {
            let record = store.load(key)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        PresetCommand::Save { key, job: job_path, locator_offset, locator_scale, overwrite } => {
            if !(locator_scale.is_finite() && *locator_scale > 0.0) {
                bail!("--locator-scale must be positive, got {locator_scale}");
            }
            let job = job::load_from_path(job_path)?;
            job.validate().with_context(|| format!("job {}", job_path.display()))?;
            let Ok(locator_offset) = <[f64; 3]>::try_from(locator_offset.as_slice()) else {
                bail!("--locator-offset takes three values, got {}", locator_offset.len());
            };
            let record = PresetRecord {
                params: job.params,
                decay: job.decay,
                locator_offset,
                locator_scale: *locator_scale,
                ..Default::default()
            };
            if *overwrite { store.overwrite(key, &record)?; } else { store.save(key, &record)?; }
            println!("Saved {key} to {}", store.path().display());
        }
        PresetCommand::Remove { target } => {
            match target.parse::<PresetKey>() {
                Ok(key) => store.remove(&key)?,
                Err(_) => store.remove_character(target)?,
            }
            println!("Removed {target}");
        }
        PresetCommand::Rename { from, to } => {
            store.rename(from, to)?;
            println!("Renamed {from} to {to}");
        }
    }
    Ok(())
}
