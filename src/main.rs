//! Unique Name Resolution CLI
//!
//! Resolves a list of raw user or group names into unique, policy-compliant
//! names, carrying the used-name registry between runs in a snapshot file.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::env;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use unique_names::config::{find_config, read_config_file};
use unique_names::reserved::parse_list;
use unique_names::snapshot::{load_snapshot, save_snapshot, write_mapping};
use unique_names::{Config, NameKind, UniqueNameFinder};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
	Username,
	Group,
}

impl From<Kind> for NameKind {
	fn from(kind: Kind) -> Self {
		match kind {
			Kind::Username => NameKind::Username,
			Kind::Group => NameKind::GroupName,
		}
	}
}

#[derive(Parser, Debug)]
#[command(name = "unique-names")]
#[command(version)]
#[command(about = "Resolve imported user and group names into unique names", long_about = None)]
struct Args {
	/// File with one raw name per line (default: stdin)
	#[arg(value_name = "INPUT")]
	input: Option<PathBuf>,

	/// Namespace the names are resolved for
	#[arg(short, long, value_enum, default_value = "username")]
	kind: Kind,

	/// Configuration file (default: search for unique-names.json upward)
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Do not search for a configuration file
	#[arg(long)]
	no_config: bool,

	/// Reserved names, separated by `|` (e.g. "admin|system*")
	#[arg(long)]
	reserved: Option<String>,

	/// Mention keyword that may not be used as a name
	#[arg(long)]
	here_mention: Option<String>,

	/// Maximum name length in characters
	#[arg(long)]
	max_length: Option<usize>,

	/// Registry snapshot to load before and save after resolving (.gz to compress)
	#[arg(short, long)]
	registry: Option<PathBuf>,

	/// Write the raw→resolved mapping here instead of stdout
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Accept reserved names (usernames only)
	#[arg(long)]
	allow_reserved: bool,

	/// Resolve names without saving the registry snapshot
	#[arg(short = 'n', long)]
	dry_run: bool,

	/// Print detailed progress and statistics
	#[arg(short, long)]
	verbose: bool,
}

fn init_tracing(verbose: bool) {
	let level = if verbose {
		LevelFilter::DEBUG
	} else {
		LevelFilter::WARN
	};

	let filter = EnvFilter::builder()
		.with_default_directive(level.into())
		.from_env_lossy();

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();
}

fn read_input(input: Option<&PathBuf>) -> Result<Vec<String>> {
	let content = match input {
		Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
			.with_context(|| format!("Failed to read {}", path.display()))?,
		_ => {
			let mut content = String::new();
			io::stdin()
				.read_to_string(&mut content)
				.context("Failed to read names from stdin")?;
			content
		}
	};

	Ok(content.lines().map(str::to_string).collect())
}

fn load_config(args: &Args) -> Result<Config> {
	let config_file = if let Some(path) = &args.config {
		Some(read_config_file(path)?)
	} else if args.no_config {
		None
	} else {
		find_config(&env::current_dir()?)
	};

	let mut config = match config_file {
		Some(file) => file.apply(Config::default())?,
		None => Config::default(),
	};

	// Flags override the file
	if let Some(reserved) = &args.reserved {
		config.reserved_names = parse_list(reserved);
	}
	if let Some(here_mention) = &args.here_mention {
		config.here_mention = here_mention.clone();
	}
	if let Some(max_length) = args.max_length {
		config.max_length = max_length;
	}

	Ok(config)
}

fn main() -> Result<()> {
	let args = Args::parse();
	init_tracing(args.verbose);

	let kind = NameKind::from(args.kind);
	if args.allow_reserved && kind == NameKind::GroupName {
		bail!("--allow-reserved only applies to usernames");
	}

	let config = load_config(&args)?;
	let raws = read_input(args.input.as_ref())?;

	let store = match &args.registry {
		Some(path) => load_snapshot(path)?,
		None => unique_names::InMemoryStore::new(),
	};

	let start_time = Instant::now();
	let mut finder = UniqueNameFinder::from_store(config, &store)?;
	let resolved = finder.resolve_batch(kind, &raws, args.allow_reserved);
	let total_time = start_time.elapsed();

	match &args.output {
		Some(path) => {
			let file =
				File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
			write_mapping(file, &raws, &resolved)?;
		}
		None => write_mapping(io::stdout().lock(), &raws, &resolved)?,
	}

	if let Some(path) = &args.registry {
		if !args.dry_run {
			save_snapshot(path, &store)?;
		}
	}

	let stats = finder.stats();
	eprintln!(
		"Resolved {} names ({}), {} suffixed ({:.1}%), {} fallback in {:.2}s",
		stats.resolved,
		kind,
		stats.suffixed,
		stats.suffixed_percent(),
		stats.fallback_used,
		total_time.as_secs_f64()
	);

	if args.verbose {
		let t = &finder.timing;
		eprintln!("\n=== Details ===");
		eprintln!("  unsuffixed:   {:>9}", stats.unsuffixed);
		eprintln!("  truncations:  {:>9}", stats.truncations);
		eprintln!("  probes:       {:>9}", stats.probes);
		eprintln!("  exhausted:    {:>9}", stats.exhausted);
		eprintln!("  unresolved:   {:>9}", stats.unresolved);
		eprintln!("  registry:     {:>9}", finder.registry().len());
		eprintln!("  max length:   {:>9}", finder.config().max_length);
		eprintln!(
			"  reserved:     {:>9} exact, {} wildcard",
			finder.reserved().exact_count(),
			finder.reserved().wildcard_count()
		);
		eprintln!(
			"  sanitize:     {:>7.1}ms",
			t.sanitize.as_secs_f64() * 1000.0
		);
		eprintln!("  resolve:      {:>7.1}ms", t.resolve.as_secs_f64() * 1000.0);
	}

	if stats.unresolved > 0 {
		bail!(
			"{} names could not be resolved uniquely; check the fallback names and reserved patterns",
			stats.unresolved
		);
	}

	Ok(())
}
