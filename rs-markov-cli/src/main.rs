//! `rs-markov` - accumulate character Markov counts from a corpus into a store.
//!
//! One run reads the corpus, normalizes it, counts every context up to
//! `--max-prefix` characters and adds the counts to the tables of `--db`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use rs_markov_core::io::read_corpus;
use rs_markov_core::model::alphabet::normalize;
use rs_markov_core::model::counts::{collect_counts, MaxPrefix};
use rs_markov_core::store::{Backend, CountStore, StoreAddress, StoreSummary, DEFAULT_STORE_URI};
use rs_markov_core::Error;

/// Exit status for configuration errors (corpus, store address, backend).
const EXIT_CONFIG: u8 = 1;
/// Exit status for failures reported by the store itself (clap uses 2).
const EXIT_STORE: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "rs-markov")]
#[command(about = "Accumulate character-level Markov counts into a database", long_about = None)]
#[command(version)]
struct Args {
	/// Path to the UTF-8 corpus file
	#[arg(long)]
	corpus: PathBuf,

	/// Store address: sqlite:///<path> or postgresql://...
	#[arg(long, env = "MARKOV_DB", default_value = DEFAULT_STORE_URI)]
	db: String,

	/// Maximum context length (values above 13 are clamped)
	#[arg(long, default_value_t = 13, allow_negative_numbers = true)]
	max_prefix: i64,
}

/// Runs the whole pipeline and returns the store summary after the merge.
///
/// # Behavior
/// - Clamps `max_prefix`, reads and normalizes the corpus
/// - Counts contexts in a single pass
/// - Opens the store, initializes its schema, then merges the counts
///
/// Schema creation and the merge are two separate transactions.
fn run(args: &Args) -> Result<StoreSummary, Error> {
	let max_prefix = MaxPrefix::new(args.max_prefix);
	if max_prefix.get() as i64 != args.max_prefix {
		info!("Max prefix {} clamped to {}", args.max_prefix, max_prefix.get());
	}

	let raw = read_corpus(&args.corpus)?;
	let text = normalize(&raw);
	info!(
		"Corpus {}: {} characters, {} after normalization",
		args.corpus.display(),
		raw.chars().count(),
		text.len()
	);

	let tables = collect_counts(&text, max_prefix);
	info!(
		"Collected {} context keys and {} unigrams (K = {})",
		tables.contexts().len(),
		tables.unigrams().len(),
		max_prefix.get()
	);

	let address = StoreAddress::parse(&args.db)?;
	info!("Merging into {} store", address.backend_name());
	let mut store = Backend::open(&address)?;
	store.init_schema()?;
	store.merge_counts(tables.contexts(), tables.unigrams())?;

	store.summary()
}

/// Exit status for a fatal error.
fn exit_status(err: &Error) -> u8 {
	if err.is_configuration() {
		EXIT_CONFIG
	} else {
		EXIT_STORE
	}
}

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	match run(&args) {
		Ok(summary) => {
			info!("Store now holds {summary}");
			ExitCode::SUCCESS
		}
		Err(e) => {
			error!("{e}");
			ExitCode::from(exit_status(&e))
		}
	}
}
