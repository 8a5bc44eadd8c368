use anyhow::{Context, Result, bail};
use hilite_config::Config;
use hilite_engine::{Hilite, MarkdownRenderer, MarkerId, PositionMapper, io};
use std::{
    env,
    ops::Range,
    path::{Path, PathBuf},
    process,
};

const USAGE: &str = "\
Usage: hilite-cli <command> <document.md> [args]

Commands:
  render <doc>                      print the document as annotated HTML
  list <doc>                        list stored annotations
  tag <doc> <begin> <end> [tag]     annotate a char range of the rendered text
  untag <doc> <marker-id>           remove an annotation
  retag <doc> <marker-id> <tag>     change the tag of an annotation
  map <doc> <begin> <end>           map a rendered char range back to the markdown source";

/// A document opened with its stored annotations restored.
struct Session {
    source: String,
    spans_path: PathBuf,
    hilite: Hilite,
}

impl Session {
    fn open(document: &Path, config: &Config) -> Result<Self> {
        let source = io::read_document(document)?;
        let spans_path = io::spans_path_for(document, config.annotations_dir.as_deref());

        let tree = MarkdownRenderer::new().to_tree(&source);
        let mut hilite = Hilite::new(tree, config.registry(), config.options());
        if let Some(tag) = &config.default_tag {
            hilite = hilite.with_default_tag(tag.clone());
        }

        if let Some(json) = io::load_spans(&spans_path)? {
            let report = hilite
                .restore_json(&json)
                .with_context(|| format!("Failed to restore {}", spans_path.display()))?;
            for failure in &report.failures {
                eprintln!("Skipped annotation #{}: {}", failure.index, failure.reason);
            }
            log::info!(
                "Restored {} annotations from {} ({} skipped)",
                report.restored,
                spans_path.display(),
                report.skipped
            );
        }

        Ok(Self {
            source,
            spans_path,
            hilite,
        })
    }

    fn save(&self) -> Result<()> {
        io::save_spans(&self.spans_path, &self.hilite.query_all())?;
        log::info!("Saved annotations to {}", self.spans_path.display());
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage_error(None);
    }

    // Missing config falls back to the default palette
    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    if let Err(e) = run(&args[1], Path::new(&args[2]), &args[3..], &config) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: &str, document: &Path, rest: &[String], config: &Config) -> Result<()> {
    let mut session = Session::open(document, config)?;

    match (command, rest) {
        ("render", []) => println!("{}", session.hilite.to_html()),
        ("list", []) => {
            for span in session.hilite.query_all() {
                println!(
                    "{}\t{}\t{}..{}\t{:?}",
                    span.marker_id, span.tag_id, span.begin_index, span.end_index, span.text
                );
            }
        }
        ("tag", [begin, end, tag @ ..]) if tag.len() <= 1 => {
            let range = parse_range(begin, end)?;
            session.hilite.set_selection(Some(range));
            let span = session
                .hilite
                .materialize_selection(tag.first().map(String::as_str))?;
            session.save()?;
            println!("{}\t{:?}", span.marker_id, span.text);
        }
        ("untag", [marker_id]) => {
            let span = session.hilite.remove(&MarkerId::new(marker_id.as_str()))?;
            session.save()?;
            println!("Removed {} {:?}", span.marker_id, span.text);
        }
        ("retag", [marker_id, tag]) => {
            let span = session
                .hilite
                .update(&MarkerId::new(marker_id.as_str()), tag)?;
            session.save()?;
            println!("{}\t{}", span.marker_id, span.tag_id);
        }
        ("map", [begin, end]) => {
            let range = parse_range(begin, end)?;
            let mapper = PositionMapper::new(session.source.clone(), &MarkdownRenderer::new());
            let mapped = mapper.projection_to_source(range)?;
            let snippet: String = mapper
                .source()
                .chars()
                .skip(mapped.start)
                .take(mapped.end - mapped.start)
                .collect();
            let note = if mapped.ambiguous { " (ambiguous)" } else { "" };
            println!("{}..{}\t{snippet:?}{note}", mapped.start, mapped.end);
        }
        _ => usage_error(Some(command)),
    }

    Ok(())
}

fn parse_range(begin: &str, end: &str) -> Result<Range<usize>> {
    let begin: usize = begin
        .parse()
        .with_context(|| format!("Invalid begin offset '{begin}'"))?;
    let end: usize = end
        .parse()
        .with_context(|| format!("Invalid end offset '{end}'"))?;
    if begin >= end {
        bail!("Range {begin}..{end} is empty");
    }
    Ok(begin..end)
}

fn usage_error(command: Option<&str>) -> ! {
    if let Some(command) = command {
        eprintln!("Error: Unrecognised arguments for '{command}'");
    }
    eprintln!("{USAGE}");
    process::exit(1);
}
