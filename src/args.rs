use crate::config::{Config, SearchBackend};
use crate::identity::CollectionKind;
use crate::results::Refinement;
use crate::search::{QueryKind, SearchQuery};
use crate::store::validate_collection_name;
use std::error::Error;

pub struct ArgParser {
    iter: std::vec::IntoIter<String>,
    command_name: String,
}

impl ArgParser {
    pub fn new(args: Vec<String>, command_name: &str) -> Self {
        Self { iter: args.into_iter(), command_name: command_name.to_string() }
    }

    /// Extract a single tag from -t/--tag flag
    pub fn extract_tag(&mut self) -> Result<String, Box<dyn Error>> {
        match self.iter.next() {
            Some(v) => {
                let tag = crate::tags::normalize_tag(&v);
                if tag.is_empty() {
                    Err(format!("Invalid tag provided to {}", self.command_name).into())
                } else {
                    Ok(tag)
                }
            }
            None => {
                let cmd = &self.command_name;
                Err(format!("Provide a tag after -t/--tag for {cmd}").into())
            }
        }
    }

    /// Extract a string value for a flag
    pub fn extract_value(&mut self, flag: &str) -> Result<String, Box<dyn Error>> {
        self.iter.next().ok_or_else(|| {
            format!("Provide a value after {} for {}", flag, self.command_name).into()
        })
    }

    /// Get next positional argument
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<String> {
        self.iter.next()
    }

    /// Collect remaining args
    pub fn collect_remaining(self) -> Vec<String> {
        self.iter.collect()
    }
}

/// Flags accepted before the command name; they override the environment
/// for one invocation.
#[derive(Default, Debug, PartialEq, Eq)]
pub struct GlobalFlags {
    pub book: Option<String>,
    pub kind: Option<CollectionKind>,
    pub backend: Option<SearchBackend>,
}

impl GlobalFlags {
    pub fn apply(self, config: &mut Config) -> Result<(), Box<dyn Error>> {
        if let Some(book) = self.book {
            validate_collection_name(&book)?;
            config.collection = book;
        }
        if let Some(kind) = self.kind {
            config.kind = kind;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        Ok(())
    }
}

/// Split leading global flags from the command and its arguments.
pub fn parse_global_flags(
    args: Vec<String>,
) -> Result<(GlobalFlags, Vec<String>), Box<dyn Error>> {
    let mut flags = GlobalFlags::default();
    let mut parser = ArgParser::new(args, "daybook");
    while let Some(arg) = parser.next() {
        match arg.as_str() {
            "--book" | "-b" => flags.book = Some(parser.extract_value(&arg)?),
            "--dated" => flags.kind = Some(CollectionKind::Dated),
            "--titled" => flags.kind = Some(CollectionKind::Titled),
            "--grep" => flags.backend = Some(SearchBackend::Grep),
            "--walk" => flags.backend = Some(SearchBackend::Walk),
            "-h" | "--help" => {
                let mut rest = vec!["help".to_string()];
                rest.extend(parser.collect_remaining());
                return Ok((flags, rest));
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown flag: {other}").into());
            }
            _ => {
                let mut rest = vec![arg];
                rest.extend(parser.collect_remaining());
                return Ok((flags, rest));
            }
        }
    }
    Ok((flags, Vec::new()))
}

/// Where a `find` starts from: a query or a hashtag.
#[derive(Debug, PartialEq, Eq)]
pub enum FindStart {
    Query(SearchQuery),
    Tag(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct FindArgs {
    pub start: FindStart,
    pub refinements: Vec<(Refinement, SearchQuery)>,
}

impl FindArgs {
    /// The literal text worth highlighting in the listing, if any.
    pub fn highlight(&self) -> Option<&str> {
        match &self.start {
            FindStart::Tag(tag) => Some(tag),
            FindStart::Query(q) if q.kind == QueryKind::Literal => Some(&q.pattern),
            FindStart::Query(_) => None,
        }
    }
}

/// Parse `find` arguments. `--regex` switches every query of the
/// invocation to regex mode; refinements apply left to right.
pub fn parse_find_args(args: Vec<String>) -> Result<FindArgs, Box<dyn Error>> {
    let mut parser = ArgParser::new(args, "find");
    let mut regex = false;
    let mut tag: Option<String> = None;
    let mut words: Vec<String> = Vec::new();
    let mut refinements: Vec<(Refinement, String)> = Vec::new();

    while let Some(arg) = parser.next() {
        match arg.as_str() {
            "--regex" | "-r" => regex = true,
            "-t" | "--tag" => tag = Some(parser.extract_tag()?),
            flag if flag.starts_with("--") => {
                let refinement = Refinement::parse(&flag[2..])
                    .ok_or_else(|| format!("Unknown flag for find: {flag}"))?;
                refinements.push((refinement, parser.extract_value(flag)?));
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("Unknown flag for find: {flag}").into());
            }
            _ => words.push(arg),
        }
    }

    let query = |pattern: String| {
        if regex { SearchQuery::regex(pattern) } else { SearchQuery::literal(pattern) }
    };
    let start = match (tag, words.is_empty()) {
        (Some(_), false) => {
            return Err("Give either a query or -t <tag> to find, not both".into());
        }
        (Some(tag), true) => FindStart::Tag(tag),
        (None, false) => FindStart::Query(query(words.join(" "))),
        (None, true) => {
            return Err(
                "Usage: daybook find [--regex] <query> [--widen q] [--narrow q] [--exclude q]"
                    .into(),
            );
        }
    };
    let refinements = refinements.into_iter().map(|(r, p)| (r, query(p))).collect();
    Ok(FindArgs { start, refinements })
}
