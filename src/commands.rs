use crate::args::{FindArgs, FindStart, parse_find_args, parse_global_flags};
use crate::config::{Config, LOG_ENV};
use crate::formatting::{FormatContext, Role};
use crate::identity::{NoteIdentity, first_line, parse_identity};
use crate::session::Session;
use crate::shared::table::{Table, terminal_columns};
use crate::store::{Saved, list_collections};
use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use tracing::debug;

const EDIT_DIR: &str = ".edit";
const DEFAULT_WIDTH: usize = 100;

pub(crate) fn run(args: Vec<String>) -> Result<(), Box<dyn Error>> {
    let (flags, mut args) = parse_global_flags(args)?;
    if args.is_empty() {
        print_help();
        return Ok(());
    }
    let cmd = args.remove(0);
    if cmd == "help" {
        print_help();
        return Ok(());
    }

    let mut config = Config::from_env()?;
    flags.apply(&mut config)?;
    debug!(?config, command = %cmd, "running");

    match cmd.as_str() {
        "collections" => return show_collections(&config),
        "path" => {
            println!("{}", config.store_root()?.dir().display());
            return Ok(());
        }
        _ => {}
    }

    let mut session = Session::from_config(&config)?;
    match cmd.as_str() {
        "show" => show_note(args, &session)?,
        "write" => write_note(args, &mut session)?,
        "edit" => edit_note(args, &mut session)?,
        "rm" | "delete" => remove_notes(args, &mut session)?,
        "find" => find_notes(args, &mut session)?,
        "tags" => list_tags(&session)?,
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        "\
Daybook: dated journals and titled notebooks of plain-text notes
Usage:
  daybook [--book <name>] [--dated|--titled] [--grep|--walk] <command>

Commands:
  show [id]                       Print a note (dated default: today)
  write <id> [text...]            Replace a note's text (reads stdin when no text given)
                                  Empty text deletes the note; titled notes follow their first line
  edit <id>                       Edit a note in $EDITOR
  rm <id>...                      Delete notes
  find [--regex] <query> [--widen q] [--narrow q] [--exclude q]...
                                  Search, then refine left to right (or/and/not also accepted)
  find -t <tag> [...]             Search for a hashtag
  tags                            List hashtags used in the collection
  collections                     List collections (* marks the active one)
  path                            Show the collection directory
  help                            Show this message

Ids:
  dated collections               YYYY-MM-DD, today, yesterday, tomorrow
  titled collections              the note title

Environment:
  DAYBOOK_DIR                     Base directory (default: ~/.daybook)
  DAYBOOK_COLLECTION              Active collection (default: Default)
  DAYBOOK_KIND                    dated or titled (default: dated)
  DAYBOOK_SEARCH                  walk or grep (default: walk)
  {LOG_ENV}                     Log filter, e.g. debug (default: warn)
  NO_COLOR                        Disable colored output
"
    );
}

fn identity_arg(
    session: &Session,
    arg: Option<String>,
) -> Result<NoteIdentity, Box<dyn Error>> {
    match arg {
        Some(a) => Ok(parse_identity(session.kind(), &a)?),
        None => Ok(session.kind().default_identity()),
    }
}

fn show_note(args: Vec<String>, session: &Session) -> Result<(), Box<dyn Error>> {
    let identity = identity_arg(session, args.into_iter().next())?;
    let text = session.preview(&identity)?;
    if text.is_empty() {
        println!("No note for {identity}.");
    } else {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn write_note(args: Vec<String>, session: &mut Session) -> Result<(), Box<dyn Error>> {
    let mut args = args.into_iter();
    let id = args.next().ok_or("Usage: daybook write <id> [text...]")?;
    let identity = parse_identity(session.kind(), &id)?;
    let rest: Vec<String> = args.collect();
    let text = if rest.is_empty() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        rest.join(" ")
    };

    session.open(identity.clone())?;
    session.edit(text);
    report_commit(session.commit()?, &identity, session);
    Ok(())
}

fn report_commit(saved: Option<Saved>, requested: &NoteIdentity, session: &Session) {
    match saved {
        Some(Saved::Written(path)) => {
            println!("Saved {} ({})", session.current().identity(), path.display())
        }
        Some(Saved::Removed) => println!("Removed {requested}"),
        None => println!("Unchanged {requested}"),
    }
}

fn edit_note(args: Vec<String>, session: &mut Session) -> Result<(), Box<dyn Error>> {
    let id = args.into_iter().next().ok_or("Usage: daybook edit <id>")?;
    let identity = parse_identity(session.kind(), &id)?;
    session.open(identity.clone())?;

    let scratch_dir = session.store().dir().join(EDIT_DIR);
    fs::create_dir_all(&scratch_dir)?;
    let scratch = scratch_dir.join("scratch.txt");
    fs::write(&scratch, session.current().text())?;

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = Command::new(&editor)
        .arg(&scratch)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;
    if !status.success() {
        return Err(format!(
            "Editor exited with non-zero status; scratch copy left at {}",
            scratch.display()
        )
        .into());
    }

    session.edit(fs::read_to_string(&scratch)?);
    match session.commit() {
        Ok(saved) => {
            fs::remove_file(&scratch)?;
            report_commit(saved, &identity, session);
            Ok(())
        }
        Err(e) => {
            let kept = scratch.display();
            Err(format!("{e}; your edits are kept in {kept}").into())
        }
    }
}

fn remove_notes(args: Vec<String>, session: &mut Session) -> Result<(), Box<dyn Error>> {
    if args.is_empty() {
        return Err("Usage: daybook rm <id>...".into());
    }
    let mut deleted = 0;
    for id in args {
        let identity = parse_identity(session.kind(), &id)?;
        if session.remove(&identity)? {
            println!("Deleted {identity}");
            deleted += 1;
        } else {
            println!("Note {identity} not found");
        }
    }
    if deleted == 0 {
        println!("No notes deleted.");
    }
    Ok(())
}

fn find_notes(args: Vec<String>, session: &mut Session) -> Result<(), Box<dyn Error>> {
    let find = parse_find_args(args)?;
    match &find.start {
        FindStart::Query(query) => session.find(query)?,
        FindStart::Tag(tag) => session.find_hashtag(tag)?,
    };
    for (refinement, query) in &find.refinements {
        session.refine(*refinement, query)?;
    }

    if session.found().is_empty() {
        println!("No matching notes.");
        return Ok(());
    }
    println!("{}", results_table(session, &find));
    Ok(())
}

fn results_table(session: &Session, find: &FindArgs) -> String {
    let ctx = FormatContext::from_env();
    let mut table = Table::new(vec![
        ctx.paint("Note", Role::Header),
        ctx.paint("First line", Role::Header),
    ]);
    for identity in session.found() {
        let line = match session.preview(identity) {
            Ok(text) => first_line(&text).trim().to_string(),
            Err(e) => {
                debug!(%identity, error = %e, "preview failed");
                "(unreadable)".to_string()
            }
        };
        table.push(vec![ctx.identity(identity), line]);
    }
    let columns = terminal_columns().unwrap_or(DEFAULT_WIDTH);
    table.fit_last_column(columns, |line| ctx.highlight(line, find.highlight()));
    table.render()
}

fn list_tags(session: &Session) -> Result<(), Box<dyn Error>> {
    let tags = session.hashtags();
    if tags.is_empty() {
        println!("No tags found.");
        return Ok(());
    }
    let ctx = FormatContext::from_env();
    for tag in tags {
        println!("{}", ctx.tag(&tag));
    }
    Ok(())
}

fn show_collections(config: &Config) -> Result<(), Box<dyn Error>> {
    let names = list_collections(&config.base_dir)?;
    if names.is_empty() {
        println!("No collections yet. Try `daybook write today \"text\"`.");
        return Ok(());
    }
    for name in names {
        let marker = if name == config.collection { "*" } else { " " };
        println!("{marker} {name}");
    }
    Ok(())
}
