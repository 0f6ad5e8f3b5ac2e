// File: ./src/cli.rs
//! Command-line front end: argument parsing, logging setup and command dispatch.
use crate::admin::{AdminDashboard, AdminPanel};
use crate::client::ApiClient;
use crate::config::Config;
use crate::context::{AppContext, SharedContext, StandardContext};
use crate::filter::TypeFilter;
use crate::model::{Event, EventDraft, EventType, GalleryImage, Officer, Resource};
use crate::session::{RouteGate, SessionManager};
use crate::site::{EventsPage, GalleryView, HomeView, PeopleDirectory};
use crate::storage::LocalStorage;
use crate::theme::ThemeManager;
use crate::time_utils;
use anyhow::{Result, anyhow, bail};
use chrono::{Datelike, Months, NaiveDate};
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Events,
    Officers,
    Gallery,
}

impl ResourceKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "events" | "event" => Some(Self::Events),
            "officers" | "officer" | "people" => Some(Self::Officers),
            "gallery" | "image" => Some(Self::Gallery),
            _ => None,
        }
    }
}

/// Event fields given on the command line; unset fields keep the form's value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub event_type: Option<EventType>,
}

impl EventFields {
    pub fn apply(&self, draft: &mut EventDraft) {
        if let Some(v) = &self.title {
            draft.title = v.clone();
        }
        if let Some(v) = &self.description {
            draft.description = v.clone();
        }
        if let Some(v) = &self.date {
            draft.date = v.clone();
        }
        if let Some(v) = &self.time {
            draft.time = v.clone();
        }
        if let Some(v) = &self.location {
            draft.location = v.clone();
        }
        if let Some(v) = self.event_type {
            draft.event_type = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Events {
        list: bool,
        date: Option<NaiveDate>,
        only: Option<Vec<EventType>>,
    },
    Home,
    People,
    Gallery,
    Link(String),
    Login {
        username: String,
        password: Option<String>,
    },
    Logout,
    Whoami,
    Status,
    Theme {
        toggle: bool,
    },
    AddEvent(EventFields),
    EditEvent {
        id: String,
        fields: EventFields,
    },
    Remove {
        kind: ResourceKind,
        id: String,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub root: Option<PathBuf>,
    pub verbose: bool,
    pub command: Command,
}

fn strict_event_type(raw: &str) -> Result<EventType, String> {
    let wanted = raw.trim().to_ascii_lowercase();
    EventType::iter()
        .find(|t| t.as_str() == wanted)
        .ok_or_else(|| format!("Unknown event type '{}'", raw))
}

fn take_value<'a, I>(flag: &str, it: &mut I) -> Result<String, String>
where
    I: Iterator<Item = &'a String>,
{
    it.next()
        .cloned()
        .ok_or_else(|| format!("{} expects a value", flag))
}

fn parse_event_fields(rest: &[String]) -> Result<EventFields, String> {
    let mut fields = EventFields::default();
    let mut it = rest.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--title" => fields.title = Some(take_value(arg, &mut it)?),
            "--description" => fields.description = Some(take_value(arg, &mut it)?),
            "--date" => fields.date = Some(take_value(arg, &mut it)?),
            "--time" => fields.time = Some(take_value(arg, &mut it)?),
            "--location" => fields.location = Some(take_value(arg, &mut it)?),
            "--type" => {
                fields.event_type = Some(strict_event_type(&take_value(arg, &mut it)?)?)
            }
            other => return Err(format!("Unknown option '{}'", other)),
        }
    }
    Ok(fields)
}

fn parse_events(rest: &[String]) -> Result<Command, String> {
    let mut list = false;
    let mut date = None;
    let mut only = None;
    let mut it = rest.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--list" | "-l" => list = true,
            "--date" | "-d" => {
                let raw = take_value(arg, &mut it)?;
                date = Some(
                    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?,
                );
            }
            "--only" => {
                let raw = take_value(arg, &mut it)?;
                let types = raw
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(strict_event_type)
                    .collect::<Result<Vec<_>, _>>()?;
                only = Some(types);
            }
            other => return Err(format!("Unknown option '{}'", other)),
        }
    }
    Ok(Command::Events { list, date, only })
}

fn parse_admin(rest: &[String]) -> Result<Command, String> {
    match rest.first().map(String::as_str) {
        Some("add-event") => Ok(Command::AddEvent(parse_event_fields(&rest[1..])?)),
        Some("edit-event") => {
            let id = rest.get(1).ok_or("edit-event expects an event id")?.clone();
            Ok(Command::EditEvent {
                id,
                fields: parse_event_fields(&rest[2..])?,
            })
        }
        Some("remove") => {
            let kind_raw = rest.get(1).ok_or("remove expects a kind and an id")?;
            let kind = ResourceKind::parse(kind_raw)
                .ok_or_else(|| format!("Unknown kind '{}'", kind_raw))?;
            let id = rest.get(2).ok_or("remove expects an id")?.clone();
            Ok(Command::Remove { kind, id })
        }
        Some(other) => Err(format!("Unknown admin command '{}'", other)),
        None => Err("admin expects a subcommand".to_string()),
    }
}

/// Parses `args` (without the binary name).
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut root = None;
    let mut verbose = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--root" | "-r" => {
                let value = args.get(i + 1).ok_or("--root expects a path")?;
                root = Some(PathBuf::from(value));
                i += 1;
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" | "help" => {
                return Ok(CliArgs {
                    root,
                    verbose,
                    command: Command::Help,
                });
            }
            _ => break,
        }
        i += 1;
    }

    let Some(name) = args.get(i) else {
        return Ok(CliArgs {
            root,
            verbose,
            command: Command::Events {
                list: false,
                date: None,
                only: None,
            },
        });
    };
    let rest = &args[i + 1..];

    let command = match name.as_str() {
        "events" => parse_events(rest)?,
        "home" => Command::Home,
        "people" => Command::People,
        "gallery" => Command::Gallery,
        "link" => Command::Link(rest.first().ok_or("link expects an event id")?.clone()),
        "login" => Command::Login {
            username: rest.first().ok_or("login expects a username")?.clone(),
            password: rest.get(1).cloned(),
        },
        "logout" => Command::Logout,
        "whoami" => Command::Whoami,
        "status" => Command::Status,
        "theme" => Command::Theme {
            toggle: rest.first().is_some_and(|a| a == "toggle"),
        },
        "admin" => parse_admin(rest)?,
        other => return Err(format!("Unknown command '{}'", other)),
    };

    Ok(CliArgs {
        root,
        verbose,
        command,
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "GSA Portal v{} - Events, people and admin tools for the association site",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] [--verbose] <command>", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -v, --verbose         Log debug output to stderr and the log file.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("COMMANDS:");
    println!("    events [--list] [--date YYYY-MM-DD] [--only social,academic,...]");
    println!("                          Calendar (default) or list view of events.");
    println!("    home                  Upcoming events preview and gallery.");
    println!("    people                Officers, in display order.");
    println!("    gallery               Gallery images, in display order.");
    println!("    link <event-id>       Add-to-calendar link for an event.");
    println!("    login <user> [pass]   Sign in (prompts for the password when omitted).");
    println!("    logout                Forget the stored session token.");
    println!("    whoami                Show the signed-in user.");
    println!("    status                Show the backend banner.");
    println!("    theme [toggle]        Show or toggle the light/dark preference.");
    println!();
    println!("ADMIN COMMANDS (sign-in required):");
    println!(
        "    {} admin add-event --title <t> --date <YYYY-MM-DD> --time \"6:00 PM\" \\",
        binary_name
    );
    println!("        [--location <l>] [--description <d>] [--type social|academic|workshop|general]");
    println!("    {} admin edit-event <id> [same options as add-event]", binary_name);
    println!("    {} admin remove <events|officers|gallery> <id>", binary_name);
    println!();
    println!("FILES:");
    println!("    config.toml           backend_url, request_timeout_secs, log_level,");
    println!("                          seed_on_startup, preview_upcoming, preview_past");
}

/// Installs the stderr + log file logger. Safe to call once per process.
pub fn init_logging(ctx: &dyn AppContext, level: LevelFilter) {
    let log_config = simplelog::ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = ctx.get_log_path() {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => loggers.push(WriteLogger::new(level, log_config, file)),
            Err(e) => eprintln!("Warning: cannot open log file {}: {}", path.display(), e),
        }
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Warning: logger already initialized: {}", e);
    }
}

fn print_event(event: &Event) {
    let location = if event.location.is_empty() {
        String::new()
    } else {
        format!(" @ {}", event.location)
    };
    println!(
        "  {}  {:>8}  [{}] {}{}  ({})",
        time_utils::date_key(event.date),
        event.time,
        event.event_type.label(),
        event.title,
        location,
        event.id
    );
}

fn require_dashboard(session: &SessionManager, client: &ApiClient) -> Result<AdminDashboard> {
    AdminDashboard::open(session, client).map_err(|gate| match gate {
        RouteGate::Pending => anyhow!("Session is still being verified, try again"),
        _ => anyhow!("Not signed in. Run `gsa-portal login <username>` first."),
    })
}

async fn remove<R: Resource>(panel: &mut AdminPanel<R>, id: &str) -> Result<()> {
    panel
        .delete(id)
        .await
        .map_err(|e| anyhow!(e.user_message(&AdminPanel::<R>::delete_fallback())))?;
    println!("Removed {} {}", R::NOUN, id);
    Ok(())
}

/// Runs one command: context, config, logging, client, session bootstrap, optional seed, then the command.
pub async fn run(args: CliArgs) -> Result<()> {
    if args.command == Command::Help {
        print_help("gsa-portal");
        return Ok(());
    }

    let ctx: SharedContext = Arc::new(StandardContext::new(args.root.clone()));
    let config = Config::load_or_default(ctx.as_ref())?;
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        config.log_level_filter()
    };
    init_logging(ctx.as_ref(), level);

    let client = ApiClient::from_config(&config)?;
    let storage = LocalStorage::new(ctx.clone());
    let session = SessionManager::new(client.clone(), storage.clone());
    session.bootstrap().await;

    if config.seed_on_startup
        && let Err(e) = client.seed().await
    {
        log::warn!("Seeding demo data failed: {}", e);
    }

    let today = time_utils::local_today();

    match args.command {
        Command::Help => print_help("gsa-portal"),

        Command::Events { list, date, only } => {
            let mut page = EventsPage::load(client, &config).await;
            if let Some(types) = only {
                page.view_mut().set_filters(TypeFilter::only(types));
            }
            if let Some(date) = date {
                page.view_mut().select_date(date);
            }

            if list {
                let view = page.list_view(today);
                println!("Upcoming events");
                if view.upcoming.is_empty() {
                    println!("  No upcoming events");
                }
                view.upcoming.iter().for_each(|e| print_event(e));
                println!();
                println!("Past events");
                if view.past.is_empty() {
                    println!("  No past events");
                }
                view.past.iter().for_each(|e| print_event(e));
            } else {
                let day = page.calendar_day();
                let first = day.selected.with_day(1).unwrap_or(day.selected);
                let next = first.checked_add_months(Months::new(1)).unwrap_or(first);
                let marked: Vec<String> = day
                    .markers
                    .range(first..next)
                    .map(|d| d.day().to_string())
                    .collect();
                println!(
                    "{}  days with events: {}",
                    first.format("%B %Y"),
                    if marked.is_empty() {
                        "none".to_string()
                    } else {
                        marked.join(", ")
                    }
                );
                println!();
                println!("{}", day.selected.format("%A, %B %-d, %Y"));
                if day.events.is_empty() {
                    println!("  No events on this date");
                }
                day.events.iter().for_each(|e| print_event(e));
            }
        }

        Command::Home => {
            let home = HomeView::load(&client, &config).await;
            println!("Upcoming events");
            let preview = home.upcoming_preview(today);
            if preview.is_empty() {
                println!("  No upcoming events");
            }
            preview.iter().for_each(|e| print_event(e));
            println!();
            println!("Gallery: {} images", home.gallery().len());
        }

        Command::People => {
            let people = PeopleDirectory::load(&client).await;
            if people.is_empty() {
                println!("No officers listed");
            }
            for o in people.officers() {
                match &o.email {
                    Some(email) => println!("  {:>2}. {} - {} <{}>", o.order, o.name, o.role, email),
                    None => println!("  {:>2}. {} - {}", o.order, o.name, o.role),
                }
            }
        }

        Command::Gallery => {
            let gallery = GalleryView::load(&client).await;
            for g in gallery.images() {
                println!("  {:>2}. {}  {}", g.order, g.url, g.caption);
            }
        }

        Command::Link(id) => {
            let page = EventsPage::load(client, &config).await;
            match page.calendar_link(&id) {
                None => bail!("No event with id '{}'", id),
                Some(link) => println!("{}", link?),
            }
        }

        Command::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            match session.login(&username, &password).await {
                Ok(resp) => println!("Signed in as {}", resp.username),
                Err(e) => {
                    log::debug!("Login failed: {}", e);
                    bail!(e.message());
                }
            }
        }

        Command::Logout => {
            session.logout();
            println!("Signed out");
        }

        Command::Whoami => match session.snapshot().user {
            Some(user) => println!("{}", user.username),
            None => println!("Not signed in"),
        },

        Command::Status => {
            let info = client.service_info().await?;
            println!("{} (v{}) at {}", info.message, info.version, client.base_url());
        }

        Command::Theme { toggle } => {
            let mut themes = ThemeManager::new(storage);
            if toggle {
                themes.toggle()?;
            }
            println!("{}", themes.current());
        }

        Command::AddEvent(fields) => {
            let mut dash = require_dashboard(&session, &client)?;
            fields.apply(dash.events.open_create());
            let saved = dash.events.submit().await.map_err(|e| {
                anyhow!(e.user_message(&AdminPanel::<Event>::save_fallback()))
            })?;
            println!("Event created successfully ({})", saved.id);
        }

        Command::EditEvent { id, fields } => {
            let mut dash = require_dashboard(&session, &client)?;
            dash.events.refresh().await?;
            fields.apply(dash.events.open_edit(&id)?);
            dash.events.submit().await.map_err(|e| {
                anyhow!(e.user_message(&AdminPanel::<Event>::save_fallback()))
            })?;
            println!("Event updated successfully");
        }

        Command::Remove { kind, id } => {
            let mut dash = require_dashboard(&session, &client)?;
            match kind {
                ResourceKind::Events => remove::<Event>(&mut dash.events, &id).await?,
                ResourceKind::Officers => remove::<Officer>(&mut dash.officers, &id).await?,
                ResourceKind::Gallery => remove::<GalleryImage>(&mut dash.gallery, &id).await?,
            }
        }
    }

    io::stdout().flush()?;
    Ok(())
}
