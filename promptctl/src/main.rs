mod arcade_cmd;
mod session;
mod state;

use std::collections::HashSet;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use promptos::{
    CopyMode, Poller, Prompt, PromptDraft, PromptEdit, SpaceKind, Template, VariableBindings,
    View,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use session::Session;

const DEFAULT_LOG_FILTER: &str = "promptctl=info,promptos=info,arcade=info";

#[derive(Debug, Parser)]
#[command(name = "promptctl")]
#[command(about = "Prompt library, AI helpers and the credit arcade from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    #[command(subcommand)]
    Spaces(SpaceCommands),
    #[command(subcommand)]
    Prompts(PromptCommands),
    #[command(subcommand)]
    Notifications(NotificationCommands),
    #[command(subcommand)]
    Ai(AiCommands),
    #[command(subcommand)]
    Arcade(arcade_cmd::ArcadeCommands),
}

#[derive(Debug, Subcommand)]
enum SpaceCommands {
    List,
    Create {
        name: String,
        #[arg(long, default_value = "private")]
        kind: SpaceKind,
    },
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete {
        id: String,
    },
    Join {
        code: String,
    },
}

#[derive(Debug, Subcommand)]
enum PromptCommands {
    List {
        #[arg(long, conflicts_with = "favorites")]
        space: Option<String>,
        #[arg(long, default_value_t = false)]
        favorites: bool,
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Add {
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        space: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        space: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, default_value_t = false)]
        bump: bool,
    },
    Delete {
        id: String,
    },
    Favorite {
        id: String,
    },
    /// Fills `[VARIABLE]` placeholders and prints the result.
    Fill {
        id: String,
        #[arg(long = "var", value_parser = parse_binding)]
        vars: Vec<(String, String)>,
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
}

#[derive(Debug, Subcommand)]
enum NotificationCommands {
    List {
        #[arg(long, default_value_t = false)]
        unread: bool,
    },
    Read {
        id: String,
    },
    /// Polls until interrupted, or for `--count` updates.
    Watch {
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
enum AiCommands {
    Enhance(AiInput),
    Vary(AiInput),
    Run(AiInput),
}

#[derive(Debug, Args)]
struct AiInput {
    #[arg(required_unless_present = "prompt")]
    text: Option<String>,
    /// Use a stored prompt's content instead of `text`.
    #[arg(long, conflicts_with = "text")]
    prompt: Option<String>,
    #[arg(long, value_parser = parse_binding)]
    var: Vec<(String, String)>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let directives = std::env::var("PROMPTOS_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    let filter = EnvFilter::builder()
        .parse(&directives)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Arcade(arcade_cmd::ArcadeCommands::Settings(args)) = &cli.command {
        return arcade_cmd::cmd_settings(args);
    }

    let config = promptos::ClientConfig::from_env();
    let login_email = match &cli.command {
        Commands::Login { email, .. } => Some(email.clone()),
        _ => None,
    };
    let mut session = Session::open(config, login_email.as_deref()).await?;

    let outcome = dispatch(&mut session, cli.command).await;
    let saved = session.persist().context("Failed to save session");
    outcome.and(saved)
}

async fn dispatch(session: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => cmd_login(session, &email, &password).await,
        Commands::Register {
            name,
            email,
            password,
        } => cmd_register(session, &name, &email, &password).await,
        Commands::Logout => cmd_logout(session),
        Commands::Whoami => cmd_whoami(session),
        Commands::Spaces(command) => cmd_spaces(session, command).await,
        Commands::Prompts(command) => cmd_prompts(session, command).await,
        Commands::Notifications(command) => cmd_notifications(session, command).await,
        Commands::Ai(command) => cmd_ai(session, command).await,
        Commands::Arcade(command) => arcade_cmd::run(session, command).await,
    }
}

async fn cmd_login(session: &mut Session, email: &str, password: &str) -> Result<()> {
    let user = session.store.login(email, password).await?;
    let mode = if session.store.is_demo() { " (demo)" } else { "" };
    println!("Signed in as {} <{}>{mode}", user.name, user.email);
    Ok(())
}

async fn cmd_register(session: &mut Session, name: &str, email: &str, password: &str) -> Result<()> {
    let user = session.store.register(name, email, password).await?;
    println!("Registered {} <{}>", user.name, user.email);
    Ok(())
}

fn cmd_logout(session: &mut Session) -> Result<()> {
    session.store.logout();
    session.discard_demo()?;
    println!("Signed out");
    Ok(())
}

fn cmd_whoami(session: &Session) -> Result<()> {
    let Some(user) = session.store.user() else {
        bail!("Not signed in");
    };
    println!("{} <{}>", user.name, user.email);
    println!("id:      {}", user.id);
    println!("credits: {}", user.ai_credits);
    if session.store.is_demo() {
        println!("mode:    demo");
    }
    Ok(())
}

async fn cmd_spaces(session: &mut Session, command: SpaceCommands) -> Result<()> {
    let store = &mut session.store;
    require_signed_in(store)?;
    match command {
        SpaceCommands::List => {
            for space in store.spaces() {
                let code = space.join_code.as_deref().unwrap_or("-");
                println!(
                    "{}  {:<24} {:<8} {:?}  members:{} prompts:{} code:{}",
                    space.id,
                    space.name,
                    space.kind.label(),
                    space.role,
                    space.member_count,
                    space.prompt_count,
                    code
                );
            }
        }
        SpaceCommands::Create { name, kind } => {
            let space = store.create_space(&name, kind).await?;
            println!("Created {} ({})", space.name, space.id);
            if let Some(code) = &space.join_code {
                println!("Join code: {code}");
            }
        }
        SpaceCommands::Update {
            id,
            name,
            description,
        } => {
            let space = store.update_space(&id, &name, &description).await?;
            println!("Updated {} ({})", space.name, space.id);
        }
        SpaceCommands::Delete { id } => {
            store.delete_space(&id).await?;
            println!("Deleted space {id}");
        }
        SpaceCommands::Join { code } => {
            if !store.join_space(&code).await {
                bail!("Could not join space with code {code}");
            }
            println!("Joined space");
        }
    }
    Ok(())
}

async fn cmd_prompts(session: &mut Session, command: PromptCommands) -> Result<()> {
    let store = &mut session.store;
    require_signed_in(store)?;
    match command {
        PromptCommands::List {
            space,
            favorites,
            search,
        } => {
            let view = match (space, favorites) {
                (Some(id), _) => View::Space(id),
                (None, true) => View::Favorites,
                (None, false) => View::All,
            };
            store.select_view(view).await?;
            if let Some(query) = search {
                store.set_search_query(query);
            }
            let hits = store.filtered_prompts();
            if hits.is_empty() {
                println!("No prompts");
            }
            for prompt in hits {
                println!("{}", prompt_line(store, prompt));
            }
        }
        PromptCommands::Show { id } => {
            let prompt = find_prompt(store, &id)?;
            print_prompt(store, prompt);
        }
        PromptCommands::Add {
            title,
            content,
            space,
            tags,
            description,
        } => {
            let space_id = match space {
                Some(id) => id,
                None => default_space(store)?,
            };
            let mut draft = PromptDraft::new(title, content, space_id).with_tags(tags);
            if let Some(description) = description {
                draft.description = description;
            }
            let prompt = store.add_prompt(draft).await?;
            println!("Added {} ({})", prompt.title, prompt.id);
            if !prompt.variables.is_empty() {
                println!("Variables: {}", prompt.variables.join(", "));
            }
        }
        PromptCommands::Edit {
            id,
            title,
            content,
            space,
            tags,
            bump,
        } => {
            let edit = PromptEdit {
                title,
                content,
                space_id: space,
                tags: (!tags.is_empty()).then_some(tags),
                bump_version: bump,
            };
            let prompt = store.update_prompt(&id, edit).await?;
            println!("Saved {} v{}", prompt.title, prompt.version);
        }
        PromptCommands::Delete { id } => {
            store.delete_prompt(&id).await?;
            println!("Deleted prompt {id}");
        }
        PromptCommands::Favorite { id } => {
            let starred = store.toggle_favorite(&id).await?;
            println!("{} {id}", favorite_label(starred));
        }
        PromptCommands::Fill { id, vars, raw } => {
            let prompt = find_prompt(store, &id)?;
            let mode = if raw { CopyMode::Raw } else { CopyMode::Compiled };
            println!("{}", fill(prompt, &vars, mode));
        }
    }
    Ok(())
}

async fn cmd_notifications(session: &mut Session, command: NotificationCommands) -> Result<()> {
    require_signed_in(&session.store)?;
    match command {
        NotificationCommands::List { unread } => {
            let store = &session.store;
            for n in store.notifications().iter().filter(|n| !unread || !n.read) {
                let mark = if n.read { ' ' } else { '*' };
                println!(
                    "{mark} {}  {}  {}",
                    n.id,
                    n.created_at.format("%Y-%m-%d %H:%M"),
                    n.message
                );
            }
            println!("{} unread", store.unread_count());
        }
        NotificationCommands::Read { id } => {
            session.store.mark_notification_read(&id).await?;
            println!("Marked {id} as read");
        }
        NotificationCommands::Watch { count } => watch_notifications(session, count).await?,
    }
    Ok(())
}

async fn watch_notifications(session: &mut Session, count: Option<usize>) -> Result<()> {
    let mut poller = Poller::start(session.store.backend(), session.config.poll_interval);
    let mut seen: HashSet<String> = session
        .store
        .notifications()
        .iter()
        .map(|n| n.id.clone())
        .collect();
    let mut updates = 0usize;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            list = poller.rx.recv() => {
                let Some(list) = list else { break };
                for n in list.iter().filter(|n| !n.read && seen.insert(n.id.clone())) {
                    println!("* {}  {}", n.id, n.message);
                }
                session.store.apply_notifications(list);
                updates += 1;
                if count.is_some_and(|limit| updates >= limit) {
                    break;
                }
            }
        }
    }

    poller.stop().await;
    Ok(())
}

async fn cmd_ai(session: &mut Session, command: AiCommands) -> Result<()> {
    let store = &mut session.store;
    require_signed_in(store)?;
    match command {
        AiCommands::Enhance(input) => {
            let text = ai_text(store, &input)?;
            let enhancement = store.enhance_prompt(&text).await?;
            println!("{}", enhancement.optimized_text);
            println!();
            println!("tags:    {}", enhancement.tags.join(", "));
            println!("summary: {}", enhancement.summary);
        }
        AiCommands::Vary(input) => {
            let text = ai_text(store, &input)?;
            let variations = store.prompt_variations(&text).await?;
            if variations.is_empty() {
                println!("No variations generated");
            }
            for (i, variation) in variations.iter().enumerate() {
                println!("{}. {variation}", i + 1);
            }
        }
        AiCommands::Run(input) => {
            let text = ai_text(store, &input)?;
            println!("{}", store.run_prompt(&text).await?);
        }
    }
    if let Some(user) = store.user() {
        eprintln!("credits left: {}", user.ai_credits);
    }
    Ok(())
}

fn ai_text(store: &promptos::AppStore, input: &AiInput) -> Result<String> {
    match (&input.prompt, &input.text) {
        (Some(id), _) => Ok(fill(find_prompt(store, id)?, &input.var, CopyMode::Compiled)),
        (None, Some(text)) => Ok(text.clone()),
        (None, None) => bail!("Provide prompt text or --prompt <id>"),
    }
}

fn fill(prompt: &Prompt, vars: &[(String, String)], mode: CopyMode) -> String {
    let template = Template::new(prompt.content.clone());
    let mut bindings = VariableBindings::for_prompt(prompt.id.clone());
    for (name, value) in vars {
        bindings.set(name.clone(), value.clone());
    }
    for name in template.variables() {
        if bindings.get(&name).is_none() {
            tracing::warn!(variable = %name, "no value given, placeholder kept");
        }
    }
    template.render(mode, &bindings)
}

fn favorite_label(starred: bool) -> &'static str {
    if starred { "Starred" } else { "Unstarred" }
}

fn require_signed_in(store: &promptos::AppStore) -> Result<()> {
    if !store.is_signed_in() {
        bail!("Not signed in. Run `promptctl login` first");
    }
    Ok(())
}

fn find_prompt<'a>(store: &'a promptos::AppStore, id: &str) -> Result<&'a Prompt> {
    store
        .prompt(id)
        .ok_or_else(|| anyhow!("No prompt with id {id}"))
}

fn default_space(store: &promptos::AppStore) -> Result<String> {
    if let Some(id) = store.view().space_id() {
        return Ok(id.to_string());
    }
    store
        .spaces()
        .first()
        .map(|s| s.id.clone())
        .context("No spaces yet. Create one with `promptctl spaces create`")
}

fn prompt_line(store: &promptos::AppStore, prompt: &Prompt) -> String {
    let star = if prompt.is_favorite { "*" } else { " " };
    let space = store
        .space(&prompt.space_id)
        .map(|s| s.name.as_str())
        .unwrap_or("?");
    let mut line = format!(
        "{star} {}  {}  [{space}] v{}",
        prompt.id, prompt.title, prompt.version
    );
    if !prompt.variables.is_empty() {
        line.push_str(&format!("  vars: {}", prompt.variables.join(", ")));
    }
    line
}

fn print_prompt(store: &promptos::AppStore, prompt: &Prompt) {
    println!("{}", prompt_line(store, prompt));
    if !prompt.description.is_empty() {
        println!("{}", prompt.description);
    }
    if !prompt.tags.is_empty() {
        println!("tags: {}", prompt.tags.join(", "));
    }
    println!("updated: {}", prompt.updated_at.format("%Y-%m-%d %H:%M"));
    println!();
    println!("{}", prompt.content);
}

fn parse_binding(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=value, got {raw}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in {raw}"));
    }
    Ok((name.to_string(), value.to_string()))
}
