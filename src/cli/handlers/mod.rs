mod init;
pub use init::cmd_init;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;

use crate::board::{Board, TaskError};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::saver::SaveStatus;
use crate::io::store::{self, JsonFileStore};
use crate::model::app_data::Theme;
use crate::model::column::ColumnId;
use crate::model::project::{ProjectPatch, ProjectStatus};
use crate::model::task::{Priority, TaskPatch};
use crate::ops::drag::{DragOver, DragSession, DragState, HoverTarget, Rect, Zone};
use crate::ops::drop::DropOutcome;
use crate::ops::{progress, project_ops, search, tree};

/// Settings shared by every command
pub struct Context {
    pub data: PathBuf,
    pub json: bool,
    pub project: Option<String>,
}

impl Context {
    fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context {
        data: PathBuf::from(&cli.data),
        json: cli.json,
        project: cli.project,
    };

    match cli.command {
        Commands::Init(args) => cmd_init(&ctx, args),
        Commands::Config(cmd) => cmd_config(&ctx, cmd),

        // Read commands
        Commands::Board => cmd_board(&ctx),
        Commands::Progress => cmd_progress(&ctx),
        Commands::Search(args) => cmd_search(&ctx, args),
        Commands::Export(args) => cmd_export(&ctx, args),

        // Write commands
        Commands::Project(cmd) => cmd_project(&ctx, cmd),
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Sub(args) => cmd_sub(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::Clone(args) => cmd_clone(&ctx, args),
        Commands::Mv(args) => cmd_mv(&ctx, args),
        Commands::Drop(args) => cmd_drop(&ctx, args),
        Commands::Import(args) => cmd_import(&ctx, args),
        Commands::Theme(args) => cmd_theme(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_board(ctx: &Context) -> Result<Board, Box<dyn std::error::Error>> {
    let config = config_io::load_config(&config_io::config_path_for(&ctx.data))?;
    let (store, key) = JsonFileStore::for_file(&ctx.data);
    if !store.path_for(&key).exists() {
        return Err(format!("no board at {} (run `tb init`)", ctx.data.display()).into());
    }
    Ok(Board::open(Arc::new(store), &key, config)?)
}

/// Flush pending edits and turn a failed save into an error.
fn save(board: &mut Board) -> Result<(), Box<dyn std::error::Error>> {
    match board.flush() {
        SaveStatus::Clean | SaveStatus::Saved(_) => Ok(()),
        SaveStatus::Conflict { expected, found } => Err(format!(
            "board changed on disk while editing (based on version {}, found {}); re-run the command",
            expected, found
        )
        .into()),
        SaveStatus::Failed(msg) => Err(format!("save failed: {}", msg).into()),
    }
}

fn parse_column(s: &str) -> Result<ColumnId, String> {
    s.parse()
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse(s)
        .ok_or_else(|| format!("unknown priority '{}' (expected: high, medium, low, none)", s))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_board(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let board = open_board(ctx)?;
    let project = board.project(ctx.project())?;
    if ctx.json {
        return print_json(&board_to_json(project));
    }
    let progress = progress::progress_map(&project.columns);
    for line in format_board(project, &progress) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_progress(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let board = open_board(ctx)?;
    let project = board.project(ctx.project())?;
    let map = progress::progress_map(&project.columns);
    if ctx.json {
        return print_json(&progress_to_json(&map));
    }
    if map.is_empty() {
        println!("(no parent tasks)");
    }
    for (identity, p) in &map {
        let content = tree::find_in_columns(&project.columns, identity)
            .map(|(_, t)| t.content.as_str())
            .unwrap_or("");
        println!(
            "{} {}  {}/{} {:>3}%",
            identity,
            content,
            p.done,
            p.total,
            p.percent()
        );
    }
    Ok(())
}

fn cmd_search(ctx: &Context, args: SearchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let board = open_board(ctx)?;
    let project = board.project(ctx.project())?;
    let re = Regex::new(&args.pattern)?;
    let column = args.column.as_deref().map(parse_column).transpose()?;
    let hits = search::search_tasks(project, &re, column);

    if ctx.json {
        let items: Vec<SearchHitJson> =
            hits.iter().map(|h| search_hit_to_json(h, project)).collect();
        return print_json(&items);
    }
    let progress = progress::progress_map(&project.columns);
    for hit in &hits {
        if let Some(task) = tree::find(project.columns.get(hit.column), &hit.task_id) {
            println!("[{}] {}", hit.column, format_task_line(task, &progress));
        }
    }
    Ok(())
}

fn cmd_export(ctx: &Context, args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let board = open_board(ctx)?;
    let text = board.export()?;
    match args.output {
        Some(path) => store::atomic_write(&PathBuf::from(path), text.as_bytes())?,
        None => print!("{}", text),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn cmd_project(ctx: &Context, cmd: ProjectCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd.action {
        None => cmd_project_list(ctx, ProjectListArgs { by_status: false }),
        Some(ProjectAction::List(args)) => cmd_project_list(ctx, args),
        Some(ProjectAction::Add(args)) => {
            let mut board = open_board(ctx)?;
            let id = board.add_project(&args.name, &args.description, args.wip);
            save(&mut board)?;
            println!("{}", id);
            Ok(())
        }
        Some(ProjectAction::Rm(args)) => {
            let mut board = open_board(ctx)?;
            board.delete_project(&args.id)?;
            save(&mut board)
        }
        Some(ProjectAction::Use(args)) => {
            let mut board = open_board(ctx)?;
            board.set_active_project(&args.id)?;
            save(&mut board)
        }
        Some(ProjectAction::Edit(args)) => {
            let status = args
                .status
                .as_deref()
                .map(|s| {
                    ProjectStatus::parse(s).ok_or_else(|| {
                        format!("unknown status '{}' (expected: planning, active, completed)", s)
                    })
                })
                .transpose()?;
            let patch = ProjectPatch {
                name: args.name,
                description: args.description,
                status,
            };
            let mut board = open_board(ctx)?;
            board.update_project(ctx.project(), &patch)?;
            save(&mut board)
        }
        Some(ProjectAction::Wip(args)) => {
            let mut board = open_board(ctx)?;
            board.set_wip_limit(ctx.project(), args.limit)?;
            save(&mut board)
        }
    }
}

fn cmd_project_list(ctx: &Context, args: ProjectListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let board = open_board(ctx)?;
    let data = board.data();
    let active_id = data.active_project().map(|p| p.id.clone());
    let is_active = |id: &str| active_id.as_deref() == Some(id);

    if ctx.json {
        let items: Vec<ProjectJson> = data
            .projects
            .iter()
            .map(|p| project_to_json(p, is_active(&p.id)))
            .collect();
        return print_json(&items);
    }

    if data.projects.is_empty() {
        println!("(no projects)");
        return Ok(());
    }
    if args.by_status {
        for (status, projects) in project_ops::portfolio(data) {
            println!("== {} ({}) ==", status.as_str(), projects.len());
            for p in projects {
                println!("{}", format_project_line(p, is_active(&p.id)));
            }
        }
    } else {
        for p in &data.projects {
            println!("{}", format_project_line(p, is_active(&p.id)));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let column = parse_column(&args.column)?;
    let priority = args.priority.as_deref().map(parse_priority).transpose()?;

    let mut board = open_board(ctx)?;
    let id = board.add_task(ctx.project(), column, &args.content)?;
    if priority.is_some() {
        let patch = TaskPatch {
            priority,
            ..Default::default()
        };
        board.update_task(ctx.project(), &id, &patch)?;
    }
    save(&mut board)?;
    println!("{}", id);
    Ok(())
}

fn cmd_sub(ctx: &Context, args: SubArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = open_board(ctx)?;
    let id = board.add_child_task(ctx.project(), &args.parent, &args.content)?;
    save(&mut board)?;
    println!("{}", id);
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let completed = match (args.done, args.undone) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let patch = TaskPatch {
        content: args.content,
        completed,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        is_expanded: None,
    };
    if patch.is_empty() && !args.toggle {
        return Err("nothing to change (try --content, --done, --priority or --toggle)".into());
    }

    let mut board = open_board(ctx)?;
    if !patch.is_empty() {
        board.update_task(ctx.project(), &args.id, &patch)?;
    }
    if args.toggle {
        board.toggle_expanded(ctx.project(), &args.id)?;
    }
    save(&mut board)
}

fn cmd_rm(ctx: &Context, args: IdArg) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = open_board(ctx)?;
    board.delete_task(ctx.project(), &args.id)?;
    save(&mut board)
}

fn cmd_clone(ctx: &Context, args: IdArg) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = open_board(ctx)?;
    let id = board.clone_task(ctx.project(), &args.id)?;
    save(&mut board)?;
    println!("{}", id);
    Ok(())
}

fn cmd_mv(ctx: &Context, args: MvArgs) -> Result<(), Box<dyn std::error::Error>> {
    let column = parse_column(&args.column)?;
    let mut board = open_board(ctx)?;
    board.move_task(ctx.project(), &args.id, column)?;
    save(&mut board)
}

// ---------------------------------------------------------------------------
// Drag simulation
// ---------------------------------------------------------------------------

/// Geometry used to stand in for a rendered column
const COLUMN_RECT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 280.0,
    height: 800.0,
};
const CARD_HEIGHT: f64 = 40.0;

/// Build the pointer input a real drag over `onto` at `zone` would produce.
/// For a task target, `offset` places the pointer that far down the card.
fn hover_input(onto: &str, zone: Option<ZoneArg>, offset: Option<f64>) -> DragOver {
    if let Some(column) = ColumnId::parse(onto) {
        let card_y = match zone {
            Some(ZoneArg::Top) => COLUMN_RECT.y,
            Some(ZoneArg::Middle) => {
                return DragOver {
                    hover: HoverTarget::Other {
                        id: column.as_str().to_string(),
                    },
                    dragged_rect: None,
                };
            }
            Some(ZoneArg::Bottom) | None => COLUMN_RECT.bottom() - CARD_HEIGHT,
        };
        return DragOver {
            hover: HoverTarget::Column {
                column,
                rect: COLUMN_RECT,
            },
            dragged_rect: Some(Rect::new(COLUMN_RECT.x, card_y, COLUMN_RECT.width, CARD_HEIGHT)),
        };
    }

    let card = Rect::new(COLUMN_RECT.x, COLUMN_RECT.y, COLUMN_RECT.width, CARD_HEIGHT);
    let zone = match (zone, offset) {
        (_, Some(offset)) => Zone::at(&card, card.y + card.height * offset),
        (Some(ZoneArg::Top), None) => Zone::Top,
        (Some(ZoneArg::Bottom), None) => Zone::Bottom,
        (Some(ZoneArg::Middle), None) | (None, None) => Zone::Middle,
    };
    DragOver {
        hover: HoverTarget::TaskZone {
            task_id: onto.to_string(),
            zone,
        },
        dragged_rect: None,
    }
}

fn cmd_drop(ctx: &Context, args: DropArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = open_board(ctx)?;
    {
        let project = board.project(ctx.project())?;
        if tree::find_in_columns(&project.columns, &args.id).is_none() {
            return Err(TaskError::NotFound(args.id).into());
        }
        if ColumnId::parse(&args.onto).is_none()
            && tree::find_in_columns(&project.columns, &args.onto).is_none()
        {
            return Err(TaskError::NotFound(args.onto).into());
        }
    }

    let mut session = DragSession::start(&args.id);
    session.set_modifier(args.duplicate);
    let over = hover_input(&args.onto, args.zone, args.offset);
    let state = board.hover(ctx.project(), &mut session, &over)?;
    if *state == DragState::None {
        return Err(TaskError::Cycle {
            task: args.id,
            target: args.onto,
        }
        .into());
    }

    let outcome = board.release(ctx.project(), session)?;
    save(&mut board)?;

    if ctx.json {
        return print_json(&drop_to_json(&outcome));
    }
    match outcome {
        DropOutcome::Unchanged => println!("(no change)"),
        DropOutcome::Committed {
            task_id,
            column,
            landing,
            duplicated,
            ..
        } => {
            let verb = if duplicated { "copied" } else { "moved" };
            println!("{} {} to {}, {}", verb, task_id, column, format_landing(&landing));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Interchange, config, theme
// ---------------------------------------------------------------------------

fn cmd_import(ctx: &Context, args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&args.file)
        .map_err(|e| format!("cannot read '{}': {}", args.file, e))?;
    let mut board = open_board(ctx)?;
    board.import(&text)?;
    save(&mut board)
}

fn cmd_config(ctx: &Context, cmd: ConfigCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd.action {
        ConfigAction::Set(args) => {
            let path = config_io::config_path_for(&ctx.data);
            let (_config, mut doc) = config_io::read_config(&path)?;
            config_io::set_value(&mut doc, &args.key, &args.value)?;
            config_io::write_config(&path, &doc)?;
            Ok(())
        }
    }
}

fn cmd_theme(ctx: &Context, args: ThemeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let theme = Theme::parse(&args.theme)
        .ok_or_else(|| format!("unknown theme '{}' (expected: light, dark)", args.theme))?;
    let mut board = open_board(ctx)?;
    board.set_theme(theme);
    save(&mut board)
}
