use std::fs;
use std::io;

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::io::store::{JsonFileStore, Store};
use crate::model::app_data::AppData;
use crate::ops::project_ops;

use super::Context;

pub fn cmd_init(ctx: &Context, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (store, key) = JsonFileStore::for_file(&ctx.data);
    let path = store.path_for(&key);

    if path.exists() {
        if !args.force {
            return Err(format!(
                "{} already exists (use --force to start over)",
                path.display()
            )
            .into());
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    let mut data = AppData::default();
    if let Some(name) = &args.name {
        let config = config_io::load_config(&config_io::config_path_for(&ctx.data))?;
        let (next, id) =
            project_ops::add_project(&data, name, "", config.board.default_wip_limit);
        data = next;
        if !ctx.json {
            println!("{}", id);
        }
    }
    store.save(&key, &data)?;

    if ctx.json {
        let summary = serde_json::json!({
            "data": path.display().to_string(),
            "projects": data.projects.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!("initialized {}", path.display());
    }
    Ok(())
}
