use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_keymap::{KeymapPlugin, Layer};
use folio_runtime::{Editor, EditorConfig};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Also list the shortcuts bound to each command
    #[arg(short, long)]
    pub shortcuts: bool,
}

pub async fn list(args: ListArgs, config: EditorConfig) -> Result<()> {
    let editor = Editor::new(config).await?;
    println!("{} {}", "Plugins:".bold(), editor.plugin_ids().join(", "));

    let mut commands: Vec<_> = editor.commands().collect();
    commands.sort_by(|a, b| a.id.cmp(&b.id));
    for command in commands {
        println!("  {:<24} {}", command.id.as_str().green(), command.title.as_deref().unwrap_or(""));

        if args.shortcuts {
            let Some(keymap) = editor.plugin::<KeymapPlugin>().map(|plugin| plugin.keymap()) else {
                continue;
            };
            for layer in [Layer::User, Layer::Default] {
                for binding in keymap.bindings(layer) {
                    if binding.invocation.as_ref().map_or(false, |invocation| invocation.command == command.id) {
                        println!("  {:<24}   {} ({:?})", "", binding.shortcut.to_string().as_str().cyan(), layer);
                    }
                }
            }
        }
    }
    Ok(())
}
