use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use folio_dom::DomPlugin;
use folio_keymap::{dispatch_key, KeyEvent, Shortcut};
use folio_runtime::{Editor, EditorConfig};
use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Text,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// HTML file to load (reads stdin when omitted or `-`)
    pub input: Option<PathBuf>,

    /// Step to run, in order: `command[=json]` or `key:<shortcut>`
    #[arg(short = 'x', long = "exec")]
    pub steps: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "html")]
    pub format: OutputFormat,

    /// Pretty-print HTML output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Command { id: String, args: Value },
    Key(Shortcut),
}

impl Step {
    fn parse(step: &str) -> Result<Self> {
        if let Some(pattern) = step.strip_prefix("key:") {
            return Ok(Step::Key(Shortcut::parse(pattern)?));
        }
        match step.split_once('=') {
            Some((id, args)) => {
                let args = serde_json::from_str(args).with_context(|| format!("Invalid arguments for {}", id))?;
                Ok(Step::Command {
                    id: id.to_string(),
                    args,
                })
            }
            None if step.is_empty() => Err(anyhow!("Empty step")),
            None => Ok(Step::Command {
                id: step.to_string(),
                args: Value::Null,
            }),
        }
    }
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input.filter(|path| path.as_os_str() != "-") {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display())),
        None => {
            let mut html = String::new();
            std::io::stdin().read_to_string(&mut html)?;
            Ok(html)
        }
    }
}

pub async fn edit(args: EditArgs, mut config: EditorConfig) -> Result<()> {
    let steps = args.steps.iter().map(|step| Step::parse(step)).collect::<Result<Vec<_>>>()?;
    let html = read_input(args.input.as_ref())?;

    if args.pretty {
        crate::config::force_pretty(&mut config);
    }
    let editor = Editor::new(config).await?;
    editor.exec_command("loadHtml", json!({ "html": html })).await?;

    for step in steps {
        match step {
            Step::Command { id, args } => editor.exec_command(&id, args).await?,
            Step::Key(shortcut) => {
                let ran = dispatch_key(&editor, &KeyEvent::from(&shortcut)).await?;
                if ran.is_empty() {
                    warn!(%shortcut, "No command bound to shortcut");
                }
            }
        }
    }
    info!("Applied edits");

    let dom = editor
        .plugin::<DomPlugin>()
        .ok_or_else(|| anyhow!("The dom plugin is not loaded"))?;
    let mut state = editor.state().await;
    let output = match args.format {
        OutputFormat::Html => dom.render_html(&mut state).await?,
        OutputFormat::Text => dom.render_text(&mut state).await?,
    };
    println!("{}", output);
    Ok(())
}
