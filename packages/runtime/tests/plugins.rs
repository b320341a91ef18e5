//! Plugin loading, command dispatch and hooks.

use folio_model::NodeKind;
use folio_runtime::{
    async_trait, Command, CommandHandler, CommandContext, CommandError, CommandResult, Editor, EditorConfig, EditorState, FnHandler, Hook, Loadable,
    Loadables, Plugin, PluginConfig, PluginDefinition, PluginSpec, PluginType, RuntimeError, RuntimeResult,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Append `ch` as a char directly under the root.
fn push_char(ctx: &mut CommandContext<'_>, ch: char) -> CommandResult<()> {
    let tree = &mut ctx.state.tree;
    let root = tree.root();
    let node = tree.create(NodeKind::char(ch));
    tree.append(root, &[node])?;
    Ok(())
}

async fn root_text(editor: &Editor) -> String {
    let state = editor.state().await;
    state.tree.text_content(state.tree.root())
}

struct First;

impl Plugin for First {
    fn commands(&self) -> Vec<Command> {
        vec![Command::sync("x", |ctx, _| push_char(ctx, 'a'))]
    }
}

impl PluginDefinition for First {
    const ID: &'static str = "first";

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(First)
    }
}

struct Second;

impl Plugin for Second {
    fn commands(&self) -> Vec<Command> {
        vec![Command::sync("x", |ctx, _| push_char(ctx, 'b'))]
    }
}

impl PluginDefinition for Second {
    const ID: &'static str = "second";

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Second)
    }
}

#[tokio::test]
async fn test_later_plugin_overrides_command() {
    let config = EditorConfig::new()
        .with(PluginSpec::of::<First>())
        .with(PluginSpec::of::<Second>());
    let editor = Editor::new(config).await.unwrap();

    editor.exec_command("x", Value::Null).await.unwrap();
    assert_eq!(root_text(&editor).await, "b");
}

struct Dependent;

impl Plugin for Dependent {}

impl PluginDefinition for Dependent {
    const ID: &'static str = "dependent";

    fn dependencies() -> Vec<PluginType> {
        vec![PluginType::of::<First>()]
    }

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Dependent)
    }
}

#[tokio::test]
async fn test_dependency_is_instantiated_first() {
    let editor = Editor::new(EditorConfig::new().with(PluginSpec::of::<Dependent>()))
        .await
        .unwrap();
    assert_eq!(editor.plugin_ids(), ["core", "first", "dependent"]);

    let editor = Editor::new(
        EditorConfig::new()
            .with(PluginSpec::of::<Dependent>())
            .with(PluginSpec::of::<First>()),
    )
    .await
    .unwrap();
    assert_eq!(editor.plugin_ids(), ["core", "first", "dependent"]);
}

struct Chicken;
struct Egg;

impl Plugin for Chicken {}
impl Plugin for Egg {}

impl PluginDefinition for Chicken {
    const ID: &'static str = "chicken";

    fn dependencies() -> Vec<PluginType> {
        vec![PluginType::of::<Egg>()]
    }

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Chicken)
    }
}

impl PluginDefinition for Egg {
    const ID: &'static str = "egg";

    fn dependencies() -> Vec<PluginType> {
        vec![PluginType::of::<Chicken>()]
    }

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Egg)
    }
}

#[tokio::test]
async fn test_dependency_cycle_is_fatal() {
    let result = Editor::new(EditorConfig::new().with(PluginSpec::of::<Chicken>())).await;
    assert!(matches!(
        result,
        Err(RuntimeError::DependencyCycle(cycle)) if cycle == "chicken -> egg -> chicken"
    ));
}

struct Provider;

impl Plugin for Provider {
    fn loadables(&self) -> RuntimeResult<Loadables> {
        Ok(Loadables::new().with("widgets", "clock").with("widgets", "calendar"))
    }
}

impl PluginDefinition for Provider {
    const ID: &'static str = "provider";

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Provider)
    }
}

#[derive(Default)]
struct WidgetHost {
    received: Vec<(String, &'static str)>,
}

impl Plugin for WidgetHost {
    fn loaders(&self) -> Vec<&'static str> {
        vec!["widgets"]
    }

    fn loadables(&self) -> RuntimeResult<Loadables> {
        Ok(Loadables::new().with("widgets", "weather"))
    }

    fn load(&mut self, category: &str, entries: Vec<Loadable>, _state: &mut EditorState) -> RuntimeResult<()> {
        for entry in entries {
            let source = entry.source().to_string();
            let widget = entry.downcast::<&'static str>().map_err(|entry| RuntimeError::InvalidLoadable {
                category: category.into(),
                message: entry.type_name().to_string(),
            })?;
            self.received.push((source, widget));
        }
        Ok(())
    }
}

impl PluginDefinition for WidgetHost {
    const ID: &'static str = "widget-host";

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(WidgetHost::default())
    }
}

#[tokio::test]
async fn test_loadables_without_owner_are_rejected() {
    let result = Editor::new(EditorConfig::new().with(PluginSpec::of::<Provider>())).await;
    assert!(matches!(
        result,
        Err(RuntimeError::MissingLoader { category, plugin }) if category == "widgets" && plugin == "provider"
    ));
}

#[tokio::test]
async fn test_loadables_are_delivered_in_load_order() {
    let config = EditorConfig::new()
        .with(PluginSpec::of::<Provider>())
        .with(PluginSpec::of::<WidgetHost>());
    let editor = Editor::new(config).await.unwrap();

    let host = editor.plugin::<WidgetHost>().unwrap();
    assert_eq!(
        host.received,
        [
            ("provider".to_string(), "clock"),
            ("provider".to_string(), "calendar"),
            ("widget-host".to_string(), "weather"),
        ]
    );
}

struct Usurper;

impl Plugin for Usurper {
    fn loaders(&self) -> Vec<&'static str> {
        vec!["engines"]
    }
}

impl PluginDefinition for Usurper {
    const ID: &'static str = "usurper";

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Usurper)
    }
}

#[tokio::test]
async fn test_category_has_a_single_owner() {
    let result = Editor::new(EditorConfig::new().with(PluginSpec::of::<Usurper>())).await;
    assert!(matches!(
        result,
        Err(RuntimeError::DuplicateLoader { first, second, .. }) if first == "core" && second == "usurper"
    ));
}

struct Hooked;

impl Plugin for Hooked {
    fn commands(&self) -> Vec<Command> {
        vec![
            Command::sync("x", |ctx, _| push_char(ctx, 'x')),
            Command::sync("y", |ctx, _| push_char(ctx, 'y')),
            Command::sync("fail", |ctx, _| {
                push_char(ctx, '!')?;
                Err(ctx.reject("always fails"))
            }),
        ]
    }

    fn hooks(&self) -> Vec<Hook> {
        vec![
            Hook::before("x", FnHandler::new(|ctx, _| push_char(ctx, '('))),
            Hook::after("x", FnHandler::new(|ctx, _| push_char(ctx, ')'))),
            Hook::after("*", FnHandler::new(|ctx, _| push_char(ctx, ';'))),
        ]
    }
}

impl PluginDefinition for Hooked {
    const ID: &'static str = "hooked";

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Hooked)
    }
}

async fn hooked() -> Editor {
    Editor::new(EditorConfig::new().with(PluginSpec::of::<Hooked>()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_hooks_wrap_the_handler() {
    let editor = hooked().await;
    editor.exec_command("x", Value::Null).await.unwrap();
    editor.exec_command("y", Value::Null).await.unwrap();
    assert_eq!(root_text(&editor).await, "(x);y;");
}

#[tokio::test]
async fn test_unknown_command_leaves_state_untouched() {
    let editor = hooked().await;
    let err = editor.exec_command("nope", Value::Null).await.unwrap_err();
    assert_eq!(err, CommandError::UnknownCommand("nope".into()));
    assert_eq!(root_text(&editor).await, "");
}

#[tokio::test]
async fn test_failed_command_is_rolled_back() {
    let editor = hooked().await;
    editor.exec_command("y", Value::Null).await.unwrap();
    let before = editor.state().await.selection.clone();

    let err = editor.exec_command("fail", Value::Null).await.unwrap_err();
    assert!(matches!(err, CommandError::Rejected { .. }));

    let state = editor.state().await;
    assert_eq!(state.tree.text_content(state.tree.root()), "y;");
    assert_eq!(state.selection, before);
}

/// Last text seen by `peek`, kept in the session.
#[derive(Debug, Clone, PartialEq)]
struct Seen(String);

/// Appends 'a', yields to the scheduler, then appends 'b'.
struct TwoStep;

#[async_trait(?Send)]
impl CommandHandler for TwoStep {
    async fn execute(&self, ctx: &mut CommandContext<'_>, _args: &Value) -> CommandResult<()> {
        push_char(ctx, 'a')?;
        tokio::task::yield_now().await;
        push_char(ctx, 'b')
    }
}

struct Session;

impl Plugin for Session {
    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("twoStep", TwoStep),
            Command::sync("peek", |ctx, _| {
                let tree = &ctx.state.tree;
                let text = tree.text_content(tree.root());
                ctx.state.extensions.insert(Seen(text));
                Ok(())
            }),
            Command::sync("peekThenFail", |ctx, _| {
                ctx.state.extensions.insert(Seen("discarded".to_string()));
                push_char(ctx, '!')?;
                Err(ctx.reject("always fails"))
            }),
        ]
    }
}

impl PluginDefinition for Session {
    const ID: &'static str = "session";

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Session)
    }
}

async fn session() -> Editor {
    Editor::new(EditorConfig::new().with(PluginSpec::of::<Session>()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_concurrent_commands_run_one_at_a_time() {
    let editor = session().await;

    let (first, second) = tokio::join!(
        editor.exec_command("twoStep", Value::Null),
        editor.exec_command("peek", Value::Null),
    );
    first.unwrap();
    second.unwrap();

    let state = editor.state().await;
    assert_eq!(state.extensions.get::<Seen>(), Some(&Seen("ab".to_string())));
}

#[tokio::test]
async fn test_rollback_restores_extensions_and_retires_ids() {
    let editor = session().await;
    editor.exec_command("peek", Value::Null).await.unwrap();
    let high_water = editor.state().await.tree.len();

    let err = editor.exec_command("peekThenFail", Value::Null).await.unwrap_err();
    assert!(matches!(err, CommandError::Rejected { .. }));
    {
        let state = editor.state().await;
        assert_eq!(state.extensions.get::<Seen>(), Some(&Seen(String::new())));
        assert_eq!(state.tree.text_content(state.tree.root()), "");
    }

    editor.exec_command("twoStep", Value::Null).await.unwrap();
    let state = editor.state().await;
    let root = state.tree.root();
    let children = state.tree.children(root);
    assert_eq!(children.len(), 2);
    // The failed command's node took index `high_water`
    assert!(children.iter().all(|node| node.index() > high_water));
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct GreeterConfig {
    greeting: String,
}

struct Greeter {
    config: GreeterConfig,
}

impl Plugin for Greeter {}

impl PluginDefinition for Greeter {
    const ID: &'static str = "greeter";

    fn create(config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Greeter { config: config.parse()? })
    }
}

#[tokio::test]
async fn test_plugin_config_from_json() {
    let catalog = [PluginType::of::<Greeter>()];
    let config = EditorConfig::from_json(
        json!({ "plugins": [{ "id": "greeter", "config": { "greeting": "hi" } }] }),
        &catalog,
    )
    .unwrap();
    let editor = Editor::new(config).await.unwrap();
    assert_eq!(editor.plugin::<Greeter>().unwrap().config.greeting, "hi");

    let unknown = EditorConfig::from_json(json!({ "plugins": [{ "id": "ghost" }] }), &catalog);
    assert_eq!(unknown.unwrap_err(), RuntimeError::UnknownPlugin("ghost".to_string()));

    let invalid = Editor::new(
        EditorConfig::new().with(PluginSpec::of::<Greeter>().with_config(json!({ "greeting": 3 }))),
    )
    .await;
    assert!(matches!(invalid, Err(RuntimeError::InvalidConfig { plugin, .. }) if plugin == "greeter"));
}
