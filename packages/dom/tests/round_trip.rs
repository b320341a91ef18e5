//! HTML → tree → HTML through the `dom` engines.

use folio_dom::{
    dom_parsing_engine, dom_rendering_engine, render_plain_text, text_parsing_engine, text_rendering_engine,
    DomFormat, DomRenderOptions, Surface, TextChunk, TextFormat,
};
use folio_engine::{Engines, Format};
use folio_model::{predicate, NodeId, NodeKind, Tree};

fn engines() -> Engines {
    let mut engines = Engines::new();
    engines.add_parsing_engine(dom_parsing_engine().unwrap()).unwrap();
    engines.add_rendering_engine(dom_rendering_engine().unwrap()).unwrap();
    engines.add_parsing_engine(text_parsing_engine().unwrap()).unwrap();
    engines.add_rendering_engine(text_rendering_engine().unwrap()).unwrap();
    engines
}

async fn load(engines: &mut Engines, html: &str) -> (Tree, Surface) {
    let mut tree = Tree::new();
    let surface = Surface::from_html(html).unwrap();
    surface.load(engines, &mut tree).await.unwrap();
    (tree, surface)
}

async fn round_trip(html: &str) -> String {
    let mut engines = engines();
    let (tree, _) = load(&mut engines, html).await;
    Surface::render(&mut engines, &tree)
        .await
        .unwrap()
        .to_html(&DomRenderOptions::default())
}

fn kinds(tree: &Tree, parent: NodeId) -> Vec<&'static str> {
    tree.walk_all()
        .children(parent, predicate::any)
        .into_iter()
        .map(|node| match tree.kind(node) {
            Some(NodeKind::Char { .. }) => "char",
            Some(NodeKind::LineBreak) => "br",
            Some(NodeKind::Marker) => "marker",
            Some(NodeKind::Block { .. }) => "block",
            _ => "other",
        })
        .collect()
}

#[tokio::test]
async fn test_bold_run_and_plain_char() {
    let mut engines = engines();
    let (tree, _) = load(&mut engines, "<b>ab</b>c").await;

    let chars = tree.children(tree.root()).to_vec();
    assert_eq!(chars.len(), 3);
    assert!(tree.modifiers(chars[0]).unwrap().has_format("B"));
    assert!(tree.modifiers(chars[1]).unwrap().has_format("B"));
    assert!(tree.modifiers(chars[2]).unwrap().is_empty());

    let html = Surface::render(&mut engines, &tree)
        .await
        .unwrap()
        .to_html(&DomRenderOptions::default());
    assert_eq!(html, "<b>ab</b>c");
}

#[tokio::test]
async fn test_nested_formats_share_wrappers() {
    let html = "<p>Hello <b>bold <i>both</i></b> plain</p>";
    assert_eq!(round_trip(html).await, html);
}

#[tokio::test]
async fn test_adjacent_formats_in_both_orders() {
    assert_eq!(round_trip("<p><b><i>x</i>y</b><i>z</i></p>").await, "<p><b><i>x</i>y</b><i>z</i></p>");
}

#[tokio::test]
async fn test_attributes_survive() {
    let html = "<p class=\"lead\"><span title=\"t\">hi</span> <a href=\"/x\">link</a></p>";
    assert_eq!(round_trip(html).await, html);
}

#[tokio::test]
async fn test_empty_format_element_becomes_container() {
    let mut engines = engines();
    let (tree, _) = load(&mut engines, "<p>a<b></b></p>").await;
    let p = tree.children(tree.root())[0];
    let b = tree.children(p)[1];
    assert_eq!(tree.kind(b), Some(&NodeKind::block("b")));
    assert!(predicate::is_container(&tree, b));

    assert_eq!(round_trip("<p>a<b></b></p>").await, "<p>a<b></b></p>");
}

#[tokio::test]
async fn test_block_final_line_break_keeps_placeholder() {
    let mut engines = engines();
    let (tree, _) = load(&mut engines, "<p>one<br><br></p>").await;
    let p = tree.children(tree.root())[0];
    assert_eq!(kinds(&tree, p), ["char", "char", "char", "br", "marker"]);
    assert_eq!(tree.text_content(p), "one\n");

    assert_eq!(round_trip("<p>one<br><br></p>").await, "<p>one<br><br></p>");
    assert_eq!(round_trip("<p>a<br>b</p>").await, "<p>a<br>b</p>");
}

#[tokio::test]
async fn test_every_item_is_mapped() {
    let mut engines = engines();
    let (tree, surface) = load(&mut engines, "<p>ab<b>cd</b></p>").await;
    let mapping = engines.parsing_engine::<DomFormat>(DomFormat::ID).unwrap().mapping();

    let p = &surface.children()[0];
    let text = &p.children()[0];
    let bold = &p.children()[1];
    assert_eq!(mapping.nodes(&p.id()), [tree.children(tree.root())[0]]);
    assert_eq!(mapping.nodes(&text.id()).len(), 2);
    assert_eq!(mapping.nodes(&bold.id()).len(), 2);
    assert_eq!(mapping.nodes(&surface.root_id()), [tree.root()]);
}

#[tokio::test]
async fn test_pretty_rendering() {
    let mut engines = engines();
    let (tree, _) = load(&mut engines, "<p>a</p><p>b</p>").await;
    let options = DomRenderOptions {
        pretty: true,
        ..DomRenderOptions::default()
    };
    let html = Surface::render(&mut engines, &tree).await.unwrap().to_html(&options);
    assert_eq!(html, "<p>a</p>\n<p>b</p>");
}

#[tokio::test]
async fn test_plain_text_format() {
    let mut engines = engines();
    let (tree, _) = load(&mut engines, "<p>ab</p><p>c<br>d</p>").await;
    assert_eq!(render_plain_text(&mut engines, &tree).await.unwrap(), "ab\nc\nd");

    let mut tree = Tree::new();
    let root = tree.root();
    let chunk = TextChunk::new("x\ny");
    let nodes = engines
        .parse_into::<TextFormat>(TextFormat::ID, &mut tree, root, &[chunk.clone()])
        .await
        .unwrap();
    assert_eq!(nodes.len(), 3);
    assert!(predicate::is_line_break(&tree, nodes[1]));
    let mapping = engines.parsing_engine::<TextFormat>(TextFormat::ID).unwrap().mapping();
    assert_eq!(mapping.nodes(&chunk.id), nodes.as_slice());
}
