//! Flat selection ↔ range mapping and its tie-break rules.

use folio_dom::{
    dom_parsing_engine, dom_rendering_engine, DomError, DomFormat, DomId, DomPoint, DomSelection, Surface,
};
use folio_engine::{Engines, Format};
use folio_model::{Direction, NodeId, Position, Range, Tree};

struct Fixture {
    engines: Engines,
    tree: Tree,
    surface: Surface,
}

impl Fixture {
    async fn load(html: &str) -> Self {
        let mut engines = Engines::new();
        engines.add_parsing_engine(dom_parsing_engine().unwrap()).unwrap();
        engines.add_rendering_engine(dom_rendering_engine().unwrap()).unwrap();
        let mut tree = Tree::new();
        let surface = Surface::from_html(html).unwrap();
        surface.load(&mut engines, &mut tree).await.unwrap();
        Self { engines, tree, surface }
    }

    /// Re-render and keep the rendered surface.
    async fn render(mut self) -> Self {
        self.surface = Surface::render(&mut self.engines, &self.tree).await.unwrap();
        self
    }

    fn parsed_point(&self, point: DomPoint) -> Result<Position, DomError> {
        let mapping = self.engines.parsing_engine::<DomFormat>(DomFormat::ID).unwrap().mapping();
        self.surface.resolve_point(&self.tree, mapping, point)
    }

    fn parsed_selection(&self, selection: &DomSelection) -> Result<Range, DomError> {
        let mapping = self.engines.parsing_engine::<DomFormat>(DomFormat::ID).unwrap().mapping();
        self.surface.resolve_selection(&self.tree, mapping, selection)
    }

    fn rendered_point(&self, position: Position) -> DomPoint {
        let mapping = self.engines.rendering_engine::<DomFormat>(DomFormat::ID).unwrap().mapping();
        self.surface.locate(&self.tree, mapping, position).unwrap()
    }

    fn rendered_selection(&self, point: DomPoint) -> Position {
        let mapping = self.engines.rendering_engine::<DomFormat>(DomFormat::ID).unwrap().mapping();
        self.surface.resolve_point(&self.tree, mapping, point).unwrap()
    }

    /// Item at `path` (child indexes from the surface root).
    fn item(&self, path: &[usize]) -> DomId {
        let mut item = self.surface.root();
        for index in path {
            item = &item.children()[*index];
        }
        item.id()
    }

    fn node(&self, path: &[usize]) -> NodeId {
        let mut node = self.tree.root();
        for index in path {
            node = self.tree.children(node)[*index];
        }
        node
    }
}

#[tokio::test]
async fn test_text_offsets() {
    // <p> ab <b> cd </b> </p>
    let f = Fixture::load("<p>ab<b>cd</b></p>").await;
    let (p, a, b, c) = (f.node(&[0]), f.node(&[0, 0]), f.node(&[0, 1]), f.node(&[0, 2]));
    let ab = f.item(&[0, 0]);
    let cd = f.item(&[0, 1, 0]);

    assert_eq!(f.parsed_point(DomPoint::new(ab, 1)).unwrap(), Position::after(a));
    assert_eq!(f.parsed_point(DomPoint::new(ab, 2)).unwrap(), Position::after(b));
    assert_eq!(f.parsed_point(DomPoint::new(cd, 1)).unwrap(), Position::after(c));
    // Start of the container
    assert_eq!(f.parsed_point(DomPoint::new(ab, 0)).unwrap(), Position::inside(p));
    // Boundary between items: after the previous node, not before the next
    assert_eq!(f.parsed_point(DomPoint::new(cd, 0)).unwrap(), Position::after(b));
}

#[tokio::test]
async fn test_element_offsets() {
    let f = Fixture::load("<p>ab<b>cd</b></p>").await;
    let (p, b, d) = (f.node(&[0]), f.node(&[0, 1]), f.node(&[0, 3]));
    let p_item = f.item(&[0]);
    let bold = f.item(&[0, 1]);

    assert_eq!(f.parsed_point(DomPoint::new(p_item, 0)).unwrap(), Position::inside(p));
    assert_eq!(f.parsed_point(DomPoint::new(p_item, 1)).unwrap(), Position::after(b));
    assert_eq!(f.parsed_point(DomPoint::new(p_item, 2)).unwrap(), Position::after(d));
    assert_eq!(f.parsed_point(DomPoint::new(bold, 0)).unwrap(), Position::after(b));
    assert_eq!(
        f.parsed_point(DomPoint::new(f.surface.root_id(), 0)).unwrap(),
        Position::inside(f.tree.root())
    );
}

#[tokio::test]
async fn test_empty_container() {
    let f = Fixture::load("<p></p>").await;
    let p = f.node(&[0]);
    assert_eq!(f.parsed_point(DomPoint::new(f.item(&[0]), 0)).unwrap(), Position::inside(p));
}

#[tokio::test]
async fn test_placeholder_is_never_a_target() {
    let f = Fixture::load("<p>a<br><br></p>").await;
    let line_break = f.node(&[0, 1]);
    let p_item = f.item(&[0]);
    assert_eq!(f.parsed_point(DomPoint::new(p_item, 3)).unwrap(), Position::after(line_break));
    assert_eq!(f.parsed_point(DomPoint::new(p_item, 2)).unwrap(), Position::after(line_break));
    let placeholder = f.item(&[0, 2]);
    assert_eq!(f.parsed_point(DomPoint::new(placeholder, 0)).unwrap(), Position::after(line_break));

    // A point on the placeholder itself, as a browser reports a caret on an
    // empty trailing line.
    let f = f.render().await;
    let placeholder = f.item(&[0, 2]);
    assert_eq!(f.rendered_selection(DomPoint::new(placeholder, 0)), Position::after(line_break));
}

#[tokio::test]
async fn test_direction_flag_wins() {
    let f = Fixture::load("<p>abc</p>").await;
    let (a, c) = (f.node(&[0, 0]), f.node(&[0, 2]));
    let text = f.item(&[0, 0]);

    let forward = DomSelection {
        anchor: DomPoint::new(text, 1),
        focus: DomPoint::new(text, 3),
        direction: Direction::Backward,
    };
    let range = f.parsed_selection(&forward).unwrap();
    assert_eq!(range.direction(), Direction::Backward);
    assert_eq!(range.anchor(), Position::after(c));
    assert_eq!(range.focus(), Position::after(a));

    let reversed = DomSelection {
        anchor: DomPoint::new(text, 3),
        focus: DomPoint::new(text, 1),
        direction: Direction::Forward,
    };
    let range = f.parsed_selection(&reversed).unwrap();
    assert_eq!(range.direction(), Direction::Forward);
    assert_eq!(range.start(), Position::after(a));
}

#[tokio::test]
async fn test_identical_points_collapse() {
    let f = Fixture::load("<p>abc</p>").await;
    let point = DomPoint::new(f.item(&[0, 0]), 2);
    let range = f.parsed_selection(&DomSelection::caret(point)).unwrap();
    assert!(range.is_collapsed());
    assert_eq!(range.direction(), Direction::Forward);
}

#[tokio::test]
async fn test_lookup_failures() {
    let f = Fixture::load("<p>ab</p>").await;
    let text = f.item(&[0, 0]);

    let ghost = DomId::next();
    assert_eq!(f.parsed_point(DomPoint::new(ghost, 0)), Err(DomError::UnknownItem(ghost)));
    assert_eq!(
        f.parsed_point(DomPoint::new(text, 3)),
        Err(DomError::OffsetOutOfRange {
            item: text,
            offset: 3,
            len: 2
        })
    );
}

#[tokio::test]
async fn test_inverse_mapping() {
    let f = Fixture::load("<p>ab<b>cd</b></p><p></p>").await.render().await;
    let (p, a, d, empty) = (f.node(&[0]), f.node(&[0, 0]), f.node(&[0, 3]), f.node(&[1]));
    let ab = f.item(&[0, 0]);
    let cd = f.item(&[0, 1, 0]);

    assert_eq!(f.rendered_point(Position::after(a)), DomPoint::new(ab, 1));
    assert_eq!(f.rendered_point(Position::inside(p)), DomPoint::new(ab, 0));
    assert_eq!(f.rendered_point(Position::after(d)), DomPoint::new(cd, 2));
    assert_eq!(f.rendered_point(Position::inside(empty)), DomPoint::new(f.item(&[1]), 0));
    assert_eq!(f.rendered_point(Position::after(p)), DomPoint::new(f.surface.root_id(), 1));

    // And back
    assert_eq!(f.rendered_selection(DomPoint::new(ab, 1)), Position::after(a));
    assert_eq!(f.rendered_selection(DomPoint::new(cd, 2)), Position::after(d));
}

#[tokio::test]
async fn test_locate_range_keeps_direction() {
    let f = Fixture::load("<p>abc</p>").await.render().await;
    let (a, c) = (f.node(&[0, 0]), f.node(&[0, 2]));
    let text = f.item(&[0, 0]);

    let range = Range::new(&f.tree, Position::after(c), Position::after(a)).unwrap();
    let mapping = f.engines.rendering_engine::<DomFormat>(DomFormat::ID).unwrap().mapping();
    let selection = f.surface.locate_range(&f.tree, mapping, &range).unwrap();
    assert_eq!(selection.direction, Direction::Backward);
    assert_eq!(selection.anchor, DomPoint::new(text, 3));
    assert_eq!(selection.focus, DomPoint::new(text, 1));
}
