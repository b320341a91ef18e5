use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio_dom::{dom_parsing_engine, dom_rendering_engine, read_html, DomRenderOptions, Surface};
use folio_engine::Engines;
use folio_model::Tree;

fn document(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| format!("<p>Paragraph {} with <b>bold <i>nested</i></b> and <a href=\"#{}\">a link</a>.<br></p>", i, i))
        .collect()
}

fn engines() -> Engines {
    let mut engines = Engines::new();
    engines.add_parsing_engine(dom_parsing_engine().unwrap()).unwrap();
    engines.add_rendering_engine(dom_rendering_engine().unwrap()).unwrap();
    engines
}

fn read_medium_document(c: &mut Criterion) {
    let source = document(50);
    c.bench_function("read_html_50_paragraphs", |b| b.iter(|| read_html(black_box(&source))));
}

fn round_trip_medium_document(c: &mut Criterion) {
    let source = document(50);
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    c.bench_function("round_trip_50_paragraphs", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut engines = engines();
                let mut tree = Tree::new();
                let surface = Surface::from_html(black_box(&source)).unwrap();
                surface.load(&mut engines, &mut tree).await.unwrap();
                Surface::render(&mut engines, &tree)
                    .await
                    .unwrap()
                    .to_html(&DomRenderOptions::default())
            })
        })
    });
}

criterion_group!(benches, read_medium_document, round_trip_medium_document);
criterion_main!(benches);
