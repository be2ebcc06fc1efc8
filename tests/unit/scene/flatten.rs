use super::*;
use crate::assets::text::{MonospaceMetrics, TextShaper, TextStyle};
use crate::scene::model::{FillStyle, ImageSource, Node, StrokeStyle, Style};
use kurbo::Shape;

fn canvas() -> Canvas {
    Canvas {
        width: 400,
        height: 400,
    }
}

fn approx_rect(a: Rect, b: Rect) -> bool {
    (a.x0 - b.x0).abs() < 1e-6
        && (a.y0 - b.y0).abs() < 1e-6
        && (a.x1 - b.x1).abs() < 1e-6
        && (a.y1 - b.y1).abs() < 1e-6
}

fn filled_rect(scene: &mut Scene, center: Point) -> NodeId {
    scene.insert(Node::new(
        NodeKind::Rect {
            width: 1.0,
            height: 1.0,
            corner_radius: 0.0,
        },
        Style {
            stroke: None,
            fill: Some(FillStyle::new(Color::WHITE, 1.0)),
        },
        center,
    ))
}

#[test]
fn filled_rect_maps_to_pixels_with_y_flipped() {
    let mut scene = Scene::new(100.0);
    let id = filled_rect(&mut scene, Point::new(0.5, 1.0));
    scene.stage_add(id).unwrap();

    let frame = flatten(&scene, canvas(), Color::rgb(10, 10, 10)).unwrap();
    assert_eq!(frame.items.len(), 1);
    let DrawItem::Fill { path, color } = &frame.items[0] else {
        panic!("expected fill");
    };
    assert_eq!(*color, Color::WHITE);
    assert!(approx_rect(
        path.bounding_box(),
        Rect::new(200.0, 50.0, 300.0, 150.0)
    ));
}

#[test]
fn invisible_and_unstaged_nodes_draw_nothing() {
    let mut scene = Scene::new(100.0);
    let a = filled_rect(&mut scene, Point::ORIGIN);
    let _b = filled_rect(&mut scene, Point::ORIGIN);
    scene.stage_add(a).unwrap();
    scene.node_mut(a).unwrap().opacity = 0.0;

    let frame = flatten(&scene, canvas(), Color::WHITE).unwrap();
    assert!(frame.items.is_empty());
    assert_eq!((frame.width, frame.height), (400, 400));
}

#[test]
fn opacity_folds_into_alpha() {
    let mut scene = Scene::new(100.0);
    let a = filled_rect(&mut scene, Point::ORIGIN);
    scene.stage_add(a).unwrap();
    scene.node_mut(a).unwrap().opacity = 0.5;

    let frame = flatten(&scene, canvas(), Color::WHITE).unwrap();
    let DrawItem::Fill { color, .. } = &frame.items[0] else {
        panic!("expected fill");
    };
    assert_eq!(color.a, 128);
}

#[test]
fn partial_outline_follows_arc_length() {
    let square = Rect::new(0.0, 0.0, 100.0, 100.0).to_path(0.0);
    let half = partial_outline(&square, 0.5);
    let last = half.elements().last().copied();
    let Some(PathEl::LineTo(p)) = last else {
        panic!("expected a trailing line");
    };
    assert!((p.x - 100.0).abs() < 1e-6 && (p.y - 100.0).abs() < 1e-6);

    assert!(partial_outline(&square, 0.0).elements().is_empty());
}

#[test]
fn arrow_emits_tip_and_shaft() {
    let mut scene = Scene::new(100.0);
    let id = scene.insert(Node::new(
        NodeKind::Line {
            from: Vec2::new(-1.0, 0.0),
            to: Vec2::new(1.0, 0.0),
            tip: true,
        },
        Style {
            stroke: Some(StrokeStyle::solid(Color::GRAY, 4.0)),
            fill: None,
        },
        Point::ORIGIN,
    ));
    scene.stage_add(id).unwrap();

    let frame = flatten(&scene, canvas(), Color::WHITE).unwrap();
    assert_eq!(frame.items.len(), 2);
    let DrawItem::Fill { path, .. } = &frame.items[0] else {
        panic!("expected tip fill");
    };
    let tip = path.bounding_box();
    assert!((tip.x1 - 300.0).abs() < 1e-6);
    assert!((tip.width() - 35.0).abs() < 1e-6);
}

#[test]
fn metrics_only_text_draws_nothing() {
    let mut scene = Scene::new(100.0);
    let block = MonospaceMetrics
        .shape("TIMESTEP: 50", TextStyle::regular(20.0))
        .unwrap();
    let id = scene.insert(Node::new(
        NodeKind::Text { block },
        Style::default(),
        Point::ORIGIN,
    ));
    scene.stage_add(id).unwrap();
    assert!(scene.bounds(id).unwrap().width() > 0.0);
    assert!(flatten(&scene, canvas(), Color::WHITE).unwrap().items.is_empty());
}

#[test]
fn blended_image_resolves_per_frame() {
    let mut scene = Scene::new(100.0);
    let from = Arc::new(RgbaGrid::from_fn(2, 2, |_, _| [0, 0, 0, 255]));
    let to = Arc::new(RgbaGrid::from_fn(2, 2, |_, _| [200, 100, 50, 255]));
    let id = scene.insert(Node::new(
        NodeKind::Image {
            source: ImageSource::Blend {
                from,
                to,
                alpha: 0.5,
            },
            height: 1.0,
        },
        Style::default(),
        Point::ORIGIN,
    ));
    scene.stage_add(id).unwrap();

    let frame = flatten(&scene, canvas(), Color::WHITE).unwrap();
    let DrawItem::Image {
        grid,
        rect,
        opacity,
    } = &frame.items[0]
    else {
        panic!("expected image");
    };
    assert_eq!(grid.pixel(1, 1), [100, 50, 25, 255]);
    assert!(approx_rect(*rect, Rect::new(150.0, 150.0, 250.0, 250.0)));
    assert_eq!(*opacity, 1.0);
}

#[test]
fn tint_blends_rgb_and_keeps_alpha() {
    let c = paint(
        Color {
            r: 0,
            g: 0,
            b: 0,
            a: 200,
        },
        Some(Tint {
            color: Color::WHITE,
            amount: 1.0,
        }),
        1.0,
    );
    assert_eq!(c.to_array(), [255, 255, 255, 200]);
}
